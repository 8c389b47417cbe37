use std::fmt;

use ariadne::Config;
use ariadne::Label;
use ariadne::Report;
use ariadne::ReportKind;
use ariadne::Source;

/// A syntax error from the lexer or the parser.
///
/// Parsing fails fast: the first error aborts the parse and the partial
/// AST is dropped. The error carries the 1-based line and column, the
/// offending token text and an excerpt of the remaining input, in the
/// spirit of the classic `near token: '…' <---` parser diagnostics.
#[derive(Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    /// The offending token text; empty at end of input.
    pub near: String,
    /// Excerpt of the input following the error position.
    pub excerpt: String,
    /// Byte offset into the query text.
    pub index: usize,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub(crate) fn new(
        input: &str,
        index: usize,
        near: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let index = index.min(input.len());
        let mut line = 1;
        let mut column = 1;
        for c in input[..index].chars() {
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        let mut excerpt: String = input[index..].chars().take(40).collect();
        if excerpt.len() < input.len() - index {
            excerpt.push('…');
        }
        Self {
            message: message.into(),
            near: near.into(),
            excerpt,
            index,
            line,
            column,
        }
    }

    /// Stable numeric code; see the document layer for the 11xx range.
    pub fn code(&self) -> u32 {
        1201
    }

    /// Render a labeled source snippet, without colors.
    pub fn report(&self, source: &str) -> String {
        // ariadne spans are char offsets.
        let start = source[..self.index.min(source.len())].chars().count();
        let end = start + self.near.chars().count().max(1);
        let mut out = Vec::new();
        let result = Report::build(ReportKind::Error, (), start)
            .with_config(Config::default().with_color(false))
            .with_message(&self.message)
            .with_label(Label::new(start..end).with_message("syntax error here"))
            .finish()
            .write(Source::from(source), &mut out);
        match result {
            Ok(()) => String::from_utf8_lossy(&out).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "syntax error at line {}, column {}: {}",
            self.line, self.column, self.message
        )?;
        if !self.near.is_empty() {
            write!(f, " near token '{}'", self.near)?;
        }
        if !self.excerpt.is_empty() {
            write!(f, "\n{} <--- ", self.excerpt)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ERROR@{}:{} {:?} {}",
            self.line, self.column, self.message, self.near
        )
    }
}

impl std::error::Error for ParseError {}

/// A runtime error raised while matching a query against a document.
///
/// The matcher never recovers: the first runtime error aborts the match
/// and the result is undefined.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MatchError {
    /// A placeholder had no value in the supplied bindings.
    #[error("placeholder :{0} is not bound")]
    UnresolvedPlaceholder(String),
    /// Document descent exceeded the configured depth limit.
    #[error("document nesting exceeds the match depth limit of {0}")]
    DepthLimitExceeded(usize),
    /// An `re` pattern failed to compile.
    #[error("invalid regular expression {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        source: regex::Error,
    },
    /// The apply clause failed to patch the matched document.
    #[error("apply clause failed: {0}")]
    Apply(#[from] quill_json::Error),
}

impl MatchError {
    pub fn code(&self) -> u32 {
        match self {
            MatchError::UnresolvedPlaceholder(_) => 1202,
            MatchError::DepthLimitExceeded(_) => 1203,
            MatchError::InvalidRegex { .. } => 1204,
            MatchError::Apply(_) => 1205,
        }
    }
}
