mod grammar;

use crate::ast::Query;
use crate::error::ParseError;
use crate::lexer::Lexer;
use crate::lexer::Token;
use crate::lexer::TokenKind;
use crate::limit::LimitTracker;
use crate::node::SourceSpan;

/// Grammar recursion bound; far below what overflows the stack, far above
/// any query written by a person.
const DEFAULT_RECURSION_LIMIT: usize = 500;

/// Recursive-descent parser for the query language.
///
/// Parsing fails fast: the first lexical or syntactic error aborts and the
/// partial AST is dropped.
///
/// ## Example
/// ```rust
/// use quill_query::Parser;
///
/// let query = Parser::new("/foo/[bar = 22] | fields /foo")
///     .parse()
///     .expect("valid query");
/// assert_eq!(query.to_string(), "/foo/[bar = 22] | fields /foo");
/// ```
#[derive(Debug)]
pub struct Parser<'input> {
    input: &'input str,
    tokens: Vec<Token<'input>>,
    pos: usize,
    recursion: LimitTracker,
    /// Transient negation set by `not`/`!` and consumed by the next
    /// operator or join.
    negate: bool,
}

impl<'input> Parser<'input> {
    pub fn new(input: &'input str) -> Self {
        Self {
            input,
            tokens: Vec::new(),
            pos: 0,
            recursion: LimitTracker::new(DEFAULT_RECURSION_LIMIT),
            negate: false,
        }
    }

    /// Configure the grammar recursion limit.
    pub fn recursion_limit(mut self, limit: usize) -> Self {
        self.recursion = LimitTracker::new(limit);
        self
    }

    pub fn parse(mut self) -> Result<Query, ParseError> {
        self.tokens = Lexer::lex(self.input)?;
        grammar::query(&mut self)
    }

    pub(crate) fn current(&self) -> Token<'input> {
        match self.tokens.get(self.pos) {
            Some(token) => *token,
            None => Token {
                kind: TokenKind::Eof,
                data: "",
                index: self.input.len(),
            },
        }
    }

    pub(crate) fn peek(&self) -> TokenKind {
        self.current().kind()
    }

    /// The token after the current one, for the two-token lookaheads the
    /// grammar needs.
    pub(crate) fn peek_next(&self) -> Token<'input> {
        match self.tokens.get(self.pos + 1) {
            Some(token) => *token,
            None => Token {
                kind: TokenKind::Eof,
                data: "",
                index: self.input.len(),
            },
        }
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.peek() == kind
    }

    pub(crate) fn at_keyword(&self, word: &str) -> bool {
        let t = self.current();
        t.kind() == TokenKind::Ident && t.data() == word
    }

    pub(crate) fn bump(&mut self) -> Token<'input> {
        let token = self.current();
        if token.kind() != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn expect(
        &mut self,
        kind: TokenKind,
        what: &str,
    ) -> Result<Token<'input>, ParseError> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.expected(what))
        }
    }

    pub(crate) fn expected(&self, what: &str) -> ParseError {
        let t = self.current();
        let found = if t.kind() == TokenKind::Eof {
            "end of input".to_string()
        } else {
            format!("'{}'", t.data())
        };
        self.err(format!("expected {what}, found {found}"))
    }

    /// An error at the current token.
    pub(crate) fn err(&self, message: impl Into<String>) -> ParseError {
        let t = self.current();
        ParseError::new(self.input, t.index(), t.data(), message)
    }

    // --- backtracking -----------------------------------------------------

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos,
            negate: self.negate,
        }
    }

    pub(crate) fn rewind(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.pos;
        self.negate = checkpoint.negate;
    }

    // --- the transient `not` flag ----------------------------------------

    pub(crate) fn set_negate(&mut self) {
        self.negate = true;
    }

    pub(crate) fn take_negate(&mut self) -> bool {
        std::mem::take(&mut self.negate)
    }

    // --- recursion --------------------------------------------------------

    pub(crate) fn descend<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        self.recursion.consume();
        if self.recursion.limited() {
            self.recursion.release();
            return Err(self.err("query nesting is too deep"));
        }
        let result = f(self);
        self.recursion.release();
        result
    }

    // --- spans ------------------------------------------------------------

    /// Byte offset of the construct about to be parsed.
    pub(crate) fn start(&self) -> usize {
        self.current().index()
    }

    /// Span from `start` up to the end of the previously consumed token.
    pub(crate) fn span(&self, start: usize) -> SourceSpan {
        let end = match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(t) => t.index() + t.data().len(),
            None => start,
        };
        SourceSpan {
            start,
            end: end.max(start),
        }
    }
}

#[derive(Clone, Copy)]
pub(crate) struct Checkpoint {
    pos: usize,
    negate: bool,
}

impl Query {
    /// Parse a query with the default parser configuration.
    pub fn parse(input: &str) -> Result<Query, ParseError> {
        Parser::new(input).parse()
    }
}
