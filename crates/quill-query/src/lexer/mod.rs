mod cursor;

use crate::error::ParseError;

use cursor::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Slash,       // /
    LBracket,    // [
    RBracket,    // ]
    LParen,      // (
    RParen,      // )
    LBrace,      // {
    RBrace,      // }
    Pipe,        // |
    Comma,       // ,
    Colon,       // :
    At,          // @
    Minus,       // -
    Bang,        // !
    Star,        // *
    StarStar,    // **
    Eq,          // =
    NotEq,       // !=
    Gt,          // >
    GtEq,        // >=
    Lt,          // <
    LtEq,        // <=
    Ident,
    Int,
    Float,
    StringValue,
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub(crate) kind: TokenKind,
    pub(crate) data: &'a str,
    pub(crate) index: usize,
}

impl<'a> Token<'a> {
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// The raw source slice; string tokens keep their quotes.
    pub fn data(&self) -> &'a str {
        self.data
    }

    /// Byte offset of the token in the query text.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Streaming tokenizer for the query language.
///
/// Whitespace separates tokens and is never emitted. The iterator ends
/// with a single [`TokenKind::Eof`] token; a lexical error ends the stream
/// immediately.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    cursor: Cursor<'a>,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            cursor: Cursor::new(input),
            finished: false,
        }
    }

    pub(crate) fn lex(input: &'a str) -> Result<Vec<Token<'a>>, ParseError> {
        Lexer::new(input).collect()
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token<'a> {
        Token {
            kind,
            data: self.cursor.slice(start),
            index: start,
        }
    }

    fn err(&self, start: usize, message: impl Into<String>) -> ParseError {
        ParseError::new(self.input, start, self.cursor.slice(start), message)
    }

    fn advance(&mut self) -> Result<Token<'a>, ParseError> {
        let start = self.cursor.offset();
        let c = match self.cursor.bump() {
            Some(c) => c,
            None => return Ok(self.token(TokenKind::Eof, start)),
        };

        let kind = match c {
            '/' => TokenKind::Slash,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '|' => TokenKind::Pipe,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '@' => TokenKind::At,
            '*' => {
                if self.cursor.eatc('*') {
                    TokenKind::StarStar
                } else {
                    TokenKind::Star
                }
            }
            '=' => TokenKind::Eq,
            '!' => {
                if self.cursor.eatc('=') {
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                }
            }
            '>' => {
                if self.cursor.eatc('=') {
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            '<' => {
                if self.cursor.eatc('=') {
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }
            '-' => {
                if matches!(self.cursor.first(), Some('0'..='9')) {
                    return self.number(start);
                }
                TokenKind::Minus
            }
            '"' => return self.string_value(start),
            '0'..='9' => return self.number(start),
            c if is_ident_start(c) => {
                self.cursor.eat_while(is_ident_char);
                TokenKind::Ident
            }
            c => return Err(self.err(start, format!("unexpected character `{c}`"))),
        };

        Ok(self.token(kind, start))
    }

    fn number(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.cursor.eat_while(is_digit);
        let mut kind = TokenKind::Int;
        if self.cursor.first() == Some('.') {
            if !matches!(self.cursor.second(), Some('0'..='9')) {
                self.cursor.bump();
                return Err(self.err(start, "malformed number"));
            }
            self.cursor.bump();
            self.cursor.eat_while(is_digit);
            kind = TokenKind::Float;
        }
        if let Some('e' | 'E') = self.cursor.first() {
            self.cursor.bump();
            if let Some('+' | '-') = self.cursor.first() {
                self.cursor.bump();
            }
            if !matches!(self.cursor.first(), Some('0'..='9')) {
                return Err(self.err(start, "malformed number"));
            }
            self.cursor.eat_while(is_digit);
            kind = TokenKind::Float;
        }
        if self.cursor.first().is_some_and(is_ident_start) {
            return Err(self.err(start, "malformed number"));
        }
        Ok(self.token(kind, start))
    }

    fn string_value(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        loop {
            match self.cursor.bump() {
                Some('"') => return Ok(self.token(TokenKind::StringValue, start)),
                Some('\\') => match self.cursor.bump() {
                    Some('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't') => {}
                    Some('u') => {
                        for _ in 0..4 {
                            if !self.cursor.first().is_some_and(|c| c.is_ascii_hexdigit()) {
                                return Err(self.err(start, "invalid unicode escape"));
                            }
                            self.cursor.bump();
                        }
                    }
                    _ => return Err(self.err(start, "invalid escape sequence")),
                },
                Some(_) => {}
                None => return Err(self.err(start, "unterminated string")),
            }
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        self.cursor.eat_while(is_whitespace);
        if self.cursor.is_eof() {
            self.finished = true;
        }
        let result = self.advance();
        if result.is_err() {
            self.finished = true;
        }
        Some(result)
    }
}

/// Decode a quoted string token. The lexer validated the escapes already,
/// so this never fails; unpaired surrogates decode to U+FFFD.
pub(crate) fn unescape(data: &str) -> String {
    let inner = data
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(data);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('b') => out.push('\u{0008}'),
            Some('f') => out.push('\u{000C}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('u') => match hex4(&mut chars) {
                Some(code @ 0xD800..=0xDBFF) => {
                    // Try to pair with a following low surrogate.
                    let mut ahead = chars.clone();
                    let low = (ahead.next() == Some('\\') && ahead.next() == Some('u'))
                        .then(|| hex4(&mut ahead))
                        .flatten();
                    match low {
                        Some(low @ 0xDC00..=0xDFFF) => {
                            chars = ahead;
                            let combined =
                                0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                            out.push(char::from_u32(combined).unwrap_or('\u{FFFD}'));
                        }
                        _ => out.push('\u{FFFD}'),
                    }
                }
                Some(code) => out.push(char::from_u32(code).unwrap_or('\u{FFFD}')),
                None => out.push('\u{FFFD}'),
            },
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn hex4(chars: &mut std::str::Chars<'_>) -> Option<u32> {
    let mut code = 0;
    for _ in 0..4 {
        code = code * 16 + chars.next()?.to_digit(16)?;
    }
    Some(code)
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

fn is_ident_start(c: char) -> bool {
    matches!(c, 'a'..='z' | 'A'..='Z' | '_')
}

fn is_ident_char(c: char) -> bool {
    matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '_')
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}
