//! JSON literals embedded in query text.
//!
//! RFC8259 values plus the query-context extension: unquoted identifiers
//! are accepted as object keys and as string values. Documents themselves
//! are never parsed with this grammar.

use indexmap::IndexMap;
use quill_json::Value;

use crate::error::ParseError;
use crate::lexer;
use crate::lexer::TokenKind;
use crate::parser::Parser;

/// ```txt
/// JsonLiteral
///     'null' | 'true' | 'false' | Int | Float | String | Ident
///     | '[' (JsonLiteral (',' JsonLiteral)*)? ']'
///     | '{' (JsonPair (',' JsonPair)*)? '}'
/// ```
pub(crate) fn value(p: &mut Parser) -> Result<Value, ParseError> {
    match p.peek() {
        TokenKind::Int => {
            let t = p.bump();
            match t.data().parse::<i64>() {
                Ok(i) => Ok(Value::Int(i)),
                // Integer syntax beyond i64 range degrades to a double.
                Err(_) => t
                    .data()
                    .parse::<f64>()
                    .map(Value::Double)
                    .map_err(|_| p.err("malformed number")),
            }
        }
        TokenKind::Float => {
            let t = p.bump();
            t.data()
                .parse::<f64>()
                .map(Value::Double)
                .map_err(|_| p.err("malformed number"))
        }
        TokenKind::StringValue => Ok(Value::String(lexer::unescape(p.bump().data()))),
        TokenKind::Ident => {
            let t = p.bump();
            match t.data() {
                "null" => Ok(Value::Null),
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                word => Ok(Value::String(word.to_string())),
            }
        }
        TokenKind::LBracket => p.descend(array),
        TokenKind::LBrace => p.descend(object),
        _ => Err(p.expected("a JSON value")),
    }
}

fn array(p: &mut Parser) -> Result<Value, ParseError> {
    p.bump(); // '['
    let mut items = Vec::new();
    if p.at(TokenKind::RBracket) {
        p.bump();
        return Ok(Value::Array(items));
    }
    loop {
        items.push(value(p)?);
        if p.at(TokenKind::Comma) {
            p.bump();
            continue;
        }
        p.expect(TokenKind::RBracket, "`,` or `]`")?;
        return Ok(Value::Array(items));
    }
}

/// ```txt
/// JsonPair
///     (String | Ident) ':' JsonLiteral
/// ```
fn object(p: &mut Parser) -> Result<Value, ParseError> {
    p.bump(); // '{'
    let mut fields = IndexMap::new();
    if p.at(TokenKind::RBrace) {
        p.bump();
        return Ok(Value::Object(fields));
    }
    loop {
        let key = match p.peek() {
            TokenKind::StringValue => lexer::unescape(p.bump().data()),
            TokenKind::Ident => p.bump().data().to_string(),
            _ => return Err(p.expected("an object key")),
        };
        p.expect(TokenKind::Colon, "`:`")?;
        let value = value(p)?;
        fields.insert(key, value);
        if p.at(TokenKind::Comma) {
            p.bump();
            continue;
        }
        p.expect(TokenKind::RBrace, "`,` or `}`")?;
        return Ok(Value::Object(fields));
    }
}
