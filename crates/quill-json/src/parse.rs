//! RFC8259 JSON text reader.
//!
//! Strict: no unquoted identifiers, no comments, no trailing input. The
//! query language's relaxed literal syntax lives in the query crate; a
//! document is never parsed leniently.

use indexmap::IndexMap;

use crate::Error;
use crate::Result;
use crate::Value;

/// Nesting bound; inputs deeper than this are rejected rather than risking
/// the call stack.
const MAX_DEPTH: usize = 512;

pub(crate) fn parse_document(input: &str) -> Result<Value> {
    let mut r = Reader::new(input);
    r.skip_ws();
    let value = r.value(0)?;
    r.skip_ws();
    if !r.at_end() {
        return Err(r.err("unexpected trailing input"));
    }
    Ok(value)
}

struct Reader<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str) -> Self {
        Reader {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn skip_ws(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    fn err(&self, message: impl std::fmt::Display) -> Error {
        Error::parse_at(self.input, self.pos, message)
    }

    fn expect(&mut self, b: u8) -> Result<()> {
        if self.peek() == Some(b) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.err(format_args!("expected `{}`", b as char)))
        }
    }

    fn value(&mut self, depth: usize) -> Result<Value> {
        if depth > MAX_DEPTH {
            return Err(self.err("document is nested too deeply"));
        }
        match self.peek() {
            Some(b'{') => self.object(depth),
            Some(b'[') => self.array(depth),
            Some(b'"') => Ok(Value::String(self.string()?)),
            Some(b't') => self.keyword("true", Value::Bool(true)),
            Some(b'f') => self.keyword("false", Value::Bool(false)),
            Some(b'n') => self.keyword("null", Value::Null),
            Some(b'-' | b'0'..=b'9') => self.number(),
            Some(b) => Err(self.err(format_args!("unexpected character `{}`", b as char))),
            None => Err(self.err("unexpected end of input")),
        }
    }

    fn keyword(&mut self, word: &str, value: Value) -> Result<Value> {
        if self.input[self.pos..].starts_with(word) {
            self.pos += word.len();
            Ok(value)
        } else {
            Err(self.err(format_args!("expected `{word}`")))
        }
    }

    fn object(&mut self, depth: usize) -> Result<Value> {
        self.expect(b'{')?;
        let mut fields = IndexMap::new();
        self.skip_ws();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(Value::Object(fields));
        }
        loop {
            self.skip_ws();
            if self.peek() != Some(b'"') {
                return Err(self.err("expected an object key"));
            }
            let key = self.string()?;
            self.skip_ws();
            self.expect(b':')?;
            self.skip_ws();
            let value = self.value(depth + 1)?;
            // Repeated keys keep their first position, last value wins.
            fields.insert(key, value);
            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(Value::Object(fields));
                }
                _ => return Err(self.err("expected `,` or `}`")),
            }
        }
    }

    fn array(&mut self, depth: usize) -> Result<Value> {
        self.expect(b'[')?;
        let mut items = Vec::new();
        self.skip_ws();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(Value::Array(items));
        }
        loop {
            self.skip_ws();
            items.push(self.value(depth + 1)?);
            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => {
                    self.pos += 1;
                    return Ok(Value::Array(items));
                }
                _ => return Err(self.err("expected `,` or `]`")),
            }
        }
    }

    fn string(&mut self) -> Result<String> {
        self.expect(b'"')?;
        let mut out = String::new();
        loop {
            let start = self.pos;
            // Plain run up to the next escape, terminator or control byte.
            while let Some(b) = self.peek() {
                if b == b'"' || b == b'\\' || b < 0x20 {
                    break;
                }
                self.pos += 1;
            }
            out.push_str(&self.input[start..self.pos]);
            match self.bump() {
                Some(b'"') => return Ok(out),
                Some(b'\\') => out.push(self.escape()?),
                Some(_) => return Err(self.err("unescaped control character in string")),
                None => return Err(self.err("unterminated string")),
            }
        }
    }

    fn escape(&mut self) -> Result<char> {
        match self.bump() {
            Some(b'"') => Ok('"'),
            Some(b'\\') => Ok('\\'),
            Some(b'/') => Ok('/'),
            Some(b'b') => Ok('\u{0008}'),
            Some(b'f') => Ok('\u{000C}'),
            Some(b'n') => Ok('\n'),
            Some(b'r') => Ok('\r'),
            Some(b't') => Ok('\t'),
            Some(b'u') => self.unicode_escape(),
            _ => Err(Error::InvalidCodepoint),
        }
    }

    fn unicode_escape(&mut self) -> Result<char> {
        let first = self.hex4()?;
        let code = match first {
            // High surrogate: a low surrogate escape must follow.
            0xD800..=0xDBFF => {
                if self.bump() != Some(b'\\') || self.bump() != Some(b'u') {
                    return Err(Error::InvalidCodepoint);
                }
                let second = self.hex4()?;
                if !(0xDC00..=0xDFFF).contains(&second) {
                    return Err(Error::InvalidCodepoint);
                }
                0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00)
            }
            // A lone low surrogate never decodes.
            0xDC00..=0xDFFF => return Err(Error::InvalidCodepoint),
            code => code,
        };
        char::from_u32(code).ok_or(Error::InvalidCodepoint)
    }

    fn hex4(&mut self) -> Result<u32> {
        let mut code = 0;
        for _ in 0..4 {
            let digit = match self.bump() {
                Some(b @ b'0'..=b'9') => (b - b'0') as u32,
                Some(b @ b'a'..=b'f') => (b - b'a') as u32 + 10,
                Some(b @ b'A'..=b'F') => (b - b'A') as u32 + 10,
                _ => return Err(Error::InvalidCodepoint),
            };
            code = code * 16 + digit;
        }
        Ok(code)
    }

    fn number(&mut self) -> Result<Value> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        match self.peek() {
            Some(b'0') => self.pos += 1,
            Some(b'1'..=b'9') => self.digits(),
            _ => return Err(self.err("malformed number")),
        }
        let mut is_double = false;
        if self.peek() == Some(b'.') {
            self.pos += 1;
            is_double = true;
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.err("malformed number"));
            }
            self.digits();
        }
        if let Some(b'e' | b'E') = self.peek() {
            self.pos += 1;
            is_double = true;
            if let Some(b'+' | b'-') = self.peek() {
                self.pos += 1;
            }
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.err("malformed number"));
            }
            self.digits();
        }
        let text = &self.input[start..self.pos];
        if !is_double {
            if let Ok(i) = text.parse::<i64>() {
                return Ok(Value::Int(i));
            }
            // Integer syntax that overflows i64 degrades to a double.
        }
        text.parse::<f64>()
            .map(Value::Double)
            .map_err(|_| Error::parse_at(self.input, start, "malformed number"))
    }

    fn digits(&mut self) {
        while let Some(b'0'..=b'9') = self.peek() {
            self.pos += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars() {
        assert_eq!(Value::from_json("null").unwrap(), Value::Null);
        assert_eq!(Value::from_json("true").unwrap(), Value::Bool(true));
        assert_eq!(Value::from_json("-42").unwrap(), Value::Int(-42));
        assert_eq!(Value::from_json("1.5e3").unwrap(), Value::Double(1500.0));
        assert_eq!(
            Value::from_json(r#""hi\nthere""#).unwrap(),
            Value::String("hi\nthere".into())
        );
    }

    #[test]
    fn int_without_fraction_or_exponent_stays_integer() {
        assert_eq!(Value::from_json("22").unwrap(), Value::Int(22));
        assert_eq!(Value::from_json("22.0").unwrap(), Value::Double(22.0));
        assert_eq!(Value::from_json("2e1").unwrap(), Value::Double(20.0));
    }

    #[test]
    fn nested_document() {
        let doc = Value::from_json(r#"{"foo":{"bar":22,"arr":[1,2,3]}}"#).unwrap();
        assert_eq!(doc.get("foo").unwrap().get("bar"), Some(&Value::Int(22)));
        assert_eq!(
            doc.get("foo").unwrap().get("arr").unwrap().child_count(),
            3
        );
    }

    #[test]
    fn surrogate_pairs() {
        assert_eq!(
            Value::from_json(r#""\ud834\udd1e""#).unwrap(),
            Value::String("\u{1D11E}".into())
        );
        assert_eq!(
            Value::from_json(r#""𝄞""#).unwrap(),
            Value::String("\u{1D11E}".into())
        );
        assert_eq!(
            Value::from_json(r#""\udd1e""#).unwrap_err(),
            Error::InvalidCodepoint
        );
        assert_eq!(
            Value::from_json(r#""\ud834x""#).unwrap_err(),
            Error::InvalidCodepoint
        );
    }

    #[test]
    fn duplicate_keys_last_write_wins() {
        let doc = Value::from_json(r#"{"a":1,"a":2}"#).unwrap();
        assert_eq!(doc.get("a"), Some(&Value::Int(2)));
        assert_eq!(doc.child_count(), 1);
    }

    #[test]
    fn errors_carry_positions() {
        let err = Value::from_json("{\"a\": 1,\n  oops}").unwrap_err();
        match err {
            Error::Parse { line, column, .. } => {
                assert_eq!(line, 2);
                assert_eq!(column, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_lenient_extensions() {
        assert!(Value::from_json("{a: 1}").is_err());
        assert!(Value::from_json("[1,]").is_err());
        assert!(Value::from_json("01").is_err());
        assert!(Value::from_json("{} {}").is_err());
    }

    #[test]
    fn invalid_utf8_bytes() {
        assert_eq!(
            Value::from_json_bytes(b"\"\xff\"").unwrap_err(),
            Error::InvalidUtf8
        );
    }
}
