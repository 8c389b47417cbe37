//! JSON text writer.

use std::fmt;

use crate::Value;

/// Serialization builder returned by [`Value::serialize`].
///
/// Implements [`Display`]; the default configuration is compact. `Display`
/// on [`Value`] itself is shorthand for the default configuration.
///
/// [`Display`]: std::fmt::Display
#[derive(Clone, Copy)]
pub struct Serialize<'a> {
    value: &'a Value,
    pretty: bool,
    escape_unicode: bool,
}

impl Value {
    /// Serialize to JSON text with a chainable configuration.
    pub fn serialize(&self) -> Serialize<'_> {
        Serialize {
            value: self,
            pretty: false,
            escape_unicode: false,
        }
    }
}

impl<'a> Serialize<'a> {
    /// Indent with two spaces and break lines.
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Escape every non-ASCII character as `\uXXXX`.
    pub fn escape_unicode(mut self) -> Self {
        self.escape_unicode = true;
        self
    }
}

impl fmt::Display for Serialize<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut state = State {
            output: f,
            pretty: self.pretty,
            escape_unicode: self.escape_unicode,
            indent: 0,
        };
        state.value(self.value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.serialize().fmt(f)
    }
}

struct State<'a, 'b> {
    output: &'a mut fmt::Formatter<'b>,
    pretty: bool,
    escape_unicode: bool,
    indent: usize,
}

impl State<'_, '_> {
    fn value(&mut self, value: &Value) -> fmt::Result {
        match value {
            Value::Null => self.output.write_str("null"),
            Value::Bool(true) => self.output.write_str("true"),
            Value::Bool(false) => self.output.write_str("false"),
            Value::Int(i) => write!(self.output, "{i}"),
            Value::Double(d) if d.is_finite() => write!(self.output, "{d:?}"),
            // JSON has no spelling for non-finite numbers.
            Value::Double(_) => self.output.write_str("null"),
            Value::String(s) => self.string(s),
            Value::Array(items) => {
                if items.is_empty() {
                    return self.output.write_str("[]");
                }
                self.output.write_str("[")?;
                self.indent += 1;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.output.write_str(",")?;
                    }
                    self.new_line()?;
                    self.value(item)?;
                }
                self.indent -= 1;
                self.new_line()?;
                self.output.write_str("]")
            }
            Value::Object(fields) => {
                if fields.is_empty() {
                    return self.output.write_str("{}");
                }
                self.output.write_str("{")?;
                self.indent += 1;
                for (i, (key, item)) in fields.iter().enumerate() {
                    if i > 0 {
                        self.output.write_str(",")?;
                    }
                    self.new_line()?;
                    self.string(key)?;
                    self.output.write_str(":")?;
                    if self.pretty {
                        self.output.write_str(" ")?;
                    }
                    self.value(item)?;
                }
                self.indent -= 1;
                self.new_line()?;
                self.output.write_str("}")
            }
        }
    }

    fn new_line(&mut self) -> fmt::Result {
        if self.pretty {
            self.output.write_str("\n")?;
            for _ in 0..self.indent {
                self.output.write_str("  ")?;
            }
        }
        Ok(())
    }

    fn string(&mut self, s: &str) -> fmt::Result {
        self.output.write_str("\"")?;
        for c in s.chars() {
            match c {
                '"' => self.output.write_str("\\\"")?,
                '\\' => self.output.write_str("\\\\")?,
                '\n' => self.output.write_str("\\n")?,
                '\r' => self.output.write_str("\\r")?,
                '\t' => self.output.write_str("\\t")?,
                '\u{0008}' => self.output.write_str("\\b")?,
                '\u{000C}' => self.output.write_str("\\f")?,
                c if (c as u32) < 0x20 => write!(self.output, "\\u{:04x}", c as u32)?,
                c if self.escape_unicode && !c.is_ascii() => {
                    let mut units = [0u16; 2];
                    for unit in c.encode_utf16(&mut units) {
                        write!(self.output, "\\u{unit:04x}")?;
                    }
                }
                c => self.output.write_fmt(format_args!("{c}"))?,
            }
        }
        self.output.write_str("\"")
    }
}

#[cfg(test)]
mod tests {
    use crate::Value;
    use expect_test::expect;

    #[test]
    fn compact_round_trip() {
        let src = r#"{"foo":{"bar":22,"arr":[1,2.5,null,true],"s":"a\"b"}}"#;
        let doc = Value::from_json(src).unwrap();
        assert_eq!(doc.to_string(), src);
    }

    #[test]
    fn pretty_uses_two_space_indent() {
        let doc = Value::from_json(r#"{"foo":{"bar":22},"arr":[1,[]]}"#).unwrap();
        let expected = expect![[r#"
            {
              "foo": {
                "bar": 22
              },
              "arr": [
                1,
                []
              ]
            }"#]];
        expected.assert_eq(&doc.serialize().pretty().to_string());
    }

    #[test]
    fn unicode_escaping_is_optional() {
        let doc = Value::from_json(r#"{"s":"π𝄞"}"#).unwrap();
        assert_eq!(doc.to_string(), r#"{"s":"π𝄞"}"#);
        assert_eq!(
            doc.serialize().escape_unicode().to_string(),
            r#"{"s":"\u03c0\ud834\udd1e"}"#
        );
    }

    #[test]
    fn doubles_keep_their_point() {
        let doc = Value::from_json("[22.0,1.5]").unwrap();
        assert_eq!(doc.to_string(), "[22.0,1.5]");
        // Reparse preserves the variant split.
        let again = Value::from_json(&doc.to_string()).unwrap();
        assert_eq!(doc, again);
    }
}
