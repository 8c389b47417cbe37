//! The in-memory document tree.

use indexmap::IndexMap;
use std::fmt;

use crate::Error;
use crate::Result;

/// A typed JSON tree vertex.
///
/// Containers own their children in document order. Object keys are unique;
/// building a tree through [`set`] or the JSON parser keeps the first
/// position of a repeated key and the last value (last write wins).
///
/// Integer and floating point numbers are distinct variants, like the
/// storage format they mirror; [`structural_eq`] compares them numerically.
///
/// [`set`]: Value::set
/// [`structural_eq`]: Value::structural_eq
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
}

/// The key of a child node relative to its parent: an object member name
/// or an array position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyRef<'a> {
    Key(&'a str),
    Index(usize),
}

impl KeyRef<'_> {
    /// Whether a textual path segment addresses this child. Array children
    /// are addressed by their decimal index.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            KeyRef::Key(k) => *k == name,
            KeyRef::Index(i) => name.parse::<usize>() == Ok(*i),
        }
    }

    pub fn as_key(&self) -> Option<&str> {
        match self {
            KeyRef::Key(k) => Some(k),
            KeyRef::Index(_) => None,
        }
    }
}

impl fmt::Display for KeyRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyRef::Key(k) => f.write_str(k),
            KeyRef::Index(i) => write!(f, "{i}"),
        }
    }
}

impl Value {
    /// Parse a document from RFC8259 JSON text.
    pub fn from_json(input: &str) -> Result<Value> {
        crate::parse::parse_document(input)
    }

    /// Parse a document from a byte buffer, validating UTF-8 first.
    ///
    /// This is the entry point a binary document container converts
    /// through; everything else in the crate works on `&str`.
    pub fn from_json_bytes(input: &[u8]) -> Result<Value> {
        let text = std::str::from_utf8(input).map_err(|_| Error::InvalidUtf8)?;
        Value::from_json(text)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Object(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view with int/float coercion.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Object(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut IndexMap<String, Value>> {
        match self {
            Value::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// Object member lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object()?.get(key)
    }

    /// Array element lookup.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.as_array()?.get(index)
    }

    /// Number of children of a container, `0` for scalars.
    pub fn child_count(&self) -> usize {
        match self {
            Value::Array(items) => items.len(),
            Value::Object(fields) => fields.len(),
            _ => 0,
        }
    }

    /// Children in document order, with their keys. Scalars yield nothing.
    pub fn entries(&self) -> Entries<'_> {
        let inner = match self {
            Value::Array(items) => EntriesInner::Array(items.iter().enumerate()),
            Value::Object(fields) => EntriesInner::Object(fields.iter()),
            _ => EntriesInner::Leaf,
        };
        Entries { inner }
    }

    /// Insert or replace an object member. Errors on non-objects.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Result<()> {
        match self {
            Value::Object(fields) => {
                fields.insert(key.into(), value);
                Ok(())
            }
            _ => Err(Error::NotAnObject),
        }
    }

    /// Remove an object member, returning it if present. Errors on
    /// non-objects.
    pub fn remove(&mut self, key: &str) -> Result<Option<Value>> {
        match self {
            Value::Object(fields) => Ok(fields.shift_remove(key)),
            _ => Err(Error::NotAnObject),
        }
    }

    /// Structural equality with numeric coercion.
    ///
    /// Numbers compare numerically; an integer equals a float only when the
    /// float is exactly integral and equal. Strings compare byte-wise.
    /// Arrays compare pairwise in order. Objects compare by key set,
    /// order-insensitively.
    pub fn structural_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Int(i), Value::Double(d)) | (Value::Double(d), Value::Int(i)) => {
                d.fract() == 0.0 && *d == *i as f64
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.structural_eq(y))
            }
            (Value::Object(a), Value::Object(b)) => {
                if a.len() != b.len() {
                    return false;
                }
                let mut keys_a: Vec<&str> = a.keys().map(String::as_str).collect();
                let mut keys_b: Vec<&str> = b.keys().map(String::as_str).collect();
                keys_a.sort_unstable();
                keys_b.sort_unstable();
                if keys_a != keys_b {
                    return false;
                }
                keys_a.iter().all(|k| a[*k].structural_eq(&b[*k]))
            }
            _ => false,
        }
    }
}

pub struct Entries<'a> {
    inner: EntriesInner<'a>,
}

enum EntriesInner<'a> {
    Leaf,
    Array(std::iter::Enumerate<std::slice::Iter<'a, Value>>),
    Object(indexmap::map::Iter<'a, String, Value>),
}

impl<'a> Iterator for Entries<'a> {
    type Item = (KeyRef<'a>, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            EntriesInner::Leaf => None,
            EntriesInner::Array(iter) => iter.next().map(|(i, v)| (KeyRef::Index(i), v)),
            EntriesInner::Object(iter) => iter.next().map(|(k, v)| (KeyRef::Key(k), v)),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_coercion() {
        assert!(Value::Int(22).structural_eq(&Value::Double(22.0)));
        assert!(Value::Double(22.0).structural_eq(&Value::Int(22)));
        assert!(!Value::Int(22).structural_eq(&Value::Double(22.5)));
        // Strict equality stays strict.
        assert_ne!(Value::Int(22), Value::Double(22.0));
    }

    #[test]
    fn object_equality_is_order_insensitive() {
        let a = Value::from_json(r#"{"a":1,"b":2}"#).unwrap();
        let b = Value::from_json(r#"{"b":2,"a":1}"#).unwrap();
        let c = Value::from_json(r#"{"b":2,"a":2}"#).unwrap();
        assert!(a.structural_eq(&b));
        assert!(b.structural_eq(&a));
        assert!(!a.structural_eq(&c));
    }

    #[test]
    fn array_equality_is_ordered() {
        let a = Value::from_json("[1,2,3]").unwrap();
        let b = Value::from_json("[1,2,3]").unwrap();
        let c = Value::from_json("[3,2,1]").unwrap();
        assert!(a.structural_eq(&b));
        assert!(!a.structural_eq(&c));
    }

    #[test]
    fn entries_follow_document_order() {
        let doc = Value::from_json(r#"{"z":1,"a":[10,20]}"#).unwrap();
        let keys: Vec<String> = doc.entries().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, ["z", "a"]);

        let arr = doc.get("a").unwrap();
        let keys: Vec<String> = arr.entries().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, ["0", "1"]);
        assert!(arr.entries().next().unwrap().0.matches("0"));
    }

    #[test]
    fn equality_symmetry_and_transitivity() {
        let ints = [Value::Int(2), Value::Double(2.0), Value::Int(2)];
        for a in &ints {
            for b in &ints {
                assert_eq!(a.structural_eq(b), b.structural_eq(a));
            }
        }
        assert!(ints[0].structural_eq(&ints[1]));
        assert!(ints[1].structural_eq(&ints[2]));
        assert!(ints[0].structural_eq(&ints[2]));
    }
}
