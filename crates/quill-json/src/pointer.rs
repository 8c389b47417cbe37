//! RFC6901 JSON pointers.

use std::fmt;

use crate::Error;
use crate::Result;
use crate::Value;

/// A parsed RFC6901 pointer.
///
/// The empty pointer addresses the whole document. `~0` and `~1` decode to
/// `~` and `/`; any other `~` sequence is invalid. The `-` segment (end of
/// array) parses like any other segment and only gains meaning in patch
/// `add` operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pointer {
    source: String,
    segments: Vec<String>,
}

impl Pointer {
    pub fn parse(src: &str) -> Result<Pointer> {
        if src.is_empty() {
            return Ok(Pointer {
                source: String::new(),
                segments: Vec::new(),
            });
        }
        let rest = src
            .strip_prefix('/')
            .ok_or_else(|| Error::InvalidPointer(src.to_string()))?;
        let mut segments = Vec::new();
        for raw in rest.split('/') {
            let segment =
                unescape(raw).ok_or_else(|| Error::InvalidPointer(src.to_string()))?;
            segments.push(segment);
        }
        Ok(Pointer {
            source: src.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Decoded path segments, root first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Split into the parent path and the final segment.
    pub(crate) fn split_last(&self) -> Option<(&[String], &str)> {
        let (last, parent) = self.segments.split_last()?;
        Some((parent, last.as_str()))
    }

    /// Whether `self` addresses `other` or one of its ancestors.
    pub fn is_prefix_of(&self, other: &Pointer) -> bool {
        other.segments.len() >= self.segments.len()
            && self.segments == other.segments[..self.segments.len()]
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn unescape(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// Array index syntax: decimal digits without a redundant leading zero.
pub(crate) fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || (segment.len() > 1 && segment.starts_with('0')) {
        return None;
    }
    if !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

impl Value {
    /// Look up the node a pointer addresses.
    pub fn resolve(&self, pointer: &Pointer) -> Result<&Value> {
        let mut current = self;
        for segment in pointer.segments() {
            current = step(current, segment)
                .ok_or_else(|| Error::PathNotFound(pointer.source.clone()))?;
        }
        Ok(current)
    }

    pub fn resolve_mut(&mut self, pointer: &Pointer) -> Result<&mut Value> {
        let mut current = self;
        for segment in pointer.segments() {
            current = step_mut(current, segment)
                .ok_or_else(|| Error::PathNotFound(pointer.source.clone()))?;
        }
        Ok(current)
    }

    /// Remove the addressed node and transfer ownership to the caller.
    ///
    /// Detaching the root takes the whole document, leaving `Null` behind.
    pub fn detach(&mut self, pointer: &Pointer) -> Result<Value> {
        let Some((parent, last)) = pointer.split_last() else {
            return Ok(std::mem::take(self));
        };
        let mut current = self;
        for segment in parent {
            current = step_mut(current, segment)
                .ok_or_else(|| Error::PathNotFound(pointer.source.clone()))?;
        }
        match current {
            Value::Object(fields) => fields
                .shift_remove(last)
                .ok_or_else(|| Error::PathNotFound(pointer.source.clone())),
            Value::Array(items) => match parse_index(last) {
                Some(i) if i < items.len() => Ok(items.remove(i)),
                _ => Err(Error::PathNotFound(pointer.source.clone())),
            },
            _ => Err(Error::PathNotFound(pointer.source.clone())),
        }
    }
}

fn step<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(fields) => fields.get(segment),
        Value::Array(items) => items.get(parse_index(segment)?),
        _ => None,
    }
}

fn step_mut<'a>(value: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match value {
        Value::Object(fields) => fields.get_mut(segment),
        Value::Array(items) => {
            let i = parse_index(segment)?;
            items.get_mut(i)
        }
        _ => None,
    }
}
