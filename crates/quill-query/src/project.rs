//! `fields` clause materialization.
//!
//! Include entries build a fresh tree containing exactly the selected
//! paths; exclude entries prune afterwards. An exclusion-only chain works
//! on a clone of the whole document.

use indexmap::IndexMap;
use quill_json::KeyRef;
use quill_json::Value;

use crate::ast::Projection;
use crate::ast::ProjectionNode;
use crate::node::Node;

pub(crate) fn project(doc: &Value, projections: &[Node<Projection>]) -> Value {
    let includes: Vec<&[ProjectionNode]> = projections
        .iter()
        .filter(|p| !p.exclude)
        .map(|p| p.path.as_slice())
        .collect();
    let excludes: Vec<&[ProjectionNode]> = projections
        .iter()
        .filter(|p| p.exclude)
        .map(|p| p.path.as_slice())
        .collect();

    let mut out = if includes.is_empty() {
        doc.clone()
    } else {
        let mut active = Vec::new();
        for path in includes {
            push_expanded(path, &mut active);
        }
        include(doc, &active).unwrap_or_else(|| empty_like(doc))
    };
    if !excludes.is_empty() {
        let mut active = Vec::new();
        for path in excludes {
            push_expanded(path, &mut active);
        }
        prune(&mut out, &active);
    }
    out
}

/// Add a path suffix to the active set, unfolding the zero-consumption
/// readings of leading `**` segments.
fn push_expanded<'a>(suffix: &'a [ProjectionNode], active: &mut Vec<&'a [ProjectionNode]>) {
    active.push(suffix);
    if let Some(ProjectionNode::AnyRecursive) = suffix.first() {
        push_expanded(&suffix[1..], active);
    }
}

/// The suffixes that stay active inside the child addressed by `key`.
fn child_suffixes<'a>(
    suffix: &'a [ProjectionNode],
    key: &KeyRef<'_>,
    out: &mut Vec<&'a [ProjectionNode]>,
) {
    let Some((head, tail)) = suffix.split_first() else {
        return;
    };
    match head {
        // `**` consumes this level and stays armed for deeper ones.
        ProjectionNode::AnyRecursive => push_expanded(suffix, out),
        ProjectionNode::Any => push_expanded(tail, out),
        ProjectionNode::Field(name) => {
            if key.matches(name) {
                push_expanded(tail, out);
            }
        }
        ProjectionNode::Fields(names) => {
            if names.iter().any(|name| key.matches(name)) {
                push_expanded(tail, out);
            }
        }
    }
}

/// Build the included subtree; `None` when nothing below survives.
fn include(value: &Value, active: &[&[ProjectionNode]]) -> Option<Value> {
    if active.iter().any(|suffix| suffix.is_empty()) {
        // Fully selected.
        return Some(value.clone());
    }
    match value {
        Value::Object(fields) => {
            let mut out = IndexMap::new();
            for (k, v) in fields {
                let key = KeyRef::Key(k.as_str());
                let mut child_active = Vec::new();
                for suffix in active {
                    child_suffixes(suffix, &key, &mut child_active);
                }
                if child_active.is_empty() {
                    continue;
                }
                if let Some(built) = include(v, &child_active) {
                    out.insert(k.clone(), built);
                }
            }
            (!out.is_empty()).then(|| Value::Object(out))
        }
        Value::Array(items) => {
            let mut out = Vec::new();
            for (i, v) in items.iter().enumerate() {
                let key = KeyRef::Index(i);
                let mut child_active = Vec::new();
                for suffix in active {
                    child_suffixes(suffix, &key, &mut child_active);
                }
                if child_active.is_empty() {
                    continue;
                }
                if let Some(built) = include(v, &child_active) {
                    out.push(built);
                }
            }
            (!out.is_empty()).then(|| Value::Array(out))
        }
        // The path expects more structure than the document has.
        _ => None,
    }
}

/// Remove every child fully selected by an exclude suffix.
fn prune(value: &mut Value, active: &[&[ProjectionNode]]) {
    match value {
        Value::Object(fields) => {
            let mut remove = Vec::new();
            for (k, v) in fields.iter_mut() {
                let key = KeyRef::Key(k.as_str());
                let mut child_active = Vec::new();
                for suffix in active {
                    child_suffixes(suffix, &key, &mut child_active);
                }
                if child_active.iter().any(|suffix| suffix.is_empty()) {
                    remove.push(k.clone());
                } else if !child_active.is_empty() {
                    prune(v, &child_active);
                }
            }
            for k in remove {
                fields.shift_remove(&k);
            }
        }
        Value::Array(items) => {
            let mut remove = Vec::new();
            for (i, v) in items.iter_mut().enumerate() {
                let key = KeyRef::Index(i);
                let mut child_active = Vec::new();
                for suffix in active {
                    child_suffixes(suffix, &key, &mut child_active);
                }
                if child_active.iter().any(|suffix| suffix.is_empty()) {
                    remove.push(i);
                } else if !child_active.is_empty() {
                    prune(v, &child_active);
                }
            }
            for i in remove.into_iter().rev() {
                items.remove(i);
            }
        }
        _ => {}
    }
}

fn empty_like(doc: &Value) -> Value {
    match doc {
        Value::Array(_) => Value::Array(Vec::new()),
        _ => Value::Object(IndexMap::new()),
    }
}
