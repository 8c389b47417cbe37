//! Query evaluation against a document tree.
//!
//! Matching is pure and deterministic: children are visited in document
//! order, joins fold strictly left-to-right with short-circuiting, and the
//! only allocations are apply/projection outputs and the first compilation
//! of each cached regex.

use std::borrow::Cow;

use indexmap::IndexMap;
use quill_json::KeyRef;
use quill_json::Value;
use regex::Regex;

use crate::ast::ApplyClause;
use crate::ast::Atom;
use crate::ast::Comparison;
use crate::ast::Filter;
use crate::ast::FilterChain;
use crate::ast::FilterItem;
use crate::ast::Join;
use crate::ast::JoinKind;
use crate::ast::OpKind;
use crate::ast::Operand;
use crate::ast::PathNode;
use crate::ast::PredicateExpr;
use crate::ast::Query;
use crate::error::MatchError;
use crate::limit::LimitTracker;
use crate::project;

/// Placeholder values for one match call, keyed by `:name`.
///
/// Read-only during a match; an unresolved placeholder aborts the match.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bindings {
    values: IndexMap<String, Value>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`set`][Bindings::set].
    pub fn bind(mut self, name: impl Into<String>, value: Value) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Query {
    /// Does `doc` satisfy this query?
    pub fn matched(&self, doc: &Value, bindings: &Bindings) -> Result<bool, MatchError> {
        let mut matcher = Matcher {
            bindings,
            depth: LimitTracker::new(self.match_depth_limit),
        };
        matcher.chain(&self.filters, doc)
    }

    /// Run the full pipeline: match, then `apply`, then `fields`.
    ///
    /// Returns `None` when the document does not match; otherwise a new
    /// tree with the apply clause patched in and the projection applied.
    /// Without either clause the matched document is returned unchanged.
    pub fn execute(&self, doc: &Value, bindings: &Bindings) -> Result<Option<Value>, MatchError> {
        if !self.matched(doc, bindings)? {
            return Ok(None);
        }
        let mut out = doc.clone();
        if let Some(clause) = &self.apply {
            let spec = match clause {
                ApplyClause::Json(spec) => spec,
                ApplyClause::Placeholder(name) => lookup(bindings, name)?,
            };
            out.patch_auto(spec)?;
        }
        if !self.projection.is_empty() {
            out = project::project(&out, &self.projection);
        }
        Ok(Some(out))
    }
}

fn lookup<'b>(bindings: &'b Bindings, name: &str) -> Result<&'b Value, MatchError> {
    bindings
        .get(name)
        .ok_or_else(|| MatchError::UnresolvedPlaceholder(name.to_string()))
}

struct Matcher<'a> {
    bindings: &'a Bindings,
    /// Document descent budget, shared across every filter of the query.
    depth: LimitTracker,
}

impl Matcher<'_> {
    fn chain(&mut self, chain: &FilterChain, doc: &Value) -> Result<bool, MatchError> {
        let mut acc = false;
        for link in chain.links() {
            match link.join {
                None => acc = self.item(&link.item, doc)?,
                Some(join) => {
                    // Left-to-right with short-circuiting; a skipped
                    // operand cannot change the accumulator either way.
                    match join.kind {
                        JoinKind::And if !acc => continue,
                        JoinKind::Or if acc => continue,
                        _ => {}
                    }
                    let value = self.item(&link.item, doc)? ^ join.negate;
                    acc = match join.kind {
                        JoinKind::And => acc && value,
                        JoinKind::Or => acc || value,
                    };
                }
            }
        }
        Ok(acc)
    }

    fn item(&mut self, item: &FilterItem, doc: &Value) -> Result<bool, MatchError> {
        match item {
            FilterItem::Path(filter) => self.filter(filter, doc),
            FilterItem::Group(chain) => self.chain(chain, doc),
        }
    }

    fn filter(&mut self, filter: &Filter, doc: &Value) -> Result<bool, MatchError> {
        self.path(&filter.path, 0, doc)
    }

    /// Match the path suffix starting at segment `i` against `node`, the
    /// value reached by the segments before it.
    fn path(&mut self, path: &[PathNode], i: usize, node: &Value) -> Result<bool, MatchError> {
        if i == path.len() {
            return Ok(true);
        }
        if self.depth.limited() {
            return Err(MatchError::DepthLimitExceeded(self.depth.limit));
        }
        match &path[i] {
            PathNode::Field(name) => {
                for (key, child) in node.entries() {
                    if key.matches(name) {
                        return self.step(path, i + 1, child);
                    }
                }
                Ok(false)
            }
            PathNode::Any => {
                for (_, child) in node.entries() {
                    if self.step(path, i + 1, child)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            PathNode::AnyRecursive => {
                // Zero segments consumed at the current node…
                if self.path(path, i + 1, node)? {
                    return Ok(true);
                }
                // …or keep the `**` alive while descending.
                for (_, child) in node.entries() {
                    if self.step(path, i, child)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            PathNode::Expr(pred) => {
                for (key, child) in node.entries() {
                    if self.predicate(pred, &key, child)? && self.step(path, i + 1, child)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// Descend one document level, charging the depth tracker.
    fn step(&mut self, path: &[PathNode], i: usize, child: &Value) -> Result<bool, MatchError> {
        self.depth.consume();
        let result = self.path(path, i, child);
        self.depth.release();
        result
    }

    /// Evaluate a predicate against the visited child `(key, value)`.
    fn predicate(
        &mut self,
        expr: &PredicateExpr,
        key: &KeyRef<'_>,
        value: &Value,
    ) -> Result<bool, MatchError> {
        let mut acc = false;
        for link in expr.links() {
            let join_negate = match link.join {
                None => false,
                Some(join) => {
                    match join.kind {
                        JoinKind::And if !acc => continue,
                        JoinKind::Or if acc => continue,
                        _ => {}
                    }
                    join.negate
                }
            };
            let result = match &link.atom {
                Atom::Comparison(cmp) => self.comparison(cmp, key, value, join_negate)?,
                Atom::Nested { negate, expr } => {
                    self.predicate(expr, key, value)? != (*negate || join_negate)
                }
            };
            acc = match link.join {
                None => result,
                Some(Join {
                    kind: JoinKind::And,
                    ..
                }) => acc && result,
                Some(Join {
                    kind: JoinKind::Or, ..
                }) => acc || result,
            };
        }
        Ok(acc)
    }

    /// One comparison against the visited child.
    ///
    /// A field-name (or nested-expression) left operand is a guard on the
    /// key: when the guard misses, the atom is false regardless of any
    /// negation.
    fn comparison(
        &mut self,
        cmp: &Comparison,
        key: &KeyRef<'_>,
        value: &Value,
        extra_negate: bool,
    ) -> Result<bool, MatchError> {
        let negate = cmp.op.negate || extra_negate;
        let left: Cow<'_, Value> = match &cmp.left {
            Operand::Any => Cow::Owned(Value::String(key.to_string())),
            Operand::Field(name) => {
                if !key.matches(name) {
                    return Ok(false);
                }
                Cow::Borrowed(value)
            }
            Operand::Expr(inner) => {
                if !self.predicate(inner, key, value)? {
                    return Ok(false);
                }
                Cow::Borrowed(value)
            }
            Operand::Placeholder(name) => Cow::Borrowed(lookup(self.bindings, name)?),
            Operand::Json(v) => Cow::Borrowed(v),
        };
        let right: Cow<'_, Value> = match &cmp.right {
            Operand::Json(v) => Cow::Borrowed(v),
            // A bare word in value position is its name.
            Operand::Field(name) => Cow::Owned(Value::String(name.clone())),
            Operand::Any => Cow::Owned(Value::String(key.to_string())),
            Operand::Placeholder(name) => Cow::Borrowed(lookup(self.bindings, name)?),
            Operand::Expr(inner) => {
                Cow::Owned(Value::Bool(self.predicate(inner, key, value)?))
            }
        };
        let result = self.apply_op(cmp, &left, &right)?;
        Ok(result != negate)
    }

    fn apply_op(
        &mut self,
        cmp: &Comparison,
        left: &Value,
        right: &Value,
    ) -> Result<bool, MatchError> {
        Ok(match cmp.op.kind {
            OpKind::Eq => eq_values(left, right),
            OpKind::Gt | OpKind::Gte | OpKind::Lt | OpKind::Lte => {
                // Ordering is numeric only; anything else is false, not an
                // error.
                let ordering = match (left, right) {
                    (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
                    _ => match (left.as_f64(), right.as_f64()) {
                        (Some(a), Some(b)) => a.partial_cmp(&b),
                        _ => None,
                    },
                };
                match ordering {
                    None => false,
                    Some(ordering) => match cmp.op.kind {
                        OpKind::Gt => ordering.is_gt(),
                        OpKind::Gte => ordering.is_ge(),
                        OpKind::Lt => ordering.is_lt(),
                        OpKind::Lte => ordering.is_le(),
                        _ => unreachable!(),
                    },
                }
            }
            OpKind::In => match right.as_array() {
                Some(items) => items.iter().any(|item| eq_values(left, item)),
                None => false,
            },
            OpKind::Ni => match left.as_array() {
                Some(items) => items.iter().any(|item| eq_values(item, right)),
                None => false,
            },
            OpKind::Re => {
                let Some(subject) = text_for_regex(left) else {
                    return Ok(false);
                };
                let Some(pattern) = text_for_regex(right) else {
                    return Ok(false);
                };
                // Patterns from literals compile once per query; a pattern
                // that arrives through a placeholder is compiled per call.
                let cacheable = !matches!(cmp.right, Operand::Placeholder(_));
                let fresh;
                let regex = if cacheable {
                    match cmp.regex.get() {
                        Some(regex) => regex,
                        None => {
                            let compiled = compile(&pattern)?;
                            cmp.regex.get_or_init(|| compiled)
                        }
                    }
                } else {
                    fresh = compile(&pattern)?;
                    &fresh
                };
                regex.is_match(&subject)
            }
        })
    }
}

/// Scalar equality as the matcher sees it: structural equality, plus a
/// number equals a string spelling the same number. The coercion is
/// shallow; strings inside containers stay strings.
fn eq_values(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::String(s), number @ (Value::Int(_) | Value::Double(_)))
        | (number @ (Value::Int(_) | Value::Double(_)), Value::String(s)) => {
            match (s.parse::<f64>(), number.as_f64()) {
                (Ok(a), Some(b)) => a == b,
                _ => false,
            }
        }
        _ => left.structural_eq(right),
    }
}

fn compile(pattern: &str) -> Result<Regex, MatchError> {
    Regex::new(pattern).map_err(|source| MatchError::InvalidRegex {
        pattern: pattern.to_string(),
        source,
    })
}

/// Scalar-to-text coercion for both sides of `re`; containers never match.
fn text_for_regex(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s)),
        Value::Int(i) => Some(Cow::Owned(i.to_string())),
        Value::Double(d) => Some(Cow::Owned(d.to_string())),
        Value::Bool(true) => Some(Cow::Borrowed("true")),
        Value::Bool(false) => Some(Cow::Borrowed("false")),
        Value::Null => Some(Cow::Borrowed("")),
        Value::Array(_) | Value::Object(_) => None,
    }
}
