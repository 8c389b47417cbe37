//! Typed, immutable query AST.
//!
//! The parser builds this tree bottom-up; after a successful parse it never
//! changes. Non-leaf constructs are wrapped in [`Node`], so cloning a
//! [`Query`] shares structure instead of copying subtrees.
//!
//! [`Display`][std::fmt::Display] and [`serialize`][Query::serialize]
//! re-emit the canonical query text, lossless modulo whitespace; golden
//! tests compare fixtures against that form.

mod serialize;

use std::sync::OnceLock;

use quill_json::Value;
use regex::Regex;

use crate::node::Node;

pub use serialize::Serialize;

pub(crate) const DEFAULT_MATCH_DEPTH_LIMIT: usize = 512;

/// A parsed query: a chain of filters with optional `apply` and `fields`
/// clauses.
///
/// Immutable after parse and safe to share across threads.
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    pub(crate) filters: FilterChain,
    pub(crate) apply: Option<ApplyClause>,
    pub(crate) projection: Vec<Node<Projection>>,
    pub(crate) match_depth_limit: usize,
}

impl Query {
    pub fn filters(&self) -> &FilterChain {
        &self.filters
    }

    pub fn apply(&self) -> Option<&ApplyClause> {
        self.apply.as_ref()
    }

    pub fn projection(&self) -> &[Node<Projection>] {
        &self.projection
    }

    /// Bound the document descent of [`matched`] and [`execute`]. Defaults
    /// to 512.
    ///
    /// [`matched`]: Query::matched
    /// [`execute`]: Query::execute
    pub fn with_match_depth_limit(mut self, limit: usize) -> Self {
        self.match_depth_limit = limit;
        self
    }
}

/// Filters joined left-to-right by `and`/`or`.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterChain(pub Vec<ChainLink>);

impl FilterChain {
    pub fn links(&self) -> &[ChainLink] {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChainLink {
    /// `None` on the first link of a chain.
    pub join: Option<Join>,
    pub item: FilterItem,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FilterItem {
    Path(Node<Filter>),
    /// A parenthesized subchain.
    Group(FilterChain),
}

/// One rooted path with optional predicates, e.g. `/foo/**/[bar > 2]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    /// `@name` prefix; named filters are passed through to the caller and
    /// not otherwise interpreted here.
    pub anchor: Option<String>,
    /// Path segments, never empty.
    pub path: Vec<PathNode>,
}

/// One `/`-separated path segment.
#[derive(Clone, Debug, PartialEq)]
pub enum PathNode {
    Field(String),
    /// `*`: any single child.
    Any,
    /// `**`: any chain of zero or more segments.
    AnyRecursive,
    /// `[...]`: a predicate over the node visited at this position.
    Expr(Node<PredicateExpr>),
}

/// Atoms joined left-to-right by `and`/`or`.
#[derive(Clone, Debug, PartialEq)]
pub struct PredicateExpr(pub Vec<PredicateLink>);

impl PredicateExpr {
    pub fn links(&self) -> &[PredicateLink] {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PredicateLink {
    /// `None` on the first link.
    pub join: Option<Join>,
    pub atom: Atom,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Atom {
    Comparison(Node<Comparison>),
    /// A bracketed sub-predicate used as a boolean.
    Nested {
        negate: bool,
        expr: Node<PredicateExpr>,
    },
}

/// A leaf comparison, `left op right`.
#[derive(Debug)]
pub struct Comparison {
    pub left: Operand,
    pub op: Op,
    pub right: Operand,
    /// Compiled pattern for `re` with a literal right-hand side, filled on
    /// first use and shared by every clone of this node.
    pub(crate) regex: OnceLock<Regex>,
}

impl Comparison {
    pub fn new(left: Operand, op: Op, right: Operand) -> Self {
        Comparison {
            left,
            op,
            right,
            regex: OnceLock::new(),
        }
    }
}

impl Clone for Comparison {
    fn clone(&self) -> Self {
        Comparison {
            left: self.left.clone(),
            op: self.op,
            right: self.right.clone(),
            regex: self.regex.clone(),
        }
    }
}

impl PartialEq for Comparison {
    fn eq(&self, other: &Self) -> bool {
        // The regex cache is derived state.
        self.left == other.left && self.op == other.op && self.right == other.right
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Op {
    pub kind: OpKind,
    pub negate: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpKind {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Left value is an element of the right array.
    In,
    /// Right value is an element of the left array.
    Ni,
    /// Regular expression search; `like` parses to this.
    Re,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Join {
    pub kind: JoinKind,
    pub negate: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinKind {
    And,
    Or,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// A bare word referencing a field of the node under test; in value
    /// position it evaluates as its name.
    Field(String),
    /// `*`: the key of the node under test.
    Any,
    /// `:name`, resolved from the bindings at match time.
    Placeholder(String),
    Json(Value),
    /// A bracketed sub-predicate; as a left operand it constrains the key.
    Expr(Node<PredicateExpr>),
}

/// The `| apply …` clause: a patch applied to a matched document.
#[derive(Clone, Debug, PartialEq)]
pub enum ApplyClause {
    /// An array is an RFC6902 operation list, an object a merge patch.
    Json(Value),
    Placeholder(String),
}

/// One entry of the `| fields …` clause.
#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    pub exclude: bool,
    /// Path segments, never empty.
    pub path: Vec<ProjectionNode>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ProjectionNode {
    Field(String),
    Any,
    AnyRecursive,
    /// `{a,b}`: any one of the named fields.
    Fields(Vec<String>),
}
