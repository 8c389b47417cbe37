use std::fmt;
use std::hash;
use std::ops;

use triomphe::Arc;

/// Byte range of a parsed construct in the original query text.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
}

impl fmt::Debug for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Smart pointer to an AST node.
///
/// Thread-safe and reference-counted, so cloning a [`Query`] or any of its
/// parts is cheap and shares structure. Additionally carries the optional
/// source span of the node in the parsed query text.
///
/// Equality and hashing ignore the span: two nodes parsed from different
/// positions compare equal when their contents do.
///
/// [`Query`]: crate::Query
pub struct Node<T>(Arc<NodeInner<T>>);

#[derive(Clone)]
struct NodeInner<T> {
    span: Option<SourceSpan>,
    node: T,
}

impl<T> Node<T> {
    /// Create a node for something parsed from the given span.
    pub fn new_parsed(node: T, span: SourceSpan) -> Self {
        Self(Arc::new(NodeInner {
            span: Some(span),
            node,
        }))
    }

    /// Create a node for something built programmatically.
    pub fn new(node: T) -> Self {
        Self(Arc::new(NodeInner { span: None, node }))
    }

    pub fn span(&self) -> Option<SourceSpan> {
        self.0.span
    }

    /// Whether two nodes point to the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Mutable access, cloning the payload if it is shared.
    pub fn make_mut(&mut self) -> &mut T
    where
        T: Clone,
    {
        &mut Arc::make_mut(&mut self.0).node
    }
}

impl<T> ops::Deref for Node<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0.node
    }
}

impl<T> AsRef<T> for Node<T> {
    fn as_ref(&self) -> &T {
        self
    }
}

impl<T> Clone for Node<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: fmt::Debug> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(span) = self.span() {
            write!(f, "@{span:?} ")?;
        }
        self.0.node.fmt(f)
    }
}

impl<T: PartialEq> PartialEq for Node<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0.node == other.0.node // span not included
    }
}

impl<T: Eq> Eq for Node<T> {}

impl<T: hash::Hash> hash::Hash for Node<T> {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.0.node.hash(state) // span not included
    }
}
