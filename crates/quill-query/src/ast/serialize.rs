//! Canonical query printer.
//!
//! Re-emits a parsed query losslessly modulo whitespace: parsing the
//! printed text yields a structurally equal AST.

use std::fmt;

use super::*;

/// Serialization builder returned by [`Query::serialize`].
#[derive(Clone, Copy)]
pub struct Serialize<'a> {
    query: &'a Query,
    pretty: bool,
}

impl Query {
    /// Serialize back to query text; [`pretty`][Serialize::pretty] breaks
    /// the chain and the `|` clauses over lines.
    pub fn serialize(&self) -> Serialize<'_> {
        Serialize {
            query: self,
            pretty: false,
        }
    }
}

impl<'a> Serialize<'a> {
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }
}

impl fmt::Display for Serialize<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        chain(f, &self.query.filters, self.pretty)?;
        if let Some(clause) = &self.query.apply {
            apply(f, clause, self.pretty)?;
        }
        if !self.query.projection.is_empty() {
            projections(f, &self.query.projection, self.pretty)?;
        }
        Ok(())
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.serialize().fmt(f)
    }
}

fn chain(f: &mut fmt::Formatter<'_>, list: &FilterChain, pretty: bool) -> fmt::Result {
    for (i, link) in list.links().iter().enumerate() {
        if let Some(j) = &link.join {
            if pretty {
                f.write_str("\n")?;
            } else if i > 0 {
                f.write_str(" ")?;
            }
            join(f, j)?;
            f.write_str(" ")?;
        }
        match &link.item {
            FilterItem::Path(filter) => path_filter(f, filter)?,
            FilterItem::Group(inner) => {
                f.write_str("(")?;
                chain(f, inner, false)?;
                f.write_str(")")?;
            }
        }
    }
    Ok(())
}

fn join(f: &mut fmt::Formatter<'_>, j: &Join) -> fmt::Result {
    if j.negate {
        f.write_str("not ")?;
    }
    match j.kind {
        JoinKind::And => f.write_str("and"),
        JoinKind::Or => f.write_str("or"),
    }
}

fn path_filter(f: &mut fmt::Formatter<'_>, filter: &Filter) -> fmt::Result {
    if let Some(anchor) = &filter.anchor {
        write!(f, "@{anchor}")?;
    }
    for node in &filter.path {
        f.write_str("/")?;
        match node {
            PathNode::Field(name) => f.write_str(name)?,
            PathNode::Any => f.write_str("*")?,
            PathNode::AnyRecursive => f.write_str("**")?,
            PathNode::Expr(expr) => {
                f.write_str("[")?;
                predicate(f, expr)?;
                f.write_str("]")?;
            }
        }
    }
    Ok(())
}

fn predicate(f: &mut fmt::Formatter<'_>, expr: &PredicateExpr) -> fmt::Result {
    for (i, link) in expr.links().iter().enumerate() {
        if let Some(j) = &link.join {
            if i > 0 {
                f.write_str(" ")?;
            }
            join(f, j)?;
            f.write_str(" ")?;
        }
        match &link.atom {
            Atom::Comparison(cmp) => comparison(f, cmp)?,
            Atom::Nested { negate, expr } => {
                if *negate {
                    f.write_str("not ")?;
                }
                f.write_str("[")?;
                predicate(f, expr)?;
                f.write_str("]")?;
            }
        }
    }
    Ok(())
}

fn comparison(f: &mut fmt::Formatter<'_>, cmp: &Comparison) -> fmt::Result {
    operand(f, &cmp.left)?;
    f.write_str(" ")?;
    if cmp.op.negate {
        f.write_str("not ")?;
    }
    f.write_str(match cmp.op.kind {
        OpKind::Eq => "=",
        OpKind::Gt => ">",
        OpKind::Gte => ">=",
        OpKind::Lt => "<",
        OpKind::Lte => "<=",
        OpKind::In => "in",
        OpKind::Ni => "ni",
        OpKind::Re => "re",
    })?;
    f.write_str(" ")?;
    operand(f, &cmp.right)
}

fn operand(f: &mut fmt::Formatter<'_>, op: &Operand) -> fmt::Result {
    match op {
        Operand::Field(name) => f.write_str(name),
        Operand::Any => f.write_str("*"),
        Operand::Placeholder(name) => write!(f, ":{name}"),
        Operand::Json(value) => write!(f, "{value}"),
        Operand::Expr(expr) => {
            f.write_str("[")?;
            predicate(f, expr)?;
            f.write_str("]")
        }
    }
}

fn apply(f: &mut fmt::Formatter<'_>, clause: &ApplyClause, pretty: bool) -> fmt::Result {
    clause_break(f, pretty)?;
    f.write_str("| apply ")?;
    match clause {
        ApplyClause::Json(value) => write!(f, "{value}"),
        ApplyClause::Placeholder(name) => write!(f, ":{name}"),
    }
}

fn projections(
    f: &mut fmt::Formatter<'_>,
    list: &[Node<Projection>],
    pretty: bool,
) -> fmt::Result {
    clause_break(f, pretty)?;
    f.write_str("| fields ")?;
    for (i, projection) in list.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        if projection.exclude {
            f.write_str("-")?;
        }
        for node in &projection.path {
            f.write_str("/")?;
            match node {
                ProjectionNode::Field(name) => f.write_str(name)?,
                ProjectionNode::Any => f.write_str("*")?,
                ProjectionNode::AnyRecursive => f.write_str("**")?,
                ProjectionNode::Fields(names) => {
                    f.write_str("{")?;
                    for (j, name) in names.iter().enumerate() {
                        if j > 0 {
                            f.write_str(",")?;
                        }
                        f.write_str(name)?;
                    }
                    f.write_str("}")?;
                }
            }
        }
    }
    Ok(())
}

fn clause_break(f: &mut fmt::Formatter<'_>, pretty: bool) -> fmt::Result {
    if pretty {
        f.write_str("\n")
    } else {
        f.write_str(" ")
    }
}
