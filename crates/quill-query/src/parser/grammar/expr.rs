use crate::ast::Atom;
use crate::ast::Comparison;
use crate::ast::Op;
use crate::ast::OpKind;
use crate::ast::Operand;
use crate::ast::PredicateExpr;
use crate::ast::PredicateLink;
use crate::error::ParseError;
use crate::lexer::TokenKind;
use crate::node::Node;
use crate::parser::grammar::filter::join_opt;
use crate::parser::grammar::json;
use crate::parser::Parser;

/// ```txt
/// PredicateGroup
///     '[' Predicate ']'
/// ```
pub(crate) fn predicate_group(p: &mut Parser) -> Result<Node<PredicateExpr>, ParseError> {
    let start = p.start();
    p.expect(TokenKind::LBracket, "`[`")?;
    let expr = p.descend(predicate)?;
    p.expect(TokenKind::RBracket, "`]`")?;
    Ok(Node::new_parsed(expr, p.span(start)))
}

/// ```txt
/// Predicate
///     Atom (Join Atom)*
/// ```
pub(crate) fn predicate(p: &mut Parser) -> Result<PredicateExpr, ParseError> {
    let mut links = vec![PredicateLink {
        join: None,
        atom: atom(p)?,
    }];
    while let Some(join) = join_opt(p)? {
        links.push(PredicateLink {
            join: Some(join),
            atom: atom(p)?,
        });
    }
    Ok(PredicateExpr(links))
}

/// ```txt
/// Atom
///     ['not'] (Operand Op Operand | PredicateGroup)
/// ```
///
/// A leading `[` is ambiguous: `[a = 1]` is a grouped sub-predicate,
/// `[[* = k] = 2]` starts a comparison whose left operand constrains the
/// key, and `[1,2] in x` starts with a JSON array. Resolved by parsing the
/// bracketed predicate first and backtracking to a JSON literal when that
/// fails.
fn atom(p: &mut Parser) -> Result<Atom, ParseError> {
    let start = p.start();
    if p.at_keyword("not") {
        p.bump();
        p.set_negate();
    }
    if p.at(TokenKind::LBracket) {
        let checkpoint = p.checkpoint();
        match predicate_group(p) {
            Ok(group) => {
                if !at_op(p) {
                    return Ok(Atom::Nested {
                        negate: p.take_negate(),
                        expr: group,
                    });
                }
                let op = op(p)?;
                let right = operand(p)?;
                let cmp = Comparison::new(Operand::Expr(group), op, right);
                return Ok(Atom::Comparison(Node::new_parsed(cmp, p.span(start))));
            }
            Err(_) => p.rewind(checkpoint),
        }
    }
    let left = operand(p)?;
    let op = op(p)?;
    let right = operand(p)?;
    let cmp = Comparison::new(left, op, right);
    Ok(Atom::Comparison(Node::new_parsed(cmp, p.span(start))))
}

/// Whether the current token can begin an `Op`. A `not` only counts when
/// it is not itself the start of a join (`not and` / `not or`).
fn at_op(p: &mut Parser) -> bool {
    match p.peek() {
        TokenKind::Eq
        | TokenKind::NotEq
        | TokenKind::Gt
        | TokenKind::GtEq
        | TokenKind::Lt
        | TokenKind::LtEq
        | TokenKind::Bang => true,
        TokenKind::Ident => match p.current().data() {
            "eq" | "gt" | "gte" | "lt" | "lte" | "in" | "ni" | "re" | "like" => true,
            "not" => {
                let next = p.peek_next();
                next.kind() != TokenKind::Ident || !matches!(next.data(), "and" | "or")
            }
            _ => false,
        },
        _ => false,
    }
}

/// ```txt
/// Op
///     ['!' | 'not'] ('=' | 'eq' | '>' | 'gt' | '>=' | 'gte' | '<' | 'lt'
///                   | '<=' | 'lte' | 'in' | 'ni' | 're' | 'like')
/// ```
///
/// `!=` arrives pre-joined from the lexer; `like` folds into `re`.
fn op(p: &mut Parser) -> Result<Op, ParseError> {
    if p.at_keyword("not") {
        p.bump();
        p.set_negate();
    }
    let mut negate = false;
    if p.at(TokenKind::Bang) {
        p.bump();
        negate = true;
    }
    let kind = match p.peek() {
        TokenKind::Eq => OpKind::Eq,
        TokenKind::NotEq => {
            negate = !negate;
            OpKind::Eq
        }
        TokenKind::Gt => OpKind::Gt,
        TokenKind::GtEq => OpKind::Gte,
        TokenKind::Lt => OpKind::Lt,
        TokenKind::LtEq => OpKind::Lte,
        TokenKind::Ident => match p.current().data() {
            "eq" => OpKind::Eq,
            "gt" => OpKind::Gt,
            "gte" => OpKind::Gte,
            "lt" => OpKind::Lt,
            "lte" => OpKind::Lte,
            "in" => OpKind::In,
            "ni" => OpKind::Ni,
            "re" | "like" => OpKind::Re,
            _ => return Err(p.expected("an operator")),
        },
        _ => return Err(p.expected("an operator")),
    };
    p.bump();
    Ok(Op {
        kind,
        negate: negate ^ p.take_negate(),
    })
}

/// ```txt
/// Operand
///     FieldRef | '*' | Placeholder | JsonLiteral | PredicateGroup
/// ```
pub(crate) fn operand(p: &mut Parser) -> Result<Operand, ParseError> {
    match p.peek() {
        TokenKind::Star => {
            p.bump();
            Ok(Operand::Any)
        }
        TokenKind::Colon => Ok(Operand::Placeholder(placeholder(p)?)),
        TokenKind::Ident => {
            let t = p.bump();
            match t.data() {
                "true" => Ok(Operand::Json(quill_json::Value::Bool(true))),
                "false" => Ok(Operand::Json(quill_json::Value::Bool(false))),
                "null" => Ok(Operand::Json(quill_json::Value::Null)),
                name => Ok(Operand::Field(name.to_string())),
            }
        }
        TokenKind::Int | TokenKind::Float | TokenKind::StringValue | TokenKind::LBrace => {
            Ok(Operand::Json(json::value(p)?))
        }
        TokenKind::LBracket => {
            let checkpoint = p.checkpoint();
            match predicate_group(p) {
                Ok(group) => Ok(Operand::Expr(group)),
                Err(_) => {
                    p.rewind(checkpoint);
                    Ok(Operand::Json(json::value(p)?))
                }
            }
        }
        _ => Err(p.expected("an operand")),
    }
}

/// ```txt
/// Placeholder
///     ':' Ident
/// ```
///
/// The name must follow the colon with no space in between.
pub(crate) fn placeholder(p: &mut Parser) -> Result<String, ParseError> {
    let colon = p.expect(TokenKind::Colon, "`:`")?;
    let name = p.current();
    if name.kind() != TokenKind::Ident || name.index() != colon.index() + 1 {
        return Err(p.expected("a placeholder name"));
    }
    p.bump();
    Ok(name.data().to_string())
}
