use crate::ast::ChainLink;
use crate::ast::Filter;
use crate::ast::FilterChain;
use crate::ast::FilterItem;
use crate::ast::Join;
use crate::ast::JoinKind;
use crate::ast::PathNode;
use crate::error::ParseError;
use crate::lexer;
use crate::lexer::TokenKind;
use crate::node::Node;
use crate::parser::grammar::expr;
use crate::parser::Parser;

/// ```txt
/// FilterChain
///     FilterPiece (Join FilterPiece)*
/// FilterPiece
///     Filter | '(' FilterChain ')'
/// ```
pub(crate) fn filter_chain(p: &mut Parser) -> Result<FilterChain, ParseError> {
    let mut links = vec![ChainLink {
        join: None,
        item: chain_item(p)?,
    }];
    while let Some(join) = join_opt(p)? {
        links.push(ChainLink {
            join: Some(join),
            item: chain_item(p)?,
        });
    }
    Ok(FilterChain(links))
}

fn chain_item(p: &mut Parser) -> Result<FilterItem, ParseError> {
    if p.at(TokenKind::LParen) {
        p.bump();
        let inner = p.descend(filter_chain)?;
        p.expect(TokenKind::RParen, "`)`")?;
        Ok(FilterItem::Group(inner))
    } else {
        Ok(FilterItem::Path(filter(p)?))
    }
}

/// ```txt
/// Join
///     ['not'] ('and' | 'or')
/// ```
///
/// Returns `None` when the next token does not start a join; a lone `not`
/// in join position is a syntax error. A trailing join with no right-hand
/// side is likewise rejected by the caller's next `FilterPiece`/`Atom`.
pub(crate) fn join_opt(p: &mut Parser) -> Result<Option<Join>, ParseError> {
    if p.at_keyword("not") {
        let next = p.peek_next();
        if next.kind() != TokenKind::Ident || !matches!(next.data(), "and" | "or") {
            return Ok(None);
        }
        p.bump();
        p.set_negate();
    }
    let kind = if p.at_keyword("and") {
        JoinKind::And
    } else if p.at_keyword("or") {
        JoinKind::Or
    } else {
        return Ok(None);
    };
    p.bump();
    Ok(Some(Join {
        kind,
        negate: p.take_negate(),
    }))
}

/// ```txt
/// Filter
///     ('@' Ident)? PathNode+
/// ```
fn filter(p: &mut Parser) -> Result<Node<Filter>, ParseError> {
    let start = p.start();
    let anchor = if p.at(TokenKind::At) {
        p.bump();
        let name = p.expect(TokenKind::Ident, "an anchor name")?;
        Some(name.data().to_string())
    } else {
        None
    };
    if !p.at(TokenKind::Slash) {
        return Err(p.expected("`/`"));
    }
    let mut path = Vec::new();
    while p.at(TokenKind::Slash) {
        path.push(path_node(p)?);
    }
    Ok(Node::new_parsed(Filter { anchor, path }, p.span(start)))
}

/// ```txt
/// PathNode
///     '/' (Field | '*' | '**' | '[' Predicate ']')
/// ```
fn path_node(p: &mut Parser) -> Result<PathNode, ParseError> {
    p.bump(); // the slash
    match p.peek() {
        TokenKind::Star => {
            p.bump();
            Ok(PathNode::Any)
        }
        TokenKind::StarStar => {
            p.bump();
            Ok(PathNode::AnyRecursive)
        }
        // Bare words and integers address object keys and array positions.
        TokenKind::Ident | TokenKind::Int => Ok(PathNode::Field(p.bump().data().to_string())),
        TokenKind::StringValue => Ok(PathNode::Field(lexer::unescape(p.bump().data()))),
        TokenKind::LBracket => Ok(PathNode::Expr(expr::predicate_group(p)?)),
        _ => Err(p.expected("a path segment")),
    }
}
