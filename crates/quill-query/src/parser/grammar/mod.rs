//! Grammar functions, one module per construct family.

pub(crate) mod expr;
pub(crate) mod filter;
pub(crate) mod json;
pub(crate) mod projection;

use crate::ast::ApplyClause;
use crate::ast::Query;
use crate::ast::DEFAULT_MATCH_DEPTH_LIMIT;
use crate::error::ParseError;
use crate::lexer::TokenKind;
use crate::parser::Parser;

/// ```txt
/// Query
///     FilterChain ApplyClause? ProjectionChain?
/// ```
pub(crate) fn query(p: &mut Parser) -> Result<Query, ParseError> {
    let filters = filter::filter_chain(p)?;
    let mut apply = None;
    let mut projection = Vec::new();
    while p.at(TokenKind::Pipe) {
        p.bump();
        if p.at_keyword("apply") {
            p.bump();
            if apply.is_some() {
                return Err(p.err("duplicate apply clause"));
            }
            apply = Some(apply_clause(p)?);
        } else if p.at_keyword("fields") {
            p.bump();
            if !projection.is_empty() {
                return Err(p.err("duplicate fields clause"));
            }
            projection = projection::projection_chain(p)?;
        } else {
            return Err(p.expected("`apply` or `fields`"));
        }
    }
    if !p.at(TokenKind::Eof) {
        return Err(p.expected("end of query"));
    }
    Ok(Query {
        filters,
        apply,
        projection,
        match_depth_limit: DEFAULT_MATCH_DEPTH_LIMIT,
    })
}

/// ```txt
/// ApplyClause
///     'apply' (JsonLiteral | Placeholder)
/// ```
fn apply_clause(p: &mut Parser) -> Result<ApplyClause, ParseError> {
    match p.peek() {
        TokenKind::Colon => Ok(ApplyClause::Placeholder(expr::placeholder(p)?)),
        TokenKind::LBrace | TokenKind::LBracket => Ok(ApplyClause::Json(json::value(p)?)),
        _ => Err(p.expected("a JSON patch or a placeholder")),
    }
}
