use crate::ast::Projection;
use crate::ast::ProjectionNode;
use crate::error::ParseError;
use crate::lexer;
use crate::lexer::TokenKind;
use crate::node::Node;
use crate::parser::Parser;

/// ```txt
/// ProjectionChain
///     Projection (',' Projection)*
/// ```
pub(crate) fn projection_chain(p: &mut Parser) -> Result<Vec<Node<Projection>>, ParseError> {
    let mut list = vec![projection(p)?];
    while p.at(TokenKind::Comma) {
        p.bump();
        list.push(projection(p)?);
    }
    Ok(list)
}

/// ```txt
/// Projection
///     ['-'] ProjectionNode+
/// ```
fn projection(p: &mut Parser) -> Result<Node<Projection>, ParseError> {
    let start = p.start();
    let exclude = if p.at(TokenKind::Minus) {
        p.bump();
        true
    } else {
        false
    };
    if !p.at(TokenKind::Slash) {
        return Err(p.expected("`/`"));
    }
    let mut path = Vec::new();
    while p.at(TokenKind::Slash) {
        path.push(projection_node(p)?);
    }
    Ok(Node::new_parsed(Projection { exclude, path }, p.span(start)))
}

/// ```txt
/// ProjectionNode
///     '/' (Field | '*' | '**' | '{' Ident (',' Ident)* '}')
/// ```
fn projection_node(p: &mut Parser) -> Result<ProjectionNode, ParseError> {
    p.bump(); // the slash
    match p.peek() {
        TokenKind::Star => {
            p.bump();
            Ok(ProjectionNode::Any)
        }
        TokenKind::StarStar => {
            p.bump();
            Ok(ProjectionNode::AnyRecursive)
        }
        TokenKind::Ident | TokenKind::Int => {
            Ok(ProjectionNode::Field(p.bump().data().to_string()))
        }
        TokenKind::StringValue => Ok(ProjectionNode::Field(lexer::unescape(p.bump().data()))),
        TokenKind::LBrace => {
            p.bump();
            let mut names = vec![field_name(p)?];
            while p.at(TokenKind::Comma) {
                p.bump();
                names.push(field_name(p)?);
            }
            p.expect(TokenKind::RBrace, "`}`")?;
            Ok(ProjectionNode::Fields(names))
        }
        _ => Err(p.expected("a projection segment")),
    }
}

fn field_name(p: &mut Parser) -> Result<String, ParseError> {
    match p.peek() {
        TokenKind::Ident => Ok(p.bump().data().to_string()),
        TokenKind::StringValue => Ok(lexer::unescape(p.bump().data())),
        _ => Err(p.expected("a field name")),
    }
}
