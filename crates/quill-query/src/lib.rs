#![doc = include_str!("../README.md")]

pub mod ast;
mod error;
mod lexer;
mod limit;
mod matcher;
mod node;
mod parser;
mod project;

pub use crate::ast::Query;
pub use crate::error::MatchError;
pub use crate::error::ParseError;
pub use crate::lexer::Lexer;
pub use crate::lexer::Token;
pub use crate::lexer::TokenKind;
pub use crate::limit::LimitTracker;
pub use crate::matcher::Bindings;
pub use crate::node::Node;
pub use crate::node::SourceSpan;
pub use crate::parser::Parser;

pub use quill_json::Value;
