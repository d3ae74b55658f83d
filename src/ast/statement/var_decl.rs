use crate::{ast::expression::Expr, ast::Type, lexer::Span};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VarDecl<T> {
    pub name: String,
    pub declared_type: Type,
    pub init: Box<Expr<T>>,
    pub info: T,
    pub span: Span,
}
