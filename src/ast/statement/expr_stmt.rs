use crate::{ast::expression::Expr, lexer::Span};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExprStmt<T> {
    pub expr: Box<Expr<T>>,
    pub span: Span,
}
