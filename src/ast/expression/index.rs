use crate::lexer::Span;

use super::Expr;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IndexExpr<T> {
    pub base: Box<Expr<T>>,
    pub index: Box<Expr<T>>,
    pub info: T,
    pub span: Span,
}
