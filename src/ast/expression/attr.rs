use crate::lexer::Span;

use super::Expr;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AttrExpr<T> {
    pub base: Box<Expr<T>>,
    pub name: String,
    pub info: T,
    pub span: Span,
}
