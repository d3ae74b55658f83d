use crate::lexer::Span;

use super::Expr;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CallExpr<T> {
    pub callee: Box<Expr<T>>,
    pub args: Vec<Expr<T>>,
    pub info: T,
    pub span: Span,
}
