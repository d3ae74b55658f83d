use crate::lexer::Span;

use super::Expr;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ListLit<T> {
    pub elements: Vec<Expr<T>>,
    pub info: T,
    pub span: Span,
}
