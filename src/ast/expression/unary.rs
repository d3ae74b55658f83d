use crate::lexer::Span;

use super::Expr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct UnaryExpr<T> {
    pub op: UnaryOp,
    pub operand: Box<Expr<T>>,
    pub info: T,
    pub span: Span,
}
