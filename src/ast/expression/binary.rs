use crate::lexer::Span;

use super::Expr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Is,
    IsNot,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BinaryExpr<T> {
    pub op: BinaryOp,
    pub lhs: Box<Expr<T>>,
    pub rhs: Box<Expr<T>>,
    pub info: T,
    pub span: Span,
}
