use crate::{ast::expression::Expr, lexer::Span};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Assign<T> {
    pub target: Box<Expr<T>>,
    pub value: Box<Expr<T>>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AugOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AugAssign<T> {
    pub op: AugOp,
    pub target: Box<Expr<T>>,
    pub value: Box<Expr<T>>,
    pub span: Span,
}
