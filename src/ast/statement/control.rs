use crate::{
    ast::{expression::Expr, statement::Stmt},
    lexer::Span,
};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct If<T> {
    pub condition: Box<Expr<T>>,
    pub then_body: Vec<Stmt<T>>,
    /// `elif` clauses, in source order.
    pub elifs: Vec<(Expr<T>, Vec<Stmt<T>>)>,
    pub else_body: Option<Vec<Stmt<T>>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct While<T> {
    pub condition: Box<Expr<T>>,
    pub body: Vec<Stmt<T>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct For<T> {
    pub var: String,
    /// Always a `range(...)` call (spec §4.3); kept as a general expression
    /// so the grammar doesn't need a dedicated production, with the
    /// restriction enforced by the type checker.
    pub iter: Box<Expr<T>>,
    pub body: Vec<Stmt<T>>,
    pub span: Span,
}
