use crate::{
    ast::{expression::Expr, statement::Stmt},
    lexer::Span,
};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExceptHandler<T> {
    pub exc_name: String,
    pub alias: Option<String>,
    pub body: Vec<Stmt<T>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Try<T> {
    pub body: Vec<Stmt<T>>,
    pub handlers: Vec<ExceptHandler<T>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Raise<T> {
    pub exception: Box<Expr<T>>,
    pub span: Span,
}
