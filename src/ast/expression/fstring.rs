use crate::lexer::Span;

use super::Expr;

/// One alternating segment of an f-string: literal text, or an embedded
/// expression (spec §3/§4.1).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum FStringSegment<T> {
    Text(String),
    Expr(Expr<T>),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FStringLit<T> {
    pub segments: Vec<FStringSegment<T>>,
    pub info: T,
    pub span: Span,
}
