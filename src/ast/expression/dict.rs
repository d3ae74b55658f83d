use crate::lexer::Span;

use super::Expr;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DictLit<T> {
    /// Keys are always string literals (spec §3/§4.3); kept as full
    /// expressions so the parser doesn't need a separate string-literal-only
    /// production, with the str-ness enforced by the type checker.
    pub pairs: Vec<(Expr<T>, Expr<T>)>,
    pub info: T,
    pub span: Span,
}
