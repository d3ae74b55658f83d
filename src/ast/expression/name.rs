use crate::lexer::Span;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NameExpr<T> {
    pub id: String,
    pub info: T,
    pub span: Span,
}
