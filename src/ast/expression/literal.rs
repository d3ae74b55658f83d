use crate::lexer::Span;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IntLit<T> {
    pub value: i64,
    pub info: T,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FloatLit<T> {
    pub value: f64,
    pub info: T,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StrLit<T> {
    pub value: String,
    pub info: T,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoolLit<T> {
    pub value: bool,
    pub info: T,
    pub span: Span,
}
