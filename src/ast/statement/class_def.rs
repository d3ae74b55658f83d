use crate::{ast::Type, lexer::Span};

use super::FuncDef;

/// A class-level (static) typed attribute declaration within a class body.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClassAttr {
    pub name: String,
    pub declared_type: Type,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClassDef<T> {
    pub name: String,
    pub base: Option<String>,
    pub class_attrs: Vec<ClassAttr>,
    pub methods: Vec<FuncDef<T>>,
    pub span: Span,
}
