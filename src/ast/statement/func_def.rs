use crate::{ast::expression::Expr, ast::Type, lexer::Span};

use super::Stmt;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Param<T> {
    pub name: String,
    /// `None` only for a method's implicit `self` (spec §4.3: "class (when
    /// inside a method, via implicit self)"). Every other parameter requires
    /// an explicit annotation, enforced by the parser. The type checker
    /// fills `self`'s type in from the enclosing class.
    pub declared_type: Option<Type>,
    pub default: Option<Expr<T>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FuncDef<T> {
    pub name: String,
    pub params: Vec<Param<T>>,
    pub return_type: Type,
    pub body: Vec<Stmt<T>>,
    pub span: Span,
}

impl<T> FuncDef<T> {
    /// Number of parameters that must be supplied positionally (no default).
    pub fn required_params(&self) -> usize {
        self.params.iter().take_while(|p| p.default.is_none()).count()
    }
}
