//! Expression AST nodes (spec §3). Every node is generic over an info
//! parameter `T`: `T = ()` straight out of the parser, `T = Type` once the
//! type checker has run (spec SPEC_FULL.md §3). This is what makes "every
//! expression node has exactly one resolved type after C6" a property the
//! compiler can read off the type system rather than re-derive.
mod attr;
mod binary;
mod call;
mod dict;
mod fstring;
mod index;
mod list;
mod literal;
mod name;
mod unary;

pub use attr::AttrExpr;
pub use binary::{BinaryExpr, BinaryOp};
pub use call::CallExpr;
pub use dict::DictLit;
pub use fstring::{FStringLit, FStringSegment};
pub use index::IndexExpr;
pub use list::ListLit;
pub use literal::{BoolLit, FloatLit, IntLit, StrLit};
pub use name::NameExpr;
pub use unary::{UnaryExpr, UnaryOp};

use crate::lexer::Span;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Expr<T> {
    Int(IntLit<T>),
    Float(FloatLit<T>),
    Str(StrLit<T>),
    FStr(FStringLit<T>),
    Bool(BoolLit<T>),
    Name(NameExpr<T>),
    List(ListLit<T>),
    Dict(DictLit<T>),
    Index(IndexExpr<T>),
    Attr(AttrExpr<T>),
    Call(CallExpr<T>),
    Unary(UnaryExpr<T>),
    Binary(BinaryExpr<T>),
}

impl<T> Expr<T> {
    pub fn span(&self) -> Span {
        match self {
            Expr::Int(n) => n.span,
            Expr::Float(n) => n.span,
            Expr::Str(n) => n.span,
            Expr::FStr(n) => n.span,
            Expr::Bool(n) => n.span,
            Expr::Name(n) => n.span,
            Expr::List(n) => n.span,
            Expr::Dict(n) => n.span,
            Expr::Index(n) => n.span,
            Expr::Attr(n) => n.span,
            Expr::Call(n) => n.span,
            Expr::Unary(n) => n.span,
            Expr::Binary(n) => n.span,
        }
    }
}

impl<T> Expr<T>
where
    T: Clone,
{
    pub fn info(&self) -> T {
        match self {
            Expr::Int(n) => n.info.clone(),
            Expr::Float(n) => n.info.clone(),
            Expr::Str(n) => n.info.clone(),
            Expr::FStr(n) => n.info.clone(),
            Expr::Bool(n) => n.info.clone(),
            Expr::Name(n) => n.info.clone(),
            Expr::List(n) => n.info.clone(),
            Expr::Dict(n) => n.info.clone(),
            Expr::Index(n) => n.info.clone(),
            Expr::Attr(n) => n.info.clone(),
            Expr::Call(n) => n.info.clone(),
            Expr::Unary(n) => n.info.clone(),
            Expr::Binary(n) => n.info.clone(),
        }
    }
}

impl Expr<crate::ast::Type> {
    pub fn ty(&self) -> crate::ast::Type {
        self.info()
    }
}
