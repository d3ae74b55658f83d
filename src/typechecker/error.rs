use std::{error::Error, fmt::Display};

use crate::lexer::Span;

/// A static-checking failure (spec §4.3/§7): undeclared name, type mismatch,
/// heterogeneous literal, bad operand, unknown attribute, arity mismatch,
/// inheritance cycle. The checker halts at the first one.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeError {
    pub message: String,
    pub span: Span,
}

impl TypeError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self { message: message.into(), span }
    }
}

impl Display for TypeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.span)
    }
}

impl Error for TypeError {}

pub type TypeResult<T> = Result<T, TypeError>;
