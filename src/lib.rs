//! A compiler for PB, a statically-typed, indentation-sensitive,
//! Python-flavoured language that lowers a single source file to a
//! self-contained C99 translation unit.
//!
//! The pipeline mirrors the traditional four-stage shape: [`lexer`] turns
//! source text into tokens, [`parser`] turns tokens into an [`ast::Ast<()>`],
//! [`typechecker`] resolves and checks that tree in place into an
//! `ast::Ast<ast::Type>`, and [`codegen`] renders the checked tree as C.
//! [`diagnostics`] unifies the error types the first three stages produce
//! into one renderable type for the driver binary.
pub mod ast;
pub mod codegen;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod reader;
pub mod typechecker;
