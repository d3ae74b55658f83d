//! Unified diagnostic rendering (C8): wraps the per-phase error types in one
//! enum so the driver binary has a single place to print a phase-tagged,
//! span-located, source-excerpted message and pick an exit code (spec §7
//! "Error Handling Design").
use std::fmt;

use colored::Colorize;

use crate::{lexer::LexError, lexer::Span, parser::ParseError, reader::SourceFile, typechecker::TypeError};

#[derive(Debug, Clone)]
pub enum CompileError {
    Lex(LexError),
    Parse(ParseError),
    Type(TypeError),
}

impl CompileError {
    fn phase(&self) -> &'static str {
        match self {
            CompileError::Lex(_) => "LexerError",
            CompileError::Parse(_) => "ParserError",
            CompileError::Type(_) => "TypeError",
        }
    }

    fn message(&self) -> &str {
        match self {
            CompileError::Lex(e) => &e.message,
            CompileError::Parse(e) => &e.message,
            CompileError::Type(e) => &e.message,
        }
    }

    fn span(&self) -> Span {
        match self {
            CompileError::Lex(e) => e.span,
            CompileError::Parse(e) => e.span,
            CompileError::Type(e) => e.span,
        }
    }

    /// Distinct, stable exit codes per phase (spec §6: "the non-zero value
    /// need not distinguish phases but the message must identify the
    /// phase" — going a step further than required costs nothing and is
    /// useful for scripting against the driver).
    pub fn exit_code(&self) -> i32 {
        match self {
            CompileError::Lex(_) => 2,
            CompileError::Parse(_) => 3,
            CompileError::Type(_) => 4,
        }
    }

    /// Renders the error with a source excerpt and a caret underline,
    /// colored when the terminal supports it (`colored` degrades to plain
    /// text automatically when stdout isn't a tty or `NO_COLOR` is set).
    pub fn render(&self, source: &SourceFile) -> String {
        let span = self.span();
        let line_text = source.line(span.line);
        let gutter = format!("{}", span.line);
        let pad: String = " ".repeat(gutter.len());
        let caret_pad = " ".repeat(span.col.saturating_sub(1));
        let carets = "^".repeat(span.len.max(1));

        format!(
            "{}: {}\n{pad} {} {}:{span}\n{} {} {line_text}\n{pad} {} {caret_pad}{}",
            self.phase().red().bold(),
            self.message(),
            "-->".blue().bold(),
            source.name(),
            gutter.blue().bold(),
            "|".blue().bold(),
            "|".blue().bold(),
            carets.red().bold(),
        )
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.phase(), self.message(), self.span())
    }
}

impl std::error::Error for CompileError {}

impl From<LexError> for CompileError {
    fn from(e: LexError) -> Self {
        CompileError::Lex(e)
    }
}

impl From<ParseError> for CompileError {
    fn from(e: ParseError) -> Self {
        CompileError::Parse(e)
    }
}

impl From<TypeError> for CompileError {
    fn from(e: TypeError) -> Self {
        CompileError::Type(e)
    }
}
