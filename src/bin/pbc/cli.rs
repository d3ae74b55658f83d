//! # Cli
//!
//! This module contains everything needed for parsing the CLI arguments for pbc.

use clap::{Parser, ValueEnum};

/// Struct containing the CLI configuration for pbc.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// The path to the PB source file.
    #[arg(index = 1)]
    pub file: std::path::PathBuf,

    /// Specify the log level of the compiler.
    #[arg(value_enum, short, long, default_value_t = LogLevel::default())]
    pub verbosity: LogLevel,

    /// Whether to dump the parsed (untyped) AST as JSON (for debugging).
    #[arg(long)]
    pub dump_ast: bool,

    /// Whether to dump the lexed token stream as JSON (for debugging).
    #[arg(long)]
    pub dump_tokens: bool,

    /// The path to the generated C99 file. Defaults to the input file's stem
    /// with a `.c` extension next to it.
    #[arg(short, long)]
    pub output: Option<std::path::PathBuf>,

    /// Invoke `cc` against the generated C file and the bundled runtime,
    /// producing a native binary.
    #[arg(long)]
    pub build: bool,

    /// Like `--build`, but also runs the resulting binary afterwards,
    /// streaming its stdout/stderr through.
    #[arg(long)]
    pub run: bool,
}

impl Cli {
    pub fn init() -> Self {
        Cli::parse()
    }
}

/// Enum for specifying the log level of pbc.
#[derive(ValueEnum, Clone, Default, Debug)]
pub enum LogLevel {
    /// The default log level. Only critical errors will be logged.
    #[default]
    #[value(alias("0"))]
    Error,

    /// A log level, where also warnings are logged.
    #[value(alias("1"))]
    Warn,

    /// Also log information about the general state of the compiler, e.g.,
    /// which phase is currently running.
    #[value(alias("2"))]
    Info,

    /// Log everything which happens internally in the compiler.
    /// Note: This output can be quite clunky, since _very much_ will be logged.
    #[value(alias("3"))]
    Debug,

    /// Log extra information. This can include more precise debug output or
    /// even non-critical errors.
    #[value(alias("4"))]
    Trace,
}

impl From<&LogLevel> for log::Level {
    fn from(value: &LogLevel) -> Self {
        match value {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}
