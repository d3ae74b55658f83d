//! # pbc
//!
//! This binary is the compiler of PB. It combines lexer, parser, type
//! checker, and code generator into a single application, writing the
//! result as a C99 translation unit and optionally invoking `cc` on it.
mod cli;

use cli::*;

use std::{
    error::Error,
    path::{Path, PathBuf},
    process::Command,
};

use log::{error, info};
use pb_lang::{codegen, diagnostics::CompileError, lexer::Lexer, parser::Parser, reader::SourceFile, typechecker};

fn run(source: &SourceFile, args: &Cli) -> Result<(), CompileError> {
    info!("lexing {}", source.name());
    let tokens = Lexer::tokenize(source.text())?;

    if args.dump_tokens {
        println!("{}", serde_json::to_string_pretty(&tokens).unwrap());
    }

    info!("parsing {}", source.name());
    let ast = Parser::parse(tokens)?;

    if args.dump_ast {
        println!("{}", serde_json::to_string_pretty(&ast).unwrap());
    }

    info!("type-checking {}", source.name());
    let checked = typechecker::check_program(ast)?;

    info!("generating C99 for {}", source.name());
    let code = codegen::generate(&checked);

    let out_path = output_path(&source, args);
    std::fs::write(&out_path, code).unwrap_or_else(|e| {
        error!("could not write '{}': {e}", out_path.display());
        std::process::exit(1);
    });
    info!("wrote {}", out_path.display());

    if args.build || args.run {
        let binary_path = out_path.with_extension("");
        build_binary(&out_path, &binary_path);

        if args.run {
            run_binary(&binary_path);
        }
    }

    Ok(())
}

fn output_path(source: &SourceFile, args: &Cli) -> PathBuf {
    if let Some(output) = &args.output {
        return output.clone();
    }

    let dir = args.file.parent().unwrap_or_else(|| Path::new("."));
    dir.join(format!("{}.c", source.stem()))
}

fn runtime_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("runtime")
}

fn build_binary(c_path: &Path, binary_path: &Path) {
    let runtime = runtime_dir();
    info!("invoking cc on {}", c_path.display());

    let status = Command::new("cc")
        .arg("-std=c99")
        .arg("-I")
        .arg(&runtime)
        .arg(c_path)
        .arg(runtime.join("pb_runtime.c"))
        .arg("-lm")
        .arg("-o")
        .arg(binary_path)
        .status();

    match status {
        Ok(status) if status.success() => {}
        Ok(status) => {
            error!("cc exited with {status}");
            std::process::exit(status.code().unwrap_or(1));
        }
        Err(e) => {
            error!("failed to invoke cc: {e}");
            std::process::exit(1);
        }
    }
}

fn run_binary(binary_path: &Path) {
    let path = if binary_path.is_absolute() {
        binary_path.to_path_buf()
    } else {
        Path::new(".").join(binary_path)
    };

    info!("running {}", path.display());
    let status = Command::new(&path).status();

    match status {
        Ok(status) => std::process::exit(status.code().unwrap_or(0)),
        Err(e) => {
            error!("failed to run '{}': {e}", path.display());
            std::process::exit(1);
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::init();

    simple_logger::init_with_level((&args.verbosity).into()).unwrap();

    let source = SourceFile::read(&args.file).unwrap_or_else(|e| {
        error!("could not read '{}': {e}", args.file.display());
        std::process::exit(1);
    });

    if let Err(e) = run(&source, &args) {
        eprintln!("{}", e.render(&source));
        std::process::exit(e.exit_code());
    }

    Ok(())
}
