use std::{
    error::Error,
    io,
    path::Path,
    process::{Command, Output},
    str,
};

const PBC_PATH: &str = "./target/debug/pbc";
const OUTPUT_PATH: &str = "./output";

pub struct Expected<'a> {
    pub stdout: &'a str,
    pub stderr: &'a str,
}

impl<'a> Expected<'a> {
    fn assert_matches(self, output: &Output) -> Result<(), Box<dyn Error>> {
        assert_eq!(str::from_utf8(&output.stdout)?, self.stdout);
        assert_eq!(str::from_utf8(&output.stderr)?, self.stderr);
        Ok(())
    }
}

fn run_compiler(src_path: &Path) -> Result<Output, io::Error> {
    Command::new(PBC_PATH).arg(src_path).output()
}

fn run_and_execute(src_path: &Path, c_path: &Path) -> Result<Output, io::Error> {
    Command::new(PBC_PATH).arg("--run").arg("-o").arg(c_path).arg(src_path).output()
}

/// Compiles `src_path`, runs the resulting binary, and asserts its stdout and
/// stderr match `expected`.
pub fn check_compilation(src_path: &Path, expected: Expected) -> Result<(), Box<dyn Error>> {
    let c_path = Path::new(OUTPUT_PATH).join(src_path.file_stem().unwrap()).with_extension("c");

    let output = run_and_execute(src_path, &c_path)?;
    let stdout = std::str::from_utf8(&output.stdout)?;

    println!("{stdout}");
    assert!(output.status.success(), "pbc exited with status {:?}: {}", output.status.code(), str::from_utf8(&output.stderr)?);

    expected.assert_matches(&output)?;

    Ok(())
}

/// Runs the compiler but not the resulting binary, for cases where only
/// successful compilation (not a specific runtime output) is being checked.
pub fn check_successful_compilation(src_path: &Path) -> Result<(), Box<dyn Error>> {
    let c_path = Path::new(OUTPUT_PATH).join(src_path.file_stem().unwrap()).with_extension("c");
    let output = Command::new(PBC_PATH).arg("--build").arg("-o").arg(c_path).arg(src_path).output()?;

    assert!(output.status.success(), "pbc exited with status {:?}: {}", output.status.code(), str::from_utf8(&output.stderr)?);

    Ok(())
}

fn check_failing(src_path: &Path, exit_code: i32, phase: &str) -> Result<(), Box<dyn Error>> {
    let output = run_compiler(src_path)?;

    println!("{output:?}");
    assert!(!output.status.success(), "pbc should have failed to compile '{}'", src_path.display());
    assert_eq!(output.status.code(), Some(exit_code), "expected a {phase} failure for '{}'", src_path.display());

    Ok(())
}

pub fn check_failing_lexing(src_path: &Path) -> Result<(), Box<dyn Error>> {
    check_failing(src_path, 2, "lexer")
}

pub fn check_failing_parsing(src_path: &Path) -> Result<(), Box<dyn Error>> {
    check_failing(src_path, 3, "parser")
}

pub fn check_failing_type_checking(src_path: &Path) -> Result<(), Box<dyn Error>> {
    check_failing(src_path, 4, "type checker")
}
