use std::{error::Error, path::Path};

use test_utils::{check_compilation, Expected};

const SRC_PATH: &str = "./tests/fixtures/exception_propagation.pb";
const EXPECTED: Expected = Expected { stdout: "zero\n", stderr: "" };

#[test]
fn compile_and_run_exception_propagation() -> Result<(), Box<dyn Error>> {
    check_compilation(Path::new(SRC_PATH), EXPECTED)
}
