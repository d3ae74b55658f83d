use std::{error::Error, path::Path};

use test_utils::{check_compilation, Expected};

const SRC_PATH: &str = "./tests/fixtures/inheritance.pb";
const EXPECTED: Expected = Expected { stdout: "10\n5\n", stderr: "" };

#[test]
fn compile_and_run_inheritance() -> Result<(), Box<dyn Error>> {
    check_compilation(Path::new(SRC_PATH), EXPECTED)
}
