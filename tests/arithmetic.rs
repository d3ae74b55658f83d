use std::{error::Error, path::Path};

use test_utils::{check_compilation, Expected};

const SRC_PATH: &str = "./tests/fixtures/addition.pb";
const EXPECTED: Expected = Expected { stdout: "3\n", stderr: "" };

#[test]
fn compile_and_run_addition() -> Result<(), Box<dyn Error>> {
    check_compilation(Path::new(SRC_PATH), EXPECTED)
}
