use std::{error::Error, path::Path};

use test_utils::{check_compilation, Expected};

const SRC_PATH: &str = "./tests/fixtures/index_error.pb";
const EXPECTED: Expected = Expected { stdout: "cannot assign to index 5 in list[int] of length 0\n", stderr: "" };

#[test]
fn compile_and_run_index_error_handling() -> Result<(), Box<dyn Error>> {
    check_compilation(Path::new(SRC_PATH), EXPECTED)
}
