use std::{error::Error, path::Path};

use test_utils::{check_compilation, Expected};

const SRC_PATH: &str = "./tests/fixtures/list_index_assignment.pb";
const EXPECTED: Expected = Expected { stdout: "20\n", stderr: "" };

#[test]
fn compile_and_run_list_index_assignment() -> Result<(), Box<dyn Error>> {
    check_compilation(Path::new(SRC_PATH), EXPECTED)
}
