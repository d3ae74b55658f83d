use std::{error::Error, path::Path};

use test_utils::{check_compilation, Expected};

const SRC_PATH: &str = "./tests/fixtures/global_mutation.pb";
const EXPECTED: Expected = Expected { stdout: "101\n", stderr: "" };

#[test]
fn compile_and_run_global_mutation() -> Result<(), Box<dyn Error>> {
    check_compilation(Path::new(SRC_PATH), EXPECTED)
}
