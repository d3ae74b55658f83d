use std::{error::Error, path::Path};

use test_utils::check_failing_parsing;

#[test]
fn assigning_to_true_is_rejected() -> Result<(), Box<dyn Error>> {
    check_failing_parsing(Path::new("./tests/fixtures/true_assignment.pb"))
}

#[test]
fn bare_break_at_module_level_is_rejected() -> Result<(), Box<dyn Error>> {
    check_failing_parsing(Path::new("./tests/fixtures/bare_break.pb"))
}
