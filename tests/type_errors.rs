use std::{error::Error, path::Path};

use test_utils::check_failing_type_checking;

#[test]
fn heterogeneous_list_literal_is_rejected() -> Result<(), Box<dyn Error>> {
    check_failing_type_checking(Path::new("./tests/fixtures/heterogeneous_list.pb"))
}

#[test]
fn undefined_base_class_is_rejected() -> Result<(), Box<dyn Error>> {
    check_failing_type_checking(Path::new("./tests/fixtures/undefined_base.pb"))
}

#[test]
fn cyclic_base_class_is_rejected() -> Result<(), Box<dyn Error>> {
    check_failing_type_checking(Path::new("./tests/fixtures/cyclic_base.pb"))
}
