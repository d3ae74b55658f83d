use std::{error::Error, path::Path};

use test_utils::check_failing_lexing;

#[test]
fn float_rejects_trailing_dot() -> Result<(), Box<dyn Error>> {
    check_failing_lexing(Path::new("./tests/fixtures/bad_float_trailing_dot.pb"))
}

#[test]
fn float_rejects_leading_dot() -> Result<(), Box<dyn Error>> {
    check_failing_lexing(Path::new("./tests/fixtures/bad_float_leading_dot.pb"))
}

#[test]
fn int_rejects_double_underscore() -> Result<(), Box<dyn Error>> {
    check_failing_lexing(Path::new("./tests/fixtures/bad_int_double_underscore.pb"))
}

#[test]
fn float_rejects_underscore_before_dot() -> Result<(), Box<dyn Error>> {
    check_failing_lexing(Path::new("./tests/fixtures/bad_float_underscore_dot.pb"))
}

#[test]
fn float_rejects_underscore_after_dot() -> Result<(), Box<dyn Error>> {
    check_failing_lexing(Path::new("./tests/fixtures/bad_float_dot_underscore.pb"))
}

#[test]
fn tab_in_indent_is_rejected() -> Result<(), Box<dyn Error>> {
    check_failing_lexing(Path::new("./tests/fixtures/tab_indent.pb"))
}
