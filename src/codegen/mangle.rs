//! Name mangling (spec §4.4): the systematic rewriting of PB qualified names
//! into C identifiers. Kept as free functions rather than methods on
//! [`super::Emitter`] since none of them need emitter state.

/// `C.m` -> `C__m`. Applied uniformly, so `__init__` mangles to the
/// `C____init__` form spec.md gives as a worked example (the method's own
/// leading double underscore plus the `__` separator).
pub fn method(class: &str, method: &str) -> String {
    format!("{class}__{method}")
}

/// `C.x` -> global `C_x`.
pub fn class_attr(class: &str, attr: &str) -> String {
    format!("{class}_{attr}")
}

/// A module-level function keeps its own name; PB has no multi-file bodies
/// in this core, so the `<module>_f` import form spec.md mentions never
/// actually arises.
pub fn func(name: &str) -> String {
    name.to_string()
}

/// The PB `main` function is renamed so it doesn't collide with the C
/// `int main(void)` the generator synthesizes itself (spec §4.4: "`int
/// main(void)` lowered from the module-level `main` function").
pub const USER_MAIN: &str = "pb_main";
