//! Maps a [`crate::ast::Type`] to the C type used to store a value of it.
use crate::ast::Type;

/// The runtime's primitive-element suffix (`int`/`float`/`bool`/`str`), used
/// to name the monomorphised `List_<T>` / `Dict_str_<T>` the runtime
/// actually ships (spec §6 lists exactly these four of each). PB's type
/// checker does not itself forbid `list[SomeClass]`, but the fixed runtime
/// has no monomorphisation for it; such a program type-checks but has no
/// generated-code target, the same boundary the spec draws around the
/// runtime being "specified only at the boundary the code generator emits
/// calls to".
fn elem_suffix(elem: &Type) -> &'static str {
    match elem {
        Type::Int => "int",
        Type::Float => "float",
        Type::Bool => "bool",
        Type::Str => "str",
        other => panic!("no runtime container monomorphisation for element type '{other}'"),
    }
}

/// The C type a PB value of `ty` is stored as. Class instances are always
/// handled through a pointer to the generated struct, matching how a
/// constructor call binds a variable to `&__tmp` (spec §4.4).
pub fn of(ty: &Type) -> String {
    match ty {
        Type::Int => "int64_t".to_string(),
        Type::Float => "double".to_string(),
        Type::Bool => "bool".to_string(),
        Type::Str => "const char*".to_string(),
        Type::NoneType => "void".to_string(),
        Type::List(elem) => format!("List_{}", elem_suffix(elem)),
        Type::Dict(_, value) => format!("Dict_str_{}", elem_suffix(value)),
        Type::Class(name) => format!("struct {name}*"),
        Type::Func(..) => panic!("PB has no first-class function values to give a storage type"),
    }
}
