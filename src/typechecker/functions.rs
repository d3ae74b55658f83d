use crate::ast::{statement::FuncDef, Type};

/// A resolved function or method signature (spec §4.3 Pass A: "record class
/// bases. ... collect class-level typed attributes and method signatures").
#[derive(Debug, Clone)]
pub struct FuncSig {
    /// Parameter types in declaration order, excluding an implicit `self`.
    pub params: Vec<Type>,
    /// How many leading parameters have no default (spec §4.3 `Call`:
    /// "Positional arity must match the required-parameter count").
    pub required: usize,
    pub return_type: Type,
}

impl FuncSig {
    pub fn as_func_type(&self) -> Type {
        Type::Func(self.params.clone(), Box::new(self.return_type.clone()))
    }
}

/// Builds a signature from a parsed function or method, excluding an
/// implicit `self` parameter (recognized as the one unannotated parameter a
/// method's `self` always is).
pub fn build_func_sig(f: &FuncDef<()>) -> FuncSig {
    let params: Vec<&crate::ast::statement::Param<()>> =
        f.params.iter().filter(|p| !(p.name == "self" && p.declared_type.is_none())).collect();
    let required = params.iter().take_while(|p| p.default.is_none()).count();
    let param_types = params.iter().map(|p| p.declared_type.clone().unwrap()).collect();
    FuncSig { params: param_types, required, return_type: f.return_type.clone() }
}
