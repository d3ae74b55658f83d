use crate::ast::Type;

use super::{
    classes::ClassRegistry,
    functions::FuncSig,
    scope::{Binding, BindingKind, ModuleScope, Scope},
};

/// The mutable state threaded through every [`super::checkable::TypeCheckable::check`]
/// call: module-level bindings, the class and function registries built in
/// Pass A, and — while walking a function body in Pass B — that function's
/// local scope, its declared return type, and (inside a method) the
/// enclosing class's name.
///
/// Mirrors the shape of a typical two-pass checker's shared `Context`: one
/// struct, passed by `&mut` rather than threaded through return values.
pub struct Context {
    pub classes: ClassRegistry,
    pub functions: std::collections::HashMap<String, FuncSig>,
    pub module: ModuleScope,
    pub locals: Option<Scope>,
    pub return_type: Option<Type>,
    pub current_class: Option<String>,
}

impl Context {
    pub fn new(classes: ClassRegistry, functions: std::collections::HashMap<String, FuncSig>) -> Self {
        Self { classes, functions, module: ModuleScope::default(), locals: None, return_type: None, current_class: None }
    }

    /// Resolves a bare name against the scope chain (spec §4.3: "local ->
    /// enclosing function params -> class (via implicit `self`) -> module
    /// -> built-ins"). Built-ins (`print`, `range`, `int`/`float`/`str`/
    /// `bool`) are deliberately *not* resolved here — they only have meaning
    /// in callee position and are handled directly by the `Call` checker so
    /// that a user shadowing one of those names with a local works exactly
    /// as the spec's plain scope-chain description implies.
    pub fn resolve_name(&self, name: &str) -> Option<Type> {
        if let Some(locals) = &self.locals {
            if let Some(binding) = locals.get(name) {
                if matches!(binding.kind, BindingKind::Global) {
                    return self.module.get(name).cloned();
                }
                return Some(binding.ty.clone());
            }
        }
        if let Some(ty) = self.module.get(name) {
            return Some(ty.clone());
        }
        if let Some(sig) = self.functions.get(name) {
            return Some(sig.as_func_type());
        }
        if self.classes.contains(name) {
            return Some(self.constructor_type(name));
        }
        None
    }

    /// A class used as a callee types as a function from its `__init__`
    /// parameters (excluding `self`) to an instance of the class (spec
    /// §4.3 `Call`: "callee must be ... a class (constructor call)").
    pub fn constructor_type(&self, class: &str) -> Type {
        let params = self
            .classes
            .resolve_method(class, "__init__")
            .map(|(_, sig)| sig.params)
            .unwrap_or_default();
        Type::Func(params, Box::new(Type::Class(class.to_string())))
    }

    pub fn declare_local(&mut self, name: impl Into<String>, kind: BindingKind, ty: Type) {
        if let Some(locals) = &mut self.locals {
            locals.declare(name, kind, ty);
        }
    }

    pub fn local_binding(&self, name: &str) -> Option<&Binding> {
        self.locals.as_ref().and_then(|l| l.get(name))
    }

    pub fn is_global_redirect(&self, name: &str) -> bool {
        self.locals.as_ref().map(|l| l.is_redirected_to_global(name)).unwrap_or(false)
    }

    /// Declares `name: ty` at whatever scope is "current": the active
    /// function's locals, or the module scope at the top level. This is
    /// what lets `VarDecl` checking be written once and used for both
    /// (spec §4.3 Pass B runs over "each function/method body ... nested in
    /// the enclosing class (if any) and module", and the module's own
    /// top-level statements are checked the same way).
    pub fn declare_var(&mut self, name: impl Into<String>, ty: Type) {
        let name = name.into();
        match &mut self.locals {
            Some(locals) => locals.declare(name, BindingKind::Local, ty),
            None => self.module.declare(name, ty),
        }
    }

    /// The type a name was already declared with, if any, at the current
    /// scope or an enclosing one — used to reject a second `VarDecl` with a
    /// different type and to type-check a plain `Assign`.
    pub fn existing_var_type(&self, name: &str) -> Option<Type> {
        if let Some(locals) = &self.locals {
            if let Some(binding) = locals.get(name) {
                return Some(binding.ty.clone());
            }
        }
        self.module.get(name).cloned()
    }
}
