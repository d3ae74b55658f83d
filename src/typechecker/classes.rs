use std::collections::HashMap;

use crate::{
    ast::{statement::ClassDef, Type},
    lexer::Span,
};

use super::{
    error::{TypeError, TypeResult},
    functions::FuncSig,
};

/// One instance field in discovery order (spec §3 Class layout: "`C`'s own
/// instance fields in the order they are first assigned in `__init__`").
#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub name: String,
    pub ty: Type,
}

/// A class's flattened layout and member tables, built once in Pass A
/// (spec §4.3) and consulted read-only by Pass B and by the code generator.
#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub name: String,
    pub base: Option<String>,
    /// This class's own fields, not including the base's (the base is
    /// embedded as a single `base` field in the generated struct; see
    /// `codegen::layout`).
    pub own_fields: Vec<FieldInfo>,
    /// Class-level (static) typed attributes, mangled to `C_<attr>` globals
    /// (spec §4.4).
    pub class_attrs: HashMap<String, Type>,
    pub methods: HashMap<String, FuncSig>,
    pub span: Span,
}

#[derive(Debug, Default, Clone)]
pub struct ClassRegistry {
    classes: HashMap<String, ClassInfo>,
    /// Preserves declaration order so codegen emits structs/functions in a
    /// deterministic, base-before-subclass order (spec §4.4: "total function
    /// from a well-typed AST to C text").
    order: Vec<String>,
}

impl ClassRegistry {
    pub fn get(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn names_in_order(&self) -> &[String] {
        &self.order
    }

    /// The base-chain for `name`, most immediate base first, not including
    /// `name` itself. Used by [`Type::assignable_to`] and by the code
    /// generator's field-flattening.
    pub fn ancestors(&self, name: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut cur = self.classes.get(name).and_then(|c| c.base.clone());
        while let Some(b) = cur {
            chain.push(b.clone());
            cur = self.classes.get(&b).and_then(|c| c.base.clone());
        }
        chain
    }

    /// Looks up a field by name along `name`'s ancestor chain (self first,
    /// then base, then base's base, ...), returning its type.
    pub fn resolve_field(&self, name: &str, field: &str) -> Option<Type> {
        if let Some(info) = self.classes.get(name) {
            if let Some(f) = info.own_fields.iter().find(|f| f.name == field) {
                return Some(f.ty.clone());
            }
            if let Some(base) = &info.base {
                return self.resolve_field(base, field);
            }
        }
        None
    }

    /// Looks up a method along the ancestor chain, returning the class that
    /// actually defines it (for mangling a forwarding call) and its
    /// signature.
    pub fn resolve_method(&self, name: &str, method: &str) -> Option<(String, FuncSig)> {
        let info = self.classes.get(name)?;
        if let Some(sig) = info.methods.get(method) {
            return Some((name.to_string(), sig.clone()));
        }
        let base = info.base.clone()?;
        self.resolve_method(&base, method)
    }

    pub fn resolve_class_attr(&self, name: &str, attr: &str) -> Option<Type> {
        let info = self.classes.get(name)?;
        if let Some(ty) = info.class_attrs.get(attr) {
            return Some(ty.clone());
        }
        let base = info.base.clone()?;
        self.resolve_class_attr(&base, attr)
    }

    /// All instance fields along the chain, base-first, in the order
    /// codegen should lay out the flattened struct for documentation /
    /// debug-dump purposes (the generator itself re-derives this via
    /// embedding rather than flattening).
    pub fn all_fields(&self, name: &str) -> Vec<FieldInfo> {
        let mut out = Vec::new();
        if let Some(info) = self.classes.get(name) {
            if let Some(base) = &info.base {
                out.extend(self.all_fields(base));
            }
            out.extend(info.own_fields.iter().cloned());
        }
        out
    }

    fn insert(&mut self, info: ClassInfo) {
        self.order.push(info.name.clone());
        self.classes.insert(info.name.clone(), info);
    }

    /// Fills in a class's method table once its signatures are known. Called
    /// once per class, before field discovery, so a constructor body
    /// referencing `self.other_method(...)` resolves correctly.
    pub fn set_methods(&mut self, name: &str, methods: HashMap<String, FuncSig>) {
        if let Some(info) = self.classes.get_mut(name) {
            info.methods = methods;
        }
    }

    /// Records one newly-discovered instance field, in first-assignment
    /// order, as `__init__` is walked.
    pub fn push_own_field(&mut self, name: &str, field: FieldInfo) {
        if let Some(info) = self.classes.get_mut(name) {
            info.own_fields.push(field);
        }
    }
}

/// Declares every class's base (cycle- and undefined-base-checked) and
/// class-level attributes, but not yet its fields or methods — those need
/// full expression typing and so are filled in by
/// [`declare_methods_and_fields`] once every class's base is known (spec
/// §4.3 Pass A: "Build the class inheritance chain; reject cycles and
/// undefined bases").
pub fn declare_class_shapes(defs: &[&ClassDef<()>]) -> TypeResult<ClassRegistry> {
    let mut registry = ClassRegistry::default();
    let by_name: HashMap<&str, &ClassDef<()>> = defs.iter().map(|d| (d.name.as_str(), *d)).collect();

    for def in defs {
        if let Some(base) = &def.base {
            if !by_name.contains_key(base.as_str()) {
                return Err(TypeError::new(format!("class '{}' inherits from undefined class '{base}'", def.name), def.span));
            }
        }
    }

    for def in defs {
        let mut seen = vec![def.name.clone()];
        let mut cur = def.base.clone();
        while let Some(b) = cur {
            if seen.contains(&b) {
                return Err(TypeError::new(
                    format!("inheritance cycle detected involving class '{}'", def.name),
                    def.span,
                ));
            }
            seen.push(b.clone());
            cur = by_name.get(b.as_str()).and_then(|d| d.base.clone());
        }
    }

    // Base classes must be registered before subclasses so `ancestors`/
    // `resolve_field` can walk a fully-populated chain; a topological sort
    // by depth achieves that without a general graph library.
    let mut ordered: Vec<&ClassDef<()>> = defs.to_vec();
    ordered.sort_by_key(|d| chain_depth(d, &by_name));

    for def in ordered {
        let mut class_attrs = HashMap::new();
        for attr in &def.class_attrs {
            class_attrs.insert(attr.name.clone(), attr.declared_type.clone());
        }
        registry.insert(ClassInfo {
            name: def.name.clone(),
            base: def.base.clone(),
            own_fields: Vec::new(),
            class_attrs,
            methods: HashMap::new(),
            span: def.span,
        });
    }

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Span;

    fn class(name: &str, base: Option<&str>) -> ClassDef<()> {
        ClassDef {
            name: name.to_string(),
            base: base.map(str::to_string),
            class_attrs: Vec::new(),
            methods: Vec::new(),
            span: Span::default(),
        }
    }

    #[test]
    fn undefined_base_is_rejected() {
        let a = class("A", Some("Missing"));
        assert!(declare_class_shapes(&[&a]).is_err());
    }

    #[test]
    fn self_referential_base_is_a_cycle() {
        let a = class("A", Some("A"));
        assert!(declare_class_shapes(&[&a]).is_err());
    }

    #[test]
    fn mutual_base_cycle_is_rejected() {
        let a = class("A", Some("B"));
        let b = class("B", Some("A"));
        assert!(declare_class_shapes(&[&a, &b]).is_err());
    }

    #[test]
    fn bases_are_ordered_before_subclasses() {
        let child = class("Child", Some("Parent"));
        let parent = class("Parent", None);
        // Fed in subclass-first order; declare_class_shapes must still sort
        // by chain depth so `Parent` lands before `Child`.
        let registry = declare_class_shapes(&[&child, &parent]).unwrap();
        let order = registry.names_in_order();
        let parent_pos = order.iter().position(|n| n == "Parent").unwrap();
        let child_pos = order.iter().position(|n| n == "Child").unwrap();
        assert!(parent_pos < child_pos);
    }

    #[test]
    fn ancestors_walks_the_full_chain() {
        let grandparent = class("Grandparent", None);
        let parent = class("Parent", Some("Grandparent"));
        let child = class("Child", Some("Parent"));
        let registry = declare_class_shapes(&[&grandparent, &parent, &child]).unwrap();
        let chain = registry.ancestors("Child");
        assert_eq!(chain, vec!["Parent".to_string(), "Grandparent".to_string()]);
    }

    #[test]
    fn resolve_field_finds_a_field_declared_on_a_base_class() {
        let parent = class("Parent", None);
        let child = class("Child", Some("Parent"));
        let mut registry = declare_class_shapes(&[&parent, &child]).unwrap();
        registry.push_own_field("Parent", FieldInfo { name: "hp".to_string(), ty: Type::Int });
        let ty = registry.resolve_field("Child", "hp").unwrap();
        assert_eq!(ty, Type::Int);
    }

    #[test]
    fn resolve_field_on_an_unknown_name_is_none() {
        let a = class("A", None);
        let registry = declare_class_shapes(&[&a]).unwrap();
        assert!(registry.resolve_field("A", "missing").is_none());
    }
}

fn chain_depth(def: &ClassDef<()>, by_name: &HashMap<&str, &ClassDef<()>>) -> usize {
    let mut depth = 0;
    let mut cur = def.base.clone();
    while let Some(b) = cur {
        depth += 1;
        cur = by_name.get(b.as_str()).and_then(|d| d.base.clone());
    }
    depth
}
