//! Class layout lowering (spec §4.4): struct definitions with embedded
//! `base`, class-attribute globals, and forwarding wrappers for inherited
//! methods.
use std::collections::HashSet;

use crate::{
    ast::{
        statement::{ClassDef, Stmt, VarDecl},
        Type,
    },
    typechecker::ClassRegistry,
};

use super::{ctype, mangle, Emitter};

pub fn emit_forward_decls(classes: &ClassRegistry, e: &mut Emitter) {
    for name in classes.names_in_order() {
        e.line(format!("struct {name};"));
    }
    e.blank();
}

/// `struct C { B base; <own fields...>; };`, in base-before-subclass order
/// so a base's full definition is always visible when its embedder is
/// defined (spec §4.4 "Class layout lowering").
pub fn emit_struct_defs(classes: &ClassRegistry, e: &mut Emitter) {
    for name in classes.names_in_order() {
        let info = classes.get(name).expect("name came from names_in_order");
        e.line(format!("struct {name} {{"));
        e.enter();
        if let Some(base) = &info.base {
            e.line(format!("struct {base} base;"));
        }
        for field in &info.own_fields {
            e.line(format!("{} {};", ctype::of(&field.ty), field.name));
        }
        if info.base.is_none() && info.own_fields.is_empty() {
            // An empty struct is not valid C99; a class with no base and no
            // discovered instance fields still needs a complete type.
            e.line("char __pb_empty;");
        }
        e.exit();
        e.line("};");
        e.blank();
    }
}

/// Class-level attributes lower to zero-initialized globals named
/// `C_<attr>` (spec §4.4 "Class attribute `C.x` -> global `C_x`"). They
/// carry no initializer in the AST, so static storage duration's implicit
/// zero-init is the value every class attribute starts with.
pub fn emit_class_attr_globals(classes: &ClassRegistry, e: &mut Emitter) {
    for name in classes.names_in_order() {
        let info = classes.get(name).expect("name came from names_in_order");
        for (attr, ty) in &info.class_attrs {
            e.line(format!("{} {};", ctype::of(ty), mangle::class_attr(name, attr)));
        }
    }
    e.blank();
}

/// Top-level `VarDecl`s become zero-initialized module globals; their real
/// initializer runs in `pb_module_init` (spec §4.4: `main` is lowered from
/// the module-level `main` function "or from top-level statements").
pub fn emit_module_var_globals(module_stmts: &[&Stmt<Type>], e: &mut Emitter) {
    for s in module_stmts {
        if let Stmt::VarDecl(VarDecl { name, declared_type, .. }) = s {
            e.line(format!("{} {};", ctype::of(declared_type), name));
        }
    }
    e.blank();
}

fn param_ctypes(classes: &ClassRegistry, class: &str, method: &str) -> (Vec<Type>, Type) {
    let info = classes.get(class).expect("class exists");
    let sig = info.methods.get(method).expect("own method exists");
    (sig.params.clone(), sig.return_type.clone())
}

/// Declares a prototype for every method a class defines itself (methods it
/// only inherits get a forwarding wrapper instead, emitted separately).
pub fn emit_method_prototypes(def: &ClassDef<Type>, e: &mut Emitter) {
    for m in &def.methods {
        let params: Vec<String> = m
            .params
            .iter()
            .filter(|p| !(p.name == "self" && p.declared_type.is_none()))
            .map(|p| ctype::of(p.declared_type.as_ref().unwrap()))
            .collect();
        let mut sig = format!("struct {}* self", def.name);
        for (p, ty) in m.params.iter().filter(|p| p.declared_type.is_some()).zip(params.iter()) {
            sig.push_str(&format!(", {ty} {}", p.name));
        }
        e.line(format!("{} {}({});", ctype::of(&m.return_type), mangle::method(&def.name, &m.name), sig));
    }
    e.blank();
}

/// Emits, for every class, a `static inline` forwarding wrapper for every
/// method it inherits but does not itself override (spec §4.4: "For methods
/// defined only on a base, emit a `static inline` forwarding wrapper on the
/// subclass that casts `self` to the base pointer type"). The wrapper casts
/// straight to the *defining* ancestor's pointer type, valid because single
/// inheritance embeds every ancestor's layout at offset zero all the way up
/// the chain, so one cast reaches any ancestor regardless of depth.
pub fn emit_forwarding_wrappers(defs: &[&ClassDef<Type>], classes: &ClassRegistry, e: &mut Emitter) {
    for def in defs {
        let info = classes.get(&def.name).expect("class exists");
        let mut inherited: HashSet<String> = HashSet::new();
        for ancestor in classes.ancestors(&def.name) {
            if let Some(a) = classes.get(&ancestor) {
                inherited.extend(a.methods.keys().cloned());
            }
        }
        for own in info.methods.keys() {
            inherited.remove(own);
        }

        let mut names: Vec<&String> = inherited.iter().collect();
        names.sort();
        for name in names {
            let (defining, sig) = classes.resolve_method(&def.name, name).expect("inherited method resolves");
            let (params, ret) = param_ctypes(classes, &defining, name);

            let mut sig_str = format!("struct {}* self", def.name);
            let mut call_args = String::new();
            for (i, ty) in params.iter().enumerate() {
                sig_str.push_str(&format!(", {} a{i}", ctype::of(ty)));
                call_args.push_str(&format!(", a{i}"));
            }

            let ret_ty = ctype::of(&ret);
            e.line(format!("static inline {ret_ty} {}({sig_str}) {{", mangle::method(&def.name, name)));
            e.enter();
            let call = format!("{}((struct {defining}*)self{call_args})", mangle::method(&defining, name));
            if ret == Type::NoneType {
                e.line(format!("{call};"));
            } else {
                e.line(format!("return {call};"));
            }
            e.exit();
            e.line("}");
        }
    }
    e.blank();
}

/// Walks `class`'s ancestor chain to find which embedding level owns
/// `field`, returning the `base.base....` prefix to reach it (spec §4.4:
/// "Access to an inherited field `x` of a base `B` resolves to
/// `self->base....x` following the chain").
pub fn field_path(classes: &ClassRegistry, class: &str, field: &str) -> String {
    let mut cur = class.to_string();
    let mut hops = String::new();
    loop {
        let info = classes.get(&cur).unwrap_or_else(|| panic!("class '{cur}' not found while resolving field '{field}'"));
        if info.own_fields.iter().any(|f| f.name == field) {
            return hops;
        }
        match &info.base {
            Some(base) => {
                hops.push_str("base.");
                cur = base.clone();
            }
            None => panic!("field '{field}' not found on '{class}' or any ancestor"),
        }
    }
}
