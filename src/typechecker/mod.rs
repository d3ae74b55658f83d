//! Static type checking (spec §4.3): a shallow Pass A that declares every
//! class's shape and every function's signature so forward references work,
//! followed by a full Pass B that checks every statement and expression body
//! against those declarations, producing a `Type`-annotated `Ast`.
mod checkable;
mod classes;
mod context;
mod error;
mod expr;
mod functions;
mod scope;
mod stmt;

pub use checkable::TypeCheck;
pub use classes::{ClassInfo, ClassRegistry, FieldInfo};
pub use context::Context;
pub use error::{TypeError, TypeResult};
pub use functions::FuncSig;

use std::collections::HashMap;

use crate::ast::{
    expression::Expr,
    statement::{ClassDef, FuncDef, Stmt},
    Ast, Type,
};
use scope::{BindingKind, Scope};

/// The output of a full check: the typed AST plus the class and function
/// tables Pass A built, which the code generator needs for struct layout,
/// name mangling, and method-forwarding decisions — information the typed
/// AST itself doesn't carry.
pub struct CheckedProgram {
    pub ast: Ast<Type>,
    pub classes: ClassRegistry,
    pub functions: HashMap<String, FuncSig>,
}

/// Type-checks a whole program. Mirrors the teacher's two-step
/// `shallow_check()` then `check()` driver (SPEC_FULL.md §4.3), just without
/// a separate `ShallowCheck` walk over every node: classes and functions are
/// each their own kind of "shallow" declaration with their own ordering
/// requirements, so Pass A is driven directly rather than through the
/// trait's generic per-node dispatch.
pub fn check_program(ast: Ast<()>) -> TypeResult<CheckedProgram> {
    let nodes = ast.into_nodes();

    let class_defs: Vec<&ClassDef<()>> = nodes
        .iter()
        .filter_map(|s| match s {
            Stmt::ClassDef(c) => Some(c),
            _ => None,
        })
        .collect();
    let func_defs: Vec<&FuncDef<()>> = nodes
        .iter()
        .filter_map(|s| match s {
            Stmt::FuncDef(f) => Some(f),
            _ => None,
        })
        .collect();

    let mut classes = classes::declare_class_shapes(&class_defs)?;

    let class_defs_by_name: HashMap<&str, &ClassDef<()>> = class_defs.iter().map(|c| (c.name.as_str(), *c)).collect();

    // Method signatures need no expression typing, so every class can be
    // filled in up front regardless of base/subclass order.
    for def in &class_defs {
        let methods = def.methods.iter().map(|m| (m.name.clone(), functions::build_func_sig(m))).collect();
        classes.set_methods(&def.name, methods);
    }

    let mut functions = HashMap::new();
    for f in &func_defs {
        if functions.insert(f.name.clone(), functions::build_func_sig(f)).is_some() {
            return Err(TypeError::new(format!("function '{}' is already defined", f.name), f.span));
        }
    }

    // Instance fields are discovered from `__init__`, base-first, so a
    // subclass's constructor can already see its base's fields and methods
    // (spec §3 Class layout: "own instance fields ... in the order they are
    // first assigned in `__init__`").
    for name in classes.names_in_order().to_vec() {
        let Some(def) = class_defs_by_name.get(name.as_str()) else { continue };
        let Some(init) = def.methods.iter().find(|m| m.name == "__init__") else { continue };
        discover_instance_fields(init, &name, &mut classes, &functions)?;
    }

    let mut ctx = Context::new(classes, functions);

    let mut checked = Vec::with_capacity(nodes.len());
    for node in nodes {
        checked.push(TypeCheck::type_check(node, &mut ctx)?);
    }

    Ok(CheckedProgram { ast: Ast::from_nodes(checked), classes: ctx.classes, functions: ctx.functions })
}

/// Walks `init`'s body looking for `self.<name> = <expr>` assignments,
/// type-checking each first occurrence's right-hand side to learn the
/// field's type and registering it immediately so later statements in the
/// same `__init__` (or a later field's initializer) can already see it.
fn discover_instance_fields(
    init: &FuncDef<()>,
    class: &str,
    classes: &mut ClassRegistry,
    functions: &HashMap<String, FuncSig>,
) -> TypeResult<()> {
    let mut locals: HashMap<String, Type> = HashMap::new();
    locals.insert("self".to_string(), Type::Class(class.to_string()));
    for p in &init.params {
        if p.name == "self" {
            continue;
        }
        let ty = p.declared_type.clone().expect("the parser requires a type annotation on every non-self parameter");
        locals.insert(p.name.clone(), ty);
    }

    walk_init_body(&init.body, class, classes, functions, &mut locals)
}

fn walk_init_body(
    body: &[Stmt<()>],
    class: &str,
    classes: &mut ClassRegistry,
    functions: &HashMap<String, FuncSig>,
    locals: &mut HashMap<String, Type>,
) -> TypeResult<()> {
    for stmt in body {
        match stmt {
            Stmt::VarDecl(v) => {
                locals.insert(v.name.clone(), v.declared_type.clone());
            }
            Stmt::Assign(a) => {
                if let Expr::Attr(attr) = a.target.as_ref() {
                    if let Expr::Name(n) = attr.base.as_ref() {
                        if n.id == "self" && classes.resolve_field(class, &attr.name).is_none() {
                            let ty = infer_expr_type(&a.value, classes, functions, locals)?;
                            classes.push_own_field(class, FieldInfo { name: attr.name.clone(), ty });
                        }
                    }
                }
            }
            Stmt::If(s) => {
                walk_init_body(&s.then_body, class, classes, functions, locals)?;
                for (_, b) in &s.elifs {
                    walk_init_body(b, class, classes, functions, locals)?;
                }
                if let Some(b) = &s.else_body {
                    walk_init_body(b, class, classes, functions, locals)?;
                }
            }
            Stmt::While(s) => walk_init_body(&s.body, class, classes, functions, locals)?,
            Stmt::For(s) => {
                locals.insert(s.var.clone(), Type::Int);
                walk_init_body(&s.body, class, classes, functions, locals)?;
            }
            Stmt::Try(s) => {
                walk_init_body(&s.body, class, classes, functions, locals)?;
                for h in &s.handlers {
                    if let Some(alias) = &h.alias {
                        locals.insert(alias.clone(), Type::Str);
                    }
                    walk_init_body(&h.body, class, classes, functions, locals)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Type-checks a single expression in a scratch context seeded with
/// `locals`, purely to learn its resulting type during field discovery. The
/// real check of the same expression happens again in Pass B, with the
/// fully-built registry; this duplicate pass is cheap and keeps field
/// discovery independent of Pass B's control flow.
fn infer_expr_type(
    value: &Expr<()>,
    classes: &ClassRegistry,
    functions: &HashMap<String, FuncSig>,
    locals: &HashMap<String, Type>,
) -> TypeResult<Type> {
    let mut ctx = Context::new(classes.clone(), functions.clone());
    let mut scope = Scope::default();
    for (name, ty) in locals {
        scope.declare(name.clone(), BindingKind::Parameter, ty.clone());
    }
    ctx.locals = Some(scope);
    let checked = expr::check_expr(value.clone(), &mut ctx, None)?;
    Ok(checked.ty())
}
