//! C99 code generation (spec §4.4, C7): a total, non-failing lowering of a
//! checked program to one self-contained translation unit. Mirrors the
//! typechecker's own shape — small per-concern modules driven by a shared,
//! mutably-threaded piece of state (here [`Emitter`] instead of
//! `typechecker::Context`) rather than building a second intermediate tree.
mod ctype;
mod expr;
mod layout;
mod mangle;
mod stmt;

mod fstring;

use std::collections::HashMap;

use crate::{
    ast::{
        expression::Expr,
        statement::{ClassDef, FuncDef, Stmt},
        Type,
    },
    typechecker::{ClassRegistry, CheckedProgram, FuncSig},
};

/// The per-node mutable sink every lowering function writes into: an output
/// buffer, an indentation level, a monotonic temporary counter (unique
/// across the whole file, so `__tmp_*` names never collide between
/// functions), and a queue of statements a nested expression needs hoisted
/// above the statement that contains it (constructor calls, container
/// literals, f-strings).
pub struct Emitter {
    out: String,
    indent: usize,
    tmp_counter: u32,
    pending: Vec<String>,
}

impl Emitter {
    fn new() -> Self {
        Self { out: String::new(), indent: 0, tmp_counter: 0, pending: Vec::new() }
    }

    fn next_tmp(&mut self) -> u32 {
        self.tmp_counter += 1;
        self.tmp_counter
    }

    /// Queues a statement produced while lowering a sub-expression, to be
    /// flushed immediately before the statement that contains it.
    fn push_pending(&mut self, stmt: String) {
        self.pending.push(stmt);
    }

    fn take_pending(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending)
    }

    fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn enter(&mut self) {
        self.indent += 1;
    }

    fn exit(&mut self) {
        self.indent -= 1;
    }

    /// Flushes any pending hoisted statements, then emits `text` as a line.
    fn stmt_line(&mut self, text: impl AsRef<str>) {
        for p in self.take_pending() {
            self.line(p);
        }
        self.line(text);
    }
}

/// The class/function tables plus, while lowering a function or method
/// body, which class (if any) encloses it — `self`'s static type. Also
/// carries every function's and method's parameter default expressions
/// (excluding `self`), since a call with fewer arguments than parameters
/// needs the omitted trailing defaults spliced in at the call site — the
/// only place in the program that knows which defaults were elided (spec
/// §4.3 `Call`: "trailing arguments may be omitted only for parameters with
/// defaults").
pub struct FnCtx<'a> {
    pub classes: &'a ClassRegistry,
    pub functions: &'a HashMap<String, FuncSig>,
    pub self_class: Option<&'a str>,
    pub func_defaults: &'a HashMap<String, Vec<Option<Expr<Type>>>>,
    pub method_defaults: &'a HashMap<(String, String), Vec<Option<Expr<Type>>>>,
}

fn non_self_defaults(params: &[crate::ast::statement::Param<Type>]) -> Vec<Option<Expr<Type>>> {
    params.iter().filter(|p| !(p.name == "self" && p.declared_type.is_none())).map(|p| p.default.clone()).collect()
}

/// Lowers a fully checked program to one C99 translation unit. Total: a
/// well-typed program never fails to generate (spec §4.4 "Failure
/// semantics").
pub fn generate(program: &CheckedProgram) -> String {
    let mut e = Emitter::new();
    e.line("#include \"pb_runtime.h\"");
    e.blank();

    layout::emit_forward_decls(&program.classes, &mut e);
    layout::emit_struct_defs(&program.classes, &mut e);
    layout::emit_class_attr_globals(&program.classes, &mut e);

    let nodes = program.ast.nodes();
    let class_defs: Vec<&ClassDef<crate::ast::Type>> =
        nodes.iter().filter_map(|s| match s { Stmt::ClassDef(c) => Some(c), _ => None }).collect();
    let func_defs: Vec<&FuncDef<crate::ast::Type>> =
        nodes.iter().filter_map(|s| match s { Stmt::FuncDef(f) => Some(f), _ => None }).collect();
    let module_stmts: Vec<&Stmt<crate::ast::Type>> =
        nodes.iter().filter(|s| !matches!(s, Stmt::ClassDef(_) | Stmt::FuncDef(_))).collect();

    layout::emit_module_var_globals(&module_stmts, &mut e);

    let func_defaults: HashMap<String, Vec<Option<Expr<Type>>>> =
        func_defs.iter().map(|f| (f.name.clone(), non_self_defaults(&f.params))).collect();
    let method_defaults: HashMap<(String, String), Vec<Option<Expr<Type>>>> = class_defs
        .iter()
        .flat_map(|def| def.methods.iter().map(move |m| ((def.name.clone(), m.name.clone()), non_self_defaults(&m.params))))
        .collect();

    let ctx_top =
        FnCtx { classes: &program.classes, functions: &program.functions, self_class: None, func_defaults: &func_defaults, method_defaults: &method_defaults };

    for f in &func_defs {
        stmt::emit_func_prototype(f, &mut e);
    }
    for def in &class_defs {
        layout::emit_method_prototypes(def, &mut e);
    }
    layout::emit_forwarding_wrappers(&class_defs, &program.classes, &mut e);

    for f in &func_defs {
        stmt::emit_func_def(f, &mut e, &ctx_top);
    }
    for def in &class_defs {
        let ctx = FnCtx {
            classes: &program.classes,
            functions: &program.functions,
            self_class: Some(&def.name),
            func_defaults: &func_defaults,
            method_defaults: &method_defaults,
        };
        for m in &def.methods {
            stmt::emit_method_def(&def.name, m, &mut e, &ctx);
        }
    }

    let has_user_main = program.functions.contains_key("main");

    e.line("static void pb_module_init(void) {");
    e.enter();
    for s in &module_stmts {
        stmt::emit_module_init_stmt(s, &mut e, &ctx_top);
    }
    e.exit();
    e.line("}");
    e.blank();

    e.line("int main(void) {");
    e.enter();
    e.line("pb_module_init();");
    if has_user_main {
        e.line(format!("{}();", mangle::USER_MAIN));
    }
    e.line("return 0;");
    e.exit();
    e.line("}");

    e.out
}
