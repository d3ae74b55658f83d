//! Statement lowering (spec §4.4 "Control-flow lowering"/"Exception
//! lowering"): every [`Stmt<Type>`] variant to one or more C99 statements,
//! threading the same hoisted-`pending` discipline expression lowering uses.
use crate::ast::{
    expression::Expr,
    statement::{Assert, Assign, AugAssign, AugOp, For, FuncDef, If, Raise, Return, Stmt, Try, VarDecl, While},
    Type,
};

use super::{ctype, expr, mangle, Emitter, FnCtx};

/// Mirrors `typechecker::stmt::BUILTIN_EXCEPTIONS`: these names have no
/// backing class, so raising one calls `pb_raise_msg` directly instead of
/// going through constructor lowering.
const BUILTIN_EXCEPTIONS: [&str; 5] = ["RuntimeError", "ValueError", "IndexError", "ZeroDivisionError", "AttributeError"];

fn param_list(f: &FuncDef<Type>, self_class: Option<&str>) -> String {
    let mut parts = Vec::new();
    if let Some(class) = self_class {
        parts.push(format!("struct {class}* self"));
    }
    for p in f.params.iter().filter(|p| !(p.name == "self" && p.declared_type.is_none())) {
        let ty = p.declared_type.as_ref().expect("every non-self parameter is annotated");
        parts.push(format!("{} {}", ctype::of(ty), p.name));
    }
    parts.join(", ")
}

fn func_name(f: &FuncDef<Type>) -> String {
    if f.name == "main" { mangle::USER_MAIN.to_string() } else { mangle::func(&f.name) }
}

pub fn emit_func_prototype(f: &FuncDef<Type>, e: &mut Emitter) {
    e.line(format!("{} {}({});", ctype::of(&f.return_type), func_name(f), param_list(f, None)));
}

fn emit_body(body: &[Stmt<Type>], e: &mut Emitter, ctx: &FnCtx) {
    e.enter();
    for s in body {
        emit_stmt(s, e, ctx);
    }
    e.exit();
}

pub fn emit_func_def(f: &FuncDef<Type>, e: &mut Emitter, ctx: &FnCtx) {
    let name = func_name(f);
    e.line(format!("{} {name}({}) {{", ctype::of(&f.return_type), param_list(f, None)));
    emit_body(&f.body, e, ctx);
    e.line("}");
    e.blank();
}

pub fn emit_method_def(class: &str, m: &FuncDef<Type>, e: &mut Emitter, ctx: &FnCtx) {
    e.line(format!("{} {}({}) {{", ctype::of(&m.return_type), mangle::method(class, &m.name), param_list(m, Some(class))));
    emit_body(&m.body, e, ctx);
    e.line("}");
    e.blank();
}

pub fn emit_module_init_stmt(s: &Stmt<Type>, e: &mut Emitter, ctx: &FnCtx) {
    if let Stmt::VarDecl(v) = s {
        // The global itself was already declared zero-initialized by
        // `layout::emit_module_var_globals`; only the assignment runs here.
        let val = expr::lower_expr(&v.init, e, ctx);
        e.stmt_line(format!("{} = {val};", v.name));
        return;
    }
    emit_stmt(s, e, ctx);
}

fn emit_stmt(s: &Stmt<Type>, e: &mut Emitter, ctx: &FnCtx) {
    match s {
        Stmt::VarDecl(v) => emit_var_decl(v, e, ctx),
        Stmt::Assign(a) => emit_assign(a, e, ctx),
        Stmt::AugAssign(a) => emit_aug_assign(a, e, ctx),
        Stmt::If(s) => emit_if(s, e, ctx),
        Stmt::While(s) => emit_while(s, e, ctx),
        Stmt::For(s) => emit_for(s, e, ctx),
        Stmt::Try(s) => emit_try(s, e, ctx),
        Stmt::Raise(s) => emit_raise(s, e, ctx),
        Stmt::Return(s) => emit_return(s, e, ctx),
        Stmt::Assert(s) => emit_assert(s, e, ctx),
        Stmt::Break(_) => e.line("break;"),
        Stmt::Continue(_) => e.line("continue;"),
        Stmt::Pass(_) => e.line("/* pass */;"),
        Stmt::Global(_) => {
            // `global` only redirects name resolution in the type checker;
            // the generated function already writes straight to the module
            // global, so there is no C equivalent to emit.
        }
        Stmt::Import(_) => {
            // Single-file compilation (spec §1 Non-goals: "multi-file
            // modules beyond import resolution stubs"); nothing to lower.
        }
        Stmt::FuncDef(_) | Stmt::ClassDef(_) => {
            unreachable!("the type checker rejects nested function/class definitions")
        }
        Stmt::ExprStmt(e_stmt) => {
            let val = expr::lower_expr(&e_stmt.expr, e, ctx);
            e.stmt_line(format!("{val};"));
        }
    }
}

fn emit_var_decl(v: &VarDecl<Type>, e: &mut Emitter, ctx: &FnCtx) {
    let val = expr::lower_expr(&v.init, e, ctx);
    e.stmt_line(format!("{} {} = {val};", ctype::of(&v.declared_type), v.name));
}

/// The C statement that stores `value` into `target`. `Index` targets have
/// no C lvalue form (the runtime containers are opaque records) and instead
/// go through a `pb_*_set_*` call.
fn store(target: &Expr<Type>, value: String, e: &mut Emitter, ctx: &FnCtx) -> String {
    match target {
        Expr::Name(n) => format!("{} = {value};", n.id),
        Expr::Attr(a) => {
            let base = expr::lower_expr(&a.base, e, ctx);
            let Type::Class(class) = a.base.ty() else {
                panic!("attribute assignment base is not a class instance");
            };
            let path = super::layout::field_path(ctx.classes, &class, &a.name);
            format!("{base}->{path}{} = {value};", a.name)
        }
        Expr::Index(i) => {
            let base = expr::lower_expr(&i.base, e, ctx);
            let index = expr::lower_expr(&i.index, e, ctx);
            match i.base.ty() {
                Type::List(elem) => format!("pb_list_set_{}(&({base}), {index}, {value});", expr::container_suffix(&elem)),
                Type::Dict(_, v) => format!("pb_dict_set_str_{}(&({base}), {index}, {value});", expr::container_suffix(&v)),
                other => panic!("'{other}' is not assignable by index"),
            }
        }
        other => panic!("'{other:?}' is not a valid assignment target"),
    }
}

fn emit_assign(a: &Assign<Type>, e: &mut Emitter, ctx: &FnCtx) {
    let value = expr::lower_expr(&a.value, e, ctx);
    let line = store(&a.target, value, e, ctx);
    e.stmt_line(line);
}

/// `target OP= value` has no single C operator for the checked widening and
/// floor-div/mod semantics PB gives it, so it lowers as a plain read,
/// compute, and [`store`] rather than C's own `+=`/`-=`/etc.
fn emit_aug_assign(a: &AugAssign<Type>, e: &mut Emitter, ctx: &FnCtx) {
    let current = expr::lower_expr(&a.target, e, ctx);
    let rhs_value = expr::lower_expr(&a.value, e, ctx);
    let target_ty = a.target.ty();
    let rhs_ty = a.value.ty();
    let is_float = target_ty == Type::Float || rhs_ty == Type::Float;
    let is_zero_checked = matches!(a.op, AugOp::Div | AugOp::FloorDiv | AugOp::Mod);

    // Hoisted into a temporary so a side-effecting rhs is evaluated once
    // despite appearing both in the zero-division guard and the arithmetic
    // below, the same discipline `expr::lower_binary` uses.
    let rhs = if is_zero_checked {
        let n = e.next_tmp();
        let tmp = format!("__rhs_{n}");
        e.push_pending(format!("{} {tmp} = {rhs_value};", ctype::of(&rhs_ty)));
        e.push_pending(format!("if (({tmp}) == 0) pb_raise_msg(\"ZeroDivisionError\", \"division by zero\");"));
        tmp
    } else {
        rhs_value
    };

    let computed = match a.op {
        AugOp::Add => format!("(({current}) + ({rhs}))"),
        AugOp::Sub => format!("(({current}) - ({rhs}))"),
        AugOp::Mul => format!("(({current}) * ({rhs}))"),
        AugOp::Div => format!("((double)({current}) / (double)({rhs}))"),
        AugOp::FloorDiv => {
            if is_float {
                format!("pb_floordiv_f64((double)({current}), (double)({rhs}))")
            } else {
                format!("pb_floordiv_i64(({current}), ({rhs}))")
            }
        }
        AugOp::Mod => {
            if is_float {
                format!("pb_mod_f64((double)({current}), (double)({rhs}))")
            } else {
                format!("pb_mod_i64(({current}), ({rhs}))")
            }
        }
    };
    let line = store(&a.target, computed, e, ctx);
    e.stmt_line(line);
}

/// `if`/`elif`/`else` lowers to nested `if { } else { ... }` rather than a
/// flat `else if` chain, so a condition that hoists pending statements (a
/// constructor built from a defaulted argument, say) always has a plain
/// block to hoist them into immediately before it is tested.
fn emit_if(s: &If<Type>, e: &mut Emitter, ctx: &FnCtx) {
    emit_if_chain(&s.condition, &s.then_body, &s.elifs, 0, &s.else_body, e, ctx);
}

fn emit_if_chain(
    condition: &Expr<Type>,
    body: &[Stmt<Type>],
    elifs: &[(Expr<Type>, Vec<Stmt<Type>>)],
    idx: usize,
    else_body: &Option<Vec<Stmt<Type>>>,
    e: &mut Emitter,
    ctx: &FnCtx,
) {
    let cond = expr::lower_expr(condition, e, ctx);
    e.stmt_line(format!("if ({cond}) {{"));
    emit_body(body, e, ctx);
    if idx < elifs.len() {
        e.line("} else {");
        e.enter();
        let (next_cond, next_body) = &elifs[idx];
        emit_if_chain(next_cond, next_body, elifs, idx + 1, else_body, e, ctx);
        e.exit();
        e.line("}");
    } else if let Some(else_b) = else_body {
        e.line("} else {");
        emit_body(else_b, e, ctx);
        e.line("}");
    } else {
        e.line("}");
    }
}

/// `while (1) { <pending for condition>; if (!(cond)) break; <body> }`
/// instead of a plain C `while (cond)`, so a condition that hoists pending
/// statements re-runs them on every iteration, not just the first.
fn emit_while(s: &While<Type>, e: &mut Emitter, ctx: &FnCtx) {
    e.stmt_line("while (1) {");
    e.enter();
    let cond = expr::lower_expr(&s.condition, e, ctx);
    e.stmt_line(format!("if (!({cond})) break;"));
    for st in &s.body {
        emit_stmt(st, e, ctx);
    }
    e.exit();
    e.line("}");
}

/// `for v in range(...)`: the only supported iterable (spec §4.3), with one
/// or two int arguments giving end / start,end, step always 1.
fn emit_for(s: &For<Type>, e: &mut Emitter, ctx: &FnCtx) {
    let Expr::Call(call) = s.iter.as_ref() else {
        unreachable!("checked 'for' iterables are always 'range(...)' calls");
    };
    let args: Vec<String> = call.args.iter().map(|a| expr::lower_expr(a, e, ctx)).collect();
    let (start, end) = match args.as_slice() {
        [end] => ("0".to_string(), end.clone()),
        [start, end] => (start.clone(), end.clone()),
        _ => unreachable!("the type checker restricts 'range' to one or two arguments"),
    };
    let var = &s.var;
    e.stmt_line(format!("for (int64_t {var} = {start}; {var} < {end}; {var} += 1) {{"));
    for st in &s.body {
        emit_stmt(st, e, ctx);
    }
    e.line("}");
}

fn emit_assert(s: &Assert<Type>, e: &mut Emitter, ctx: &FnCtx) {
    let cond = expr::lower_expr(&s.condition, e, ctx);
    e.stmt_line(format!("if (!({cond})) pb_fail(\"Assertion failed\");"));
}

fn emit_return(s: &Return<Type>, e: &mut Emitter, ctx: &FnCtx) {
    match &s.value {
        Some(v) => {
            let val = expr::lower_expr(v, e, ctx);
            e.stmt_line(format!("return {val};"));
        }
        None => e.stmt_line("return;"),
    }
}

/// `try`/`except`/`raise` lowering via `setjmp`/`longjmp` (spec §4.4
/// "Exception lowering", §9 "process-global linked stack of `jmp_buf`
/// contexts"). Each `try` acquires a context, `setjmp`s it, runs the body on
/// the `== 0` path popping the context on the way out, and on the nonzero
/// (longjmp'd-back) path dispatches on `pb_current_exc.type` into the
/// matching handler in source order, reraising if none match.
fn emit_try(s: &Try<Type>, e: &mut Emitter, ctx: &FnCtx) {
    let n = e.next_tmp();
    let ctxvar = format!("__exc_ctx_{n}");
    let flag = format!("__exc_flag_{n}");

    e.line(format!("PbTryContext {ctxvar};"));
    e.line(format!("pb_push_try(&{ctxvar});"));
    e.line(format!("int {flag} = setjmp({ctxvar}.env);"));
    e.line(format!("if ({flag} == 0) {{"));
    e.enter();
    for st in &s.body {
        emit_stmt(st, e, ctx);
    }
    e.line("pb_pop_try();");
    e.exit();
    e.line("} else {");
    e.enter();
    for (i, h) in s.handlers.iter().enumerate() {
        let keyword = if i == 0 { "if" } else { "else if" };
        e.line(format!("{keyword} (strcmp(pb_current_exc.type, \"{}\") == 0) {{", h.exc_name));
        e.enter();
        if let Some(alias) = &h.alias {
            // The alias binds to the message, not an instance (spec §4.3
            // Try: "bound with type str").
            e.line(format!("const char* {alias} = pb_current_exc.value;"));
        }
        e.line("pb_clear_exc();");
        for st in &h.body {
            emit_stmt(st, e, ctx);
        }
        e.exit();
        e.line("}");
    }
    if s.handlers.is_empty() {
        e.line("pb_reraise();");
    } else {
        e.line("else {");
        e.enter();
        e.line("pb_reraise();");
        e.exit();
        e.line("}");
    }
    e.exit();
    e.line("}");
}

/// `raise Kind(...)`. A built-in name has no backing class and lowers
/// straight to `pb_raise_msg`; a user class is constructed like any other
/// call and handed to `pb_raise_obj`, which reads its `msg` field (spec §6:
/// "obj's first field must be `const char* msg`").
fn emit_raise(s: &Raise<Type>, e: &mut Emitter, ctx: &FnCtx) {
    let Expr::Call(call) = s.exception.as_ref() else {
        unreachable!("checked 'raise' is always a call expression");
    };
    let Expr::Name(n) = call.callee.as_ref() else {
        unreachable!("checked 'raise' callee is always a name");
    };

    if BUILTIN_EXCEPTIONS.contains(&n.id.as_str()) {
        let msg = match call.args.first() {
            Some(arg) => expr::lower_expr(arg, e, ctx),
            None => expr::c_string_literal(""),
        };
        e.stmt_line(format!("pb_raise_msg(\"{}\", {msg});", n.id));
    } else {
        let obj = expr::lower_expr(s.exception.as_ref(), e, ctx);
        e.stmt_line(format!("pb_raise_obj(\"{}\", (void*)({obj}));", n.id));
    }
}
