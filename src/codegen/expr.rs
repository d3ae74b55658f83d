//! Expression lowering (spec §4.4).
use crate::ast::{
    expression::{AttrExpr, BinaryOp, CallExpr, Expr, IndexExpr, NameExpr, UnaryOp},
    Type,
};

use super::{ctype, fstring, layout, mangle, Emitter, FnCtx};

const BUILTIN_CONVERSIONS: [&str; 4] = ["int", "float", "str", "bool"];

/// Escapes `s` as the body of a double-quoted C string literal.
pub fn c_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn float_literal(value: f64) -> String {
    let s = format!("{value}");
    if s.contains('.') || s.contains('e') || s.contains("inf") || s.contains("nan") {
        s
    } else {
        format!("{s}.0")
    }
}

/// True when `base` is a bare reference to the class itself (a constructor
/// callee, a class-qualified unbound call, or a class-level attribute
/// access) rather than to an instance. Mirrors the `is_shadowed` heuristic
/// the type checker uses at `typechecker::expr::check_attr`/`check_call`:
/// a name that is also a registered class is only ever typed `Class(that
/// same name)` by the checker when it was actually resolved as a class
/// reference, since a locally shadowing variable would have been typed
/// with its own declared type instead.
fn is_class_reference(n: &NameExpr<Type>, classes: &crate::typechecker::ClassRegistry) -> bool {
    classes.contains(&n.id) && n.info == Type::Class(n.id.clone())
}

pub fn lower_expr(e: &Expr<Type>, emitter: &mut Emitter, ctx: &FnCtx) -> String {
    match e {
        Expr::Int(n) => format!("{}LL", n.value),
        Expr::Float(n) => float_literal(n.value),
        Expr::Str(n) => c_string_literal(&n.value),
        Expr::Bool(n) => if n.value { "true".to_string() } else { "false".to_string() },
        Expr::FStr(f) => fstring::lower_fstring(&f.segments, emitter, ctx),
        Expr::Name(n) => n.id.clone(),
        Expr::List(l) => lower_list_lit(&l.elements, &l.info, emitter, ctx),
        Expr::Dict(d) => lower_dict_lit(&d.pairs, &d.info, emitter, ctx),
        Expr::Index(i) => lower_index_get(i, emitter, ctx),
        Expr::Attr(a) => lower_attr(a, emitter, ctx),
        Expr::Call(c) => lower_call(c, emitter, ctx),
        Expr::Unary(u) => {
            let operand = lower_expr(&u.operand, emitter, ctx);
            match u.op {
                UnaryOp::Not => format!("(!({operand}))"),
                UnaryOp::Neg => format!("(-({operand}))"),
            }
        }
        Expr::Binary(b) => lower_binary(b, emitter, ctx),
    }
}

/// Builds the literal through the runtime's own `init`/`append` calls
/// instead of pointing `.data` at a stack array: `append` (spec §6/§9) grows
/// a list by `realloc`ing `.data`, which is undefined behaviour unless that
/// pointer came from `malloc`/`calloc`/`realloc` in the first place. Calling
/// `pb_list_init_<T>` first gives the literal a `NULL`, zero-capacity start
/// exactly like any other list, so later appends grow a real heap buffer.
fn lower_list_lit(elements: &[Expr<Type>], ty: &Type, emitter: &mut Emitter, ctx: &FnCtx) -> String {
    let list_ctype = ctype::of(ty);
    let elem = match ty {
        Type::List(elem) => elem.as_ref(),
        other => panic!("'{other}' is not a list type"),
    };
    let suffix = container_suffix(elem);
    let n = emitter.next_tmp();
    let tmp = format!("__tmp_list_{n}");

    emitter.push_pending(format!("{list_ctype} {tmp};"));
    emitter.push_pending(format!("pb_list_init_{suffix}(&{tmp});"));
    for el in elements {
        let value = lower_expr(el, emitter, ctx);
        emitter.push_pending(format!("pb_list_append_{suffix}(&{tmp}, {value});"));
    }
    tmp
}

fn lower_dict_lit(pairs: &[(Expr<Type>, Expr<Type>)], ty: &Type, emitter: &mut Emitter, ctx: &FnCtx) -> String {
    let dict_ctype = ctype::of(ty);
    let suffix = dict_elem_suffix(ty);
    let n = emitter.next_tmp();
    let tmp = format!("__tmp_dict_{n}");

    emitter.push_pending(format!("{dict_ctype} {tmp};"));
    emitter.push_pending(format!("pb_dict_init_str_{suffix}(&{tmp});"));
    for (k, v) in pairs {
        let key = lower_expr(k, emitter, ctx);
        let value = lower_expr(v, emitter, ctx);
        emitter.push_pending(format!("pb_dict_set_str_{suffix}(&{tmp}, {key}, {value});"));
    }
    tmp
}

fn dict_elem_suffix(ty: &Type) -> &'static str {
    match ty {
        Type::Dict(_, value) => match value.as_ref() {
            Type::Int => "int",
            Type::Float => "float",
            Type::Bool => "bool",
            Type::Str => "str",
            other => panic!("no runtime dict monomorphisation for value type '{other}'"),
        },
        other => panic!("'{other}' is not a dict type"),
    }
}

pub(super) fn container_suffix(ty: &Type) -> &'static str {
    match ty {
        Type::Int => "int",
        Type::Float => "float",
        Type::Bool => "bool",
        Type::Str => "str",
        other => panic!("no runtime container monomorphisation for '{other}'"),
    }
}

fn lower_index_get(i: &IndexExpr<Type>, emitter: &mut Emitter, ctx: &FnCtx) -> String {
    let base = lower_expr(&i.base, emitter, ctx);
    let index = lower_expr(&i.index, emitter, ctx);
    match i.base.ty() {
        Type::List(elem) => format!("pb_list_get_{}(&({base}), {index})", container_suffix(&elem)),
        Type::Dict(_, value) => format!("pb_dict_get_str_{}(&({base}), {index})", container_suffix(&value)),
        other => panic!("'{other}' is not indexable"),
    }
}

fn lower_attr(a: &AttrExpr<Type>, emitter: &mut Emitter, ctx: &FnCtx) -> String {
    if let Expr::Name(n) = a.base.as_ref() {
        if is_class_reference(n, ctx.classes) {
            // A class-level attribute (an unbound method reference as a
            // bare value has no C representation; PB has no closures).
            return mangle::class_attr(&n.id, &a.name);
        }
    }
    let base = lower_expr(&a.base, emitter, ctx);
    let Type::Class(class) = a.base.ty() else {
        panic!("attribute access on a non-class base survived type checking");
    };
    let path = layout::field_path(ctx.classes, &class, &a.name);
    format!("{base}->{path}{}", a.name)
}

/// Lowers every supplied argument, then splices in the lowered default
/// expression for each trailing parameter the call omitted.
fn lower_args(args: &[Expr<Type>], defaults: &[Option<Expr<Type>>], emitter: &mut Emitter, ctx: &FnCtx) -> Vec<String> {
    let mut out: Vec<String> = args.iter().map(|a| lower_expr(a, emitter, ctx)).collect();
    for d in &defaults[args.len()..] {
        let default = d.as_ref().expect("fewer call args than parameters implies the rest have defaults");
        out.push(lower_expr(default, emitter, ctx));
    }
    out
}

fn lower_call(c: &CallExpr<Type>, emitter: &mut Emitter, ctx: &FnCtx) -> String {
    match c.callee.as_ref() {
        Expr::Name(n) if BUILTIN_CONVERSIONS.contains(&n.id.as_str()) => lower_conversion_call(&n.id, &c.args[0], emitter, ctx),
        Expr::Name(n) if n.id == "print" => lower_print_call(&c.args[0], emitter, ctx),
        Expr::Name(n) if ctx.classes.contains(&n.id) => lower_constructor_call(&n.id, &c.args, emitter, ctx),
        Expr::Name(n) => {
            let callee = if n.id == "main" { mangle::USER_MAIN.to_string() } else { mangle::func(&n.id) };
            let defaults = ctx.func_defaults.get(&n.id).map(Vec::as_slice).unwrap_or(&[]);
            let args = lower_args(&c.args, defaults, emitter, ctx);
            format!("{callee}({})", args.join(", "))
        }
        Expr::Attr(a) => lower_method_call(a, &c.args, emitter, ctx),
        other => panic!("unsupported call target in generated code: {other:?}"),
    }
}

fn lower_conversion_call(target: &str, arg: &Expr<Type>, emitter: &mut Emitter, ctx: &FnCtx) -> String {
    let value = lower_expr(arg, emitter, ctx);
    let src = arg.ty();
    let src_name = match &src {
        Type::Int => "int",
        Type::Float => "float",
        Type::Bool => "bool",
        Type::Str => "str",
        other => panic!("cannot convert non-primitive type '{other}'"),
    };
    if src_name == target {
        return value;
    }
    format!("pb_{target}_from_{src_name}({value})")
}

/// `print` returns `None`, so its only legal context is a statement
/// expression; the call text itself is returned rather than hoisted, same
/// as any other void call.
fn lower_print_call(arg: &Expr<Type>, emitter: &mut Emitter, ctx: &FnCtx) -> String {
    let value = lower_expr(arg, emitter, ctx);
    match arg.ty() {
        Type::Int => format!("pb_print_int({value})"),
        Type::Float => format!("pb_print_double({value})"),
        Type::Bool => format!("pb_print_bool({value})"),
        Type::Str => format!("pb_print_str({value})"),
        Type::List(elem) => format!("pb_list_print_{}(&({value}))", container_suffix(&elem)),
        Type::Dict(_, v) => format!("pb_dict_print_str_{}(&({value}))", container_suffix(&v)),
        other => panic!("printing a '{other}' value is not supported"),
    }
}

fn lower_constructor_call(class: &str, args: &[Expr<Type>], emitter: &mut Emitter, ctx: &FnCtx) -> String {
    let n = emitter.next_tmp();
    let tmp = format!("__tmp_{class}_{n}");
    emitter.push_pending(format!("struct {class} {tmp};"));

    if let Some((defining, _)) = ctx.classes.resolve_method(class, "__init__") {
        let defaults = ctx.method_defaults.get(&(defining, "__init__".to_string())).map(Vec::as_slice).unwrap_or(&[]);
        let arg_exprs = lower_args(args, defaults, emitter, ctx);
        let mut call_args = format!("&{tmp}");
        for a in &arg_exprs {
            call_args.push_str(", ");
            call_args.push_str(a);
        }
        emitter.push_pending(format!("{}({call_args});", mangle::method(class, "__init__")));
    }

    format!("(&{tmp})")
}

fn lower_method_call(a: &AttrExpr<Type>, args: &[Expr<Type>], emitter: &mut Emitter, ctx: &FnCtx) -> String {
    if let Expr::Name(n) = a.base.as_ref() {
        if is_class_reference(n, ctx.classes) {
            // Unbound, class-qualified call: `P.__init__(self)` (spec §8
            // scenario 4). The first argument is the explicit receiver,
            // cast to the named class's pointer type; the rest follow the
            // defining class's own defaults, same as any other call.
            let (defining, _) =
                ctx.classes.resolve_method(&n.id, &a.name).unwrap_or_else(|| panic!("'{}' has no method '{}'", n.id, a.name));
            let defaults = ctx.method_defaults.get(&(defining, a.name.clone())).map(Vec::as_slice).unwrap_or(&[]);
            let self_arg = lower_expr(&args[0], emitter, ctx);
            let rest = lower_args(&args[1..], defaults, emitter, ctx);
            let mut call_args = format!("(struct {}*)({self_arg})", n.id);
            for a in &rest {
                call_args.push_str(", ");
                call_args.push_str(a);
            }
            return format!("{}({call_args})", mangle::method(&n.id, &a.name));
        }
    }

    let base = lower_expr(&a.base, emitter, ctx);
    let Type::Class(class) = a.base.ty() else {
        panic!("method call base is not a class instance");
    };
    // Dispatch through the receiver's static class: a forwarding wrapper
    // exists for every method it inherits but does not override, so this
    // single call form works whether `class` defines the method itself or
    // not (spec §9 "callers of `Subclass__m` invoke the subclass version
    // directly"). Defaults still come from the *defining* class, the only
    // one whose default expressions are known.
    let (defining, _) = ctx.classes.resolve_method(&class, &a.name).unwrap_or_else(|| panic!("'{class}' has no method '{}'", a.name));
    let defaults = ctx.method_defaults.get(&(defining, a.name.clone())).map(Vec::as_slice).unwrap_or(&[]);
    let arg_exprs = lower_args(args, defaults, emitter, ctx);
    let mut call_args = base;
    for a in &arg_exprs {
        call_args.push_str(", ");
        call_args.push_str(a);
    }
    format!("{}({call_args})", mangle::method(&class, &a.name))
}

fn is_zero_checked(op: BinaryOp) -> bool {
    matches!(op, BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Mod)
}

fn lower_binary(b: &crate::ast::expression::BinaryExpr<Type>, emitter: &mut Emitter, ctx: &FnCtx) -> String {
    let lhs_ty = b.lhs.ty();
    let rhs_ty = b.rhs.ty();
    let lhs = lower_expr(&b.lhs, emitter, ctx);
    let rhs_value = lower_expr(&b.rhs, emitter, ctx);
    let is_float = lhs_ty == Type::Float || rhs_ty == Type::Float;

    let rhs = if is_zero_checked(b.op) {
        // Hoisted into a temporary so a side-effecting divisor (a call, a
        // mutating method call) is evaluated once despite appearing both in
        // this guard and in the arithmetic below (spec §4.4/§7: division by
        // zero raises ZeroDivisionError through the same exception channel
        // as an explicit `raise`).
        let n = emitter.next_tmp();
        let tmp = format!("__rhs_{n}");
        emitter.push_pending(format!("{} {tmp} = {rhs_value};", ctype::of(&rhs_ty)));
        emitter.push_pending(format!("if (({tmp}) == 0) pb_raise_msg(\"ZeroDivisionError\", \"division by zero\");"));
        tmp
    } else {
        rhs_value
    };

    match b.op {
        BinaryOp::Or => format!("(({lhs}) || ({rhs}))"),
        BinaryOp::And => format!("(({lhs}) && ({rhs}))"),
        BinaryOp::Is | BinaryOp::Eq => lower_eq(&lhs, &rhs, &lhs_ty, false),
        BinaryOp::IsNot | BinaryOp::NotEq => lower_eq(&lhs, &rhs, &lhs_ty, true),
        BinaryOp::Lt => format!("(({lhs}) < ({rhs}))"),
        BinaryOp::LtEq => format!("(({lhs}) <= ({rhs}))"),
        BinaryOp::Gt => format!("(({lhs}) > ({rhs}))"),
        BinaryOp::GtEq => format!("(({lhs}) >= ({rhs}))"),
        BinaryOp::Add => format!("(({lhs}) + ({rhs}))"),
        BinaryOp::Sub => format!("(({lhs}) - ({rhs}))"),
        BinaryOp::Mul => format!("(({lhs}) * ({rhs}))"),
        BinaryOp::Div => format!("((double)({lhs}) / (double)({rhs}))"),
        BinaryOp::FloorDiv => {
            if is_float {
                format!("pb_floordiv_f64((double)({lhs}), (double)({rhs}))")
            } else {
                format!("pb_floordiv_i64(({lhs}), ({rhs}))")
            }
        }
        BinaryOp::Mod => {
            if is_float {
                format!("pb_mod_f64((double)({lhs}), (double)({rhs}))")
            } else {
                format!("pb_mod_i64(({lhs}), ({rhs}))")
            }
        }
    }
}

fn lower_eq(lhs: &str, rhs: &str, operand_ty: &Type, negate: bool) -> String {
    match operand_ty {
        Type::Str => {
            if negate {
                format!("(strcmp({lhs}, {rhs}) != 0)")
            } else {
                format!("(strcmp({lhs}, {rhs}) == 0)")
            }
        }
        // Subclass/superclass comparisons can pair up two distinct struct
        // pointer types; C forbids comparing those directly without a cast.
        Type::Class(_) => {
            if negate {
                format!("((void*)({lhs}) != (void*)({rhs}))")
            } else {
                format!("((void*)({lhs}) == (void*)({rhs}))")
            }
        }
        _ => {
            if negate {
                format!("(({lhs}) != ({rhs}))")
            } else {
                format!("(({lhs}) == ({rhs}))")
            }
        }
    }
}
