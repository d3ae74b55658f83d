use crate::ast::{
    expression::{
        AttrExpr, BinaryExpr, BinaryOp, BoolLit, CallExpr, DictLit, Expr, FStringLit, FStringSegment, FloatLit,
        IndexExpr, IntLit, ListLit, NameExpr, StrLit, UnaryExpr, UnaryOp,
    },
    Type,
};

use super::{checkable::TypeCheck, context::Context, error::{TypeError, TypeResult}};

const BUILTIN_CONVERSIONS: [&str; 4] = ["int", "float", "str", "bool"];

impl TypeCheck for Expr<()> {
    type Checked = Expr<Type>;

    fn type_check(self, ctx: &mut Context) -> TypeResult<Self::Checked> {
        check_expr(self, ctx, None)
    }
}

/// Checks `expr`, using `expected` only to pick the element/value type of an
/// *empty* list or dict literal (spec §4.3: "the empty list literal `[]`
/// requires a target annotation to fix the element type"). Every recursive
/// call passes `None`: the annotation only reaches the literal it directly
/// initializes, not nested sub-expressions.
pub fn check_expr(expr: Expr<()>, ctx: &mut Context, expected: Option<&Type>) -> TypeResult<Expr<Type>> {
    match expr {
        Expr::Int(IntLit { value, span, .. }) => Ok(Expr::Int(IntLit { value, info: Type::Int, span })),
        Expr::Float(FloatLit { value, span, .. }) => Ok(Expr::Float(FloatLit { value, info: Type::Float, span })),
        Expr::Str(StrLit { value, span, .. }) => Ok(Expr::Str(StrLit { value, info: Type::Str, span })),
        Expr::Bool(BoolLit { value, span, .. }) => Ok(Expr::Bool(BoolLit { value, info: Type::Bool, span })),
        Expr::FStr(f) => check_fstring(f, ctx),
        Expr::Name(n) => check_name(n, ctx),
        Expr::List(l) => check_list(l, ctx, expected),
        Expr::Dict(d) => check_dict(d, ctx, expected),
        Expr::Index(i) => check_index(i, ctx),
        Expr::Attr(a) => check_attr(a, ctx),
        Expr::Call(c) => check_call(c, ctx),
        Expr::Unary(u) => check_unary(u, ctx),
        Expr::Binary(b) => check_binary(b, ctx),
    }
}

fn check_name(n: NameExpr<()>, ctx: &mut Context) -> TypeResult<Expr<Type>> {
    match ctx.resolve_name(&n.id) {
        Some(ty) => Ok(Expr::Name(NameExpr { id: n.id, info: ty, span: n.span })),
        None => Err(TypeError::new(format!("undeclared name '{}'", n.id), n.span)),
    }
}

fn check_fstring(f: FStringLit<()>, ctx: &mut Context) -> TypeResult<Expr<Type>> {
    let mut segments = Vec::with_capacity(f.segments.len());
    for seg in f.segments {
        segments.push(match seg {
            FStringSegment::Text(t) => FStringSegment::Text(t),
            FStringSegment::Expr(e) => {
                let span = e.span();
                let checked = check_expr(e, ctx, None)?;
                if !checked.ty().is_primitive() {
                    return Err(TypeError::new(
                        format!("f-string expressions must be int, float, bool, or str, found '{}'", checked.ty()),
                        span,
                    ));
                }
                FStringSegment::Expr(checked)
            }
        });
    }
    Ok(Expr::FStr(FStringLit { segments, info: Type::Str, span: f.span }))
}

fn check_list(l: ListLit<()>, ctx: &mut Context, expected: Option<&Type>) -> TypeResult<Expr<Type>> {
    if l.elements.is_empty() {
        let elem = match expected {
            Some(Type::List(elem)) => (**elem).clone(),
            _ => return Err(TypeError::new("an empty list literal requires a target type annotation", l.span)),
        };
        return Ok(Expr::List(ListLit { elements: Vec::new(), info: Type::list_of(elem), span: l.span }));
    }

    let mut checked = Vec::with_capacity(l.elements.len());
    for e in l.elements {
        checked.push(check_expr(e, ctx, None)?);
    }
    let elem_ty = checked[0].ty();
    for e in &checked[1..] {
        if e.ty() != elem_ty {
            return Err(TypeError::new(
                format!("list elements must share one type: found '{elem_ty}' and '{}'", e.ty()),
                e.span(),
            ));
        }
    }
    Ok(Expr::List(ListLit { elements: checked, info: Type::list_of(elem_ty), span: l.span }))
}

fn check_dict(d: DictLit<()>, ctx: &mut Context, expected: Option<&Type>) -> TypeResult<Expr<Type>> {
    if d.pairs.is_empty() {
        let value = match expected {
            Some(Type::Dict(_, value)) => (**value).clone(),
            _ => return Err(TypeError::new("an empty dict literal requires a target type annotation", d.span)),
        };
        return Ok(Expr::Dict(DictLit { pairs: Vec::new(), info: Type::dict_of(value), span: d.span }));
    }

    let mut checked = Vec::with_capacity(d.pairs.len());
    for (k, v) in d.pairs {
        let k = check_expr(k, ctx, None)?;
        if k.ty() != Type::Str {
            return Err(TypeError::new(format!("dict keys must be 'str', found '{}'", k.ty()), k.span()));
        }
        let v = check_expr(v, ctx, None)?;
        checked.push((k, v));
    }
    let value_ty = checked[0].1.ty();
    for (_, v) in &checked[1..] {
        if v.ty() != value_ty {
            return Err(TypeError::new(
                format!("dict values must share one type: found '{value_ty}' and '{}'", v.ty()),
                v.span(),
            ));
        }
    }
    Ok(Expr::Dict(DictLit { pairs: checked, info: Type::dict_of(value_ty), span: d.span }))
}

fn check_index(i: IndexExpr<()>, ctx: &mut Context) -> TypeResult<Expr<Type>> {
    let span = i.span;
    let base = check_expr(*i.base, ctx, None)?;
    let index = check_expr(*i.index, ctx, None)?;
    let result_ty = match base.ty() {
        Type::List(elem) => {
            if index.ty() != Type::Int {
                return Err(TypeError::new(format!("list index must be 'int', found '{}'", index.ty()), index.span()));
            }
            *elem
        }
        Type::Dict(_, value) => {
            if index.ty() != Type::Str {
                return Err(TypeError::new(format!("dict key must be 'str', found '{}'", index.ty()), index.span()));
            }
            *value
        }
        other => return Err(TypeError::new(format!("'{other}' is not indexable"), base.span())),
    };
    Ok(Expr::Index(IndexExpr { base: Box::new(base), index: Box::new(index), info: result_ty, span }))
}

/// True if `name` is reachable as an ordinary value in `ctx` (a local,
/// parameter, module variable, function, or already resolves through
/// `resolve_name`). Used to decide whether a bare identifier in callee or
/// attribute-base position should be treated as a class reference.
fn is_shadowed(ctx: &Context, name: &str) -> bool {
    ctx.local_binding(name).is_some() || ctx.module.contains(name) || ctx.functions.contains_key(name)
}

fn check_attr(a: AttrExpr<()>, ctx: &mut Context) -> TypeResult<Expr<Type>> {
    let span = a.span;

    if let Expr::Name(n) = a.base.as_ref() {
        if !is_shadowed(ctx, &n.id) && ctx.classes.contains(&n.id) {
            let class = n.id.clone();
            let base = Expr::Name(NameExpr { id: class.clone(), info: Type::Class(class.clone()), span: n.span });

            if let Some(ty) = ctx.classes.resolve_class_attr(&class, &a.name) {
                return Ok(Expr::Attr(AttrExpr { base: Box::new(base), name: a.name, info: ty, span }));
            }
            if let Some((_, sig)) = ctx.classes.resolve_method(&class, &a.name) {
                let params = std::iter::once(Type::Class(class.clone())).chain(sig.params).collect();
                let unbound = Type::Func(params, Box::new(sig.return_type));
                return Ok(Expr::Attr(AttrExpr { base: Box::new(base), name: a.name, info: unbound, span }));
            }
            return Err(TypeError::new(format!("class '{class}' has no attribute or method '{}'", a.name), span));
        }
    }

    let base = check_expr(*a.base, ctx, None)?;
    let Type::Class(class) = base.ty() else {
        return Err(TypeError::new(format!("'{}' has no attribute '{}'", base.ty(), a.name), base.span()));
    };

    if let Some(ty) = ctx.classes.resolve_field(&class, &a.name) {
        return Ok(Expr::Attr(AttrExpr { base: Box::new(base), name: a.name, info: ty, span }));
    }
    if let Some((_, sig)) = ctx.classes.resolve_method(&class, &a.name) {
        return Ok(Expr::Attr(AttrExpr { base: Box::new(base), name: a.name, info: sig.as_func_type(), span }));
    }
    Err(TypeError::new(format!("'{class}' has no attribute '{}'", a.name), span))
}

fn check_call(c: CallExpr<()>, ctx: &mut Context) -> TypeResult<Expr<Type>> {
    let span = c.span;
    let CallExpr { callee, args, .. } = c;

    if let Expr::Name(n) = callee.as_ref() {
        if !is_shadowed(ctx, &n.id) && !ctx.classes.contains(&n.id) {
            if BUILTIN_CONVERSIONS.contains(&n.id.as_str()) {
                return check_conversion_call(n.clone(), args, ctx, span);
            }
            if n.id == "print" {
                return check_print_call(n.clone(), args, ctx, span);
            }
        }
    }

    let (checked_callee, params, required, ret) = resolve_callable(*callee, ctx)?;

    if args.len() < required || args.len() > params.len() {
        return Err(TypeError::new(
            format!(
                "expected {} argument(s), found {}",
                if required == params.len() { required.to_string() } else { format!("{required}..={}", params.len()) },
                args.len()
            ),
            span,
        ));
    }

    let mut checked_args = Vec::with_capacity(args.len());
    for (arg, expected_ty) in args.into_iter().zip(params.iter()) {
        let checked = check_expr(arg, ctx, Some(expected_ty))?;
        if !checked.ty().assignable_to(expected_ty, |c| ctx.classes.ancestors(c)) {
            return Err(TypeError::new(
                format!("argument of type '{}' is not assignable to parameter of type '{expected_ty}'", checked.ty()),
                checked.span(),
            ));
        }
        checked_args.push(checked);
    }

    Ok(Expr::Call(CallExpr { callee: Box::new(checked_callee), args: checked_args, info: ret, span }))
}

fn check_conversion_call(n: NameExpr<()>, args: Vec<Expr<()>>, ctx: &mut Context, span: crate::lexer::Span) -> TypeResult<Expr<Type>> {
    if args.len() != 1 {
        return Err(TypeError::new(format!("'{}' expects exactly one argument", n.id), span));
    }
    let arg = check_expr(args.into_iter().next().unwrap(), ctx, None)?;
    if !arg.ty().is_primitive() {
        return Err(TypeError::new(format!("cannot convert '{}' with '{}'", arg.ty(), n.id), span));
    }
    let result_ty = match n.id.as_str() {
        "int" => Type::Int,
        "float" => Type::Float,
        "str" => Type::Str,
        "bool" => Type::Bool,
        _ => unreachable!(),
    };
    let callee = Expr::Name(NameExpr { id: n.id, info: Type::Func(vec![arg.ty()], Box::new(result_ty.clone())), span: n.span });
    Ok(Expr::Call(CallExpr { callee: Box::new(callee), args: vec![arg], info: result_ty, span }))
}

fn check_print_call(n: NameExpr<()>, args: Vec<Expr<()>>, ctx: &mut Context, span: crate::lexer::Span) -> TypeResult<Expr<Type>> {
    if args.len() != 1 {
        return Err(TypeError::new("'print' expects exactly one argument", span));
    }
    let arg = check_expr(args.into_iter().next().unwrap(), ctx, None)?;
    let callee = Expr::Name(NameExpr { id: n.id, info: Type::Func(vec![arg.ty()], Box::new(Type::NoneType)), span: n.span });
    Ok(Expr::Call(CallExpr { callee: Box::new(callee), args: vec![arg], info: Type::NoneType, span }))
}

/// Resolves what `callee` refers to as a callable: the checked callee
/// expression, its parameter types, how many of those are required (spec
/// §4.3 `Call`: "trailing arguments may be omitted only for parameters with
/// defaults"), and its return type. Function/method/constructor calls look
/// this up from the registries (which know about defaults); a call through
/// an ordinary `Func`-typed value falls back to treating every parameter as
/// required, since PB has no first-class function literals to carry default
/// information at that point.
fn resolve_callable(callee: Expr<()>, ctx: &mut Context) -> TypeResult<(Expr<Type>, Vec<Type>, usize, Type)> {
    match callee {
        Expr::Name(n) => {
            if !is_shadowed(ctx, &n.id) && ctx.classes.contains(&n.id) {
                let class = n.id.clone();
                let sig = ctx.classes.resolve_method(&class, "__init__").map(|(_, s)| s);
                let (params, required) = sig.map(|s| (s.params, s.required)).unwrap_or_default();
                let ty = Type::Func(params.clone(), Box::new(Type::Class(class.clone())));
                let checked = Expr::Name(NameExpr { id: class.clone(), info: ty, span: n.span });
                return Ok((checked, params, required, Type::Class(class)));
            }
            if !is_shadowed(ctx, &n.id) {
                if let Some(sig) = ctx.functions.get(&n.id).cloned() {
                    let ty = sig.as_func_type();
                    let checked = Expr::Name(NameExpr { id: n.id.clone(), info: ty, span: n.span });
                    return Ok((checked, sig.params, sig.required, sig.return_type));
                }
            }
            let span = n.span;
            let checked = check_name(n, ctx)?;
            let ty = checked.ty();
            match ty {
                Type::Func(params, ret) => {
                    let required = params.len();
                    Ok((checked, params, required, *ret))
                }
                other => Err(TypeError::new(format!("'{other}' is not callable"), span)),
            }
        }
        Expr::Attr(a) => resolve_callable_attr(a, ctx),
        other => {
            let span = other.span();
            let checked = check_expr(other, ctx, None)?;
            match checked.ty() {
                Type::Func(params, ret) => {
                    let required = params.len();
                    Ok((checked, params, required, *ret))
                }
                other_ty => Err(TypeError::new(format!("'{other_ty}' is not callable"), span)),
            }
        }
    }
}

fn resolve_callable_attr(a: AttrExpr<()>, ctx: &mut Context) -> TypeResult<(Expr<Type>, Vec<Type>, usize, Type)> {
    let span = a.span;

    if let Expr::Name(n) = a.base.as_ref() {
        if !is_shadowed(ctx, &n.id) && ctx.classes.contains(&n.id) {
            let class = n.id.clone();
            let Some((_, sig)) = ctx.classes.resolve_method(&class, &a.name) else {
                return Err(TypeError::new(format!("class '{class}' has no method '{}'", a.name), span));
            };
            let mut params = vec![Type::Class(class.clone())];
            params.extend(sig.params);
            let required = sig.required + 1;
            let ret = sig.return_type;
            let base = Expr::Name(NameExpr { id: class.clone(), info: Type::Class(class), span: n.span });
            let ty = Type::Func(params.clone(), Box::new(ret.clone()));
            let checked = Expr::Attr(AttrExpr { base: Box::new(base), name: a.name, info: ty, span });
            return Ok((checked, params, required, ret));
        }
    }

    let base = check_expr(*a.base, ctx, None)?;
    let Type::Class(class) = base.ty() else {
        return Err(TypeError::new(format!("'{}' has no attribute '{}'", base.ty(), a.name), base.span()));
    };
    let Some((_, sig)) = ctx.classes.resolve_method(&class, &a.name) else {
        return Err(TypeError::new(format!("'{class}' has no method '{}'", a.name), span));
    };
    let params = sig.params;
    let required = sig.required;
    let ret = sig.return_type;
    let ty = Type::Func(params.clone(), Box::new(ret.clone()));
    let checked = Expr::Attr(AttrExpr { base: Box::new(base), name: a.name, info: ty, span });
    Ok((checked, params, required, ret))
}

fn check_unary(u: UnaryExpr<()>, ctx: &mut Context) -> TypeResult<Expr<Type>> {
    let span = u.span;
    let operand = check_expr(*u.operand, ctx, None)?;
    let ty = match u.op {
        UnaryOp::Not => {
            if operand.ty() != Type::Bool {
                return Err(TypeError::new(format!("'not' requires a 'bool' operand, found '{}'", operand.ty()), operand.span()));
            }
            Type::Bool
        }
        UnaryOp::Neg => {
            if !operand.ty().is_numeric() {
                return Err(TypeError::new(format!("unary '-' requires a numeric operand, found '{}'", operand.ty()), operand.span()));
            }
            operand.ty()
        }
    };
    Ok(Expr::Unary(UnaryExpr { op: u.op, operand: Box::new(operand), info: ty, span }))
}

fn check_binary(b: BinaryExpr<()>, ctx: &mut Context) -> TypeResult<Expr<Type>> {
    let span = b.span;
    let lhs = check_expr(*b.lhs, ctx, None)?;
    let rhs = check_expr(*b.rhs, ctx, None)?;
    let lt = lhs.ty();
    let rt = rhs.ty();

    let ty = match b.op {
        BinaryOp::Or | BinaryOp::And => {
            if lt != Type::Bool || rt != Type::Bool {
                return Err(TypeError::new(format!("'{:?}' requires 'bool' operands, found '{lt}' and '{rt}'", b.op), span));
            }
            Type::Bool
        }
        BinaryOp::Is | BinaryOp::IsNot => {
            if lt != Type::Bool || rt != Type::Bool {
                return Err(TypeError::new(format!("'is'/'is not' requires 'bool' operands, found '{lt}' and '{rt}'"), span));
            }
            Type::Bool
        }
        BinaryOp::Eq | BinaryOp::NotEq => {
            let compatible = lt == rt
                || lt.assignable_to(&rt, |c| ctx.classes.ancestors(c))
                || rt.assignable_to(&lt, |c| ctx.classes.ancestors(c));
            if !compatible {
                return Err(TypeError::new(format!("cannot compare '{lt}' and '{rt}'"), span));
            }
            Type::Bool
        }
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            if !lt.is_numeric() || !rt.is_numeric() {
                return Err(TypeError::new(format!("relational operators require numeric operands, found '{lt}' and '{rt}'"), span));
            }
            Type::Bool
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => {
            if !lt.is_numeric() || !rt.is_numeric() {
                return Err(TypeError::new(format!("arithmetic requires numeric operands, found '{lt}' and '{rt}'"), span));
            }
            if lt == Type::Float || rt == Type::Float {
                Type::Float
            } else {
                Type::Int
            }
        }
        BinaryOp::Div => {
            if !lt.is_numeric() || !rt.is_numeric() {
                return Err(TypeError::new(format!("'/' requires numeric operands, found '{lt}' and '{rt}'"), span));
            }
            Type::Float
        }
        BinaryOp::FloorDiv | BinaryOp::Mod => {
            if !lt.is_numeric() || !rt.is_numeric() {
                return Err(TypeError::new(format!("'//'/'%' require numeric operands, found '{lt}' and '{rt}'"), span));
            }
            if lt == Type::Float || rt == Type::Float {
                Type::Float
            } else {
                Type::Int
            }
        }
    };

    Ok(Expr::Binary(BinaryExpr { op: b.op, lhs: Box::new(lhs), rhs: Box::new(rhs), info: ty, span }))
}

#[cfg(test)]
mod tests {
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use crate::typechecker::check_program;

    fn check(source: &str) -> Result<(), String> {
        let tokens = Lexer::tokenize(source).expect("source should lex");
        let ast = Parser::parse(tokens).expect("source should parse");
        check_program(ast).map(|_| ()).map_err(|e| e.message)
    }

    #[test]
    fn logical_and_requires_bool_operands() {
        assert!(check("x: bool = 1 and True\n").is_err());
    }

    #[test]
    fn logical_and_over_bools_is_accepted() {
        assert!(check("x: bool = True and False\n").is_ok());
    }

    #[test]
    fn is_requires_bool_operands() {
        assert!(check("x: bool = 1 is 1\n").is_err());
    }

    #[test]
    fn relational_comparison_requires_numeric_operands() {
        assert!(check("x: bool = \"a\" < \"b\"\n").is_err());
    }

    #[test]
    fn equality_between_unrelated_types_is_rejected() {
        assert!(check("x: bool = 1 == \"a\"\n").is_err());
    }

    #[test]
    fn equality_between_a_subclass_instance_and_its_base_is_accepted() {
        let src = "class A:\n    def __init__(self):\n        self.n = 1\nclass B(A):\n    pass\na: A = A()\nb: B = B()\nx: bool = a == b\n";
        assert!(check(src).is_ok());
    }

    #[test]
    fn division_always_yields_a_float() {
        let src = "def f():\n    x: float = 4 / 2\n    return\n";
        assert!(check(src).is_ok());
    }

    #[test]
    fn floor_division_of_two_ints_stays_an_int() {
        let src = "def f():\n    x: int = 5 // 2\n    return\n";
        assert!(check(src).is_ok());
    }

    #[test]
    fn floor_division_involving_a_float_operand_yields_a_float() {
        let src = "def f():\n    x: float = 5.0 // 2\n    return\n";
        assert!(check(src).is_ok());
    }
}
