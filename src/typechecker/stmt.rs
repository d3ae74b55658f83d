use crate::ast::{
    expression::Expr,
    statement::{
        Assert, Assign, AugAssign, AugOp, ClassDef, ExprStmt, For, FuncDef, If, Param, Raise, Return, Stmt, Try,
        VarDecl, While,
    },
    Type,
};

use super::{
    checkable::TypeCheck,
    context::Context,
    error::{TypeError, TypeResult},
    expr::check_expr,
    scope::{BindingKind, Scope},
};

/// Names the type checker accepts in a `raise`/`except` clause without a
/// user class behind them (spec §4.3 `Raise`/`Try`: "a built-in exception
/// name"). PB has no user-visible exception hierarchy beyond this fixed set
/// plus user classes, so membership is a flat list rather than a registry.
const BUILTIN_EXCEPTIONS: [&str; 5] = ["RuntimeError", "ValueError", "IndexError", "ZeroDivisionError", "AttributeError"];

impl TypeCheck for Stmt<()> {
    type Checked = Stmt<Type>;

    fn type_check(self, ctx: &mut Context) -> TypeResult<Self::Checked> {
        match self {
            Stmt::VarDecl(v) => check_var_decl(v, ctx),
            Stmt::Assign(a) => check_assign(a, ctx),
            Stmt::AugAssign(a) => check_aug_assign(a, ctx),
            Stmt::If(s) => check_if(s, ctx),
            Stmt::While(s) => check_while(s, ctx),
            Stmt::For(s) => check_for(s, ctx),
            Stmt::Try(s) => check_try(s, ctx),
            Stmt::Raise(s) => check_raise(s, ctx),
            Stmt::Return(s) => check_return(s, ctx),
            Stmt::Assert(s) => check_assert(s, ctx),
            Stmt::Break(s) => Ok(Stmt::Break(s)),
            Stmt::Continue(s) => Ok(Stmt::Continue(s)),
            Stmt::Pass(s) => Ok(Stmt::Pass(s)),
            Stmt::Global(s) => check_global(s, ctx),
            Stmt::Import(s) => Ok(Stmt::Import(s)),
            Stmt::FuncDef(f) => {
                if ctx.locals.is_some() {
                    return Err(TypeError::new("nested function definitions are not supported", f.span));
                }
                Ok(Stmt::FuncDef(check_func_def(f, ctx, None)?))
            }
            Stmt::ClassDef(c) => {
                if ctx.locals.is_some() {
                    return Err(TypeError::new("nested class definitions are not supported", c.span));
                }
                Ok(Stmt::ClassDef(check_class_def(c, ctx)?))
            }
            Stmt::ExprStmt(e) => check_expr_stmt(e, ctx),
        }
    }
}

pub fn check_block(body: Vec<Stmt<()>>, ctx: &mut Context) -> TypeResult<Vec<Stmt<Type>>> {
    body.into_iter().map(|s| s.type_check(ctx)).collect()
}

fn check_var_decl(v: VarDecl<()>, ctx: &mut Context) -> TypeResult<Stmt<Type>> {
    let init = check_expr(*v.init, ctx, Some(&v.declared_type))?;
    if !init.ty().assignable_to(&v.declared_type, |c| ctx.classes.ancestors(c)) {
        return Err(TypeError::new(
            format!("cannot initialize '{}' of type '{}' with a value of type '{}'", v.name, v.declared_type, init.ty()),
            init.span(),
        ));
    }

    if let Some(existing) = ctx.existing_var_type(&v.name) {
        if existing != v.declared_type {
            return Err(TypeError::new(
                format!("'{}' is already declared with type '{existing}'", v.name),
                v.span,
            ));
        }
    } else {
        ctx.declare_var(v.name.clone(), v.declared_type.clone());
    }

    Ok(Stmt::VarDecl(VarDecl { name: v.name, declared_type: v.declared_type.clone(), init: Box::new(init), info: v.declared_type, span: v.span }))
}

fn check_assign(a: Assign<()>, ctx: &mut Context) -> TypeResult<Stmt<Type>> {
    let Assign { target, value, span } = a;

    match *target {
        Expr::Name(n) => {
            let existing_ty = if ctx.is_global_redirect(&n.id) {
                ctx.module.get(&n.id).cloned()
            } else {
                ctx.existing_var_type(&n.id)
            };
            let Some(existing_ty) = existing_ty else {
                return Err(TypeError::new(format!("assignment to undeclared name '{}'", n.id), n.span));
            };

            let value = check_expr(*value, ctx, Some(&existing_ty))?;
            if !value.ty().assignable_to(&existing_ty, |c| ctx.classes.ancestors(c)) {
                return Err(TypeError::new(
                    format!("cannot assign value of type '{}' to '{}' of type '{existing_ty}'", value.ty(), n.id),
                    value.span(),
                ));
            }

            let target = Expr::Name(crate::ast::expression::NameExpr { id: n.id, info: existing_ty, span: n.span });
            Ok(Stmt::Assign(Assign { target: Box::new(target), value: Box::new(value), span }))
        }
        other @ (Expr::Index(_) | Expr::Attr(_)) => {
            let target = check_expr(other, ctx, None)?;
            let target_ty = target.ty();
            let value = check_expr(*value, ctx, Some(&target_ty))?;
            if !value.ty().assignable_to(&target_ty, |c| ctx.classes.ancestors(c)) {
                return Err(TypeError::new(
                    format!("cannot assign value of type '{}' to a target of type '{target_ty}'", value.ty()),
                    value.span(),
                ));
            }
            Ok(Stmt::Assign(Assign { target: Box::new(target), value: Box::new(value), span }))
        }
        _ => unreachable!("the parser only accepts Name, Index, or Attr as an assignment target"),
    }
}

fn check_aug_assign(a: AugAssign<()>, ctx: &mut Context) -> TypeResult<Stmt<Type>> {
    let AugAssign { op, target, value, span } = a;
    let target = check_expr(*target, ctx, None)?;
    let target_ty = target.ty();
    let value = check_expr(*value, ctx, None)?;
    let value_ty = value.ty();

    if !target_ty.is_numeric() || !value_ty.is_numeric() {
        return Err(TypeError::new(
            format!("'{}' requires numeric operands, found '{target_ty}' and '{value_ty}'", aug_op_symbol(op)),
            span,
        ));
    }
    let result_ty = if target_ty == Type::Float || value_ty == Type::Float { Type::Float } else { Type::Int };
    if !result_ty.assignable_to(&target_ty, |c| ctx.classes.ancestors(c)) {
        return Err(TypeError::new(
            format!("'{}' would change the type of the target from '{target_ty}' to '{result_ty}'", aug_op_symbol(op)),
            span,
        ));
    }

    Ok(Stmt::AugAssign(AugAssign { op, target: Box::new(target), value: Box::new(value), span }))
}

fn aug_op_symbol(op: AugOp) -> &'static str {
    match op {
        AugOp::Add => "+=",
        AugOp::Sub => "-=",
        AugOp::Mul => "*=",
        AugOp::Div => "/=",
        AugOp::FloorDiv => "//=",
        AugOp::Mod => "%=",
    }
}

fn check_if(s: If<()>, ctx: &mut Context) -> TypeResult<Stmt<Type>> {
    let span = s.span;
    let condition = check_bool_condition(*s.condition, ctx, "if")?;
    let then_body = check_block(s.then_body, ctx)?;
    let mut elifs = Vec::with_capacity(s.elifs.len());
    for (cond, body) in s.elifs {
        let cond = check_bool_condition(cond, ctx, "elif")?;
        let body = check_block(body, ctx)?;
        elifs.push((cond, body));
    }
    let else_body = s.else_body.map(|b| check_block(b, ctx)).transpose()?;
    Ok(Stmt::If(If { condition: Box::new(condition), then_body, elifs, else_body, span }))
}

fn check_while(s: While<()>, ctx: &mut Context) -> TypeResult<Stmt<Type>> {
    let span = s.span;
    let condition = check_bool_condition(*s.condition, ctx, "while")?;
    let body = check_block(s.body, ctx)?;
    Ok(Stmt::While(While { condition: Box::new(condition), body, span }))
}

fn check_bool_condition(cond: Expr<()>, ctx: &mut Context, clause: &str) -> TypeResult<Expr<Type>> {
    let checked = check_expr(cond, ctx, None)?;
    if checked.ty() != Type::Bool {
        return Err(TypeError::new(format!("'{clause}' condition must be 'bool', found '{}'", checked.ty()), checked.span()));
    }
    Ok(checked)
}

fn check_for(s: For<()>, ctx: &mut Context) -> TypeResult<Stmt<Type>> {
    let span = s.span;
    let iter = check_for_iter(*s.iter, ctx)?;
    ctx.declare_var(s.var.clone(), Type::Int);
    let body = check_block(s.body, ctx)?;
    Ok(Stmt::For(For { var: s.var, iter: Box::new(iter), body, span }))
}

/// `for` only ever iterates `range(...)` (spec §4.3 `For`: "the only
/// supported iterable is a `range(end)` or `range(start, end)` call");
/// everything else is a type error rather than a parse error, since
/// syntactically any expression is accepted in iterable position.
fn check_for_iter(iter: Expr<()>, ctx: &mut Context) -> TypeResult<Expr<Type>> {
    let span = iter.span();
    let Expr::Call(call) = &iter else {
        return Err(TypeError::new("'for' only supports 'range(...)' as its iterable", span));
    };
    let Expr::Name(n) = call.callee.as_ref() else {
        return Err(TypeError::new("'for' only supports 'range(...)' as its iterable", span));
    };
    if n.id != "range" || ctx.local_binding("range").is_some() || ctx.module.contains("range") {
        return Err(TypeError::new("'for' only supports 'range(...)' as its iterable", span));
    }
    if call.args.is_empty() || call.args.len() > 2 {
        return Err(TypeError::new("'range' expects one or two int arguments", span));
    }

    let Expr::Call(call) = iter else { unreachable!() };
    let mut checked_args = Vec::with_capacity(call.args.len());
    for arg in call.args {
        let checked = check_expr(arg, ctx, None)?;
        if checked.ty() != Type::Int {
            return Err(TypeError::new(format!("'range' arguments must be 'int', found '{}'", checked.ty()), checked.span()));
        }
        checked_args.push(checked);
    }
    let callee = Expr::Name(crate::ast::expression::NameExpr {
        id: "range".to_string(),
        info: Type::Func(vec![Type::Int; checked_args.len()], Box::new(Type::Int)),
        span: call.callee.span(),
    });
    Ok(Expr::Call(crate::ast::expression::CallExpr { callee: Box::new(callee), args: checked_args, info: Type::Int, span }))
}

fn check_try(s: Try<()>, ctx: &mut Context) -> TypeResult<Stmt<Type>> {
    let span = s.span;
    let body = check_block(s.body, ctx)?;
    let mut handlers = Vec::with_capacity(s.handlers.len());
    for h in s.handlers {
        if !BUILTIN_EXCEPTIONS.contains(&h.exc_name.as_str()) && !ctx.classes.contains(&h.exc_name) {
            return Err(TypeError::new(format!("'{}' is not a known exception type", h.exc_name), h.span));
        }
        if let Some(alias) = &h.alias {
            // Bound to the exception's message, not an instance of the
            // exception class (spec §4.3 `Try`: "the alias, if present, is
            // bound with type str").
            ctx.declare_var(alias.clone(), Type::Str);
        }
        let handler_span = h.span;
        let handler_body = check_block(h.body, ctx)?;
        handlers.push(crate::ast::statement::ExceptHandler {
            exc_name: h.exc_name,
            alias: h.alias,
            body: handler_body,
            span: handler_span,
        });
    }
    Ok(Stmt::Try(Try { body, handlers, span }))
}

fn check_raise(s: Raise<()>, ctx: &mut Context) -> TypeResult<Stmt<Type>> {
    let span = s.span;
    let Expr::Call(call) = s.exception.as_ref() else {
        return Err(TypeError::new("'raise' requires a call to a built-in exception or a class", span));
    };
    let Expr::Name(n) = call.callee.as_ref() else {
        return Err(TypeError::new("'raise' requires a call to a built-in exception or a class", span));
    };

    if BUILTIN_EXCEPTIONS.contains(&n.id.as_str()) {
        let Expr::Call(call) = *s.exception else { unreachable!() };
        let name = n.id.clone();
        if call.args.len() > 1 {
            return Err(TypeError::new(format!("'{name}' takes at most one 'str' argument"), span));
        }
        let mut checked_args = Vec::with_capacity(call.args.len());
        for arg in call.args {
            let checked = check_expr(arg, ctx, None)?;
            if checked.ty() != Type::Str {
                return Err(TypeError::new(format!("'{name}' expects a 'str' message, found '{}'", checked.ty()), checked.span()));
            }
            checked_args.push(checked);
        }
        let ret = Type::Class(name.clone());
        let callee = Expr::Name(crate::ast::expression::NameExpr {
            id: name,
            info: Type::Func(vec![Type::Str; checked_args.len()], Box::new(ret.clone())),
            span: call.callee.span(),
        });
        let exception = Expr::Call(crate::ast::expression::CallExpr { callee: Box::new(callee), args: checked_args, info: ret, span });
        return Ok(Stmt::Raise(Raise { exception: Box::new(exception), span }));
    }

    let exception = check_expr(*s.exception, ctx, None)?;
    if !matches!(exception.ty(), Type::Class(_)) {
        return Err(TypeError::new(format!("'raise' requires an exception, found '{}'", exception.ty()), exception.span()));
    }
    Ok(Stmt::Raise(Raise { exception: Box::new(exception), span }))
}

fn check_return(s: Return<()>, ctx: &mut Context) -> TypeResult<Stmt<Type>> {
    let span = s.span;
    let return_type = ctx.return_type.clone().expect("the parser rejects 'return' outside a function");

    match s.value {
        Some(value) => {
            if return_type == Type::NoneType {
                return Err(TypeError::new("function declared to return 'None' must not return a value", span));
            }
            let value = check_expr(*value, ctx, Some(&return_type))?;
            if !value.ty().assignable_to(&return_type, |c| ctx.classes.ancestors(c)) {
                return Err(TypeError::new(
                    format!("returned value of type '{}' is not assignable to '{return_type}'", value.ty()),
                    value.span(),
                ));
            }
            Ok(Stmt::Return(Return { value: Some(Box::new(value)), span }))
        }
        None => {
            if return_type != Type::NoneType {
                return Err(TypeError::new(format!("function declared to return '{return_type}' must return a value"), span));
            }
            Ok(Stmt::Return(Return { value: None, span }))
        }
    }
}

fn check_assert(s: Assert<()>, ctx: &mut Context) -> TypeResult<Stmt<Type>> {
    let span = s.span;
    let condition = check_bool_condition(*s.condition, ctx, "assert")?;
    Ok(Stmt::Assert(Assert { condition: Box::new(condition), span }))
}

fn check_global(s: crate::ast::statement::Global, ctx: &mut Context) -> TypeResult<Stmt<Type>> {
    if ctx.locals.is_none() {
        return Err(TypeError::new("'global' is only meaningful inside a function", s.span));
    }
    for name in &s.names {
        if !ctx.module.contains(name) {
            return Err(TypeError::new(format!("no module-level name '{name}' to declare global"), s.span));
        }
        if let Some(locals) = &mut ctx.locals {
            locals.mark_global(name.clone());
        }
    }
    Ok(Stmt::Global(s))
}

fn check_expr_stmt(e: ExprStmt<()>, ctx: &mut Context) -> TypeResult<Stmt<Type>> {
    let span = e.span;
    let expr = check_expr(*e.expr, ctx, None)?;
    Ok(Stmt::ExprStmt(ExprStmt { expr: Box::new(expr), span }))
}

/// Checks one function or method body, binding `self` (when `self_class` is
/// `Some`) and the remaining parameters in a fresh scope, and checking any
/// default-value expressions in the *enclosing* scope first (spec §4.3
/// Pass B: defaults are ordinary expressions evaluated where the function is
/// defined, not where it's called).
pub fn check_func_def(f: FuncDef<()>, ctx: &mut Context, self_class: Option<&str>) -> TypeResult<FuncDef<Type>> {
    let FuncDef { name, params, return_type, body, span } = f;

    let mut checked_params = Vec::with_capacity(params.len());
    for p in params {
        let default = match p.default {
            Some(expr) => {
                let declared = p.declared_type.clone().expect("a defaulted parameter always carries a declared type");
                let checked = check_expr(expr, ctx, Some(&declared))?;
                if !checked.ty().assignable_to(&declared, |c| ctx.classes.ancestors(c)) {
                    return Err(TypeError::new(
                        format!("default value of type '{}' is not assignable to parameter '{}' of type '{declared}'", checked.ty(), p.name),
                        checked.span(),
                    ));
                }
                Some(checked)
            }
            None => None,
        };
        checked_params.push(Param { name: p.name, declared_type: p.declared_type, default, span: p.span });
    }

    let prev_locals = ctx.locals.take();
    let prev_return = ctx.return_type.replace(return_type.clone());
    let prev_class = ctx.current_class.take();
    if let Some(c) = self_class {
        ctx.current_class = Some(c.to_string());
    }
    ctx.locals = Some(Scope::default());

    for p in &checked_params {
        let ty = if p.name == "self" && p.declared_type.is_none() {
            Type::Class(self_class.expect("only a method's implicit self omits a declared type").to_string())
        } else {
            p.declared_type.clone().expect("the parser requires a type annotation on every non-self parameter")
        };
        ctx.declare_local(p.name.clone(), BindingKind::Parameter, ty);
    }

    let body = check_block(body, ctx);

    ctx.locals = prev_locals;
    ctx.return_type = prev_return;
    ctx.current_class = prev_class;

    Ok(FuncDef { name, params: checked_params, return_type, body: body?, span })
}

fn check_class_def(c: ClassDef<()>, ctx: &mut Context) -> TypeResult<ClassDef<Type>> {
    let ClassDef { name, base, class_attrs, methods, span } = c;
    let mut checked_methods = Vec::with_capacity(methods.len());
    for m in methods {
        checked_methods.push(check_func_def(m, ctx, Some(&name))?);
    }
    Ok(ClassDef { name, base, class_attrs, methods: checked_methods, span })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use crate::typechecker::{check_program, CheckedProgram};

    fn check(source: &str) -> TypeResult<CheckedProgram> {
        let tokens = Lexer::tokenize(source).expect("source should lex");
        let ast = Parser::parse(tokens).expect("source should parse");
        check_program(ast)
    }

    #[test]
    fn bool_is_not_assignable_to_an_arithmetic_operand() {
        let err = check("x: int = True + 1\n").unwrap_err();
        assert!(err.message.contains("bool") || err.message.contains("int"), "{}", err.message);
    }

    #[test]
    fn bool_widens_to_int_on_assignment() {
        check("x: int = True\n").unwrap();
    }

    #[test]
    fn int_does_not_widen_to_bool() {
        check("x: bool = 1\n").unwrap_err();
    }

    #[test]
    fn int_widens_to_float_on_assignment() {
        check("x: float = 1\n").unwrap();
    }

    #[test]
    fn heterogeneous_list_literal_is_rejected() {
        check("x: list[int] = [1, True]\n").unwrap_err();
    }

    #[test]
    fn empty_list_literal_needs_a_target_annotation() {
        let err = check("print([])\n").unwrap_err();
        assert!(err.message.contains("empty list literal"), "{}", err.message);
    }

    #[test]
    fn empty_list_literal_is_accepted_with_an_annotation() {
        check("x: list[int] = []\n").unwrap();
    }

    #[test]
    fn redeclaring_a_variable_with_a_different_type_is_rejected() {
        check("x: int = 1\nx: str = \"a\"\n").unwrap_err();
    }

    #[test]
    fn assigning_a_mismatched_type_to_an_existing_variable_is_rejected() {
        check("x: int = 1\nx = \"a\"\n").unwrap_err();
    }

    #[test]
    fn undefined_base_class_is_rejected() {
        check("class A(B):\n    pass\n").unwrap_err();
    }

    #[test]
    fn cyclic_base_class_is_rejected() {
        check("class A(B):\n    pass\nclass B(A):\n    pass\n").unwrap_err();
    }

    #[test]
    fn subclass_instance_is_assignable_to_a_base_typed_variable() {
        check("class A:\n    def __init__(self):\n        self.n = 1\nclass B(A):\n    pass\nx: A = B()\n").unwrap();
    }

    #[test]
    fn for_loop_iterable_must_be_a_range_call() {
        check("x: list[int] = [1]\nfor i in x:\n    pass\n").unwrap_err();
    }

    #[test]
    fn for_loop_over_range_is_accepted() {
        check("for i in range(10):\n    pass\n").unwrap();
    }

    #[test]
    fn augmented_assignment_that_would_narrow_the_target_type_is_rejected() {
        check("x: int = 4\nx //= 2.0\n").unwrap_err();
    }

    #[test]
    fn except_alias_binds_as_a_string() {
        check(
            "def f():\n    try:\n        pass\n    except ValueError as e:\n        y: str = e\n    return\n",
        )
        .unwrap();
    }

    #[test]
    fn except_on_an_unknown_exception_name_is_rejected() {
        check("try:\n    pass\nexcept NotARealException:\n    pass\n").unwrap_err();
    }

    #[test]
    fn global_statement_outside_a_function_is_rejected() {
        check("global x\n").unwrap_err();
    }

    #[test]
    fn return_with_a_value_from_a_none_returning_function_is_rejected() {
        check("def f():\n    return 1\n").unwrap_err();
    }

    #[test]
    fn duplicate_top_level_function_names_are_rejected() {
        check("def f():\n    pass\ndef f():\n    pass\n").unwrap_err();
    }
}
