//! Recursive-descent parser for PB (spec §4.2).
//!
//! Builds an `Ast<()>` directly out of a flat token stream: no separate
//! concrete-syntax tree, no grammar file to keep in sync with the hand-rolled
//! lexer. Expressions are parsed by precedence climbing over a fixed table
//! (low to high: `or`, `and`, equality, relational, additive, multiplicative,
//! unary, postfix); the equality and relational tiers are deliberately
//! non-associative so that `a < b < c` is rejected rather than silently
//! parsed as `(a < b) < c`.
mod cursor;
mod error;

pub use error::{ParseError, ParseResult};

use cursor::TokenCursor;

use crate::ast::{
    expression::{
        AttrExpr, BinaryExpr, BinaryOp, BoolLit, CallExpr, DictLit, Expr, FStringLit, FStringSegment, FloatLit,
        IndexExpr, IntLit, ListLit, NameExpr, StrLit, UnaryExpr, UnaryOp,
    },
    statement::{
        Assert, Assign, AugAssign, AugOp, Break, ClassAttr, ClassDef, Continue, ExceptHandler, ExprStmt, For,
        FuncDef, Global, If, Import, Param, Pass, Raise, Return, Stmt, Try, VarDecl, While,
    },
    Ast, Type,
};
use crate::lexer::{Keyword, Op, Span, Token, TokenKind};

pub struct Parser {
    tokens: TokenCursor,
    last_span: Span,
    loop_depth: usize,
    func_depth: usize,
    in_class_depth: usize,
}

impl Parser {
    pub fn parse(tokens: Vec<Token>) -> ParseResult<Ast<()>> {
        let mut parser = Self {
            tokens: tokens.into(),
            last_span: Span::default(),
            loop_depth: 0,
            func_depth: 0,
            in_class_depth: 0,
        };
        let nodes = parser.parse_stmt_list(|k| matches!(k, TokenKind::Eof))?;
        Ok(Ast::from_nodes(nodes))
    }

    // --- token-stream helpers -------------------------------------------

    fn kind(&self) -> &TokenKind {
        &self.tokens.peek().kind
    }

    fn span(&self) -> Span {
        self.tokens.peek().span
    }

    fn kw(&self) -> Option<Keyword> {
        match self.tokens.peek().kind {
            TokenKind::Keyword(k) => Some(k),
            _ => None,
        }
    }

    fn op(&self) -> Option<Op> {
        match self.tokens.peek().kind {
            TokenKind::Op(o) => Some(o),
            _ => None,
        }
    }

    fn bump(&mut self) -> Token {
        let tok = self.tokens.next();
        self.last_span = tok.span;
        tok
    }

    fn at_op(&self, op: Op) -> bool {
        self.op() == Some(op)
    }

    fn eat_op(&mut self, op: Op) -> bool {
        if self.at_op(op) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect_op(&mut self, op: Op, what: &str) -> ParseResult<Span> {
        if self.at_op(op) {
            Ok(self.bump().span)
        } else {
            Err(self.error_here(format!("expected {what}")))
        }
    }

    fn expect_ident(&mut self, what: &str) -> ParseResult<String> {
        match self.tokens.peek().kind.clone() {
            TokenKind::Ident(name) => {
                self.bump();
                Ok(name)
            }
            _ => Err(self.error_here(format!("expected {what}"))),
        }
    }

    fn expect_indent(&mut self) -> ParseResult<()> {
        if matches!(self.kind(), TokenKind::Indent) {
            self.bump();
            Ok(())
        } else {
            Err(self.error_here("expected an indented block"))
        }
    }

    fn expect_dedent(&mut self) -> ParseResult<()> {
        if matches!(self.kind(), TokenKind::Dedent) {
            self.bump();
            Ok(())
        } else {
            Err(self.error_here("expected a dedent"))
        }
    }

    fn expect_newline(&mut self) -> ParseResult<()> {
        if matches!(self.kind(), TokenKind::Newline) {
            self.bump();
            Ok(())
        } else {
            Err(self.error_here("expected end of line"))
        }
    }

    fn error_here(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.span())
    }

    // --- statement lists / suites ----------------------------------------

    fn parse_stmt_list(&mut self, is_end: impl Fn(&TokenKind) -> bool) -> ParseResult<Vec<Stmt<()>>> {
        let mut out = Vec::new();
        while !is_end(self.kind()) {
            if matches!(self.kind(), TokenKind::Newline) {
                self.bump();
                continue;
            }
            out.extend(self.parse_stmt_line()?);
        }
        Ok(out)
    }

    fn is_compound_start(&self) -> bool {
        matches!(
            self.kw(),
            Some(Keyword::If | Keyword::While | Keyword::For | Keyword::Try | Keyword::Def | Keyword::Class)
        )
    }

    fn parse_stmt_line(&mut self) -> ParseResult<Vec<Stmt<()>>> {
        if self.is_compound_start() {
            return Ok(vec![self.parse_compound_stmt()?]);
        }
        let mut out = vec![self.parse_simple_stmt()?];
        while self.eat_op(Op::Semi) {
            if matches!(self.kind(), TokenKind::Newline | TokenKind::Eof) {
                break;
            }
            out.push(self.parse_simple_stmt()?);
        }
        self.expect_newline()?;
        Ok(out)
    }

    fn parse_compound_stmt(&mut self) -> ParseResult<Stmt<()>> {
        match self.kw() {
            Some(Keyword::If) => self.parse_if(),
            Some(Keyword::While) => self.parse_while(),
            Some(Keyword::For) => self.parse_for(),
            Some(Keyword::Try) => self.parse_try(),
            Some(Keyword::Def) => self.parse_func_def(),
            Some(Keyword::Class) => self.parse_class_def(),
            _ => unreachable!("is_compound_start guards this dispatch"),
        }
    }

    /// Parses the body of an `if`/`while`/`for`/`try`/`except`/`def` clause:
    /// either a `NEWLINE INDENT ... DEDENT` block, or one or more
    /// semicolon-separated simple statements on the same line. Both forms
    /// require at least one statement.
    fn parse_suite(&mut self) -> ParseResult<Vec<Stmt<()>>> {
        if matches!(self.kind(), TokenKind::Newline) {
            self.bump();
            self.expect_indent()?;
            let stmts = self.parse_stmt_list(|k| matches!(k, TokenKind::Dedent))?;
            self.expect_dedent()?;
            if stmts.is_empty() {
                return Err(self.error_here("a block body must contain at least one statement"));
            }
            Ok(stmts)
        } else {
            let mut out = vec![self.parse_simple_stmt()?];
            while self.eat_op(Op::Semi) {
                if matches!(self.kind(), TokenKind::Newline) {
                    break;
                }
                out.push(self.parse_simple_stmt()?);
            }
            self.expect_newline()?;
            Ok(out)
        }
    }

    fn parse_simple_stmt(&mut self) -> ParseResult<Stmt<()>> {
        match self.kw() {
            Some(Keyword::Return) => self.parse_return(),
            Some(Keyword::Assert) => self.parse_assert(),
            Some(Keyword::Break) => self.parse_break(),
            Some(Keyword::Continue) => self.parse_continue(),
            Some(Keyword::Pass) => self.parse_pass(),
            Some(Keyword::Raise) => self.parse_raise(),
            Some(Keyword::Global) => self.parse_global(),
            Some(Keyword::Import) => self.parse_import(),
            _ => self.parse_decl_or_assign_or_expr(),
        }
    }

    // --- simple statements -------------------------------------------------

    fn parse_return(&mut self) -> ParseResult<Stmt<()>> {
        let start = self.span();
        self.bump();
        if self.func_depth == 0 {
            return Err(ParseError::new("'return' outside of a function", start));
        }
        let value = if matches!(self.kind(), TokenKind::Newline | TokenKind::Eof) || self.at_op(Op::Semi) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        let end = value.as_ref().map(|v| v.span()).unwrap_or(start);
        Ok(Stmt::Return(Return { value, span: start.to(end) }))
    }

    fn parse_assert(&mut self) -> ParseResult<Stmt<()>> {
        let start = self.span();
        self.bump();
        let condition = Box::new(self.parse_expression()?);
        let end = condition.span();
        Ok(Stmt::Assert(Assert { condition, span: start.to(end) }))
    }

    fn parse_break(&mut self) -> ParseResult<Stmt<()>> {
        let span = self.span();
        self.bump();
        if self.loop_depth == 0 {
            return Err(ParseError::new("'break' outside of a loop", span));
        }
        Ok(Stmt::Break(Break { span }))
    }

    fn parse_continue(&mut self) -> ParseResult<Stmt<()>> {
        let span = self.span();
        self.bump();
        if self.loop_depth == 0 {
            return Err(ParseError::new("'continue' outside of a loop", span));
        }
        Ok(Stmt::Continue(Continue { span }))
    }

    fn parse_pass(&mut self) -> ParseResult<Stmt<()>> {
        let span = self.span();
        self.bump();
        Ok(Stmt::Pass(Pass { span }))
    }

    fn parse_raise(&mut self) -> ParseResult<Stmt<()>> {
        let start = self.span();
        self.bump();
        let exception = Box::new(self.parse_expression()?);
        let end = exception.span();
        Ok(Stmt::Raise(Raise { exception, span: start.to(end) }))
    }

    fn parse_global(&mut self) -> ParseResult<Stmt<()>> {
        let start = self.span();
        self.bump();
        let mut names = vec![self.expect_ident("a name")?];
        while self.eat_op(Op::Comma) {
            names.push(self.expect_ident("a name")?);
        }
        let end = self.last_span;
        Ok(Stmt::Global(Global { names, span: start.to(end) }))
    }

    fn parse_import(&mut self) -> ParseResult<Stmt<()>> {
        let start = self.span();
        self.bump();
        let mut path = self.expect_ident("a module name")?;
        while self.at_op(Op::Dot) {
            self.bump();
            path.push('.');
            path.push_str(&self.expect_ident("a module name segment")?);
        }
        let alias = if self.kw() == Some(Keyword::As) {
            self.bump();
            Some(self.expect_ident("an alias")?)
        } else {
            None
        };
        let end = self.last_span;
        Ok(Stmt::Import(Import { path, alias, span: start.to(end) }))
    }

    /// Disambiguates `name: Type = expr` (declaration), `target = expr`
    /// (assignment), `target OP= expr` (augmented assignment) and a bare
    /// expression statement by parsing one expression first and then
    /// inspecting what follows it.
    fn parse_decl_or_assign_or_expr(&mut self) -> ParseResult<Stmt<()>> {
        let start = self.span();
        let expr = self.parse_expression()?;

        if self.at_op(Op::Colon) {
            let name = match &expr {
                Expr::Name(n) => n.id.clone(),
                _ => return Err(ParseError::new("only a plain name may carry a type annotation", expr.span())),
            };
            self.bump();
            let declared_type = self.parse_type_annotation()?;
            self.expect_op(Op::Eq, "'=' (a declaration requires an initializer)")?;
            let init = Box::new(self.parse_expression()?);
            let end = init.span();
            return Ok(Stmt::VarDecl(VarDecl { name, declared_type, init, info: (), span: start.to(end) }));
        }

        if let Some(op) = self.op() {
            if op == Op::Eq {
                self.check_assignment_target(&expr)?;
                self.bump();
                let value = Box::new(self.parse_expression()?);
                let end = value.span();
                return Ok(Stmt::Assign(Assign { target: Box::new(expr), value, span: start.to(end) }));
            }
            if let Some(aug) = Self::aug_op_for(op) {
                self.check_assignment_target(&expr)?;
                self.bump();
                let value = Box::new(self.parse_expression()?);
                let end = value.span();
                return Ok(Stmt::AugAssign(AugAssign { op: aug, target: Box::new(expr), value, span: start.to(end) }));
            }
        }

        let end = expr.span();
        Ok(Stmt::ExprStmt(ExprStmt { expr: Box::new(expr), span: start.to(end) }))
    }

    fn aug_op_for(op: Op) -> Option<AugOp> {
        Some(match op {
            Op::PlusEq => AugOp::Add,
            Op::MinusEq => AugOp::Sub,
            Op::StarEq => AugOp::Mul,
            Op::SlashEq => AugOp::Div,
            Op::SlashSlashEq => AugOp::FloorDiv,
            Op::PercentEq => AugOp::Mod,
            _ => return None,
        })
    }

    fn check_assignment_target(&self, expr: &Expr<()>) -> ParseResult<()> {
        match expr {
            Expr::Name(_) | Expr::Index(_) | Expr::Attr(_) => Ok(()),
            _ => Err(ParseError::new("invalid assignment target", expr.span())),
        }
    }

    // --- compound statements ----------------------------------------------

    fn parse_if(&mut self) -> ParseResult<Stmt<()>> {
        let start = self.span();
        self.bump();
        let condition = Box::new(self.parse_expression()?);
        self.expect_op(Op::Colon, "':'")?;
        let then_body = self.parse_suite()?;

        let mut elifs = Vec::new();
        while self.kw() == Some(Keyword::Elif) {
            self.bump();
            let cond = self.parse_expression()?;
            self.expect_op(Op::Colon, "':'")?;
            let body = self.parse_suite()?;
            elifs.push((cond, body));
        }

        let else_body = if self.kw() == Some(Keyword::Else) {
            self.bump();
            self.expect_op(Op::Colon, "':'")?;
            Some(self.parse_suite()?)
        } else {
            None
        };

        let end = self.last_span;
        Ok(Stmt::If(If { condition, then_body, elifs, else_body, span: start.to(end) }))
    }

    fn parse_while(&mut self) -> ParseResult<Stmt<()>> {
        let start = self.span();
        self.bump();
        let condition = Box::new(self.parse_expression()?);
        self.expect_op(Op::Colon, "':'")?;
        self.loop_depth += 1;
        let body = self.parse_suite();
        self.loop_depth -= 1;
        let body = body?;
        let end = self.last_span;
        Ok(Stmt::While(While { condition, body, span: start.to(end) }))
    }

    fn parse_for(&mut self) -> ParseResult<Stmt<()>> {
        let start = self.span();
        self.bump();
        let var = self.expect_ident("a loop variable name")?;
        if self.kw() != Some(Keyword::In) {
            return Err(self.error_here("expected 'in'"));
        }
        self.bump();
        let iter = Box::new(self.parse_expression()?);
        self.expect_op(Op::Colon, "':'")?;
        self.loop_depth += 1;
        let body = self.parse_suite();
        self.loop_depth -= 1;
        let body = body?;
        let end = self.last_span;
        Ok(Stmt::For(For { var, iter, body, span: start.to(end) }))
    }

    fn parse_try(&mut self) -> ParseResult<Stmt<()>> {
        let start = self.span();
        self.bump();
        self.expect_op(Op::Colon, "':'")?;
        let body = self.parse_suite()?;

        let mut handlers = Vec::new();
        while self.kw() == Some(Keyword::Except) {
            let h_start = self.span();
            self.bump();
            let exc_name = self.expect_ident("an exception class name")?;
            let alias = if self.kw() == Some(Keyword::As) {
                self.bump();
                Some(self.expect_ident("an alias")?)
            } else {
                None
            };
            self.expect_op(Op::Colon, "':'")?;
            let h_body = self.parse_suite()?;
            let h_end = self.last_span;
            handlers.push(ExceptHandler { exc_name, alias, body: h_body, span: h_start.to(h_end) });
        }

        if handlers.is_empty() {
            return Err(self.error_here("'try' requires at least one 'except' clause"));
        }

        let end = self.last_span;
        Ok(Stmt::Try(Try { body, handlers, span: start.to(end) }))
    }

    fn parse_params(&mut self) -> ParseResult<Vec<Param<()>>> {
        self.expect_op(Op::LParen, "'('")?;
        let mut params = Vec::new();
        let mut seen_default = false;
        let mut names = std::collections::HashSet::new();

        if !self.at_op(Op::RParen) {
            loop {
                let p_start = self.span();
                let name = self.expect_ident("a parameter name")?;
                if !names.insert(name.clone()) {
                    return Err(ParseError::new(format!("duplicate parameter name '{name}'"), p_start));
                }

                let declared_type = if self.eat_op(Op::Colon) {
                    Some(self.parse_type_annotation()?)
                } else if name == "self" && params.is_empty() && self.in_class_depth > 0 {
                    None
                } else {
                    return Err(ParseError::new(format!("parameter '{name}' requires a type annotation"), p_start));
                };

                let default = if self.eat_op(Op::Eq) {
                    seen_default = true;
                    Some(self.parse_expression()?)
                } else {
                    if seen_default {
                        return Err(ParseError::new(
                            format!("parameter '{name}' without a default follows a parameter with one"),
                            p_start,
                        ));
                    }
                    None
                };

                let end = self.last_span;
                params.push(Param { name, declared_type, default, span: p_start.to(end) });

                if self.eat_op(Op::Comma) {
                    if self.at_op(Op::RParen) {
                        break;
                    }
                    continue;
                }
                break;
            }
        }
        self.expect_op(Op::RParen, "')'")?;
        Ok(params)
    }

    fn parse_func_def(&mut self) -> ParseResult<Stmt<()>> {
        let start = self.span();
        self.bump();
        let name = self.expect_ident("a function name")?;
        let params = self.parse_params()?;
        let return_type = if self.eat_op(Op::Arrow) { self.parse_type_annotation()? } else { Type::NoneType };
        self.expect_op(Op::Colon, "':'")?;

        self.func_depth += 1;
        let prev_loop_depth = std::mem::replace(&mut self.loop_depth, 0);
        let body = self.parse_suite();
        self.loop_depth = prev_loop_depth;
        self.func_depth -= 1;
        let body = body?;

        let end = self.last_span;
        Ok(Stmt::FuncDef(FuncDef { name, params, return_type, body, span: start.to(end) }))
    }

    fn parse_class_def(&mut self) -> ParseResult<Stmt<()>> {
        let start = self.span();
        self.bump();
        let name = self.expect_ident("a class name")?;
        let base = if self.eat_op(Op::LParen) {
            let base_name = self.expect_ident("a base class name")?;
            self.expect_op(Op::RParen, "')'")?;
            Some(base_name)
        } else {
            None
        };
        self.expect_op(Op::Colon, "':'")?;

        self.in_class_depth += 1;
        let body = self.parse_class_body();
        self.in_class_depth -= 1;
        let (class_attrs, methods) = body?;

        let end = self.last_span;
        Ok(Stmt::ClassDef(ClassDef { name, base, class_attrs, methods, span: start.to(end) }))
    }

    fn parse_class_body(&mut self) -> ParseResult<(Vec<ClassAttr>, Vec<FuncDef<()>>)> {
        let mut class_attrs = Vec::new();
        let mut methods = Vec::new();

        if matches!(self.kind(), TokenKind::Newline) {
            self.bump();
            self.expect_indent()?;
            let mut any = false;
            while !matches!(self.kind(), TokenKind::Dedent) {
                if matches!(self.kind(), TokenKind::Newline) {
                    self.bump();
                    continue;
                }
                any = true;
                self.parse_class_member(&mut class_attrs, &mut methods)?;
            }
            self.expect_dedent()?;
            if !any {
                return Err(self.error_here("a class body must contain at least one statement"));
            }
        } else {
            self.parse_class_member(&mut class_attrs, &mut methods)?;
            while self.eat_op(Op::Semi) {
                if matches!(self.kind(), TokenKind::Newline) {
                    break;
                }
                self.parse_class_member(&mut class_attrs, &mut methods)?;
            }
            self.expect_newline()?;
        }

        Ok((class_attrs, methods))
    }

    fn parse_class_member(&mut self, class_attrs: &mut Vec<ClassAttr>, methods: &mut Vec<FuncDef<()>>) -> ParseResult<()> {
        if self.kw() == Some(Keyword::Def) {
            match self.parse_func_def()? {
                Stmt::FuncDef(f) => methods.push(f),
                _ => unreachable!(),
            }
            return Ok(());
        }

        let start = self.span();
        let name = self.expect_ident("a class attribute name or method definition")?;
        self.expect_op(Op::Colon, "':' (class attributes require a type annotation)")?;
        let declared_type = self.parse_type_annotation()?;
        let end = self.last_span;
        class_attrs.push(ClassAttr { name, declared_type, span: start.to(end) });
        Ok(())
    }

    // --- type annotations ---------------------------------------------------

    fn parse_type_annotation(&mut self) -> ParseResult<Type> {
        if self.kw() == Some(Keyword::None) {
            self.bump();
            return Ok(Type::NoneType);
        }

        let name = match self.tokens.peek().kind.clone() {
            TokenKind::Ident(name) => name,
            _ => return Err(self.error_here("expected a type annotation")),
        };

        match name.as_str() {
            "int" => {
                self.bump();
                Ok(Type::Int)
            }
            "float" => {
                self.bump();
                Ok(Type::Float)
            }
            "bool" => {
                self.bump();
                Ok(Type::Bool)
            }
            "str" => {
                self.bump();
                Ok(Type::Str)
            }
            "list" => {
                self.bump();
                self.expect_op(Op::LBracket, "'['")?;
                let elem = self.parse_type_annotation()?;
                self.expect_op(Op::RBracket, "']'")?;
                Ok(Type::list_of(elem))
            }
            "dict" => {
                self.bump();
                self.expect_op(Op::LBracket, "'['")?;
                let key_span = self.span();
                match self.tokens.peek().kind.clone() {
                    TokenKind::Ident(k) if k == "str" => {
                        self.bump();
                    }
                    _ => return Err(ParseError::new("a dict key type must be 'str'", key_span)),
                }
                self.expect_op(Op::Comma, "','")?;
                let value = self.parse_type_annotation()?;
                self.expect_op(Op::RBracket, "']'")?;
                Ok(Type::dict_of(value))
            }
            _ => {
                self.bump();
                Ok(Type::Class(name))
            }
        }
    }

    // --- expressions: precedence climbing ----------------------------------

    fn parse_expression(&mut self) -> ParseResult<Expr<()>> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> ParseResult<Expr<()>> {
        let start = self.span();
        let mut left = self.parse_and()?;
        while self.kw() == Some(Keyword::Or) {
            self.bump();
            let right = self.parse_and()?;
            let end = right.span();
            left = Expr::Binary(BinaryExpr {
                op: BinaryOp::Or,
                lhs: Box::new(left),
                rhs: Box::new(right),
                info: (),
                span: start.to(end),
            });
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<Expr<()>> {
        let start = self.span();
        let mut left = self.parse_equality()?;
        while self.kw() == Some(Keyword::And) {
            self.bump();
            let right = self.parse_equality()?;
            let end = right.span();
            left = Expr::Binary(BinaryExpr {
                op: BinaryOp::And,
                lhs: Box::new(left),
                rhs: Box::new(right),
                info: (),
                span: start.to(end),
            });
        }
        Ok(left)
    }

    /// Non-associative: `a == b == c` is rejected rather than parsed as
    /// `(a == b) == c` (spec §4.2).
    fn parse_equality(&mut self) -> ParseResult<Expr<()>> {
        let start = self.span();
        let left = self.parse_relational()?;

        let bop = if self.at_op(Op::EqEq) {
            self.bump();
            Some(BinaryOp::Eq)
        } else if self.at_op(Op::NotEq) {
            self.bump();
            Some(BinaryOp::NotEq)
        } else if self.kw() == Some(Keyword::Is) {
            self.bump();
            if self.kw() == Some(Keyword::Not) {
                self.bump();
                Some(BinaryOp::IsNot)
            } else {
                Some(BinaryOp::Is)
            }
        } else {
            None
        };

        let Some(bop) = bop else {
            return Ok(left);
        };

        let right = self.parse_relational()?;
        let end = right.span();
        let combined =
            Expr::Binary(BinaryExpr { op: bop, lhs: Box::new(left), rhs: Box::new(right), info: (), span: start.to(end) });

        let chained = self.at_op(Op::EqEq) || self.at_op(Op::NotEq) || self.kw() == Some(Keyword::Is);
        if chained {
            return Err(self.error_here("comparisons cannot be chained"));
        }
        Ok(combined)
    }

    /// Non-associative, for the same reason as `parse_equality`.
    fn parse_relational(&mut self) -> ParseResult<Expr<()>> {
        let start = self.span();
        let left = self.parse_additive()?;

        let bop = match self.op() {
            Some(Op::Lt) => BinaryOp::Lt,
            Some(Op::LtEq) => BinaryOp::LtEq,
            Some(Op::Gt) => BinaryOp::Gt,
            Some(Op::GtEq) => BinaryOp::GtEq,
            _ => return Ok(left),
        };
        self.bump();
        let right = self.parse_additive()?;
        let end = right.span();
        let combined =
            Expr::Binary(BinaryExpr { op: bop, lhs: Box::new(left), rhs: Box::new(right), info: (), span: start.to(end) });

        if matches!(self.op(), Some(Op::Lt | Op::LtEq | Op::Gt | Op::GtEq)) {
            return Err(self.error_here("comparisons cannot be chained"));
        }
        Ok(combined)
    }

    fn parse_additive(&mut self) -> ParseResult<Expr<()>> {
        let start = self.span();
        let mut left = self.parse_multiplicative()?;
        loop {
            let bop = match self.op() {
                Some(Op::Plus) => BinaryOp::Add,
                Some(Op::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.bump();
            let right = self.parse_multiplicative()?;
            let end = right.span();
            left = Expr::Binary(BinaryExpr { op: bop, lhs: Box::new(left), rhs: Box::new(right), info: (), span: start.to(end) });
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr<()>> {
        let start = self.span();
        let mut left = self.parse_unary()?;
        loop {
            let bop = match self.op() {
                Some(Op::Star) => BinaryOp::Mul,
                Some(Op::Slash) => BinaryOp::Div,
                Some(Op::SlashSlash) => BinaryOp::FloorDiv,
                Some(Op::Percent) => BinaryOp::Mod,
                _ => break,
            };
            self.bump();
            let right = self.parse_unary()?;
            let end = right.span();
            left = Expr::Binary(BinaryExpr { op: bop, lhs: Box::new(left), rhs: Box::new(right), info: (), span: start.to(end) });
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr<()>> {
        let start = self.span();
        if self.kw() == Some(Keyword::Not) {
            self.bump();
            let operand = self.parse_unary()?;
            let end = operand.span();
            return Ok(Expr::Unary(UnaryExpr { op: UnaryOp::Not, operand: Box::new(operand), info: (), span: start.to(end) }));
        }
        if self.at_op(Op::Minus) {
            self.bump();
            let operand = self.parse_unary()?;
            let end = operand.span();
            return Ok(Expr::Unary(UnaryExpr { op: UnaryOp::Neg, operand: Box::new(operand), info: (), span: start.to(end) }));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr<()>> {
        let start = self.span();
        let mut expr = self.parse_primary()?;
        loop {
            match self.op() {
                Some(Op::Dot) => {
                    self.bump();
                    let name = self.expect_ident("an attribute name")?;
                    let end = self.last_span;
                    expr = Expr::Attr(AttrExpr { base: Box::new(expr), name, info: (), span: start.to(end) });
                }
                Some(Op::LBracket) => {
                    self.bump();
                    let index = self.parse_expression()?;
                    let end = self.expect_op(Op::RBracket, "']'")?;
                    expr = Expr::Index(IndexExpr { base: Box::new(expr), index: Box::new(index), info: (), span: start.to(end) });
                }
                Some(Op::LParen) => {
                    self.bump();
                    let mut args = Vec::new();
                    if !self.at_op(Op::RParen) {
                        loop {
                            args.push(self.parse_expression()?);
                            if self.eat_op(Op::Comma) {
                                if self.at_op(Op::RParen) {
                                    break;
                                }
                                continue;
                            }
                            break;
                        }
                    }
                    let end = self.expect_op(Op::RParen, "')'")?;
                    expr = Expr::Call(CallExpr { callee: Box::new(expr), args, info: (), span: start.to(end) });
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr<()>> {
        let span = self.span();
        match self.tokens.peek().kind.clone() {
            TokenKind::Int(value) => {
                self.bump();
                Ok(Expr::Int(IntLit { value, info: (), span }))
            }
            TokenKind::Float(value) => {
                self.bump();
                Ok(Expr::Float(FloatLit { value, info: (), span }))
            }
            TokenKind::Str(value) => {
                self.bump();
                Ok(Expr::Str(StrLit { value, info: (), span }))
            }
            TokenKind::FStringStart => self.parse_fstring(),
            TokenKind::Keyword(Keyword::True) => {
                self.bump();
                Ok(Expr::Bool(BoolLit { value: true, info: (), span }))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.bump();
                Ok(Expr::Bool(BoolLit { value: false, info: (), span }))
            }
            TokenKind::Ident(name) => {
                self.bump();
                Ok(Expr::Name(NameExpr { id: name, info: (), span }))
            }
            TokenKind::Op(Op::LParen) => {
                self.bump();
                let inner = self.parse_expression()?;
                self.expect_op(Op::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::Op(Op::LBracket) => self.parse_list_lit(span),
            TokenKind::Op(Op::LBrace) => self.parse_dict_lit(span),
            _ => Err(self.error_here("expected an expression")),
        }
    }

    fn parse_list_lit(&mut self, span: Span) -> ParseResult<Expr<()>> {
        self.bump();
        let mut elements = Vec::new();
        if !self.at_op(Op::RBracket) {
            loop {
                elements.push(self.parse_expression()?);
                if self.eat_op(Op::Comma) {
                    if self.at_op(Op::RBracket) {
                        break;
                    }
                    continue;
                }
                break;
            }
        }
        let end = self.expect_op(Op::RBracket, "']'")?;
        Ok(Expr::List(ListLit { elements, info: (), span: span.to(end) }))
    }

    fn parse_dict_lit(&mut self, span: Span) -> ParseResult<Expr<()>> {
        self.bump();
        let mut pairs = Vec::new();
        if !self.at_op(Op::RBrace) {
            loop {
                let key = self.parse_expression()?;
                self.expect_op(Op::Colon, "':'")?;
                let value = self.parse_expression()?;
                pairs.push((key, value));
                if self.eat_op(Op::Comma) {
                    if self.at_op(Op::RBrace) {
                        break;
                    }
                    continue;
                }
                break;
            }
        }
        let end = self.expect_op(Op::RBrace, "'}'")?;
        Ok(Expr::Dict(DictLit { pairs, info: (), span: span.to(end) }))
    }

    fn parse_fstring(&mut self) -> ParseResult<Expr<()>> {
        let start = self.span();
        self.bump();
        let mut segments = Vec::new();
        loop {
            match self.tokens.peek().kind.clone() {
                TokenKind::FStringMiddle(text) => {
                    self.bump();
                    segments.push(FStringSegment::Text(text));
                }
                TokenKind::FStringExprStart => {
                    self.bump();
                    let expr = self.parse_expression()?;
                    if matches!(self.kind(), TokenKind::FStringExprEnd) {
                        self.bump();
                    } else {
                        return Err(self.error_here("expected end of f-string expression '}'"));
                    }
                    segments.push(FStringSegment::Expr(expr));
                }
                TokenKind::FStringEnd => {
                    let end = self.span();
                    self.bump();
                    return Ok(Expr::FStr(FStringLit { segments, info: (), span: start.to(end) }));
                }
                _ => return Err(self.error_here("malformed f-string")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(source: &str) -> ParseResult<Ast<()>> {
        Parser::parse(Lexer::tokenize(source).unwrap())
    }

    #[test]
    fn binary_expression_records_first_token_span() {
        let ast = parse("x: int = 1 + 2\n").unwrap();
        let Stmt::VarDecl(v) = &ast.nodes()[0] else { panic!("expected a VarDecl") };
        assert_eq!(v.init.span().line, 1);
        assert_eq!(v.init.span().col, 10);
    }

    #[test]
    fn postfix_chain_attaches_left_to_right() {
        let ast = parse("obj.method()[i](x)\n").unwrap();
        let Stmt::ExprStmt(s) = &ast.nodes()[0] else { panic!("expected an ExprStmt") };
        match s.expr.as_ref() {
            Expr::Call(outer) => match outer.callee.as_ref() {
                Expr::Index(idx) => match idx.base.as_ref() {
                    Expr::Call(inner) => match inner.callee.as_ref() {
                        Expr::Attr(a) => assert_eq!(a.name, "method"),
                        _ => panic!("expected Attr as the innermost callee"),
                    },
                    _ => panic!("expected the index base to be a Call"),
                },
                _ => panic!("expected the outer callee to be an Index"),
            },
            _ => panic!("expected the outermost expression to be a Call"),
        }
    }

    #[test]
    fn chained_comparisons_are_rejected() {
        assert!(parse("x: bool = a < b < c\n").is_err());
        assert!(parse("x: bool = a == b == c\n").is_err());
    }

    #[test]
    fn bare_break_outside_a_loop_is_rejected() {
        assert!(parse("break\n").is_err());
    }

    #[test]
    fn break_inside_a_while_loop_is_accepted() {
        assert!(parse("while True:\n    break\n").is_ok());
    }

    #[test]
    fn return_outside_a_function_is_rejected() {
        assert!(parse("return 1\n").is_err());
    }

    #[test]
    fn empty_function_body_is_rejected() {
        assert!(parse("def f():\n    \n").is_err());
    }

    #[test]
    fn empty_class_body_is_rejected() {
        assert!(parse("class C:\n    \n").is_err());
    }

    #[test]
    fn class_with_a_lone_pass_is_accepted() {
        assert!(parse("class C:\n    pass\n").is_ok());
    }

    #[test]
    fn duplicate_parameter_names_are_rejected() {
        assert!(parse("def f(a: int, a: int):\n    pass\n").is_err());
    }

    #[test]
    fn default_before_non_default_parameter_is_rejected() {
        assert!(parse("def f(a: int = 1, b: int):\n    pass\n").is_err());
    }

    #[test]
    fn assigning_to_a_keyword_literal_is_rejected() {
        assert!(parse("True = 1\n").is_err());
        assert!(parse("None = 1\n").is_err());
    }

    #[test]
    fn list_and_dict_type_annotations_nest() {
        let ast = parse("x: list[dict[str, int]] = []\n").unwrap();
        let Stmt::VarDecl(v) = &ast.nodes()[0] else { panic!("expected a VarDecl") };
        assert_eq!(v.declared_type, Type::list_of(Type::dict_of(Type::Int)));
    }
}
