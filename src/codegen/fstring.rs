//! F-string lowering (spec §4.4): an f-string with segments
//! `[text, expr, text, ...]` lowers to one `snprintf` call into a fixed
//! buffer, with each embedded expression replaced by the format specifier
//! its static type picks.
use crate::ast::{expression::FStringSegment, Type};

use super::{expr::lower_expr, Emitter, FnCtx};

const BUF_SIZE: usize = 256;

/// Escapes `text` for use inside the format-string literal itself: both C
/// string escaping and doubling `%` so the literal text can't be mistaken
/// for a conversion specifier.
fn escape_format_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '%' => out.push_str("%%"),
            c => out.push(c),
        }
    }
    out
}

fn specifier_and_arg(ty: &Type, arg: String) -> (&'static str, String) {
    match ty {
        Type::Int => ("%lld", format!("(long long){arg}")),
        Type::Float => ("%s", format!("pb_format_double({arg})")),
        Type::Bool => ("%s", format!("(({arg}) ? \"True\" : \"False\")")),
        Type::Str => ("%s", arg),
        other => panic!("f-string expressions must be int, float, bool, or str, found '{other}'"),
    }
}

/// Lowers one f-string literal, emitting the buffer declaration and the
/// `snprintf` call as pending statements and returning the buffer variable
/// (a `const char*`) as the expression's value.
pub fn lower_fstring(segments: &[FStringSegment<Type>], emitter: &mut Emitter, ctx: &FnCtx) -> String {
    let n = emitter.next_tmp();
    let buf = format!("__fbuf_{n}");

    let mut format = String::new();
    let mut args = Vec::new();
    for seg in segments {
        match seg {
            FStringSegment::Text(t) => format.push_str(&escape_format_text(t)),
            FStringSegment::Expr(e) => {
                let arg_expr = lower_expr(e, emitter, ctx);
                let (spec, arg) = specifier_and_arg(&e.ty(), arg_expr);
                format.push_str(spec);
                args.push(arg);
            }
        }
    }

    let mut call = format!("snprintf({buf}, {BUF_SIZE}, \"{format}\"");
    for a in &args {
        call.push_str(", ");
        call.push_str(a);
    }
    call.push(')');

    emitter.push_pending(format!("char {buf}[{BUF_SIZE}];"));
    emitter.push_pending(format!("{call};"));
    buf
}
