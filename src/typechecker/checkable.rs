use super::{context::Context, error::TypeResult};

/// Lowers one untyped AST node (`T = ()`) into its checked form (`T =
/// [`crate::ast::Type`]`), the way the teacher's `why_lib::typechecker`
/// lowers `Expression<()>` into a typed expression via a per-node `check`
/// (SPEC_FULL.md §3). There is one tree shape; this trait is the only place
/// the `()` -> `Type` substitution happens.
pub trait TypeCheck {
    type Checked;

    fn type_check(self, ctx: &mut Context) -> TypeResult<Self::Checked>;
}
