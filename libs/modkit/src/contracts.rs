use crate::context::ModuleCtx;

/// Registration callback of a module.
///
/// Runs once per composition, synchronously, in resolution order, after the route table,
/// the effective configuration and the capability snapshot are built. A failing hook
/// aborts the composition.
pub trait RegistrationHook: Send + Sync + 'static {
    fn register(&self, ctx: &ModuleCtx<'_>) -> anyhow::Result<()>;
}

impl<F> RegistrationHook for F
where
    F: Fn(&ModuleCtx<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
{
    fn register(&self, ctx: &ModuleCtx<'_>) -> anyhow::Result<()> {
        self(ctx)
    }
}
