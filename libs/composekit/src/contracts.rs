use async_trait::async_trait;

use crate::context::ModuleCtx;
use crate::services::ServiceRegistry;

/// A composable unit of application wiring.
///
/// All hooks default to no-ops; a module implements the ones it needs.
/// Hooks run strictly sequentially in resolved dependency order (reverse
/// order for shutdown) and each one is awaited to completion before the
/// driver moves on.
#[async_trait]
pub trait Module: Send + Sync + 'static {
    /// Configure pass: register services, bind configuration sections,
    /// validate required settings eagerly. This is the only phase with
    /// write access to the service registry.
    async fn configure(&self, _ctx: &ModuleCtx, _services: &ServiceRegistry) -> anyhow::Result<()> {
        Ok(())
    }

    /// Initialize pass: post-construction work against the finalized
    /// service provider. Declared dependencies are already `Initialized`
    /// when this runs.
    async fn initialize(&self, _ctx: &ModuleCtx) -> anyhow::Result<()> {
        Ok(())
    }

    /// Shutdown pass: release resources. Runs in reverse startup order;
    /// a failure here is collected, never fatal to the rest of the pass.
    async fn shutdown(&self, _ctx: &ModuleCtx) -> anyhow::Result<()> {
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any;
}
