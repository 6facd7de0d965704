//! ComposeKit runtime runner.
//!
//! Full cycle: discover -> resolve -> configure -> build provider ->
//! initialize -> wait -> shutdown (reverse order, best-effort).
//!
//! Design notes:
//! - One stable base `ModuleCtx` is built up front; the finalized service
//!   provider is attached to it after the build step and the same context
//!   is reused for initialize and shutdown.
//! - Shutdown can be driven by OS signals, an external `CancellationToken`,
//!   or an arbitrary future.

use std::{future::Future, pin::Pin, sync::Arc};
use tokio_util::sync::CancellationToken;

use crate::context::{ConfigProvider, ModuleCtxBuilder};
use crate::lifecycle::ShutdownReport;
use crate::registry::ModuleRegistry;
use crate::runtime::shutdown;
use crate::services::ServiceRegistry;

/// How the runtime should decide when to stop.
pub enum ShutdownOptions {
    /// Listen for OS signals (Ctrl+C / SIGTERM).
    Signals,
    /// An external `CancellationToken` controls the lifecycle.
    Token(CancellationToken),
    /// An arbitrary future; when it completes, shutdown begins.
    Future(Pin<Box<dyn Future<Output = ()> + Send>>),
}

/// Options for running the composition host.
pub struct RunOptions {
    /// Root module; its transitive dependency closure defines the
    /// application.
    pub root: &'static str,
    /// Provider of the configuration tree and per-module sections.
    pub modules_cfg: Arc<dyn ConfigProvider>,
    /// Active environment name (e.g. "development", "production").
    pub environment: String,
    /// Shutdown strategy.
    pub shutdown: ShutdownOptions,
}

/// Drive the whole composition lifecycle. Returns the shutdown report once
/// every loaded module has been given its teardown attempt.
pub async fn run(opts: RunOptions) -> anyhow::Result<ShutdownReport> {
    let cancel = match &opts.shutdown {
        ShutdownOptions::Token(t) => t.clone(),
        _ => CancellationToken::new(),
    };

    // Spawn the shutdown waiter according to the chosen strategy.
    match opts.shutdown {
        ShutdownOptions::Signals => {
            let c = cancel.clone();
            tokio::spawn(async move {
                match shutdown::wait_for_shutdown().await {
                    Ok(()) => {
                        tracing::info!("shutdown: signal received");
                    }
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            "shutdown: primary waiter failed; falling back to ctrl_c()"
                        );
                        let _ = tokio::signal::ctrl_c().await;
                    }
                }
                c.cancel();
            });
        }
        ShutdownOptions::Future(waiter) => {
            let c = cancel.clone();
            tokio::spawn(async move {
                waiter.await;
                tracing::info!("shutdown: external future completed");
                c.cancel();
            });
        }
        ShutdownOptions::Token(_) => {
            tracing::info!("shutdown: external token will control lifecycle");
        }
    }

    // Resolve the module order upfront; no hook runs if this fails.
    let registry = ModuleRegistry::discover_and_build(opts.root)?;

    let base_ctx = ModuleCtxBuilder::new(cancel.clone())
        .with_config_provider(opts.modules_cfg.clone())
        .with_environment(opts.environment)
        .build();

    tracing::info!("Phase: configure");
    let services = ServiceRegistry::new();
    registry.run_configure_phase(&base_ctx, &services).await?;

    tracing::info!("Phase: build");
    let provider = Arc::new(services.build());
    let ctx = base_ctx.with_provider(provider.clone());

    tracing::info!("Phase: initialize");
    registry.run_init_phase(&ctx).await?;

    let host = registry.host(provider);
    for m in host.modules() {
        tracing::info!(
            module = m.name(),
            priority = m.priority(),
            state = %m.state(),
            "module ready"
        );
    }

    // WAIT
    cancel.cancelled().await;

    tracing::info!("Phase: shutdown");
    let report = registry.run_shutdown_phase(&ctx).await;
    if !report.is_clean() {
        tracing::warn!(
            failed = report.failures.len(),
            "shutdown completed with failures"
        );
    }
    Ok(report)
}
