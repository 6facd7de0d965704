//! Audit log module.
//!
//! Publishes the shared [`AuditSink`] service during the configure phase;
//! every other module records audit events through it from the initialize
//! pass onward. Registered with a high priority so it configures ahead of
//! independent peers.

use std::sync::Arc;

use composekit::{Module, ModuleCtx, Registrator, RegistryBuilder, ServiceRegistry};

mod config;
pub use config::AuditLogConfig;

pub const MODULE_NAME: &str = "audit_log";

/// Sink for audit events, shared across module boundaries.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &str, detail: &str);
}

/// Default sink: forwards events to the tracing pipeline.
struct TracingSink {
    detailed: bool,
}

impl AuditSink for TracingSink {
    fn record(&self, event: &str, detail: &str) {
        if self.detailed {
            tracing::info!(target: "audit", event, detail, "audit event");
        } else {
            tracing::info!(target: "audit", event, "audit event");
        }
    }
}

/// Sink used when auditing is disabled; events are dropped.
struct NullSink;

impl AuditSink for NullSink {
    fn record(&self, _event: &str, _detail: &str) {}
}

#[derive(Default)]
pub struct AuditLogModule;

#[composekit::async_trait]
impl Module for AuditLogModule {
    async fn configure(&self, ctx: &ModuleCtx, services: &ServiceRegistry) -> anyhow::Result<()> {
        let cfg: AuditLogConfig = ctx.module_config();
        cfg.validate()?;

        let sink: Arc<dyn AuditSink> = if cfg.enabled {
            Arc::new(TracingSink {
                detailed: cfg.level == "detailed",
            })
        } else {
            Arc::new(NullSink)
        };
        services.register::<dyn AuditSink>(sink);
        Ok(())
    }

    async fn initialize(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        let sink = ctx.provider_required()?.get::<dyn AuditSink>()?;
        sink.record("audit.ready", ctx.environment());
        Ok(())
    }

    async fn shutdown(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        if let Some(provider) = ctx.provider() {
            if let Ok(sink) = provider.get::<dyn AuditSink>() {
                sink.record("audit.closing", "");
            }
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

fn register(b: &mut RegistryBuilder) {
    b.register(MODULE_NAME, &[], 10, Arc::new(AuditLogModule));
}

composekit::inventory::submit! { Registrator(register) }
