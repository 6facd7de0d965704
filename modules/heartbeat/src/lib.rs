//! Heartbeat module.
//!
//! Depends on `audit_log` and records an online/offline beat through the
//! shared [`AuditSink`] around the host's lifetime. Mostly here to exercise
//! cross-module service consumption end to end.

use std::sync::Arc;

use audit_log::AuditSink;
use composekit::{Module, ModuleCtx, Registrator, RegistryBuilder, ServiceRegistry};

mod config;
pub use config::HeartbeatConfig;

pub const MODULE_NAME: &str = "heartbeat";

#[derive(Default)]
pub struct HeartbeatModule;

#[composekit::async_trait]
impl Module for HeartbeatModule {
    async fn configure(&self, ctx: &ModuleCtx, _services: &ServiceRegistry) -> anyhow::Result<()> {
        // Eager validation: a bad section stops startup here, before any
        // dependent work happens.
        let cfg: HeartbeatConfig = ctx.module_config();
        cfg.validate()
    }

    async fn initialize(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        let cfg: HeartbeatConfig = ctx.module_config();
        let sink = ctx.provider_required()?.get::<dyn AuditSink>()?;
        sink.record("heartbeat.online", &cfg.message);
        tracing::debug!(environment = ctx.environment(), "heartbeat initialized");
        Ok(())
    }

    async fn shutdown(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        let cfg: HeartbeatConfig = ctx.module_config();
        let sink = ctx.provider_required()?.get::<dyn AuditSink>()?;
        sink.record("heartbeat.offline", &cfg.message);
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

fn register(b: &mut RegistryBuilder) {
    b.register(MODULE_NAME, &["audit_log"], 0, Arc::new(HeartbeatModule));
}

composekit::inventory::submit! { Registrator(register) }

#[cfg(test)]
mod tests {
    use super::*;
    use composekit::{ConfigProvider, ModuleCtxBuilder, ModuleState};
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use tokio_util::sync::CancellationToken;

    struct Sections(HashMap<String, serde_json::Value>);

    impl ConfigProvider for Sections {
        fn module_section(&self, section: &str) -> Option<&serde_json::Value> {
            self.0.get(section)
        }
    }

    /// Captures beats so assertions can see what the module recorded.
    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<(String, String)>>,
    }

    impl AuditSink for RecordingSink {
        fn record(&self, event: &str, detail: &str) {
            self.events.lock().push((event.to_string(), detail.to_string()));
        }
    }

    /// Overwrites the audit sink with the recorder after `audit_log`
    /// configures (higher priority than heartbeat, lower than audit_log's).
    struct RecorderModule {
        sink: Arc<RecordingSink>,
    }

    #[composekit::async_trait]
    impl Module for RecorderModule {
        async fn configure(
            &self,
            _ctx: &ModuleCtx,
            services: &ServiceRegistry,
        ) -> anyhow::Result<()> {
            services.register::<dyn AuditSink>(self.sink.clone() as Arc<dyn AuditSink>);
            Ok(())
        }
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    fn build(
        section: Option<serde_json::Value>,
        sink: &Arc<RecordingSink>,
    ) -> (composekit::ModuleRegistry, composekit::ModuleCtx) {
        let mut b = RegistryBuilder::default();
        b.register("audit_log", &[], 10, Arc::new(audit_log::AuditLogModule));
        b.register(MODULE_NAME, &["audit_log"], 0, Arc::new(HeartbeatModule));
        b.register(
            "recorder",
            &["audit_log"],
            5,
            Arc::new(RecorderModule { sink: sink.clone() }),
        );
        b.register("hb_test_root", &["heartbeat", "recorder"], 0, Arc::new(RootModule));
        let registry = b.build("hb_test_root").unwrap();

        let mut sections = HashMap::new();
        if let Some(v) = section {
            sections.insert(MODULE_NAME.to_string(), v);
        }
        let ctx = ModuleCtxBuilder::new(CancellationToken::new())
            .with_config_provider(Arc::new(Sections(sections)))
            .with_environment("test")
            .build();
        (registry, ctx)
    }

    struct RootModule;

    #[composekit::async_trait]
    impl Module for RootModule {
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    #[tokio::test]
    async fn beats_flow_through_the_shared_sink() {
        let sink = Arc::new(RecordingSink::default());
        let (registry, ctx) = build(
            Some(serde_json::json!({ "message": "pulse" })),
            &sink,
        );

        let services = ServiceRegistry::new();
        registry.run_configure_phase(&ctx, &services).await.unwrap();
        let ctx = ctx.with_provider(Arc::new(services.build()));
        registry.run_init_phase(&ctx).await.unwrap();
        let report = registry.run_shutdown_phase(&ctx).await;
        assert!(report.is_clean());

        let events = sink.events.lock().clone();
        assert!(events.contains(&("heartbeat.online".to_string(), "pulse".to_string())));
        assert!(events.contains(&("heartbeat.offline".to_string(), "pulse".to_string())));
    }

    #[tokio::test]
    async fn empty_message_fails_configure() {
        let sink = Arc::new(RecordingSink::default());
        let (registry, ctx) = build(Some(serde_json::json!({ "message": "  " })), &sink);

        let services = ServiceRegistry::new();
        let err = registry
            .run_configure_phase(&ctx, &services)
            .await
            .unwrap_err();
        assert_eq!(err.module(), MODULE_NAME);

        let failed = registry
            .modules()
            .iter()
            .find(|m| m.name() == MODULE_NAME)
            .unwrap();
        assert_eq!(failed.state(), ModuleState::Failed);
    }
}
