//! Phase-driver scenarios: hook ordering across phases, reverse shutdown,
//! fail-fast startup, best-effort teardown, and service/provider flow.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use composekit::{
    LifecycleError, Module, ModuleCtx, ModuleCtxBuilder, ModuleRegistry, ModuleState,
    RegistryBuilder, ServiceRegistry,
};

type CallTracker = Arc<Mutex<Vec<String>>>;

struct TestModule {
    name: &'static str,
    calls: CallTracker,
    fail_configure: AtomicBool,
    fail_initialize: AtomicBool,
    fail_shutdown: AtomicBool,
}

impl TestModule {
    fn new(name: &'static str, calls: &CallTracker) -> Arc<Self> {
        Arc::new(Self {
            name,
            calls: calls.clone(),
            fail_configure: AtomicBool::new(false),
            fail_initialize: AtomicBool::new(false),
            fail_shutdown: AtomicBool::new(false),
        })
    }

    fn failing_configure(name: &'static str, calls: &CallTracker) -> Arc<Self> {
        let m = Self::new(name, calls);
        m.fail_configure.store(true, Ordering::SeqCst);
        m
    }

    fn failing_initialize(name: &'static str, calls: &CallTracker) -> Arc<Self> {
        let m = Self::new(name, calls);
        m.fail_initialize.store(true, Ordering::SeqCst);
        m
    }

    fn failing_shutdown(name: &'static str, calls: &CallTracker) -> Arc<Self> {
        let m = Self::new(name, calls);
        m.fail_shutdown.store(true, Ordering::SeqCst);
        m
    }

    fn record(&self, phase: &str) {
        self.calls.lock().unwrap().push(format!("{phase}:{}", self.name));
    }
}

#[async_trait::async_trait]
impl Module for TestModule {
    async fn configure(&self, ctx: &ModuleCtx, _services: &ServiceRegistry) -> anyhow::Result<()> {
        assert!(
            ctx.provider().is_none(),
            "provider must not exist before the build step"
        );
        assert_eq!(ctx.current_module(), Some(self.name));
        self.record("configure");
        if self.fail_configure.load(Ordering::SeqCst) {
            anyhow::bail!("{} refused to configure", self.name);
        }
        Ok(())
    }

    async fn initialize(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        ctx.provider_required()?;
        self.record("initialize");
        if self.fail_initialize.load(Ordering::SeqCst) {
            anyhow::bail!("{} refused to initialize", self.name);
        }
        Ok(())
    }

    async fn shutdown(&self, _ctx: &ModuleCtx) -> anyhow::Result<()> {
        self.record("shutdown");
        if self.fail_shutdown.load(Ordering::SeqCst) {
            anyhow::bail!("{} refused to shut down", self.name);
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

fn base_ctx() -> ModuleCtx {
    ModuleCtxBuilder::new(CancellationToken::new()).build()
}

async fn start(registry: &ModuleRegistry, ctx: &ModuleCtx) -> ModuleCtx {
    let services = ServiceRegistry::new();
    registry.run_configure_phase(ctx, &services).await.unwrap();
    let provider = Arc::new(services.build());
    let ctx = ctx.with_provider(provider);
    registry.run_init_phase(&ctx).await.unwrap();
    ctx
}

#[tokio::test]
async fn phases_walk_the_resolved_order_and_shutdown_reverses_it() {
    let calls: CallTracker = Arc::new(Mutex::new(Vec::new()));

    let mut b = RegistryBuilder::default();
    b.register("app", &["mid"], 0, TestModule::new("app", &calls));
    b.register("mid", &["base"], 0, TestModule::new("mid", &calls));
    b.register("base", &[], 0, TestModule::new("base", &calls));
    let registry = b.build("app").unwrap();

    let ctx = base_ctx();
    let ctx = start(&registry, &ctx).await;
    let report = registry.run_shutdown_phase(&ctx).await;
    assert!(report.is_clean());

    let recorded = calls.lock().unwrap().clone();
    assert_eq!(
        recorded,
        vec![
            "configure:base",
            "configure:mid",
            "configure:app",
            "initialize:base",
            "initialize:mid",
            "initialize:app",
            "shutdown:app",
            "shutdown:mid",
            "shutdown:base",
        ]
    );
}

#[tokio::test]
async fn failing_configure_is_fail_fast() {
    let calls: CallTracker = Arc::new(Mutex::new(Vec::new()));

    // Resolved order: a, b, c -- b fails, so c must never be touched.
    let mut builder = RegistryBuilder::default();
    builder.register("c", &["b"], 0, TestModule::new("c", &calls));
    builder.register("b", &["a"], 0, TestModule::failing_configure("b", &calls));
    builder.register("a", &[], 0, TestModule::new("a", &calls));
    let registry = builder.build("c").unwrap();

    let ctx = base_ctx();
    let services = ServiceRegistry::new();
    let err = registry
        .run_configure_phase(&ctx, &services)
        .await
        .unwrap_err();
    match &err {
        LifecycleError::Configure { module, .. } => assert_eq!(*module, "b"),
        other => panic!("expected Configure error, got {other:?}"),
    }

    let state_of = |name: &str| {
        registry
            .modules()
            .iter()
            .find(|m| m.name() == name)
            .unwrap()
            .state()
    };
    assert_eq!(state_of("a"), ModuleState::ServicesConfigured);
    assert_eq!(state_of("b"), ModuleState::Failed);
    assert_eq!(state_of("c"), ModuleState::Registered);

    let recorded = calls.lock().unwrap().clone();
    assert_eq!(recorded, vec!["configure:a", "configure:b"]);
}

#[tokio::test]
async fn failing_initialize_leaves_earlier_modules_initialized() {
    let calls: CallTracker = Arc::new(Mutex::new(Vec::new()));

    let mut builder = RegistryBuilder::default();
    builder.register("top", &["bottom"], 0, TestModule::failing_initialize("top", &calls));
    builder.register("bottom", &[], 0, TestModule::new("bottom", &calls));
    let registry = builder.build("top").unwrap();

    let ctx = base_ctx();
    let services = ServiceRegistry::new();
    registry.run_configure_phase(&ctx, &services).await.unwrap();
    let ctx = ctx.with_provider(Arc::new(services.build()));
    let err = registry.run_init_phase(&ctx).await.unwrap_err();
    assert_eq!(err.module(), "top");

    let state_of = |name: &str| {
        registry
            .modules()
            .iter()
            .find(|m| m.name() == name)
            .unwrap()
            .state()
    };
    assert_eq!(state_of("bottom"), ModuleState::Initialized);
    assert_eq!(state_of("top"), ModuleState::Failed);

    // Partial teardown still reaches the configured module.
    let report = registry.run_shutdown_phase(&ctx).await;
    assert!(report.is_clean());
    assert_eq!(state_of("bottom"), ModuleState::ShutDown);
    assert_eq!(state_of("top"), ModuleState::Failed);
}

#[tokio::test]
async fn shutdown_is_best_effort_and_collects_failures() {
    let calls: CallTracker = Arc::new(Mutex::new(Vec::new()));

    let mut builder = RegistryBuilder::default();
    builder.register("outer", &["inner"], 0, TestModule::failing_shutdown("outer", &calls));
    builder.register("inner", &["core"], 0, TestModule::failing_shutdown("inner", &calls));
    builder.register("core", &[], 0, TestModule::new("core", &calls));
    let registry = builder.build("outer").unwrap();

    let ctx = base_ctx();
    let ctx = start(&registry, &ctx).await;
    let report = registry.run_shutdown_phase(&ctx).await;

    assert_eq!(report.failures.len(), 2);
    let failed: Vec<_> = report.failures.iter().map(|f| f.module).collect();
    assert_eq!(failed, vec!["outer", "inner"]);

    // Every module was still attempted, dependents first.
    let recorded = calls.lock().unwrap().clone();
    let tail: Vec<_> = recorded
        .iter()
        .filter(|c| c.starts_with("shutdown:"))
        .cloned()
        .collect();
    assert_eq!(tail, vec!["shutdown:outer", "shutdown:inner", "shutdown:core"]);
}

#[tokio::test]
async fn services_registered_in_configure_resolve_in_initialize() {
    trait Clock: Send + Sync {
        fn now(&self) -> u64;
    }
    struct FixedClock;
    impl Clock for FixedClock {
        fn now(&self) -> u64 {
            1234
        }
    }

    struct ClockModule;

    #[async_trait::async_trait]
    impl Module for ClockModule {
        async fn configure(
            &self,
            _ctx: &ModuleCtx,
            services: &ServiceRegistry,
        ) -> anyhow::Result<()> {
            services.register::<dyn Clock>(Arc::new(FixedClock));
            Ok(())
        }
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    struct ConsumerModule {
        observed: Arc<Mutex<Option<u64>>>,
    }

    #[async_trait::async_trait]
    impl Module for ConsumerModule {
        async fn initialize(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
            let clock = ctx.provider_required()?.get::<dyn Clock>()?;
            *self.observed.lock().unwrap() = Some(clock.now());
            Ok(())
        }
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    let observed = Arc::new(Mutex::new(None));
    let mut builder = RegistryBuilder::default();
    builder.register("clock", &[], 0, Arc::new(ClockModule));
    builder.register(
        "consumer",
        &["clock"],
        0,
        Arc::new(ConsumerModule {
            observed: observed.clone(),
        }),
    );
    let registry = builder.build("consumer").unwrap();

    let ctx = base_ctx();
    let ctx = start(&registry, &ctx).await;
    assert_eq!(*observed.lock().unwrap(), Some(1234));

    let host = registry.host(ctx.provider().unwrap());
    assert!(host.module("clock").is_some());
    assert_eq!(host.module("consumer").unwrap().state(), ModuleState::Initialized);
    assert!(host.provider().get::<dyn Clock>().is_ok());
}
