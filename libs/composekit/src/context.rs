use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::services::ServiceProvider;

/// Provider of the hierarchical configuration tree (raw JSON values).
pub trait ConfigProvider: Send + Sync {
    /// Returns the raw JSON section for a module, if any.
    fn module_section(&self, section: &str) -> Option<&serde_json::Value>;

    /// Resolve a value by dotted (or colon-separated) path into the tree.
    fn lookup(&self, _path: &str) -> Option<&serde_json::Value> {
        None
    }
}

/// Derive the config section key for a module: its own name with a trailing
/// `_module` suffix stripped (`payments_module` -> `payments`). Applied
/// uniformly so consuming code and tests can predict where settings live.
pub fn config_section_key(module_name: &str) -> &str {
    module_name.strip_suffix("_module").unwrap_or(module_name)
}

/// The argument bundle every lifecycle hook receives: configuration tree,
/// environment name, cancellation token, and -- from the build step onward --
/// the resolved service provider.
#[derive(Clone)]
pub struct ModuleCtx {
    pub(crate) config_provider: Option<Arc<dyn ConfigProvider>>,
    pub(crate) provider: Option<Arc<ServiceProvider>>,
    pub(crate) environment: Arc<str>,
    pub(crate) cancellation_token: CancellationToken,
    pub(crate) module_name: Option<Arc<str>>,
}

pub struct ModuleCtxBuilder {
    inner: ModuleCtx,
}

impl ModuleCtxBuilder {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            inner: ModuleCtx::from_token(token),
        }
    }

    pub fn with_config_provider(mut self, p: Arc<dyn ConfigProvider>) -> Self {
        self.inner.config_provider = Some(p);
        self
    }

    pub fn with_environment(mut self, env: impl Into<Arc<str>>) -> Self {
        self.inner.environment = env.into();
        self
    }

    pub fn build(self) -> ModuleCtx {
        self.inner
    }
}

impl ModuleCtx {
    pub(crate) fn from_token(token: CancellationToken) -> Self {
        Self {
            config_provider: None,
            provider: None,
            environment: Arc::from("development"),
            cancellation_token: token,
            module_name: None,
        }
    }

    /// Scope the context to a specific module name (used by the driver).
    pub(crate) fn for_module(&self, name: &str) -> Self {
        let mut scoped = self.clone();
        scoped.module_name = Some(Arc::<str>::from(name));
        scoped
    }

    /// Attach the finalized service provider after the build step.
    pub fn with_provider(&self, provider: Arc<ServiceProvider>) -> Self {
        let mut next = self.clone();
        next.provider = Some(provider);
        next
    }

    // ---- public read-only API for modules ----

    /// Active environment name, e.g. `development` or `production`.
    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation_token
    }

    pub fn current_module(&self) -> Option<&str> {
        self.module_name.as_deref()
    }

    /// Finalized service lookup; `None` until the build step has run.
    pub fn provider(&self) -> Option<Arc<ServiceProvider>> {
        self.provider.clone()
    }

    pub fn provider_required(&self) -> anyhow::Result<Arc<ServiceProvider>> {
        self.provider
            .clone()
            .ok_or_else(|| anyhow::anyhow!("service provider not available before the build step"))
    }

    /// Raw config value by dotted/colon path (e.g. `logging.console_level`).
    pub fn config_value(&self, path: &str) -> Option<&serde_json::Value> {
        self.config_provider.as_ref()?.lookup(path)
    }

    fn section(&self) -> Option<&serde_json::Value> {
        let name = self.module_name.as_deref()?;
        let provider = self.config_provider.as_ref()?;
        provider.module_section(config_section_key(name))
    }

    /// Best-effort: deserialize the module's config section into `T`,
    /// falling back to `T::default()` if the section is missing or invalid.
    pub fn module_config<T: DeserializeOwned + Default>(&self) -> T {
        self.section()
            .and_then(|v| serde_json::from_value::<T>(v.clone()).ok())
            .unwrap_or_default()
    }

    /// Strict: deserialize the module's config section into `T`, returning a
    /// pathful error on failure.
    pub fn module_config_required<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        let name = self
            .module_name
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("context is not scoped to a module"))?;
        let key = config_section_key(name);

        let provider = self
            .config_provider
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("no ConfigProvider"))?;

        let val = provider
            .module_section(key)
            .ok_or_else(|| anyhow::anyhow!("missing module config section: {key}"))?;

        serde_json::from_value(val.clone()).map_err(|e| anyhow::anyhow!("invalid {key} config: {e}"))
    }
}
