use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::context::ModuleCtx;
use crate::contracts::Module;
use crate::graph::{Declaration, DependencyGraph, ModuleDescriptor};
use crate::host::{ApplicationHost, ModuleReport};
use crate::lifecycle::{LifecycleError, ModuleState, ShutdownFailure, ShutdownReport, StateCell};
use crate::resolver;
use crate::services::{ServiceProvider, ServiceRegistry};

/// The function type submitted by module crates via `inventory::submit!`.
pub struct Registrator(pub fn(&mut RegistryBuilder));

inventory::collect!(Registrator);

/// One loaded module: its descriptor plus the lifecycle state slot.
pub struct ModuleSlot {
    descriptor: ModuleDescriptor,
    state: Arc<StateCell>,
}

impl ModuleSlot {
    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    pub fn deps(&self) -> &'static [&'static str] {
        self.descriptor.deps
    }

    pub fn priority(&self) -> i32 {
        self.descriptor.priority
    }

    pub fn state(&self) -> ModuleState {
        self.state.get()
    }
}

/// The resolved registry: modules in dependency-first order, each carrying
/// its lifecycle state. This is the retained artifact of a resolution; the
/// dependency graph itself is discarded once the order is fixed.
pub struct ModuleRegistry {
    modules: Vec<ModuleSlot>,
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&'static str> = self.modules.iter().map(|m| m.name()).collect();
        f.debug_struct("ModuleRegistry")
            .field("modules", &names)
            .finish()
    }
}

impl ModuleRegistry {
    pub fn modules(&self) -> &[ModuleSlot] {
        &self.modules
    }

    pub fn get_module(&self, name: &str) -> Option<Arc<dyn Module>> {
        self.modules
            .iter()
            .find(|m| m.name() == name)
            .map(|m| m.descriptor.module.clone())
    }

    /// Discover registrations via inventory, then build for the given root.
    pub fn discover_and_build(root: &'static str) -> Result<Self, RegistryError> {
        let mut b = RegistryBuilder::default();
        for r in ::inventory::iter::<Registrator> {
            r.0(&mut b);
        }
        b.build(root)
    }

    // ---- Ordered phases: configure -> build -> initialize -> shutdown ----

    /// Configure pass, dependency-first. Fail-fast: the first failing hook
    /// marks its module `Failed` and aborts the pass; later modules are
    /// never invoked.
    pub async fn run_configure_phase(
        &self,
        base_ctx: &ModuleCtx,
        services: &ServiceRegistry,
    ) -> Result<(), LifecycleError> {
        for slot in &self.modules {
            let ctx = base_ctx.for_module(slot.name());
            slot.state.set(ModuleState::ConfiguringServices);
            if let Err(source) = slot.descriptor.module.configure(&ctx, services).await {
                slot.state.set(ModuleState::Failed);
                return Err(LifecycleError::Configure {
                    module: slot.name(),
                    source,
                });
            }
            slot.state.set(ModuleState::ServicesConfigured);
            tracing::debug!(module = slot.name(), "services configured");
        }
        Ok(())
    }

    /// Initialize pass, same order and policy as configure. By the time a
    /// module's hook runs, every declared dependency is already
    /// `Initialized`; the resolver guarantees this, so the driver does not
    /// re-check it.
    pub async fn run_init_phase(&self, base_ctx: &ModuleCtx) -> Result<(), LifecycleError> {
        for slot in &self.modules {
            let ctx = base_ctx.for_module(slot.name());
            slot.state.set(ModuleState::Initializing);
            if let Err(source) = slot.descriptor.module.initialize(&ctx).await {
                slot.state.set(ModuleState::Failed);
                return Err(LifecycleError::Initialize {
                    module: slot.name(),
                    source,
                });
            }
            slot.state.set(ModuleState::Initialized);
            tracing::debug!(module = slot.name(), "initialized");
        }
        Ok(())
    }

    /// Shutdown pass in exact reverse of the startup order. Best-effort:
    /// failures are logged and collected, and every remaining module still
    /// gets its attempt. Modules that never started configuring (or already
    /// failed) are skipped.
    pub async fn run_shutdown_phase(&self, base_ctx: &ModuleCtx) -> ShutdownReport {
        let mut report = ShutdownReport::default();
        for slot in self.modules.iter().rev() {
            match slot.state.get() {
                ModuleState::Registered | ModuleState::Failed | ModuleState::ShutDown => continue,
                _ => {}
            }
            let ctx = base_ctx.for_module(slot.name());
            slot.state.set(ModuleState::ShuttingDown);
            match slot.descriptor.module.shutdown(&ctx).await {
                Ok(()) => slot.state.set(ModuleState::ShutDown),
                Err(error) => {
                    slot.state.set(ModuleState::Failed);
                    tracing::warn!(module = slot.name(), error = %error, "module shutdown failed");
                    report.failures.push(ShutdownFailure {
                        module: slot.name(),
                        error,
                    });
                }
            }
        }
        report
    }

    /// Read-only host view over the loaded modules and the finalized
    /// provider. Meant to be taken after a successful initialize pass.
    pub fn host(&self, provider: Arc<ServiceProvider>) -> ApplicationHost {
        let modules = self
            .modules
            .iter()
            .map(|slot| ModuleReport {
                name: slot.name(),
                priority: slot.priority(),
                state: slot.state.clone(),
            })
            .collect();
        ApplicationHost { modules, provider }
    }
}

/// Builder fed by registrators (or directly in tests). Names must be
/// unique; violations are collected and reported at build time.
#[derive(Default)]
pub struct RegistryBuilder {
    table: HashMap<&'static str, Declaration>,
    errors: Vec<String>,
}

impl RegistryBuilder {
    /// Register a module with its declared dependencies and priority.
    /// Passing `&[]` and `0` means "no dependencies, default priority".
    pub fn register(
        &mut self,
        name: &'static str,
        deps: &'static [&'static str],
        priority: i32,
        module: Arc<dyn Module>,
    ) {
        if self.table.contains_key(name) {
            self.errors
                .push(format!("Module '{name}' is already registered"));
            return;
        }
        self.table.insert(
            name,
            Declaration {
                deps,
                priority,
                module,
            },
        );
    }

    /// Finalize: rooted discovery, cycle check, deterministic topo order.
    /// No lifecycle hook has run by the time this returns.
    pub fn build(self, root: &'static str) -> Result<ModuleRegistry, RegistryError> {
        if !self.errors.is_empty() {
            return Err(RegistryError::InvalidRegistryConfiguration {
                errors: self.errors,
            });
        }

        let graph = DependencyGraph::discover(root, &self.table)?;
        let order = resolver::resolve(&graph)?;

        let total = graph.len();
        let mut nodes: Vec<Option<ModuleDescriptor>> = graph.nodes.into_iter().map(Some).collect();
        let mut modules = Vec::with_capacity(total);
        for i in order {
            if let Some(descriptor) = nodes[i].take() {
                modules.push(ModuleSlot {
                    descriptor,
                    state: Arc::new(StateCell::new()),
                });
            }
        }
        debug_assert_eq!(modules.len(), total);

        tracing::info!(
            modules = ?modules.iter().map(|m| m.name()).collect::<Vec<_>>(),
            "module dependency order resolved"
        );

        Ok(ModuleRegistry { modules })
    }
}

/// Structured errors for registration and resolution. All of these surface
/// before any lifecycle hook has been invoked.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown module '{0}'")]
    UnknownModule(String),

    #[error("module '{module}' depends on unregistered module '{dependency}'")]
    MissingDependency { module: String, dependency: String },

    #[error("circular module dependency: {}", chain.join(" -> "))]
    CircularDependency { chain: Vec<&'static str> },

    #[error("invalid registry configuration:\n{errors:#?}")]
    InvalidRegistryConfiguration { errors: Vec<String> },
}
