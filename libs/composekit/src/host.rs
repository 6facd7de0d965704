//! Read-only post-startup view handed to the embedding process.

use std::sync::Arc;

use crate::lifecycle::{ModuleState, StateCell};
use crate::services::ServiceProvider;

/// `(name, priority, state)` for one loaded module. The state cell is
/// shared with the phase driver, so reads stay live through shutdown.
pub struct ModuleReport {
    pub(crate) name: &'static str,
    pub(crate) priority: i32,
    pub(crate) state: Arc<StateCell>,
}

impl ModuleReport {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn state(&self) -> ModuleState {
        self.state.get()
    }
}

/// The composition result: every loaded module with its resolved priority
/// and current lifecycle state, plus the finalized service provider.
/// Constructed only after the configure and initialize passes both
/// completed; immutable apart from state transitions during shutdown.
pub struct ApplicationHost {
    pub(crate) modules: Vec<ModuleReport>,
    pub(crate) provider: Arc<ServiceProvider>,
}

impl ApplicationHost {
    /// Loaded modules in their resolved startup order.
    pub fn modules(&self) -> &[ModuleReport] {
        &self.modules
    }

    pub fn module(&self, name: &str) -> Option<&ModuleReport> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn provider(&self) -> Arc<ServiceProvider> {
        self.provider.clone()
    }
}
