//! Module lifecycle states and phase errors.
//!
//! One [`StateCell`] lives per loaded module for the lifetime of the host.
//! The phase driver is the only writer; host views read through the shared
//! cell, so shutdown transitions stay visible after startup completes.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Per-module lifecycle state.
///
/// `Registered -> ConfiguringServices -> ServicesConfigured -> Initializing
/// -> Initialized -> ShuttingDown -> ShutDown`, with `Failed` terminal and
/// reachable from any in-progress state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ModuleState {
    Registered,
    ConfiguringServices,
    ServicesConfigured,
    Initializing,
    Initialized,
    ShuttingDown,
    ShutDown,
    Failed,
}

impl ModuleState {
    #[inline]
    pub const fn as_u8(self) -> u8 {
        match self {
            ModuleState::Registered => 0,
            ModuleState::ConfiguringServices => 1,
            ModuleState::ServicesConfigured => 2,
            ModuleState::Initializing => 3,
            ModuleState::Initialized => 4,
            ModuleState::ShuttingDown => 5,
            ModuleState::ShutDown => 6,
            ModuleState::Failed => 7,
        }
    }

    #[inline]
    pub const fn from_u8(x: u8) -> Self {
        match x {
            1 => ModuleState::ConfiguringServices,
            2 => ModuleState::ServicesConfigured,
            3 => ModuleState::Initializing,
            4 => ModuleState::Initialized,
            5 => ModuleState::ShuttingDown,
            6 => ModuleState::ShutDown,
            7 => ModuleState::Failed,
            _ => ModuleState::Registered,
        }
    }
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModuleState::Registered => "registered",
            ModuleState::ConfiguringServices => "configuring_services",
            ModuleState::ServicesConfigured => "services_configured",
            ModuleState::Initializing => "initializing",
            ModuleState::Initialized => "initialized",
            ModuleState::ShuttingDown => "shutting_down",
            ModuleState::ShutDown => "shut_down",
            ModuleState::Failed => "failed",
        })
    }
}

/// Shared state slot for one module.
pub struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(ModuleState::Registered.as_u8()))
    }

    #[inline]
    pub fn get(&self) -> ModuleState {
        ModuleState::from_u8(self.0.load(Ordering::Acquire))
    }

    #[inline]
    pub(crate) fn set(&self, state: ModuleState) {
        self.0.store(state.as_u8(), Ordering::Release);
    }
}

/// A configure or initialize hook failed. Startup is fail-fast: the owning
/// module is left in `Failed` and modules later in the order never run.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("configure failed for module '{module}'")]
    Configure {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("initialization failed for module '{module}'")]
    Initialize {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl LifecycleError {
    pub fn module(&self) -> &'static str {
        match self {
            LifecycleError::Configure { module, .. } => module,
            LifecycleError::Initialize { module, .. } => module,
        }
    }
}

/// One failed shutdown hook.
#[derive(Debug)]
pub struct ShutdownFailure {
    pub module: &'static str,
    pub error: anyhow::Error,
}

/// Outcome of the shutdown pass. Every module was given its attempt even
/// when earlier ones failed.
#[derive(Debug, Default)]
pub struct ShutdownReport {
    pub failures: Vec<ShutdownFailure>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
