//! # ComposeKit - Declarative Module Composition
//!
//! Independently authored modules declare the modules they depend on and an
//! ordering priority; the host resolves those declarations into one
//! deterministic startup order and drives every module through a fixed
//! configure -> initialize -> shutdown lifecycle around a shared service
//! registry and configuration tree.
//!
//! ## Features
//!
//! - **Declarative**: modules register `(name, deps, priority)` once
//! - **Auto-discovery**: registrations are collected via inventory
//! - **Deterministic**: identical declarations always resolve to the same order
//! - **Introspectable**: per-module lifecycle state on the application host
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use composekit::{Module, Registrator, RegistryBuilder};
//!
//! #[derive(Default)]
//! struct CacheModule;
//!
//! #[composekit::async_trait]
//! impl Module for CacheModule {
//!     fn as_any(&self) -> &dyn std::any::Any { self }
//! }
//!
//! fn register(b: &mut RegistryBuilder) {
//!     b.register("cache", &["config_store"], 0, Arc::new(CacheModule));
//! }
//! composekit::inventory::submit! { composekit::Registrator(register) }
//! ```

pub use anyhow::Result;
pub use async_trait::async_trait;

// Re-export inventory so module crates can submit registrators without a
// direct dependency.
pub use inventory;

pub mod context;
pub mod contracts;
pub mod graph;
pub mod host;
pub mod lifecycle;
pub mod registry;
mod resolver;
pub mod runtime;
pub mod services;

pub use context::{config_section_key, ConfigProvider, ModuleCtx, ModuleCtxBuilder};
pub use contracts::Module;
pub use graph::ModuleDescriptor;
pub use host::{ApplicationHost, ModuleReport};
pub use lifecycle::{LifecycleError, ModuleState, ShutdownFailure, ShutdownReport};
pub use registry::{ModuleRegistry, RegistryBuilder, RegistryError, Registrator};
pub use runtime::{run, RunOptions, ShutdownOptions};
pub use services::{ServiceError, ServiceProvider, ServiceRegistry};
