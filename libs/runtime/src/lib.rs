//! Host runtime support: layered configuration, logging initialization, and
//! path helpers. This crate knows nothing about the module system; the host
//! binary adapts its types onto composekit's traits.

pub mod config;
pub mod logging;
pub mod paths;

pub use config::{AppConfig, AppConfigProvider, AppSection, CliArgs, LoggingConfig};
pub use paths::resolve_home_dir;
