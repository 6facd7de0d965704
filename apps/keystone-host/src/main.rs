use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use runtime::{AppConfig, AppConfigProvider, CliArgs};

use std::path::{Path, PathBuf};
use std::sync::Arc;

// Adapter to make AppConfigProvider implement composekit::ConfigProvider
struct ComposekitConfigAdapter(Arc<AppConfigProvider>);

impl composekit::ConfigProvider for ComposekitConfigAdapter {
    fn module_section(&self, section: &str) -> Option<&serde_json::Value> {
        self.0.get_module_config(section)
    }

    fn lookup(&self, path: &str) -> Option<&serde_json::Value> {
        self.0.lookup_path(path)
    }
}

// Ensure module crates are linked and registered via inventory
#[allow(dead_code)]
fn _ensure_modules_linked() {
    let _ = std::any::type_name::<audit_log::AuditLogModule>();
    let _ = std::any::type_name::<heartbeat::HeartbeatModule>();
}

const ROOT_MODULE: &str = "app";

/// Root module: its declared dependencies pull in the application's whole
/// module closure.
#[derive(Default)]
struct AppModule;

#[composekit::async_trait]
impl composekit::Module for AppModule {
    async fn initialize(&self, ctx: &composekit::ModuleCtx) -> anyhow::Result<()> {
        tracing::info!(environment = ctx.environment(), "keystone host online");
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

fn register_root(b: &mut composekit::RegistryBuilder) {
    b.register(ROOT_MODULE, &["heartbeat"], 0, Arc::new(AppModule));
}

composekit::inventory::submit! { composekit::Registrator(register_root) }

/// Keystone - modular application composition host
#[derive(Parser)]
#[command(name = "keystone-host")]
#[command(about = "Keystone - modular application composition host")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the host
    Run,
    /// Check configuration and module declarations
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    _ensure_modules_linked();

    let cli = Cli::parse();

    // Figment treats a missing YAML file as empty; surface it instead.
    if let Some(path) = cli.config.as_deref() {
        if !path.exists() {
            return Err(anyhow!("config file not found: {}", path.display()));
        }
    }

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;

    // Apply CLI overrides (verbosity)
    config.apply_cli_overrides(&args);

    // Initialize logging
    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.app.home_dir));
    tracing::info!("Keystone host starting");

    // Print config and exit if requested
    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_host(config).await,
        Commands::Check => check_config(config),
    }
}

async fn run_host(config: AppConfig) -> Result<()> {
    tracing::info!("Initializing modules...");

    let environment = config.app.environment.clone();
    let config_provider = Arc::new(ComposekitConfigAdapter(Arc::new(AppConfigProvider::new(
        config,
    ))));

    let report = composekit::run(composekit::RunOptions {
        root: ROOT_MODULE,
        modules_cfg: config_provider,
        environment,
        shutdown: composekit::ShutdownOptions::Signals,
    })
    .await?;

    if !report.is_clean() {
        for failure in &report.failures {
            tracing::error!(module = failure.module, error = %failure.error, "shutdown failure");
        }
        return Err(anyhow!(
            "{} module(s) failed to shut down cleanly",
            report.failures.len()
        ));
    }
    Ok(())
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration and module declarations...");

    // Resolves the whole graph without running any lifecycle hook; cycles
    // and missing dependencies surface here with the offending names.
    let registry = composekit::ModuleRegistry::discover_and_build(ROOT_MODULE)?;

    println!("Configuration check passed");
    println!("Environment: {}", config.app.environment);
    println!("Resolved module order:");
    for slot in registry.modules() {
        println!("  {:>4}  {}", slot.priority(), slot.name());
    }
    Ok(())
}
