//! sysconf operator tool.
//!
//! Validates the key registry against the schema, prepares the override
//! table, and inspects stored overrides.

use std::path::Path;

use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sysconf_config::{system_registry, ConfigLoader};
use sysconf_store::{ConfigStore, SystemConfigService};

/// Settings file structure for the sysconf tool.
#[derive(Debug, Deserialize, Default)]
struct ToolConfig {
    #[serde(default)]
    database: DatabaseConfig,
}

#[derive(Debug, Deserialize)]
struct DatabaseConfig {
    #[serde(default = "default_dsn")]
    dsn: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { dsn: default_dsn() }
    }
}

fn default_dsn() -> String {
    "sqlite:sysconf.db".to_string()
}

/// sysconf - runtime configuration overrides.
#[derive(Parser)]
#[command(name = "sysconf")]
#[command(about = "Validate the configuration registry and inspect stored overrides")]
struct Args {
    /// Path to the tool's settings file
    #[arg(short = 'c', long = "config")]
    config: Option<String>,

    /// Database DSN (e.g., "sqlite:sysconf.db" or "postgres://...")
    #[arg(long, env = "SYSCONF_DSN")]
    dsn: Option<String>,

    /// System config file used as the base layer instead of the search paths
    #[arg(long)]
    base: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate the registry, migrate the table and report stored overrides
    Check,
    /// List every registered key
    Keys,
    /// Print the effective configuration as JSON
    Show,
    /// Delete overrides whose key is no longer registered
    Prune,
}

fn load_config(path: &str) -> Result<ToolConfig, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let config: ToolConfig = serde_yaml::from_str(&content)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    // A broken registry must stop every command, including ones that never
    // touch the database.
    let registry = system_registry()?;

    if let Command::Keys = args.command {
        for entry in registry.entries() {
            let null = if entry.leaf.nullable { " | null" } else { "" };
            println!("{:<50} {:<45} {}{null}", entry.name, entry.path, entry.leaf.kind);
        }
        return Ok(());
    }

    // Load settings file if specified
    let file_config = if let Some(ref path) = args.config {
        if !Path::new(path).exists() {
            eprintln!("Error: Config file not found: {path}");
            std::process::exit(1);
        }
        load_config(path)?
    } else {
        ToolConfig::default()
    };

    // CLI args override settings file values
    let dsn = args.dsn.unwrap_or(file_config.database.dsn);

    let base = match args.base {
        Some(ref path) => ConfigLoader::new().with_file(path).load()?,
        None => ConfigLoader::new().load()?,
    };

    tracing::info!(dsn = %dsn, "Connecting to database");
    let store = ConfigStore::connect(&dsn).await?;
    store.migrate().await?;

    let service = SystemConfigService::with_base(store, base)?;

    match args.command {
        Command::Check => {
            let overrides = service.overrides().await?;
            let unregistered: Vec<_> = registry.unregistered_leaves().collect();
            if !unregistered.is_empty() {
                tracing::info!(leaves = ?unregistered, "Schema leaves without a registry key");
            }
            println!(
                "ready: {} keys, {} overrides, {} ignored",
                registry.len(),
                overrides.entries.len(),
                overrides.rejected.len()
            );
            for rejected in &overrides.rejected {
                println!("  ignored {}: {}", rejected.row.key, rejected.problem);
            }
        }
        Command::Show => {
            let config = service.load().await?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Command::Prune => {
            let stale = service.prune_stale().await?;
            for key in &stale {
                println!("removed {key}");
            }
            println!("{} stale overrides removed", stale.len());
        }
        Command::Keys => {}
    }

    Ok(())
}
