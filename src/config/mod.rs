pub mod toml_config;

#[cfg(feature = "cli")]
use clap::Parser;

pub use toml_config::{ApiConfig, AppConfig, DatabaseConfig, LoggingConfig};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "attempt-etl")]
#[command(about = "Loads learning-attempt statistics into PostgreSQL")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// Override API.start_date (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<String>,

    /// Override API.end_date (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<String>,

    /// Fetch and flatten only; nothing is written to the database
    #[arg(long)]
    pub dry_run: bool,

    /// Do not prune old log files before the run
    #[arg(long)]
    pub skip_retention: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}
