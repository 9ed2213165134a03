use crate::utils::logger::LogFormat;
use clap::Parser;
use std::path::PathBuf;

/// Collector settings live in the environment (see `CollectorConfig`); these flags only
/// control how the process runs.
#[derive(Debug, Clone, Parser)]
#[command(name = "mtd-collector")]
#[command(about = "Polls MTD departures and current weather into JSON-Lines files")]
pub struct CliArgs {
    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    /// Load variables from this file instead of ./.env
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    /// Show what each tick would request, then exit without fetching
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// Loads the env file into the process environment. Variables already set are kept.
    pub fn load_env_file(&self) -> crate::utils::error::Result<Option<PathBuf>> {
        match &self.env_file {
            Some(path) => {
                dotenvy::from_path(path)?;
                Ok(Some(path.clone()))
            }
            None => match dotenvy::dotenv() {
                Ok(path) => Ok(Some(path)),
                Err(e) if e.not_found() => Ok(None),
                Err(e) => Err(e.into()),
            },
        }
    }
}
