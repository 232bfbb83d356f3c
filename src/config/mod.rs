mod file_config;

pub use file_config::{FileConfig, ProviderConfig};

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub default_page_size: usize,
    pub token_retention_days: u64,
    pub prune_interval_hours: u64,
    pub reconcile_interval_mins: u64,
    pub provider_api_base: Option<String>,
    pub provider_service_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub default_page_size: usize,
    /// Session tokens unused for this long get pruned. 0 disables pruning.
    pub token_retention_days: u64,
    pub prune_interval_hours: u64,
    /// Interval between counter reconciliation passes. 0 disables them.
    pub reconcile_interval_mins: u64,
    pub provider_api_base: Option<String>,
    pub provider_service_token: Option<String>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let default_page_size = file.default_page_size.unwrap_or(cli.default_page_size);
        let token_retention_days = file.token_retention_days.unwrap_or(cli.token_retention_days);
        let prune_interval_hours = file.prune_interval_hours.unwrap_or(cli.prune_interval_hours);
        let reconcile_interval_mins = file
            .reconcile_interval_mins
            .unwrap_or(cli.reconcile_interval_mins);

        let provider_file = file.provider.unwrap_or_default();
        let provider_api_base = provider_file
            .api_base
            .or_else(|| cli.provider_api_base.clone());
        let provider_service_token = provider_file
            .service_token
            .or_else(|| cli.provider_service_token.clone());

        Ok(Self {
            db_dir,
            port,
            logging_level,
            default_page_size,
            token_retention_days,
            prune_interval_hours,
            reconcile_interval_mins,
            provider_api_base,
            provider_service_token,
        })
    }

    pub fn ledger_db_path(&self) -> PathBuf {
        self.db_dir.join("ledger.db")
    }

    pub fn user_db_path(&self) -> PathBuf {
        self.db_dir.join("user.db")
    }
}

fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
