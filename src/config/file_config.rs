use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_dir: Option<String>,
    pub port: Option<u16>,
    pub logging_level: Option<String>,
    pub default_page_size: Option<usize>,
    pub token_retention_days: Option<u64>,
    pub prune_interval_hours: Option<u64>,
    pub reconcile_interval_mins: Option<u64>,

    // Provider config
    pub provider: Option<ProviderConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ProviderConfig {
    /// Override of the provider API base URL, mainly for testing.
    pub api_base: Option<String>,
    /// Token used for metadata lookups. Enrichment is off when absent.
    pub service_token: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
