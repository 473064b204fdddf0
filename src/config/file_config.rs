use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings
    pub library_root: Option<String>,
    pub data_dir: Option<String>,

    // Component configs
    pub catalog: Option<CatalogConfig>,
    pub providers: Option<ProvidersConfig>,
    pub queue: Option<QueueConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct CatalogConfig {
    pub api_base_url: Option<String>,
    /// Long-lived bearer token, served through `StaticTokenSource`.
    pub access_token: Option<String>,
    pub search_limit: Option<usize>,
    pub request_timeout_sec: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Self-hosted extraction hosts, tried in order before any public endpoint.
    pub primary_hosts: Option<Vec<String>>,
    pub public_endpoints: Option<Vec<String>>,
    pub metadata_timeout_sec: Option<u64>,
    pub connect_timeout_sec: Option<u64>,
    // Re-signing loop on primary hosts
    pub refetch_attempts: Option<u32>,
    pub refetch_backoff_ms: Option<u64>,
    pub probe_extensions: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct QueueConfig {
    pub max_retries: Option<u32>,
    pub duration_tolerance_secs: Option<f64>,
    pub pacing_ms: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
