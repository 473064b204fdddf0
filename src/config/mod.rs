mod file_config;

pub use file_config::{CatalogConfig, FileConfig, ProvidersConfig, QueueConfig};

use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const QUEUE_FILE_NAME: &str = "download_queue.json";
pub const DEFAULT_CATALOG_BASE_URL: &str = "https://api.spotify.com/v1";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub library_root: PathBuf,
    pub data_dir: PathBuf,

    pub catalog: CatalogSettings,
    pub providers: ProviderSettings,
    pub queue: QueueSettings,
}

#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub api_base_url: String,
    pub access_token: String,
    pub search_limit: usize,
    pub request_timeout_sec: u64,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_CATALOG_BASE_URL.to_string(),
            access_token: String::new(),
            search_limit: 10,
            request_timeout_sec: 15,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub primary_hosts: Vec<String>,
    pub public_endpoints: Vec<String>,
    pub metadata_timeout_sec: u64,
    pub connect_timeout_sec: u64,
    pub refetch_attempts: u32,
    pub refetch_backoff_ms: u64,
    pub probe_extensions: Vec<String>,
}

impl ProviderSettings {
    pub fn has_providers(&self) -> bool {
        !self.primary_hosts.is_empty() || !self.public_endpoints.is_empty()
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            primary_hosts: Vec::new(),
            public_endpoints: Vec::new(),
            metadata_timeout_sec: 15,
            connect_timeout_sec: 10,
            refetch_attempts: 3,
            refetch_backoff_ms: 2000,
            probe_extensions: default_probe_extensions(),
        }
    }
}

fn default_probe_extensions() -> Vec<String> {
    ["m4a", "webm", "opus", "mp3", "ogg", "aac"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Clone)]
pub struct QueueSettings {
    /// Alternatives tried after the first failure, at most.
    pub max_retries: u32,
    /// Preferred duration distance when picking an alternative.
    pub duration_tolerance_secs: f64,
    /// Pause between two processed items.
    pub pacing_ms: u64,
}

impl QueueSettings {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            duration_tolerance_secs: 30.0,
            pacing_ms: 1000,
        }
    }
}

impl AppConfig {
    /// Resolve configuration from an optional TOML file config, filling in
    /// defaults for anything left out.
    pub fn resolve(file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .ok_or_else(|| anyhow::anyhow!("data_dir must be specified in config file"))?;

        if !data_dir.exists() {
            bail!("Data directory does not exist: {:?}", data_dir);
        }
        if !data_dir.is_dir() {
            bail!("data_dir is not a directory: {:?}", data_dir);
        }

        let library_root = file
            .library_root
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("library"));

        let catalog_file = file.catalog.unwrap_or_default();
        let catalog_defaults = CatalogSettings::default();
        let catalog = CatalogSettings {
            api_base_url: catalog_file
                .api_base_url
                .unwrap_or(catalog_defaults.api_base_url),
            access_token: catalog_file.access_token.unwrap_or_default(),
            search_limit: catalog_file
                .search_limit
                .unwrap_or(catalog_defaults.search_limit),
            request_timeout_sec: catalog_file
                .request_timeout_sec
                .unwrap_or(catalog_defaults.request_timeout_sec),
        };

        let providers_file = file.providers.unwrap_or_default();
        let provider_defaults = ProviderSettings::default();
        let providers = ProviderSettings {
            primary_hosts: providers_file.primary_hosts.unwrap_or_default(),
            public_endpoints: providers_file.public_endpoints.unwrap_or_default(),
            metadata_timeout_sec: providers_file
                .metadata_timeout_sec
                .unwrap_or(provider_defaults.metadata_timeout_sec),
            connect_timeout_sec: providers_file
                .connect_timeout_sec
                .unwrap_or(provider_defaults.connect_timeout_sec),
            refetch_attempts: providers_file
                .refetch_attempts
                .unwrap_or(provider_defaults.refetch_attempts),
            refetch_backoff_ms: providers_file
                .refetch_backoff_ms
                .unwrap_or(provider_defaults.refetch_backoff_ms),
            probe_extensions: providers_file
                .probe_extensions
                .filter(|exts| !exts.is_empty())
                .unwrap_or(provider_defaults.probe_extensions),
        };

        if !providers.has_providers() {
            bail!("At least one primary host or public endpoint must be configured");
        }

        let queue_file = file.queue.unwrap_or_default();
        let queue_defaults = QueueSettings::default();
        let queue = QueueSettings {
            max_retries: queue_file.max_retries.unwrap_or(queue_defaults.max_retries),
            duration_tolerance_secs: queue_file
                .duration_tolerance_secs
                .unwrap_or(queue_defaults.duration_tolerance_secs),
            pacing_ms: queue_file.pacing_ms.unwrap_or(queue_defaults.pacing_ms),
        };

        Ok(Self {
            library_root,
            data_dir,
            catalog,
            providers,
            queue,
        })
    }

    pub fn queue_file_path(&self) -> PathBuf {
        self.data_dir.join(QUEUE_FILE_NAME)
    }
}
