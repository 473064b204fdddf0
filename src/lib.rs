//! Pezzottify Fetch Library
//!
//! Turns a user-selected media reference into a tagged local audio file with
//! artwork: durable queue, fuzzy catalog matching and provider fallback.

pub mod catalog;
pub mod config;
pub mod download_manager;
pub mod downloader;
pub mod matching;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Re-export commonly used types for convenience
pub use catalog::{CatalogApi, CatalogClient, StaticTokenSource, TokenSource};
pub use config::{AppConfig, FileConfig};
pub use download_manager::{
    DownloadOrchestrator, JsonQueueStore, LibrarySink, QueueManager, ResolvedSong,
    SourceCandidate,
};
pub use downloader::{AudioFetcher, ProviderFallbackDownloader};
pub use matching::{MatchResolver, TrackResolver};

/// Install the global tracing subscriber.
///
/// Defaults to INFO, overridable through the `LOG_LEVEL` environment variable.
/// Calling this more than once is harmless, later calls are ignored.
pub fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init();
}

/// Wire the full pipeline from resolved configuration.
///
/// The catalog client, matcher, provider chain, orchestrator and queue store
/// are built here and injected into the returned [`QueueManager`]. Must be
/// called inside a tokio runtime.
pub async fn build_queue_manager(
    config: &AppConfig,
    token_source: Box<dyn TokenSource>,
    library: Arc<dyn LibrarySink>,
) -> Result<QueueManager> {
    let catalog: Arc<dyn CatalogApi> = Arc::new(
        CatalogClient::new(
            &config.catalog.api_base_url,
            config.catalog.request_timeout_sec,
            config.catalog.search_limit,
            token_source,
        )
        .context("Failed to create catalog client")?,
    );
    let resolver = Arc::new(MatchResolver::new(catalog.clone()));
    let fetcher = Arc::new(
        ProviderFallbackDownloader::from_settings(&config.providers)
            .context("Failed to create audio providers")?,
    );
    info!(
        "Audio providers: {}",
        fetcher.provider_names().join(", ")
    );

    let orchestrator = Arc::new(DownloadOrchestrator::new(
        resolver,
        fetcher,
        catalog,
        config.library_root.clone(),
        config.providers.probe_extensions.clone(),
    ));
    let store = Arc::new(JsonQueueStore::new(config.queue_file_path()));

    QueueManager::open(store, orchestrator, library, &config.queue).await
}
