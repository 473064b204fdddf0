//! Ordered provider fallback.
//!
//! Providers are tried one after another, primary extraction hosts first,
//! then public endpoints. The first provider to leave a non-empty file wins;
//! the rest are never contacted.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::error::{AudioDownloadFailed, ProviderError, ProviderFailure};
use super::primary::ExtractionHostProvider;
use super::public::PublicEndpointProvider;
use super::retry_policy::RetryPolicy;
use super::transfer::{clear_outputs, HttpTransport};
use crate::config::ProviderSettings;

/// A single audio source.
#[async_trait]
pub trait AudioProvider: Send + Sync {
    /// Label used in logs and failure reports.
    fn name(&self) -> &str;

    /// Download the audio for `source_id` into `dest_dir/file_stem.<ext>`
    /// and return the written path.
    async fn fetch(
        &self,
        source_id: &str,
        dest_dir: &Path,
        file_stem: &str,
    ) -> Result<PathBuf, ProviderError>;
}

/// Audio download capability used by the pipeline.
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    async fn fetch(
        &self,
        source_external_id: &str,
        dest_dir: &Path,
        file_stem: &str,
    ) -> Result<PathBuf, AudioDownloadFailed>;
}

pub struct ProviderFallbackDownloader {
    providers: Vec<Arc<dyn AudioProvider>>,
    extensions: Vec<String>,
}

impl ProviderFallbackDownloader {
    pub fn new(providers: Vec<Arc<dyn AudioProvider>>, extensions: Vec<String>) -> Self {
        Self {
            providers,
            extensions,
        }
    }

    /// Build the provider chain from configuration.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        let transport = HttpTransport::from_settings(settings)?;
        let extensions = settings.probe_extensions.clone();
        let policy = RetryPolicy::primary(settings);

        let mut providers: Vec<Arc<dyn AudioProvider>> = Vec::new();
        for host in &settings.primary_hosts {
            providers.push(Arc::new(ExtractionHostProvider::new(
                host.clone(),
                transport.clone(),
                policy.clone(),
                extensions.clone(),
            )));
        }
        for endpoint in &settings.public_endpoints {
            providers.push(Arc::new(PublicEndpointProvider::new(
                endpoint.clone(),
                transport.clone(),
                extensions.clone(),
            )));
        }

        Ok(Self::new(providers, extensions))
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }
}

#[async_trait]
impl AudioFetcher for ProviderFallbackDownloader {
    async fn fetch(
        &self,
        source_external_id: &str,
        dest_dir: &Path,
        file_stem: &str,
    ) -> Result<PathBuf, AudioDownloadFailed> {
        clear_outputs(dest_dir, file_stem, &self.extensions).await;

        let mut reasons = Vec::new();
        for provider in &self.providers {
            match provider.fetch(source_external_id, dest_dir, file_stem).await {
                Ok(path) => {
                    info!(
                        "Audio for {} delivered by {} at {:?}",
                        source_external_id,
                        provider.name(),
                        path
                    );
                    return Ok(path);
                }
                Err(e) => {
                    warn!(
                        "Provider {} failed for {}: {}",
                        provider.name(),
                        source_external_id,
                        e
                    );
                    reasons.push(ProviderFailure {
                        provider: provider.name().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Err(AudioDownloadFailed {
            source_id: source_external_id.to_string(),
            reasons,
        })
    }
}
