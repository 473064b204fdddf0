//! Primary tier: self-hosted extraction hosts.
//!
//! A host turns a source id into a short-lived signed media URL. Signed URLs
//! go stale quickly, so every attempt asks for a fresh one, validates it
//! with a small probe and only then commits to the full transfer.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use super::error::ProviderError;
use super::fallback::AudioProvider;
use super::models::ExtractResponse;
use super::retry_policy::RetryPolicy;
use super::transfer::{
    extension_for_content_type, find_output, sniff_extension, HttpTransport, Probe,
};

/// One configured extraction host.
pub struct ExtractionHostProvider {
    name: String,
    host: String,
    transport: HttpTransport,
    policy: RetryPolicy,
    extensions: Vec<String>,
}

impl ExtractionHostProvider {
    /// # Arguments
    /// * `host` - Base URL of the extraction host (e.g., "http://extract-1:9000")
    /// * `transport` - Shared HTTP clients
    /// * `policy` - Re-signing retry policy
    /// * `extensions` - Container extensions probed for the output, in order
    pub fn new(
        host: impl Into<String>,
        transport: HttpTransport,
        policy: RetryPolicy,
        extensions: Vec<String>,
    ) -> Self {
        let host = host.into().trim_end_matches('/').to_string();
        Self {
            name: format!("primary:{}", host),
            host,
            transport,
            policy,
            extensions,
        }
    }

    fn extract_url(&self, source_id: &str) -> String {
        format!(
            "{}/api/extract/{}",
            self.host,
            urlencoding::encode(source_id)
        )
    }

    /// Single attempt: fresh signed URL, probe, full transfer.
    async fn attempt(
        &self,
        source_id: &str,
        dest_dir: &Path,
        file_stem: &str,
    ) -> Result<PathBuf, ProviderError> {
        let extracted: ExtractResponse = self.transport.get_json(&self.extract_url(source_id)).await?;
        debug!("{}: got signed URL for {}", self.name, source_id);

        let probe = self.transport.probe(&extracted.url).await?;
        let ext = self.choose_extension(extracted.ext.as_deref(), &probe);
        let dest = dest_dir.join(format!("{}.{}", file_stem, ext));

        let bytes = self.transport.download_to(&extracted.url, &dest).await?;
        info!("{}: downloaded {} bytes to {:?}", self.name, bytes, dest);

        find_output(dest_dir, file_stem, &self.extensions)
            .await
            .ok_or(ProviderError::EmptyFile)
    }

    /// Extension hint from the host, then content type, then sniffed bytes.
    /// Only extensions in the probe list are accepted.
    fn choose_extension(&self, hint: Option<&str>, probe: &Probe) -> String {
        let hint = hint.map(|h| h.trim().trim_start_matches('.').to_ascii_lowercase());
        let candidates = [
            hint,
            extension_for_content_type(&probe.content_type).map(str::to_string),
            sniff_extension(&probe.head).map(str::to_string),
        ];

        candidates
            .into_iter()
            .flatten()
            .find(|ext| self.extensions.contains(ext))
            .or_else(|| self.extensions.first().cloned())
            .unwrap_or_else(|| "m4a".to_string())
    }
}

#[async_trait]
impl AudioProvider for ExtractionHostProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(
        &self,
        source_id: &str,
        dest_dir: &Path,
        file_stem: &str,
    ) -> Result<PathBuf, ProviderError> {
        self.policy
            .run(&self.name, || self.attempt(source_id, dest_dir, file_stem))
            .await
    }
}
