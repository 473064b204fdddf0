//! Secondary tier: public stream-listing endpoints.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use super::error::ProviderError;
use super::fallback::AudioProvider;
use super::models::{best_audio_stream, StreamsResponse};
use super::retry_policy::RetryPolicy;
use super::transfer::{extension_for_content_type, find_output, HttpTransport};

/// One configured public endpoint. Tried once, no re-signing.
pub struct PublicEndpointProvider {
    name: String,
    endpoint: String,
    transport: HttpTransport,
    policy: RetryPolicy,
    extensions: Vec<String>,
}

impl PublicEndpointProvider {
    pub fn new(endpoint: impl Into<String>, transport: HttpTransport, extensions: Vec<String>) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self {
            name: format!("public:{}", endpoint),
            endpoint,
            transport,
            policy: RetryPolicy::single_attempt(),
            extensions,
        }
    }

    fn streams_url(&self, source_id: &str) -> String {
        format!("{}/streams/{}", self.endpoint, urlencoding::encode(source_id))
    }

    fn extension_for(&self, mime_type: &str) -> String {
        extension_for_content_type(mime_type)
            .map(str::to_string)
            .filter(|ext| self.extensions.contains(ext))
            .or_else(|| self.extensions.first().cloned())
            .unwrap_or_else(|| "m4a".to_string())
    }

    async fn attempt(
        &self,
        source_id: &str,
        dest_dir: &Path,
        file_stem: &str,
    ) -> Result<PathBuf, ProviderError> {
        let listing: StreamsResponse = self.transport.get_json(&self.streams_url(source_id)).await?;
        let stream = best_audio_stream(&listing.audio_streams).ok_or(ProviderError::NoStreams)?;
        debug!(
            "{}: picked {} stream at {} bps",
            self.name, stream.mime_type, stream.bitrate
        );

        let dest = dest_dir.join(format!("{}.{}", file_stem, self.extension_for(&stream.mime_type)));
        let bytes = self.transport.download_to(&stream.url, &dest).await?;
        info!("{}: downloaded {} bytes to {:?}", self.name, bytes, dest);

        find_output(dest_dir, file_stem, &self.extensions)
            .await
            .ok_or(ProviderError::EmptyFile)
    }
}

#[async_trait]
impl AudioProvider for PublicEndpointProvider {
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
