//! HTTP transfer helpers shared by all providers.
//!
//! Two clients with distinct timeouts: metadata and validation calls are
//! short-lived, bulk transfers are only bounded by their connect timeout.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use reqwest::header::{CONTENT_TYPE, RANGE};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::error::ProviderError;
use crate::config::ProviderSettings;

/// Byte range requested by the validation probe.
const PROBE_RANGE: &str = "bytes=0-1023";

/// What a streaming probe learned about a media URL.
#[derive(Debug, Clone)]
pub struct Probe {
    pub content_type: String,
    /// First chunk of the body, for content sniffing.
    pub head: Vec<u8>,
}

/// Pair of HTTP clients used by the providers.
#[derive(Clone)]
pub struct HttpTransport {
    metadata: Client,
    bulk: Client,
}

impl HttpTransport {
    pub fn new(metadata_timeout: Duration, connect_timeout: Duration) -> Result<Self, ProviderError> {
        let metadata = Client::builder()
            .timeout(metadata_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ProviderError::Connection(e.to_string()))?;
        let bulk = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        Ok(Self { metadata, bulk })
    }

    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        Self::new(
            Duration::from_secs(settings.metadata_timeout_sec),
            Duration::from_secs(settings.connect_timeout_sec),
        )
    }

    /// GET a small JSON document with the short timeout.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ProviderError> {
        let response = self.metadata.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }
        response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))
    }

    /// Fetch the first bytes of a media URL and check that it serves audio.
    pub async fn probe(&self, url: &str) -> Result<Probe, ProviderError> {
        let mut response = self.metadata.get(url).header(RANGE, PROBE_RANGE).send().await?;
        let content_type = check_audio_response(&response)?;
        let head = response
            .chunk()
            .await?
            .map(|bytes| bytes.to_vec())
            .unwrap_or_default();

        debug!(
            "Probe ok for {} ({}, {} bytes)",
            url,
            content_type,
            head.len()
        );
        Ok(Probe { content_type, head })
    }

    /// Stream a media URL into `dest`.
    ///
    /// The body is staged in a `.part` sibling and renamed into place once
    /// flushed, so `dest` either holds a complete transfer or is untouched.
    /// Returns the number of bytes written.
    pub async fn download_to(&self, url: &str, dest: &Path) -> Result<u64, ProviderError> {
        let response = self.bulk.get(url).send().await?;
        check_audio_response(&response)?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let part = part_path(dest);
        match stream_to_file(response, &part).await {
            Ok(0) => {
                let _ = tokio::fs::remove_file(&part).await;
                Err(ProviderError::EmptyFile)
            }
            Ok(written) => {
                tokio::fs::rename(&part, dest).await?;
                Ok(written)
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&part).await;
                Err(e)
            }
        }
    }
}

async fn stream_to_file(response: Response, path: &Path) -> Result<u64, ProviderError> {
    let mut file = File::create(path).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}

/// Require a 2xx status and an audio-like content type.
fn check_audio_response(response: &Response) -> Result<String, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::Status(status.as_u16()));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(normalize_content_type)
        .unwrap_or_default();
    if !is_audio_content_type(&content_type) {
        return Err(ProviderError::NotAudio(if content_type.is_empty() {
            "<missing>".to_string()
        } else {
            content_type
        }));
    }
    Ok(content_type)
}

/// Lowercased media type without parameters.
pub fn normalize_content_type(raw: &str) -> String {
    raw.split(';').next().unwrap_or("").trim().to_ascii_lowercase()
}

/// `audio/*` or a generic binary stream.
pub fn is_audio_content_type(content_type: &str) -> bool {
    let content_type = normalize_content_type(content_type);
    content_type.starts_with("audio/")
        || content_type == "application/octet-stream"
        || content_type == "binary/octet-stream"
}

/// Container extension implied by an audio content type.
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    match normalize_content_type(content_type).as_str() {
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" => Some("m4a"),
        "audio/webm" => Some("webm"),
        "audio/mpeg" | "audio/mp3" => Some("mp3"),
        "audio/ogg" => Some("ogg"),
        "audio/opus" => Some("opus"),
        "audio/aac" | "audio/aacp" => Some("aac"),
        _ => None,
    }
}

/// Container extension guessed from the leading bytes of a file.
pub fn sniff_extension(head: &[u8]) -> Option<&'static str> {
    let kind = infer::get(head)?;
    match kind.extension() {
        "mp4" | "m4a" => Some("m4a"),
        "webm" => Some("webm"),
        "mp3" => Some("mp3"),
        "ogg" => Some("ogg"),
        "aac" => Some("aac"),
        "flac" => Some("flac"),
        _ => None,
    }
}

/// `dest` with `.part` appended to the full file name.
pub fn part_path(dest: &Path) -> PathBuf {
    let mut name = OsString::from(dest.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

/// First `dir/stem.<ext>` that exists and is non-empty, in extension order.
pub async fn find_output(dir: &Path, stem: &str, extensions: &[String]) -> Option<PathBuf> {
    for ext in extensions {
        let candidate = dir.join(format!("{}.{}", stem, ext));
        if let Ok(meta) = tokio::fs::metadata(&candidate).await {
            if meta.is_file() && meta.len() > 0 {
                return Some(candidate);
            }
        }
    }
    None
}

/// Remove any `dir/stem.<ext>` left by an earlier attempt.
pub async fn clear_outputs(dir: &Path, stem: &str, extensions: &[String]) {
    for ext in extensions {
        let candidate = dir.join(format!("{}.{}", stem, ext));
        if tokio::fs::remove_file(&candidate).await.is_ok() {
            debug!("Removed stale output {:?}", candidate);
        }
    }
}
