//! Per-song pipeline: resolve, download, persist.
//!
//! Steps run strictly in sequence and any failure aborts the attempt. A song
//! only counts as stored once audio, artwork and metadata record are all in
//! place; a later attempt at the same destination overwrites leftovers.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::CatalogApi;
use crate::downloader::{AudioDownloadFailed, AudioFetcher, ProviderFailure};
use crate::matching::{MatchResult, ResolveError, TrackResolver};

use super::models::{ResolvedSong, SongMetadataRecord, SourceCandidate};
use super::storage::{write_atomic, write_metadata, SongLayout, ARTWORK_FILE_NAME};

/// Callback receiving human-readable step labels.
pub type ProgressReporter = Arc<dyn Fn(&str) + Send + Sync>;

pub const STEP_RESOLVING: &str = "Resolving metadata";
pub const STEP_PREPARING: &str = "Preparing destination";
pub const STEP_AUDIO: &str = "Downloading audio";
pub const STEP_ARTWORK: &str = "Downloading artwork";
pub const STEP_METADATA: &str = "Saving metadata";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("Catalog match required: {0}")]
    CatalogMatchRequired(String),

    #[error("Artwork required: {0}")]
    ArtworkRequired(String),

    #[error("{0}")]
    AudioDownloadFailed(#[from] AudioDownloadFailed),

    #[error("Failed to persist song: {0}")]
    PersistFailed(String),
}

impl PipelineError {
    /// Per-provider reasons, for audio failures.
    pub fn provider_failures(&self) -> &[ProviderFailure] {
        match self {
            PipelineError::AudioDownloadFailed(e) => &e.reasons,
            _ => &[],
        }
    }
}

impl From<ResolveError> for PipelineError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::NoMatchFound(_) => PipelineError::CatalogMatchRequired(e.to_string()),
            ResolveError::ArtworkRequired(_) => PipelineError::ArtworkRequired(e.to_string()),
        }
    }
}

impl From<anyhow::Error> for PipelineError {
    fn from(e: anyhow::Error) -> Self {
        PipelineError::PersistFailed(format!("{:#}", e))
    }
}

/// Turns one source candidate into a stored song.
#[async_trait]
pub trait SongProcessor: Send + Sync {
    async fn process(
        &self,
        candidate: &SourceCandidate,
        on_progress: ProgressReporter,
    ) -> Result<ResolvedSong, PipelineError>;
}

pub struct DownloadOrchestrator {
    resolver: Arc<dyn TrackResolver>,
    fetcher: Arc<dyn AudioFetcher>,
    /// Used for artwork downloads.
    catalog: Arc<dyn CatalogApi>,
    library_root: PathBuf,
    audio_extensions: Vec<String>,
}

impl DownloadOrchestrator {
    pub fn new(
        resolver: Arc<dyn TrackResolver>,
        fetcher: Arc<dyn AudioFetcher>,
        catalog: Arc<dyn CatalogApi>,
        library_root: PathBuf,
        audio_extensions: Vec<String>,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            catalog,
            library_root,
            audio_extensions,
        }
    }

    async fn download_artwork(&self, matched: &MatchResult) -> Result<Vec<u8>, PipelineError> {
        self.catalog
            .download_artwork(&matched.artwork_url)
            .await
            .map_err(|e| {
                PipelineError::ArtworkRequired(format!(
                    "artwork download failed for {}: {}",
                    matched.track.id, e
                ))
            })
    }
}

#[async_trait]
impl SongProcessor for DownloadOrchestrator {
    async fn process(
        &self,
        candidate: &SourceCandidate,
        on_progress: ProgressReporter,
    ) -> Result<ResolvedSong, PipelineError> {
        on_progress(STEP_RESOLVING);
        let matched = self
            .resolver
            .resolve_title(
                &candidate.display_title,
                candidate.channel_label.as_deref(),
                candidate.duration_seconds,
            )
            .await?;
        let track = &matched.track;

        on_progress(STEP_PREPARING);
        let layout = SongLayout::new(
            &self.library_root,
            &track.primary_artist,
            &track.album_name,
            &track.name,
        );
        layout.create_dir().await?;

        if let Some((record, audio_path)) = layout
            .existing_complete_set(&track.id, &self.audio_extensions)
            .await
        {
            info!(
                "{} - {} already stored at {:?}, skipping download",
                record.artist, record.title, layout.dir
            );
            return Ok(ResolvedSong {
                title: record.title,
                artist: record.artist,
                album: record.album,
                duration_seconds: record.duration_ms as f64 / 1000.0,
                local_audio_path: audio_path,
                local_artwork_path: layout.artwork_path(),
                catalog_id: record.catalog_id,
                isrc: record.isrc,
                source_external_id: record.source_external_id,
            });
        }

        on_progress(STEP_AUDIO);
        let audio_path = self
            .fetcher
            .fetch(&candidate.external_id, &layout.dir, &layout.audio_stem)
            .await?;
        debug!("Audio for {} stored at {:?}", track.id, audio_path);

        on_progress(STEP_ARTWORK);
        let artwork = self.download_artwork(&matched).await?;
        let artwork_path = layout.artwork_path();
        write_atomic(&artwork_path, &artwork).await?;

        on_progress(STEP_METADATA);
        let record = SongMetadataRecord {
            title: track.name.clone(),
            artist: track.primary_artist.clone(),
            album: track.album_name.clone(),
            duration_ms: track.duration_ms,
            catalog_id: track.id.clone(),
            isrc: track.isrc.clone(),
            artwork_file_name: ARTWORK_FILE_NAME.to_string(),
            source_external_id: candidate.external_id.clone(),
            downloaded_at: Utc::now(),
        };
        write_metadata(&layout.metadata_path(), &record).await?;

        info!(
            "Stored {} - {} ({}) from {}",
            record.artist, record.title, record.catalog_id, candidate.external_id
        );

        Ok(ResolvedSong {
            title: record.title,
            artist: record.artist,
            album: record.album,
            duration_seconds: track.duration_seconds(),
            local_audio_path: audio_path,
            local_artwork_path: artwork_path,
            catalog_id: record.catalog_id,
            isrc: record.isrc,
            source_external_id: record.source_external_id,
        })
    }
}
