//! On-disk layout of stored songs.
//!
//! `root/artist/album/track/` holds `<track>.<ext>`, `cover.jpg` and
//! `metadata.json`. Every file is written to a `.part` sibling first.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::models::SongMetadataRecord;
use crate::downloader::{find_output, part_path};

pub const ARTWORK_FILE_NAME: &str = "cover.jpg";
pub const METADATA_FILE_NAME: &str = "metadata.json";

const RESERVED_CHARS: &[char] = &[':', '/', '\\', '?', '%', '*', '|', '"', '<', '>'];

/// Replace characters that are unsafe in a path component with `_`.
pub fn sanitize_component(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| if RESERVED_CHARS.contains(&c) { '_' } else { c })
        .collect();

    match sanitized.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => sanitized,
    }
}

/// Where the files of one song live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongLayout {
    pub dir: PathBuf,
    /// File stem shared by all audio container variants.
    pub audio_stem: String,
}

impl SongLayout {
    pub fn new(root: &Path, artist: &str, album: &str, track: &str) -> Self {
        let track = sanitize_component(track);
        Self {
            dir: root
                .join(sanitize_component(artist))
                .join(sanitize_component(album))
                .join(&track),
            audio_stem: track,
        }
    }

    pub fn artwork_path(&self) -> PathBuf {
        self.dir.join(ARTWORK_FILE_NAME)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join(METADATA_FILE_NAME)
    }

    pub async fn create_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create song directory {:?}", self.dir))
    }

    /// The stored record and audio path, if the directory already holds a
    /// complete set for `catalog_id`.
    pub async fn existing_complete_set(
        &self,
        catalog_id: &str,
        extensions: &[String],
    ) -> Option<(SongMetadataRecord, PathBuf)> {
        let raw = tokio::fs::read(self.metadata_path()).await.ok()?;
        let record: SongMetadataRecord = serde_json::from_slice(&raw).ok()?;
        if record.catalog_id != catalog_id {
            debug!(
                "Stored record in {:?} belongs to {}, not {}",
                self.dir, record.catalog_id, catalog_id
            );
            return None;
        }

        let artwork = tokio::fs::metadata(self.artwork_path()).await.ok()?;
        if !artwork.is_file() || artwork.len() == 0 {
            return None;
        }

        let audio = find_output(&self.dir, &self.audio_stem, extensions).await?;
        Some((record, audio))
    }
}

/// Write `bytes` to `path` through a flushed `.part` sibling and a rename.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let part = part_path(path);
    let result = write_and_promote(&part, path, bytes).await;
    if result.is_err() {
        let _ = tokio::fs::remove_file(&part).await;
    }
    result
}

async fn write_and_promote(part: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = tokio::fs::File::create(part)
        .await
        .with_context(|| format!("Failed to create {:?}", part))?;
    file.write_all(bytes)
        .await
        .with_context(|| format!("Failed to write {:?}", part))?;
    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(part, path)
        .await
        .with_context(|| format!("Failed to move {:?} into place", part))
}

pub async fn write_metadata(path: &Path, record: &SongMetadataRecord) -> Result<()> {
    let json = serde_json::to_vec_pretty(record).context("Failed to serialize song metadata")?;
    write_atomic(path, &json).await
}
