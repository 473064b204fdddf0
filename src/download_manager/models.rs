//! Data models for the download manager.
//!
//! Defines source candidates, queue items, statuses and the records produced
//! once a song is fully stored.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A media reference picked by the user, plus what its listing told us.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCandidate {
    /// Id understood by the audio providers.
    pub external_id: String,
    /// Free-text title as listed by the source.
    pub display_title: String,
    /// Uploader or channel name, if known.
    pub channel_label: Option<String>,
    /// Raw duration text, e.g. "3:45" or "1:02:03".
    pub duration_text: Option<String>,
    /// Derived from `duration_text`.
    pub duration_seconds: Option<f64>,
}

impl SourceCandidate {
    pub fn new(external_id: impl Into<String>, display_title: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            display_title: display_title.into(),
            channel_label: None,
            duration_text: None,
            duration_seconds: None,
        }
    }

    pub fn with_channel(mut self, channel_label: impl Into<String>) -> Self {
        self.channel_label = Some(channel_label.into());
        self
    }

    pub fn with_duration_text(mut self, duration_text: impl Into<String>) -> Self {
        let text = duration_text.into();
        self.duration_seconds = parse_duration_text(&text);
        self.duration_text = Some(text);
        self
    }
}

/// Parse `[[h:]m:]ss` into seconds. Anything else yields `None`.
pub fn parse_duration_text(text: &str) -> Option<f64> {
    let parts: Vec<&str> = text.trim().split(':').collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }

    let mut values = Vec::with_capacity(parts.len());
    for part in &parts {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        values.push(part.parse::<u64>().ok()?);
    }

    // Lower units must stay in range once a larger unit is present
    let n = values.len();
    if n >= 2 && values[n - 1] >= 60 {
        return None;
    }
    if n == 3 && values[1] >= 60 {
        return None;
    }

    let seconds = values.iter().fold(0u64, |acc, v| acc * 60 + v);
    Some(seconds as f64)
}

/// Status of a download queue item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Queued,
    Downloading,
    Retrying,
    Completed, // terminal
    Failed,    // terminal
}

impl QueueStatus {
    /// Returns true if this is a terminal state (Completed or Failed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, QueueStatus::Completed | QueueStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Queued => "queued",
            QueueStatus::Downloading => "downloading",
            QueueStatus::Retrying => "retrying",
            QueueStatus::Completed => "completed",
            QueueStatus::Failed => "failed",
        }
    }
}

/// A single song request in the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    /// Unique identifier (UUID)
    pub id: String,
    /// Candidate the user originally picked
    pub primary_candidate: SourceCandidate,
    /// Candidate currently being attempted
    pub active_candidate: SourceCandidate,
    /// Ordered fallbacks; entries at `current_alternative_index` and beyond are untried
    pub alternative_candidates: Vec<SourceCandidate>,
    pub current_alternative_index: usize,
    pub status: QueueStatus,
    /// Transient human-readable step, e.g. "Downloading audio"
    pub progress_label: Option<String>,
    /// Number of alternatives switched to so far
    pub retry_count: u32,
    pub failure_reason: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl QueueItem {
    pub fn new(primary: SourceCandidate, alternatives: Vec<SourceCandidate>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            active_candidate: primary.clone(),
            primary_candidate: primary,
            alternative_candidates: alternatives,
            current_alternative_index: 0,
            status: QueueStatus::Queued,
            progress_label: None,
            retry_count: 0,
            failure_reason: None,
            added_at: Utc::now(),
        }
    }

    pub fn untried_alternatives(&self) -> &[SourceCandidate] {
        let start = self.current_alternative_index.min(self.alternative_candidates.len());
        &self.alternative_candidates[start..]
    }

    pub fn has_untried_alternatives(&self) -> bool {
        !self.untried_alternatives().is_empty()
    }

    /// Switch to the alternative at absolute index `index` (must be untried).
    ///
    /// The pick moves into `current_alternative_index` with the alternatives
    /// it passes shifted up one, so the untried range stays contiguous and in
    /// its original order. The index then advances past it.
    pub fn switch_to_alternative(&mut self, index: usize) {
        let current = self.current_alternative_index;
        if index < current || index >= self.alternative_candidates.len() {
            return;
        }
        self.alternative_candidates[current..=index].rotate_right(1);
        self.active_candidate = self.alternative_candidates[current].clone();
        self.current_alternative_index = current + 1;
        self.retry_count += 1;
    }

    /// Back to a fresh `queued` state on the primary candidate.
    pub fn reset_for_retry(&mut self) {
        self.status = QueueStatus::Queued;
        self.active_candidate = self.primary_candidate.clone();
        self.current_alternative_index = 0;
        self.retry_count = 0;
        self.failure_reason = None;
        self.progress_label = None;
    }
}

/// A song that has been fully resolved and stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSong {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration_seconds: f64,
    pub local_audio_path: PathBuf,
    pub local_artwork_path: PathBuf,
    pub catalog_id: String,
    pub isrc: Option<String>,
    pub source_external_id: String,
}

/// Per-song record written next to the audio as `metadata.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongMetadataRecord {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration_ms: u64,
    pub catalog_id: String,
    pub isrc: Option<String>,
    pub artwork_file_name: String,
    pub source_external_id: String,
    pub downloaded_at: DateTime<Utc>,
}
