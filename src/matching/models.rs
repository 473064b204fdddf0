//! Data models for title parsing and catalog matching.

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogTrack;

/// Placeholder artist used when a title carries no usable artist.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Parser's self-assessed certainty in an artist/track split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

/// Result of decomposing a free-text label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTitle {
    pub artist: String,
    pub track: String,
    pub confidence: Confidence,
}

impl ParsedTitle {
    pub fn new(artist: impl Into<String>, track: impl Into<String>, confidence: Confidence) -> Self {
        Self {
            artist: artist.into(),
            track: track.into(),
            confidence,
        }
    }

    /// The same split with artist and track exchanged.
    pub fn swapped(&self) -> Self {
        Self {
            artist: self.track.clone(),
            track: self.artist.clone(),
            confidence: self.confidence,
        }
    }
}

/// Advisory classification of how well a catalog track fits a title.
///
/// Never gates acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Excellent,
    Good,
    Acceptable,
    Poor,
}

impl QualityTier {
    /// Map accumulated signal points to a tier.
    pub fn from_points(points: u32) -> Self {
        match points {
            p if p >= 5 => QualityTier::Excellent,
            p if p >= 3 => QualityTier::Good,
            2 => QualityTier::Acceptable,
            _ => QualityTier::Poor,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Excellent => "excellent",
            QualityTier::Good => "good",
            QualityTier::Acceptable => "acceptable",
            QualityTier::Poor => "poor",
        }
    }
}

/// Winning catalog candidate for a title.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub track: CatalogTrack,
    pub quality_tier: QualityTier,
    pub score: f64,
    /// Artwork URL resolved through the album/track fallback chain.
    pub artwork_url: String,
}
