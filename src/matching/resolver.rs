//! Multi-strategy catalog matching.
//!
//! Strategies, each attempted only when the previous one came back empty:
//! 1. search by (artist, track) as parsed
//! 2. search by (track, artist), since labels are frequently inverted
//! 3. search by the raw title
//!
//! Strategies 1 and 2 are skipped for low confidence parses. The first
//! non-empty result set is scored and its best candidate always wins.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogApi, CatalogTrack};

use super::models::{Confidence, MatchResult, ParsedTitle, QualityTier};
use super::similarity::similarity;
use super::title_parser::TitleParser;

const ARTIST_WEIGHT: f64 = 0.6;
const TRACK_WEIGHT: f64 = 0.4;

/// Errors surfaced once every matching strategy is exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("No catalog match found for \"{0}\"")]
    NoMatchFound(String),

    #[error("No artwork available for catalog track {0}")]
    ArtworkRequired(String),
}

/// Resolves a free-text label to a catalog track.
#[async_trait]
pub trait TrackResolver: Send + Sync {
    async fn resolve_title(
        &self,
        raw_title: &str,
        channel_label: Option<&str>,
        expected_duration_seconds: Option<f64>,
    ) -> Result<MatchResult, ResolveError>;
}

/// Catalog matcher built on [`TitleParser`] and a [`CatalogApi`].
pub struct MatchResolver {
    catalog: Arc<dyn CatalogApi>,
}

impl MatchResolver {
    pub fn new(catalog: Arc<dyn CatalogApi>) -> Self {
        Self { catalog }
    }

    /// Resolve a raw title, optionally weighting the match by duration.
    pub async fn resolve(
        &self,
        raw_title: &str,
        expected_duration_seconds: Option<f64>,
    ) -> Result<MatchResult, ResolveError> {
        self.resolve_with_channel(raw_title, None, expected_duration_seconds)
            .await
    }

    /// Like [`MatchResolver::resolve`], with the uploader's channel label
    /// available to validate the artist/track split.
    pub async fn resolve_with_channel(
        &self,
        raw_title: &str,
        channel_label: Option<&str>,
        expected_duration_seconds: Option<f64>,
    ) -> Result<MatchResult, ResolveError> {
        let parsed = TitleParser::parse_with_channel(raw_title, channel_label);
        debug!(
            "Parsed \"{}\" as artist=\"{}\" track=\"{}\" ({})",
            raw_title,
            parsed.artist,
            parsed.track,
            parsed.confidence.as_str()
        );

        let candidates = self.find_candidates(raw_title, &parsed).await;
        if candidates.is_empty() {
            info!("No catalog candidates for \"{}\"", raw_title);
            return Err(ResolveError::NoMatchFound(raw_title.to_string()));
        }

        let (best, score) = pick_best(&parsed, &candidates);
        let quality_tier = quality_tier(&parsed, best, expected_duration_seconds);
        let mut track = best.clone();

        let artwork_url = self.resolve_artwork(&track).await?;
        track.artwork_url = Some(artwork_url.clone());

        info!(
            "Matched \"{}\" to {} - {} ({}, score={:.3}, quality={})",
            raw_title,
            track.primary_artist,
            track.name,
            track.id,
            score,
            quality_tier.as_str()
        );

        Ok(MatchResult {
            track,
            quality_tier,
            score,
            artwork_url,
        })
    }

    /// Run the search strategies in order and return the first non-empty
    /// result set. Search failures count as empty results.
    async fn find_candidates(&self, raw_title: &str, parsed: &ParsedTitle) -> Vec<CatalogTrack> {
        if parsed.confidence == Confidence::Low {
            debug!("Low confidence parse, going straight to title search");
        } else {
            let found = self.search_pair(&parsed.artist, &parsed.track).await;
            if !found.is_empty() {
                return found;
            }

            let found = self.search_pair(&parsed.track, &parsed.artist).await;
            if !found.is_empty() {
                debug!("Swapped artist/track search matched");
                return found;
            }
        }

        match self.catalog.search_by_title(raw_title).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Title search failed for \"{}\": {}", raw_title, e);
                Vec::new()
            }
        }
    }

    async fn search_pair(&self, artist: &str, track: &str) -> Vec<CatalogTrack> {
        match self.catalog.search_by_artist_track(artist, track).await {
            Ok(found) => found,
            Err(e) => {
                warn!(
                    "Artist/track search failed for \"{}\" / \"{}\": {}",
                    artist, track, e
                );
                Vec::new()
            }
        }
    }

    /// Artwork is mandatory: album endpoint's largest image, then the track
    /// endpoint's image, otherwise the match is unusable.
    async fn resolve_artwork(&self, track: &CatalogTrack) -> Result<String, ResolveError> {
        match self.catalog.fetch_album(&track.album_id).await {
            Ok(album) => {
                if let Some(image) = album.largest_image() {
                    return Ok(image.url.clone());
                }
                debug!("Album {} has no images", track.album_id);
            }
            Err(e) => warn!("Failed to fetch album {}: {}", track.album_id, e),
        }

        match self.catalog.fetch_track(&track.id).await {
            Ok(full) => {
                if let Some(url) = full.artwork_url {
                    return Ok(url);
                }
                debug!("Track {} has no images", track.id);
            }
            Err(e) => warn!("Failed to fetch track {}: {}", track.id, e),
        }

        Err(ResolveError::ArtworkRequired(track.id.clone()))
    }
}

#[async_trait]
impl TrackResolver for MatchResolver {
    async fn resolve_title(
        &self,
        raw_title: &str,
        channel_label: Option<&str>,
        expected_duration_seconds: Option<f64>,
    ) -> Result<MatchResult, ResolveError> {
        self.resolve_with_channel(raw_title, channel_label, expected_duration_seconds)
            .await
    }
}

/// Weighted artist/track similarity of a candidate against the parse.
pub fn match_score(parsed: &ParsedTitle, candidate: &CatalogTrack) -> f64 {
    ARTIST_WEIGHT * similarity(&parsed.artist, &candidate.primary_artist)
        + TRACK_WEIGHT * similarity(&parsed.track, &candidate.name)
}

/// Highest score wins; on ties the earlier catalog entry is kept.
/// `candidates` must not be empty.
fn pick_best<'a>(parsed: &ParsedTitle, candidates: &'a [CatalogTrack]) -> (&'a CatalogTrack, f64) {
    let mut best = (&candidates[0], match_score(parsed, &candidates[0]));
    for candidate in &candidates[1..] {
        let score = match_score(parsed, candidate);
        if score > best.1 {
            best = (candidate, score);
        }
    }
    best
}

/// Advisory quality classification from duration and similarity signals.
pub fn quality_tier(
    parsed: &ParsedTitle,
    candidate: &CatalogTrack,
    expected_duration_seconds: Option<f64>,
) -> QualityTier {
    let mut points = 0;

    if let Some(expected) = expected_duration_seconds {
        let diff = (candidate.duration_seconds() - expected).abs();
        if diff < 2.0 {
            points += 3;
        } else if diff < 5.0 {
            points += 1;
        }
    }

    points += similarity_points(similarity(&parsed.artist, &candidate.primary_artist));
    points += similarity_points(similarity(&parsed.track, &candidate.name));

    QualityTier::from_points(points)
}

fn similarity_points(value: f64) -> u32 {
    if value > 0.7 {
        2
    } else if value > 0.4 {
        1
    } else {
        0
    }
}
