//! Catalog data models.
//!
//! Wire types mirror the catalog's JSON payloads and are converted into the
//! flat snapshots the rest of the pipeline works with.

use serde::{Deserialize, Serialize};

/// Immutable snapshot of a catalog track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogTrack {
    pub id: String,
    pub name: String,
    pub primary_artist: String,
    pub album_name: String,
    pub album_id: String,
    pub duration_ms: u64,
    pub isrc: Option<String>,
    pub artwork_url: Option<String>,
}

impl CatalogTrack {
    pub fn duration_seconds(&self) -> f64 {
        self.duration_ms as f64 / 1000.0
    }
}

/// Album as returned by the album endpoint, reduced to what artwork
/// resolution needs.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogAlbum {
    pub id: String,
    pub name: String,
    pub images: Vec<CatalogImage>,
}

impl CatalogAlbum {
    /// The image with the largest pixel area, if any.
    pub fn largest_image(&self) -> Option<&CatalogImage> {
        largest_image(&self.images)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogImage {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl CatalogImage {
    pub fn area(&self) -> u64 {
        self.width.unwrap_or(0) as u64 * self.height.unwrap_or(0) as u64
    }
}

/// Largest-area image; the first one wins on ties.
pub(crate) fn largest_image(images: &[CatalogImage]) -> Option<&CatalogImage> {
    images
        .iter()
        .enumerate()
        .max_by(|(ia, a), (ib, b)| a.area().cmp(&b.area()).then(ib.cmp(ia)))
        .map(|(_, image)| image)
}

/// Bearer token handed out by the credential collaborator.
#[derive(Debug, Clone)]
pub struct CatalogToken {
    pub access_token: String,
    /// Unix timestamp (seconds) after which the token is no longer valid.
    pub expires_at: i64,
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    pub tracks: TrackPage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrackPage {
    #[serde(default)]
    pub items: Vec<ApiTrack>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiArtist {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiAlbumRef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub images: Vec<CatalogImage>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiExternalIds {
    pub isrc: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiTrack {
    pub id: String,
    pub name: String,
    pub duration_ms: u64,
    #[serde(default)]
    pub artists: Vec<ApiArtist>,
    pub album: ApiAlbumRef,
    #[serde(default)]
    pub external_ids: ApiExternalIds,
}

impl From<ApiTrack> for CatalogTrack {
    fn from(track: ApiTrack) -> Self {
        let artwork_url = largest_image(&track.album.images).map(|i| i.url.clone());
        Self {
            id: track.id,
            name: track.name,
            primary_artist: track
                .artists
                .into_iter()
                .next()
                .map(|a| a.name)
                .unwrap_or_default(),
            album_name: track.album.name,
            album_id: track.album.id,
            duration_ms: track.duration_ms,
            isrc: track.external_ids.isrc,
            artwork_url,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiAlbum {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub images: Vec<CatalogImage>,
}

impl From<ApiAlbum> for CatalogAlbum {
    fn from(album: ApiAlbum) -> Self {
        Self {
            id: album.id,
            name: album.name,
            images: album.images,
        }
    }
}
