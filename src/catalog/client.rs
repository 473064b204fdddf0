//! HTTP client for the external metadata catalog.
//!
//! Provides authenticated search and lookup, plus artwork downloads.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, warn};

use super::error::CatalogError;
use super::models::*;
use super::token::{TokenCache, TokenSource};

/// Operations the matching pipeline needs from the catalog.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Search tracks by an (artist, track) pair. Results are in catalog order.
    async fn search_by_artist_track(
        &self,
        artist: &str,
        track: &str,
    ) -> Result<Vec<CatalogTrack>, CatalogError>;

    /// Free-text track search.
    async fn search_by_title(&self, title: &str) -> Result<Vec<CatalogTrack>, CatalogError>;

    async fn fetch_album(&self, album_id: &str) -> Result<CatalogAlbum, CatalogError>;

    async fn fetch_track(&self, track_id: &str) -> Result<CatalogTrack, CatalogError>;

    /// Download raw image bytes.
    async fn download_artwork(&self, url: &str) -> Result<Vec<u8>, CatalogError>;
}

/// Client for the catalog's Web API.
///
/// Every authenticated call goes through [`CatalogClient::get_authorized`],
/// which transparently re-authenticates once on a 401.
pub struct CatalogClient {
    client: Client,
    base_url: String,
    search_limit: usize,
    tokens: TokenCache,
}

impl CatalogClient {
    /// Create a new CatalogClient.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the catalog API (e.g., "https://api.example.com/v1")
    /// * `timeout_sec` - Request timeout in seconds
    /// * `search_limit` - Maximum number of results per search
    /// * `token_source` - Supplier of bearer tokens
    pub fn new(
        base_url: impl Into<String>,
        timeout_sec: u64,
        search_limit: usize,
        token_source: Box<dyn TokenSource>,
    ) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .map_err(|e| CatalogError::Connection(e.to_string()))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            search_limit,
            tokens: TokenCache::new(token_source),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Return a valid access token, refreshing it when close to expiry.
    pub async fn authenticate(&self) -> Result<String, CatalogError> {
        self.tokens.get().await
    }

    async fn send(
        &self,
        url: &str,
        query: &[(&str, String)],
        token: &str,
    ) -> Result<Response, CatalogError> {
        Ok(self
            .client
            .get(url)
            .query(query)
            .bearer_auth(token)
            .send()
            .await?)
    }

    /// Authenticated GET with exactly one transparent re-auth on 401.
    async fn get_authorized(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Response, CatalogError> {
        let token = self.authenticate().await?;
        let response = self.send(url, query, &token).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return ensure_success(response).await;
        }

        warn!("Catalog rejected token for {}, re-authenticating", url);
        self.tokens.invalidate().await;
        let token = self.authenticate().await?;
        let response = self.send(url, query, &token).await?;
        ensure_success(response).await
    }

    async fn search(&self, q: String) -> Result<Vec<CatalogTrack>, CatalogError> {
        debug!("Catalog search: {}", q);
        let url = format!("{}/search", self.base_url);
        let query = [
            ("q", q),
            ("type", "track".to_string()),
            ("limit", self.search_limit.to_string()),
        ];
        let response = self.get_authorized(&url, &query).await?;
        let search: SearchResponse = response.json().await?;
        Ok(search.tracks.items.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl CatalogApi for CatalogClient {
    async fn search_by_artist_track(
        &self,
        artist: &str,
        track: &str,
    ) -> Result<Vec<CatalogTrack>, CatalogError> {
        self.search(artist_track_query(artist, track)).await
    }

    async fn search_by_title(&self, title: &str) -> Result<Vec<CatalogTrack>, CatalogError> {
        self.search(title.to_string()).await
    }

    async fn fetch_album(&self, album_id: &str) -> Result<CatalogAlbum, CatalogError> {
        let url = format!(
            "{}/albums/{}",
            self.base_url,
            urlencoding::encode(album_id)
        );
        let response = self.get_authorized(&url, &[]).await?;
        let album: ApiAlbum = response.json().await?;
        Ok(album.into())
    }

    async fn fetch_track(&self, track_id: &str) -> Result<CatalogTrack, CatalogError> {
        let url = format!(
            "{}/tracks/{}",
            self.base_url,
            urlencoding::encode(track_id)
        );
        let response = self.get_authorized(&url, &[]).await?;
        let track: ApiTrack = response.json().await?;
        Ok(track.into())
    }

    async fn download_artwork(&self, url: &str) -> Result<Vec<u8>, CatalogError> {
        // Artwork is served from a public CDN, no bearer token
        let response = ensure_success(self.client.get(url).send().await?).await?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(CatalogError::Parse(format!("empty artwork body from {}", url)));
        }
        Ok(bytes.to_vec())
    }
}

/// Field-filtered search query. Quotes inside values would end the filter
/// early, so they are dropped.
fn artist_track_query(artist: &str, track: &str) -> String {
    format!(
        "artist:\"{}\" track:\"{}\"",
        artist.replace('"', ""),
        track.replace('"', "")
    )
}

async fn ensure_success(response: Response) -> Result<Response, CatalogError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(CatalogError::Status {
        status: status.as_u16(),
        message,
    })
}
