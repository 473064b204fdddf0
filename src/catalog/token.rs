//! Catalog token lifecycle.
//!
//! Credential acquisition belongs to the host application; it plugs in a
//! [`TokenSource`]. The [`TokenCache`] keeps the current token and decides
//! when a fresh one is needed.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::error::CatalogError;
use super::models::CatalogToken;

/// Tokens closer than this to expiry are refreshed before use.
pub const REFRESH_MARGIN_SECS: i64 = 60;

/// Supplier of catalog bearer tokens.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_token(&self) -> Result<CatalogToken, CatalogError>;
}

/// Token source for a pre-provisioned, long-lived token.
pub struct StaticTokenSource {
    access_token: String,
}

impl StaticTokenSource {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn fetch_token(&self) -> Result<CatalogToken, CatalogError> {
        if self.access_token.is_empty() {
            return Err(CatalogError::Auth("no catalog access token configured".into()));
        }
        // Nominal one hour lifetime
        Ok(CatalogToken {
            access_token: self.access_token.clone(),
            expires_at: chrono::Utc::now().timestamp() + 3600,
        })
    }
}

/// Cached token with refresh-before-expiry semantics.
pub struct TokenCache {
    source: Box<dyn TokenSource>,
    current: Mutex<Option<CatalogToken>>,
}

impl TokenCache {
    pub fn new(source: Box<dyn TokenSource>) -> Self {
        Self {
            source,
            current: Mutex::new(None),
        }
    }

    /// Return a usable access token, refreshing it if missing or about to
    /// expire.
    pub async fn get(&self) -> Result<String, CatalogError> {
        let mut current = self.current.lock().await;
        let now = chrono::Utc::now().timestamp();

        if let Some(token) = current.as_ref() {
            if token.expires_at - now >= REFRESH_MARGIN_SECS {
                return Ok(token.access_token.clone());
            }
            debug!(
                "Catalog token expires in {}s, refreshing",
                token.expires_at - now
            );
        }

        let token = self.source.fetch_token().await?;
        info!("Obtained catalog token (expires_at={})", token.expires_at);
        let access_token = token.access_token.clone();
        *current = Some(token);
        Ok(access_token)
    }

    /// Drop the cached token so the next `get` fetches a fresh one.
    pub async fn invalidate(&self) {
        *self.current.lock().await = None;
    }
}
