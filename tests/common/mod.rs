//! Common test infrastructure
//!
//! Mock catalog and provider servers for end-to-end tests. Tests should only
//! import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{MediaBehavior, MockMediaHost};
//!
//! #[tokio::test]
//! async fn test_host() {
//!     let host = MockMediaHost::spawn(MediaBehavior::Serve).await;
//!     assert_eq!(host.metadata_calls(), 0);
//! }
//! ```

#![allow(dead_code)]

mod catalog;
mod constants;
mod media;
mod server;

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use pezzottify_fetch::config::ProviderSettings;
use pezzottify_fetch::{LibrarySink, ResolvedSong};

// Public API - this is what tests import
pub use catalog::{CatalogFixture, MockCatalog, RecordedRequest, SequenceTokenSource};
pub use constants::*;
pub use media::{MediaBehavior, MockMediaHost, UNKNOWN_SOURCE_PREFIX};

/// Provider settings with no pauses, for the given hosts.
pub fn provider_settings(primary_hosts: &[&MockMediaHost], public: &[&MockMediaHost]) -> ProviderSettings {
    ProviderSettings {
        primary_hosts: primary_hosts.iter().map(|h| h.base_url.clone()).collect(),
        public_endpoints: public.iter().map(|h| h.base_url.clone()).collect(),
        metadata_timeout_sec: 5,
        connect_timeout_sec: 5,
        refetch_backoff_ms: 0,
        ..Default::default()
    }
}

/// Read a file the test expects to exist.
pub fn read(path: &Path) -> Vec<u8> {
    std::fs::read(path).unwrap_or_else(|e| panic!("Failed to read {:?}: {}", path, e))
}

/// Library sink that keeps every song it is handed.
#[derive(Default)]
pub struct CollectingLibrary {
    pub songs: Mutex<Vec<ResolvedSong>>,
}

#[async_trait]
impl LibrarySink for CollectingLibrary {
    async fn add_song(&self, song: ResolvedSong) -> anyhow::Result<()> {
        self.songs.lock().unwrap().push(song);
        Ok(())
    }
}
