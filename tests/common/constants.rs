//! Shared constants for end-to-end tests
//!
//! When fixture data changes (catalog ids, media bytes, etc.), update only
//! this file.

// ============================================================================
// Catalog fixture
// ============================================================================

pub const TRACK_ID: &str = "track-1";
pub const TRACK_NAME: &str = "Hells Bells";
pub const TRACK_ARTIST: &str = "AC/DC";
pub const TRACK_ISRC: &str = "AUAP08000044";
pub const TRACK_DURATION_MS: u64 = 312_000;

pub const ALBUM_ID: &str = "album-1";
pub const ALBUM_NAME: &str = "Back in Black";

/// Bytes served as album artwork
pub const ARTWORK_BYTES: &[u8] = b"\xFF\xD8\xFF\xE0fake-jpeg-artwork";

// ============================================================================
// Media fixture
// ============================================================================

/// ID3-tagged payload so content sniffing recognizes it as mp3
pub const AUDIO_BYTES: &[u8] = b"ID3\x03\x00\x00\x00\x00\x00\x00fake-audio-payload";

/// Source id used by the media mocks
pub const SOURCE_ID: &str = "dQw4w9WgXcQ";

/// How long a slow mock host takes to answer metadata calls
pub const SLOW_RESPONSE_SECS: u64 = 5;

/// Maximum time to wait for a mock server to start accepting connections
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;
