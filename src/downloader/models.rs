//! Wire types for the audio providers.

use serde::Deserialize;

/// Response of a primary host's extraction endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractResponse {
    /// Short-lived signed media URL.
    pub url: String,
    /// Container extension hint, e.g. "m4a" or "webm".
    #[serde(default)]
    pub ext: Option<String>,
}

/// Stream listing returned by a public endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamsResponse {
    #[serde(default)]
    pub audio_streams: Vec<AudioStream>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioStream {
    pub url: String,
    #[serde(default)]
    pub bitrate: u64,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub video_only: bool,
}

impl AudioStream {
    pub fn is_audio_only(&self) -> bool {
        !self.video_only && self.mime_type.to_ascii_lowercase().starts_with("audio/")
    }
}

/// Highest-bitrate audio-only stream, first one on ties.
pub fn best_audio_stream(streams: &[AudioStream]) -> Option<&AudioStream> {
    streams
        .iter()
        .filter(|s| s.is_audio_only())
        .fold(None, |best: Option<&AudioStream>, s| match best {
            Some(b) if b.bitrate >= s.bitrate => Some(b),
            _ => Some(s),
        })
}
