//! Audio acquisition with ordered provider fallback.

mod error;
mod fallback;
mod models;
mod primary;
mod public;
mod retry_policy;
mod transfer;

pub use error::{AudioDownloadFailed, ProviderError, ProviderFailure};
pub use fallback::{AudioFetcher, AudioProvider, ProviderFallbackDownloader};
pub use models::{best_audio_stream, AudioStream, ExtractResponse, StreamsResponse};
pub use primary::ExtractionHostProvider;
pub use public::PublicEndpointProvider;
pub use retry_policy::RetryPolicy;
pub use transfer::{
    clear_outputs, extension_for_content_type, find_output, is_audio_content_type,
    normalize_content_type, part_path, sniff_extension, HttpTransport, Probe,
};
