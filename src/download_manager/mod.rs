//! Download manager: durable queue, per-song pipeline and on-disk layout.

mod library;
mod manager;
mod models;
mod orchestrator;
mod queue_store;
mod retry_policy;
mod storage;

pub use library::LibrarySink;
pub use manager::{QueueError, QueueManager, RETRYING_LABEL};
pub use models::{
    parse_duration_text, QueueItem, QueueStatus, ResolvedSong, SongMetadataRecord,
    SourceCandidate,
};
pub use orchestrator::{
    DownloadOrchestrator, PipelineError, ProgressReporter, SongProcessor, STEP_ARTWORK,
    STEP_AUDIO, STEP_METADATA, STEP_PREPARING, STEP_RESOLVING,
};
pub use queue_store::{normalize_loaded, JsonQueueStore, QueueStore};
pub use retry_policy::RetryPolicy;
pub use storage::{
    sanitize_component, write_atomic, SongLayout, ARTWORK_FILE_NAME, METADATA_FILE_NAME,
};
