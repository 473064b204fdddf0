//! Queue manager and its single sequential worker.
//!
//! All queue mutation goes through one `tokio::sync::Mutex`. The worker
//! processes one item at a time, in queue order, and persists the queue after
//! every state change. Progress labels reported by the processor travel
//! through an unbounded channel to a single consumer task that applies them
//! under the same lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::QueueSettings;

use super::library::LibrarySink;
use super::models::{QueueItem, QueueStatus, SourceCandidate};
use super::orchestrator::{ProgressReporter, SongProcessor};
use super::queue_store::QueueStore;
use super::retry_policy::RetryPolicy;

pub const RETRYING_LABEL: &str = "Retrying with alternative";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("Queue item not found: {0}")]
    NotFound(String),

    #[error("Queue item {0} is being processed")]
    InFlight(String),
}

#[derive(Debug)]
struct ProgressEvent {
    item_id: String,
    label: String,
}

#[derive(Debug, Default)]
struct QueueState {
    items: Vec<QueueItem>,
    in_flight: Option<String>,
}

impl QueueState {
    fn find_mut(&mut self, id: &str) -> Option<&mut QueueItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    fn is_in_flight(&self, id: &str) -> bool {
        self.in_flight.as_deref() == Some(id)
    }
}

struct Inner {
    state: Arc<Mutex<QueueState>>,
    store: Arc<dyn QueueStore>,
    processor: Arc<dyn SongProcessor>,
    library: Arc<dyn LibrarySink>,
    policy: RetryPolicy,
    pacing: Duration,
    running: AtomicBool,
    shutdown: CancellationToken,
    progress_tx: mpsc::UnboundedSender<ProgressEvent>,
}

/// Durable song download queue.
///
/// Must be created inside a tokio runtime.
pub struct QueueManager {
    inner: Arc<Inner>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl QueueManager {
    /// Load the persisted queue and set up the progress consumer.
    ///
    /// The worker is not started until [`QueueManager::start`], an enqueue or
    /// a retry.
    pub async fn open(
        store: Arc<dyn QueueStore>,
        processor: Arc<dyn SongProcessor>,
        library: Arc<dyn LibrarySink>,
        settings: &QueueSettings,
    ) -> Result<Self> {
        let items = store.load()?;
        let state = Arc::new(Mutex::new(QueueState {
            items,
            in_flight: None,
        }));

        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        tokio::spawn(consume_progress(state.clone(), store.clone(), progress_rx));

        Ok(Self {
            inner: Arc::new(Inner {
                state,
                store,
                processor,
                library,
                policy: RetryPolicy::new(settings),
                pacing: settings.pacing(),
                running: AtomicBool::new(false),
                shutdown: CancellationToken::new(),
                progress_tx,
            }),
            worker: Mutex::new(None),
        })
    }

    /// Append a request and make sure the worker is running.
    pub async fn enqueue(
        &self,
        primary: SourceCandidate,
        alternatives: Vec<SourceCandidate>,
    ) -> String {
        let item = QueueItem::new(primary, alternatives);
        let id = item.id.clone();
        info!(
            "Enqueued {} \"{}\" with {} alternatives",
            id,
            item.primary_candidate.display_title,
            item.alternative_candidates.len()
        );

        {
            let mut state = self.inner.state.lock().await;
            state.items.push(item);
            self.inner.persist(&state);
        }

        self.start().await;
        id
    }

    /// Remove a single item. The in-flight item cannot be removed.
    pub async fn remove(&self, id: &str) -> Result<(), QueueError> {
        let mut state = self.inner.state.lock().await;
        if state.is_in_flight(id) {
            return Err(QueueError::InFlight(id.to_string()));
        }
        let before = state.items.len();
        state.items.retain(|item| item.id != id);
        if state.items.len() == before {
            return Err(QueueError::NotFound(id.to_string()));
        }
        self.inner.persist(&state);
        Ok(())
    }

    /// Remove everything except the in-flight item. Returns the number removed.
    pub async fn clear(&self) -> usize {
        let mut state = self.inner.state.lock().await;
        let in_flight = state.in_flight.clone();
        let before = state.items.len();
        state
            .items
            .retain(|item| in_flight.as_deref() == Some(item.id.as_str()));
        let removed = before - state.items.len();
        self.inner.persist(&state);
        removed
    }

    /// Remove completed and failed items. Returns the number removed.
    pub async fn clear_finished(&self) -> usize {
        let mut state = self.inner.state.lock().await;
        let before = state.items.len();
        state.items.retain(|item| !item.status.is_terminal());
        let removed = before - state.items.len();
        if removed > 0 {
            self.inner.persist(&state);
        }
        removed
    }

    /// Put every failed item back in line on its primary candidate.
    /// Returns the number of items re-queued.
    pub async fn retry_failed(&self) -> usize {
        let count = {
            let mut state = self.inner.state.lock().await;
            let mut count = 0;
            for item in state
                .items
                .iter_mut()
                .filter(|item| item.status == QueueStatus::Failed)
            {
                item.reset_for_retry();
                count += 1;
            }
            if count > 0 {
                self.inner.persist(&state);
            }
            count
        };

        if count > 0 {
            info!("Re-queued {} failed items", count);
            self.start().await;
        }
        count
    }

    /// Snapshot of the queue, in order.
    pub async fn items(&self) -> Vec<QueueItem> {
        self.inner.state.lock().await.items.clone()
    }

    pub async fn get(&self, id: &str) -> Option<QueueItem> {
        self.inner
            .state
            .lock()
            .await
            .items
            .iter()
            .find(|item| item.id == id)
            .cloned()
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Start the worker. No-op if it is already running or after shutdown.
    pub async fn start(&self) {
        if self.inner.shutdown.is_cancelled() {
            debug!("Queue manager shut down, not starting worker");
            return;
        }
        if self
            .inner
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let handle = tokio::spawn(run_worker(self.inner.clone()));
        *self.worker.lock().await = Some(handle);
    }

    /// Wait until the worker has run out of queued items.
    pub async fn wait_idle(&self) {
        loop {
            let handle = self.worker.lock().await.take();
            match handle {
                Some(handle) => {
                    if let Err(e) = handle.await {
                        error!("Queue worker panicked: {}", e);
                    }
                }
                None => return,
            }
        }
    }

    /// Stop the worker once the current item is done, and wait for it.
    pub async fn shutdown(&self) {
        info!("Queue manager shutting down");
        self.inner.shutdown.cancel();
        self.wait_idle().await;
    }
}

impl Inner {
    fn persist(&self, state: &QueueState) {
        persist_items(self.store.as_ref(), &state.items);
    }

    /// Claim the first queued item, or mark the worker stopped if there is none.
    async fn claim_next(&self) -> Option<(String, SourceCandidate)> {
        let mut state = self.state.lock().await;
        let Some(item) = state
            .items
            .iter_mut()
            .find(|item| item.status == QueueStatus::Queued)
        else {
            // Cleared under the lock so a concurrent enqueue restarts us
            self.running.store(false, Ordering::SeqCst);
            return None;
        };

        item.status = QueueStatus::Downloading;
        item.progress_label = None;
        let claimed = (item.id.clone(), item.active_candidate.clone());
        state.in_flight = Some(claimed.0.clone());
        self.persist(&state);
        Some(claimed)
    }

    fn reporter_for(&self, item_id: &str) -> ProgressReporter {
        let tx = self.progress_tx.clone();
        let item_id = item_id.to_string();
        Arc::new(move |label: &str| {
            let _ = tx.send(ProgressEvent {
                item_id: item_id.clone(),
                label: label.to_string(),
            });
        })
    }

    async fn process_item(&self, id: &str, candidate: &SourceCandidate) {
        info!(
            "Processing {} \"{}\" ({})",
            id, candidate.display_title, candidate.external_id
        );

        match self.processor.process(candidate, self.reporter_for(id)).await {
            Ok(song) => {
                {
                    let mut state = self.state.lock().await;
                    state.in_flight = None;
                    if let Some(item) = state.find_mut(id) {
                        item.status = QueueStatus::Completed;
                        item.progress_label = None;
                        item.failure_reason = None;
                    }
                    self.persist(&state);
                }
                info!("Completed {}: {} - {}", id, song.artist, song.title);

                if let Err(e) = self.library.add_song(song).await {
                    error!("Library rejected song for {}: {:#}", id, e);
                }
            }
            Err(e) => self.handle_failure(id, e.to_string()).await,
        }
    }

    async fn handle_failure(&self, id: &str, reason: String) {
        let mut state = self.state.lock().await;
        state.in_flight = None;
        let Some(item) = state.find_mut(id) else {
            warn!("Queue item {} vanished while in flight", id);
            return;
        };

        let next = if self.policy.should_retry(item) {
            self.policy.select_alternative(item)
        } else {
            None
        };

        match next {
            Some(index) => {
                item.switch_to_alternative(index);
                item.status = QueueStatus::Retrying;
                item.progress_label = Some(RETRYING_LABEL.to_string());
                item.failure_reason = Some(reason.clone());
                warn!(
                    "Attempt for {} failed ({}), retry {}/{} with alternative {}",
                    id,
                    reason,
                    item.retry_count,
                    self.policy.max_retries,
                    item.active_candidate.external_id
                );
                self.persist(&state);

                if let Some(item) = state.find_mut(id) {
                    item.status = QueueStatus::Queued;
                }
                self.persist(&state);
            }
            None => {
                item.status = QueueStatus::Failed;
                item.progress_label = None;
                item.failure_reason = Some(reason.clone());
                error!("Queue item {} failed: {}", id, reason);
                self.persist(&state);
            }
        }
    }
}

async fn run_worker(inner: Arc<Inner>) {
    info!("Queue worker started (pacing={}ms)", inner.pacing.as_millis());

    loop {
        if inner.shutdown.is_cancelled() {
            inner.running.store(false, Ordering::SeqCst);
            info!("Queue worker stopping on shutdown");
            break;
        }

        let Some((id, candidate)) = inner.claim_next().await else {
            info!("Queue worker idle, no queued items left");
            break;
        };

        inner.process_item(&id, &candidate).await;

        if !inner.pacing.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(inner.pacing) => {}
                _ = inner.shutdown.cancelled() => {}
            }
        }
    }
}

fn persist_items(store: &dyn QueueStore, items: &[QueueItem]) {
    if let Err(e) = store.save(items) {
        error!("Failed to persist download queue: {:#}", e);
    }
}

async fn consume_progress(
    state: Arc<Mutex<QueueState>>,
    store: Arc<dyn QueueStore>,
    mut rx: mpsc::UnboundedReceiver<ProgressEvent>,
) {
    while let Some(event) = rx.recv().await {
        let mut state = state.lock().await;
        let Some(item) = state.find_mut(&event.item_id) else {
            continue;
        };
        // Late labels must not overwrite a finished state
        if item.status != QueueStatus::Downloading {
            continue;
        }
        item.progress_label = Some(event.label);
        persist_items(store.as_ref(), &state.items);
    }
    debug!("Progress consumer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download_manager::models::ResolvedSong;
    use crate::download_manager::orchestrator::PipelineError;
    use crate::download_manager::queue_store::JsonQueueStore;
    use crate::downloader::AudioDownloadFailed;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use tokio::sync::Notify;

    /// Succeeds for ids in `good`, fails with an audio error for the rest.
    struct ScriptedProcessor {
        good: HashSet<String>,
        seen: std::sync::Mutex<Vec<String>>,
    }

    impl ScriptedProcessor {
        fn new(good: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                good: good.iter().map(|s| s.to_string()).collect(),
                seen: std::sync::Mutex::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    fn song_for(candidate: &SourceCandidate) -> ResolvedSong {
        ResolvedSong {
            title: candidate.display_title.clone(),
            artist: "Artist".into(),
            album: "Album".into(),
            duration_seconds: 200.0,
            local_audio_path: PathBuf::from("/music/a.m4a"),
            local_artwork_path: PathBuf::from("/music/cover.jpg"),
            catalog_id: "cat".into(),
            isrc: None,
            source_external_id: candidate.external_id.clone(),
        }
    }

    #[async_trait]
    impl SongProcessor for ScriptedProcessor {
        async fn process(
            &self,
            candidate: &SourceCandidate,
            on_progress: ProgressReporter,
        ) -> Result<ResolvedSong, PipelineError> {
            self.seen.lock().unwrap().push(candidate.external_id.clone());
            on_progress("Downloading audio");
            if self.good.contains(&candidate.external_id) {
                Ok(song_for(candidate))
            } else {
                Err(PipelineError::AudioDownloadFailed(AudioDownloadFailed {
                    source_id: candidate.external_id.clone(),
                    reasons: vec![],
                }))
            }
        }
    }

    #[derive(Default)]
    struct RecordingLibrary {
        songs: std::sync::Mutex<Vec<ResolvedSong>>,
        fail: bool,
    }

    #[async_trait]
    impl LibrarySink for RecordingLibrary {
        async fn add_song(&self, song: ResolvedSong) -> Result<()> {
            self.songs.lock().unwrap().push(song);
            if self.fail {
                anyhow::bail!("library offline");
            }
            Ok(())
        }
    }

    fn settings() -> QueueSettings {
        QueueSettings {
            pacing_ms: 0,
            ..Default::default()
        }
    }

    fn candidate(id: &str) -> SourceCandidate {
        SourceCandidate::new(id, format!("Artist - Song {}", id))
    }

    async fn manager_with(
        dir: &TempDir,
        processor: Arc<dyn SongProcessor>,
        library: Arc<dyn LibrarySink>,
    ) -> QueueManager {
        let store = Arc::new(JsonQueueStore::new(dir.path().join("download_queue.json")));
        QueueManager::open(store, processor, library, &settings())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_completes_via_second_alternative() {
        let dir = TempDir::new().unwrap();
        let processor = ScriptedProcessor::new(&["alt-2"]);
        let library = Arc::new(RecordingLibrary::default());
        let manager = manager_with(&dir, processor.clone(), library.clone()).await;

        let id = manager
            .enqueue(candidate("primary"), vec![candidate("alt-1"), candidate("alt-2")])
            .await;
        manager.wait_idle().await;

        let item = manager.get(&id).await.unwrap();
        assert_eq!(item.status, QueueStatus::Completed);
        assert_eq!(item.retry_count, 2);
        assert_eq!(item.active_candidate.external_id, "alt-2");
        assert!(item.failure_reason.is_none());
        assert_eq!(processor.seen(), vec!["primary", "alt-1", "alt-2"]);

        let songs = library.songs.lock().unwrap();
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].source_external_id, "alt-2");
    }

    #[tokio::test]
    async fn test_fails_without_alternatives() {
        let dir = TempDir::new().unwrap();
        let processor = ScriptedProcessor::new(&[]);
        let library = Arc::new(RecordingLibrary::default());
        let manager = manager_with(&dir, processor, library.clone()).await;

        let id = manager.enqueue(candidate("primary"), vec![]).await;
        manager.wait_idle().await;

        let item = manager.get(&id).await.unwrap();
        assert_eq!(item.status, QueueStatus::Failed);
        assert_eq!(item.retry_count, 0);
        assert_eq!(
            item.failure_reason.as_deref(),
            Some("No audio providers configured for primary")
        );
        assert!(library.songs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_max_retries_bounds_alternatives() {
        let dir = TempDir::new().unwrap();
        let processor = ScriptedProcessor::new(&["alt-4"]);
        let manager =
            manager_with(&dir, processor.clone(), Arc::new(RecordingLibrary::default())).await;

        let alternatives = (1..=4).map(|i| candidate(&format!("alt-{}", i))).collect();
        let id = manager.enqueue(candidate("primary"), alternatives).await;
        manager.wait_idle().await;

        let item = manager.get(&id).await.unwrap();
        assert_eq!(item.status, QueueStatus::Failed);
        assert_eq!(item.retry_count, 3);
        assert_eq!(processor.seen().len(), 4);
    }

    #[tokio::test]
    async fn test_items_processed_in_order() {
        let dir = TempDir::new().unwrap();
        let processor = ScriptedProcessor::new(&["a", "b", "c"]);
        let manager =
            manager_with(&dir, processor.clone(), Arc::new(RecordingLibrary::default())).await;

        manager.enqueue(candidate("a"), vec![]).await;
        manager.enqueue(candidate("b"), vec![]).await;
        manager.enqueue(candidate("c"), vec![]).await;
        manager.wait_idle().await;

        assert_eq!(processor.seen(), vec!["a", "b", "c"]);
        assert!(manager
            .items()
            .await
            .iter()
            .all(|i| i.status == QueueStatus::Completed));
        assert!(!manager.is_running());
    }

    #[tokio::test]
    async fn test_library_failure_keeps_item_completed() {
        let dir = TempDir::new().unwrap();
        let library = Arc::new(RecordingLibrary {
            fail: true,
            ..Default::default()
        });
        let manager = manager_with(&dir, ScriptedProcessor::new(&["a"]), library).await;

        let id = manager.enqueue(candidate("a"), vec![]).await;
        manager.wait_idle().await;

        assert_eq!(manager.get(&id).await.unwrap().status, QueueStatus::Completed);
    }

    #[tokio::test]
    async fn test_retry_failed_resets_and_reprocesses() {
        let dir = TempDir::new().unwrap();
        let processor = ScriptedProcessor::new(&[]);
        let manager =
            manager_with(&dir, processor.clone(), Arc::new(RecordingLibrary::default())).await;

        let id = manager.enqueue(candidate("p"), vec![candidate("alt")]).await;
        manager.wait_idle().await;
        assert_eq!(manager.get(&id).await.unwrap().status, QueueStatus::Failed);

        assert_eq!(manager.retry_failed().await, 1);
        manager.wait_idle().await;

        let item = manager.get(&id).await.unwrap();
        assert_eq!(item.status, QueueStatus::Failed);
        assert_eq!(item.retry_count, 1);
        assert_eq!(processor.seen(), vec!["p", "alt", "p", "alt"]);
        assert_eq!(manager.retry_failed().await, 1);
    }

    #[tokio::test]
    async fn test_clear_finished_and_remove() {
        let dir = TempDir::new().unwrap();
        let manager = manager_with(
            &dir,
            ScriptedProcessor::new(&["ok"]),
            Arc::new(RecordingLibrary::default()),
        )
        .await;

        let ok = manager.enqueue(candidate("ok"), vec![]).await;
        manager.enqueue(candidate("bad"), vec![]).await;
        manager.wait_idle().await;

        assert_eq!(
            manager.remove("missing").await,
            Err(QueueError::NotFound("missing".to_string()))
        );
        assert_eq!(manager.remove(&ok).await, Ok(()));
        assert_eq!(manager.clear_finished().await, 1);
        assert!(manager.items().await.is_empty());
    }

    #[tokio::test]
    async fn test_state_is_persisted() {
        let dir = TempDir::new().unwrap();
        let manager = manager_with(
            &dir,
            ScriptedProcessor::new(&[]),
            Arc::new(RecordingLibrary::default()),
        )
        .await;
        let id = manager.enqueue(candidate("x"), vec![]).await;
        manager.wait_idle().await;

        let store = JsonQueueStore::new(dir.path().join("download_queue.json"));
        let stored = store.load().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, id);
        assert_eq!(stored[0].status, QueueStatus::Failed);
    }

    /// Blocks inside `process` until released, to observe in-flight state.
    struct GatedProcessor {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl SongProcessor for GatedProcessor {
        async fn process(
            &self,
            candidate: &SourceCandidate,
            on_progress: ProgressReporter,
        ) -> Result<ResolvedSong, PipelineError> {
            on_progress("Downloading audio");
            self.entered.notify_one();
            self.release.notified().await;
            Ok(song_for(candidate))
        }
    }

    #[tokio::test]
    async fn test_in_flight_item_is_protected_and_labelled() {
        let dir = TempDir::new().unwrap();
        let processor = Arc::new(GatedProcessor {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let manager =
            manager_with(&dir, processor.clone(), Arc::new(RecordingLibrary::default())).await;

        let first = manager.enqueue(candidate("first"), vec![]).await;
        let second = manager.enqueue(candidate("second"), vec![]).await;
        processor.entered.notified().await;

        // The progress consumer applies labels asynchronously
        let mut label = None;
        for _ in 0..100 {
            label = manager.get(&first).await.and_then(|i| i.progress_label);
            if label.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(label.as_deref(), Some("Downloading audio"));
        assert_eq!(
            manager.get(&first).await.unwrap().status,
            QueueStatus::Downloading
        );

        assert_eq!(
            manager.remove(&first).await,
            Err(QueueError::InFlight(first.clone()))
        );
        assert_eq!(manager.clear().await, 1);
        let remaining = manager.items().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, first);
        assert!(manager.get(&second).await.is_none());

        processor.release.notify_one();
        manager.wait_idle().await;
        assert_eq!(
            manager.get(&first).await.unwrap().status,
            QueueStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_progress_label_is_persisted() {
        let dir = TempDir::new().unwrap();
        let processor = Arc::new(GatedProcessor {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let manager =
            manager_with(&dir, processor.clone(), Arc::new(RecordingLibrary::default())).await;
        let queue_file = dir.path().join("download_queue.json");

        let id = manager.enqueue(candidate("only"), vec![]).await;
        processor.entered.notified().await;

        // Read the raw file: loading through the store clears labels
        let mut stored_label = None;
        for _ in 0..100 {
            let raw = std::fs::read_to_string(&queue_file).unwrap();
            let items: Vec<QueueItem> = serde_json::from_str(&raw).unwrap();
            stored_label = items
                .into_iter()
                .find(|item| item.id == id)
                .and_then(|item| item.progress_label);
            if stored_label.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(stored_label.as_deref(), Some("Downloading audio"));

        processor.release.notify_one();
        manager.wait_idle().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_between_items() {
        let dir = TempDir::new().unwrap();
        let processor = Arc::new(GatedProcessor {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let manager =
            manager_with(&dir, processor.clone(), Arc::new(RecordingLibrary::default())).await;

        let first = manager.enqueue(candidate("first"), vec![]).await;
        let second = manager.enqueue(candidate("second"), vec![]).await;
        processor.entered.notified().await;

        let release = {
            let processor = processor.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                processor.release.notify_one();
            })
        };
        manager.shutdown().await;
        release.await.unwrap();

        assert_eq!(
            manager.get(&first).await.unwrap().status,
            QueueStatus::Completed
        );
        assert_eq!(
            manager.get(&second).await.unwrap().status,
            QueueStatus::Queued
        );
        assert!(!manager.is_running());

        // Start after shutdown does nothing
        manager.start().await;
        assert!(!manager.is_running());
    }

    #[tokio::test]
    async fn test_open_restores_and_resumes_interrupted_items() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("download_queue.json");
        let mut interrupted = QueueItem::new(candidate("x"), vec![]);
        interrupted.status = QueueStatus::Downloading;
        let mut done = QueueItem::new(candidate("y"), vec![]);
        done.status = QueueStatus::Completed;
        JsonQueueStore::new(&path)
            .save(&[interrupted.clone(), done])
            .unwrap();

        let processor = ScriptedProcessor::new(&["x"]);
        let manager =
            manager_with(&dir, processor.clone(), Arc::new(RecordingLibrary::default())).await;

        let items = manager.items().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].status, QueueStatus::Queued);

        manager.start().await;
        manager.start().await;
        manager.wait_idle().await;

        assert_eq!(processor.seen(), vec!["x"]);
        assert_eq!(
            manager.get(&interrupted.id).await.unwrap().status,
            QueueStatus::Completed
        );
    }
}
