//! Detached, best-effort cache writes and the event channel they report to.

use std::sync::Arc;

use shellcache_core::{CacheStorage, Request, Response};
use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;

/// Observable side effects of the router and the generation manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Stored { store: String, url: String },
    WriteFailed { store: String, url: String, error: String },
    StoreDeleted { store: String },
    DeleteFailed { store: String, error: String },
}

/// Optional sender half of the event channel. Sending never fails the caller.
#[derive(Debug, Clone, Default)]
pub struct EventSink(Option<mpsc::UnboundedSender<CacheEvent>>);

impl EventSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<CacheEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(Some(tx)), rx)
    }

    pub fn emit(&self, event: CacheEvent) {
        if let Some(tx) = &self.0 {
            let _ = tx.send(event);
        }
    }
}

/// Writes into a single store, each on its own detached task.
pub struct BackgroundWrites {
    storage: Arc<dyn CacheStorage>,
    store: String,
    tracker: TaskTracker,
    events: EventSink,
}

impl BackgroundWrites {
    pub fn new(storage: Arc<dyn CacheStorage>, store: impl Into<String>, events: EventSink) -> Self {
        Self { storage, store: store.into(), tracker: TaskTracker::new(), events }
    }

    /// Queue a write of `response` for `request`. Returns immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, request: Request, response: Response) {
        let storage = Arc::clone(&self.storage);
        let store = self.store.clone();
        let events = self.events.clone();

        self.tracker.spawn(async move {
            let url = request.url.to_string();
            match storage.put(&store, &request, &response).await {
                Ok(()) => {
                    tracing::debug!(store = %store, url = %url, "stored runtime copy");
                    events.emit(CacheEvent::Stored { store, url });
                }
                Err(e) => {
                    tracing::warn!(store = %store, url = %url, error = %e, "runtime cache write failed");
                    events.emit(CacheEvent::WriteFailed { store, url, error: e.to_string() });
                }
            }
        });
    }

    /// Writes still in flight.
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for every write scheduled so far.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}
