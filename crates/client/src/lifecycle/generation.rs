//! Cache generations.
//!
//! Exactly two store names are current: the versioned shell store and the
//! runtime store. Every other store is stale and is deleted on activation.

use futures_util::future::join_all;
use serde::Serialize;
use shellcache_core::CacheStorage;

use crate::router::{CacheEvent, EventSink, RouterConfig};

/// A store that could not be deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteFailure {
    pub store: String,
    pub error: String,
}

/// Outcome of one reconcile pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub deleted: Vec<String>,
    pub failed: Vec<DeleteFailure>,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.deleted.is_empty() && self.failed.is_empty()
    }
}

/// The pair of current store names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generations {
    pub shell_store: String,
    pub runtime_store: String,
}

impl Generations {
    pub fn new(config: &RouterConfig) -> Self {
        Self { shell_store: config.shell_store.clone(), runtime_store: config.runtime_store.clone() }
    }

    pub fn is_current(&self, name: &str) -> bool {
        name == self.shell_store || name == self.runtime_store
    }

    /// Names that are neither the shell nor the runtime store.
    pub fn stale<'a>(&self, names: &'a [String]) -> Vec<&'a str> {
        names.iter().map(String::as_str).filter(|name| !self.is_current(name)).collect()
    }

    /// Delete every stale store.
    ///
    /// Deletions run concurrently and all finish before this returns. Failures
    /// are logged and reported, never raised.
    pub async fn reconcile(&self, storage: &dyn CacheStorage, events: &EventSink) -> ReconcileReport {
        let names = match storage.keys().await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(error = %e, "could not list cache stores, skipping cleanup");
                return ReconcileReport::default();
            }
        };

        let stale = self.stale(&names);
        let results = join_all(stale.iter().map(|name| async move { (*name, storage.delete(name).await) })).await;

        let mut report = ReconcileReport::default();
        for (name, result) in results {
            match result {
                Ok(true) => {
                    tracing::info!(store = name, "deleted stale cache store");
                    events.emit(CacheEvent::StoreDeleted { store: name.to_string() });
                    report.deleted.push(name.to_string());
                }
                Ok(false) => tracing::debug!(store = name, "stale store already gone"),
                Err(e) => {
                    tracing::warn!(store = name, error = %e, "failed to delete stale cache store");
                    events.emit(CacheEvent::DeleteFailed { store: name.to_string(), error: e.to_string() });
                    report.failed.push(DeleteFailure { store: name.to_string(), error: e.to_string() });
                }
            }
        }

        report
    }
}
