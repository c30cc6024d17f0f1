//! The request-classification-and-caching router.
//!
//! Every intercepted request is classified, then answered by the strategy
//! mapped to its class:
//!
//! | Class | Strategy |
//! | --- | --- |
//! | `Navigation` | navigation fallback (shell document from cache) |
//! | `DeclaredShellAsset`, `OtherSameOrigin` | cache first, network fallback |
//! | `CrossOriginCdn` | network first, cache fallback |
//! | `Skip` | pass-through |
//!
//! Successful network responses are copied into the runtime store on detached
//! tasks; see [`writes`].

pub mod classify;
pub mod config;
pub mod strategy;
pub mod writes;

use std::sync::Arc;

use serde::Serialize;
use shellcache_core::{CacheStorage, Error, Request, Response};
use tokio::sync::mpsc;

use crate::fetch::Network;

pub use classify::{Class, Strategy, classify};
pub use config::RouterConfig;
pub use writes::{BackgroundWrites, CacheEvent, EventSink};

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// A stored entry for the request itself.
    Cache,
    Network,
    /// The navigation fallback document.
    Fallback,
    /// A placeholder made up by the router.
    Synthetic,
}

/// A response chosen by the router.
#[derive(Debug, Clone)]
pub struct Served {
    pub response: Response,
    pub source: Source,
    pub class: Class,
}

/// Result of intercepting one request.
#[derive(Debug, Clone)]
pub enum Handled {
    Respond(Served),
    /// Not intercepted; the host sends the request to the network itself.
    PassThrough,
}

impl Handled {
    pub fn served(&self) -> Option<&Served> {
        match self {
            Handled::Respond(served) => Some(served),
            Handled::PassThrough => None,
        }
    }
}

/// Classifies requests and runs the matching strategy.
pub struct Router {
    config: Arc<RouterConfig>,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    writes: BackgroundWrites,
    events: EventSink,
}

impl Router {
    pub fn new(config: RouterConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Self {
        Self::with_sink(config, storage, network, EventSink::default())
    }

    /// Build a router together with the receiving end of its event channel.
    pub fn with_events(
        config: RouterConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>,
    ) -> (Self, mpsc::UnboundedReceiver<CacheEvent>) {
        let (events, rx) = EventSink::channel();
        (Self::with_sink(config, storage, network, events), rx)
    }

    fn with_sink(
        config: RouterConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>, events: EventSink,
    ) -> Self {
        let writes = BackgroundWrites::new(Arc::clone(&storage), config.runtime_store.clone(), events.clone());
        Self { config: Arc::new(config), storage, network, writes, events }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    pub fn network(&self) -> &Arc<dyn Network> {
        &self.network
    }

    pub fn events(&self) -> &EventSink {
        &self.events
    }

    pub fn classify(&self, request: &Request) -> Class {
        classify(request, &self.config)
    }

    /// Answer one request.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoResponse` when the primary path failed and no
    /// fallback could answer.
    pub async fn handle(&self, mut request: Request) -> Result<Handled, Error> {
        request.url.set_fragment(None);

        let class = self.classify(&request);
        let Some(strategy) = class.strategy() else {
            tracing::trace!(%request, "passing through");
            return Ok(Handled::PassThrough);
        };

        let (response, source) = match strategy {
            Strategy::NavigationFallback => self.navigation_fallback(&request).await?,
            Strategy::CacheFirst => self.cache_first(&request).await?,
            Strategy::NetworkFirst => self.network_first(&request).await?,
        };

        tracing::debug!(%request, class = class.as_str(), ?source, status = response.status, "served");

        Ok(Handled::Respond(Served { response, source, class }))
    }

    /// Wait for all background cache writes scheduled so far.
    pub async fn flush(&self) {
        self.writes.drain().await;
    }

    pub fn pending_writes(&self) -> usize {
        self.writes.pending()
    }
}
