//! Install, activate, intercept.
//!
//! A [`LifecycleController`] walks one cache generation through
//! `Installing → Waiting → Active → Redundant`. Only an active controller
//! answers requests; in every other state requests pass through to the host.

pub mod generation;
pub mod precache;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shellcache_core::{CacheStorage, Error, Request};
use tokio::sync::{Mutex, RwLock};

use crate::router::{Handled, Router};

pub use generation::{DeleteFailure, Generations, ReconcileReport};
pub use precache::precache;

/// Lifecycle state of one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Installing,
    Waiting,
    Active,
    /// Failed to install, or replaced.
    Redundant,
}

impl LifecycleState {
    pub fn can_intercept(self) -> bool {
        self == LifecycleState::Active
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Installing => "installing",
            LifecycleState::Waiting => "waiting",
            LifecycleState::Active => "active",
            LifecycleState::Redundant => "redundant",
        }
    }
}

/// What the controller needs from the runtime hosting it.
#[async_trait]
pub trait Host: Send + Sync {
    /// Promote this generation without waiting for old clients to close.
    async fn skip_waiting(&self);

    /// Take control of every open client. Returns how many were claimed.
    async fn claim_clients(&self) -> Result<usize, Error>;
}

/// Messages a client can post to the controller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ControlMessage {
    #[serde(rename = "SKIP_WAITING")]
    SkipWaiting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageOutcome {
    SkipWaiting,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub store: String,
    pub cached: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivationReport {
    pub reconcile: ReconcileReport,
    /// `None` when the host refused the claim.
    pub claimed: Option<usize>,
}

pub struct LifecycleController {
    router: Arc<Router>,
    host: Arc<dyn Host>,
    generations: Generations,
    state: RwLock<LifecycleState>,
    /// Serializes install and activate.
    transition: Mutex<()>,
}

impl LifecycleController {
    pub fn new(router: Arc<Router>, host: Arc<dyn Host>) -> Self {
        let generations = Generations::new(router.config());
        Self {
            router,
            host,
            generations,
            state: RwLock::new(LifecycleState::Installing),
            transition: Mutex::new(()),
        }
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn generations(&self) -> &Generations {
        &self.generations
    }

    async fn expect_state(&self, expected: LifecycleState, operation: &str) -> Result<(), Error> {
        let current = self.state().await;
        if current != expected {
            return Err(Error::InvalidState(format!(
                "{operation} requires state {}, current state is {}",
                expected.as_str(),
                current.as_str()
            )));
        }
        Ok(())
    }

    async fn set_state(&self, next: LifecycleState) {
        let mut state = self.state.write().await;
        tracing::info!(from = state.as_str(), to = next.as_str(), "lifecycle transition");
        *state = next;
    }

    /// Pre-populate the shell store.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` outside `Installing`, and
    /// `Error::InstallFailed` if any shell asset could not be fetched or
    /// stored. A failed install leaves the controller `Redundant`.
    pub async fn on_install(&self) -> Result<InstallReport, Error> {
        let _guard = self.transition.lock().await;
        self.expect_state(LifecycleState::Installing, "install").await?;

        self.host.skip_waiting().await;

        let config = self.router.config();
        match precache(config, self.router.storage().as_ref(), self.router.network().as_ref()).await {
            Ok(cached) => {
                self.set_state(LifecycleState::Waiting).await;
                Ok(InstallReport { store: config.shell_store.clone(), cached })
            }
            Err(e) => {
                tracing::error!(store = %config.shell_store, error = %e, "install failed");
                self.set_state(LifecycleState::Redundant).await;
                Err(e)
            }
        }
    }

    /// Delete stale generations, then take control of open clients.
    ///
    /// Neither a failed deletion nor a refused claim fails activation.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` outside `Waiting`.
    pub async fn on_activate(&self) -> Result<ActivationReport, Error> {
        let _guard = self.transition.lock().await;
        self.expect_state(LifecycleState::Waiting, "activate").await?;

        let storage = self.router.storage();
        if let Err(e) = storage.open(&self.generations.runtime_store).await {
            tracing::warn!(store = %self.generations.runtime_store, error = %e, "could not open runtime store");
        }

        let reconcile = self.generations.reconcile(storage.as_ref(), self.router.events()).await;

        let claimed = match self.host.claim_clients().await {
            Ok(count) => {
                tracing::info!(clients = count, "claimed clients");
                Some(count)
            }
            Err(e) => {
                tracing::warn!(error = %e, "host refused to hand over clients");
                None
            }
        };

        self.set_state(LifecycleState::Active).await;
        Ok(ActivationReport { reconcile, claimed })
    }

    /// Intercept one request.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoResponse` when the router could not answer.
    pub async fn on_request(&self, request: Request) -> Result<Handled, Error> {
        if !self.state().await.can_intercept() {
            tracing::trace!(%request, "controller not active, passing through");
            return Ok(Handled::PassThrough);
        }
        self.router.handle(request).await
    }

    /// Handle a message posted by a client. Unknown payloads are ignored.
    pub async fn on_control_message(&self, payload: &serde_json::Value) -> MessageOutcome {
        match ControlMessage::deserialize(payload) {
            Ok(ControlMessage::SkipWaiting) => {
                tracing::info!("skip waiting requested by client");
                self.host.skip_waiting().await;
                MessageOutcome::SkipWaiting
            }
            Err(_) => {
                tracing::debug!(%payload, "ignoring control message");
                MessageOutcome::Ignored
            }
        }
    }

    /// Stop intercepting and wait for outstanding cache writes.
    pub async fn retire(&self) {
        self.set_state(LifecycleState::Redundant).await;
        self.router.flush().await;
    }
}
