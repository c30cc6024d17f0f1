//! The host runtime the lifecycle controller reports to.
//!
//! Clients are identified by the `client_id` callers pass to the `fetch` tool.
//! A client is "open" from its first request on; claiming hands every open
//! client to the active generation.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use shellcache_client::Host;
use shellcache_core::Error;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
pub struct ServerHost {
    skip_waiting: AtomicBool,
    open: Mutex<BTreeSet<String>>,
    claimed: Mutex<BTreeSet<String>>,
}

impl ServerHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register_client(&self, id: &str) {
        if self.open.lock().await.insert(id.to_string()) {
            tracing::debug!(client = id, "client opened");
        }
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    pub async fn open_clients(&self) -> Vec<String> {
        self.open.lock().await.iter().cloned().collect()
    }

    pub async fn claimed_clients(&self) -> Vec<String> {
        self.claimed.lock().await.iter().cloned().collect()
    }
}

#[async_trait]
impl Host for ServerHost {
    async fn skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::SeqCst);
    }

    async fn claim_clients(&self) -> Result<usize, Error> {
        let open = self.open.lock().await;
        let mut claimed = self.claimed.lock().await;
        claimed.extend(open.iter().cloned());
        Ok(open.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_claim_takes_every_open_client() {
        let host = ServerHost::new();
        host.register_client("tab-1").await;
        host.register_client("tab-2").await;
        host.register_client("tab-1").await;

        assert_eq!(host.claim_clients().await.unwrap(), 2);
        assert_eq!(host.claimed_clients().await, vec!["tab-1", "tab-2"]);
    }

    #[tokio::test]
    async fn test_skip_waiting_flag() {
        let host = ServerHost::new();
        assert!(!host.skip_waiting_requested());
        host.skip_waiting().await;
        assert!(host.skip_waiting_requested());
    }
}
