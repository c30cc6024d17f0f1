//! Fakes shared by the unit tests of this crate.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use shellcache_core::{AppConfig, CacheDb, CacheStorage, Error, Request, Response};
use url::Url;

use crate::fetch::Network;
use crate::lifecycle::Host;
use crate::router::RouterConfig;

pub fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

pub fn app_config() -> AppConfig {
    AppConfig {
        origin: "https://app.test".into(),
        shell_store: "app-shell-v2".into(),
        runtime_store: "app-runtime-v1".into(),
        shell_assets: vec!["/".into(), "/index.html".into(), "/app.js".into()],
        fallback_document: "/index.html".into(),
        cdn_hosts: vec!["cdn.jsdelivr.net".into()],
        ..Default::default()
    }
}

pub fn test_config() -> RouterConfig {
    RouterConfig::from_app_config(&app_config()).unwrap()
}

type Hook = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Network with canned responses. Unknown URLs answer 404.
#[derive(Default)]
pub struct ScriptedNetwork {
    routes: Mutex<HashMap<String, Response>>,
    failing: Mutex<HashSet<String>>,
    offline: AtomicBool,
    calls: Mutex<Vec<String>>,
    hook: Mutex<Option<Hook>>,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: &str, response: Response) {
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    /// Make one URL fail at the transport level.
    pub fn fail(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Run `hook` to completion at the start of every fetch.
    pub fn before_fetch<F>(&self, hook: F)
    where
        F: Fn() -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        *self.hook.lock().unwrap() = Some(Arc::new(hook));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let url = request.url.to_string();
        self.calls.lock().unwrap().push(url.clone());

        let hook = self.hook.lock().unwrap().clone();
        if let Some(hook) = hook {
            hook().await;
        }

        if self.offline.load(Ordering::SeqCst) || self.failing.lock().unwrap().contains(&url) {
            return Err(Error::Network(format!("{url}: connection refused")));
        }

        Ok(self.routes.lock().unwrap().get(&url).cloned().unwrap_or_else(Response::not_found))
    }
}

/// In-memory store that counts every call and can be told to fail.
pub struct CountingStorage {
    inner: CacheDb,
    operations: AtomicUsize,
    fail_writes: AtomicBool,
    fail_deletes: Mutex<HashSet<String>>,
}

impl CountingStorage {
    pub async fn new() -> Self {
        Self {
            inner: CacheDb::open_in_memory().await.unwrap(),
            operations: AtomicUsize::new(0),
            fail_writes: AtomicBool::new(false),
            fail_deletes: Mutex::new(HashSet::new()),
        }
    }

    pub fn inner(&self) -> &CacheDb {
        &self.inner
    }

    pub fn operations(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, name: &str) {
        self.fail_deletes.lock().unwrap().insert(name.to_string());
    }

    fn count(&self) {
        self.operations.fetch_add(1, Ordering::SeqCst);
    }

    fn check_write(&self) -> Result<(), Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::QuotaExceeded("runtime store is full".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStorage for CountingStorage {
    async fn open(&self, name: &str) -> Result<(), Error> {
        self.count();
        self.inner.open_store(name).await
    }

    async fn add_all(&self, name: &str, entries: Vec<(Request, Response)>) -> Result<(), Error> {
        self.count();
        self.check_write()?;
        self.inner.put_entries(name, &entries).await
    }

    async fn match_request(&self, request: &Request, store: Option<&str>) -> Result<Option<Response>, Error> {
        self.count();
        self.inner.match_entry(request, store).await
    }

    async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error> {
        self.count();
        self.check_write()?;
        self.inner.put_entry(name, request, response).await
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        self.count();
        if self.fail_deletes.lock().unwrap().contains(name) {
            return Err(Error::InvalidState(format!("store {name} is locked")));
        }
        self.inner.delete_store(name).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.count();
        self.inner.store_names().await
    }
}

/// Host that records what the lifecycle asked of it.
#[derive(Default)]
pub struct RecordingHost {
    skip_waiting: AtomicUsize,
    claims: AtomicUsize,
    clients: AtomicUsize,
    refuse_claim: AtomicBool,
}

impl RecordingHost {
    pub fn with_clients(clients: usize) -> Self {
        Self { clients: AtomicUsize::new(clients), ..Default::default() }
    }

    pub fn skip_waiting_calls(&self) -> usize {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    pub fn claims(&self) -> usize {
        self.claims.load(Ordering::SeqCst)
    }

    pub fn refuse_claim(&self) {
        self.refuse_claim.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Host for RecordingHost {
    async fn skip_waiting(&self) {
        self.skip_waiting.fetch_add(1, Ordering::SeqCst);
    }

    async fn claim_clients(&self) -> Result<usize, Error> {
        if self.refuse_claim.load(Ordering::SeqCst) {
            return Err(Error::ClaimFailed("host is shutting down".into()));
        }
        self.claims.fetch_add(1, Ordering::SeqCst);
        Ok(self.clients.load(Ordering::SeqCst))
    }
}
