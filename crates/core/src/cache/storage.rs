//! The store capability consumed by the router.
//!
//! The router only ever talks to [`CacheStorage`]; [`CacheDb`] is the durable
//! implementation. Every operation addresses one key or one store, so
//! concurrent callers need no coordination beyond what the backend provides.

use async_trait::async_trait;

use super::connection::CacheDb;
use crate::{Error, Request, Response};

/// Named, durable request → response stores.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the named store if it does not exist.
    async fn open(&self, name: &str) -> Result<(), Error>;

    /// Populate a store with all entries or none of them.
    async fn add_all(&self, name: &str, entries: Vec<(Request, Response)>) -> Result<(), Error>;

    /// Find a stored response, across all stores or within `store` only.
    async fn match_request(&self, request: &Request, store: Option<&str>) -> Result<Option<Response>, Error>;

    /// Store a response, replacing any previous entry for the same request.
    async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error>;

    /// Drop a whole store. Returns false if it did not exist.
    async fn delete(&self, name: &str) -> Result<bool, Error>;

    /// Names of all existing stores.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    async fn has(&self, name: &str) -> Result<bool, Error> {
        Ok(self.keys().await?.iter().any(|key| key == name))
    }
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, name: &str) -> Result<(), Error> {
        self.open_store(name).await
    }

    async fn add_all(&self, name: &str, entries: Vec<(Request, Response)>) -> Result<(), Error> {
        self.put_entries(name, &entries).await
    }

    async fn match_request(&self, request: &Request, store: Option<&str>) -> Result<Option<Response>, Error> {
        self.match_entry(request, store).await
    }

    async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error> {
        self.put_entry(name, request, response).await
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        self.delete_store(name).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.store_names().await
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        self.has_store(name).await
    }
}
