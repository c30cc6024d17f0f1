//! Resolved router configuration.

use std::collections::HashSet;

use shellcache_core::{AppConfig, Error, Request};
use url::Url;

use crate::fetch::url::{host_matches, resolve};

/// Everything the router needs to decide, resolved to absolute URLs once at
/// construction.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub origin: Url,
    pub shell_store: String,
    pub runtime_store: String,
    /// Shell assets in declaration order, duplicates removed.
    pub shell_assets: Vec<Url>,
    pub fallback_document: Url,
    pub cdn_hosts: Vec<String>,
    shell_index: HashSet<String>,
}

impl RouterConfig {
    /// Resolve an [`AppConfig`] against its origin.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` if the origin or any asset cannot be resolved,
    /// and `Error::InvalidInput` if the fallback document is not a shell asset.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.origin)))?;

        let mut shell_assets = Vec::with_capacity(config.shell_assets.len());
        let mut shell_index = HashSet::new();
        for asset in &config.shell_assets {
            let url = resolve(&origin, asset).map_err(|e| Error::InvalidUrl(format!("{asset}: {e}")))?;
            if shell_index.insert(url.to_string()) {
                shell_assets.push(url);
            }
        }

        let fallback_document = resolve(&origin, &config.fallback_document)
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.fallback_document)))?;
        if !shell_index.contains(fallback_document.as_str()) {
            return Err(Error::InvalidInput(format!(
                "fallback document {fallback_document} is not a shell asset"
            )));
        }

        Ok(Self {
            origin,
            shell_store: config.shell_store.clone(),
            runtime_store: config.runtime_store.clone(),
            shell_assets,
            fallback_document,
            cdn_hosts: config.cdn_hosts.iter().map(|h| h.trim().to_ascii_lowercase()).collect(),
            shell_index,
        })
    }

    pub fn is_shell_asset(&self, url: &Url) -> bool {
        self.shell_index.contains(url.as_str())
    }

    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.origin.origin()
    }

    pub fn is_cdn_host(&self, host: &str) -> bool {
        self.cdn_hosts.iter().any(|cdn| host_matches(host, cdn))
    }

    /// The lookup key of the navigation fallback document.
    pub fn fallback_request(&self) -> Request {
        Request::get(self.fallback_document.clone())
    }

    /// One `GET` per shell asset, in declaration order.
    pub fn shell_requests(&self) -> Vec<Request> {
        self.shell_assets.iter().cloned().map(Request::get).collect()
    }
}
