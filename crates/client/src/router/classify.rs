//! Request classification.
//!
//! [`classify`] is a pure function of the request and the resolved config; it
//! never touches a store or the network. Rules are evaluated in order and the
//! first match wins:
//!
//! 1. non-`GET`, or a non-http(s) scheme → [`Class::Skip`]
//! 2. audio/video destination → [`Class::Skip`]
//! 3. navigation → [`Class::Navigation`]
//! 4. declared shell asset → [`Class::DeclaredShellAsset`]
//! 5. cross-origin CDN host → [`Class::CrossOriginCdn`]
//! 6. anything else → [`Class::OtherSameOrigin`]

use serde::Serialize;
use shellcache_core::Request;

use super::config::RouterConfig;

/// Request bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Class {
    Navigation,
    DeclaredShellAsset,
    CrossOriginCdn,
    OtherSameOrigin,
    /// Not intercepted: passed to the network untouched.
    Skip,
}

/// Read/write strategy applied to a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    NavigationFallback,
    CacheFirst,
    NetworkFirst,
}

impl Class {
    /// Strategy table. `Skip` has none.
    pub fn strategy(self) -> Option<Strategy> {
        match self {
            Class::Navigation => Some(Strategy::NavigationFallback),
            Class::DeclaredShellAsset | Class::OtherSameOrigin => Some(Strategy::CacheFirst),
            Class::CrossOriginCdn => Some(Strategy::NetworkFirst),
            Class::Skip => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Class::Navigation => "navigation",
            Class::DeclaredShellAsset => "declared_shell_asset",
            Class::CrossOriginCdn => "cross_origin_cdn",
            Class::OtherSameOrigin => "other_same_origin",
            Class::Skip => "skip",
        }
    }
}

/// Bucket a request.
pub fn classify(request: &Request, config: &RouterConfig) -> Class {
    if !request.is_get() || !matches!(request.url.scheme(), "http" | "https") {
        return Class::Skip;
    }

    if request.destination.is_media() {
        return Class::Skip;
    }

    if request.is_navigation() {
        return Class::Navigation;
    }

    if config.is_shell_asset(&request.url) {
        return Class::DeclaredShellAsset;
    }

    if !config.is_same_origin(&request.url)
        && let Some(host) = request.url.host_str()
        && config.is_cdn_host(host)
    {
        return Class::CrossOriginCdn;
    }

    Class::OtherSameOrigin
}
