//! cache_get tool implementation.
//!
//! Looks up one stored response, the same way the router does.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::fetch::canonicalize;
use shellcache_core::{CacheStorage, Error, Request};

use crate::error::ToolError;
use crate::tools::{ResponseView, default_method, json_result};

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// The URL of the stored request.
    pub url: String,

    /// HTTP method of the stored request (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Only look in this store. All stores are searched when omitted.
    #[serde(default)]
    pub store: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize)]
pub struct CacheGetOutput {
    pub url: String,
    pub store: Option<String>,
    pub response: ResponseView,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(storage: &dyn CacheStorage, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let url = canonicalize(&params.url).map_err(|e| ToolError::InvalidInput(format!("{}: {e}", params.url)))?;
    let request = Request::new(&params.method, url);

    let response = storage
        .match_request(&request, params.store.as_deref())
        .await?
        .ok_or_else(|| Error::CacheMiss(request.to_string()))?;

    let output =
        CacheGetOutput { url: request.url.to_string(), store: params.store, response: ResponseView::from(&response) };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::fixtures::json;
    use shellcache_core::{CacheDb, Response};

    fn params(url: &str, store: Option<&str>) -> CacheGetParams {
        CacheGetParams { url: url.to_string(), method: default_method(), store: store.map(str::to_string) }
    }

    async fn seeded() -> CacheDb {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let request = Request::get(canonicalize("https://app.test/app.js").unwrap());
        let response = Response::ok("console.log(1)").with_header("content-type", "text/javascript");
        cache.put_entry("app-shell-v2", &request, &response).await.unwrap();
        cache
    }

    #[tokio::test]
    async fn test_get_impl_missing() {
        let cache = CacheDb::open_in_memory().await.unwrap();

        let err = get_impl(&cache, params("https://app.test/nope.js", None)).await.unwrap_err();

        assert_eq!(err.code.0, -32001);
    }

    #[tokio::test]
    async fn test_get_impl_found() {
        let cache = seeded().await;

        let output = json(&get_impl(&cache, params("https://APP.test/app.js#main", None)).await.unwrap());

        assert_eq!(output["url"], "https://app.test/app.js");
        assert_eq!(output["response"]["body"], "console.log(1)");
        assert_eq!(output["response"]["content_type"], "text/javascript");
    }

    #[tokio::test]
    async fn test_get_impl_scoped_to_other_store() {
        let cache = seeded().await;

        let result = get_impl(&cache, params("https://app.test/app.js", Some("app-runtime-v1"))).await;

        assert!(result.is_err());
    }
}
