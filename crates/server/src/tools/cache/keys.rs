//! cache_keys tool implementation.
//!
//! Lists every cache store in creation order.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde::Serialize;
use shellcache_core::CacheStorage;

use crate::tools::json_result;

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize)]
pub struct CacheKeysOutput {
    pub stores: Vec<String>,
}

pub async fn keys_impl(storage: &dyn CacheStorage) -> Result<CallToolResult, McpError> {
    let stores = storage.keys().await?;
    json_result(&CacheKeysOutput { stores })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::fixtures::json;
    use shellcache_core::CacheDb;

    #[tokio::test]
    async fn test_keys_empty() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let output = json(&keys_impl(&cache).await.unwrap());
        assert_eq!(output["stores"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_keys_in_creation_order() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        cache.open_store("app-shell-v2").await.unwrap();
        cache.open_store("app-runtime-v1").await.unwrap();

        let output = json(&keys_impl(&cache).await.unwrap());

        assert_eq!(output["stores"], serde_json::json!(["app-shell-v2", "app-runtime-v1"]));
    }
}
