//! Shell pre-population.

use futures_util::future::join_all;
use shellcache_core::{CacheStorage, Error, Request, Response};

use crate::fetch::Network;
use crate::router::RouterConfig;

/// Fetch every shell asset and store the set in the shell store.
///
/// All fetches run concurrently. Nothing is written unless every asset came
/// back with a 2xx status, and the write itself is a single transaction, so
/// a failed install never leaves a partial shell store behind.
///
/// # Errors
///
/// Returns `Error::InstallFailed` naming the first asset (in declaration
/// order) that failed, or the store if the final write failed.
pub async fn precache(
    config: &RouterConfig, storage: &dyn CacheStorage, network: &dyn Network,
) -> Result<usize, Error> {
    let requests = config.shell_requests();
    let fetched = join_all(requests.into_iter().map(|request| async move {
        let result = network.fetch(&request).await;
        (request, result)
    }))
    .await;

    let entries = fetched.into_iter().map(|(request, result)| check(request, result)).collect::<Result<Vec<_>, _>>()?;
    let count = entries.len();

    storage.add_all(&config.shell_store, entries).await.map_err(|e| Error::InstallFailed {
        url: config.shell_store.clone(),
        reason: format!("could not write shell store: {e}"),
    })?;

    tracing::info!(store = %config.shell_store, assets = count, "shell pre-populated");
    Ok(count)
}

fn check(request: Request, result: Result<Response, Error>) -> Result<(Request, Response), Error> {
    let url = request.url.to_string();
    match result {
        Ok(response) if response.is_ok() => Ok((request, response)),
        Ok(response) => {
            tracing::warn!(url = %url, status = response.status, "shell asset fetch returned an error status");
            Err(Error::InstallFailed { url, reason: format!("status {}", response.status) })
        }
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "shell asset fetch failed");
            Err(Error::InstallFailed { url, reason: e.to_string() })
        }
    }
}
