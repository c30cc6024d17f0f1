//! Read/write strategies.
//!
//! Store reads that error are treated as misses: a lookup racing a store
//! deletion falls through to the next source instead of failing the request.

use shellcache_core::{Destination, Error, Request, Response};

use super::{Router, Source};

type Answer = Result<(Response, Source), Error>;

fn no_response(request: &Request, cause: &Error) -> Error {
    Error::NoResponse(format!("{request}: {cause}"))
}

impl Router {
    async fn lookup(&self, request: &Request, store: Option<&str>) -> Option<Response> {
        match self.storage.match_request(request, store).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(%request, error = %e, "cache lookup failed, treating as miss");
                None
            }
        }
    }

    async fn lookup_fallback(&self) -> Option<Response> {
        let fallback = self.config.fallback_request();
        self.lookup(&fallback, Some(&self.config.shell_store)).await
    }

    /// Hand an independent copy of a successful response to the runtime store.
    fn store_copy(&self, request: &Request, response: &Response) {
        if response.is_ok() {
            self.writes.schedule(request.clone(), response.clone());
        } else {
            tracing::debug!(%request, status = response.status, "not caching unsuccessful response");
        }
    }

    /// Serve the shell document for every navigation.
    pub(crate) async fn navigation_fallback(&self, request: &Request) -> Answer {
        if let Some(document) = self.lookup_fallback().await {
            return Ok((document, Source::Fallback));
        }

        tracing::warn!(
            fallback = %self.config.fallback_document,
            store = %self.config.shell_store,
            "fallback document missing from shell store"
        );

        match self.network.fetch(request).await {
            Ok(response) => Ok((response, Source::Network)),
            Err(e) => {
                tracing::debug!(%request, error = %e, "navigation fetch failed, retrying fallback lookup");
                self.lookup_fallback()
                    .await
                    .map(|document| (document, Source::Fallback))
                    .ok_or_else(|| no_response(request, &e))
            }
        }
    }

    /// Any store first; on a miss, the network, with a runtime copy on success.
    pub(crate) async fn cache_first(&self, request: &Request) -> Answer {
        if let Some(hit) = self.lookup(request, None).await {
            return Ok((hit, Source::Cache));
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                self.store_copy(request, &response);
                Ok((response, Source::Network))
            }
            Err(e) => {
                tracing::debug!(%request, error = %e, "network failed on cache miss");
                match request.destination {
                    Destination::Document => self
                        .lookup_fallback()
                        .await
                        .map(|document| (document, Source::Fallback))
                        .ok_or_else(|| no_response(request, &e)),
                    Destination::Image => Ok((Response::not_found(), Source::Synthetic)),
                    _ => Err(no_response(request, &e)),
                }
            }
        }
    }

    /// The network first, refreshing the runtime store; any store on failure.
    pub(crate) async fn network_first(&self, request: &Request) -> Answer {
        match self.network.fetch(request).await {
            Ok(response) => {
                self.store_copy(request, &response);
                Ok((response, Source::Network))
            }
            Err(e) => {
                tracing::debug!(%request, error = %e, "network failed, trying cache");
                self.lookup(request, None)
                    .await
                    .map(|hit| (hit, Source::Cache))
                    .ok_or_else(|| no_response(request, &e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::router::{Class, Handled};
    use crate::testing::{CountingStorage, ScriptedNetwork, test_config, url};
    use shellcache_core::{CacheDb, CacheStorage, RequestMode};

    struct Fixture {
        router: Router,
        db: CacheDb,
        network: Arc<ScriptedNetwork>,
    }

    async fn fixture() -> Fixture {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network = Arc::new(ScriptedNetwork::new());
        let router = Router::new(test_config(), Arc::new(db.clone()), network.clone());
        Fixture { router, db, network }
    }

    async fn seed_shell(db: &CacheDb) {
        let shell = vec![
            (Request::get(url("https://app.test/")), Response::ok("<html>root</html>")),
            (Request::get(url("https://app.test/index.html")), Response::ok("<html>shell</html>")),
        ];
        db.put_entries("app-shell-v2", &shell).await.unwrap();
    }

    fn served(handled: Handled) -> (Response, Source, Class) {
        match handled {
            Handled::Respond(s) => (s.response, s.source, s.class),
            Handled::PassThrough => panic!("expected a response"),
        }
    }

    #[tokio::test]
    async fn test_skip_never_touches_storage() {
        let storage = Arc::new(CountingStorage::new().await);
        let network = Arc::new(ScriptedNetwork::new());
        let router = Router::new(test_config(), storage.clone(), network.clone());

        let requests = vec![
            Request::new("POST", url("https://app.test/api/upload")),
            Request::get(url("https://app.test/song.mp3")).with_destination(Destination::Audio),
            Request::get(url("https://app.test/clip.mp4")).with_destination(Destination::Video),
            Request::get(url("chrome-extension://abc/inject.js")),
        ];
        for request in requests {
            let handled = router.handle(request).await.unwrap();
            assert!(matches!(handled, Handled::PassThrough));
        }

        router.flush().await;
        assert_eq!(storage.operations(), 0);
        assert_eq!(network.call_count(), 0);
    }

    #[tokio::test]
    async fn test_navigation_served_from_shell_while_offline() {
        let f = fixture().await;
        seed_shell(&f.db).await;
        f.network.set_offline(true);

        for path in ["https://app.test/", "https://app.test/playlist/7", "https://app.test/index.html#top"] {
            let (response, source, class) = served(f.router.handle(Request::navigate(url(path))).await.unwrap());
            assert_eq!(class, Class::Navigation);
            assert_eq!(source, Source::Fallback);
            assert_eq!(response.status, 200);
            assert_eq!(response.body.as_ref(), b"<html>shell</html>");
        }
        assert_eq!(f.network.call_count(), 0);
    }

    #[tokio::test]
    async fn test_navigation_without_shell_uses_network() {
        let f = fixture().await;
        f.network.serve("https://app.test/about", Response::ok("about page"));

        let (response, source, _) = served(f.router.handle(Request::navigate(url("https://app.test/about"))).await.unwrap());
        assert_eq!(source, Source::Network);
        assert_eq!(response.body.as_ref(), b"about page");
    }

    #[tokio::test]
    async fn test_navigation_without_shell_and_offline_fails() {
        let f = fixture().await;
        f.network.set_offline(true);

        let result = f.router.handle(Request::navigate(url("https://app.test/"))).await;
        assert!(matches!(result, Err(Error::NoResponse(_))));
    }

    #[tokio::test]
    async fn test_navigation_retries_fallback_after_network_failure() {
        let f = fixture().await;
        f.network.set_offline(true);
        let db = f.db.clone();
        f.network.before_fetch(move || {
            let db = db.clone();
            Box::pin(async move { seed_shell(&db).await })
        });

        let (response, source, _) = served(f.router.handle(Request::navigate(url("https://app.test/"))).await.unwrap());
        assert_eq!(source, Source::Fallback);
        assert_eq!(response.body.as_ref(), b"<html>shell</html>");
    }

    #[tokio::test]
    async fn test_cache_first_hit_never_fetches() {
        let f = fixture().await;
        let request = Request::get(url("https://app.test/app.js"));
        f.db.put_entry("app-shell-v2", &request, &Response::ok("cached js")).await.unwrap();
        f.network.serve("https://app.test/app.js", Response::ok("fresh js"));

        let (response, source, class) = served(f.router.handle(request).await.unwrap());
        assert_eq!(class, Class::DeclaredShellAsset);
        assert_eq!(source, Source::Cache);
        assert_eq!(response.body.as_ref(), b"cached js");
        assert_eq!(f.network.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cache_first_hit_in_stale_store() {
        let f = fixture().await;
        let request = Request::get(url("https://app.test/styles/main.css"));
        f.db.put_entry("app-shell-v1", &request, &Response::ok("old css")).await.unwrap();
        f.network.set_offline(true);

        let (response, source, _) = served(f.router.handle(request).await.unwrap());
        assert_eq!(source, Source::Cache);
        assert_eq!(response.body.as_ref(), b"old css");
    }

    #[tokio::test]
    async fn test_cache_first_miss_fetches_and_stores_copy() {
        let f = fixture().await;
        let request = Request::get(url("https://app.test/icons/play.svg"));
        f.network.serve("https://app.test/icons/play.svg", Response::ok("<svg/>"));

        let (response, source, class) = served(f.router.handle(request.clone()).await.unwrap());
        assert_eq!(class, Class::OtherSameOrigin);
        assert_eq!(source, Source::Network);
        assert_eq!(response.body.as_ref(), b"<svg/>");

        f.router.flush().await;
        let stored = f.db.match_entry(&request, Some("app-runtime-v1")).await.unwrap().unwrap();
        assert_eq!(stored, response);
    }

    #[tokio::test]
    async fn test_cache_first_does_not_store_error_status() {
        let f = fixture().await;
        let request = Request::get(url("https://app.test/missing.js"));

        let (response, source, _) = served(f.router.handle(request.clone()).await.unwrap());
        assert_eq!(source, Source::Network);
        assert_eq!(response.status, 404);

        f.router.flush().await;
        assert!(f.db.match_entry(&request, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_offline_image_miss_is_empty_404() {
        let f = fixture().await;
        f.network.set_offline(true);
        let request = Request::get(url("https://app.test/photo.png")).with_destination(Destination::Image);

        let (response, source, _) = served(f.router.handle(request).await.unwrap());
        assert_eq!(source, Source::Synthetic);
        assert_eq!(response.status, 404);
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn test_offline_document_miss_gets_fallback() {
        let f = fixture().await;
        seed_shell(&f.db).await;
        f.network.set_offline(true);
        let request = Request::get(url("https://app.test/frame.html")).with_destination(Destination::Document);

        let (response, source, _) = served(f.router.handle(request).await.unwrap());
        assert_eq!(source, Source::Fallback);
        assert_eq!(response.body.as_ref(), b"<html>shell</html>");
    }

    #[tokio::test]
    async fn test_offline_script_miss_fails() {
        let f = fixture().await;
        f.network.set_offline(true);
        let request = Request::get(url("https://app.test/chunk.js")).with_destination(Destination::Script);

        let result = f.router.handle(request).await;
        assert!(matches!(result, Err(Error::NoResponse(_))));
    }

    #[tokio::test]
    async fn test_network_first_prefers_fresh_network() {
        let f = fixture().await;
        let lib = "https://cdn.jsdelivr.net/npm/jsmediatags/dist/jsmediatags.min.js";
        let request = Request::get(url(lib)).with_mode(RequestMode::Cors);

        f.network.serve(lib, Response::ok("B1"));
        let (first, _, class) = served(f.router.handle(request.clone()).await.unwrap());
        assert_eq!(class, Class::CrossOriginCdn);
        assert_eq!(first.body.as_ref(), b"B1");
        f.router.flush().await;

        f.network.serve(lib, Response::ok("B2"));
        let (second, source, _) = served(f.router.handle(request.clone()).await.unwrap());
        assert_eq!(source, Source::Network);
        assert_eq!(second.body.as_ref(), b"B2");
        f.router.flush().await;

        let stored = f.db.match_entry(&request, Some("app-runtime-v1")).await.unwrap().unwrap();
        assert_eq!(stored.body.as_ref(), b"B2");
    }

    #[tokio::test]
    async fn test_network_first_falls_back_to_cache() {
        let f = fixture().await;
        let lib = "https://cdn.jsdelivr.net/npm/lib.js";
        let request = Request::get(url(lib));
        f.db.put_entry("app-runtime-v1", &request, &Response::ok("cached lib")).await.unwrap();
        f.network.set_offline(true);

        let (response, source, _) = served(f.router.handle(request).await.unwrap());
        assert_eq!(source, Source::Cache);
        assert_eq!(response.body.as_ref(), b"cached lib");
    }

    #[tokio::test]
    async fn test_network_first_offline_miss_fails() {
        let f = fixture().await;
        f.network.set_offline(true);

        let result = f.router.handle(Request::get(url("https://cdn.jsdelivr.net/npm/none.js"))).await;
        assert!(matches!(result, Err(Error::NoResponse(_))));
    }

    #[tokio::test]
    async fn test_write_failure_does_not_fail_response() {
        let storage = Arc::new(CountingStorage::new().await);
        storage.fail_writes(true);
        let network = Arc::new(ScriptedNetwork::new());
        network.serve("https://app.test/cover.jpg", Response::ok("jpeg"));
        let (router, mut events) = Router::with_events(test_config(), storage.clone(), network);

        let request = Request::get(url("https://app.test/cover.jpg")).with_destination(Destination::Image);
        let (response, source, _) = served(router.handle(request.clone()).await.unwrap());
        assert_eq!(source, Source::Network);
        assert_eq!(response.body.as_ref(), b"jpeg");

        router.flush().await;
        assert!(matches!(events.recv().await, Some(crate::router::CacheEvent::WriteFailed { .. })));
        assert!(storage.match_request(&request, None).await.unwrap().is_none());
    }
}
