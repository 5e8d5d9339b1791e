//! Behavior of the fetcher against scripted upstreams.

mod common;

use std::time::Duration;

use common::{
    BrokenBackend, OK, ScriptedUpstream, Step, UNAVAILABLE, backend, policy, request,
    stale_entry,
};
use http::StatusCode;
use keepsake::backend::Backend;
use keepsake::{CacheStatus, FetchError, FetchRequest, Fetcher, KeyNamespace, UpstreamError};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_fresh_entry_makes_no_network_call() {
    let upstream = ScriptedUpstream::always(OK);
    let fetcher = Fetcher::new(backend(), upstream.clone(), policy()).unwrap();
    let request = request("/wp-json/wp/v2/posts");

    let first = fetcher.fetch(&request).await.unwrap();
    assert_eq!(first.cache_status(), CacheStatus::Miss);
    assert!(!first.served_from_cache());

    let second = fetcher.fetch(&request).await.unwrap();
    assert_eq!(second.cache_status(), CacheStatus::Hit);
    assert!(second.served_from_cache());
    assert!(!second.is_stale());
    assert_eq!(second.body(), first.body());
    assert_eq!(second.stored_at(), first.stored_at());
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn test_repeated_hits_are_identical() {
    let upstream = ScriptedUpstream::always(OK);
    let fetcher = Fetcher::new(backend(), upstream.clone(), policy()).unwrap();
    let request = request("/posts");
    fetcher.fetch(&request).await.unwrap();

    let a = fetcher.fetch(&request).await.unwrap();
    let b = fetcher.fetch(&request).await.unwrap();
    assert_eq!(a.payload(), b.payload());
    assert_eq!(a.stored_at(), b.stored_at());
    assert_eq!(
        (a.served_from_cache(), a.is_stale()),
        (b.served_from_cache(), b.is_stale())
    );
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn test_stale_entry_served_when_upstream_returns_503() {
    let backend = backend();
    let upstream = ScriptedUpstream::always(UNAVAILABLE);
    let fetcher = Fetcher::new(backend.clone(), upstream.clone(), policy()).unwrap();
    let request = request("/posts");
    let key = fetcher.key_for(&request);
    let stale = stale_entry("last good");
    backend.write(&key, stale.clone()).await.unwrap();

    let outcome = fetcher.fetch(&request).await.unwrap();
    assert!(outcome.served_from_cache());
    assert!(outcome.is_stale());
    assert_eq!(outcome.cache_status(), CacheStatus::Stale);
    assert_eq!(outcome.body().as_ref(), b"last good");
    assert_eq!(outcome.stored_at(), stale.stored_at());
    assert!(outcome.age() >= Duration::from_secs(2 * 3600));
    assert_eq!(outcome.error().map(UpstreamError::kind), Some("status_5xx"));
    // One attempt plus two retries.
    assert_eq!(upstream.calls(), 3);

    // The error response never replaces the stored entry.
    let stored = backend.read(&key).await.unwrap().unwrap();
    assert_eq!(stored, stale);
}

#[tokio::test]
async fn test_stale_entry_served_when_upstream_is_unreachable() {
    let backend = backend();
    let upstream = ScriptedUpstream::always(Step::Refuse);
    let fetcher = Fetcher::new(backend.clone(), upstream, policy()).unwrap();
    let request = request("/posts");
    backend
        .write(&fetcher.key_for(&request), stale_entry("last good"))
        .await
        .unwrap();

    let outcome = fetcher.fetch(&request).await.unwrap();
    assert!(outcome.is_stale());
    assert_eq!(outcome.body().as_ref(), b"last good");
    assert!(matches!(outcome.error(), Some(UpstreamError::Connect(_))));
}

#[tokio::test]
async fn test_stale_entry_is_refreshed() {
    let backend = backend();
    let upstream = ScriptedUpstream::new([UNAVAILABLE, OK]);
    let fetcher = Fetcher::new(backend.clone(), upstream.clone(), policy()).unwrap();
    let request = request("/posts");
    let key = fetcher.key_for(&request);
    let stale = stale_entry("old");
    backend.write(&key, stale.clone()).await.unwrap();

    let outcome = fetcher.fetch(&request).await.unwrap();
    assert_eq!(outcome.cache_status(), CacheStatus::Miss);
    assert_eq!(outcome.body().as_ref(), b"fresh");
    assert!(outcome.error().is_none());
    assert_eq!(upstream.calls(), 2);

    let stored = backend.read(&key).await.unwrap().unwrap();
    assert_eq!(stored.payload().body.as_ref(), b"fresh");
    assert!(stored.stored_at() > stale.stored_at());
}

#[tokio::test]
async fn test_client_error_on_refresh_replaces_entry() {
    let backend = backend();
    let upstream = ScriptedUpstream::always(Step::Respond(404, "gone"));
    let fetcher = Fetcher::new(backend.clone(), upstream, policy()).unwrap();
    let request = request("/posts/1");
    let key = fetcher.key_for(&request);
    backend.write(&key, stale_entry("old")).await.unwrap();

    let outcome = fetcher.fetch(&request).await.unwrap();
    assert_eq!(outcome.status(), StatusCode::NOT_FOUND);
    assert!(!outcome.is_stale());
    let stored = backend.read(&key).await.unwrap().unwrap();
    assert_eq!(stored.payload().status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_not_found_on_first_fetch() {
    let backend = backend();
    let upstream = ScriptedUpstream::always(Step::Respond(
        400,
        r#"{"code":"rest_post_invalid_page_number"}"#,
    ));
    let fetcher = Fetcher::new(backend.clone(), upstream.clone(), policy()).unwrap();
    let request = request("/posts?page=99");

    let error = fetcher.fetch(&request).await.unwrap_err();
    assert!(error.is_not_found());
    assert_eq!(error.kind(), "not_found");
    let response = error.response().unwrap();
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["code"], "rest_post_invalid_page_number");

    assert_eq!(upstream.calls(), 1);
    assert!(backend.read(&fetcher.key_for(&request)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_hard_failure_on_first_fetch() {
    let backend = backend();
    let upstream = ScriptedUpstream::always(UNAVAILABLE);
    let fetcher = Fetcher::new(backend.clone(), upstream.clone(), policy()).unwrap();
    let request = request("/posts");

    let error = fetcher.fetch(&request).await.unwrap_err();
    match &error {
        FetchError::HardFailure { url, source } => {
            assert_eq!(url, "http://cms.test/posts");
            assert_eq!(source.kind(), "status_5xx");
        }
        other => panic!("expected hard failure, got {other:?}"),
    }
    assert!(!error.is_not_found());
    assert_eq!(upstream.calls(), 3);
    assert!(backend.read(&fetcher.key_for(&request)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_unreachable_upstream_on_first_fetch() {
    let fetcher = Fetcher::new(backend(), ScriptedUpstream::always(Step::Refuse), policy()).unwrap();
    let error = fetcher.fetch(&request("/posts")).await.unwrap_err();
    assert_eq!(error.kind(), "connect");
}

#[tokio::test]
async fn test_retries_recover_before_first_store() {
    let upstream = ScriptedUpstream::new([UNAVAILABLE, Step::Refuse, OK]);
    let fetcher = Fetcher::new(backend(), upstream.clone(), policy()).unwrap();
    let outcome = fetcher.fetch(&request("/posts")).await.unwrap();
    assert_eq!(outcome.status(), StatusCode::OK);
    assert_eq!(upstream.calls(), 3);
}

#[tokio::test]
async fn test_query_order_does_not_create_new_entries() {
    let upstream = ScriptedUpstream::always(OK);
    let fetcher = Fetcher::new(backend(), upstream.clone(), policy()).unwrap();

    let a = request("/posts?per_page=10&page=2");
    let b = request("/posts?page=2&per_page=10#top");
    let c = request("/posts?page=2&per_page=10")
        .with_header(http::header::ACCEPT, http::HeaderValue::from_static("text/html"));
    assert_eq!(fetcher.key_for(&a), fetcher.key_for(&b));
    assert_eq!(fetcher.key_for(&a), fetcher.key_for(&c));

    fetcher.fetch(&a).await.unwrap();
    assert!(fetcher.fetch(&b).await.unwrap().served_from_cache());
    assert!(fetcher.fetch(&c).await.unwrap().served_from_cache());
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn test_body_is_part_of_the_key() {
    let upstream = ScriptedUpstream::always(OK);
    let fetcher = Fetcher::new(backend(), upstream.clone(), policy()).unwrap();
    let url = url::Url::parse("http://cms.test/search").unwrap();

    let first = FetchRequest::post(url.clone(), r#"{"q":"rust"}"#);
    let second = FetchRequest::post(url, r#"{"q":"cache"}"#);
    assert_ne!(fetcher.key_for(&first), fetcher.key_for(&second));

    fetcher.fetch(&first).await.unwrap();
    fetcher.fetch(&second).await.unwrap();
    assert!(fetcher.fetch(&first).await.unwrap().served_from_cache());
    assert_eq!(upstream.calls(), 2);
}

#[tokio::test]
async fn test_namespace_version_bump_misses() {
    let backend = backend();
    let upstream = ScriptedUpstream::always(OK);
    let v1 = Fetcher::new(backend.clone(), upstream.clone(), policy())
        .unwrap()
        .namespace(KeyNamespace::new("cms", 1));
    let v2 = Fetcher::new(backend, upstream.clone(), policy())
        .unwrap()
        .namespace(KeyNamespace::new("cms", 2));
    let request = request("/posts");

    v1.fetch(&request).await.unwrap();
    assert!(v1.fetch(&request).await.unwrap().served_from_cache());
    assert!(!v2.fetch(&request).await.unwrap().served_from_cache());
    assert_eq!(upstream.calls(), 2);
}

#[tokio::test]
async fn test_broken_store_still_fetches() {
    let upstream = ScriptedUpstream::always(OK);
    let fetcher = Fetcher::new(BrokenBackend, upstream.clone(), policy()).unwrap();
    let request = request("/posts");

    let outcome = fetcher.fetch(&request).await.unwrap();
    assert_eq!(outcome.body().as_ref(), b"fresh");
    let outcome = fetcher.fetch(&request).await.unwrap();
    assert!(!outcome.served_from_cache());
    assert_eq!(upstream.calls(), 2);
}

#[tokio::test]
async fn test_concurrent_misses_share_one_upstream_call() {
    let upstream = ScriptedUpstream::delayed([OK], Duration::from_millis(50));
    let fetcher = Fetcher::new(backend(), upstream.clone(), policy()).unwrap();
    let request = request("/posts");

    let (a, b, c) = tokio::join!(
        fetcher.fetch(&request),
        fetcher.fetch(&request),
        fetcher.fetch(&request)
    );
    let outcomes = [a.unwrap(), b.unwrap(), c.unwrap()];
    assert_eq!(upstream.calls(), 1);
    assert_eq!(
        outcomes
            .iter()
            .filter(|outcome| outcome.served_from_cache())
            .count(),
        2
    );
}

/// One retry, so a refused call takes two attempts of one second each.
fn slow_outage() -> (ScriptedUpstream, keepsake::FetchPolicy) {
    let upstream = ScriptedUpstream::delayed([Step::Refuse], Duration::from_secs(1));
    let policy = keepsake::FetchPolicy::builder()
        .expiry(Duration::from_secs(600))
        .timeout(Duration::from_secs(5))
        .max_retries(1)
        .backoff(Duration::from_millis(1), Duration::from_millis(1))
        .build()
        .unwrap();
    (upstream, policy)
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_stale_refreshes_share_one_failure() {
    let backend = backend();
    let (upstream, policy) = slow_outage();
    let fetcher = Fetcher::new(backend.clone(), upstream.clone(), policy).unwrap();
    let request = request("/posts");
    backend
        .write(&fetcher.key_for(&request), stale_entry("last good"))
        .await
        .unwrap();

    let started = tokio::time::Instant::now();
    let (a, b, c, d) = tokio::join!(
        fetcher.fetch(&request),
        fetcher.fetch(&request),
        fetcher.fetch(&request),
        fetcher.fetch(&request)
    );
    let elapsed = started.elapsed();

    for outcome in [a, b, c, d] {
        let outcome = outcome.unwrap();
        assert!(outcome.is_stale());
        assert_eq!(outcome.body().as_ref(), b"last good");
        assert!(matches!(outcome.error(), Some(UpstreamError::Connect(_))));
    }
    // One retry cycle for everybody, not one per caller.
    assert_eq!(upstream.calls(), 2);
    assert!(elapsed < Duration::from_secs(3), "took {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_misses_share_one_failure() {
    let (upstream, policy) = slow_outage();
    let fetcher = Fetcher::new(backend(), upstream.clone(), policy).unwrap();
    let request = request("/posts");

    let started = tokio::time::Instant::now();
    let (a, b, c, d) = tokio::join!(
        fetcher.fetch(&request),
        fetcher.fetch(&request),
        fetcher.fetch(&request),
        fetcher.fetch(&request)
    );
    let elapsed = started.elapsed();

    for result in [a, b, c, d] {
        assert!(matches!(
            result,
            Err(FetchError::HardFailure {
                source: UpstreamError::Connect(_),
                ..
            })
        ));
    }
    assert_eq!(upstream.calls(), 2);
    assert!(elapsed < Duration::from_secs(3), "took {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_next_burst_tries_again() {
    let (upstream, policy) = slow_outage();
    let fetcher = Fetcher::new(backend(), upstream.clone(), policy).unwrap();
    let request = request("/posts");

    assert!(fetcher.fetch(&request).await.is_err());
    assert!(fetcher.fetch(&request).await.is_err());
    assert_eq!(upstream.calls(), 4);
}

#[tokio::test]
async fn test_invalid_url() {
    let fetcher = Fetcher::new(backend(), ScriptedUpstream::always(OK), policy()).unwrap();
    let error = fetcher.get("not a url").await.unwrap_err();
    assert!(matches!(error, FetchError::InvalidUrl(_)));
}

#[tokio::test]
async fn test_zero_timeout_is_rejected() {
    let mut policy = policy();
    policy.timeout = Duration::ZERO;
    let result = Fetcher::new(backend(), ScriptedUpstream::always(OK), policy);
    assert!(matches!(result, Err(keepsake::PolicyError::ZeroTimeout)));
}
