//! Fetching through reqwest against wiremock servers.

use std::time::Duration;

use chrono::{TimeDelta, Utc};
use http::StatusCode;
use keepsake::backend::Backend;
use keepsake::{CacheEntry, CacheStatus, FetchError, FetchPolicy, FetchRequest, Fetcher, Payload};
use keepsake_moka::MokaBackend;
use keepsake_reqwest::ReqwestUpstream;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn policy() -> FetchPolicy {
    FetchPolicy::builder()
        .expiry(Duration::from_secs(600))
        .timeout(Duration::from_secs(2))
        .backoff(Duration::from_millis(5), Duration::from_millis(20))
        .build()
        .unwrap()
}

fn fetcher(policy: FetchPolicy) -> Fetcher<MokaBackend, ReqwestUpstream> {
    let backend = MokaBackend::builder().max_entries(100).build();
    Fetcher::new(backend, ReqwestUpstream::default(), policy).unwrap()
}

#[tokio::test]
async fn test_miss_then_hit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([{"id": 1}]))
                .insert_header("X-WP-TotalPages", "7")
                .insert_header("X-WP-Total", "65"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher(policy());
    let url = format!("{}/wp-json/wp/v2/posts", server.uri());

    let first = fetcher.get(&url).await.unwrap();
    assert_eq!(first.cache_status(), CacheStatus::Miss);
    assert_eq!(first.payload().header_u64("X-WP-TotalPages"), Some(7));

    let second = fetcher.get(&url).await.unwrap();
    assert_eq!(second.cache_status(), CacheStatus::Hit);
    assert_eq!(second.body(), first.body());
    assert_eq!(second.payload().header_u64("x-wp-total"), Some(65));
    let posts: serde_json::Value = second.payload().json().unwrap();
    assert_eq!(posts[0]["id"], 1);
}

#[tokio::test]
async fn test_four_transient_failures_then_success() {
    let server = MockServer::start().await;
    Mock::given(path("/posts"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(4)
        .expect(4)
        .mount(&server)
        .await;
    Mock::given(path("/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = fetcher(policy())
        .get(&format!("{}/posts", server.uri()))
        .await
        .unwrap();
    assert_eq!(outcome.status(), StatusCode::OK);
    assert_eq!(outcome.body().as_ref(), b"[]");
}

#[tokio::test]
async fn test_six_transient_failures_surface() {
    let server = MockServer::start().await;
    Mock::given(path("/posts"))
        .respond_with(ResponseTemplate::new(502))
        .expect(6)
        .mount(&server)
        .await;

    let error = fetcher(policy())
        .get(&format!("{}/posts", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(error.kind(), "status_5xx");
    assert_eq!(error.response().map(|r| r.status), Some(StatusCode::BAD_GATEWAY));
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(path("/wp-json/wp/v2/posts"))
        .and(query_param("slug", "missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "code": "rest_no_route"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let error = fetcher(policy())
        .get(&format!("{}/wp-json/wp/v2/posts?slug=missing", server.uri()))
        .await
        .unwrap_err();
    assert!(error.is_not_found());
}

#[tokio::test]
async fn test_stale_entry_survives_outage() {
    let server = MockServer::start().await;
    Mock::given(path("/posts"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let backend = MokaBackend::builder().max_entries(100).build();
    let fetcher = Fetcher::new(backend.clone(), ReqwestUpstream::default(), policy()).unwrap();
    let request = FetchRequest::parse_get(&format!("{}/posts", server.uri())).unwrap();
    backend
        .write(
            &fetcher.key_for(&request),
            CacheEntry::new(
                Payload::from_status(StatusCode::OK, "cached posts"),
                Utc::now() - TimeDelta::hours(1),
            ),
        )
        .await
        .unwrap();

    let outcome = fetcher.fetch(&request).await.unwrap();
    assert!(outcome.is_stale());
    assert_eq!(outcome.body().as_ref(), b"cached posts");
}

#[tokio::test]
async fn test_connection_refused() {
    // Nothing listens on a port freed right after binding.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let url = format!("http://127.0.0.1:{port}/posts");

    let policy = FetchPolicy::builder().max_retries(0).build().unwrap();
    let error = fetcher(policy).get(&url).await.unwrap_err();
    match error {
        FetchError::HardFailure { source, .. } => assert_eq!(source.kind(), "connect"),
        other => panic!("expected hard failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_upstream_times_out() {
    let server = MockServer::start().await;
    Mock::given(path("/posts"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let policy = FetchPolicy::builder()
        .timeout(Duration::from_millis(100))
        .max_retries(1)
        .backoff(Duration::from_millis(5), Duration::from_millis(5))
        .build()
        .unwrap();
    let error = fetcher(policy)
        .get(&format!("{}/posts", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(error.kind(), "timeout");
}

#[tokio::test]
async fn test_post_body_is_sent_and_keyed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_json(serde_json::json!({"query": "rust"})))
        .respond_with(ResponseTemplate::new(200).set_body_string("hits"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher(policy());
    let url = format!("{}/search", server.uri()).parse().unwrap();
    let request = FetchRequest::new(http::Method::POST, url)
        .with_json(&serde_json::json!({"query": "rust"}))
        .unwrap();

    assert_eq!(fetcher.fetch(&request).await.unwrap().body().as_ref(), b"hits");
    assert!(fetcher.fetch(&request).await.unwrap().served_from_cache());
}
