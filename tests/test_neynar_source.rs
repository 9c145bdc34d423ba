//! Mock HTTP server tests for `NeynarClient::fetch_page()`.
//!
//! Uses [`wiremock`] to emulate the Neynar casts endpoint.
//!
//! Coverage:
//! - Credential header and query parameters forwarded
//! - Cursor passed through and returned
//! - Non-2xx status
//! - Malformed JSON body
//! - Missing `casts` field

use castrank::pipeline::{CastSource, Credential, FetchError, NeynarClient, PageRequest, TransportError};
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> NeynarClient {
    NeynarClient::new(
        format!("{}/v2/farcaster/casts", server.uri()),
        "api_key",
        "farcaster",
        Duration::from_secs(5),
    )
    .unwrap()
}

fn request<'a>(cursor: Option<&'a str>, credential: &'a Credential) -> PageRequest<'a> {
    PageRequest {
        cursor,
        page_size: 100,
        credential,
    }
}

#[tokio::test]
async fn fetch_page_sends_key_and_limit() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "casts": [
            {
                "hash": "0x01",
                "author": { "fid": 1, "username": "alice", "pfp_url": "https://img/alice.png" },
                "timestamp": "2024-05-08T11:00:00Z"
            }
        ],
        "next": { "cursor": "page-2" }
    });

    Mock::given(method("GET"))
        .and(path("/v2/farcaster/casts"))
        .and(header("api_key", "test-key"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let credential = Credential::new("test-key");
    let page = client(&server).fetch_page(request(None, &credential)).await.unwrap();

    assert_eq!(page.records.len(), 1);
    assert_eq!(page.records[0].author_id, Some(1));
    assert_eq!(page.records[0].author_name, "alice");
    assert_eq!(page.records[0].author_avatar_url, "https://img/alice.png");
    assert_eq!(page.next_cursor.as_deref(), Some("page-2"));
}

#[tokio::test]
async fn fetch_page_forwards_cursor() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/farcaster/casts"))
        .and(query_param("cursor", "abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "casts": [],
            "next": { "cursor": null }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let credential = Credential::new("k");
    let page = client(&server)
        .fetch_page(request(Some("abc123"), &credential))
        .await
        .unwrap();

    assert!(page.records.is_empty());
    assert_eq!(page.next_cursor, None);
}

#[tokio::test]
async fn fetch_page_status_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized: invalid api key"))
        .mount(&server)
        .await;

    let credential = Credential::new("wrong");
    let err = client(&server).fetch_page(request(None, &credential)).await.unwrap_err();

    match err {
        FetchError::Transport(TransportError::Status { status, body }) => {
            assert_eq!(status, 401);
            assert!(body.contains("invalid api key"));
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn fetch_page_malformed_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let credential = Credential::new("k");
    let err = client(&server).fetch_page(request(None, &credential)).await.unwrap_err();

    assert!(matches!(err, FetchError::Transport(TransportError::MalformedBody(_))));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn fetch_page_missing_casts_field() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": "no casts here"
        })))
        .mount(&server)
        .await;

    let credential = Credential::new("k");
    let err = client(&server).fetch_page(request(None, &credential)).await.unwrap_err();

    assert!(matches!(err, FetchError::Schema(_)));
}
