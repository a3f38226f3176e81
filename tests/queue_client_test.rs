//! Integration tests for the queue client using wiremock
//!
//! These validate the poll/acknowledge wire protocol: endpoint shapes,
//! token query parameters, and the status-code contract.

use std::time::Duration;

use embercast::queue::{Platform, PollOutcome, PostKind, QueueClient, QueueError};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> QueueClient {
    QueueClient::from_parts(
        &server.uri(),
        3,
        "read-tok",
        "cred-tok",
        "delete-tok",
        Duration::from_secs(5),
    )
    .unwrap()
}

/// Poll carries all three tokens and decodes a queued item
#[tokio::test]
async fn test_poll_decodes_item() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slot/20161"))
        .and(query_param("server_id", "3"))
        .and(query_param("read_token", "read-tok"))
        .and(query_param("cred_token", "cred-tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "platform": "facebook",
            "post_type": 2,
            "body": "long form text",
            "link_url": "https://example.com",
            "tags": "#tag",
            "access_token": "gAAAA-cipher",
            "page_id": "page-9"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let outcome = client.poll(20_161).await.unwrap();

    match outcome {
        PollOutcome::Item(item) => {
            assert_eq!(item.platform, Platform::Facebook);
            assert_eq!(item.kind(), PostKind::LongText);
            assert_eq!(item.body_text(), "long form text");
        }
        other => panic!("expected an item, got {other:?}"),
    }
}

/// 404 means the slot is assigned but empty
#[tokio::test]
async fn test_poll_empty_slot() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slot/7"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let outcome = client.poll(7).await.unwrap();

    assert!(matches!(outcome, PollOutcome::Empty));
}

/// 218 means the slot has no campaign assigned
#[tokio::test]
async fn test_poll_unassigned_slot() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slot/7"))
        .respond_with(ResponseTemplate::new(218))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let outcome = client.poll(7).await.unwrap();

    assert!(matches!(outcome, PollOutcome::Unassigned));
}

/// 400 is reported as a malformed poll, not an auth failure
#[tokio::test]
async fn test_poll_malformed_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slot/7"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.poll(7).await.unwrap_err();

    assert!(matches!(err, QueueError::MalformedRequest { slot: 7 }));
}

/// Any other status is treated as rejected authentication
#[tokio::test]
async fn test_poll_auth_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slot/7"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.poll(7).await.unwrap_err();

    match err {
        QueueError::AuthRejected { slot, status } => {
            assert_eq!(slot, 7);
            assert_eq!(status, 403);
        }
        other => panic!("expected auth rejection, got {other:?}"),
    }
}

/// A success status other than 200 is off-contract and is reported like
/// any other unexpected status, never fed to the item parser
#[tokio::test]
async fn test_poll_off_contract_success_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slot/7"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.poll(7).await.unwrap_err();

    match err {
        QueueError::AuthRejected { slot, status } => {
            assert_eq!(slot, 7);
            assert_eq!(status, 204);
        }
        other => panic!("expected an unexpected-status error, got {other:?}"),
    }
}

/// A 200 body that is not an item is a parse error, not a silent miss
#[tokio::test]
async fn test_poll_garbage_body_is_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slot/7"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.poll(7).await.unwrap_err();

    assert!(matches!(err, QueueError::Parse { slot: 7, .. }));
}

/// Acknowledge swaps the credential token for the delete token
#[tokio::test]
async fn test_ack_carries_delete_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ack/20161"))
        .and(query_param("server_id", "3"))
        .and(query_param("read_token", "read-tok"))
        .and(query_param("delete_token", "delete-tok"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    client.ack(20_161).await.unwrap();
}

/// A refused acknowledgement surfaces slot and status
#[tokio::test]
async fn test_ack_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ack/9"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.ack(9).await.unwrap_err();

    match err {
        QueueError::AckRejected { slot, status } => {
            assert_eq!(slot, 9);
            assert_eq!(status, 500);
        }
        other => panic!("expected ack rejection, got {other:?}"),
    }
}
