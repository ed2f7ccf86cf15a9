//! Integration tests for the request pipeline: sessions, headers, error
//! mapping, cancellation and the callback surface.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use common::{API_KEY, Harness};
use serde_json::json;
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tourney::prelude::*;
use tourney::protocol::{Endpoint, ProtocolError};
use tourney::session::SessionError;
use tourney::store::StoreKey;
use tourney::transport::{HttpResponse, Method, MockTransport, TransportError};

const HOUR: i64 = 60 * 60 * 1000;

fn empty_lists(h: &Harness) {
    h.json(Method::Get, "/tournaments", json!({ "tournaments": [] }));
    h.json(Method::Get, "/player-tournaments", json!({ "tournaments": [] }));
}

fn session_ids(mock: &MockTransport, method: Method, path: &str) -> Vec<String> {
    mock.requests_to(method, path)
        .iter()
        .map(|r| r.header_value("Session-Id").unwrap_or_default().to_string())
        .collect()
}

// =========================================================================
// Builder
// =========================================================================

#[tokio::test]
async fn test_build_without_api_key_is_invalid_input() {
    let h = Harness::new();

    let result = TournamentClient::builder()
        .game_public_key(h.fake.game_public_key())
        .build_with_transport(Arc::clone(&h.mock))
        .await;

    assert!(matches!(result, Err(ClientError::InvalidInput(_))));
}

#[tokio::test]
async fn test_build_with_malformed_game_key_is_crypto_error() {
    let h = Harness::new();

    let result = TournamentClient::builder()
        .api_key(API_KEY)
        .game_public_key("bm90IGEga2V5")
        .build_with_transport(Arc::clone(&h.mock))
        .await;

    assert!(matches!(result, Err(ClientError::Crypto(_))));
}

#[tokio::test]
async fn test_build_sends_nothing() {
    let h = Harness::new();
    let _client = h.client().await;
    assert!(h.mock.requests().is_empty());
}

// =========================================================================
// Identity and registration
// =========================================================================

#[tokio::test]
async fn test_keys_are_generated_once_per_store() {
    let h = Harness::new();

    let first = h.client().await;
    let stored = h.store.get(&StoreKey::PublicKey).unwrap();
    let second = h.client().await;

    assert!(stored.is_some());
    assert_eq!(
        first.session().identity().public_base64(),
        second.session().identity().public_base64()
    );
    assert_eq!(h.store.get(&StoreKey::PublicKey).unwrap(), stored);
}

#[tokio::test]
async fn test_registration_is_persisted_and_short_circuits() {
    let h = Harness::new();
    let client = h.client().await;

    client.ensure_device_registered().await.unwrap();
    client.ensure_device_registered().await.unwrap();
    assert!(h.store.get(&StoreKey::DeviceAppToken).unwrap().is_some());

    let restarted = h.client().await;
    restarted.ensure_device_registered().await.unwrap();

    assert_eq!(h.fake.register_calls(), 1);
}

#[tokio::test]
async fn test_first_request_registers_and_authenticates() {
    let h = Harness::new();
    empty_lists(&h);
    let client = h.client().await;

    client.developer_tournaments().await.unwrap();

    assert_eq!(h.fake.register_calls(), 1);
    assert_eq!(h.fake.auth_calls(), 1);
    assert_eq!(h.fake.last_player_name().as_deref(), Some("coward player"));
    assert_eq!(
        h.store.get(&StoreKey::SessionId).unwrap().as_deref(),
        Some("session-1")
    );
}

// =========================================================================
// Headers and error mapping
// =========================================================================

#[tokio::test]
async fn test_requests_carry_api_key_content_type_and_session() {
    let h = Harness::new();
    empty_lists(&h);
    let client = h.client().await;

    client.developer_tournaments().await.unwrap();

    let request = &h.mock.requests_to(Method::Get, "/tournaments")[0];
    assert_eq!(request.header_value("X-Api-Key"), Some(API_KEY));
    assert_eq!(request.header_value("Content-Type"), Some("application/json"));
    assert_eq!(request.header_value("Session-Id"), Some("session-1"));
    assert_eq!(request.query(), Some("playerAttributes=%7B%22stats%22%3A%22lives%22%7D"));
}

#[tokio::test]
async fn test_non_success_status_is_protocol_error() {
    let h = Harness::new();
    h.status(Method::Get, "/tournaments", 403);
    let client = h.client().await;

    let result = client.developer_tournaments().await;

    match result {
        Err(ClientError::Protocol(ProtocolError::Status { code, .. })) => assert_eq!(code, 403),
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_undecodable_body_is_protocol_error() {
    let h = Harness::new();
    h.mock.respond(Method::Get, "/tournaments", "<html>");
    let client = h.client().await;

    let result = client.developer_tournaments().await;

    assert!(matches!(
        result,
        Err(ClientError::Protocol(ProtocolError::Decode(_)))
    ));
}

#[tokio::test]
async fn test_transport_failure_is_recoverable_network_error() {
    let h = Harness::new();
    h.mock.route(Method::Get, "/tournaments", |_| {
        Err(TransportError::Connect("connection refused".into()))
    });
    let client = h.client().await;

    let err = client.developer_tournaments().await.unwrap_err();

    assert!(matches!(err, ClientError::Network(TransportError::Connect(_))));
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn test_auth_failure_blocks_the_request() {
    let h = Harness::new();
    empty_lists(&h);
    h.fake.set_fail_auth(true);
    let client = h.client().await;

    let result = client.developer_tournaments().await;

    assert!(matches!(
        result,
        Err(ClientError::Session(SessionError::AuthFailed(_)))
    ));
    assert_eq!(h.mock.count(Method::Get, "/tournaments"), 0);
}

// =========================================================================
// Single-flight reauthentication
// =========================================================================

#[tokio::test]
async fn test_concurrent_requests_share_one_authentication() {
    let h = Harness::new();
    empty_lists(&h);
    h.mock.set_latency(Duration::from_millis(10));
    let client = h.client().await;

    let mut tasks = JoinSet::new();
    for _ in 0..8 {
        let client = client.clone();
        tasks.spawn(async move { client.developer_tournaments().await });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    assert_eq!(h.fake.register_calls(), 1);
    assert_eq!(h.fake.auth_calls(), 1);
    let ids = session_ids(&h.mock, Method::Get, "/tournaments");
    assert_eq!(ids.len(), 8);
    assert!(ids.iter().all(|id| id == "session-1"));
}

#[tokio::test]
async fn test_expired_session_is_renewed_once_for_all_waiters() {
    let h = Harness::new();
    empty_lists(&h);
    let client = h.client().await;
    client.developer_tournaments().await.unwrap();

    h.clock.advance(2 * HOUR);
    h.mock.set_latency(Duration::from_millis(10));
    let mut tasks = JoinSet::new();
    for _ in 0..5 {
        let client = client.clone();
        tasks.spawn(async move { client.player_tournaments().await });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    assert_eq!(h.fake.auth_calls(), 2);
    let ids = session_ids(&h.mock, Method::Get, "/player-tournaments");
    assert_eq!(ids.len(), 5);
    assert!(ids.iter().all(|id| id == "session-2"));
}

#[tokio::test]
async fn test_session_valid_at_exact_expiry_instant() {
    let h = Harness::new();
    empty_lists(&h);
    let client = h.client().await;
    client.developer_tournaments().await.unwrap();

    h.clock.advance(HOUR);
    client.developer_tournaments().await.unwrap();
    assert_eq!(h.fake.auth_calls(), 1);

    h.clock.advance(1);
    client.developer_tournaments().await.unwrap();
    assert_eq!(h.fake.auth_calls(), 2);
}

#[tokio::test]
async fn test_persisted_session_is_reused_after_restart() {
    let h = Harness::new();
    empty_lists(&h);
    h.client().await.developer_tournaments().await.unwrap();

    let restarted = h.client().await;
    restarted.developer_tournaments().await.unwrap();

    assert_eq!(h.fake.auth_calls(), 1);
    let ids = session_ids(&h.mock, Method::Get, "/tournaments");
    assert_eq!(ids, ["session-1", "session-1"]);
}

// =========================================================================
// Listing
// =========================================================================

#[tokio::test]
async fn test_list_tournaments_keeps_families_apart() {
    let h = Harness::new();
    h.json(
        Method::Get,
        "/tournaments",
        json!({ "tournaments": [
            { "tournamentId": "t-1", "title": "Speedrun", "canEnter": true, "hasAccessKey": false }
        ]}),
    );
    h.json(
        Method::Get,
        "/player-tournaments",
        json!({ "tournaments": [
            { "tournamentId": "p-1", "title": "Stream night", "canEnter": true, "hasAccessKey": "true" },
            { "tournamentId": "p-2", "title": "Open", "canEnter": true, "hasAccessKey": "false" }
        ]}),
    );
    let client = h.client().await;

    let listing = client.list_tournaments().await.unwrap();

    assert_eq!(listing.developer.len(), 1);
    assert_eq!(listing.developer[0].id, "t-1");
    assert!(!listing.developer[0].is_player_tournament());
    assert_eq!(listing.player.len(), 2);
    assert!(listing.player.iter().all(|t| t.is_player_tournament()));
    assert!(listing.player[0].has_access_key);
    assert!(!listing.player[1].has_access_key);
    assert_eq!(h.fake.auth_calls(), 1);
}

#[tokio::test]
async fn test_list_tournaments_fails_when_either_list_fails() {
    let h = Harness::new();
    h.json(Method::Get, "/tournaments", json!({ "tournaments": [] }));
    h.status(Method::Get, "/player-tournaments", 500);
    let client = h.client().await;

    let err = client.list_tournaments().await.unwrap_err();

    assert!(matches!(err, ClientError::Protocol(_)));
    assert!(err.is_recoverable());
}

// =========================================================================
// Cancellation
// =========================================================================

#[tokio::test]
async fn test_dropping_scope_cancels_in_flight_flow() {
    let h = Harness::new();
    empty_lists(&h);
    let client = h.client().await;
    h.mock.set_latency(Duration::from_secs(30));

    let scope = client.scope();
    let scoped = scope.client();
    let flow = tokio::spawn(async move { scoped.developer_tournaments().await });
    tokio::time::sleep(Duration::from_millis(20)).await;
    drop(scope);

    let result = tokio::time::timeout(Duration::from_secs(5), flow)
        .await
        .expect("cancelled flow should finish promptly")
        .unwrap();

    assert!(matches!(result, Err(ClientError::Cancelled)));
    assert!(!client.is_cancelled());
}

#[tokio::test]
async fn test_cancelled_scope_rejects_new_flows() {
    let h = Harness::new();
    empty_lists(&h);
    let client = h.client().await;

    let scope = client.scope();
    scope.cancel();

    assert!(matches!(
        scope.developer_tournaments().await,
        Err(ClientError::Cancelled)
    ));
    client.developer_tournaments().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_cancels_every_scope() {
    let h = Harness::new();
    empty_lists(&h);
    let client = h.client().await;
    let scope = client.scope();

    client.shutdown().await.unwrap();

    assert!(scope.is_cancelled());
    assert!(matches!(
        client.list_tournaments().await,
        Err(ClientError::Cancelled)
    ));
}

// =========================================================================
// Callback surface
// =========================================================================

#[tokio::test]
async fn test_dispatch_calls_success_handler_once() {
    let h = Harness::new();
    empty_lists(&h);
    let client = h.client().await;
    let failures = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = oneshot::channel();

    let seen = Arc::clone(&failures);
    let operation = PendingOperation::for_endpoint(
        Endpoint::DeveloperTournaments,
        move |body| {
            let _ = tx.send(body);
        },
        move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        },
    );
    client.dispatch(operation).await.unwrap();

    let body = rx.await.unwrap();
    assert!(body.contains("tournaments"));
    assert_eq!(failures.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_dispatch_routes_errors_to_failure_handler() {
    let h = Harness::new();
    let client = h.client().await;
    let successes = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = oneshot::channel();

    let seen = Arc::clone(&successes);
    let operation = PendingOperation::new(
        Method::Post,
        "/prizes/claim",
        move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        },
        move |err| {
            let _ = tx.send(err);
        },
    )
    .body(r#"{"awardedPrizeIds":["ap-1"]}"#);
    client.dispatch(operation).await.unwrap();

    let err = rx.await.unwrap();
    assert!(matches!(err, ClientError::Protocol(ProtocolError::Status { code: 404, .. })));
    assert_eq!(successes.load(Ordering::SeqCst), 0);
    let sent = &h.mock.requests_to(Method::Post, "/prizes/claim")[0];
    assert_eq!(sent.body_str(), Some(r#"{"awardedPrizeIds":["ap-1"]}"#));
}

#[tokio::test]
async fn test_dispatch_on_cancelled_scope_reports_cancelled() {
    let h = Harness::new();
    h.mock.route(Method::Get, "/tournaments", |_| Ok(HttpResponse::ok("{}")));
    let client = h.client().await;
    let scope = client.scope();
    scope.cancel();
    let (tx, rx) = oneshot::channel();

    let operation = PendingOperation::for_endpoint(
        Endpoint::DeveloperTournaments,
        |_| panic!("cancelled operation must not succeed"),
        move |err| {
            let _ = tx.send(err);
        },
    );
    scope.dispatch(operation).await.unwrap();

    assert!(matches!(rx.await.unwrap(), ClientError::Cancelled));
}
