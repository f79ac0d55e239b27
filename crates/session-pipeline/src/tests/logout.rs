//! Logout always clears.
//!
//! - P3: after logout the store holds no token pair or user and the status
//!   is `Unauthenticated`, whether or not the server was reachable

use super::harness::{TestHarness, LOGOUT};
use crate::testing::MockResponse;
use crate::{Method, SessionPhase, SessionStatus, StatusCode};
use serde_json::json;

fn assert_cleared(harness: &TestHarness) {
    assert!(harness.session.store().is_session_empty());
    assert_eq!(harness.session.status(), SessionStatus::Unauthenticated);
    assert_eq!(harness.session.phase(), SessionPhase::Unauthenticated);
    assert!(harness.session.user().is_none());
}

/// P3: server acknowledges
#[tokio::test]
async fn p3_logout_with_reachable_server() {
    let harness = TestHarness::with_stored_session();
    harness.authenticate().await;
    harness.transport.route(
        Method::POST,
        LOGOUT,
        MockResponse::json(StatusCode::OK, json!({"success": true, "message": "Logged out"})),
    );

    harness.session.logout().await;

    assert_eq!(harness.transport.count(Method::POST, LOGOUT), 1);
    assert_cleared(&harness);
}

/// P3: server unreachable
#[tokio::test]
async fn p3_logout_with_unreachable_server() {
    let harness = TestHarness::with_stored_session();
    harness.authenticate().await;
    harness.transport.route(
        Method::POST,
        LOGOUT,
        MockResponse::transport_error("connection refused"),
    );

    harness.session.logout().await;

    assert_cleared(&harness);
}

/// P3: server errors
#[tokio::test]
async fn p3_logout_with_server_error() {
    let harness = TestHarness::with_stored_session();
    harness.authenticate().await;
    harness.transport.route(
        Method::POST,
        LOGOUT,
        MockResponse::text(StatusCode::INTERNAL_SERVER_ERROR, ""),
    );

    harness.session.logout().await;

    assert_cleared(&harness);
}

/// P3: expired access token and revoked refresh token during logout
#[tokio::test]
async fn p3_logout_with_expired_session() {
    let harness = TestHarness::with_stored_session();
    harness.authenticate().await;
    harness.accept_only(Method::POST, LOGOUT, "never-issued");
    harness.refresh_fails();

    harness.session.logout().await;

    assert_cleared(&harness);
}

/// P3: logout before the startup check resolved
#[tokio::test]
async fn p3_logout_from_unknown() {
    let harness = TestHarness::with_stored_session();

    harness.session.logout().await;

    assert_cleared(&harness);
}

/// Status passes through Unknown on its way to Unauthenticated
#[tokio::test]
async fn logout_publishes_loading_then_unauthenticated() {
    let harness = TestHarness::with_stored_session();
    harness.authenticate().await;
    harness.transport.route(
        Method::POST,
        LOGOUT,
        MockResponse::json(StatusCode::OK, json!({"success": true}))
            .with_delay(std::time::Duration::from_millis(10)),
    );
    let mut rx = harness.session.subscribe();
    rx.borrow_and_update();

    let session = harness.session.clone();
    let logout = tokio::spawn(async move { session.logout().await });

    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow_and_update(), SessionStatus::Unknown);

    logout.await.unwrap();
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow_and_update(), SessionStatus::Unauthenticated);
}
