//! Startup check.
//!
//! - Scenario A: empty store resolves to `Unauthenticated` with no request
//! - Scenario B: a valid token resolves to `Authenticated` and refreshes the cache
//! - P5: identity failure with a cached user and an access token stays
//!   `Authenticated` with the cached user

use super::harness::{admin, TestHarness, ME};
use crate::testing::MockResponse;
use crate::{Method, SessionPhase, SessionStatus, SessionUser, StatusCode};
use serde_json::json;

/// Scenario A
#[tokio::test]
async fn scenario_a_empty_store_is_unauthenticated_without_network() {
    let harness = TestHarness::new();
    assert_eq!(harness.session.status(), SessionStatus::Unknown);

    let status = harness.session.check_auth().await.unwrap();

    assert_eq!(status, SessionStatus::Unauthenticated);
    assert_eq!(harness.transport.request_count(), 0);
}

/// Scenario B
#[tokio::test]
async fn scenario_b_valid_token_is_authenticated_and_cached() {
    let harness = TestHarness::new();
    harness.session.store().set_access_token("access-1");
    harness.transport.route(
        Method::GET,
        ME,
        MockResponse::json(
            StatusCode::OK,
            json!({"success": true, "data": {"id": 1, "username": "admin"}}),
        ),
    );

    let status = harness.session.check_auth().await.unwrap();

    let expected = SessionUser::new(1, "admin");
    assert_eq!(status, SessionStatus::Authenticated(expected.clone()));
    assert_eq!(harness.session.user(), Some(expected.clone()));
    assert_eq!(harness.session.store().cached_user(), Some(expected));
    assert_eq!(
        harness.transport.requests()[0].bearer.as_deref(),
        Some("access-1")
    );
}

/// Scenario B: the server copy replaces a stale cache
#[tokio::test]
async fn identity_overwrites_stale_cache() {
    let harness = TestHarness::with_stored_session();
    let mut renamed = admin();
    renamed.full_name = Some("Head Admin".to_string());
    harness
        .transport
        .route(Method::GET, ME, MockResponse::ok(json!(renamed)));

    harness.session.check_auth().await.unwrap();

    assert_eq!(harness.session.store().cached_user(), Some(renamed));
}

/// P5: network failure falls back to the cached user
#[tokio::test]
async fn p5_transport_failure_uses_cached_user() {
    let harness = TestHarness::with_stored_session();
    harness
        .transport
        .route(Method::GET, ME, MockResponse::transport_error("timed out"));

    let status = harness.session.check_auth().await.unwrap();

    assert_eq!(status, SessionStatus::Authenticated(admin()));
    assert_eq!(
        harness.session.store().access_token(),
        Some("access-1".to_string())
    );
}

/// P5: server error falls back to the cached user
#[tokio::test]
async fn p5_server_error_uses_cached_user() {
    let harness = TestHarness::with_stored_session();
    harness.transport.route(
        Method::GET,
        ME,
        MockResponse::failure(StatusCode::NOT_FOUND, "User not found"),
    );

    let status = harness.session.check_auth().await.unwrap();

    assert_eq!(status, SessionStatus::Authenticated(admin()));
}

/// P5: `success: false` counts as a failed identity call
#[tokio::test]
async fn p5_success_false_uses_cached_user() {
    let harness = TestHarness::with_stored_session();
    harness.transport.route(
        Method::GET,
        ME,
        MockResponse::json(StatusCode::OK, json!({"success": false, "message": "nope"})),
    );

    let status = harness.session.check_auth().await.unwrap();

    assert_eq!(status, SessionStatus::Authenticated(admin()));
}

/// Failure with no cached user
#[tokio::test]
async fn identity_failure_without_cache_is_unauthenticated() {
    let harness = TestHarness::new();
    harness.session.store().set_access_token("access-1");
    harness
        .transport
        .route(Method::GET, ME, MockResponse::transport_error("timed out"));

    let status = harness.session.check_auth().await.unwrap();

    assert_eq!(status, SessionStatus::Unauthenticated);
    assert_eq!(harness.session.phase(), SessionPhase::Unauthenticated);
}

/// An expired token is renewed during the startup check
#[tokio::test]
async fn startup_check_refreshes_expired_token() {
    let harness = TestHarness::with_stored_session();
    harness.transport.route_fn(Method::GET, ME, |request| {
        if request.bearer.as_deref() == Some("access-2") {
            MockResponse::ok(json!(admin()))
        } else {
            MockResponse::json(StatusCode::UNAUTHORIZED, json!({"msg": "Token has expired"}))
        }
    });
    harness.refresh_succeeds("access-2", 0);

    let status = harness.session.check_auth().await.unwrap();

    assert_eq!(status, SessionStatus::Authenticated(admin()));
    assert_eq!(harness.refresh_count(), 1);
}
