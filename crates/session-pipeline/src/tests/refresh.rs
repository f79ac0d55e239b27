//! Single-flight refresh.
//!
//! - P2: N concurrent requests that all receive 401 cause exactly one
//!   refresh call; every one of them is retried with the new token

use super::harness::{TestHarness, STUDENTS};
use crate::{ApiError, ApiRequest, Method, SessionStatus, StatusCode};
use futures_util::future::join_all;

const CONCURRENT_REQUESTS: usize = 8;

/// P2: one refresh for the whole burst
#[tokio::test]
async fn p2_concurrent_401s_share_one_refresh() {
    let harness = TestHarness::with_stored_session();
    harness.authenticate().await;
    harness.accept_only(Method::GET, STUDENTS, "access-2");
    // Slow enough that every request joins the same exchange
    harness.refresh_succeeds("access-2", 20);

    let requests = (0..CONCURRENT_REQUESTS).map(|_| {
        let session = harness.session.clone();
        tokio::spawn(async move { session.send(ApiRequest::get("/admin/students")).await })
    });
    let results = join_all(requests).await;

    for result in results {
        let response = result.unwrap().unwrap();
        assert_eq!(response.status, StatusCode::OK);
    }
    assert_eq!(harness.refresh_count(), 1);
    assert_eq!(
        harness.session.store().access_token(),
        Some("access-2".to_string())
    );
    assert!(!harness.session.api().refresher().is_refreshing());
}

/// P2: a failed shared refresh fails every waiter the same way
#[tokio::test]
async fn p2_concurrent_waiters_observe_the_same_failure() {
    let harness = TestHarness::with_stored_session();
    harness.authenticate().await;
    harness.accept_only(Method::GET, STUDENTS, "access-2");
    harness.transport.route(
        Method::POST,
        super::harness::REFRESH,
        crate::testing::MockResponse::failure(StatusCode::UNAUTHORIZED, "Token has been revoked")
            .with_delay(std::time::Duration::from_millis(20)),
    );

    let requests = (0..CONCURRENT_REQUESTS).map(|_| {
        let session = harness.session.clone();
        tokio::spawn(async move { session.send(ApiRequest::get("/admin/students")).await })
    });
    let results = join_all(requests).await;

    for result in results {
        assert_eq!(result.unwrap().unwrap_err(), ApiError::AuthExpired);
    }
    assert_eq!(harness.refresh_count(), 1);
    assert!(harness.session.store().is_session_empty());
    assert_eq!(harness.session.status(), SessionStatus::Unauthenticated);
}
