//! Authenticated request executor.
//!
//! [`ApiClient::send`] attaches the stored access token, classifies the
//! outcome, and recovers a single 401 by refreshing and re-issuing the same
//! request once. It is the only path to the backend.

use crate::error::{ApiError, ApiResult, GENERIC_ERROR_MESSAGE};
use crate::refresh::TokenRefresher;
use crate::request::{ApiRequest, ApiResponse};
use crate::state::SessionState;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use token_store::TokenStore;
use tracing::{debug, info, warn};
use url::Url;

/// Attempt 0, then one retry after a refresh.
const MAX_ATTEMPTS: u32 = 2;

/// Sends requests to the API root on behalf of a session.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    api_root: Url,
    transport: Arc<dyn HttpTransport>,
    store: Arc<TokenStore>,
    refresher: TokenRefresher,
    state: Arc<SessionState>,
}

impl ApiClient {
    pub fn new(
        api_root: Url,
        transport: Arc<dyn HttpTransport>,
        store: Arc<TokenStore>,
        state: Arc<SessionState>,
    ) -> Self {
        let refresher = TokenRefresher::new(transport.clone(), store.clone(), &api_root);
        Self {
            inner: Arc::new(ClientInner {
                api_root,
                transport,
                store,
                refresher,
                state,
            }),
        }
    }

    pub fn api_root(&self) -> &Url {
        &self.inner.api_root
    }

    pub fn refresher(&self) -> &TokenRefresher {
        &self.inner.refresher
    }

    /// Resolve `path` against the API root: `/auth/me` becomes
    /// `<base>/api/auth/me`. Paths that resolve outside the API root, such
    /// as absolute URLs, are refused so credentials never leave it.
    pub fn url_for(&self, path: &str) -> ApiResult<Url> {
        let root = &self.inner.api_root;
        let url = root.join(path.trim_start_matches('/'))?;
        if url.origin() != root.origin() || !url.path().starts_with(root.path()) {
            return Err(ApiError::InvalidUrl(format!(
                "{} is outside the API root {}",
                path, root
            )));
        }
        Ok(url)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.state.is_closed()
    }

    /// Refuse further requests and drop any in-flight refresh. Requests
    /// already under way finish with [`ApiError::Closed`].
    pub fn close(&self) {
        if self.inner.state.close() {
            self.inner.refresher.cancel();
            info!("Session closed");
        }
    }

    fn ensure_open(&self) -> ApiResult<()> {
        if self.is_closed() {
            Err(ApiError::Closed)
        } else {
            Ok(())
        }
    }

    /// Send a request, refreshing the access token at most once.
    pub async fn send(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        self.ensure_open()?;
        let url = self.url_for(&request.path)?;
        let mut token = if request.requires_auth {
            self.inner.store.access_token()
        } else {
            None
        };

        for attempt in 0..MAX_ATTEMPTS {
            let response = self.dispatch(&request, &url, token.clone()).await?;
            self.ensure_open()?;

            if response.status != StatusCode::UNAUTHORIZED || !request.refresh_on_401 {
                return classify(response);
            }

            if attempt + 1 == MAX_ATTEMPTS {
                warn!(path = %request.path, "Request rejected again after token refresh");
                self.expire_session();
                return Err(ApiError::AuthExpired);
            }

            debug!(path = %request.path, "Access token rejected, refreshing");
            match self.inner.refresher.refresh_rejected(token.as_deref()).await {
                Ok(new_token) => token = Some(new_token),
                Err(failure) => {
                    info!(path = %request.path, reason = %failure, "Session expired");
                    self.expire_session();
                    return Err(ApiError::AuthExpired);
                }
            }
        }

        Err(ApiError::AuthExpired)
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        url: &Url,
        bearer: Option<String>,
    ) -> ApiResult<HttpResponse> {
        debug!(method = %request.method, path = %request.path, "Sending request");

        let response = self
            .inner
            .transport
            .execute(HttpRequest {
                method: request.method.clone(),
                url: url.clone(),
                bearer,
                headers: request.headers.clone(),
                body: request.body.clone(),
            })
            .await
            .map_err(|e| {
                warn!(method = %request.method, path = %request.path, error = %e, "Request failed");
                ApiError::Transport(e.to_string())
            })?;

        debug!(path = %request.path, status = %response.status, "Received response");
        Ok(response)
    }

    fn expire_session(&self) {
        self.inner.store.clear_session();
        self.inner.state.expire();
    }
}

fn classify(response: HttpResponse) -> ApiResult<ApiResponse> {
    let status = response.status;

    if status.is_success() {
        let body = if response.body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&response.body)
                .map_err(|e| ApiError::MalformedResponse(e.to_string()))?
        };
        return Ok(ApiResponse { status, body });
    }

    let message = serde_json::from_str::<Value>(&response.body)
        .ok()
        .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_string))
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());

    Err(ApiError::Api { status, message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth_fsm::{SessionMachineInput, SessionStatus};
    use crate::testing::{MockResponse, MockTransport};
    use reqwest::Method;
    use serde_json::json;
    use token_store::{create_memory_token_store, SessionUser, TokenPair};

    struct Fixture {
        transport: Arc<MockTransport>,
        store: Arc<TokenStore>,
        state: Arc<SessionState>,
        client: ApiClient,
    }

    fn fixture() -> Fixture {
        let transport = Arc::new(MockTransport::new());
        let store = Arc::new(create_memory_token_store());
        let state = Arc::new(SessionState::new());
        let client = ApiClient::new(
            Url::parse("http://school.test/api/").unwrap(),
            transport.clone(),
            store.clone(),
            state.clone(),
        );
        Fixture {
            transport,
            store,
            state,
            client,
        }
    }

    fn sign_in(f: &Fixture) {
        f.store.set_token_pair(&TokenPair {
            access_token: "access-1".to_string(),
            refresh_token: "refresh-1".to_string(),
        });
        let user = SessionUser::new(1, "admin");
        f.store.set_cached_user(&user);
        f.state
            .transition(&SessionMachineInput::LoginAttempt, None)
            .unwrap();
        f.state
            .transition(&SessionMachineInput::LoginSucceeded, Some(user))
            .unwrap();
    }

    #[test]
    fn test_url_for_joins_under_api_root() {
        let f = fixture();
        assert_eq!(
            f.client.url_for("/admin/students?page=2").unwrap().as_str(),
            "http://school.test/api/admin/students?page=2"
        );
        assert_eq!(
            f.client.url_for("auth/me").unwrap().as_str(),
            "http://school.test/api/auth/me"
        );
    }

    #[tokio::test]
    async fn test_refuses_paths_outside_api_root() {
        let f = fixture();
        sign_in(&f);

        for path in ["http://evil.test/steal", "https://school.test/api/x", "../admin/x"] {
            assert!(
                matches!(f.client.url_for(path), Err(ApiError::InvalidUrl(_))),
                "{path} should be refused"
            );
        }

        let err = f
            .client
            .send(ApiRequest::get("http://evil.test/steal"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
        assert_eq!(f.transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_closed_client_fails_fast() {
        let f = fixture();
        sign_in(&f);
        f.transport.route(
            Method::GET,
            "/api/admin/students",
            MockResponse::ok(json!([])),
        );

        f.client.close();
        assert!(f.client.is_closed());

        let err = f.client.send(ApiRequest::get("/admin/students")).await.unwrap_err();
        assert_eq!(err, ApiError::Closed);
        assert_eq!(f.transport.request_count(), 0);
        assert_eq!(f.store.access_token().as_deref(), Some("access-1"));
    }

    #[tokio::test]
    async fn test_close_during_request_skips_refresh() {
        let f = fixture();
        sign_in(&f);
        f.transport.route(
            Method::GET,
            "/api/admin/students",
            MockResponse::failure(StatusCode::UNAUTHORIZED, "Token has expired")
                .with_delay(std::time::Duration::from_millis(20)),
        );

        let client = f.client.clone();
        let pending = tokio::spawn(async move { client.send(ApiRequest::get("/admin/students")).await });
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        f.client.close();

        assert_eq!(pending.await.unwrap().unwrap_err(), ApiError::Closed);
        assert_eq!(f.transport.count(Method::POST, "/api/auth/refresh"), 0);
        assert_eq!(f.store.access_token().as_deref(), Some("access-1"));
    }

    #[tokio::test]
    async fn test_attaches_bearer_and_returns_body() {
        let f = fixture();
        sign_in(&f);
        f.transport.route(
            Method::GET,
            "/api/admin/students",
            MockResponse::ok(json!([{"id": 1}])),
        );

        let response = f.client.send(ApiRequest::get("/admin/students")).await.unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert!(response.is_success());

        let sent = f.transport.requests();
        assert_eq!(sent[0].bearer.as_deref(), Some("access-1"));
    }

    #[tokio::test]
    async fn test_success_false_is_returned_as_is() {
        let f = fixture();
        f.transport.route(
            Method::GET,
            "/api/public/teachers",
            MockResponse::json(StatusCode::OK, json!({"success": false, "message": "empty"})),
        );

        let response = f
            .client
            .send(ApiRequest::get("/public/teachers").public())
            .await
            .unwrap();
        assert!(!response.is_success());
        assert_eq!(response.message(), Some("empty"));
    }

    #[tokio::test]
    async fn test_public_request_sends_no_bearer() {
        let f = fixture();
        sign_in(&f);
        f.transport
            .route(Method::GET, "/api/public/departments", MockResponse::ok(json!([])));

        f.client
            .send(ApiRequest::get("/public/departments").public())
            .await
            .unwrap();
        assert!(f.transport.requests()[0].bearer.is_none());
    }

    #[tokio::test]
    async fn test_error_status_uses_server_message() {
        let f = fixture();
        sign_in(&f);
        f.transport.route(
            Method::POST,
            "/api/admin/users",
            MockResponse::failure(StatusCode::BAD_REQUEST, "Username already exists"),
        );

        let err = f.client.send(ApiRequest::post("/admin/users")).await.unwrap_err();
        assert_eq!(
            err,
            ApiError::Api {
                status: StatusCode::BAD_REQUEST,
                message: "Username already exists".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_error_status_without_message_uses_generic_text() {
        let f = fixture();
        sign_in(&f);
        f.transport.route(
            Method::GET,
            "/api/admin/dashboard/stats",
            MockResponse::text(StatusCode::INTERNAL_SERVER_ERROR, "<html>boom</html>"),
        );

        let err = f
            .client
            .send(ApiRequest::get("/admin/dashboard/stats"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), GENERIC_ERROR_MESSAGE);
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        // No refresh for non-401 errors
        assert_eq!(f.transport.count(Method::POST, "/api/auth/refresh"), 0);
    }

    #[tokio::test]
    async fn test_malformed_success_body() {
        let f = fixture();
        f.transport.route(
            Method::GET,
            "/api/public/materials",
            MockResponse::text(StatusCode::OK, "not json"),
        );

        let err = f
            .client
            .send(ApiRequest::get("/public/materials").public())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
        assert!(err.is_transport_class());
    }

    #[tokio::test]
    async fn test_transport_error_is_not_retried() {
        let f = fixture();
        sign_in(&f);
        f.transport.route(
            Method::GET,
            "/api/admin/students",
            MockResponse::transport_error("connection refused"),
        );

        let err = f.client.send(ApiRequest::get("/admin/students")).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert_eq!(f.transport.request_count(), 1);
        assert_eq!(f.store.access_token(), Some("access-1".to_string()));
    }

    #[tokio::test]
    async fn test_public_401_surfaces_server_message() {
        let f = fixture();
        f.transport.route(
            Method::POST,
            "/api/auth/login",
            MockResponse::failure(StatusCode::UNAUTHORIZED, "Invalid credentials"),
        );

        let err = f
            .client
            .send(ApiRequest::post("/auth/login").public())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid credentials");
        assert_eq!(f.transport.count(Method::POST, "/api/auth/refresh"), 0);
    }

    #[tokio::test]
    async fn test_without_refresh_401_keeps_session() {
        let f = fixture();
        sign_in(&f);
        f.transport.route(
            Method::POST,
            "/api/auth/change-password",
            MockResponse::failure(StatusCode::UNAUTHORIZED, "Current password is incorrect"),
        );

        let err = f
            .client
            .send(ApiRequest::post("/auth/change-password").without_refresh())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Current password is incorrect");
        assert_eq!(f.transport.requests()[0].bearer.as_deref(), Some("access-1"));
        assert_eq!(f.transport.count(Method::POST, "/api/auth/refresh"), 0);
        assert!(f.state.status().is_authenticated());
    }

    #[tokio::test]
    async fn test_refresh_failure_clears_store_and_downgrades() {
        let f = fixture();
        sign_in(&f);
        f.transport.route(
            Method::GET,
            "/api/admin/students",
            MockResponse::failure(StatusCode::UNAUTHORIZED, "Token has expired"),
        );
        f.transport.route(
            Method::POST,
            "/api/auth/refresh",
            MockResponse::failure(StatusCode::UNAUTHORIZED, "Token has expired"),
        );

        let err = f.client.send(ApiRequest::get("/admin/students")).await.unwrap_err();
        assert_eq!(err, ApiError::AuthExpired);
        assert!(f.store.is_session_empty());
        assert_eq!(f.state.status(), SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_second_401_is_auth_expired() {
        let f = fixture();
        sign_in(&f);
        f.transport.route(
            Method::GET,
            "/api/admin/students",
            MockResponse::failure(StatusCode::UNAUTHORIZED, "Token has been revoked"),
        );
        f.transport.route(
            Method::POST,
            "/api/auth/refresh",
            MockResponse::ok(json!({"access_token": "access-2"})),
        );

        let err = f.client.send(ApiRequest::get("/admin/students")).await.unwrap_err();
        assert_eq!(err, ApiError::AuthExpired);
        assert_eq!(f.transport.count(Method::GET, "/api/admin/students"), 2);
        assert_eq!(f.transport.count(Method::POST, "/api/auth/refresh"), 1);
        assert!(f.store.is_session_empty());
        assert_eq!(f.state.status(), SessionStatus::Unauthenticated);
    }
}
