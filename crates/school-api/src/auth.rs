//! Account endpoints beyond login/logout, which live on the session.

use serde_json::json;
use session_pipeline::{ApiClient, ApiRequest, ApiResponse, ApiResult, SessionUser};
use tracing::debug;

/// `/auth/*` calls.
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// `GET /auth/me`
    pub async fn current_user(&self) -> ApiResult<SessionUser> {
        let response = self.client.send(ApiRequest::get("/auth/me")).await?;
        response.data()
    }

    /// `POST /auth/change-password`
    ///
    /// The server answers a wrong current password with 401, so this call
    /// never refreshes; the rejection comes back as an `ApiError::Api`
    /// carrying the server's message.
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> ApiResult<ApiResponse> {
        debug!("Changing password");
        let request = ApiRequest::post("/auth/change-password")
            .json(json!({
                "current_password": current_password,
                "new_password": new_password,
            }))
            .without_refresh();
        self.client.send(request).await
    }
}
