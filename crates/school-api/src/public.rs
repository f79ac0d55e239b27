//! Unauthenticated endpoints behind the public pages.

use crate::models::Page;
use crate::ListQuery;
use serde_json::Value;
use session_pipeline::{ApiClient, ApiRequest, ApiResponse, ApiResult};
use tracing::debug;

/// `/public/*` calls. None of them carry credentials.
pub struct PublicApi<'a> {
    client: &'a ApiClient,
}

impl<'a> PublicApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    async fn get(&self, path: String) -> ApiResult<ApiResponse> {
        self.client.send(ApiRequest::get(path).public()).await
    }

    /// Filters: `department`, `search`, `page`, `per_page`.
    pub async fn teachers(&self, query: &ListQuery) -> ApiResult<Page> {
        let response = self.get(query.apply("/public/teachers")).await?;
        Page::from_response(&response, "teachers")
    }

    pub async fn teacher(&self, id: i64) -> ApiResult<ApiResponse> {
        self.get(format!("/public/teachers/{}", id)).await
    }

    pub async fn departments(&self) -> ApiResult<Vec<String>> {
        self.get("/public/teachers/departments".to_string())
            .await?
            .data()
    }

    /// Filters: `subject`, `grade_level`, `type`, `search`, `page`, `per_page`.
    pub async fn materials(&self, query: &ListQuery) -> ApiResult<Page> {
        let response = self.get(query.apply("/public/materials")).await?;
        Page::from_response(&response, "materials")
    }

    pub async fn material(&self, id: i64) -> ApiResult<ApiResponse> {
        self.get(format!("/public/materials/{}", id)).await
    }

    /// `{subjects, grade_levels, types}`
    pub async fn material_filters(&self) -> ApiResult<Value> {
        let response = self.get("/public/materials/filters".to_string()).await?;
        Ok(response.data_value().clone())
    }

    /// Filters: `grade_level`, `section`, `day`, `page`, `per_page`.
    pub async fn schedules(&self, query: &ListQuery) -> ApiResult<Page> {
        let response = self.get(query.apply("/public/schedules")).await?;
        Page::from_response(&response, "schedules")
    }

    /// `{grade_levels, sections, days}`
    pub async fn schedule_filters(&self) -> ApiResult<Value> {
        let response = self.get("/public/schedules/filters".to_string()).await?;
        Ok(response.data_value().clone())
    }

    /// `POST /public/register`. Validation failures come back as
    /// [`session_pipeline::ApiError::Api`] with the server's message.
    pub async fn register_student(&self, registration: Value) -> ApiResult<ApiResponse> {
        debug!("Submitting student registration");
        self.client
            .send(ApiRequest::post("/public/register").json(registration).public())
            .await
    }

    pub async fn check_registration_status(&self, email: &str) -> ApiResult<ApiResponse> {
        let query = ListQuery::new().param("email", email);
        self.get(query.apply("/public/register/check")).await
    }
}
