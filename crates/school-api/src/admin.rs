//! Admin dashboard endpoints. Every call requires an authenticated session.

use crate::models::{DashboardStats, Page, Resource};
use crate::ListQuery;
use serde_json::{json, Value};
use session_pipeline::{ApiClient, ApiRequest, ApiResponse, ApiResult};
use tracing::{debug, info};

/// `/admin/*` calls.
pub struct AdminApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AdminApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn dashboard_stats(&self) -> ApiResult<DashboardStats> {
        self.client
            .send(ApiRequest::get("/admin/dashboard/stats"))
            .await?
            .data()
    }

    // ==========================================
    // Generic CRUD
    // ==========================================

    pub async fn list(&self, resource: Resource, query: &ListQuery) -> ApiResult<Page> {
        debug!(%resource, "Listing");
        let response = self
            .client
            .send(ApiRequest::get(query.apply(resource.admin_path())))
            .await?;
        Page::from_response(&response, resource.collection_key())
    }

    pub async fn get(&self, resource: Resource, id: i64) -> ApiResult<ApiResponse> {
        self.client
            .send(ApiRequest::get(resource.item_path(id)))
            .await
    }

    pub async fn create(&self, resource: Resource, body: Value) -> ApiResult<ApiResponse> {
        let response = self
            .client
            .send(ApiRequest::post(resource.admin_path()).json(body))
            .await?;
        info!(%resource, "Created");
        Ok(response)
    }

    pub async fn update(&self, resource: Resource, id: i64, body: Value) -> ApiResult<ApiResponse> {
        let response = self
            .client
            .send(ApiRequest::put(resource.item_path(id)).json(body))
            .await?;
        info!(%resource, id, "Updated");
        Ok(response)
    }

    pub async fn delete(&self, resource: Resource, id: i64) -> ApiResult<ApiResponse> {
        let response = self
            .client
            .send(ApiRequest::delete(resource.item_path(id)))
            .await?;
        info!(%resource, id, "Deleted");
        Ok(response)
    }

    // ==========================================
    // Named lists
    // ==========================================

    pub async fn users(&self) -> ApiResult<Page> {
        self.list(Resource::Users, &ListQuery::new()).await
    }

    /// Filters: `status`, `grade`, `search`, `page`, `per_page`.
    pub async fn students(&self, query: &ListQuery) -> ApiResult<Page> {
        self.list(Resource::Students, query).await
    }

    pub async fn teachers(&self, query: &ListQuery) -> ApiResult<Page> {
        self.list(Resource::Teachers, query).await
    }

    pub async fn materials(&self, query: &ListQuery) -> ApiResult<Page> {
        self.list(Resource::Materials, query).await
    }

    pub async fn schedules(&self, query: &ListQuery) -> ApiResult<Page> {
        self.list(Resource::Schedules, query).await
    }

    // ==========================================
    // Registrations
    // ==========================================

    /// Filters: `status`, `page`, `per_page`.
    pub async fn registrations(&self, query: &ListQuery) -> ApiResult<Page> {
        let response = self
            .client
            .send(ApiRequest::get(query.apply("/admin/registrations")))
            .await?;
        Page::from_response(&response, "registrations")
    }

    /// Approve a pending registration; the server creates the student.
    /// `body` may carry overrides such as `section`; pass `None` for `{}`.
    pub async fn approve_registration(&self, id: i64, body: Option<Value>) -> ApiResult<ApiResponse> {
        let response = self
            .client
            .send(
                ApiRequest::post(format!("/admin/registrations/{}/approve", id))
                    .json(body.unwrap_or_else(|| json!({}))),
            )
            .await?;
        info!(registration_id = id, "Registration approved");
        Ok(response)
    }

    /// Reject a pending registration, optionally with `{"admin_notes": ...}`.
    pub async fn reject_registration(&self, id: i64, body: Option<Value>) -> ApiResult<ApiResponse> {
        let response = self
            .client
            .send(
                ApiRequest::post(format!("/admin/registrations/{}/reject", id))
                    .json(body.unwrap_or_else(|| json!({}))),
            )
            .await?;
        info!(registration_id = id, "Registration rejected");
        Ok(response)
    }
}
