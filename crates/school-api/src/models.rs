//! Payload shapes shared by the admin and public endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use session_pipeline::{ApiError, ApiResponse, ApiResult};
use std::fmt;

/// Admin collections with full CRUD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Users,
    Students,
    Teachers,
    Materials,
    Schedules,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Users,
        Resource::Students,
        Resource::Teachers,
        Resource::Materials,
        Resource::Schedules,
    ];

    /// Collection path under the API root.
    pub fn admin_path(&self) -> &'static str {
        match self {
            Resource::Users => "/admin/users",
            Resource::Students => "/admin/students",
            Resource::Teachers => "/admin/teachers",
            Resource::Materials => "/admin/materials",
            Resource::Schedules => "/admin/schedules",
        }
    }

    /// Key holding the items inside a list response's `data`.
    pub fn collection_key(&self) -> &'static str {
        match self {
            Resource::Users => "users",
            Resource::Students => "students",
            Resource::Teachers => "teachers",
            Resource::Materials => "materials",
            Resource::Schedules => "schedules",
        }
    }

    pub fn item_path(&self, id: i64) -> String {
        format!("{}/{}", self.admin_path(), id)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection_key())
    }
}

/// One page of a list endpoint.
///
/// Paginated endpoints return `{<key>: [...], total, pages, current_page}`;
/// unpaginated ones return the array directly. Both map here.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Value>,
    pub total: u64,
    pub pages: u64,
    pub current_page: u64,
}

impl Page {
    pub fn from_response(response: &ApiResponse, key: &str) -> ApiResult<Self> {
        Self::from_data(response.data_value(), key)
    }

    pub fn from_data(data: &Value, key: &str) -> ApiResult<Self> {
        if let Some(items) = data.as_array() {
            return Ok(Self::single(items.clone()));
        }

        let items = data
            .get(key)
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| ApiError::MalformedResponse(format!("missing `{}` list", key)))?;

        let number = |field: &str| data.get(field).and_then(Value::as_u64);
        let total = number("total").unwrap_or(items.len() as u64);

        Ok(Self {
            total,
            pages: number("pages").unwrap_or(1),
            current_page: number("current_page").unwrap_or(1),
            items,
        })
    }

    fn single(items: Vec<Value>) -> Self {
        Self {
            total: items.len() as u64,
            pages: 1,
            current_page: 1,
            items,
        }
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.pages
    }
}

/// `GET /admin/dashboard/stats`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub total_students: u64,
    #[serde(default)]
    pub total_teachers: u64,
    #[serde(default)]
    pub pending_registrations: u64,
    #[serde(default)]
    pub total_materials: u64,
    #[serde(default)]
    pub total_schedules: u64,
    #[serde(default)]
    pub recent_registrations: Vec<Map<String, Value>>,
}
