//! Request and response types exchanged with the executor.

use crate::error::{ApiError, ApiResult};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A request relative to the API root.
///
/// `path` is appended to `<base>/api`, so `/admin/students` resolves to
/// `<base>/api/admin/students`. A query string may be included.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
    /// Attach the stored access token.
    pub requires_auth: bool,
    /// Treat a 401 as an expired token and recover it through refresh.
    pub refresh_on_401: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: Vec::new(),
            requires_auth: true,
            refresh_on_401: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Send without credentials. A 401 is reported as an ordinary
    /// [`ApiError::Api`] and never triggers a refresh.
    pub fn public(mut self) -> Self {
        self.requires_auth = false;
        self.refresh_on_401 = false;
        self
    }

    /// Send credentials but report a 401 as [`ApiError::Api`]. For
    /// endpoints that answer 401 to bad input, such as a wrong current
    /// password.
    pub fn without_refresh(mut self) -> Self {
        self.refresh_on_401 = false;
        self
    }
}

/// A 2xx response with its JSON body.
///
/// The backend wraps payloads as `{success, message, data}`; callers still
/// inspect `success` themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    /// The `success` discriminator. Bodies without one count as successful.
    pub fn is_success(&self) -> bool {
        self.body
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }

    /// The raw `data` field, or `Value::Null`.
    pub fn data_value(&self) -> &Value {
        self.body.get("data").unwrap_or(&Value::Null)
    }

    /// Deserialize the `data` field.
    pub fn data<T: DeserializeOwned>(&self) -> ApiResult<T> {
        serde_json::from_value(self.data_value().clone())
            .map_err(|e| ApiError::MalformedResponse(e.to_string()))
    }
}
