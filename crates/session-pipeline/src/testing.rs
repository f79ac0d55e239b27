//! Scripted in-memory transport.
//!
//! Useful for testing code built on the pipeline without a server. Routes
//! match on method and URL path (query strings are ignored); every request
//! is recorded for later inspection. Unmatched requests get a 404 envelope.

use crate::transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

/// A canned response, optionally delayed.
#[derive(Debug, Clone)]
pub struct MockResponse {
    outcome: Result<HttpResponse, TransportError>,
    delay: Option<Duration>,
}

impl MockResponse {
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self::text(status, &body.to_string())
    }

    pub fn text(status: StatusCode, body: &str) -> Self {
        Self {
            outcome: Ok(HttpResponse {
                status,
                body: body.to_string(),
            }),
            delay: None,
        }
    }

    /// `200 {"success": true, "data": data}`
    pub fn ok(data: Value) -> Self {
        Self::json(StatusCode::OK, json!({"success": true, "data": data}))
    }

    /// `{"success": false, "message": message}` with the given status.
    pub fn failure(status: StatusCode, message: &str) -> Self {
        Self::json(status, json!({"success": false, "message": message}))
    }

    pub fn transport_error(message: &str) -> Self {
        Self {
            outcome: Err(TransportError::Connect(message.to_string())),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

type Responder = Arc<dyn Fn(&HttpRequest) -> MockResponse + Send + Sync>;

#[derive(Default)]
struct Routes {
    /// One-shot responses, consumed before the fallback.
    queued: HashMap<(Method, String), VecDeque<MockResponse>>,
    fallback: HashMap<(Method, String), Responder>,
}

/// [`HttpTransport`] answering from scripted routes.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<Routes>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every matching request with `response`.
    pub fn route(&self, method: Method, path: &str, response: MockResponse) {
        self.route_fn(method, path, move |_| response.clone());
    }

    /// Answer matching requests by inspecting them.
    pub fn route_fn<F>(&self, method: Method, path: &str, responder: F)
    where
        F: Fn(&HttpRequest) -> MockResponse + Send + Sync + 'static,
    {
        self.routes
            .lock()
            .fallback
            .insert((method, path.to_string()), Arc::new(responder));
    }

    /// Answer the next matching request with `response`, once.
    pub fn enqueue(&self, method: Method, path: &str, response: MockResponse) {
        self.routes
            .lock()
            .queued
            .entry((method, path.to_string()))
            .or_default()
            .push_back(response);
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Number of requests received for one route.
    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method && r.url.path() == path)
            .count()
    }

    fn respond(&self, request: &HttpRequest) -> MockResponse {
        let key = (request.method.clone(), request.url.path().to_string());
        let responder = {
            let mut routes = self.routes.lock();
            if let Some(response) = routes.queued.get_mut(&key).and_then(VecDeque::pop_front) {
                return response;
            }
            routes.fallback.get(&key).cloned()
        };

        match responder {
            Some(responder) => responder(request),
            None => MockResponse::failure(StatusCode::NOT_FOUND, "Not found"),
        }
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().push(request.clone());
        let response = self.respond(&request);

        if let Some(delay) = response.delay {
            tokio::time::sleep(delay).await;
        }
        response.outcome
    }
}
