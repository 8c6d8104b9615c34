//! Scripted in-memory transport for unit tests.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use reqwest::{Method, StatusCode};

use super::GatewayError;
use super::transport::{ApiRequest, ApiResponse, Transport};

#[derive(Debug, Clone)]
enum Reply {
    Respond(StatusCode, String),
    Unreachable,
}

#[derive(Debug)]
struct Route {
    method: Method,
    path: String,
    replies: VecDeque<Reply>,
}

/// Answers requests by method and path from a script of replies.
///
/// Each route pops its replies in order and repeats the last one. Unknown
/// routes answer 404. Every request is recorded.
#[derive(Debug, Default)]
pub(crate) struct FakeTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(
        &self,
        method: Method,
        path: &str,
        status: StatusCode,
        body: serde_json::Value,
    ) -> &Self {
        self.push(method, path, Reply::Respond(status, body.to_string()));
        self
    }

    pub(crate) fn fail(&self, method: Method, path: &str) -> &Self {
        self.push(method, path, Reply::Unreachable);
        self
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn requests_to(&self, method: &Method, path: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| &r.method == method && r.path == path)
            .collect()
    }

    fn push(&self, method: Method, path: &str, reply: Reply) {
        let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        match routes
            .iter_mut()
            .find(|r| r.method == method && r.path == path)
        {
            Some(route) => route.replies.push_back(reply),
            None => routes.push(Route {
                method,
                path: path.to_string(),
                replies: VecDeque::from([reply]),
            }),
        }
    }

    fn next_reply(&self, method: &Method, path: &str) -> Option<Reply> {
        let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        let route = routes
            .iter_mut()
            .find(|r| &r.method == method && r.path == path)?;
        if route.replies.len() > 1 {
            route.replies.pop_front()
        } else {
            route.replies.front().cloned()
        }
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, GatewayError> {
        // Let concurrently issued requests all get in flight first.
        tokio::task::yield_now().await;

        let reply = self.next_reply(&request.method, &request.path);
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        match reply {
            Some(Reply::Respond(status, body)) => Ok(ApiResponse { status, body }),
            Some(Reply::Unreachable) => Err(GatewayError::Transport(
                "connection refused".to_string(),
            )),
            None => Ok(ApiResponse {
                status: StatusCode::NOT_FOUND,
                body: String::new(),
            }),
        }
    }
}
