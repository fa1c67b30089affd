//! Test helpers
//!
//! [`ScriptedTransport`] answers requests from canned replies and records
//! every request it receives, so tests can assert on exactly which calls
//! the adapter made.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::client::{ApiRequest, ApiResponse, Method, RemoteClient, Transport, product_id_value};
use crate::credentials::{ApiToken, encode_token};
use crate::error::{AdapterError, Result};
use crate::resilience::ResilienceConfig;

type Matcher = Box<dyn Fn(&ApiRequest) -> bool + Send + Sync>;

#[derive(Clone)]
enum Reply {
    Response(ApiResponse),
    Unreachable,
}

struct Route {
    key: String,
    matcher: Matcher,
    replies: VecDeque<Reply>,
}

/// In-memory [`Transport`] with scripted replies
///
/// Replies registered for the same route are returned in order and the
/// last one repeats. Requests matching no route get a 404.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<ApiRequest>>,
    latency: Option<(Method, Duration)>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply to `method` requests whose path starts with `path_prefix`
    pub fn on(self, method: Method, path_prefix: &str, status: u16, body: Value) -> Self {
        let prefix = path_prefix.to_string();
        self.push(
            format!("{:?} {}", method, path_prefix),
            move |r| r.method == method && r.path.starts_with(&prefix),
            Reply::Response(ApiResponse { status, body }),
        )
    }

    /// Reply to job submissions (and probes) for one product
    pub fn on_submit(self, product_id: &str, status: u16, body: Value) -> Self {
        let product = product_id.to_string();
        self.push(
            format!("submit {}", product_id),
            move |r| r.method == Method::Post && submitted_product(r) == Some(product_id_value(&product)),
            Reply::Response(ApiResponse { status, body }),
        )
    }

    /// Fail submissions for one product before any response arrives
    pub fn unreachable_submit(self, product_id: &str) -> Self {
        let product = product_id.to_string();
        self.push(
            format!("submit {}", product_id),
            move |r| r.method == Method::Post && submitted_product(r) == Some(product_id_value(&product)),
            Reply::Unreachable,
        )
    }

    /// Delay every reply to `method` requests by `delay`
    pub fn with_latency(mut self, method: Method, delay: Duration) -> Self {
        self.latency = Some((method, delay));
        self
    }

    fn push(
        self,
        key: String,
        matcher: impl Fn(&ApiRequest) -> bool + Send + Sync + 'static,
        reply: Reply,
    ) -> Self {
        {
            let mut routes = self.routes.lock().expect("routes lock");
            match routes.iter_mut().find(|r| r.key == key) {
                Some(route) => route.replies.push_back(reply),
                None => routes.push(Route {
                    key,
                    matcher: Box::new(matcher),
                    replies: VecDeque::from([reply]),
                }),
            }
        }
        self
    }

    /// All requests received so far
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    /// Number of requests received with the given method and path prefix
    pub fn count(&self, method: Method, path_prefix: &str) -> usize {
        self.requests
            .lock()
            .expect("requests lock")
            .iter()
            .filter(|r| r.method == method && r.path.starts_with(path_prefix))
            .count()
    }

    /// Wrap into a [`RemoteClient`] without retries
    pub fn into_client(self: Arc<Self>) -> RemoteClient {
        let resilience = ResilienceConfig {
            max_retries: 0,
            ..Default::default()
        };
        RemoteClient::new(self, resilience, crate::config::MAX_PAGE_SIZE)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());

        let reply = {
            let mut routes = self.routes.lock().expect("routes lock");
            routes
                .iter_mut()
                .find(|route| (route.matcher)(&request))
                .and_then(|route| {
                    if route.replies.len() > 1 {
                        route.replies.pop_front()
                    } else {
                        route.replies.front().cloned()
                    }
                })
        };

        if let Some((method, delay)) = self.latency
            && method == request.method
        {
            tokio::time::sleep(delay).await;
        }

        match reply {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Unreachable) => Err(AdapterError::Init(format!(
                "connection refused: {}",
                request.path
            ))),
            None => Ok(ApiResponse {
                status: 404,
                body: Value::String(format!("no route for {:?} {}", request.method, request.path)),
            }),
        }
    }
}

fn submitted_product(request: &ApiRequest) -> Option<Value> {
    request
        .body
        .as_ref()
        .and_then(|b| b.get("product_id"))
        .cloned()
}

/// Token for `test:secret`
pub fn test_token() -> ApiToken {
    encode_token(Some("test"), Some("secret")).expect("credentials present")
}
