//! Remote job client for the query API
//!
//! [`Transport`] performs one authenticated HTTP call and hands back the
//! status and parsed JSON body. [`RemoteClient`] layers the query API's
//! endpoints on top of it: job submission, job status, catalog and product
//! listing, and the entitlement probe.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::config::ServerConfig;
use crate::credentials::ApiToken;
use crate::error::{AdapterError, Result};
use crate::resilience::{ResilienceConfig, execute_once, execute_with_retry};

/// Longest response body kept in a `Remote` error
const MAX_ERROR_BODY: usize = 512;

/// HTTP method used by the query API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One request against the query API
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Path relative to the API base URL, including query string
    pub path: String,
    /// JSON body (POST only)
    pub body: Option<Value>,
    /// Credentials sent as HTTP Basic auth
    pub token: ApiToken,
}

impl ApiRequest {
    /// Build a GET request
    pub fn get(path: impl Into<String>, token: &ApiToken) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
            token: token.clone(),
        }
    }

    /// Build a POST request with a JSON body
    pub fn post(path: impl Into<String>, body: Value, token: &ApiToken) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: Some(body),
            token: token.clone(),
        }
    }

    /// Path without the query string, used to label errors
    pub fn endpoint(&self) -> &str {
        self.path.split('?').next().unwrap_or(&self.path)
    }
}

/// Status and parsed body of a response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Parsed JSON body (`Null` when empty or not JSON)
    pub body: Value,
}

impl ApiResponse {
    /// Check for a 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs a single authenticated HTTP request
///
/// Implementations must not interpret the status code; that is left to
/// [`RemoteClient`] so 403 can be tolerated where the protocol allows it.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return status plus parsed body
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// reqwest-backed transport
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    api_url: String,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl HttpTransport {
    /// Create a transport for the given base URL
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client creation fails (e.g., TLS misconfiguration)
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("kissql/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| AdapterError::Init(format!("query API HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a transport from server config
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        Self::new(&config.api_url, Duration::from_secs(config.timeout_secs))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = format!("{}{}", self.api_url, request.path);
        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        builder = builder.header(reqwest::header::AUTHORIZATION, request.token.header_value());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        Ok(ApiResponse { status, body })
    }
}

/// Job status as reported by `GET /queries/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobStatus {
    /// Whether the job has finished
    #[serde(default)]
    pub completed: bool,
    /// Row payload (only meaningful once completed)
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    id: Value,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    data: Vec<Value>,
}

/// Query API operations on top of a [`Transport`]
#[derive(Clone)]
pub struct RemoteClient {
    transport: Arc<dyn Transport>,
    resilience: ResilienceConfig,
    page_size: u32,
}

impl std::fmt::Debug for RemoteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteClient")
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl RemoteClient {
    /// Create a client over any transport
    pub fn new(transport: Arc<dyn Transport>, resilience: ResilienceConfig, page_size: u32) -> Self {
        Self {
            transport,
            resilience,
            page_size,
        }
    }

    /// Create an HTTP client from server config
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let transport = HttpTransport::from_config(config)?;
        Ok(Self::new(
            Arc::new(transport),
            config.resilience_config(),
            config.page_size,
        ))
    }

    /// Rows / entries requested per call
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Send a request and fail on any non-2xx status
    async fn send_checked(&self, request: ApiRequest) -> Result<Value> {
        let endpoint = request.endpoint().to_string();
        let response = self.transport.send(request).await?;
        if response.is_success() {
            Ok(response.body)
        } else {
            Err(AdapterError::remote(
                endpoint,
                response.status,
                truncate_body(&response.body),
            ))
        }
    }

    /// Generic authenticated GET, retried on transient failures
    pub async fn get(&self, path: &str, token: &ApiToken) -> Result<Value> {
        execute_with_retry(&self.resilience, path, || {
            self.send_checked(ApiRequest::get(path, token))
        })
        .await
    }

    /// GET a `{data: [...]}` listing and return its entries
    pub async fn get_list(&self, path: &str, token: &ApiToken) -> Result<Vec<Value>> {
        let body = self.get(path, token).await?;
        let list: ListResponse =
            serde_json::from_value(body).map_err(|e| AdapterError::MalformedResponse {
                endpoint: path.to_string(),
                detail: e.to_string(),
            })?;
        Ok(list.data)
    }

    /// Submit a SQL statement as a new job and return its id
    pub async fn submit(&self, product_id: &str, statement: &str, token: &ApiToken) -> Result<String> {
        let body = self
            .send_checked(ApiRequest::post(
                "/queries",
                submit_body(product_id, statement),
                token,
            ))
            .await?;

        let response: SubmitResponse =
            serde_json::from_value(body).map_err(|e| AdapterError::MalformedResponse {
                endpoint: "/queries".to_string(),
                detail: e.to_string(),
            })?;

        let id = match response.id {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            other => {
                return Err(AdapterError::MalformedResponse {
                    endpoint: "/queries".to_string(),
                    detail: format!("unexpected job id: {}", other),
                });
            }
        };
        debug!(product = %product_id, job_id = %id, "query job submitted");
        Ok(id)
    }

    /// Refresh the status of a job
    ///
    /// Sent once: the executor's poll loop owns the pacing, so a failed
    /// check surfaces as an error naming the job.
    pub async fn poll_status(&self, job_id: &str, token: &ApiToken) -> Result<JobStatus> {
        let path = format!("/queries/{}?limit={}", job_id, self.page_size);
        let body = execute_once(
            &self.resilience,
            &path,
            self.send_checked(ApiRequest::get(&path, token)),
        )
        .await
        .map_err(|e| e.for_job(job_id))?;
        serde_json::from_value(body).map_err(|e| AdapterError::MalformedResponse {
            endpoint: format!("/queries/{}", job_id),
            detail: e.to_string(),
        })
    }

    /// Submit an empty statement for a product and return the raw status
    ///
    /// The status alone tells whether the caller may query the product;
    /// it is never turned into an error here.
    pub async fn probe(&self, product_id: &str, token: &ApiToken) -> Result<u16> {
        let response = self
            .transport
            .send(ApiRequest::post("/queries", submit_body(product_id, ""), token))
            .await?;
        Ok(response.status)
    }
}

/// Body for `POST /queries`
pub fn submit_body(product_id: &str, statement: &str) -> Value {
    json!({
        "product_id": product_id_value(product_id),
        "query_type": "sql",
        "query_params": {
            "statement": statement,
        },
    })
}

/// Product id as sent in request bodies
///
/// The service issues numeric product ids; anything else is sent verbatim.
pub fn product_id_value(product_id: &str) -> Value {
    match product_id.parse::<u64>() {
        Ok(n) => Value::from(n),
        Err(_) => Value::String(product_id.to_string()),
    }
}

fn truncate_body(body: &Value) -> String {
    let text = match body {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.len() <= MAX_ERROR_BODY {
        return text;
    }
    let mut end = MAX_ERROR_BODY;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;
