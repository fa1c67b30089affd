//! Error types for the adapter

use thiserror::Error;

/// Errors that can occur during adapter operations
#[derive(Error, Debug)]
pub enum AdapterError {
    /// Operation is not implemented by this client
    #[error("\"{0}\" is not implemented by the kissmetrics client")]
    Unsupported(&'static str),

    /// Failed to initialize the adapter (e.g., HTTP client creation failed)
    #[error("failed to initialize adapter: {0}")]
    Init(String),

    /// Remote service answered with a non-success status
    #[error("{}", remote_message(.endpoint, .job_id, .status, .body))]
    Remote {
        /// Endpoint path that failed (e.g., "/queries")
        endpoint: String,
        /// Job being polled, if any
        job_id: Option<String>,
        /// HTTP status code
        status: u16,
        /// Response body (possibly truncated)
        body: String,
    },

    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Response did not have the expected shape
    #[error("malformed response from {endpoint}: {detail}")]
    MalformedResponse {
        /// Endpoint path
        endpoint: String,
        /// What was missing or wrong
        detail: String,
    },

    /// A single request exceeded its timeout
    #[error("{operation} timed out after {timeout_secs}s")]
    RequestTimedOut {
        /// Operation being attempted
        operation: String,
        /// Configured timeout
        timeout_secs: u64,
    },

    /// Query job did not complete within the polling limits
    #[error("query job {job_id} did not complete after {attempts} status checks ({elapsed_ms}ms)")]
    JobTimedOut {
        /// Remote job identifier
        job_id: String,
        /// Status checks performed
        attempts: u32,
        /// Time spent polling
        elapsed_ms: u64,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl AdapterError {
    /// Create a Remote error for an endpoint outside of any job
    pub fn remote(endpoint: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Remote {
            endpoint: endpoint.into(),
            job_id: None,
            status,
            body: body.into(),
        }
    }

    /// Attach a job id to a Remote error, leaving other variants untouched
    pub fn for_job(self, id: &str) -> Self {
        match self {
            Self::Remote {
                endpoint,
                status,
                body,
                ..
            } => Self::Remote {
                endpoint,
                job_id: Some(id.to_string()),
                status,
                body,
            },
            other => other,
        }
    }

    /// HTTP status of a Remote error
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

fn remote_message(endpoint: &str, job_id: &Option<String>, status: &u16, body: &str) -> String {
    match job_id {
        Some(id) => format!("remote service error on {endpoint} (job {id}): HTTP {status}: {body}"),
        None => format!("remote service error on {endpoint}: HTTP {status}: {body}"),
    }
}

/// Result type for adapter operations
pub type Result<T> = std::result::Result<T, AdapterError>;
