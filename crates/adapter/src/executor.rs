//! Asynchronous query execution
//!
//! A query runs as a remote job: one submission, then status checks at a
//! fixed interval until the service reports completion. The job moves
//! through [`JobState`]:
//!
//! ```text
//! Submitted -> Polling -> Complete
//!                     \-> Failed
//!                     \-> TimedOut
//! ```
//!
//! Status checks are strictly sequential and the interval is constant.
//! A timed-out job is abandoned, not cancelled.

use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::client::RemoteClient;
use crate::config::PollConfig;
use crate::credentials::ApiToken;
use crate::error::{AdapterError, Result};

/// Lifecycle of one query job
#[derive(Debug)]
pub enum JobState {
    /// Submission accepted, no status checked yet
    Submitted { job_id: String },
    /// Waiting for completion
    Polling { job_id: String, attempts: u32 },
    /// Service reported completion
    Complete {
        job_id: String,
        attempts: u32,
        data: Value,
    },
    /// A status check failed
    Failed {
        job_id: String,
        attempts: u32,
        error: AdapterError,
    },
    /// Polling limits exhausted
    TimedOut { job_id: String, attempts: u32 },
}

/// Raw payload of a completed job
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub job_id: String,
    /// Status checks performed, including the one that saw completion
    pub attempts: u32,
    /// Row payload exactly as the service returned it
    pub data: Value,
}

/// Submits queries and polls them to completion
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    client: RemoteClient,
    poll: PollConfig,
}

impl QueryExecutor {
    pub fn new(client: RemoteClient, poll: PollConfig) -> Self {
        Self { client, poll }
    }

    pub fn poll_config(&self) -> &PollConfig {
        &self.poll
    }

    /// Execute `sql` against a product and return the raw row payload
    ///
    /// Without a token nothing is sent and an empty row list is returned.
    pub async fn execute(&self, token: Option<&ApiToken>, product_id: &str, sql: &str) -> Result<Value> {
        match token {
            Some(token) => Ok(self.run(token, product_id, sql).await?.data),
            None => Ok(Value::Array(Vec::new())),
        }
    }

    /// Submit a job and drive it to a terminal state
    pub async fn run(&self, token: &ApiToken, product_id: &str, sql: &str) -> Result<JobOutcome> {
        let job_id = self.client.submit(product_id, sql, token).await?;
        info!(product = %product_id, job_id = %job_id, "new query started");

        let started = Instant::now();
        let mut state = JobState::Submitted { job_id };
        loop {
            state = match state {
                JobState::Complete {
                    job_id,
                    attempts,
                    data,
                } => {
                    debug!(
                        job_id = %job_id,
                        attempts,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "query completed"
                    );
                    return Ok(JobOutcome {
                        job_id,
                        attempts,
                        data,
                    });
                }
                JobState::Failed {
                    job_id,
                    attempts,
                    error,
                } => {
                    warn!(job_id = %job_id, attempts, error = %error, "query status check failed");
                    return Err(error);
                }
                JobState::TimedOut { job_id, attempts } => {
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    warn!(job_id = %job_id, attempts, elapsed_ms, "query polling limits reached, abandoning job");
                    return Err(AdapterError::JobTimedOut {
                        job_id,
                        attempts,
                        elapsed_ms,
                    });
                }
                pending => self.advance(pending, token, started).await,
            };
        }
    }

    /// Perform one transition
    async fn advance(&self, state: JobState, token: &ApiToken, started: Instant) -> JobState {
        match state {
            JobState::Submitted { job_id } => JobState::Polling {
                job_id,
                attempts: 0,
            },
            JobState::Polling { job_id, attempts } => {
                if self.limits_reached(attempts, started) {
                    return JobState::TimedOut { job_id, attempts };
                }

                tokio::time::sleep(self.poll.interval()).await;
                let attempts = attempts + 1;

                match self.client.poll_status(&job_id, token).await {
                    Ok(status) if status.completed => JobState::Complete {
                        job_id,
                        attempts,
                        data: status.data,
                    },
                    Ok(_) => {
                        debug!(job_id = %job_id, attempts, "query still running");
                        JobState::Polling { job_id, attempts }
                    }
                    Err(error) => JobState::Failed {
                        job_id,
                        attempts,
                        error,
                    },
                }
            }
            terminal => terminal,
        }
    }

    /// Whether another wait + status check would exceed the configured limits
    fn limits_reached(&self, attempts: u32, started: Instant) -> bool {
        if let Some(max) = self.poll.max_attempts
            && attempts >= max
        {
            return true;
        }
        if let Some(max_wait) = self.poll.max_wait()
            && started.elapsed() + self.poll.interval() > max_wait
        {
            return true;
        }
        false
    }
}

#[cfg(test)]
#[path = "executor_test.rs"]
mod executor_test;
