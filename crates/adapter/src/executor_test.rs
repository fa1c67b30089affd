//! Tests for the query executor

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use super::*;
use crate::client::Method;
use crate::resilience::ResilienceConfig;
use crate::test_utils::{ScriptedTransport, test_token};

fn executor(transport: &Arc<ScriptedTransport>, poll: PollConfig) -> QueryExecutor {
    QueryExecutor::new(transport.clone().into_client(), poll)
}

fn running() -> Value {
    json!({"completed": false})
}

// =============================================================================
// Happy path
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_polls_until_completed() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .on_submit("7", 200, json!({"id": "job-1"}))
            .on(Method::Get, "/queries/job-1", 200, running())
            .on(Method::Get, "/queries/job-1", 200, running())
            .on(
                Method::Get,
                "/queries/job-1",
                200,
                json!({"completed": true, "data": [{"person": 1}]}),
            ),
    );
    let executor = executor(&transport, PollConfig::default());

    let started = Instant::now();
    let outcome = executor.run(&test_token(), "7", "SELECT * FROM records").await.unwrap();

    assert_eq!(outcome.job_id, "job-1");
    assert_eq!(outcome.attempts, 3);
    assert_eq!(outcome.data, json!([{"person": 1}]));
    assert_eq!(transport.count(Method::Post, "/queries"), 1);
    assert_eq!(transport.count(Method::Get, "/queries/job-1"), 3);
    // one fixed 2s wait before each status check
    assert_eq!(started.elapsed(), Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn test_first_check_completes() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .on_submit("7", 200, json!({"id": "job-1"}))
            .on(
                Method::Get,
                "/queries/job-1",
                200,
                json!({"completed": true, "data": []}),
            ),
    );
    let executor = executor(&transport, PollConfig::default());

    let started = Instant::now();
    let data = executor.execute(Some(&test_token()), "7", "SELECT 1").await.unwrap();

    assert_eq!(data, json!([]));
    assert_eq!(transport.count(Method::Get, "/queries/"), 1);
    assert_eq!(started.elapsed(), Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_payload_returned_unshaped() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .on_submit("7", 200, json!({"id": "job-1"}))
            .on(
                Method::Get,
                "/queries/job-1",
                200,
                json!({"completed": true, "data": {"count": 3}}),
            ),
    );
    let executor = executor(&transport, PollConfig::default());

    let data = executor.execute(Some(&test_token()), "7", "SELECT 1").await.unwrap();
    assert_eq!(data, json!({"count": 3}));
}

#[tokio::test]
async fn test_no_token_returns_empty_rows_without_requests() {
    let transport = Arc::new(ScriptedTransport::new());
    let executor = executor(&transport, PollConfig::default());

    let data = executor.execute(None, "7", "SELECT 1").await.unwrap();

    assert_eq!(data, json!([]));
    assert!(transport.requests().is_empty());
}

// =============================================================================
// Limits
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_max_attempts_times_out() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .on_submit("7", 200, json!({"id": "job-1"}))
            .on(Method::Get, "/queries/job-1", 200, running()),
    );
    let poll = PollConfig {
        max_attempts: Some(4),
        max_wait_secs: None,
        ..Default::default()
    };
    let executor = executor(&transport, poll);

    let err = executor.run(&test_token(), "7", "SELECT 1").await.unwrap_err();

    assert!(matches!(
        err,
        AdapterError::JobTimedOut { ref job_id, attempts: 4, elapsed_ms: 8000 } if job_id == "job-1"
    ));
    assert_eq!(transport.count(Method::Get, "/queries/job-1"), 4);
}

#[tokio::test(start_paused = true)]
async fn test_max_wait_never_overruns() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .on_submit("7", 200, json!({"id": "job-1"}))
            .on(Method::Get, "/queries/job-1", 200, running()),
    );
    let poll = PollConfig {
        interval_ms: 2000,
        max_attempts: None,
        max_wait_secs: Some(5),
    };
    let executor = executor(&transport, poll);

    let started = Instant::now();
    let err = executor.run(&test_token(), "7", "SELECT 1").await.unwrap_err();

    assert!(matches!(err, AdapterError::JobTimedOut { attempts: 2, .. }));
    assert_eq!(transport.count(Method::Get, "/queries/job-1"), 2);
    assert!(started.elapsed() <= Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_unbounded_polls_past_default_budget() {
    let mut script = ScriptedTransport::new().on_submit("7", 200, json!({"id": "job-1"}));
    for _ in 0..400 {
        script = script.on(Method::Get, "/queries/job-1", 200, running());
    }
    let transport = Arc::new(script.on(
        Method::Get,
        "/queries/job-1",
        200,
        json!({"completed": true, "data": [{"a": 1}]}),
    ));
    let executor = executor(&transport, PollConfig::unbounded());

    let outcome = executor.run(&test_token(), "7", "SELECT 1").await.unwrap();

    assert_eq!(outcome.attempts, 401);
    assert_eq!(outcome.data, json!([{"a": 1}]));
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_status_error_stops_polling() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .on_submit("7", 200, json!({"id": "job-1"}))
            .on(Method::Get, "/queries/job-1", 200, running())
            .on(Method::Get, "/queries/job-1", 401, json!({"error": "unauthorized"})),
    );
    let executor = executor(&transport, PollConfig::default());

    let err = executor.run(&test_token(), "7", "SELECT 1").await.unwrap_err();

    assert!(matches!(
        err,
        AdapterError::Remote { job_id: Some(ref id), status: 401, .. } if id == "job-1"
    ));
    assert_eq!(transport.count(Method::Get, "/queries/job-1"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_transient_status_error_surfaces_without_retry() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .on_submit("7", 200, json!({"id": "job-1"}))
            .on(Method::Get, "/queries/job-1", 503, json!({"error": "unavailable"}))
            .on(Method::Get, "/queries/job-1", 200, json!({"completed": true, "data": []})),
    );
    // default resilience still retries listings; status checks must not be
    let client = RemoteClient::new(
        transport.clone(),
        ResilienceConfig::default(),
        crate::config::MAX_PAGE_SIZE,
    );
    let executor = QueryExecutor::new(client, PollConfig::default());

    let started = Instant::now();
    let err = executor.run(&test_token(), "7", "SELECT 1").await.unwrap_err();

    assert!(matches!(
        err,
        AdapterError::Remote { job_id: Some(ref id), status: 503, .. } if id == "job-1"
    ));
    assert_eq!(transport.count(Method::Get, "/queries/job-1"), 1);
    assert_eq!(started.elapsed(), Duration::from_secs(2));
}

#[tokio::test]
async fn test_submit_error_skips_polling() {
    let transport = Arc::new(ScriptedTransport::new().on_submit("7", 500, json!("boom")));
    let executor = executor(&transport, PollConfig::default());

    let err = executor.run(&test_token(), "7", "SELECT 1").await.unwrap_err();

    assert!(matches!(err, AdapterError::Remote { status: 500, job_id: None, .. }));
    assert_eq!(transport.count(Method::Get, "/queries"), 0);
}
