//! Integration tests for the harness API client and metrics collector.
//!
//! Each test runs against a wiremock server standing in for the harness API.

use std::sync::Arc;
use std::time::Duration;

use promptbench_client::{
    ClientConfig, Error, HistorySource, HistoryWindow, HttpHistoryClient, MetricsCollector,
    RunMetrics, Trend,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpHistoryClient {
    client_with_timeout(server, 5)
}

fn client_with_timeout(server: &MockServer, request_timeout_secs: u64) -> HttpHistoryClient {
    HttpHistoryClient::new(&ClientConfig {
        base_url: server.uri(),
        request_timeout_secs,
        ..Default::default()
    })
    .expect("Failed to create client")
}

fn history_body(scores: &[Option<f64>]) -> serde_json::Value {
    let runs: Vec<serde_json::Value> = scores
        .iter()
        .enumerate()
        .map(|(i, score)| {
            serde_json::json!({
                "id": format!("run-{}", i),
                "created_at": format!("2024-03-0{}T09:30:00", i + 1),
                "avg_score": score,
                "total_samples": 20,
                "is_scheduled": i % 2 == 0,
            })
        })
        .collect();
    serde_json::Value::Array(runs)
}

// =============================================================================
// History endpoint
// =============================================================================

#[tokio::test]
async fn test_fetch_history_sends_days_and_parses_naive_timestamps() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test-runs/ps-1/history"))
        .and(query_param("days", "30"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(history_body(&[Some(0.5), None, Some(0.7)])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let runs = client
        .fetch_history("ps-1", HistoryWindow::new(30).unwrap())
        .await
        .unwrap();

    assert_eq!(runs.len(), 3);
    assert_eq!(runs[0].id, "run-0");
    assert_eq!(runs[0].created_at.to_rfc3339(), "2024-03-01T09:30:00+00:00");
    assert_eq!(runs[1].avg_score, None);
    assert_eq!(runs[1].total_samples, Some(20));
    assert!(runs[0].is_scheduled);
    assert!(!runs[1].is_scheduled);
}

#[tokio::test]
async fn test_fetch_history_tolerates_missing_optional_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test-runs/ps-1/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "id": "r1", "created_at": "2024-03-01T09:30:00Z" }
        ])))
        .mount(&mock_server)
        .await;

    let runs = client_for(&mock_server)
        .fetch_history("ps-1", HistoryWindow::default())
        .await
        .unwrap();

    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].avg_score, None);
    assert_eq!(runs[0].total_samples, None);
    assert!(!runs[0].is_scheduled);
}

#[tokio::test]
async fn test_fetch_history_sorts_out_of_order_runs() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test-runs/ps-1/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "id": "late", "created_at": "2024-03-03T00:00:00", "avg_score": 0.9 },
            { "id": "early", "created_at": "2024-03-01T00:00:00", "avg_score": 0.1 },
            { "id": "middle", "created_at": "2024-03-02T00:00:00", "avg_score": 0.5 }
        ])))
        .mount(&mock_server)
        .await;

    let runs = client_for(&mock_server)
        .fetch_history("ps-1", HistoryWindow::default())
        .await
        .unwrap();

    let ids: Vec<&str> = runs.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["early", "middle", "late"]);
}

#[tokio::test]
async fn test_fetch_history_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test-runs/ps-1/history"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server)
        .fetch_history("ps-1", HistoryWindow::default())
        .await;

    match result {
        Err(Error::Request(message)) => {
            assert!(message.contains("500"), "{}", message);
            assert!(message.contains("database unavailable"), "{}", message);
        }
        other => panic!("expected request error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_history_malformed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test-runs/ps-1/history"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server)
        .fetch_history("ps-1", HistoryWindow::default())
        .await;

    assert!(matches!(result, Err(Error::Serialization(_))));
}

// =============================================================================
// Prompt system endpoints
// =============================================================================

#[tokio::test]
async fn test_list_prompt_systems_uses_collection_path() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/prompt-systems/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "id": "ps-1",
                "name": "Summarizer",
                "provider": "openai",
                "model": "gpt-4o-mini",
                "temperature": 0.2,
                "created_at": "2024-02-01T12:00:00",
                "updated_at": "2024-02-02T12:00:00"
            },
            { "id": "ps-2", "name": "Classifier" }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let systems = client_for(&mock_server).list_prompt_systems().await.unwrap();

    assert_eq!(systems.len(), 2);
    assert_eq!(systems[0].name, "Summarizer");
    assert_eq!(systems[0].provider.as_deref(), Some("openai"));
    assert_eq!(systems[0].temperature, Some(0.2));
    assert!(systems[0].created_at.is_some());
    assert!(systems[1].created_at.is_none());
}

#[tokio::test]
async fn test_get_prompt_system_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/prompt-systems/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "detail": "Prompt system not found"
        })))
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server).get_prompt_system("missing").await;

    match result {
        Err(Error::PromptSystemNotFound(id)) => assert_eq!(id, "missing"),
        other => panic!("expected not found, got {:?}", other),
    }
}

// =============================================================================
// Test run detail endpoint
// =============================================================================

#[tokio::test]
async fn test_get_test_run_with_results() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test-runs/run-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "test_run": {
                "id": "run-7",
                "prompt_system_id": "ps-1",
                "avg_score": 0.5,
                "total_samples": 2,
                "created_at": "2024-03-05T08:00:00.250000",
                "prompt_system": { "id": "ps-1", "name": "Summarizer" }
            },
            "results": [
                {
                    "id": "res-a",
                    "test_run_id": "run-7",
                    "sample_id": "0",
                    "input_variables": "{\"text\": \"tide tables\"}",
                    "expected_output": "tides",
                    "predicted_output": "tides",
                    "score": 1.0,
                    "evaluation_method": "fuzzy"
                },
                {
                    "id": "res-b",
                    "test_run_id": "run-7",
                    "sample_id": "1",
                    "input_variables": "{}",
                    "expected_output": "moon",
                    "predicted_output": "sun",
                    "score": 0.0,
                    "evaluation_method": "fuzzy"
                }
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let detail = client_for(&mock_server).get_test_run("run-7").await.unwrap();

    assert_eq!(detail.test_run.id, "run-7");
    assert_eq!(detail.test_run.system_name(), "Summarizer");
    assert_eq!(detail.test_run.prompt_system_id.as_deref(), Some("ps-1"));
    assert_eq!(detail.results.len(), 2);
    assert_eq!(detail.results[1].sample_number(), "2");
    assert_eq!(detail.results[1].predicted_output.as_deref(), Some("sun"));
    assert_eq!(detail.results[0].score, Some(1.0));
}

#[tokio::test]
async fn test_get_test_run_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test-runs/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "detail": "Test run not found"
        })))
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server).get_test_run("gone").await;

    match result {
        Err(Error::NotFound(what)) => assert!(what.contains("gone"), "{}", what),
        other => panic!("expected not found, got {:?}", other),
    }
}

// =============================================================================
// Request timeout
// =============================================================================

#[tokio::test]
async fn test_fetch_history_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test-runs/slow/history"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(history_body(&[Some(0.9)]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let result = client_with_timeout(&mock_server, 1)
        .fetch_history("slow", HistoryWindow::default())
        .await;

    assert!(
        matches!(result, Err(Error::Request(_))),
        "expected request error, got {:?}",
        result
    );
}

#[tokio::test]
async fn test_collect_marks_timed_out_system_failed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/test-runs/slow/history"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(history_body(&[Some(0.9)]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/test-runs/fast/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(history_body(&[Some(0.4)])))
        .mount(&mock_server)
        .await;

    let collector = MetricsCollector::new(Arc::new(client_with_timeout(&mock_server, 1)));
    let table = collector
        .collect(&["slow".to_string(), "fast".to_string()])
        .await;

    assert!(table.is_failed("slow"));
    assert_eq!(table.get_or_neutral("slow"), RunMetrics::neutral());
    assert!(!table.is_failed("fast"));
    assert_eq!(table.get_or_neutral("fast").count, 1);
}

// =============================================================================
// Metrics collection over HTTP
// =============================================================================

#[tokio::test]
async fn test_collect_isolates_failing_system() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/prompt-systems/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "id": "older", "name": "Older", "created_at": "2024-01-01T00:00:00" },
            { "id": "newer", "name": "Newer", "created_at": "2024-02-01T00:00:00" },
            { "id": "broken", "name": "Broken" }
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/test-runs/older/history"))
        .and(query_param("days", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(history_body(&[
            Some(0.5),
            Some(0.5),
            Some(0.5),
            Some(0.9),
            Some(0.9),
            Some(0.9),
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/test-runs/newer/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(history_body(&[Some(0.9)])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/test-runs/broken/history"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let collector = MetricsCollector::new(Arc::new(client_for(&mock_server))).with_max_concurrent(2);
    let (systems, table) = collector.collect_for_all_systems().await.unwrap();

    let order: Vec<&str> = systems.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(order, vec!["newer", "older", "broken"]);

    let older = table.get_or_neutral("older");
    assert_eq!(older.count, 6);
    assert_eq!(older.trend, Trend::Improving);
    assert!((older.average - 0.7).abs() < 1e-9);

    let newer = table.get_or_neutral("newer");
    assert_eq!(newer.count, 1);
    assert_eq!(newer.trend, Trend::Stable);

    assert_eq!(table.get_or_neutral("broken"), RunMetrics::neutral());
    assert!(table.is_failed("broken"));
    assert_eq!(table.failed_count(), 1);
}

#[tokio::test]
async fn test_collect_for_all_systems_fails_when_listing_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/prompt-systems/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let collector = MetricsCollector::new(Arc::new(client_for(&mock_server)));
    let result = collector.collect_for_all_systems().await;

    assert!(matches!(result, Err(Error::Request(_))));
}
