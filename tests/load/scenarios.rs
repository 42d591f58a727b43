//! End-to-end runs of the harness against wiremock.

use std::time::{Duration, Instant};

use catalog_harness::catalog::fixtures;
use catalog_harness::client::Payload;
use catalog_harness::config::LoadMethod;
use catalog_harness::load::{FailureKind, LoadHarness, LoadPlan, Schedule, STATUS_TRANSPORT_FAILURE};
use catalog_harness::HarnessError;
use rstest::rstest;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::json_response;

/// POST /products that fails the first `failures` requests with a 500.
async fn products_endpoint(failures: u64) -> MockServer {
    let server = MockServer::start().await;
    if failures > 0 {
        Mock::given(method("POST"))
            .and(path("/products"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .up_to_n_times(failures)
            .with_priority(1)
            .mount(&server)
            .await;
    }
    let mut created = fixtures::canonical_product();
    created["id"] = json!(21);
    Mock::given(method("POST"))
        .and(path("/products"))
        .respond_with(json_response(200, &created))
        .mount(&server)
        .await;
    server
}

fn plan(server: &MockServer, ratio: f64, schedule: Schedule) -> LoadPlan {
    LoadPlan::new(
        format!("{}/products", server.uri()),
        Payload::Json(fixtures::canonical_product()),
    )
    .with_requests(10, 5)
    .with_min_success_ratio(ratio)
    .with_timeout(Duration::from_secs(5))
    .with_schedule(schedule)
}

fn harness() -> LoadHarness<catalog_harness::load::HttpDispatcher> {
    LoadHarness::http(reqwest::Client::new())
}

#[rstest]
#[case(Schedule::Wave)]
#[case(Schedule::Pool)]
#[tokio::test]
async fn test_all_requests_succeed(#[case] schedule: Schedule) {
    let server = products_endpoint(0).await;
    let run = harness().run(&plan(&server, 0.9, schedule)).await.unwrap();

    assert_eq!(run.outcomes.len(), 10);
    assert_eq!(run.verdict.success_count, 10);
    assert_eq!(run.verdict.failure_count, 0);
    assert!(run.verdict.passed);
    assert!(run.verdict.avg_duration_secs >= 0.0);
    assert!(run
        .outcomes
        .iter()
        .all(|o| o.body.as_json().map(|b| b["id"] == 21).unwrap_or(false)));
    assert_eq!(server.received_requests().await.unwrap().len(), 10);
}

#[rstest]
#[case(Schedule::Wave, 0.9, false)]
#[case(Schedule::Pool, 0.9, false)]
#[case(Schedule::Wave, 0.7, true)]
#[case(Schedule::Pool, 0.7, true)]
#[case(Schedule::Pool, 0.8, true)]
#[tokio::test]
async fn test_two_failures_against_threshold(
    #[case] schedule: Schedule,
    #[case] ratio: f64,
    #[case] expected_pass: bool,
) {
    let server = products_endpoint(2).await;
    let run = harness().run(&plan(&server, ratio, schedule)).await.unwrap();

    assert_eq!(run.outcomes.len(), 10);
    assert_eq!(run.verdict.success_count, 8);
    assert_eq!(run.verdict.failure_count, 2);
    assert_eq!(run.verdict.passed, expected_pass);
    assert_eq!(run.summary.status_counts.get("500"), Some(&2));
}

#[rstest]
#[case(Schedule::Wave)]
#[case(Schedule::Pool)]
#[tokio::test]
async fn test_slow_request_times_out_without_stalling_run(#[case] schedule: Schedule) {
    let server = products_endpoint(0).await;
    Mock::given(method("POST"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;

    let started = Instant::now();
    let run = harness()
        .run(&plan(&server, 0.9, schedule).with_timeout(Duration::from_millis(300)))
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(10), "run hung: {:?}", started.elapsed());
    assert_eq!(run.outcomes.len(), 10);
    let timed_out: Vec<_> = run
        .outcomes
        .iter()
        .filter(|o| o.failure == Some(FailureKind::Timeout))
        .collect();
    assert_eq!(timed_out.len(), 1);
    assert_eq!(timed_out[0].status, STATUS_TRANSPORT_FAILURE);
    assert!(timed_out[0].elapsed_secs < 5.0);
    assert_eq!(run.verdict.success_count, 9);
    assert!(run.verdict.passed);
}

#[tokio::test]
async fn test_zero_requests_is_config_error() {
    let server = products_endpoint(0).await;
    let err = harness()
        .run(&plan(&server, 0.9, Schedule::Wave).with_requests(0, 0))
        .await
        .unwrap_err();

    assert!(matches!(err, HarnessError::Config(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[rstest]
#[case(Schedule::Wave)]
#[case(Schedule::Pool)]
#[tokio::test]
async fn test_unreachable_target_records_transport_failures(#[case] schedule: Schedule) {
    // Grab a free port, then release it so nothing is listening.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let plan = LoadPlan::new(format!("http://{addr}/products"), Payload::Json(json!({})))
        .with_requests(6, 3)
        .with_timeout(Duration::from_secs(2))
        .with_schedule(schedule);
    let run = harness().run(&plan).await.unwrap();

    assert_eq!(run.outcomes.len(), 6);
    assert_eq!(run.verdict.failure_count, 6);
    assert!(!run.verdict.passed);
    assert!(run.outcomes.iter().all(|o| o.status == STATUS_TRANSPORT_FAILURE));
}

#[tokio::test]
async fn test_read_stress_against_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(json_response(200, &json!([{"id": 1}, {"id": 2}])))
        .expect(100)
        .mount(&server)
        .await;

    let plan = LoadPlan::new(format!("{}/products", server.uri()), Payload::Empty)
        .with_method(LoadMethod::Get)
        .with_requests(100, 100)
        .with_min_success_ratio(1.0);
    let run = harness().run(&plan).await.unwrap();

    assert_eq!(run.verdict.success_count, 100);
    assert!(run.passed());
    assert_eq!(run.summary.method, "GET");
}

#[tokio::test]
async fn test_repeat_runs_agree() {
    let first_server = products_endpoint(3).await;
    let second_server = products_endpoint(3).await;

    let first = harness().run(&plan(&first_server, 0.75, Schedule::Pool)).await.unwrap();
    let second = harness().run(&plan(&second_server, 0.75, Schedule::Pool)).await.unwrap();

    assert_eq!(first.verdict.success_count, 7);
    assert_eq!(first.verdict.passed, second.verdict.passed);
    assert!(!first.verdict.passed);
    assert_ne!(first.run_id, second.run_id);
}
