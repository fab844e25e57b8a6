//! Integration tests for crash report submission
//!
//! Verifies the wire contract and result mapping of `CrashSubmitter`
//! against a wiremock-based crash log endpoint:
//! - Exact JSON body and content type
//! - 200 vs non-200 status mapping
//! - Connect timeouts, read timeouts and refused connections
//! - Independent concurrent submissions
//! - Background handoff through a channel

use std::time::{Duration, Instant};

use crasher::{CrashDetails, CrashReport, CrashSubmitter, CrasherConfig, SubmissionResult};
use tokio::sync::mpsc;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_submit_sends_wire_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(common::CRASH_PATH))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({
            "stack_trace": common::SAMPLE_STACK,
            "model": "Pixel 7",
            "oemname": "Google",
            "osapilevel": "34"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let submitter = common::submitter_for(&server);
    let result = submitter.submit(&common::sample_report()).await;

    assert_eq!(result, SubmissionResult::Success);
}

#[tokio::test]
async fn test_submit_body_has_exactly_four_keys() {
    let (server, submitter) = common::setup_crash_mock(200).await;

    submitter.submit(&common::sample_report()).await;

    let requests = server.received_requests().await.expect("request recording enabled");
    assert_eq!(requests.len(), 1);

    let body: serde_json::Value = requests[0].body_json().expect("JSON body");
    let object = body.as_object().expect("flat JSON object");
    assert_eq!(object.len(), 4);
    for key in ["stack_trace", "model", "oemname", "osapilevel"] {
        assert!(object[key].is_string(), "{} should be a string", key);
    }
}

#[tokio::test]
async fn test_submit_200_is_success() {
    let (_server, submitter) = common::setup_crash_mock(200).await;

    let result = submitter.submit(&common::sample_report()).await;

    assert!(result.is_success());
    assert_eq!(result.user_message(), "Crash log submitted");
}

#[tokio::test]
async fn test_submit_non_200_is_http_failure() {
    for status in [201, 204, 400, 404, 500, 503] {
        let (_server, submitter) = common::setup_crash_mock(status).await;

        let result = submitter.submit(&common::sample_report()).await;

        assert_eq!(result, SubmissionResult::HttpFailure(status));
    }
}

#[tokio::test]
async fn test_submit_slow_server_is_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(common::CRASH_PATH))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let submitter = common::submitter_with_timeouts(
        &server,
        Duration::from_millis(100),
        Duration::from_millis(200),
    );
    let result = submitter.submit(&common::sample_report()).await;

    assert_eq!(result, SubmissionResult::TransportError);
}

#[tokio::test]
async fn test_submit_unreachable_host_hits_connect_timeout() {
    // 10.255.255.1 is non-routable: SYNs go unanswered until the connect timeout
    let config = CrasherConfig {
        endpoint: format!("http://10.255.255.1{}", common::CRASH_PATH),
        connect_timeout: Duration::from_millis(100),
        read_timeout: Duration::from_secs(30),
    };
    let submitter = CrashSubmitter::new(&config).unwrap();

    let started = Instant::now();
    let result = submitter.submit(&common::sample_report()).await;

    assert_eq!(result, SubmissionResult::TransportError);
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "connect timeout did not bound the attempt: {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn test_submit_refused_connection_is_transport_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
        listener.local_addr().expect("local addr")
    };

    let config = CrasherConfig {
        endpoint: format!("http://{}{}", addr, common::CRASH_PATH),
        connect_timeout: Duration::from_millis(500),
        read_timeout: Duration::from_millis(500),
    };
    let submitter = CrashSubmitter::new(&config).unwrap();

    let result = submitter.submit(&common::sample_report()).await;

    assert_eq!(result, SubmissionResult::TransportError);
    assert_eq!(result.user_message(), "Error submitting crash log");
}

#[tokio::test]
async fn test_submit_empty_stack_trace_is_empty_string() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(common::CRASH_PATH))
        .and(body_json(serde_json::json!({
            "stack_trace": "",
            "model": "Pixel 7",
            "oemname": "Google",
            "osapilevel": "34"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let submitter = common::submitter_for(&server);
    let report = CrashDetails::default().to_report(&common::sample_device());

    assert_eq!(submitter.submit(&report).await, SubmissionResult::Success);
}

#[tokio::test]
async fn test_concurrent_submissions_do_not_interfere() {
    let (_ok_server, ok_submitter) = common::setup_crash_mock(200).await;
    let (_bad_server, bad_submitter) = common::setup_crash_mock(503).await;

    let first = common::sample_report();
    let second = CrashReport::new("other trace", &common::sample_device());

    let (ok, bad) = tokio::join!(ok_submitter.submit(&first), bad_submitter.submit(&second));

    assert_eq!(ok, SubmissionResult::Success);
    assert_eq!(bad, SubmissionResult::HttpFailure(503));
}

#[tokio::test]
async fn test_concurrent_submissions_same_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(common::CRASH_PATH))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(50)))
        .expect(2)
        .mount(&server)
        .await;

    let submitter = common::submitter_for(&server);
    let report = common::sample_report();

    let submitter2 = submitter.clone();
    let (a, b) = tokio::join!(submitter.submit(&report), submitter2.submit(&report));

    assert_eq!(a, SubmissionResult::Success);
    assert_eq!(b, SubmissionResult::Success);
}

#[tokio::test]
async fn test_spawn_delivers_result_to_channel() {
    let (_server, submitter) = common::setup_crash_mock(500).await;
    let (tx, mut rx) = mpsc::unbounded_channel();

    submitter.spawn(common::sample_report(), tx);

    assert_eq!(rx.recv().await, Some(SubmissionResult::HttpFailure(500)));
    assert_eq!(rx.recv().await, None);
}

#[tokio::test]
async fn test_spawn_discards_result_when_receiver_gone() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(common::CRASH_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let submitter = common::submitter_for(&server);
    let (tx, rx) = mpsc::unbounded_channel();
    drop(rx);

    let handle = submitter.spawn(common::sample_report(), tx);

    assert!(handle.await.is_ok(), "late result must not fault");
}
