//! Shared helpers for submission integration tests
//!
//! Each helper starts a wiremock server standing in for the crash log
//! endpoint and returns a submitter pointed at it.

use std::time::Duration;

use crasher::{CrashReport, CrashSubmitter, CrasherConfig, DeviceInfo};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CRASH_PATH: &str = "/v2/crash";

pub const SAMPLE_STACK: &str = "java.lang.NullPointerException: Attempt to invoke virtual method\n\
    \tat com.example.notes.Editor.save(Editor.java:71)\n\
    \tat android.os.Handler.handleCallback(Handler.java:942)";

/// Builds a submitter posting to `server` with the given timeouts.
pub fn submitter_with_timeouts(
    server: &MockServer,
    connect_timeout: Duration,
    read_timeout: Duration,
) -> CrashSubmitter {
    let config = CrasherConfig {
        endpoint: format!("{}{}", server.uri(), CRASH_PATH),
        connect_timeout,
        read_timeout,
    };
    CrashSubmitter::new(&config).expect("submitter for mock server")
}

/// Builds a submitter posting to `server` with default timeouts.
pub fn submitter_for(server: &MockServer) -> CrashSubmitter {
    let defaults = CrasherConfig::default();
    submitter_with_timeouts(server, defaults.connect_timeout, defaults.read_timeout)
}

/// Starts a server that answers every crash POST with `status`.
pub async fn setup_crash_mock(status: u16) -> (MockServer, CrashSubmitter) {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(CRASH_PATH))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;

    let submitter = submitter_for(&server);
    (server, submitter)
}

pub fn sample_device() -> DeviceInfo {
    DeviceInfo {
        model: "Pixel 7".into(),
        manufacturer: "Google".into(),
        api_level: 34,
    }
}

pub fn sample_report() -> CrashReport {
    CrashReport::new(SAMPLE_STACK, &sample_device())
}
