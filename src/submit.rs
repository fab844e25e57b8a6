//! Crash report submission.
//!
//! [`CrashSubmitter`] posts a [`CrashReport`] as JSON to the collection
//! endpoint and folds every outcome into a [`SubmissionResult`]:
//!
//! | Outcome                               | Result                     |
//! |---------------------------------------|----------------------------|
//! | HTTP 200                              | `Success`                  |
//! | Any other HTTP status                 | `HttpFailure(status)`      |
//! | DNS, TLS, connect, timeout, I/O fault | `TransportError`           |
//!
//! Submission is never retried and never returns an error. Callers that
//! need the result on another context (a UI loop) use
//! [`CrashSubmitter::spawn`], which runs the request on the tokio runtime
//! and hands the result over an `mpsc` channel.

use std::fmt;

use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

use crate::report::CrashReport;
use crate::CrasherConfig;

/// Errors building a submitter.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("Unsupported endpoint scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),
}

/// Outcome of one submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionResult {
    /// Server answered 200.
    Success,
    /// Server answered with any other status.
    HttpFailure(u16),
    /// The request never produced a response.
    TransportError,
}

impl SubmissionResult {
    /// Maps a response status to a result. Only 200 counts as success.
    pub fn from_status(status: StatusCode) -> Self {
        if status == StatusCode::OK {
            Self::Success
        } else {
            Self::HttpFailure(status.as_u16())
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Short transient message shown to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Success => "Crash log submitted",
            Self::HttpFailure(_) => "Failed to submit crash log",
            Self::TransportError => "Error submitting crash log",
        }
    }
}

impl fmt::Display for SubmissionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::HttpFailure(code) => write!(f, "http failure ({})", code),
            Self::TransportError => write!(f, "transport error"),
        }
    }
}

/// Posts crash reports to a fixed endpoint.
///
/// Clones share the underlying connection pool; each call to
/// [`submit`](Self::submit) is an independent request.
#[derive(Debug, Clone)]
pub struct CrashSubmitter {
    client: Client,
    endpoint: Url,
}

impl CrashSubmitter {
    /// Creates a submitter for the endpoint and timeouts in `config`.
    ///
    /// The connect timeout bounds connection setup, the read timeout bounds
    /// each read of the response, and their sum bounds the whole request.
    /// `Duration::MAX` in either field leaves the request unbounded.
    pub fn new(config: &CrasherConfig) -> Result<Self, SubmitError> {
        let endpoint = Url::parse(&config.endpoint)?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(SubmitError::UnsupportedScheme(endpoint.scheme().to_string()));
        }

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .timeout(config.connect_timeout.saturating_add(config.read_timeout))
            .build()?;

        Ok(Self { client, endpoint })
    }

    /// Returns the endpoint reports are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Submits one report and waits for the status code.
    pub async fn submit(&self, report: &CrashReport) -> SubmissionResult {
        debug!(
            endpoint = %self.endpoint,
            stack_trace_len = report.stack_trace.len(),
            "Submitting crash report"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(report)
            .send()
            .await;

        match response {
            Ok(response) => {
                let result = SubmissionResult::from_status(response.status());
                match result {
                    SubmissionResult::Success => debug!("Crash report accepted"),
                    _ => warn!(status = response.status().as_u16(), "Crash report rejected"),
                }
                result
            }
            Err(e) => {
                warn!(error = %e, timeout = e.is_timeout(), "Crash report submission failed");
                SubmissionResult::TransportError
            }
        }
    }

    /// Submits in the background and sends the result to `results`.
    ///
    /// If the receiver has been dropped by the time the request finishes,
    /// the result is discarded.
    pub fn spawn(
        &self,
        report: CrashReport,
        results: mpsc::UnboundedSender<SubmissionResult>,
    ) -> JoinHandle<()> {
        let submitter = self.clone();
        tokio::spawn(async move {
            let result = submitter.submit(&report).await;
            if results.send(result).is_err() {
                debug!(%result, "Result receiver closed, discarding submission result");
            }
        })
    }
}
