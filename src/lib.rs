//! Crasher - crash screen model and crash log submission
//!
//! Shows an application crash to the user and posts it to a collection
//! endpoint in the background.
//!
//! # Features
//!
//! - Fire-and-forget JSON submission with a UI-context handoff
//! - Cause frame extraction from Java-style stack traces
//! - Share text and `mailto:` drafts for manual reporting
//! - Platform-independent screen model driven by actions and effects
//!
//! # Example
//!
//! ```rust,no_run
//! use crasher::{CrashDetails, CrashScreen, CrashSubmitter, CrasherConfig, DeviceInfo, Effect, ScreenOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CrasherConfig::default();
//! let submitter = CrashSubmitter::new(&config)?;
//!
//! let details = CrashDetails {
//!     name: Some("java.lang.NullPointerException".into()),
//!     message: None,
//!     stack_trace: Some("\tat com.example.Main.run(Main.java:3)".into()),
//! };
//! let screen = CrashScreen::new(details, DeviceInfo::default(), ScreenOptions::default());
//!
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//! for effect in screen.on_load() {
//!     if let Effect::Submit(report) = effect {
//!         submitter.spawn(report, tx.clone());
//!     }
//! }
//! if let Some(result) = rx.recv().await {
//!     println!("{}", result.user_message());
//! }
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

pub mod report;
pub mod screen;
pub mod share;
pub mod submit;

pub use report::{stack_cause, CrashDetails, CrashReport, DeviceInfo, ReportError};
pub use screen::{Action, CrashScreen, Effect, ScreenOptions};
pub use share::{share_body, EmailDraft, ShareRequest};
pub use submit::{CrashSubmitter, SubmissionResult, SubmitError};

/// Collection endpoint crash logs are posted to.
pub const DEFAULT_ENDPOINT: &str = "https://visssample.theworkpc.com/v2/crash";

/// Connection setup timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Response read timeout.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for crash submission.
#[derive(Debug, Clone)]
pub struct CrasherConfig {
    /// Endpoint URL reports are posted to
    pub endpoint: String,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Read timeout
    pub read_timeout: Duration,
}

impl Default for CrasherConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}
