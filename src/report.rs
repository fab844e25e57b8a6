//! Crash report types and wire serialization.
//!
//! A [`CrashReport`] is the body of one submission attempt. It is built from
//! the [`CrashDetails`] a crash screen was launched with plus the
//! [`DeviceInfo`] of the host, and serializes to the flat JSON object the
//! collection endpoint expects:
//!
//! ```text
//! {"stack_trace": "...", "model": "...", "oemname": "...", "osapilevel": "34"}
//! ```

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Report errors.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Invalid crash report JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Device metadata attached to every report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device model, e.g. "Pixel 8"
    pub model: String,
    /// Device manufacturer, e.g. "Google"
    pub manufacturer: String,
    /// OS API level, e.g. 34
    pub api_level: u32,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            model: "unknown".into(),
            manufacturer: "unknown".into(),
            api_level: 0,
        }
    }
}

/// Crash report sent to the collection endpoint.
///
/// Field names follow the wire contract; the API level travels as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrashReport {
    /// Full stack trace text (may be empty, never omitted)
    pub stack_trace: String,

    #[serde(rename = "model")]
    pub device_model: String,

    #[serde(rename = "oemname")]
    pub device_manufacturer: String,

    #[serde(rename = "osapilevel", with = "api_level_string")]
    pub os_api_level: u32,
}

impl CrashReport {
    /// Creates a report for the given stack trace on the given device.
    pub fn new(stack_trace: impl Into<String>, device: &DeviceInfo) -> Self {
        Self {
            stack_trace: stack_trace.into(),
            device_model: device.model.clone(),
            device_manufacturer: device.manufacturer.clone(),
            os_api_level: device.api_level,
        }
    }

    /// Serializes the report to its wire JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses a report from wire JSON.
    ///
    /// Accepts `osapilevel` as either a string or a number.
    pub fn from_json(json: &str) -> Result<Self, ReportError> {
        Ok(serde_json::from_str(json)?)
    }
}

mod api_level_string {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(level: &u32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(level)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(level) => Ok(level),
            Raw::Text(text) => text.trim().parse().map_err(D::Error::custom),
        }
    }
}

/// What a crash screen was launched with.
///
/// Every field is optional; absent text is treated as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrashDetails {
    /// Exception name, e.g. "java.lang.NullPointerException"
    pub name: Option<String>,
    /// Exception message
    pub message: Option<String>,
    /// Full stack trace
    pub stack_trace: Option<String>,
}

impl CrashDetails {
    /// Exception name, or "" when absent.
    pub fn name_text(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Exception message, or "" when absent.
    pub fn message_text(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }

    /// Stack trace, or "" when absent.
    pub fn stack_trace_text(&self) -> &str {
        self.stack_trace.as_deref().unwrap_or("")
    }

    /// Builds the submission body for these details.
    pub fn to_report(&self, device: &DeviceInfo) -> CrashReport {
        CrashReport::new(self.stack_trace_text(), device)
    }
}

fn frame_regex() -> &'static Regex {
    static FRAME: OnceLock<Regex> = OnceLock::new();
    FRAME.get_or_init(|| Regex::new(r"^\s*at\s+(\S.*?)\s*$").unwrap())
}

/// Finds the frame a crash is attributed to.
///
/// Returns the first `at <frame>` line whose frame belongs to `package`, or
/// the first frame of the trace when no package is given or none matches.
/// Frames are returned without the leading `at `.
///
/// # Example
///
/// ```
/// use crasher::stack_cause;
///
/// let stack = "java.lang.IllegalStateException: boom\n\
///     \tat android.app.Activity.performCreate(Activity.java:8000)\n\
///     \tat com.example.app.MainActivity.onCreate(MainActivity.java:42)";
///
/// assert_eq!(
///     stack_cause(stack, Some("com.example.app")).as_deref(),
///     Some("com.example.app.MainActivity.onCreate(MainActivity.java:42)")
/// );
/// ```
pub fn stack_cause(stack: &str, package: Option<&str>) -> Option<String> {
    let frames: Vec<&str> = stack
        .lines()
        .filter_map(|line| frame_regex().captures(line))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();

    let package = package.map(str::trim).filter(|p| !p.is_empty());
    if let Some(package) = package {
        let in_package = frames.iter().find(|frame| {
            frame
                .strip_prefix(package)
                .is_some_and(|rest| rest.starts_with('.'))
        });
        if let Some(frame) = in_package {
            return Some(frame.to_string());
        }
    }

    frames.first().map(|frame| frame.to_string())
}
