//! Share and email payloads for a crash.
//!
//! The same plain-text body feeds both the share sheet and the email
//! composer:
//!
//! ```text
//! <title>
//! <message>
//!
//! <stack trace>
//!
//! Android Version: <api level>
//! Device Manufacturer: <manufacturer>
//! Device Model: <model>
//!
//! <debug message>
//! ```

use serde::Serialize;
use url::{form_urlencoded, Url};

use crate::report::DeviceInfo;

/// MIME type of shared crash text.
pub const TEXT_PLAIN: &str = "text/plain";

/// Builds the shareable crash text.
///
/// `title` is the crash name as displayed (including the cause suffix).
/// Absent message or debug message leave their lines empty.
pub fn share_body(
    title: &str,
    message: &str,
    stack_trace: &str,
    device: &DeviceInfo,
    debug_message: Option<&str>,
) -> String {
    format!(
        "{title}\n{message}\n\n{stack_trace}\n\n\
         Android Version: {}\n\
         Device Manufacturer: {}\n\
         Device Model: {}\n\n{}",
        device.api_level,
        device.manufacturer,
        device.model,
        debug_message.unwrap_or(""),
    )
}

/// Request to open the platform share sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareRequest {
    pub mime_type: &'static str,
    pub subject: String,
    pub text: String,
    pub chooser_title: &'static str,
}

impl ShareRequest {
    pub fn new(subject: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            mime_type: TEXT_PLAIN,
            subject: subject.into(),
            text: text.into(),
            chooser_title: "Share text via",
        }
    }
}

/// Email addressed to the app's crash contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailDraft {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl EmailDraft {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Builds a `mailto:` URL carrying subject and body.
    ///
    /// Spaces are encoded as `%20`; mail clients do not decode `+`. The
    /// address is encoded too, keeping only its `@` literal, so `?`, `&`
    /// and `#` in it cannot end the address early.
    pub fn mailto_url(&self) -> Result<Url, url::ParseError> {
        let url = format!(
            "mailto:{}?subject={}&body={}",
            encode_component(self.to.trim()).replace("%40", "@"),
            encode_component(&self.subject),
            encode_component(&self.body),
        );
        Url::parse(&url)
    }
}

fn encode_component(text: &str) -> String {
    // byte_serialize escapes a literal '+' as %2B, so every '+' left is a space
    form_urlencoded::byte_serialize(text.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
