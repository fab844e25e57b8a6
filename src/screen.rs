//! Crash screen model.
//!
//! [`CrashScreen`] holds the text a crash screen displays and turns user
//! actions into [`Effect`]s for the host UI to carry out. It owns no
//! widgets and performs no I/O; submission results come back through
//! [`CrashScreen::on_submission`].

use serde::Serialize;

use crate::report::{stack_cause, CrashDetails, CrashReport, DeviceInfo};
use crate::share::{share_body, EmailDraft, ShareRequest};
use crate::submit::SubmissionResult;

/// Launch options besides the crash itself.
#[derive(Debug, Clone, Default)]
pub struct ScreenOptions {
    /// Application name used in the description and email subject
    pub app_name: String,
    /// Crash contact address; the email action exists only when set
    pub email: Option<String>,
    /// Extra text appended to shared and emailed reports
    pub debug_message: Option<String>,
    /// Package whose frames the crash is attributed to
    pub package: Option<String>,
}

/// User actions on the crash screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Copy,
    Share,
    Email,
    Submit,
    ToggleStackTrace,
}

/// Work the host UI performs on behalf of the screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    /// Show a short transient message.
    Toast { text: String },
    /// Put text on the clipboard under a label.
    CopyToClipboard { label: String, text: String },
    /// Open the share sheet.
    Share(ShareRequest),
    /// Open the email composer.
    Compose(EmailDraft),
    /// Submit the report in the background.
    Submit(CrashReport),
    /// Show or hide the stack trace section.
    StackTraceVisible { visible: bool },
}

impl Effect {
    fn toast(text: impl Into<String>) -> Self {
        Self::Toast { text: text.into() }
    }
}

/// Display state and action handling for one crash.
#[derive(Debug, Clone)]
pub struct CrashScreen {
    details: CrashDetails,
    device: DeviceInfo,
    options: ScreenOptions,
    title: String,
    body: String,
    stack_trace_visible: bool,
}

impl CrashScreen {
    pub fn new(details: CrashDetails, device: DeviceInfo, options: ScreenOptions) -> Self {
        let cause = stack_cause(details.stack_trace_text(), options.package.as_deref());
        let title = match cause {
            Some(cause) => format!("{} at {}", details.name_text(), cause),
            None => details.name_text().to_string(),
        };
        let body = share_body(
            &title,
            details.message_text(),
            details.stack_trace_text(),
            &device,
            options.debug_message.as_deref(),
        );

        Self {
            details,
            device,
            options,
            title,
            body,
            stack_trace_visible: true,
        }
    }

    /// Crash name, suffixed with " at <frame>" when a cause frame is found.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Crash message, or `None` when it should be hidden.
    pub fn message(&self) -> Option<&str> {
        self.details.message.as_deref().filter(|m| !m.is_empty())
    }

    pub fn description(&self) -> String {
        format!("Unfortunately, {} has crashed.", self.options.app_name)
    }

    pub fn stack_trace(&self) -> &str {
        self.details.stack_trace_text()
    }

    pub fn stack_trace_visible(&self) -> bool {
        self.stack_trace_visible
    }

    /// Whether the email action is offered.
    pub fn email_enabled(&self) -> bool {
        self.options.email.as_deref().is_some_and(|e| !e.trim().is_empty())
    }

    /// Text used for sharing and email.
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn report(&self) -> CrashReport {
        self.details.to_report(&self.device)
    }

    /// Effects to run when the screen first shows: submit automatically.
    pub fn on_load(&self) -> Vec<Effect> {
        vec![Effect::Submit(self.report())]
    }

    /// Maps a user action to effects.
    pub fn handle(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::Copy => vec![
                Effect::toast("Text copied to clipboard."),
                Effect::CopyToClipboard {
                    label: self.title.clone(),
                    text: self.stack_trace().to_string(),
                },
            ],
            Action::Share => vec![Effect::Share(ShareRequest::new(
                format!("{} crash report", self.options.app_name),
                self.body.clone(),
            ))],
            Action::Email => self.email_draft().map(Effect::Compose).into_iter().collect(),
            Action::Submit => vec![Effect::Submit(self.report())],
            Action::ToggleStackTrace => {
                self.stack_trace_visible = !self.stack_trace_visible;
                vec![Effect::StackTraceVisible {
                    visible: self.stack_trace_visible,
                }]
            }
        }
    }

    /// Effects to run when a submission finishes.
    pub fn on_submission(&self, result: SubmissionResult) -> Vec<Effect> {
        vec![Effect::toast(result.user_message())]
    }

    /// Email draft to the configured contact, if any.
    pub fn email_draft(&self) -> Option<EmailDraft> {
        if !self.email_enabled() {
            return None;
        }
        let to = self.options.email.clone()?;
        let subject = format!("{} in {}", self.title, self.options.app_name);
        Some(EmailDraft::new(to, subject, self.body.clone()))
    }
}
