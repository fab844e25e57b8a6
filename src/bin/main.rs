//! Crasher CLI - terminal host for the crash screen
//!
//! Renders a crash, submits it to the collection endpoint in the background,
//! and performs the copy/share/email actions as text output.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use crasher::{
    Action, CrashDetails, CrashReport, CrashScreen, CrashSubmitter, CrasherConfig, DeviceInfo,
    Effect, ScreenOptions, SubmissionResult, DEFAULT_CONNECT_TIMEOUT, DEFAULT_ENDPOINT,
    DEFAULT_READ_TIMEOUT,
};
use tokio::sync::mpsc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Stack trace lines shown before truncating in pretty output.
const STACK_PREVIEW_LINES: usize = 20;

#[derive(Parser)]
#[command(name = "crasher", version)]
#[command(about = "Show an application crash and submit it to the crash log endpoint")]
struct Cli {
    /// Verbose logging (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the crash screen and submit the crash in the background
    Show {
        #[command(flatten)]
        crash: CrashArgs,

        #[command(flatten)]
        endpoint: EndpointArgs,

        /// Skip the automatic submission on load
        #[arg(long)]
        no_submit: bool,

        /// Start with the stack trace section collapsed
        #[arg(long)]
        collapse_stack_trace: bool,

        /// Output format: pretty or json
        #[arg(short, long, default_value = "pretty")]
        format: OutputFormat,
    },

    /// Submit a crash report and print the result
    Submit {
        #[command(flatten)]
        crash: CrashArgs,

        #[command(flatten)]
        endpoint: EndpointArgs,

        /// Submit a prebuilt JSON report instead of building one from flags
        #[arg(long, conflicts_with = "input")]
        report: Option<PathBuf>,
    },

    /// Print the label and text the copy action puts on the clipboard
    Copy {
        #[command(flatten)]
        crash: CrashArgs,
    },

    /// Print the text the share action sends
    Share {
        #[command(flatten)]
        crash: CrashArgs,
    },

    /// Print the mailto: URL the email action opens
    Email {
        #[command(flatten)]
        crash: CrashArgs,
    },
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum OutputFormat {
    Pretty,
    Json,
}

/// The crash and the device it happened on.
#[derive(Args, Debug)]
struct CrashArgs {
    /// Exception name
    #[arg(long)]
    name: Option<String>,

    /// Exception message
    #[arg(long)]
    message: Option<String>,

    /// File containing the stack trace (or - for stdin)
    #[arg(short, long)]
    input: Option<String>,

    /// Device model
    #[arg(long, env = "CRASHER_DEVICE_MODEL", default_value = "unknown")]
    model: String,

    /// Device manufacturer
    #[arg(long, env = "CRASHER_DEVICE_MANUFACTURER", default_value = "unknown")]
    manufacturer: String,

    /// OS API level
    #[arg(long, env = "CRASHER_API_LEVEL", default_value_t = 0)]
    api_level: u32,

    /// Application name
    #[arg(long, env = "CRASHER_APP_NAME", default_value = "App")]
    app_name: String,

    /// Package the crash is attributed to
    #[arg(long, env = "CRASHER_PACKAGE")]
    package: Option<String>,

    /// Extra text appended to shared and emailed reports
    #[arg(long)]
    debug_message: Option<String>,

    /// Crash contact address (enables the email action)
    #[arg(short, long, env = "CRASHER_EMAIL")]
    email: Option<String>,
}

impl CrashArgs {
    fn details(&self) -> std::io::Result<CrashDetails> {
        let stack_trace = match self.input.as_deref() {
            Some(input) => Some(read_input(input)?),
            None => None,
        };

        Ok(CrashDetails {
            name: self.name.clone(),
            message: self.message.clone(),
            stack_trace,
        })
    }

    fn device(&self) -> DeviceInfo {
        DeviceInfo {
            model: self.model.clone(),
            manufacturer: self.manufacturer.clone(),
            api_level: self.api_level,
        }
    }

    fn options(&self) -> ScreenOptions {
        ScreenOptions {
            app_name: self.app_name.clone(),
            email: self.email.clone(),
            debug_message: self.debug_message.clone(),
            package: self.package.clone(),
        }
    }

    fn screen(&self) -> std::io::Result<CrashScreen> {
        Ok(CrashScreen::new(self.details()?, self.device(), self.options()))
    }
}

/// Where and how long to wait when submitting.
#[derive(Args, Debug)]
struct EndpointArgs {
    /// Crash log endpoint URL
    #[arg(long, env = "CRASHER_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Connect timeout in milliseconds
    #[arg(long, env = "CRASHER_CONNECT_TIMEOUT_MS", default_value_t = DEFAULT_CONNECT_TIMEOUT.as_millis() as u64)]
    connect_timeout_ms: u64,

    /// Read timeout in milliseconds
    #[arg(long, env = "CRASHER_READ_TIMEOUT_MS", default_value_t = DEFAULT_READ_TIMEOUT.as_millis() as u64)]
    read_timeout_ms: u64,
}

impl EndpointArgs {
    fn config(&self) -> CrasherConfig {
        CrasherConfig {
            endpoint: self.endpoint.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Show {
            crash,
            endpoint,
            no_submit,
            collapse_stack_trace,
            format,
        } => {
            show(&crash, &endpoint, no_submit, collapse_stack_trace, format).await?;
        }
        Commands::Submit {
            crash,
            endpoint,
            report,
        } => {
            let result = submit(&crash, &endpoint, report).await?;
            if !result.is_success() {
                std::process::exit(1);
            }
        }
        Commands::Copy { crash } => {
            let mut screen = crash.screen()?;
            let host = TerminalHost::new(None, OutputFormat::Pretty);
            for effect in screen.handle(Action::Copy) {
                host.run(effect)?;
            }
        }
        Commands::Share { crash } => {
            let mut screen = crash.screen()?;
            let host = TerminalHost::new(None, OutputFormat::Pretty);
            for effect in screen.handle(Action::Share) {
                host.run(effect)?;
            }
        }
        Commands::Email { crash } => {
            let mut screen = crash.screen()?;
            let effects = screen.handle(Action::Email);
            if effects.is_empty() {
                return Err("No crash contact address configured (use --email)".into());
            }
            let host = TerminalHost::new(None, OutputFormat::Pretty);
            for effect in effects {
                host.run(effect)?;
            }
        }
    }

    Ok(())
}

fn read_input(input: &str) -> std::io::Result<String> {
    if input == "-" {
        use std::io::Read;
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(input)
    }
}

/// Render the screen, auto-submit, and wait for the outcome toast.
async fn show(
    crash: &CrashArgs,
    endpoint: &EndpointArgs,
    no_submit: bool,
    collapse_stack_trace: bool,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut screen = crash.screen()?;
    let host = TerminalHost::new(None, format);

    if collapse_stack_trace {
        for effect in screen.handle(Action::ToggleStackTrace) {
            host.run(effect)?;
        }
    }

    match format {
        OutputFormat::Pretty => print_screen(&screen),
        OutputFormat::Json => {
            let output = serde_json::json!({
                "title": screen.title(),
                "message": screen.message(),
                "description": screen.description(),
                "stack_trace": screen.stack_trace(),
                "stack_trace_visible": screen.stack_trace_visible(),
                "email_enabled": screen.email_enabled(),
                "body": screen.body(),
            });
            // One object per line, like the effects that follow
            println!("{}", serde_json::to_string(&output)?);
        }
    }

    if no_submit {
        return Ok(());
    }

    let submitter = CrashSubmitter::new(&endpoint.config())?;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let host = TerminalHost::new(Some((submitter, tx)), format);

    for effect in screen.on_load() {
        host.run(effect)?;
    }
    // Only spawned submissions hold senders now; the loop ends when they finish.
    drop(host);

    while let Some(result) = rx.recv().await {
        debug!(%result, "Submission finished");
        let host = TerminalHost::new(None, format);
        for effect in screen.on_submission(result) {
            host.run(effect)?;
        }
    }

    Ok(())
}

/// Submit once and print the result.
async fn submit(
    crash: &CrashArgs,
    endpoint: &EndpointArgs,
    report_path: Option<PathBuf>,
) -> Result<SubmissionResult, Box<dyn std::error::Error>> {
    let report = match report_path {
        Some(path) => CrashReport::from_json(&std::fs::read_to_string(path)?)?,
        None => crash.details()?.to_report(&crash.device()),
    };

    let submitter = CrashSubmitter::new(&endpoint.config())?;
    println!("  {} {}", "Endpoint:".cyan(), submitter.endpoint());

    let result = submitter.submit(&report).await;
    let line = match result {
        SubmissionResult::Success => format!("{} {}", "✓".green(), result.user_message()),
        SubmissionResult::HttpFailure(code) => {
            format!("{} {} (HTTP {})", "✗".red(), result.user_message(), code)
        }
        SubmissionResult::TransportError => format!("{} {}", "✗".red(), result.user_message()),
    };
    println!("{}", line);

    Ok(result)
}

/// Carries out screen effects in a terminal.
struct TerminalHost {
    submissions: Option<(CrashSubmitter, mpsc::UnboundedSender<SubmissionResult>)>,
    format: OutputFormat,
}

impl TerminalHost {
    fn new(
        submissions: Option<(CrashSubmitter, mpsc::UnboundedSender<SubmissionResult>)>,
        format: OutputFormat,
    ) -> Self {
        Self {
            submissions,
            format,
        }
    }

    fn run(&self, effect: Effect) -> Result<(), Box<dyn std::error::Error>> {
        if let OutputFormat::Json = self.format {
            if !matches!(effect, Effect::Submit(_)) {
                println!("{}", serde_json::to_string(&effect)?);
            }
        }

        match effect {
            Effect::Submit(report) => match &self.submissions {
                Some((submitter, tx)) => {
                    submitter.spawn(report, tx.clone());
                }
                None => debug!("No submitter attached, skipping submission"),
            },
            _ if matches!(self.format, OutputFormat::Json) => {}
            Effect::Toast { text } => println!("{} {}", "▸".yellow().bold(), text),
            Effect::CopyToClipboard { label, text } => {
                println!("{} {}", "Copied:".cyan(), label);
                println!("{}", text);
            }
            Effect::Share(request) => println!("{}", request.text),
            Effect::Compose(draft) => println!("{}", draft.mailto_url()?),
            Effect::StackTraceVisible { visible } => {
                debug!(visible, "Stack trace visibility changed");
            }
        }

        Ok(())
    }
}

fn print_screen(screen: &CrashScreen) {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

    println!("{}", "━".repeat(60).dimmed());
    println!("{} {}", "CRASH".red().bold(), timestamp.dimmed());
    println!("{}", "━".repeat(60).dimmed());
    println!("{}", screen.title().yellow().bold());
    if let Some(message) = screen.message() {
        println!("{}", message);
    }
    println!("{}", screen.description().dimmed());

    if screen.stack_trace_visible() && !screen.stack_trace().is_empty() {
        println!();
        println!("{}:", "Stack Trace".yellow().bold());
        let stack = screen.stack_trace();
        for line in stack.lines().take(STACK_PREVIEW_LINES) {
            println!("  {}", line.dimmed());
        }
        let line_count = stack.lines().count();
        if line_count > STACK_PREVIEW_LINES {
            println!(
                "  {} (+{} more lines)",
                "...".dimmed(),
                line_count - STACK_PREVIEW_LINES
            );
        }
    }

    println!("{}", "━".repeat(60).dimmed());
}
