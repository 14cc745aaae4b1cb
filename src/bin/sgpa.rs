//! CLI binary for edgequake-sgpa.
//!
//! A thin shim over the library crate that maps CLI flags to `SgpaConfig`,
//! runs one submission, and prints the result table.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_sgpa::{
    load_credits, AggregationResult, CreditsSource, GeminiExtractor, ImageInput,
    RecordValidation, ScoreExtractor, ScoreReport, Session, SessionObserver, SessionState,
    SgpaConfig, SgpaError, SgpaWarning,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Terminal observer: spinner while the session is busy, one coloured line
/// per warning.
struct CliObserver {
    /// `None` when progress output is disabled.
    bar: Option<ProgressBar>,
    quiet: bool,
    warnings: AtomicUsize,
}

impl CliObserver {
    fn new(show_progress: bool, quiet: bool) -> Arc<Self> {
        let bar = show_progress.then(|| {
            let bar = ProgressBar::hidden();
            let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
            bar.set_style(style);
            bar
        });
        Arc::new(Self {
            bar,
            quiet,
            warnings: AtomicUsize::new(0),
        })
    }

    fn println(&self, line: String) {
        match &self.bar {
            Some(bar) if !bar.is_hidden() => bar.println(line),
            _ => eprintln!("{line}"),
        }
    }
}

impl SessionObserver for CliObserver {
    fn on_state_change(&self, state: SessionState) {
        let Some(bar) = &self.bar else { return };
        match state {
            SessionState::Busy => {
                bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
                bar.set_prefix("Reading");
                bar.set_message("report card…");
                bar.enable_steady_tick(Duration::from_millis(80));
            }
            SessionState::Idle => bar.finish_and_clear(),
            SessionState::Success | SessionState::Failed => {}
        }
    }

    fn on_warning(&self, warning: &SgpaWarning) {
        self.warnings.fetch_add(1, Ordering::SeqCst);
        if !self.quiet {
            self.println(format!("{} {}", yellow("⚠"), warning));
        }
    }

    fn on_failure(&self, error: &SgpaError) {
        self.println(format!("{} {}", red("✘"), error));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Photo of a marks card
  sgpa marks-card.jpg

  # Pipe a screenshot from the clipboard (Wayland)
  wl-paste --type image/png | sgpa -

  # Credits from a local file, machine-readable output
  sgpa --credits credits.json --json marks-card.png > result.json

  # Reject incomplete or out-of-range records instead of coercing them
  sgpa --strict marks-card.png

GRADE SCALE:
  Marks  ≥90  ≥80  ≥70  ≥60  ≥50  ≥45  ≥40  <40
  Points  10    9    8    7    6    5    4    0

  SGPA = Σ(points × credits) / Σ credits over subjects found in the credits
  table. Subjects missing from the table are listed but not counted.

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY        API key for the extraction endpoint
  SGPA_CREDITS          Credits table URL or JSON file path
  SGPA_MODEL            Override model ID
  SGPA_API_BASE         Override endpoint base URL
  RUST_LOG              Override log filter
"#;

/// Compute SGPA from a report-card image using a Vision LLM.
#[derive(Parser, Debug)]
#[command(
    name = "sgpa",
    version,
    about = "Compute SGPA from a report-card image using a Vision LLM",
    long_about = "Read subject codes, names, and marks from a report-card image with a \
Vision Language Model, then compute the credit-weighted SGPA against a credits table.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Report-card image file, or '-' to read the image from stdin.
    image: Option<String>,

    /// Credits table: HTTP/HTTPS URL or path to a JSON file.
    #[arg(long, env = "SGPA_CREDITS")]
    credits: Option<String>,

    /// API key for the extraction endpoint.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Vision model ID.
    #[arg(long, env = "SGPA_MODEL", default_value = edgequake_sgpa::config::DEFAULT_MODEL)]
    model: String,

    /// Extraction endpoint base URL.
    #[arg(long, env = "SGPA_API_BASE", default_value = edgequake_sgpa::config::DEFAULT_API_BASE_URL)]
    api_base: String,

    /// Image MIME type; sniffed from the file when omitted.
    #[arg(long, env = "SGPA_MIME_TYPE")]
    mime_type: Option<String>,

    /// Fail on records missing a name or marks, or with marks outside 0–100.
    #[arg(long, env = "SGPA_STRICT")]
    strict: bool,

    /// Output the report as JSON instead of a table.
    #[arg(long, env = "SGPA_JSON")]
    json: bool,

    /// Extraction request timeout in seconds.
    #[arg(long, env = "SGPA_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Credits fetch timeout in seconds.
    #[arg(long, env = "SGPA_CREDITS_TIMEOUT", default_value_t = 30)]
    credits_timeout: u64,

    /// Disable the spinner.
    #[arg(long, env = "SGPA_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SGPA_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the result.
    #[arg(short, long, env = "SGPA_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner already says what is happening; keep INFO logs out of its way.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;
    let observer = CliObserver::new(show_progress, cli.quiet);

    // ── Resolve image ────────────────────────────────────────────────────
    let image = match cli.image.as_deref() {
        None => None,
        Some("-") => Some(ImageInput::from_stdin().await?),
        Some(path) => Some(ImageInput::from_path(path).await?),
    };
    // Checked before the API key and the credits fetch.
    let image = match selected_image(image) {
        Ok(img) => img,
        Err(e) => {
            observer.on_failure(&e);
            return Ok(ExitCode::FAILURE);
        }
    };
    let image = match config.mime_type {
        Some(ref mime) => image.with_mime_type(mime.clone()),
        None => image,
    };

    // ── Session ──────────────────────────────────────────────────────────
    let extractor = GeminiExtractor::from_config(&config)?;
    let credits = load_credits(
        &config.credits_source,
        config.credits_timeout_secs,
        observer.as_ref(),
    )
    .await;

    let session = Session::new(extractor, credits)
        .with_validation(config.record_validation)
        .with_observer(observer.clone());

    let Some(result) = submit_reported(&session, image).await else {
        return Ok(ExitCode::FAILURE);
    };
    let report = ScoreReport::new(&result, session.credits());

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else {
        print!("{}", report.render_table());
        if !cli.quiet {
            let skipped = observer.warnings.load(Ordering::SeqCst);
            eprintln!(
                "{} SGPA {} over {} credits{}",
                green("✔"),
                bold(&report.sgpa_display),
                report.total_credits,
                if skipped > 0 {
                    format!("  ({skipped} warnings)")
                } else {
                    String::new()
                }
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// An image with content, or `NoImageSelected`.
fn selected_image(image: Option<ImageInput>) -> Result<ImageInput, SgpaError> {
    image
        .filter(|img| !img.is_empty())
        .ok_or(SgpaError::NoImageSelected)
}

/// Submit once. Failures reach the user through the session observer only,
/// so the caller just maps `None` to a failing exit code.
async fn submit_reported<E: ScoreExtractor>(
    session: &Session<E>,
    image: ImageInput,
) -> Option<AggregationResult> {
    session.submit(Some(image)).await.ok()
}

/// Map CLI args to `SgpaConfig`.
fn build_config(cli: &Cli) -> Result<SgpaConfig> {
    let mut builder = SgpaConfig::builder()
        .model(&cli.model)
        .api_base_url(&cli.api_base)
        .api_timeout_secs(cli.api_timeout)
        .credits_timeout_secs(cli.credits_timeout)
        .record_validation(if cli.strict {
            RecordValidation::Strict
        } else {
            RecordValidation::Lenient
        });

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key);
    }
    if let Some(ref location) = cli.credits {
        builder = builder.credits_source(CreditsSource::parse(location));
    }
    if let Some(ref mime) = cli.mime_type {
        builder = builder.mime_type(mime);
    }

    builder.build().context("Invalid configuration")
}
