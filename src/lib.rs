//! # edgequake-sgpa
//!
//! Compute a credit-weighted SGPA from a photo or screenshot of a report
//! card, using a Vision Language Model to read the marks.
//!
//! The model does the reading; this crate owns everything around it:
//! encoding the image for the request, treating the model's answer as
//! untrusted text, joining the marks with a credits table, and computing the
//! weighted mean on a fixed 10-point scale.
//!
//! ## Pipeline Overview
//!
//! ```text
//! image
//!  │
//!  ├─ 1. Input     file / bytes / stdin, MIME sniffed from magic bytes
//!  ├─ 2. Encode    bytes → base64 inlineData
//!  ├─ 3. Extract   one generateContent call (Gemini), raw text back
//!  ├─ 4. Parse     strip ```json fences, decode, validate records
//!  ├─ 5. Aggregate Σ(grade point × credits) / Σ credits
//!  └─ 6. Output    SGPA + annotated subject table
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_sgpa::{calculate, SgpaConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SgpaConfig::builder()
//!         .api_key(std::env::var("GEMINI_API_KEY")?)
//!         .build()?;
//!     let report = calculate("marks-card.png", &config).await?;
//!     println!("{}", report.render_table());
//!     Ok(())
//! }
//! ```
//!
//! ## Grade Scale
//!
//! | Marks | Grade point |
//! |-------|-------------|
//! | ≥ 90  | 10 |
//! | ≥ 80  | 9  |
//! | ≥ 70  | 8  |
//! | ≥ 60  | 7  |
//! | ≥ 50  | 6  |
//! | ≥ 45  | 5  |
//! | ≥ 40  | 4  |
//! | < 40  | 0  |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `sgpa` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod calculate;
pub mod config;
pub mod credits;
pub mod error;
pub mod grade;
pub mod observer;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use calculate::{calculate, calculate_image, calculate_sync};
pub use config::{SgpaConfig, SgpaConfigBuilder};
pub use credits::{load_credits, CreditsLoadError, CreditsSource, CreditsTable};
pub use error::{SgpaError, SgpaWarning};
pub use grade::grade_point;
pub use observer::{NoopObserver, SessionObserver, SharedObserver};
pub use output::{AggregationResult, ScoreReport, SubjectRecord, SubjectRow, SubjectScores};
pub use pipeline::aggregate::aggregate;
pub use pipeline::extract::{GeminiExtractor, ScoreExtractor};
pub use pipeline::input::ImageInput;
pub use pipeline::parse::{parse_scores, RecordValidation};
pub use session::{Session, SessionState};
