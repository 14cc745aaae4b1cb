//! Error types for the edgequake-sgpa library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`SgpaError`] — **Fatal for one submission**: the calculation cannot
//!   produce a result (no image, endpoint refused the request, the model
//!   answered with something that is not a score map). Returned as
//!   `Err(SgpaError)` from [`crate::session::Session::submit`] and the
//!   top-level `calculate*` functions. The session stays usable.
//!
//! * [`SgpaWarning`] — **Non-fatal**: the credits table could not be loaded,
//!   or an extracted subject has no known credit weight. The calculation
//!   continues with whatever it has, and the warning is handed to the
//!   [`crate::observer::SessionObserver`] so the caller can show it.

use crate::credits::CreditsLoadError;
use std::path::PathBuf;
use thiserror::Error;

/// All submission-level errors returned by the edgequake-sgpa library.
///
/// Subject-level problems use [`SgpaWarning`] and never abort a submission.
#[derive(Debug, Error)]
pub enum SgpaError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Submission was triggered without an image.
    #[error("No image file selected.")]
    NoImageSelected,

    /// Another submission is still in flight on this session.
    #[error("A calculation is already in progress; wait for it to finish.")]
    SubmissionInProgress,

    /// Image file was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    ImageNotFound { path: PathBuf },

    /// Image file exists but could not be read.
    #[error("Failed to read image '{path}': {source}")]
    ImageReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// No API key was configured for the extraction endpoint.
    #[error("Extraction endpoint is not configured.\n{hint}")]
    ProviderNotConfigured { hint: String },

    /// The extraction endpoint answered with a non-success HTTP status.
    #[error("HTTP error! status: {status}{}", fmt_detail(.detail))]
    ExtractionStatus { status: u16, detail: String },

    /// The request to the extraction endpoint failed before a status arrived.
    #[error("Extraction request failed: {message}")]
    ExtractionTransport { message: String },

    /// The extraction call exceeded the configured timeout.
    #[error("Extraction request timed out after {secs}s")]
    ApiTimeout { secs: u64 },

    // ── Parse errors ──────────────────────────────────────────────────────
    /// The model's text could not be decoded as a subject-score mapping.
    #[error("Could not read subject scores from the model response: {reason}")]
    ParseFailure { reason: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SgpaError {
    /// True for every variant that means "the extraction call failed".
    pub fn is_extraction_failure(&self) -> bool {
        matches!(
            self,
            SgpaError::ExtractionStatus { .. }
                | SgpaError::ExtractionTransport { .. }
                | SgpaError::ApiTimeout { .. }
        )
    }
}

fn fmt_detail(detail: &str) -> String {
    if detail.is_empty() {
        String::new()
    } else {
        format!(" ({detail})")
    }
}

/// A non-fatal problem surfaced alongside (not instead of) a result.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum SgpaWarning {
    /// The credits table could not be loaded; an empty table is used.
    #[error("Failed to load credits data: {0}")]
    CreditsLoadFailed(CreditsLoadError),

    /// An extracted subject has no credit weight and was left out of the SGPA.
    #[error("Warning: No credit found for {code}")]
    UnmatchedCredit { code: String },
}
