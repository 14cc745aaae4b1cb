//! One-shot entry points: image in, [`ScoreReport`] out.
//!
//! These build a fresh session per call: load credits, construct the
//! extraction client, submit once. Use [`crate::session::Session`] directly
//! to load credits once and submit many images.

use crate::config::SgpaConfig;
use crate::credits::load_credits;
use crate::error::SgpaError;
use crate::observer::{NoopObserver, SharedObserver};
use crate::output::ScoreReport;
use crate::pipeline::extract::GeminiExtractor;
use crate::pipeline::input::ImageInput;
use crate::session::Session;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Compute the SGPA for a report-card image file.
///
/// # Errors
/// Returns `Err(SgpaError)` when the image cannot be read, no API key is
/// configured, the extraction call fails, or the model output cannot be
/// parsed. A credits table that fails to load is not an error: the SGPA is
/// then `0` and every subject is reported as unmatched.
pub async fn calculate(
    image_path: impl AsRef<Path>,
    config: &SgpaConfig,
) -> Result<ScoreReport, SgpaError> {
    let image = ImageInput::from_path(image_path).await?;
    calculate_image(image, config, Arc::new(NoopObserver)).await
}

/// Compute the SGPA for an image already in memory, reporting warnings and
/// state changes to `observer`.
pub async fn calculate_image(
    image: ImageInput,
    config: &SgpaConfig,
    observer: SharedObserver,
) -> Result<ScoreReport, SgpaError> {
    let extractor = GeminiExtractor::from_config(config)?;
    let image = match config.mime_type {
        Some(ref mime) => image.with_mime_type(mime.clone()),
        None => image,
    };

    info!("Loading credits");
    let credits = load_credits(
        &config.credits_source,
        config.credits_timeout_secs,
        observer.as_ref(),
    )
    .await;

    let session = Session::new(extractor, credits)
        .with_validation(config.record_validation)
        .with_observer(observer);
    let result = session.submit(Some(image)).await?;
    Ok(ScoreReport::new(&result, session.credits()))
}

/// Synchronous wrapper around [`calculate`].
///
/// Creates a temporary tokio runtime internally.
pub fn calculate_sync(
    image_path: impl AsRef<Path>,
    config: &SgpaConfig,
) -> Result<ScoreReport, SgpaError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| SgpaError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(calculate(image_path, config))
}
