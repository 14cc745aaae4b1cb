//! The pipeline orchestrator: one session, one submission at a time.
//!
//! ```text
//!          submit(image)                 extract ─▶ parse ─▶ aggregate
//!  Idle ─────────────────▶ Busy ──┬──▶ Success ──▶ Idle
//!                                 └──▶ Failed  ──▶ Idle
//! ```
//!
//! A submission without an image is rejected before anything changes. A
//! submission while another is in flight is rejected with
//! [`SgpaError::SubmissionInProgress`]; two pipelines never interleave.
//! The first failing stage short-circuits the rest. A failure leaves the
//! last successful result in place; only [`Session::reset`] clears it.
//!
//! The credits table is injected at construction and never mutated, so the
//! session itself needs no lock beyond the busy flag and the result slot,
//! neither of which is held across an await.

use crate::credits::CreditsTable;
use crate::error::{SgpaError, SgpaWarning};
use crate::observer::{NoopObserver, SharedObserver};
use crate::output::AggregationResult;
use crate::pipeline::aggregate::aggregate;
use crate::pipeline::extract::ScoreExtractor;
use crate::pipeline::input::ImageInput;
use crate::pipeline::parse::{parse_scores, RecordValidation};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Where a session is in its submission cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Busy,
    /// Transient: reported to the observer, then `Idle`.
    Success,
    /// Transient: reported to the observer, then `Idle`.
    Failed,
}

/// Runs submissions through extract → parse → aggregate.
pub struct Session<E> {
    extractor: E,
    credits: Arc<CreditsTable>,
    validation: RecordValidation,
    observer: SharedObserver,
    state: Mutex<SessionState>,
    last_result: Mutex<Option<AggregationResult>>,
}

impl<E: ScoreExtractor> Session<E> {
    pub fn new(extractor: E, credits: impl Into<Arc<CreditsTable>>) -> Self {
        Self {
            extractor,
            credits: credits.into(),
            validation: RecordValidation::default(),
            observer: Arc::new(NoopObserver),
            state: Mutex::new(SessionState::Idle),
            last_result: Mutex::new(None),
        }
    }

    pub fn with_validation(mut self, validation: RecordValidation) -> Self {
        self.validation = validation;
        self
    }

    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    /// `Idle` or `Busy`.
    pub fn state(&self) -> SessionState {
        *lock(&self.state)
    }

    /// The credits table this session aggregates against.
    pub fn credits(&self) -> &CreditsTable {
        &self.credits
    }

    /// The most recent successful result, if any.
    pub fn last_result(&self) -> Option<AggregationResult> {
        lock(&self.last_result).clone()
    }

    /// Forget the retained result.
    pub fn reset(&self) {
        lock(&self.last_result).take();
    }

    /// Run one image through the pipeline.
    ///
    /// Every error is also handed to the observer, so callers that only
    /// display notifications can ignore the return value.
    pub async fn submit(&self, image: Option<ImageInput>) -> Result<AggregationResult, SgpaError> {
        let image = match image {
            Some(img) if !img.is_empty() => img,
            _ => return Err(self.reject(SgpaError::NoImageSelected)),
        };

        let Some(busy) = BusyGuard::acquire(self) else {
            return Err(self.reject(SgpaError::SubmissionInProgress));
        };

        let start = Instant::now();
        info!("Submission started ({} bytes, {})", image.bytes().len(), image.mime_type());

        match self.run(&image).await {
            Ok((result, warnings)) => {
                for w in &warnings {
                    self.observer.on_warning(w);
                }
                *lock(&self.last_result) = Some(result.clone());
                info!(
                    "SGPA {} over {} subjects in {:?}",
                    result.sgpa_display(),
                    result.per_subject.len(),
                    start.elapsed()
                );
                self.observer.on_success(&result);
                busy.finish(SessionState::Success);
                Ok(result)
            }
            Err(e) => {
                warn!("Submission failed: {}", e);
                self.observer.on_failure(&e);
                busy.finish(SessionState::Failed);
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        image: &ImageInput,
    ) -> Result<(AggregationResult, Vec<SgpaWarning>), SgpaError> {
        let raw = self.extractor.extract(image).await?;
        debug!("Model answered with {} chars", raw.len());
        let scores = parse_scores(&raw, self.validation)?;
        debug!("Parsed {} subjects", scores.len());
        Ok(aggregate(scores, &self.credits))
    }

    fn reject(&self, e: SgpaError) -> SgpaError {
        warn!("Submission rejected: {}", e);
        self.observer.on_failure(&e);
        e
    }

    fn set_state(&self, state: SessionState) {
        *lock(&self.state) = state;
        self.observer.on_state_change(state);
    }
}

/// Holds the session in `Busy`; dropping it returns the session to `Idle`,
/// including when the submit future is dropped mid-flight.
struct BusyGuard<'a, E: ScoreExtractor> {
    session: &'a Session<E>,
    outcome: Option<SessionState>,
}

impl<'a, E: ScoreExtractor> BusyGuard<'a, E> {
    fn acquire(session: &'a Session<E>) -> Option<Self> {
        {
            let mut state = lock(&session.state);
            if *state == SessionState::Busy {
                return None;
            }
            *state = SessionState::Busy;
        }
        session.observer.on_state_change(SessionState::Busy);
        Some(Self {
            session,
            outcome: None,
        })
    }

    fn finish(mut self, outcome: SessionState) {
        self.outcome = Some(outcome);
    }
}

impl<E: ScoreExtractor> Drop for BusyGuard<'_, E> {
    fn drop(&mut self) {
        if let Some(outcome) = self.outcome {
            self.session.set_state(outcome);
        }
        self.session.set_state(SessionState::Idle);
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
