//! Observer trait for session events.
//!
//! Inject an [`Arc<dyn SessionObserver>`] into a
//! [`crate::session::Session`] to be told when a submission starts and ends,
//! when the session changes state, and whenever a non-fatal
//! [`SgpaWarning`] comes up (credits could not be loaded, a subject has no
//! credit weight). A GUI turns these into toasts; the CLI prints coloured
//! lines and drives a spinner.
//!
//! # Example
//!
//! ```rust
//! use edgequake_sgpa::{SessionObserver, SgpaWarning};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingObserver {
//!     warnings: AtomicUsize,
//! }
//!
//! impl SessionObserver for CountingObserver {
//!     fn on_warning(&self, warning: &SgpaWarning) {
//!         self.warnings.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{warning}");
//!     }
//! }
//!
//! let observer: Arc<dyn SessionObserver> = Arc::new(CountingObserver {
//!     warnings: AtomicUsize::new(0),
//! });
//! ```

use crate::error::{SgpaError, SgpaWarning};
use crate::output::AggregationResult;
use crate::session::SessionState;
use std::sync::Arc;

/// Called by the session as a submission moves through the pipeline.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync`: a session
/// can be shared across tasks.
pub trait SessionObserver: Send + Sync {
    /// The session moved to `state`. `Success` and `Failed` are always
    /// followed by `Idle`.
    fn on_state_change(&self, state: SessionState) {
        let _ = state;
    }

    /// A non-fatal problem the caller should see.
    fn on_warning(&self, warning: &SgpaWarning) {
        let _ = warning;
    }

    /// A submission produced a result.
    fn on_success(&self, result: &AggregationResult) {
        let _ = result;
    }

    /// A submission was rejected or failed.
    fn on_failure(&self, error: &SgpaError) {
        let _ = error;
    }
}

/// Observer that ignores every event. Used when none is configured.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Convenience alias for a shared observer.
pub type SharedObserver = Arc<dyn SessionObserver>;
