//! Aggregation: subject scores × credits table → SGPA.
//!
//! SGPA = Σ(grade_point × credits) / Σ credits over the subjects whose code
//! appears in the credits table. Codes with no credit weight stay in the
//! result for display but contribute to neither sum; each one yields an
//! [`SgpaWarning::UnmatchedCredit`]. With no matched credits at all the SGPA
//! is reported as `0`.
//!
//! Both sums are integers, so the result does not depend on iteration order.

use crate::credits::CreditsTable;
use crate::error::SgpaWarning;
use crate::grade::grade_point;
use crate::output::{AggregationResult, SubjectScores};
use tracing::{debug, warn};

/// Compute the credit-weighted SGPA. Never fails.
///
/// Returns the result together with one warning per unmatched code, in code
/// order.
pub fn aggregate(
    scores: SubjectScores,
    credits: &CreditsTable,
) -> (AggregationResult, Vec<SgpaWarning>) {
    let mut total_credits: u64 = 0;
    let mut total_weighted: u64 = 0;
    let mut unmatched = Vec::new();

    for (code, record) in &scores {
        match credits.get(code) {
            Some(credit) => {
                let gp = grade_point(record.total_marks);
                total_credits += u64::from(credit);
                total_weighted += u64::from(gp) * u64::from(credit);
                debug!("{}: {} marks → {} points × {} credits", code, record.total_marks, gp, credit);
            }
            None => {
                warn!("No credit found for {}", code);
                unmatched.push(code.clone());
            }
        }
    }

    let sgpa = if total_credits > 0 {
        total_weighted as f64 / total_credits as f64
    } else {
        0.0
    };

    let warnings = unmatched
        .iter()
        .map(|code| SgpaWarning::UnmatchedCredit { code: code.clone() })
        .collect();

    let result = AggregationResult {
        sgpa,
        per_subject: scores,
        total_credits,
        unmatched,
    };
    (result, warnings)
}
