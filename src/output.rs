//! Result types: extracted subject scores, the aggregated SGPA, and the
//! annotated table a caller renders.

use crate::credits::CreditsTable;
use crate::grade::grade_point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Marks for one subject as read off the report card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectRecord {
    /// Full subject name, e.g. "Computer Networks".
    pub subject_name: String,
    /// Raw marks, normally a whole number in 0–100.
    pub total_marks: f64,
}

impl SubjectRecord {
    pub fn new(subject_name: impl Into<String>, total_marks: f64) -> Self {
        Self {
            subject_name: subject_name.into(),
            total_marks,
        }
    }
}

/// Subject code → record. Keys are unique; iteration is sorted by code.
pub type SubjectScores = BTreeMap<String, SubjectRecord>;

/// Output of the aggregator for one successful submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    /// Credit-weighted mean grade point in `[0, 10]`; `0` when no subject
    /// matched a credit weight. Unrounded.
    pub sgpa: f64,
    /// Every extracted subject, matched or not.
    pub per_subject: SubjectScores,
    /// Sum of credit weights that entered the mean.
    pub total_credits: u64,
    /// Subject codes with no credit weight, excluded from the mean.
    pub unmatched: Vec<String>,
}

impl AggregationResult {
    /// SGPA rounded for display, e.g. `"8.14"`.
    pub fn sgpa_display(&self) -> String {
        format!("{:.2}", self.sgpa)
    }
}

/// One row of the rendered table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectRow {
    pub code: String,
    pub subject_name: String,
    /// `None` when the code is missing from the credits table.
    pub credits: Option<u32>,
    pub total_marks: f64,
    pub grade_point: u8,
}

/// An [`AggregationResult`] joined with the credits it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub sgpa: f64,
    pub sgpa_display: String,
    pub total_credits: u64,
    pub rows: Vec<SubjectRow>,
    pub unmatched: Vec<String>,
}

impl ScoreReport {
    pub fn new(result: &AggregationResult, credits: &CreditsTable) -> Self {
        let rows = result
            .per_subject
            .iter()
            .map(|(code, record)| SubjectRow {
                code: code.clone(),
                subject_name: record.subject_name.clone(),
                credits: credits.get(code),
                total_marks: record.total_marks,
                grade_point: grade_point(record.total_marks),
            })
            .collect();

        Self {
            sgpa: result.sgpa,
            sgpa_display: result.sgpa_display(),
            total_credits: result.total_credits,
            rows,
            unmatched: result.unmatched.clone(),
        }
    }

    /// Plain-text rendering: the SGPA headline followed by the subject table.
    pub fn render_table(&self) -> String {
        const HEADERS: [&str; 4] = ["Subject Code", "Subject Name", "Credits", "Total Marks"];

        let cells: Vec<[String; 4]> = self
            .rows
            .iter()
            .map(|r| {
                [
                    r.code.clone(),
                    r.subject_name.clone(),
                    r.credits.map(|c| c.to_string()).unwrap_or_default(),
                    r.total_marks.to_string(),
                ]
            })
            .collect();

        let mut widths = HEADERS.map(|h| h.chars().count());
        for row in &cells {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        let _ = writeln!(out, "SGPA : {}", self.sgpa_display);
        let _ = writeln!(out);
        push_row(&mut out, &HEADERS.map(String::from), &widths);
        push_rule(&mut out, &widths);
        for row in &cells {
            push_row(&mut out, row, &widths);
        }
        out
    }
}

fn push_row(out: &mut String, cells: &[String; 4], widths: &[usize; 4]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(c, &w)| format!("{c:<w$}"))
        .collect::<Vec<_>>()
        .join(" | ");
    let _ = writeln!(out, "| {} |", line);
}

fn push_rule(out: &mut String, widths: &[usize; 4]) {
    let line = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("-|-");
    let _ = writeln!(out, "|-{}-|", line);
}
