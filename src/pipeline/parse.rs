//! Response parsing: model text → validated [`SubjectScores`].
//!
//! The model is asked for a bare JSON object but is untrusted. Parsing runs
//! three steps:
//!
//! 1. Strip Markdown code-fence markers (```` ```json ```` / ```` ``` ````)
//!    and surrounding whitespace.
//! 2. Decode the rest as JSON and require a top-level object. Anything else
//!    (prose, an array, a bare number, empty text) is a
//!    [`SgpaError::ParseFailure`].
//! 3. Turn each entry into a [`SubjectRecord`] under a
//!    [`RecordValidation`] policy.

use crate::error::SgpaError;
use crate::output::{SubjectRecord, SubjectScores};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

/// How much to trust each decoded record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordValidation {
    /// Only the top-level shape is checked. A missing or mistyped
    /// `subject_name` becomes `""`. A `total_marks` given as a numeric
    /// string (`"80"`) is parsed; one that is missing or not a number
    /// becomes `0` (which grades to 0). Each coercion is logged.
    #[default]
    Lenient,
    /// Every record must be an object with a string `subject_name` and a
    /// numeric `total_marks` within 0–100.
    Strict,
}

static RE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```json|```").unwrap());

/// Remove code-fence markers wherever they appear, then trim.
pub fn strip_code_fences(raw: &str) -> String {
    RE_FENCE.replace_all(raw, "").trim().to_string()
}

/// Decode model output into subject scores.
pub fn parse_scores(raw: &str, validation: RecordValidation) -> Result<SubjectScores, SgpaError> {
    let text = strip_code_fences(raw);
    if text.is_empty() {
        return Err(parse_failure("response text is empty"));
    }

    let value: Value = serde_json::from_str(&text).map_err(|e| parse_failure(e.to_string()))?;
    let entries = match value {
        Value::Object(entries) => entries,
        other => {
            return Err(parse_failure(format!(
                "expected a JSON object keyed by subject code, got {}",
                kind_of(&other)
            )))
        }
    };

    entries
        .into_iter()
        .map(|(code, value)| -> Result<(String, SubjectRecord), SgpaError> {
            let record = match validation {
                RecordValidation::Lenient => lenient_record(&code, value),
                RecordValidation::Strict => strict_record(&code, value)?,
            };
            Ok((code, record))
        })
        .collect()
}

fn lenient_record(code: &str, value: Value) -> SubjectRecord {
    let fields = match value {
        Value::Object(fields) => fields,
        other => {
            warn!("{}: record is {}, not an object", code, kind_of(&other));
            Map::new()
        }
    };

    let subject_name = match fields.get("subject_name") {
        Some(Value::String(s)) => s.clone(),
        _ => {
            warn!("{}: missing subject_name", code);
            String::new()
        }
    };
    // Models sometimes quote numbers: "80" grades like 80.
    let total_marks = match fields.get("total_marks") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|m| m.is_finite()),
        _ => None,
    };
    let total_marks = match total_marks {
        Some(m) => m,
        None => {
            warn!("{}: missing or non-numeric total_marks, treating as 0", code);
            0.0
        }
    };

    SubjectRecord {
        subject_name,
        total_marks,
    }
}

fn strict_record(code: &str, value: Value) -> Result<SubjectRecord, SgpaError> {
    let fields = match value {
        Value::Object(fields) => fields,
        other => {
            return Err(parse_failure(format!(
                "{code}: record is {}, not an object",
                kind_of(&other)
            )))
        }
    };

    let subject_name = fields
        .get("subject_name")
        .and_then(Value::as_str)
        .ok_or_else(|| parse_failure(format!("{code}: subject_name missing or not a string")))?;
    let total_marks = fields
        .get("total_marks")
        .and_then(Value::as_f64)
        .ok_or_else(|| parse_failure(format!("{code}: total_marks missing or not a number")))?;
    if !(0.0..=100.0).contains(&total_marks) {
        return Err(parse_failure(format!(
            "{code}: total_marks {total_marks} outside 0–100"
        )));
    }

    Ok(SubjectRecord::new(subject_name, total_marks))
}

fn parse_failure(reason: impl Into<String>) -> SgpaError {
    SgpaError::ParseFailure {
        reason: reason.into(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
