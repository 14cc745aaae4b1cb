//! Instruction text sent alongside the report-card image.
//!
//! Kept in one place so tests can inspect it and so it can be replaced
//! through [`crate::config::SgpaConfig::instruction`] without touching the
//! extraction client.

/// Default instruction: return one JSON object keyed by subject code.
///
/// Models still wrap the answer in ```json fences now and then; the
/// response parser strips those.
pub const DEFAULT_EXTRACTION_PROMPT: &str = r#"Extract the subject codes, their corresponding subject names, and total marks from the image.
Provide output as a JSON object where each subject code is a key and its value is an object containing:
- "subject_name": The full name of the subject.
- "total_marks": The total marks obtained as an integer.
Ensure the output is a valid JSON object without any formatting or markdown, like this example:

{
    "BCS501": { "subject_name": "Data Structures", "total_marks": 80 },
    "BCS502": { "subject_name": "Computer Networks", "total_marks": 87 },
    "BCS503": { "subject_name": "Database Management Systems", "total_marks": 84 },
    "BCGL504": { "subject_name": "Environmental Science", "total_marks": 100 },
    "BCG586": { "subject_name": "Artificial Intelligence", "total_marks": 98 },
    "BRMK557": { "subject_name": "Marketing Strategies", "total_marks": 80 },
    "BCS508": { "subject_name": "Cyber Security", "total_marks": 79 },
    "BPEK559": { "subject_name": "Physical Education", "total_marks": 96 },
    "BCS515B": { "subject_name": "Machine Learning", "total_marks": 89 }
}"#;
