//! Pipeline stages for turning a report-card image into an SGPA.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the extraction backend can be swapped without touching the rest.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ extract ──▶ parse ──▶ aggregate
//! (bytes)   (base64)   (VLM text)  (scores)  (SGPA)
//! ```
//!
//! 1. [`input`]     — read the image and tag it with a MIME type
//! 2. [`encode`]    — base64-wrap the bytes for the JSON request body
//! 3. [`extract`]   — the only stage with network I/O; one call, no retry
//! 4. [`parse`]     — strip fences, decode, validate the model's JSON
//! 5. [`aggregate`] — join with the credits table into a weighted mean

pub mod aggregate;
pub mod encode;
pub mod extract;
pub mod input;
pub mod parse;
