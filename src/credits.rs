//! Credits table: subject code → credit weight.
//!
//! The table is loaded once per session and then only read. It is handed to
//! [`crate::session::Session`] as an immutable value instead of living in a
//! global, so the aggregator can be exercised with any table in tests.
//!
//! Loading never fails a session. [`load_credits`] turns every problem
//! (network, HTTP status, bad JSON, missing file) into a
//! [`SgpaWarning::CreditsLoadFailed`] and returns an empty table, which makes
//! every later lookup miss. There is no automatic retry or refresh.

use crate::error::SgpaWarning;
use crate::observer::SessionObserver;
use crate::pipeline::input::is_url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Published course-credits dataset used when no other source is configured.
pub const DEFAULT_CREDITS_URL: &str =
    "https://raw.githubusercontent.com/deepakdnayak/datasets/refs/heads/main/courseCredits";

/// Subject code → non-negative integer credit weight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreditsTable(HashMap<String, u32>);

impl CreditsTable {
    /// An empty table: every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Decode the JSON object form `{"BCS501": 4, ...}`.
    pub fn from_json(json: &str) -> Result<Self, CreditsLoadError> {
        serde_json::from_str(json).map_err(|e| CreditsLoadError::Malformed {
            reason: e.to_string(),
        })
    }

    pub fn get(&self, code: &str) -> Option<u32> {
        self.0.get(code).copied()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.0.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, u32)> for CreditsTable {
    fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Why the credits table could not be loaded.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum CreditsLoadError {
    #[error("request to '{url}' failed: {message}")]
    Transport { url: String, message: String },

    #[error("credits source answered HTTP {status}")]
    Status { status: u16 },

    #[error("credits payload is not a code → credit map: {reason}")]
    Malformed { reason: String },

    #[error("cannot read credits file '{path}': {reason}")]
    Io { path: PathBuf, reason: String },
}

/// Where the credits table comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum CreditsSource {
    /// GET endpoint returning the JSON object form. No authentication.
    Url(String),
    /// Local file holding the JSON object form.
    File(PathBuf),
    /// A table already in memory.
    Inline(CreditsTable),
}

impl CreditsSource {
    /// Interpret a user-supplied location: http(s) URLs are fetched,
    /// anything else is read as a file path.
    pub fn parse(location: &str) -> Self {
        if is_url(location) {
            CreditsSource::Url(location.to_string())
        } else {
            CreditsSource::File(PathBuf::from(location))
        }
    }

    /// Fetch and decode the table, reporting the first problem.
    pub async fn fetch(&self, timeout_secs: u64) -> Result<CreditsTable, CreditsLoadError> {
        match self {
            CreditsSource::Url(url) => fetch_url(url, timeout_secs).await,
            CreditsSource::File(path) => {
                let text = tokio::fs::read_to_string(path).await.map_err(|e| {
                    CreditsLoadError::Io {
                        path: path.clone(),
                        reason: e.to_string(),
                    }
                })?;
                CreditsTable::from_json(&text)
            }
            CreditsSource::Inline(table) => Ok(table.clone()),
        }
    }
}

impl Default for CreditsSource {
    fn default() -> Self {
        CreditsSource::Url(DEFAULT_CREDITS_URL.to_string())
    }
}

/// Load the credits table for a session, degrading to an empty table.
///
/// Any failure is logged, reported once through `observer`, and swallowed.
pub async fn load_credits(
    source: &CreditsSource,
    timeout_secs: u64,
    observer: &dyn SessionObserver,
) -> CreditsTable {
    match source.fetch(timeout_secs).await {
        Ok(table) => {
            info!("Loaded credits for {} subjects", table.len());
            table
        }
        Err(e) => {
            warn!("Credits unavailable, continuing with an empty table: {}", e);
            observer.on_warning(&SgpaWarning::CreditsLoadFailed(e));
            CreditsTable::empty()
        }
    }
}

async fn fetch_url(url: &str, timeout_secs: u64) -> Result<CreditsTable, CreditsLoadError> {
    debug!("Fetching credits from: {}", url);

    let transport = |e: reqwest::Error| CreditsLoadError::Transport {
        url: url.to_string(),
        message: e.to_string(),
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(transport)?;

    let response = client.get(url).send().await.map_err(transport)?;

    if !response.status().is_success() {
        return Err(CreditsLoadError::Status {
            status: response.status().as_u16(),
        });
    }

    let body = response.text().await.map_err(transport)?;
    CreditsTable::from_json(&body)
}
