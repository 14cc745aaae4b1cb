//! Configuration for an SGPA session.
//!
//! All behaviour is controlled through [`SgpaConfig`], built via its
//! [`SgpaConfigBuilder`]. Callers set only what they care about and rely on
//! the documented defaults for the rest.

use crate::credits::CreditsSource;
use crate::error::SgpaError;
use crate::pipeline::input::is_url;
use crate::pipeline::parse::RecordValidation;
use std::fmt;

/// Default extraction endpoint base.
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default vision model.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Configuration for extracting scores and computing an SGPA.
///
/// # Example
/// ```rust
/// use edgequake_sgpa::SgpaConfig;
///
/// let config = SgpaConfig::builder()
///     .api_key("my-key")
///     .model("gemini-1.5-flash")
///     .api_timeout_secs(30)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct SgpaConfig {
    /// API key for the extraction endpoint, sent as the `key` query
    /// parameter. Required by [`crate::pipeline::extract::GeminiExtractor`].
    pub api_key: Option<String>,

    /// Model id placed in the endpoint path. Default: `gemini-1.5-flash`.
    pub model: String,

    /// Endpoint base; requests go to
    /// `{api_base_url}/v1/models/{model}:generateContent`.
    pub api_base_url: String,

    /// Where the credits table is loaded from. Default: the published
    /// course-credits dataset.
    pub credits_source: CreditsSource,

    /// Custom extraction instruction. If None, uses the built-in prompt.
    pub instruction: Option<String>,

    /// Per-record checks applied to the model output. Default: lenient.
    pub record_validation: RecordValidation,

    /// Override for the image MIME tag. If None, sniffed from the bytes.
    pub mime_type: Option<String>,

    /// Whole-request timeout for the extraction call in seconds. Default: 60.
    ///
    /// Without it a stalled request would keep the session busy forever.
    /// There is no retry: a timed-out submission must be resubmitted.
    pub api_timeout_secs: u64,

    /// Timeout for fetching the credits table in seconds. Default: 30.
    pub credits_timeout_secs: u64,
}

impl Default for SgpaConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            credits_source: CreditsSource::default(),
            instruction: None,
            record_validation: RecordValidation::default(),
            mime_type: None,
            api_timeout_secs: 60,
            credits_timeout_secs: 30,
        }
    }
}

impl fmt::Debug for SgpaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SgpaConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("api_base_url", &self.api_base_url)
            .field("credits_source", &self.credits_source)
            .field("instruction", &self.instruction.as_ref().map(|s| s.len()))
            .field("record_validation", &self.record_validation)
            .field("mime_type", &self.mime_type)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("credits_timeout_secs", &self.credits_timeout_secs)
            .finish()
    }
}

impl SgpaConfig {
    /// Create a new builder for `SgpaConfig`.
    pub fn builder() -> SgpaConfigBuilder {
        SgpaConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`SgpaConfig`].
#[derive(Debug)]
pub struct SgpaConfigBuilder {
    config: SgpaConfig,
}

impl SgpaConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn credits_source(mut self, source: CreditsSource) -> Self {
        self.config.credits_source = source;
        self
    }

    pub fn instruction(mut self, text: impl Into<String>) -> Self {
        self.config.instruction = Some(text.into());
        self
    }

    pub fn record_validation(mut self, v: RecordValidation) -> Self {
        self.config.record_validation = v;
        self
    }

    pub fn mime_type(mut self, mime: impl Into<String>) -> Self {
        self.config.mime_type = Some(mime.into());
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn credits_timeout_secs(mut self, secs: u64) -> Self {
        self.config.credits_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SgpaConfig, SgpaError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(SgpaError::InvalidConfig("model must not be empty".into()));
        }
        if !is_url(&c.api_base_url) {
            return Err(SgpaError::InvalidConfig(format!(
                "API base URL must start with http:// or https://, got '{}'",
                c.api_base_url
            )));
        }
        if c.api_timeout_secs == 0 || c.credits_timeout_secs == 0 {
            return Err(SgpaError::InvalidConfig("timeouts must be ≥ 1 second".into()));
        }
        if matches!(c.api_key.as_deref(), Some(k) if k.trim().is_empty()) {
            return Err(SgpaError::InvalidConfig("API key must not be blank".into()));
        }
        Ok(self.config)
    }
}
