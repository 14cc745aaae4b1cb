//! Input resolution: turn an uploaded file, a path, or piped bytes into an
//! [`ImageInput`] with a MIME type.
//!
//! The MIME type is sniffed from the magic bytes. When the bytes match no
//! known format we fall back to `image/png` and let the extraction endpoint
//! decide; nothing here decodes the image or limits its size.

use crate::error::SgpaError;
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::debug;

/// MIME tag used when sniffing finds nothing.
pub const FALLBACK_MIME_TYPE: &str = "image/png";

/// A report-card image ready to be encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInput {
    bytes: Vec<u8>,
    mime_type: String,
}

impl ImageInput {
    /// Wrap raw bytes, sniffing the MIME type.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let mime_type = sniff_mime_type(&bytes);
        Self { bytes, mime_type }
    }

    /// Read an image file.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, SgpaError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SgpaError::ImageNotFound {
                path: path.to_path_buf(),
            },
            _ => SgpaError::ImageReadFailed {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        debug!("Read image {} ({} bytes)", path.display(), bytes.len());
        Ok(Self::from_bytes(bytes))
    }

    /// Read an image piped on stdin.
    pub async fn from_stdin() -> Result<Self, SgpaError> {
        let mut bytes = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut bytes)
            .await
            .map_err(|e| SgpaError::ImageReadFailed {
                path: "<stdin>".into(),
                source: e,
            })?;
        Ok(Self::from_bytes(bytes))
    }

    /// Override the sniffed MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// MIME type of an image judged by its leading bytes.
pub fn sniff_mime_type(bytes: &[u8]) -> String {
    image::guess_format(bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or(FALLBACK_MIME_TYPE)
        .to_string()
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}
