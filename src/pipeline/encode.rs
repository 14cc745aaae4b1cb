//! Image encoding: raw bytes → base64 wrapped in an [`InlineImage`].
//!
//! The extraction endpoint takes the image inline in the JSON body, tagged
//! with its MIME type. The bytes are sent exactly as uploaded: re-encoding
//! would only blur the small print on a scanned marks card.

use super::input::ImageInput;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use tracing::debug;

/// The `inlineData` part of a `generateContent` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage {
    pub mime_type: String,
    /// Standard (padded) base64 of the image bytes.
    pub data: String,
}

/// Encode an image for the request body.
pub fn encode_image(image: &ImageInput) -> InlineImage {
    let data = STANDARD.encode(image.bytes());
    debug!(
        "Encoded {} image → {} bytes base64",
        image.mime_type(),
        data.len()
    );

    InlineImage {
        mime_type: image.mime_type().to_string(),
        data,
    }
}
