//! Translation of validated requests into provider wire payloads.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::{Value, json};

use crate::{plan::StageKind, request::ImageData};

/// Wire payload sent to a provider.
pub type ProviderPayload = Value;

/// How image bytes are embedded in a JSON payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    /// `{"prompt": ..., "image": [u8, ...]}`
    ByteArray,
    /// `{"contents": [{"parts": [{"inlineData": {"mimeType", "data"}}, {"text"}]}]}`
    InlineBase64,
}

/// Encodes a single stage for a provider.
///
/// Stages that carry an image use `image`; a missing image on such a stage
/// encodes as text only.
pub fn encode(
    encoding: ImageEncoding,
    stage: StageKind,
    prompt: &str,
    image: Option<&ImageData>,
) -> ProviderPayload {
    let image = if stage.carries_image() { image } else { None };
    match encoding {
        ImageEncoding::ByteArray => encode_byte_array(prompt, image),
        ImageEncoding::InlineBase64 => encode_inline_base64(prompt, image),
    }
}

fn encode_byte_array(prompt: &str, image: Option<&ImageData>) -> Value {
    match image {
        Some(image) => json!({ "prompt": prompt, "image": image.bytes }),
        None => json!({ "prompt": prompt }),
    }
}

fn encode_inline_base64(prompt: &str, image: Option<&ImageData>) -> Value {
    let mut parts = Vec::with_capacity(2);
    if let Some(image) = image {
        parts.push(json!({
            "inlineData": {
                "mimeType": image.mime_type,
                "data": STANDARD.encode(&image.bytes),
            }
        }));
    }
    parts.push(json!({ "text": prompt }));
    json!({ "contents": [{ "parts": parts }] })
}
