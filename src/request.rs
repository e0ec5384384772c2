use base64::{
    Engine, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use serde::{Deserialize, Serialize};

use crate::error::GenerateError;

pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Standard alphabet, trailing `=` padding optional.
const IMAGE_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GenerationRequest {
    #[serde(default)]
    pub text: Option<String>,
    /// Base64 image, optionally as a `data:<mime>;base64,` URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Body of a successful reply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GenerationResponse {
    pub text: String,
}

/// Decoded image bytes and their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub text: String,
    pub image: Option<ImageData>,
}

impl GenerationRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            image: None,
        }
    }

    pub fn with_image(mut self, image_base64: impl Into<String>) -> Self {
        self.image = Some(image_base64.into());
        self
    }

    /// Whether an image accompanies the text. Empty strings count as absent.
    pub fn has_image(&self) -> bool {
        self.image.as_deref().is_some_and(|i| !i.trim().is_empty())
    }

    /// Checks the text is present and decodes the image, if any.
    pub fn validate(&self) -> Result<ValidatedRequest, GenerateError> {
        let text = self
            .text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| GenerateError::InvalidRequest("Text prompt is missing.".to_string()))?;

        let image = match self.image.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Some(decode_image(raw)?),
            _ => None,
        };

        Ok(ValidatedRequest {
            text: text.to_string(),
            image,
        })
    }
}

/// Decodes a base64 image, accepting a bare payload or a data URL.
pub fn decode_image(raw: &str) -> Result<ImageData, GenerateError> {
    let raw = raw.trim();
    let (mime_type, payload) = match raw.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest.split_once(',').ok_or_else(|| {
                GenerateError::InvalidRequest("Image data URL is missing its payload.".to_string())
            })?;
            let mime = header.strip_suffix(";base64").ok_or_else(|| {
                GenerateError::InvalidRequest("Image data URL must be base64 encoded.".to_string())
            })?;
            let mime = if mime.is_empty() { DEFAULT_IMAGE_MIME } else { mime };
            (mime, payload)
        }
        None => (DEFAULT_IMAGE_MIME, raw),
    };

    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = IMAGE_BASE64.decode(compact)?;
    if bytes.is_empty() {
        return Err(GenerateError::InvalidRequest("Image data is empty.".to_string()));
    }

    Ok(ImageData {
        bytes,
        mime_type: mime_type.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_blank_text_is_rejected() {
        for request in [
            GenerationRequest::default(),
            GenerationRequest::new(""),
            GenerationRequest::new("  \n\t"),
        ] {
            let err = request.validate().unwrap_err();
            assert!(matches!(err, GenerateError::InvalidRequest(_)));
            assert_eq!(err.to_string(), "Text prompt is missing.");
        }
    }

    #[test]
    fn unpadded_base64_is_accepted() {
        let request = GenerationRequest::new("hi").with_image("AQIDBA");
        assert_eq!(request.validate().unwrap().image.unwrap().bytes, vec![1, 2, 3, 4]);

        let request = GenerationRequest::new("hi").with_image("data:image/png;base64,AQIDBA==");
        let image = request.validate().unwrap().image.unwrap();
        assert_eq!(image.bytes, vec![1, 2, 3, 4]);
        assert_eq!(image.mime_type, "image/png");
    }

    #[test]
    fn empty_image_counts_as_absent() {
        let request = GenerationRequest::new("hi").with_image("");
        assert!(!request.has_image());
        assert_eq!(request.validate().unwrap().image, None);
    }

    #[test]
    fn bare_base64_decodes_as_jpeg() {
        let request = GenerationRequest::new("style this").with_image("AQID/w==");
        let validated = request.validate().unwrap();
        assert_eq!(validated.text, "style this");
        assert_eq!(
            validated.image,
            Some(ImageData {
                bytes: vec![1, 2, 3, 255],
                mime_type: DEFAULT_IMAGE_MIME.to_string()
            })
        );
    }

    #[test]
    fn data_url_keeps_its_mime_type() {
        let image = decode_image("data:image/png;base64,AQID").unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.bytes, vec![1, 2, 3]);
    }

    #[test]
    fn wrapped_base64_is_accepted() {
        let image = decode_image("AQID\nBAUG").unwrap();
        assert_eq!(image.bytes, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn malformed_base64_is_a_decode_error() {
        let err = GenerationRequest::new("x")
            .with_image("not*base64!")
            .validate()
            .unwrap_err();
        assert!(matches!(err, GenerateError::Decode(_)));
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn data_url_without_base64_marker_is_rejected() {
        let err = decode_image("data:image/png,AQID").unwrap_err();
        assert!(matches!(err, GenerateError::InvalidRequest(_)));
    }

    #[test]
    fn text_is_deserialized_from_json() {
        let request: GenerationRequest =
            serde_json::from_str(r#"{"text":"suggest an outfit"}"#).unwrap();
        assert_eq!(request, GenerationRequest::new("suggest an outfit"));

        let request: GenerationRequest = serde_json::from_str(r#"{"image":null}"#).unwrap();
        assert_eq!(request.text, None);
    }
}
