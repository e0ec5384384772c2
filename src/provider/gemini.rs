use serde_json::Value;

use super::{InferenceOutcome, InferenceProvider, send_json};
use crate::{
    codec::{ImageEncoding, ProviderPayload},
    config::{Credentials, GatewayConfig, ProviderKind},
    plan::StageKind,
};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Google Gemini `generateContent`.
///
/// Images travel as an inline base64 part tagged with their MIME type, and
/// the generated text is spread over the first candidate's content parts.
#[derive(Clone)]
pub struct GeminiProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiProvider {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Returns `None` when the configuration carries no Gemini key.
    pub fn from_config(config: &GatewayConfig, http: reqwest::Client) -> Option<Self> {
        match &config.credentials {
            Some(Credentials::Gemini { api_key }) => Some(Self::new(
                http,
                config.api_base.as_deref().unwrap_or(GEMINI_API_BASE),
                api_key,
            )),
            _ => None,
        }
    }

    fn generate_url(&self, model_id: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model_id)
    }
}

fn error_message(body: &Value) -> Option<String> {
    body.pointer("/error/message")
        .and_then(Value::as_str)
        .map(str::to_string)
}

impl InferenceProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn image_encoding(&self) -> ImageEncoding {
        ImageEncoding::InlineBase64
    }

    async fn invoke(&self, model_id: &str, payload: &ProviderPayload) -> InferenceOutcome {
        log::debug!("Calling Gemini model {model_id}");
        let request = self
            .http
            .post(self.generate_url(model_id))
            .header("x-goog-api-key", &self.api_key)
            .json(payload);
        send_json(ProviderKind::Gemini, model_id, request, error_message).await
    }

    fn extract_text(&self, _stage: StageKind, body: &Value) -> Option<String> {
        let parts = body.pointer("/candidates/0/content/parts")?.as_array()?;
        let text: String = parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}
