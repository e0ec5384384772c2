//! Backends that serve generation calls.

use std::future::Future;

use serde_json::Value;

use crate::{
    codec::{self, ImageEncoding, ProviderPayload},
    config::{GatewayConfig, ProviderKind},
    error::{ConfigError, InferenceFailure},
    plan::StageKind,
    request::ImageData,
};

mod cloudflare;
mod gemini;

pub use cloudflare::{CLOUDFLARE_API_BASE, CloudflareProvider};
pub use gemini::{GEMINI_API_BASE, GeminiProvider};

/// Result of one remote call: the parsed response envelope, or the failure.
pub type InferenceOutcome = Result<Value, InferenceFailure>;

/// Longest provider error body quoted verbatim in a failure.
const MAX_ERROR_BODY: usize = 512;

/// Trait for implementing a hosted inference backend.
///
/// A provider knows how its service wants payloads shaped, how to perform a
/// single authenticated call, and where the generated text lives in the
/// response envelope. Retrying is left to [`crate::client::invoke_with_retry`].
pub trait InferenceProvider: Send + Sync + 'static {
    /// The backend this provider talks to.
    fn kind(&self) -> ProviderKind;

    /// How image bytes are embedded in this provider's payloads.
    fn image_encoding(&self) -> ImageEncoding;

    /// Builds the wire payload for one stage.
    fn encode(&self, stage: StageKind, prompt: &str, image: Option<&ImageData>) -> ProviderPayload {
        codec::encode(self.image_encoding(), stage, prompt, image)
    }

    /// Performs exactly one call to `model_id`.
    fn invoke(
        &self,
        model_id: &str,
        payload: &ProviderPayload,
    ) -> impl Future<Output = InferenceOutcome> + Send;

    /// Finds the generated text in a successful response, if there is any.
    fn extract_text(&self, stage: StageKind, body: &Value) -> Option<String>;
}

/// Builds the outbound HTTP client shared by every call.
pub fn http_client(config: &GatewayConfig) -> Result<reqwest::Client, ConfigError> {
    Ok(reqwest::Client::builder().timeout(config.timeout).build()?)
}

/// Sends a JSON request and classifies the response.
///
/// `error_detail` pulls the provider's message out of an error envelope.
pub(crate) async fn send_json(
    provider: ProviderKind,
    model_id: &str,
    request: reqwest::RequestBuilder,
    error_detail: fn(&Value) -> Option<String>,
) -> InferenceOutcome {
    let failure = |status: Option<u16>, detail: String| {
        InferenceFailure::new(provider, model_id, status, detail)
    };

    let response = request
        .send()
        .await
        .map_err(|e| failure(e.status().map(|s| s.as_u16()), e.to_string()))?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| failure(Some(status.as_u16()), e.to_string()))?;

    if !status.is_success() {
        let detail = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|body| error_detail(&body))
            .unwrap_or_else(|| {
                if text.trim().is_empty() {
                    status.canonical_reason().unwrap_or("request failed").to_string()
                } else {
                    truncate(text.trim(), MAX_ERROR_BODY)
                }
            });
        return Err(failure(Some(status.as_u16()), detail));
    }

    serde_json::from_str(&text)
        .map_err(|e| failure(Some(status.as_u16()), format!("invalid JSON response: {e}")))
}

/// Returns the first non-blank string found at any of `paths`.
pub(crate) fn first_text(body: &Value, paths: &[&str]) -> Option<String> {
    paths
        .iter()
        .filter_map(|path| body.pointer(path))
        .filter_map(Value::as_str)
        .find(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn first_text_skips_missing_and_blank_fields() {
        let body = json!({ "result": { "description": "", "response": "ok" } });
        assert_eq!(
            first_text(&body, &["/result/missing", "/result/description", "/result/response"]),
            Some("ok".to_string())
        );
        assert_eq!(first_text(&body, &["/result/missing"]), None);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé...");
        assert_eq!(truncate("short", 10), "short");
    }
}
