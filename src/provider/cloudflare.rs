use serde_json::Value;

use super::{InferenceOutcome, InferenceProvider, first_text, send_json};
use crate::{
    codec::{ImageEncoding, ProviderPayload},
    config::{Credentials, GatewayConfig, ProviderKind},
    error::InferenceFailure,
    plan::StageKind,
};

pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com";

/// Cloudflare Workers AI.
///
/// Payloads are `{"prompt", "image"?}` with the image as a flat byte array.
/// Text models answer in `result.response`, vision models in
/// `result.description`.
#[derive(Clone)]
pub struct CloudflareProvider {
    http: reqwest::Client,
    base_url: String,
    account_id: String,
    api_token: String,
}

impl CloudflareProvider {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        account_id: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            account_id: account_id.into(),
            api_token: api_token.into(),
        }
    }

    /// Returns `None` when the configuration carries no Cloudflare credentials.
    pub fn from_config(config: &GatewayConfig, http: reqwest::Client) -> Option<Self> {
        match &config.credentials {
            Some(Credentials::Cloudflare {
                account_id,
                api_token,
            }) => Some(Self::new(
                http,
                config.api_base.as_deref().unwrap_or(CLOUDFLARE_API_BASE),
                account_id,
                api_token,
            )),
            _ => None,
        }
    }

    fn run_url(&self, model_id: &str) -> String {
        format!(
            "{}/client/v4/accounts/{}/ai/run/{}",
            self.base_url, self.account_id, model_id
        )
    }
}

fn error_messages(body: &Value) -> Option<String> {
    let messages: Vec<&str> = body
        .get("errors")?
        .as_array()?
        .iter()
        .filter_map(|e| e.get("message").and_then(Value::as_str))
        .collect();
    (!messages.is_empty()).then(|| messages.join("; "))
}

impl InferenceProvider for CloudflareProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Cloudflare
    }

    fn image_encoding(&self) -> ImageEncoding {
        ImageEncoding::ByteArray
    }

    async fn invoke(&self, model_id: &str, payload: &ProviderPayload) -> InferenceOutcome {
        log::debug!("Calling Cloudflare model {model_id}");
        let request = self
            .http
            .post(self.run_url(model_id))
            .bearer_auth(&self.api_token)
            .json(payload);
        let body = send_json(ProviderKind::Cloudflare, model_id, request, error_messages).await?;

        // Workers AI can report failure inside a 200 envelope.
        if body.get("success").and_then(Value::as_bool) == Some(false) {
            let detail =
                error_messages(&body).unwrap_or_else(|| "request unsuccessful".to_string());
            return Err(InferenceFailure::new(
                ProviderKind::Cloudflare,
                model_id,
                None,
                detail,
            ));
        }
        Ok(body)
    }

    fn extract_text(&self, stage: StageKind, body: &Value) -> Option<String> {
        match stage {
            StageKind::TextOnly => first_text(body, &["/result/response"]),
            StageKind::Vision | StageKind::TextWithImage => {
                first_text(body, &["/result/description", "/result/response"])
            }
        }
    }
}
