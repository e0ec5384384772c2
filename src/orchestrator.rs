use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use crate::{
    client::invoke_with_retry,
    config::{GatewayConfig, OrchestrationMode, ProviderKind},
    error::GenerateError,
    normalize::text_or_fallback,
    plan::{
        CAPTION_PROMPT, DESCRIPTION_FALLBACK, ModelCatalog, ModelPlan, PlannedStage,
        compose_styling_prompt, select_plan,
    },
    provider::InferenceProvider,
    request::{GenerationRequest, GenerationResponse, ImageData},
    retry::RetryPolicy,
};

/// Status and JSON body returned to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateReply {
    pub status: StatusCode,
    pub body: Value,
}

impl GenerateReply {
    pub fn success(text: String) -> Self {
        Self {
            status: StatusCode::OK,
            body: json!(GenerationResponse { text }),
        }
    }

    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }
}

impl From<GenerateError> for GenerateReply {
    fn from(err: GenerateError) -> Self {
        Self::error(err.status(), err.to_string())
    }
}

impl IntoResponse for GenerateReply {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Serves generation requests against one provider.
///
/// Holds no per-request state, so a single instance can be shared by any
/// number of concurrent requests.
pub struct Orchestrator<P> {
    provider: Option<P>,
    kind: ProviderKind,
    mode: OrchestrationMode,
    models: ModelCatalog,
    retry: RetryPolicy,
    fallback_text: String,
    styling_fallback_text: String,
}

impl<P: InferenceProvider> Orchestrator<P> {
    /// `provider` is `None` when the deployment lacks credentials; every
    /// request is then answered with a configuration error.
    pub fn new(provider: Option<P>, config: &GatewayConfig) -> Self {
        Self {
            provider,
            kind: config.provider,
            mode: config.mode,
            models: config.models.clone(),
            retry: config.retry.clone(),
            fallback_text: config.fallback_text.clone(),
            styling_fallback_text: config.styling_fallback_text.clone(),
        }
    }

    /// Parses a raw JSON body and runs it to a reply. Never fails: every
    /// error becomes a JSON `{ "error": ... }` body with a matching status.
    pub async fn handle(&self, raw: &[u8]) -> GenerateReply {
        let request = match serde_json::from_slice::<GenerationRequest>(raw) {
            Ok(request) => request,
            Err(e) => {
                log::debug!("Rejecting malformed request body: {e}");
                return GenerateReply::error(
                    StatusCode::BAD_REQUEST,
                    format!("Request body must be a JSON object with a \"text\" field: {e}"),
                );
            }
        };

        match self.generate(&request).await {
            Ok(text) => GenerateReply::success(text),
            Err(err) => {
                if err.status().is_server_error() {
                    log::error!("Generation failed: {err}");
                } else {
                    log::debug!("Rejected request: {err}");
                }
                err.into()
            }
        }
    }

    /// Validates `request`, runs its plan and returns the generated text.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerateError> {
        let provider = self
            .provider
            .as_ref()
            .ok_or(GenerateError::MissingCredentials(self.kind))?;
        let request = request.validate()?;

        let plan = select_plan(request.image.is_some(), self.mode, &self.models);
        log::debug!(
            "Serving request with {} {} stage(s)",
            provider.kind().as_str(),
            plan.stage_count()
        );

        let image = request.image.as_ref();
        let generated = match plan {
            ModelPlan::Single(stage) => {
                let generated = self.run_stage(provider, &stage, &request.text, image).await?;
                text_or_fallback(generated, &self.fallback_text)
            }
            ModelPlan::TwoStage { vision, text } => {
                let description = self.run_stage(provider, &vision, CAPTION_PROMPT, image).await?;
                let description = text_or_fallback(description, DESCRIPTION_FALLBACK);
                log::debug!("Image description: {description}");

                let prompt = compose_styling_prompt(&description, &request.text);
                let generated = self.run_stage(provider, &text, &prompt, None).await?;
                text_or_fallback(generated, &self.styling_fallback_text)
            }
        };

        log::info!("Generated response with {}", provider.kind().as_str());
        Ok(generated)
    }

    async fn run_stage(
        &self,
        provider: &P,
        stage: &PlannedStage,
        prompt: &str,
        image: Option<&ImageData>,
    ) -> Result<Option<String>, GenerateError> {
        let payload = provider.encode(stage.kind, prompt, image);
        let body = invoke_with_retry(provider, &stage.model_id, &payload, &self.retry).await?;
        Ok(provider.extract_text(stage.kind, &body))
    }
}
