#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use muse_relay::{
    Credentials, GatewayConfig, InferenceFailure, InferenceOutcome, InferenceProvider,
    OrchestrationMode, ProviderKind, RetryPolicy, StageKind, codec::ImageEncoding,
    codec::ProviderPayload,
};
use serde_json::{Value, json};

/// A recorded remote call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub model_id: String,
    pub payload: Value,
}

#[derive(Default)]
struct Inner {
    script: Mutex<VecDeque<InferenceOutcome>>,
    calls: Mutex<Vec<Call>>,
}

/// Provider that answers calls from a script and records what it was sent.
/// Uses the Cloudflare payload and response shapes.
#[derive(Clone, Default)]
pub struct FakeProvider {
    inner: Arc<Inner>,
}

impl FakeProvider {
    pub fn with_script(outcomes: Vec<InferenceOutcome>) -> Self {
        let provider = Self::default();
        *provider.inner.script.lock().unwrap() = outcomes.into();
        provider
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.calls.lock().unwrap().clone()
    }
}

impl InferenceProvider for FakeProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Cloudflare
    }

    fn image_encoding(&self) -> ImageEncoding {
        ImageEncoding::ByteArray
    }

    async fn invoke(&self, model_id: &str, payload: &ProviderPayload) -> InferenceOutcome {
        self.inner.calls.lock().unwrap().push(Call {
            model_id: model_id.to_string(),
            payload: payload.clone(),
        });
        let mut script = self.inner.script.lock().unwrap();
        match script.len() {
            0 => panic!("unexpected call to {model_id}"),
            1 => script.front().cloned().unwrap(),
            _ => script.pop_front().unwrap(),
        }
    }

    fn extract_text(&self, stage: StageKind, body: &Value) -> Option<String> {
        let field = match stage {
            StageKind::TextOnly => "/result/response",
            StageKind::Vision | StageKind::TextWithImage => "/result/description",
        };
        body.pointer(field).and_then(Value::as_str).map(str::to_string)
    }
}

pub fn response(text: &str) -> InferenceOutcome {
    Ok(json!({ "result": { "response": text }, "success": true }))
}

pub fn description(text: &str) -> InferenceOutcome {
    Ok(json!({ "result": { "description": text }, "success": true }))
}

pub fn failure(status: u16, detail: &str) -> InferenceOutcome {
    Err(InferenceFailure::new(
        ProviderKind::Cloudflare,
        "@cf/fake",
        Some(status),
        detail,
    ))
}

/// Cloudflare configuration with fake credentials and a fast retry policy.
pub fn config(mode: OrchestrationMode) -> GatewayConfig {
    GatewayConfig::new(ProviderKind::Cloudflare)
        .with_mode(mode)
        .with_credentials(Credentials::Cloudflare {
            account_id: "acct".into(),
            api_token: "token".into(),
        })
        .with_retry(RetryPolicy::linear(3, Duration::from_millis(10)).unwrap())
}
