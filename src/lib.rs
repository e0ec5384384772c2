//! Generation request orchestration for hosted multimodal inference.
//!
//! A request carries a text prompt and, optionally, a base64 image. The
//! [`Orchestrator`] validates it, picks the remote calls to make with
//! [`select_plan`], encodes each call for the configured [`InferenceProvider`],
//! retries transient overloads according to a [`RetryPolicy`] and returns the
//! generated text as a uniform JSON reply.
//!
//! [`server::router`] exposes the orchestrator over HTTP.

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod normalize;
pub mod orchestrator;
pub mod plan;
pub mod provider;
pub mod request;
pub mod retry;
pub mod server;

pub use client::invoke_with_retry;
pub use config::{Credentials, GatewayConfig, OrchestrationMode, ProviderKind};
pub use error::{ConfigError, GenerateError, InferenceFailure};
pub use orchestrator::{GenerateReply, Orchestrator};
pub use plan::{ModelCatalog, ModelPlan, PlannedStage, StageKind, select_plan};
pub use provider::{
    CloudflareProvider, GeminiProvider, InferenceOutcome, InferenceProvider, http_client,
};
pub use request::{GenerationRequest, GenerationResponse};
pub use retry::RetryPolicy;
