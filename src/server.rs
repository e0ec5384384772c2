use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State, rejection::BytesRejection},
    http::{HeaderValue, StatusCode, header},
    routing::post,
};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::{
    orchestrator::{GenerateReply, Orchestrator},
    provider::InferenceProvider,
};

pub const GENERATE_PATH: &str = "/api/generate";

/// Builds the HTTP surface: `POST` and `OPTIONS` on [`GENERATE_PATH`], any
/// other method answered with 405. CORS headers are set on every response.
pub fn router<P: InferenceProvider>(
    orchestrator: Orchestrator<P>,
    max_body_bytes: usize,
) -> Router {
    Router::new()
        .route(
            GENERATE_PATH,
            post(post_generate::<P>)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
        .with_state(Arc::new(orchestrator))
}

async fn post_generate<P: InferenceProvider>(
    State(orchestrator): State<Arc<Orchestrator<P>>>,
    body: Result<Bytes, BytesRejection>,
) -> GenerateReply {
    match body {
        Ok(body) => orchestrator.handle(&body).await,
        Err(rejection) => {
            log::debug!("Failed to read request body: {rejection}");
            GenerateReply::error(rejection.status(), rejection.body_text())
        }
    }
}

async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn method_not_allowed() -> GenerateReply {
    GenerateReply::error(
        StatusCode::METHOD_NOT_ALLOWED,
        "Method Not Allowed. Please use POST.",
    )
}
