use axum::http::StatusCode;

use crate::config::ProviderKind;

/// Error returned by a single call to a remote inference service.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{provider} error from {model}{}: {detail}", status_suffix(.status))]
pub struct InferenceFailure {
    /// The backend that produced the failure.
    pub provider: ProviderKind,
    /// The model identifier the call was addressed to.
    pub model: String,
    /// HTTP status of the remote response, if one was received.
    pub status: Option<u16>,
    /// Provider message, or a description of the transport/parse failure.
    pub detail: String,
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}

const OVERLOAD_MARKERS: &[&str] = &["overloaded", "busy"];

impl InferenceFailure {
    pub fn new(
        provider: ProviderKind,
        model: impl Into<String>,
        status: Option<u16>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            status,
            detail: detail.into(),
        }
    }

    /// Whether the failure carries a transient overload signature and may be retried.
    pub fn is_transient(&self) -> bool {
        if self.status == Some(503) {
            return true;
        }
        let detail = self.detail.to_ascii_lowercase();
        OVERLOAD_MARKERS.iter().any(|marker| detail.contains(marker))
    }
}

/// Errors that terminate a generation request. Every variant maps onto a
/// client-facing HTTP status and a JSON `{ "error": ... }` body.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0} credentials are not configured on the server.")]
    MissingCredentials(ProviderKind),

    #[error("Image data is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error(transparent)]
    Provider(#[from] InferenceFailure),
}

impl GenerateError {
    pub fn status(&self) -> StatusCode {
        match self {
            GenerateError::InvalidRequest(_) | GenerateError::Decode(_) => StatusCode::BAD_REQUEST,
            GenerateError::MissingCredentials(_) | GenerateError::Provider(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Startup configuration problems.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid retry policy: {0}")]
    RetryPolicy(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(status: Option<u16>, detail: &str) -> InferenceFailure {
        InferenceFailure::new(ProviderKind::Cloudflare, "@cf/test", status, detail)
    }

    #[test]
    fn service_unavailable_is_transient() {
        assert!(failure(Some(503), "Service Unavailable").is_transient());
    }

    #[test]
    fn overload_markers_are_transient_regardless_of_status() {
        let overloaded = failure(Some(500), "The model is overloaded. Please try again later.");
        assert!(overloaded.is_transient());
        assert!(failure(None, "Server BUSY").is_transient());
    }

    #[test]
    fn client_errors_are_not_transient() {
        assert!(!failure(Some(400), "Bad Request").is_transient());
        assert!(!failure(Some(401), "Authentication error").is_transient());
        assert!(!failure(None, "error decoding response body").is_transient());
    }

    #[test]
    fn display_embeds_status_and_detail() {
        let err = failure(Some(400), "Bad input");
        assert_eq!(
            err.to_string(),
            "Cloudflare error from @cf/test (status 400): Bad input"
        );
        assert_eq!(
            failure(None, "timed out").to_string(),
            "Cloudflare error from @cf/test: timed out"
        );
    }

    #[test]
    fn statuses_follow_error_class() {
        assert_eq!(
            GenerateError::InvalidRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GenerateError::MissingCredentials(ProviderKind::Gemini).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            GenerateError::Provider(failure(Some(400), "nope")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
