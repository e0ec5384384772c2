use std::{fmt, str::FromStr, time::Duration};

use crate::{
    error::ConfigError,
    plan::{ModelCatalog, STYLING_FALLBACK},
    retry::{DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, RetryPolicy},
};

pub const DEFAULT_FALLBACK_TEXT: &str = "No content generated.";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// The hosted inference service requests are forwarded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Cloudflare,
    Gemini,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Cloudflare => "cloudflare",
            ProviderKind::Gemini => "gemini",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Cloudflare => f.write_str("Cloudflare"),
            ProviderKind::Gemini => f.write_str("Gemini"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cloudflare" => Ok(ProviderKind::Cloudflare),
            "gemini" => Ok(ProviderKind::Gemini),
            other => Err(format!("unknown provider {other:?}, expected cloudflare or gemini")),
        }
    }
}

/// How requests that carry an image are served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrchestrationMode {
    /// One call to a multimodal model with both the image and the prompt.
    SingleStage,
    /// Caption the image with a vision model, then feed the caption to the text model.
    #[default]
    TwoStage,
}

impl OrchestrationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrchestrationMode::SingleStage => "single-stage",
            OrchestrationMode::TwoStage => "two-stage",
        }
    }
}

impl FromStr for OrchestrationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single-stage" | "single" => Ok(OrchestrationMode::SingleStage),
            "two-stage" | "two" => Ok(OrchestrationMode::TwoStage),
            other => Err(format!(
                "unknown orchestration mode {other:?}, expected single-stage or two-stage"
            )),
        }
    }
}

/// Secrets needed to call a provider.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Cloudflare { account_id: String, api_token: String },
    Gemini { api_key: String },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Cloudflare { account_id, .. } => f
                .debug_struct("Cloudflare")
                .field("account_id", account_id)
                .field("api_token", &"<redacted>")
                .finish(),
            Credentials::Gemini { .. } => f
                .debug_struct("Gemini")
                .field("api_key", &"<redacted>")
                .finish(),
        }
    }
}

/// Process-wide configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub provider: ProviderKind,
    pub mode: OrchestrationMode,
    /// `None` when the environment lacks the provider's secrets; requests
    /// then fail with a configuration error instead of the process exiting.
    pub credentials: Option<Credentials>,
    pub api_base: Option<String>,
    pub models: ModelCatalog,
    pub retry: RetryPolicy,
    pub timeout: Duration,
    pub max_body_bytes: usize,
    /// Answer for a text-only or single-stage request that produced no text.
    pub fallback_text: String,
    /// Answer for a two-stage request whose styling stage produced no text.
    pub styling_fallback_text: String,
}

impl GatewayConfig {
    /// Defaults for `provider` without credentials.
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            mode: OrchestrationMode::default(),
            credentials: None,
            api_base: None,
            models: ModelCatalog::for_provider(provider),
            retry: RetryPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            fallback_text: DEFAULT_FALLBACK_TEXT.to_string(),
            styling_fallback_text: STYLING_FALLBACK.to_string(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = match get("MUSE_PROVIDER") {
            Some(v) => parse_with("MUSE_PROVIDER", &v, ProviderKind::from_str)?,
            None => ProviderKind::Cloudflare,
        };
        let mut config = Self::new(provider);

        if let Some(v) = get("ORCHESTRATION_MODE") {
            config.mode = parse_with("ORCHESTRATION_MODE", &v, OrchestrationMode::from_str)?;
        }

        config.credentials = match provider {
            ProviderKind::Cloudflare => {
                match (get("CLOUDFLARE_ACCOUNT_ID"), get("CLOUDFLARE_API_TOKEN")) {
                    (Some(account_id), Some(api_token)) => Some(Credentials::Cloudflare {
                        account_id,
                        api_token,
                    }),
                    _ => None,
                }
            }
            ProviderKind::Gemini => {
                get("GEMINI_API_KEY").map(|api_key| Credentials::Gemini { api_key })
            }
        };

        config.api_base = get("MUSE_API_BASE").map(|v| v.trim_end_matches('/').to_string());

        if let Some(model) = get("MUSE_TEXT_MODEL") {
            config.models.text = model;
        }
        if let Some(model) = get("MUSE_VISION_MODEL") {
            config.models.vision = model;
        }
        if let Some(model) = get("MUSE_MULTIMODAL_MODEL") {
            config.models.multimodal = model;
        }

        let max_attempts = match get("MUSE_MAX_ATTEMPTS") {
            Some(v) => parse_number("MUSE_MAX_ATTEMPTS", &v)?,
            None => DEFAULT_MAX_ATTEMPTS,
        };
        let base_delay = match get("MUSE_BACKOFF_MS") {
            Some(v) => Duration::from_millis(parse_number("MUSE_BACKOFF_MS", &v)?),
            None => DEFAULT_BASE_DELAY,
        };
        config.retry = RetryPolicy::linear(max_attempts, base_delay)?;

        if let Some(v) = get("MUSE_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(parse_number("MUSE_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = get("MUSE_MAX_BODY_BYTES") {
            config.max_body_bytes = parse_number("MUSE_MAX_BODY_BYTES", &v)?;
        }
        if let Some(v) = get("MUSE_FALLBACK_TEXT") {
            config.fallback_text = v;
        }
        if let Some(v) = get("MUSE_STYLING_FALLBACK_TEXT") {
            config.styling_fallback_text = v;
        }

        Ok(config)
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_mode(mut self, mode: OrchestrationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

fn parse_with<T>(
    key: &'static str,
    value: &str,
    parse: impl FnOnce(&str) -> Result<T, String>,
) -> Result<T, ConfigError> {
    parse(value).map_err(|reason| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason,
    })
}

fn parse_number<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    parse_with(key, value, |v| v.trim().parse::<T>().map_err(|e| e.to_string()))
}
