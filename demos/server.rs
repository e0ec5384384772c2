use argh::FromArgs;
use axum::Router;
use muse_relay::{
    CloudflareProvider, GatewayConfig, GeminiProvider, InferenceProvider, OrchestrationMode,
    Orchestrator, ProviderKind, http_client, server,
};

// defaults for the server
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;

#[derive(FromArgs)]
/// Muse relay forwards styling prompts and photos to a hosted model.
struct ServerArgs {
    /// the host to run the server on
    #[argh(option, short = 'h', default = "DEFAULT_HOST.to_string()")]
    host: String,

    /// the port to run the server on
    #[argh(option, short = 'p', default = "DEFAULT_PORT")]
    port: u16,

    /// backend to use, overriding MUSE_PROVIDER: "cloudflare" or "gemini"
    #[argh(option)]
    provider: Option<ProviderKind>,

    /// image handling, overriding ORCHESTRATION_MODE: "single-stage" or "two-stage"
    #[argh(option)]
    mode: Option<OrchestrationMode>,
}

fn app<P: InferenceProvider>(provider: Option<P>, config: &GatewayConfig) -> Router {
    if provider.is_none() {
        log::warn!(
            "{} credentials are missing; requests will fail until they are configured",
            config.provider
        );
    }
    server::router(Orchestrator::new(provider, config), config.max_body_bytes)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: ServerArgs = argh::from_env();

    let mut config = GatewayConfig::from_env()?;
    if let Some(provider) = args.provider {
        if provider != config.provider {
            // re-read so credentials and model defaults match the chosen backend
            config = GatewayConfig::from_lookup(|key| match key {
                "MUSE_PROVIDER" => Some(provider.as_str().to_string()),
                _ => std::env::var(key).ok(),
            })?;
        }
    }
    if let Some(mode) = args.mode {
        config.mode = mode;
    }

    let http = http_client(&config)?;
    let app = match config.provider {
        ProviderKind::Cloudflare => app(CloudflareProvider::from_config(&config, http), &config),
        ProviderKind::Gemini => app(GeminiProvider::from_config(&config, http), &config),
    };

    // format the host and port
    let addr = format!("{}:{}", args.host, args.port);

    log::info!("Starting the server");
    log::info!("Provider: {}, mode: {}", config.provider, config.mode.as_str());
    log::info!("Listening on: {}{}", addr, server::GENERATE_PATH);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
