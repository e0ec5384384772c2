use argh::FromArgs;
use base64::{Engine, engine::general_purpose::STANDARD};
use muse_relay::{GenerationRequest, server::GENERATE_PATH};
use std::path::PathBuf;

// defaults for the client
const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 3000;

#[derive(FromArgs)]
/// Muse client for asking the relay for styling ideas
struct ClientArgs {
    /// the host to connect to
    #[argh(option, short = 'h', default = "DEFAULT_HOST.to_string()")]
    host: String,

    /// the port to connect to
    #[argh(option, short = 'p', default = "DEFAULT_PORT")]
    port: u16,

    /// the prompt to send
    #[argh(option, short = 't')]
    text: String,

    /// optional path to a photo of the outfit
    #[argh(option, short = 'i')]
    image_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: ClientArgs = argh::from_env();

    let mut request = GenerationRequest::new(args.text);
    if let Some(path) = &args.image_path {
        let bytes = std::fs::read(path)?;
        request = request.with_image(STANDARD.encode(bytes));
    }

    // format the host and port
    let addr = format!("{}:{}", args.host, args.port);

    let response = reqwest::Client::new()
        .post(format!("http://{}{}", addr, GENERATE_PATH))
        .json(&request)
        .send()
        .await?;

    let status = response.status();
    let result = response.json::<serde_json::Value>().await?;
    println!("Status: {status}");
    println!("Result: {}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
