/// MCP Gateway Entry Point
///
/// Loads an optional `.env`, initializes logging, reads the gateway
/// configuration from the environment and runs the HTTP server.
///
/// Environment Variables:
/// - SERVER_NAME: Name of the server (default: "media-tool-hub")
/// - SERVER_VERSION: Version string (default: crate version)
/// - HOST: Bind address (default: "0.0.0.0")
/// - PORT: Port number (default: 3000)
/// - WORKER_THREADS: Actix worker count (default: CPU count, max 16)
/// - MCP_HUB_SECRET: Shared secret required on every request
/// - TTS_URL, TTS_TOKEN: Text-to-speech endpoint and query token
/// - IMAGE_URL, IMAGE_KEY: Image generation endpoint and bearer key
/// - TRANSLATE_URL: Translation endpoint
/// - RUST_LOG: Log filter (default: "info")
/// - LOG_FORMAT: "json" for JSON log lines

mod core;
mod tools;

use tracing_subscriber::EnvFilter;

use crate::core::config::GatewayConfig;
use crate::core::server;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    // Logs go to stderr; stdout stays free for process supervisors.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = GatewayConfig::from_env();
    server::run_server_http(config).await
}
