use anyhow::Result;
use dotenvy::dotenv;
use omdb_proxy::config::Config;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv_result = dotenv();
    init_tracing();
    match dotenv_result {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) => warn!("No .env file loaded ({}) - relying on environment", e),
    }

    let config = Config::from_env()?;
    if config.has_api_key() {
        info!("OMDB_API_KEY is set, upstream: {}", config.api_url);
    } else {
        warn!("OMDB_API_KEY is not set; movie endpoints will answer 500 until it is configured");
    }
    omdb_proxy::app::run_server(config).await
}
