//! RagSearch-RS server entry point

use anyhow::{Context, Result};
use ragsearch_rs::{
    config,
    network::HttpClient,
    web::{create_router, AppState},
    Pipeline,
};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::args().skip(1).any(|a| a == "-h" || a == "--help") {
        print_usage();
        return Ok(());
    }

    // Load configuration before logging so `general.debug` can pick the level
    let settings_path = config::locate();
    let settings = config::load_from(settings_path.as_deref())?;

    let default_level = if settings.general.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Starting RagSearch-RS v{}", ragsearch_rs::VERSION);
    match &settings_path {
        Some(path) => info!("Loaded settings from: {}", path.display()),
        None => info!("No settings file found, using defaults"),
    }
    info!("Loaded configuration for instance: {}", settings.general.instance_name);

    // Initialize HTTP client
    let client = HttpClient::with_settings(&settings.outgoing)?;

    let pipeline = Pipeline::from_settings(&settings, client)?;
    let state = AppState::new(settings.clone(), pipeline)?;
    let app = create_router(state);

    let addr = SocketAddr::new(
        settings
            .server
            .bind_address
            .parse()
            .with_context(|| format!("invalid bind address {}", settings.server.bind_address))?,
        settings.server.port,
    );

    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Print usage information
fn print_usage() {
    println!(
        r#"
RagSearch-RS v{}
Web search with retrieval-augmented results

USAGE:
    ragsearch-rs

ENVIRONMENT VARIABLES:
    RAGSEARCH_SETTINGS_PATH   Path to settings.yml
    RAGSEARCH_DEBUG           Enable debug logging (true/false)
    RAGSEARCH_PORT            Server port
    RAGSEARCH_BIND_ADDRESS    Bind address
    RAGSEARCH_ENGINE          Search engine (duckduckgo, brave)
    RAGSEARCH_SEARCH_API_KEY  Search engine API key (falls back to BRAVE_API_KEY)
    RAGSEARCH_EMBEDDING_API_KEY
                              Embedding service API key (falls back to OPENAI_API_KEY)
    RAGSEARCH_EMBEDDING_MODEL Embedding model name
    RUST_LOG                  Log filter, overrides the debug setting
"#,
        ragsearch_rs::VERSION
    );
}
