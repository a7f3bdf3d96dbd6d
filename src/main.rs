use tracing_subscriber::EnvFilter;

use shopsmarter::api;
use shopsmarter::config::Config;
use shopsmarter::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!(
        "Vision model: {} ({})",
        config.vision.model,
        if config.vision.api_key.is_some() { "enabled" } else { "no API key, disabled" }
    );
    tracing::info!("Refinement: {} / {}", config.refine.provider, config.refine.model);
    tracing::info!("Embedding backend: {}", config.embedding.backend);

    let state = AppState::new(config.clone())?;

    match state.reload_catalog().await {
        Ok(stats) => tracing::info!(
            "Catalog loaded from {}: {} products, {} embedded",
            stats.source,
            stats.products,
            stats.embedded
        ),
        Err(e) => tracing::error!("Failed to load catalog, starting empty: {e:#}"),
    }

    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
