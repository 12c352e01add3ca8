use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use image_gen_studio::{
    config::ServerConfig,
    media::{LocalFileStorage, PlaceholderRenderer},
    server::{self, AppState},
    validation::RequestValidator,
    MockApiClient,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "image_gen_studio=info,tower_http=info".into()),
        )
        .with(fmt::layer())
        .init();

    let config = ServerConfig::from_env().context("invalid server configuration")?;
    tokio::fs::create_dir_all(&config.media_dir)
        .await
        .with_context(|| format!("failed to create {}", config.media_dir.display()))?;

    let storage = Arc::new(LocalFileStorage::new(
        config.media_dir.clone(),
        config.media_base_url.clone(),
    ));
    let renderer = Arc::new(PlaceholderRenderer::new(storage));
    let api = Arc::new(MockApiClient::with_renderer(config.simulation.clone(), renderer));
    let router = server::router(AppState::new(api, RequestValidator::default()), &config.media_dir);

    let bind_address = config.bind_address();
    let tcp_listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!(
        "image generation backend listening on http://{bind_address}, media at {}",
        config.media_base_url
    );

    axum::serve(tcp_listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    info!("server stopped");
    Ok(())
}
