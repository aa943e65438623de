mod api;
mod middleware;

use std::sync::Arc;

use hotelcheck_analysis::{
    Analyzer, AnalyzerConfig, EmbeddingCache, EmbeddingClientConfig, OpenAiEmbeddingClient,
};
use hotelcheck_core::Catalog;
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = hotelcheck_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let catalog = match &config.catalog_path {
        Some(path) => hotelcheck_core::load_catalog(path)?,
        None => Catalog::sample(),
    };
    if config.embedding_api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY not set; analysis endpoints will answer 503");
    }

    let client = OpenAiEmbeddingClient::new(EmbeddingClientConfig::from_app_config(&config))?;
    let cache = match config.embedding_dimensions {
        Some(dimensions) => EmbeddingCache::with_expected_dimensions(dimensions),
        None => EmbeddingCache::new(),
    };
    let analyzer = Analyzer::new(
        client,
        Arc::new(cache),
        AnalyzerConfig::from_app_config(&config),
    );

    tracing::info!(
        env = %config.env,
        hotels = catalog.hotels().len(),
        model = analyzer.provider().model(),
        threshold = analyzer.threshold(),
        "starting hotelcheck server"
    );

    let app = build_app(AppState {
        analyzer: Arc::new(analyzer),
        catalog: Arc::new(catalog),
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
