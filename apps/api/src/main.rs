mod chat;
mod config;
mod documents;
mod errors;
mod layout;
mod llm_client;
mod pagination;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::documents::DocumentRegistry;
use crate::llm_client::LlmClient;
use crate::pagination::MetricOracle;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Folio API v{}", env!("CARGO_PKG_VERSION"));

    let oracle = Arc::new(MetricOracle::new(config.page.clone()));
    let page = oracle.config();
    info!(
        "Page config: {:?} {}pt, {} lines per page",
        page.font, page.font_size_pt, page.lines_per_page
    );
    let documents = DocumentRegistry::new(oracle, config.mount_timeout);

    let llm = LlmClient::new(config.provider_keys.clone());
    info!(
        "LLM client initialized (default models: {:?})",
        config.default_chat_models
    );

    let state = AppState {
        config: config.clone(),
        documents,
        chat: Arc::new(llm),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the editor host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
