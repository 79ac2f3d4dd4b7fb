mod config;
mod errors;
mod llm_gateway;
mod routes;
mod search;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_gateway::build_gateway;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::loader::load_store;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("talent_api=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Talent Search API v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    // Load the employee snapshot once; it is immutable for the process lifetime.
    let store = Arc::new(load_store(&config.data_dir)?);

    let llm = build_gateway(&config);
    info!(
        "LLM gateway initialized (provider: {})",
        config.provider.as_str()
    );

    let state = AppState { store, llm };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
