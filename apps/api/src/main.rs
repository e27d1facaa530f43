mod config;
mod db;
mod errors;
mod library;
mod llm_client;
mod models;
mod recipes;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::library::{MemoryRecipeStore, PgRecipeStore, RecipeStore};
use crate::llm_client::GeminiClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Recipe API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize model gateway
    let gemini = GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        config.gemini_base_url.clone(),
    )?;
    if gemini.is_configured() {
        info!("Gemini client initialized (model: {})", gemini.model());
    } else {
        warn!("GEMINI_API_KEY is not set; generation endpoints will return NOT_CONFIGURED");
    }

    // Initialize recipe store
    let store: Arc<dyn RecipeStore> = match &config.database_url {
        Some(url) => Arc::new(PgRecipeStore::new(create_pool(url).await?)),
        None => {
            warn!("DATABASE_URL is not set; saved recipes are kept in memory only");
            Arc::new(MemoryRecipeStore::new())
        }
    };
    info!("Recipe store initialized ({})", store.backend());

    let state = AppState {
        model: Arc::new(gemini),
        store,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
