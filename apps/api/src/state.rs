use std::sync::Arc;

use crate::config::Config;
use crate::library::RecipeStore;
use crate::llm_client::GenerativeModel;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Model gateway. Default: `GeminiClient`.
    pub model: Arc<dyn GenerativeModel>,
    /// Saved-recipe store. Postgres when `DATABASE_URL` is set, in-memory otherwise.
    pub store: Arc<dyn RecipeStore>,
    pub config: Config,
}
