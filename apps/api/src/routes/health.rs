use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns a simple status object with service version and backends.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "recipe-api",
        "model": state.config.gemini_model,
        "model_configured": state.config.gemini_api_key.is_some(),
        "store": state.store.backend()
    }))
}
