pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::library::handlers as library;
use crate::recipes::handlers as recipes;
use crate::state::AppState;

/// Base64 inflates a 5 MB photo to just under 7 MB; leave room for the JSON around it.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Success body shared by every JSON endpoint: `{"success": true, ...payload}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Generation API
        .route(
            "/api/analyze-ingredients",
            post(recipes::handle_analyze_ingredients).fallback(method_not_allowed),
        )
        .route(
            "/api/generate-recipe",
            post(recipes::handle_generate_recipe).fallback(method_not_allowed),
        )
        .route(
            "/api/generate-recipe/variations",
            post(recipes::handle_generate_variations).fallback(method_not_allowed),
        )
        // Saved-recipe library
        .route(
            "/api/v1/recipes",
            get(library::handle_list_recipes)
                .post(library::handle_save_recipe)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/v1/recipes/:id",
            get(library::handle_get_recipe)
                .delete(library::handle_delete_recipe)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/v1/recipes/:id/rating",
            put(library::handle_rate_recipe).fallback(method_not_allowed),
        )
        .route(
            "/api/v1/recipes/:id/reviews",
            post(library::handle_add_review).fallback(method_not_allowed),
        )
        .route(
            "/api/v1/users/:user_id/stats",
            get(library::handle_user_stats).fallback(method_not_allowed),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
