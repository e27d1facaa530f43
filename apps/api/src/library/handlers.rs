//! Axum route handlers for the saved-recipe library.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::library::{sort_by_recency, Review, SavedRecipe, UserStats, MAX_RATING};
use crate::models::recipe::RecipeRecord;
use crate::routes::Envelope;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRecipeRequest {
    pub user_id: String,
    pub recipe: RecipeRecord,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingRequest {
    pub user_id: String,
    pub rating: u8,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub user_id: String,
    pub comment: String,
    pub rating: Option<u8>,
}

#[derive(Debug, Serialize)]
pub struct SavedRecipePayload {
    pub recipe: SavedRecipe,
}

#[derive(Debug, Serialize)]
pub struct SavedRecipesPayload {
    pub recipes: Vec<SavedRecipe>,
}

#[derive(Debug, Serialize)]
pub struct ReviewPayload {
    pub review: Review,
}

#[derive(Debug, Serialize)]
pub struct StatsPayload {
    pub stats: UserStats,
}

#[derive(Debug, Serialize)]
pub struct Empty {}

fn require_user(user_id: &str) -> Result<&str, AppError> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(AppError::Validation("userId is required".to_string()));
    }
    Ok(user_id)
}

fn validate_rating(rating: u8) -> Result<u8, AppError> {
    if rating > MAX_RATING {
        return Err(AppError::Validation(format!(
            "rating must be between 0 and {MAX_RATING}"
        )));
    }
    Ok(rating)
}

/// GET /api/v1/recipes?user_id=
///
/// Newest first, by save time falling back to creation time.
pub async fn handle_list_recipes(
    State(state): State<AppState>,
    query: Result<Query<UserIdQuery>, QueryRejection>,
) -> Result<Json<Envelope<SavedRecipesPayload>>, AppError> {
    let Query(params) = query?;
    let user_id = require_user(&params.user_id)?;

    let mut recipes = state
        .store
        .list(user_id)
        .await
        .map_err(|e| AppError::from_store(e, "Failed to fetch saved recipes."))?;
    sort_by_recency(&mut recipes);

    Ok(Envelope::ok(SavedRecipesPayload { recipes }))
}

/// POST /api/v1/recipes
pub async fn handle_save_recipe(
    State(state): State<AppState>,
    payload: Result<Json<SaveRecipeRequest>, JsonRejection>,
) -> Result<Json<Envelope<SavedRecipePayload>>, AppError> {
    let Json(request) = payload?;
    let user_id = require_user(&request.user_id)?;

    let recipe = state
        .store
        .save(user_id, &request.recipe)
        .await
        .map_err(|e| AppError::from_store(e, "Failed to save recipe. Please try again."))?;

    Ok(Envelope::ok(SavedRecipePayload { recipe }))
}

/// GET /api/v1/recipes/:id?user_id=
pub async fn handle_get_recipe(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<UserIdQuery>, QueryRejection>,
) -> Result<Json<Envelope<SavedRecipePayload>>, AppError> {
    let Path(id) = path?;
    let Query(params) = query?;
    let user_id = require_user(&params.user_id)?;

    let recipe = state
        .store
        .get(user_id, id)
        .await
        .map_err(|e| AppError::from_store(e, "Failed to fetch recipe."))?;

    Ok(Envelope::ok(SavedRecipePayload { recipe }))
}

/// DELETE /api/v1/recipes/:id?user_id=
pub async fn handle_delete_recipe(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<UserIdQuery>, QueryRejection>,
) -> Result<Json<Envelope<Empty>>, AppError> {
    let Path(id) = path?;
    let Query(params) = query?;
    let user_id = require_user(&params.user_id)?;

    state
        .store
        .delete(user_id, id)
        .await
        .map_err(|e| AppError::from_store(e, "Failed to delete recipe."))?;

    Ok(Envelope::ok(Empty {}))
}

/// PUT /api/v1/recipes/:id/rating
pub async fn handle_rate_recipe(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<RatingRequest>, JsonRejection>,
) -> Result<Json<Envelope<Empty>>, AppError> {
    let Path(id) = path?;
    let Json(request) = payload?;
    let user_id = require_user(&request.user_id)?;
    let rating = validate_rating(request.rating)?;

    state
        .store
        .update_rating(user_id, id, rating)
        .await
        .map_err(|e| AppError::from_store(e, "Failed to update rating."))?;

    Ok(Envelope::ok(Empty {}))
}

/// POST /api/v1/recipes/:id/reviews
pub async fn handle_add_review(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<Json<Envelope<ReviewPayload>>, AppError> {
    let Path(id) = path?;
    let Json(request) = payload?;
    let user_id = require_user(&request.user_id)?;

    let comment = request.comment.trim();
    if comment.is_empty() {
        return Err(AppError::Validation("comment cannot be empty".to_string()));
    }
    let rating = request.rating.map(validate_rating).transpose()?;

    let review = Review {
        id: Uuid::new_v4(),
        comment: comment.to_string(),
        rating,
        created_at: Utc::now(),
    };

    state
        .store
        .add_review(user_id, id, review.clone())
        .await
        .map_err(|e| AppError::from_store(e, "Failed to add review."))?;

    Ok(Envelope::ok(ReviewPayload { review }))
}

/// GET /api/v1/users/:user_id/stats
pub async fn handle_user_stats(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Envelope<StatsPayload>>, AppError> {
    let Path(user_id) = path?;
    let user_id = require_user(&user_id)?;

    let stats = state
        .store
        .stats(user_id)
        .await
        .map_err(|e| AppError::from_store(e, "Failed to fetch user stats."))?;

    Ok(Envelope::ok(StatsPayload { stats }))
}
