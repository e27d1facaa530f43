//! Axum route handlers for ingredient analysis and recipe generation.

use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::recipe::{PreferenceSet, RecipeRecord};
use crate::recipes::image::decode_image;
use crate::recipes::service::{
    analyze_ingredients, generate_recipe, generate_variations, DEFAULT_VARIATION_COUNT,
};
use crate::routes::Envelope;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeIngredientsRequest {
    pub image_data: Option<String>,
    pub mime_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IngredientsPayload {
    pub ingredients: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRecipeRequest {
    pub ingredients: Option<Vec<String>>,
    #[serde(default)]
    pub preferences: Option<PreferenceSet>,
    /// Only read by the variations endpoint.
    pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecipePayload {
    pub recipe: RecipeRecord,
}

#[derive(Debug, Serialize)]
pub struct RecipesPayload {
    pub recipes: Vec<RecipeRecord>,
}

impl GenerateRecipeRequest {
    fn into_parts(self) -> Result<(Vec<String>, PreferenceSet), AppError> {
        let ingredients = self
            .ingredients
            .filter(|i| !i.is_empty())
            .ok_or_else(|| AppError::Validation("Ingredients array is required".to_string()))?;
        Ok((ingredients, self.preferences.unwrap_or_default()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/analyze-ingredients
///
/// Body: `{"imageData": "<base64>", "mimeType": "image/jpeg"}`.
pub async fn handle_analyze_ingredients(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeIngredientsRequest>, JsonRejection>,
) -> Result<Json<Envelope<IngredientsPayload>>, AppError> {
    let Json(request) = payload?;

    let image_data = request
        .image_data
        .ok_or_else(|| AppError::Validation("Image data is required".to_string()))?;
    let image = decode_image(&image_data, request.mime_type.as_deref())?;

    let ingredients = analyze_ingredients(state.model.as_ref(), image).await?;
    Ok(Envelope::ok(IngredientsPayload { ingredients }))
}

/// POST /api/generate-recipe
///
/// Body: `{"ingredients": [...], "preferences": {...}}`.
pub async fn handle_generate_recipe(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRecipeRequest>, JsonRejection>,
) -> Result<Json<Envelope<RecipePayload>>, AppError> {
    let Json(request) = payload?;
    let (ingredients, preferences) = request.into_parts()?;

    let recipe = generate_recipe(state.model.as_ref(), &ingredients, &preferences).await?;
    Ok(Envelope::ok(RecipePayload { recipe }))
}

/// POST /api/generate-recipe/variations
///
/// Same body as generation plus an optional `count` (default 3).
pub async fn handle_generate_variations(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRecipeRequest>, JsonRejection>,
) -> Result<Json<Envelope<RecipesPayload>>, AppError> {
    let Json(request) = payload?;
    let count = request.count.unwrap_or(DEFAULT_VARIATION_COUNT);
    let (ingredients, preferences) = request.into_parts()?;

    let recipes = generate_variations(
        state.model.as_ref(),
        &ingredients,
        &preferences,
        count,
        Duration::from_millis(state.config.variation_pause_ms),
    )
    .await?;
    Ok(Envelope::ok(RecipesPayload { recipes }))
}
