//! Prompt building, model calls and extraction for recipe generation.
//!
//! Each operation issues exactly one model call per result. All model access
//! goes through `GenerativeModel`; nothing here talks to Gemini directly.

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::llm_client::{GenerativeModel, ImagePart, ModelRequest};
use crate::models::recipe::{PreferenceSet, RecipeRecord};
use crate::recipes::extractor::{extract_ingredients, extract_recipe};
use crate::recipes::prompts::{ingredient_analysis_prompt, recipe_generation_prompt};

pub const DEFAULT_VARIATION_COUNT: usize = 3;
pub const MAX_VARIATION_COUNT: usize = 5;

/// Identifies the edible ingredients visible in a photo.
pub async fn analyze_ingredients(
    model: &dyn GenerativeModel,
    image: ImagePart,
) -> Result<Vec<String>, AppError> {
    info!(
        "Analyzing image for ingredients ({} bytes, {})",
        image.bytes.len(),
        image.mime_type
    );

    let request = ModelRequest::with_image(ingredient_analysis_prompt(), image);
    let text = model
        .generate(&request)
        .await
        .map_err(|e| AppError::from_gateway(e, "Failed to analyze image. Please try again."))?;

    debug!("Model response received (length: {})", text.len());

    let ingredients = extract_ingredients(&text);
    info!("Extracted {} ingredients", ingredients.len());
    Ok(ingredients)
}

/// Generates one recipe. The result always carries `ingredients` as its
/// `original_ingredients` and a fresh `created_at`.
pub async fn generate_recipe(
    model: &dyn GenerativeModel,
    ingredients: &[String],
    preferences: &PreferenceSet,
) -> Result<RecipeRecord, AppError> {
    validate_ingredients(ingredients)?;

    info!("Generating recipe from {} ingredients", ingredients.len());
    let request = ModelRequest::text(recipe_generation_prompt(ingredients, preferences));
    generate_from_request(model, &request, ingredients).await
}

/// Generates `count` recipes one after another, pausing between calls.
/// The first failure aborts the batch; no partial results are returned.
pub async fn generate_variations(
    model: &dyn GenerativeModel,
    ingredients: &[String],
    preferences: &PreferenceSet,
    count: usize,
    pause: Duration,
) -> Result<Vec<RecipeRecord>, AppError> {
    validate_ingredients(ingredients)?;
    if !(1..=MAX_VARIATION_COUNT).contains(&count) {
        return Err(AppError::Validation(format!(
            "count must be between 1 and {MAX_VARIATION_COUNT}"
        )));
    }

    info!("Generating {count} recipe variations");
    let request = ModelRequest::text(recipe_generation_prompt(ingredients, preferences));

    let mut recipes = Vec::with_capacity(count);
    for i in 0..count {
        recipes.push(generate_from_request(model, &request, ingredients).await?);
        if i + 1 < count {
            tokio::time::sleep(pause).await;
        }
    }

    Ok(recipes)
}

async fn generate_from_request(
    model: &dyn GenerativeModel,
    request: &ModelRequest,
    ingredients: &[String],
) -> Result<RecipeRecord, AppError> {
    let text = model
        .generate(request)
        .await
        .map_err(|e| AppError::from_gateway(e, "Failed to generate recipe. Please try again."))?;

    debug!("Model response received (length: {})", text.len());

    let recipe = extract_recipe(&text, ingredients, Utc::now())?;
    info!("Generated recipe: {recipe}");
    Ok(recipe)
}

fn validate_ingredients(ingredients: &[String]) -> Result<(), AppError> {
    if ingredients.is_empty() {
        return Err(AppError::Validation(
            "Ingredients array is required".to_string(),
        ));
    }
    Ok(())
}
