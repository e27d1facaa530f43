//! Turns free-text model output into typed data.
//!
//! The model is told to answer with raw JSON but is not guaranteed to comply,
//! so both modes locate the payload with a widest-span match: first opening
//! delimiter to last closing delimiter. A second, unrelated bracketed or
//! braced structure in surrounding commentary widens the span and breaks the
//! parse. That is a known limitation and is kept as-is so accepted responses
//! stay accepted.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::models::recipe::RecipeRecord;

static BRACKET_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("bracket span pattern is valid"));
static BRACE_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("brace span pattern is valid"));
static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json)?\n?").expect("code fence pattern is valid"));
static BULLET_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-*•]\s*").expect("bullet pattern is valid"));
static NUMBER_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s*").expect("number pattern is valid"));
static INGREDIENT_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^ingredient:\s*").expect("label pattern is valid"));

/// Lines this short after cleanup are noise, not ingredients.
const MIN_LINE_CHARS: usize = 3;

/// Set by the extractor itself, whatever the model sent.
const STAMPED_KEYS: &[&str] = &["createdAt", "originalIngredients"];

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no JSON object found in model output")]
    MissingObject,

    #[error("model output is not a valid JSON object: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

// ────────────────────────────────────────────────────────────────────────────
// Mode A: ingredient list
// ────────────────────────────────────────────────────────────────────────────

/// Extracts an ingredient list. Never fails: worst case the result is empty
/// or contains some noise lines.
pub fn extract_ingredients(raw: &str) -> Vec<String> {
    if let Some(span) = BRACKET_SPAN.find(raw) {
        match serde_json::from_str::<Vec<String>>(span.as_str()) {
            Ok(ingredients) => return ingredients,
            Err(e) => debug!("Bracket span is not a string array ({e}); using line fallback"),
        }
    }

    extract_ingredient_lines(raw)
}

fn extract_ingredient_lines(raw: &str) -> Vec<String> {
    raw.split('\n')
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let line = BULLET_MARKER.replace(line, "");
            let line = NUMBER_MARKER.replace(&line, "");
            let line = INGREDIENT_LABEL.replace(&line, "");
            let cleaned = line.trim();
            (cleaned.chars().count() >= MIN_LINE_CHARS).then(|| cleaned.to_string())
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Mode B: recipe
// ────────────────────────────────────────────────────────────────────────────

/// Extracts a recipe object and stamps it with `created_at` and the caller's
/// ingredient list, overriding anything the model put under those keys.
pub fn extract_recipe(
    raw: &str,
    original_ingredients: &[String],
    created_at: DateTime<Utc>,
) -> Result<RecipeRecord, ExtractError> {
    let cleaned = CODE_FENCE.replace_all(raw, "");
    let cleaned = cleaned.trim();

    let span = BRACE_SPAN
        .find(cleaned)
        .ok_or(ExtractError::MissingObject)?;
    let object: Map<String, Value> = serde_json::from_str(span.as_str())?;

    Ok(recipe_from_object(object, original_ingredients, created_at))
}

/// The model cannot set the creation stamp, the source ingredients or any
/// saved-recipe metadata.
fn recipe_from_object(
    mut object: Map<String, Value>,
    original_ingredients: &[String],
    created_at: DateTime<Utc>,
) -> RecipeRecord {
    for key in STAMPED_KEYS {
        object.remove(*key);
    }
    RecipeRecord::from_fields(object, created_at, original_ingredients.to_vec())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::errors::AppError;

    const RECIPE_JSON: &str = r#"{
  "recipeName": "Garlic Chicken Stir-Fry",
  "description": "A quick weeknight stir-fry.",
  "prepTime": "15 minutes",
  "cookTime": "20 minutes",
  "servings": 4,
  "difficulty": "Easy",
  "ingredients": [
    {"item": "chicken breast", "amount": "500g", "notes": "diced"},
    {"item": "garlic", "amount": "3 cloves", "notes": "minced"}
  ],
  "instructions": ["Heat the oil.", "Cook the chicken.", "Add the garlic."],
  "nutritionalInfo": {"calories": "350 kcal", "protein": "25g", "carbs": "30g", "fat": "12g"},
  "tips": ["Slice the chicken thinly."],
  "tags": ["quick", "dinner"]
}"#;

    fn ingredients() -> Vec<String> {
        vec!["chicken breast".to_string(), "garlic".to_string()]
    }

    fn created_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    // ── Mode A ────────────────────────────────────────────────────────────

    #[test]
    fn test_serialized_arrays_come_back_unchanged() {
        let cases: Vec<Vec<String>> = vec![
            vec![],
            vec!["egg".to_string()],
            vec![
                "red bell pepper".to_string(),
                "chicken breast".to_string(),
                "chicken breast".to_string(),
            ],
        ];
        for case in cases {
            let raw = serde_json::to_string(&case).unwrap();
            assert_eq!(extract_ingredients(&raw), case);
        }
    }

    #[test]
    fn test_array_wrapped_in_prose_and_fences() {
        let raw = "Here is what I found:\n```json\n[\n  \"onion\",\n  \"garlic\"\n]\n```\nEnjoy!";
        assert_eq!(extract_ingredients(raw), vec!["onion", "garlic"]);
    }

    #[test]
    fn test_line_fallback_strips_list_markers() {
        let raw = "- chicken\n- 2. rice\n* soy sauce\nx";
        assert_eq!(
            extract_ingredients(raw),
            vec!["chicken", "rice", "soy sauce"]
        );
    }

    #[test]
    fn test_line_fallback_handles_bullets_numbers_and_labels() {
        let raw = "\n• tomato\n\n1. basil leaves\n12.mozzarella\nIngredient: olive oil\n   \nok";
        assert_eq!(
            extract_ingredients(raw),
            vec!["tomato", "basil leaves", "mozzarella", "olive oil"]
        );
    }

    #[test]
    fn test_unparseable_bracket_span_falls_back_to_lines() {
        let raw = "I see [some things] here\n- carrots\n- celery";
        assert_eq!(
            extract_ingredients(raw),
            vec!["I see [some things] here", "carrots", "celery"]
        );
    }

    #[test]
    fn test_non_string_array_falls_back_to_lines() {
        let raw = "[1, 2, 3]";
        assert_eq!(extract_ingredients(raw), vec!["[1, 2, 3]"]);
    }

    #[test]
    fn test_empty_output_yields_empty_list() {
        assert!(extract_ingredients("").is_empty());
        assert!(extract_ingredients("\n \n").is_empty());
    }

    #[test]
    fn test_widest_bracket_span_misfires_on_second_structure() {
        // Known limitation: the span runs from the first '[' to the last ']'.
        let raw = r#"["egg", "milk"] and also [note]"#;
        assert_eq!(extract_ingredients(raw), vec![raw.to_string()]);
    }

    // ── Mode B ────────────────────────────────────────────────────────────

    #[test]
    fn test_plain_recipe_object() {
        let recipe = extract_recipe(RECIPE_JSON, &ingredients(), created_at()).unwrap();
        assert_eq!(recipe.recipe_name.as_deref(), Some("Garlic Chicken Stir-Fry"));
        assert_eq!(recipe.servings, Some(4));
        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.ingredients[0].amount, "500g");
        assert_eq!(recipe.instructions[1], "Cook the chicken.");
        assert_eq!(
            recipe.nutritional_info.as_ref().map(|n| n.calories.as_str()),
            Some("350 kcal")
        );
        assert_eq!(recipe.tags, vec!["quick", "dinner"]);
        assert!(recipe.extra.is_empty());
    }

    #[test]
    fn test_fenced_recipe_matches_unfenced() {
        let plain = extract_recipe(RECIPE_JSON, &ingredients(), created_at()).unwrap();
        for fenced in [
            format!("```json\n{RECIPE_JSON}\n```"),
            format!("```\n{RECIPE_JSON}\n```"),
            format!("```json\n```json\n{RECIPE_JSON}\n```\n```"),
        ] {
            let parsed = extract_recipe(&fenced, &ingredients(), created_at()).unwrap();
            assert_eq!(parsed, plain);
        }
    }

    #[test]
    fn test_prose_around_object_is_ignored() {
        let raw = format!("Sure! Here's your recipe:\n\n{RECIPE_JSON}\n\nLet me know if you want changes.");
        let recipe = extract_recipe(&raw, &ingredients(), created_at()).unwrap();
        assert_eq!(recipe.difficulty.as_deref(), Some("Easy"));
    }

    #[test]
    fn test_no_braces_is_malformed() {
        let err = extract_recipe("I cannot make a recipe from that.", &ingredients(), created_at())
            .unwrap_err();
        assert!(matches!(err, ExtractError::MissingObject));
    }

    #[test]
    fn test_broken_object_is_malformed() {
        let err = extract_recipe("{\"recipeName\": \"Soup\",", &ingredients(), created_at());
        assert!(matches!(err, Err(ExtractError::MissingObject)));

        let err = extract_recipe("{\"recipeName\": }", &ingredients(), created_at()).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidJson(_)));
    }

    #[test]
    fn test_model_cannot_set_created_at_or_original_ingredients() {
        let raw = r#"{"recipeName": "Soup", "createdAt": "1999-01-01T00:00:00Z", "originalIngredients": ["caviar"], "id": "x"}"#;
        let recipe = extract_recipe(raw, &ingredients(), created_at()).unwrap();
        assert_eq!(recipe.created_at, created_at());
        assert_eq!(recipe.original_ingredients, ingredients());
        assert!(recipe.extra.is_empty());
    }

    #[test]
    fn test_absent_fields_stay_absent_and_sequences_are_empty() {
        let recipe = extract_recipe(r#"{"recipeName": "Soup"}"#, &ingredients(), created_at()).unwrap();
        assert!(recipe.description.is_none());
        assert!(recipe.servings.is_none());
        assert!(recipe.nutritional_info.is_none());
        assert!(recipe.ingredients.is_empty());
        assert!(recipe.instructions.is_empty());
        assert!(recipe.tips.is_empty());
        assert!(recipe.tags.is_empty());
    }

    #[test]
    fn test_unknown_fields_are_retained() {
        let raw = r#"{"recipeName": "Soup", "cuisine": "French", "wine": {"pairing": "Chablis"}}"#;
        let recipe = extract_recipe(raw, &ingredients(), created_at()).unwrap();
        assert_eq!(recipe.extra.get("cuisine"), Some(&json!("French")));
        assert_eq!(recipe.extra.get("wine"), Some(&json!({"pairing": "Chablis"})));
    }

    #[test]
    fn test_second_object_in_prose_widens_the_span() {
        // Known limitation: the span runs from the first '{' to the last '}'.
        for raw in [
            r#"{"recipeName": "A"} note {"x": 1}"#,
            "{\"recipeName\": \"A\"}\nTip: swap the herbs {optional}.",
        ] {
            let err = extract_recipe(raw, &ingredients(), created_at()).unwrap_err();
            assert!(matches!(err, ExtractError::InvalidJson(_)), "{raw}");
            assert!(matches!(AppError::from(err), AppError::MalformedOutput));
        }
    }

    #[test]
    fn test_fields_with_unexpected_shapes_are_kept() {
        let raw = r#"{"recipeName": "Soup", "servings": "four", "nutritionalInfo": "n/a",
            "instructions": [{"step": 1, "text": "Boil water"}]}"#;
        let recipe = extract_recipe(raw, &ingredients(), created_at()).unwrap();
        assert_eq!(recipe.instructions, vec!["Boil water"]);
        assert_eq!(recipe.extra.get("servings"), Some(&json!("four")));
        assert_eq!(recipe.extra.get("nutritionalInfo"), Some(&json!("n/a")));
    }

    #[test]
    fn test_loosely_typed_fields_are_coerced() {
        let raw = r#"{
            "servings": "6 servings",
            "prepTime": 10,
            "ingredients": ["salt", {"name": "pepper", "amount": 1}],
            "instructions": "Mix everything.",
            "tags": ["easy", 5, null]
        }"#;
        let recipe = extract_recipe(raw, &ingredients(), created_at()).unwrap();
        assert_eq!(recipe.servings, Some(6));
        assert_eq!(recipe.prep_time.as_deref(), Some("10"));
        assert_eq!(recipe.ingredients[0].item, "salt");
        assert_eq!(recipe.ingredients[1].item, "pepper");
        assert_eq!(recipe.ingredients[1].amount, "1");
        assert_eq!(recipe.instructions, vec!["Mix everything."]);
        assert_eq!(recipe.tags, vec!["easy", "5"]);
    }
}
