// Prompt templates for ingredient analysis and recipe generation.
// Both are pure functions of their inputs.

use crate::models::recipe::PreferenceSet;

/// Ingredient analysis prompt, sent alongside the uploaded image.
pub const INGREDIENT_ANALYSIS_PROMPT: &str = r#"Analyze this image and identify all edible food ingredients visible.
Return ONLY a JSON array of ingredient names as strings.
Example format: ["chicken breast", "bell pepper", "onion", "garlic"]

Rules:
- Only include actual food ingredients
- Use common ingredient names
- Be specific (e.g., "red bell pepper" not just "vegetable")
- Ignore cooking utensils, plates, or non-food items
- Return empty array if no ingredients found"#;

/// Recipe generation template. Every `{placeholder}` is replaced before sending.
pub const RECIPE_PROMPT_TEMPLATE: &str = r#"Create a detailed recipe using these ingredients and preferences:

Ingredients: {ingredients}

Preferences:
- Cuisine: {cuisine}
- Spice Level: {spice_level}
- Dietary Restrictions: {dietary_restrictions}
- Meal Type: {meal_type}
- Dietary Preference: {dietary_preference}

Return a JSON object with this EXACT structure (no markdown, no code blocks, just raw JSON):
{
  "recipeName": "Name of the dish",
  "description": "Brief 2-3 sentence description",
  "prepTime": "15 minutes",
  "cookTime": "30 minutes",
  "servings": 4,
  "difficulty": "Easy",
  "ingredients": [
    {
      "item": "chicken breast",
      "amount": "500g",
      "notes": "diced"
    }
  ],
  "instructions": [
    "Step 1 detailed instruction",
    "Step 2 detailed instruction"
  ],
  "nutritionalInfo": {
    "calories": "350 kcal",
    "protein": "25g",
    "carbs": "30g",
    "fat": "12g"
  },
  "tips": [
    "Cooking tip 1",
    "Cooking tip 2"
  ],
  "tags": ["quick", "healthy", "dinner"]
}

Important:
- Only use the provided ingredients as main ingredients
- You can suggest common pantry items (salt, pepper, oil) if needed
- Make instructions clear and detailed
- Ensure the recipe matches all preferences
- Return ONLY valid JSON, no markdown formatting, no code blocks, no additional text"#;

pub fn ingredient_analysis_prompt() -> &'static str {
    INGREDIENT_ANALYSIS_PROMPT
}

/// Renders the generation prompt. Missing preferences render as their
/// human-readable defaults ("Any", "Medium", "None", "No Preference").
pub fn recipe_generation_prompt(ingredients: &[String], preferences: &PreferenceSet) -> String {
    let ingredients = ingredients.join(", ");
    let restrictions = preferences.restrictions_label();

    fill_template(
        RECIPE_PROMPT_TEMPLATE,
        &[
            ("ingredients", ingredients.as_str()),
            ("cuisine", preferences.cuisine_label()),
            ("spice_level", preferences.spice_level.label()),
            ("dietary_restrictions", restrictions.as_str()),
            ("meal_type", preferences.meal_type_label()),
            ("dietary_preference", preferences.dietary_preference.label()),
        ],
    )
}

/// Replaces `{name}` placeholders in a single left-to-right pass. Substituted
/// text is never scanned again, and unknown braces are copied through.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let hit = values.iter().find_map(|(name, value)| {
            after
                .strip_prefix(name)
                .and_then(|tail| tail.strip_prefix('}'))
                .map(|tail| (*value, tail))
        });
        match hit {
            Some((value, tail)) => {
                out.push_str(value);
                rest = tail;
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::recipe::{DietaryPreference, SpiceLevel};

    fn ingredients() -> Vec<String> {
        vec!["chicken".to_string(), "rice".to_string(), "soy sauce".to_string()]
    }

    #[test]
    fn test_default_preferences_render_readable_defaults() {
        let prompt = recipe_generation_prompt(&ingredients(), &PreferenceSet::default());
        assert!(prompt.contains("Ingredients: chicken, rice, soy sauce\n"));
        assert!(prompt.contains("- Cuisine: Any\n"));
        assert!(prompt.contains("- Spice Level: Medium\n"));
        assert!(prompt.contains("- Dietary Restrictions: None\n"));
        assert!(prompt.contains("- Meal Type: Any\n"));
        assert!(prompt.contains("- Dietary Preference: No Preference\n"));
        assert!(!prompt.contains("undefined"));
        assert!(!prompt.contains("null"));
    }

    #[test]
    fn test_every_placeholder_is_filled() {
        let prompt = recipe_generation_prompt(&ingredients(), &PreferenceSet::default());
        for placeholder in [
            "{ingredients}",
            "{cuisine}",
            "{spice_level}",
            "{dietary_restrictions}",
            "{meal_type}",
            "{dietary_preference}",
        ] {
            assert!(!prompt.contains(placeholder), "{placeholder} left in prompt");
        }
    }

    #[test]
    fn test_explicit_preferences_are_embedded() {
        let preferences = PreferenceSet {
            cuisine: Some("Japanese".to_string()),
            spice_level: SpiceLevel::VerySpicy,
            dietary_restrictions: vec!["Gluten-Free".to_string(), "Nut-Free".to_string()],
            meal_type: Some("Lunch".to_string()),
            dietary_preference: DietaryPreference::Pescatarian,
        };
        let prompt = recipe_generation_prompt(&ingredients(), &preferences);
        assert!(prompt.contains("- Cuisine: Japanese\n"));
        assert!(prompt.contains("- Spice Level: Very Spicy\n"));
        assert!(prompt.contains("- Dietary Restrictions: Gluten-Free, Nut-Free\n"));
        assert!(prompt.contains("- Meal Type: Lunch\n"));
        assert!(prompt.contains("- Dietary Preference: Pescatarian\n"));
    }

    #[test]
    fn test_user_text_with_placeholders_is_embedded_verbatim() {
        let preferences = PreferenceSet {
            cuisine: Some("{meal_type} fusion".to_string()),
            meal_type: Some("Dinner".to_string()),
            ..PreferenceSet::default()
        };
        let prompt = recipe_generation_prompt(&["{cuisine} sauce".to_string()], &preferences);
        assert!(prompt.contains("Ingredients: {cuisine} sauce\n"));
        assert!(prompt.contains("- Cuisine: {meal_type} fusion\n"));
        assert!(prompt.contains("- Meal Type: Dinner\n"));
    }

    #[test]
    fn test_fill_template_leaves_unknown_braces() {
        let filled = fill_template("{a} {b} {\n}", &[("a", "{b}")]);
        assert_eq!(filled, "{b} {b} {\n}");
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let a = recipe_generation_prompt(&ingredients(), &PreferenceSet::default());
        let b = recipe_generation_prompt(&ingredients(), &PreferenceSet::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_embedded_schema_is_valid_json_with_recipe_fields() {
        // Placeholders close on their own line, so the first "{\n" starts the example.
        let start = RECIPE_PROMPT_TEMPLATE.find("{\n").unwrap();
        let end = RECIPE_PROMPT_TEMPLATE.rfind('}').unwrap();
        let schema: serde_json::Value =
            serde_json::from_str(&RECIPE_PROMPT_TEMPLATE[start..=end]).unwrap();
        for key in [
            "recipeName",
            "description",
            "prepTime",
            "cookTime",
            "servings",
            "difficulty",
            "ingredients",
            "instructions",
            "nutritionalInfo",
            "tips",
            "tags",
        ] {
            assert!(schema.get(key).is_some(), "schema example is missing {key}");
        }
    }

    #[test]
    fn test_analysis_prompt_asks_for_json_array_only() {
        let prompt = ingredient_analysis_prompt();
        assert!(prompt.contains("Return ONLY a JSON array"));
        assert!(prompt.contains("red bell pepper"));
        assert!(prompt.contains("Return empty array"));
    }
}
