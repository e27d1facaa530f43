use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ────────────────────────────────────────────────────────────────────────────
// Preferences
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpiceLevel {
    Mild,
    #[default]
    Medium,
    Spicy,
    VerySpicy,
}

impl SpiceLevel {
    pub fn label(self) -> &'static str {
        match self {
            SpiceLevel::Mild => "Mild",
            SpiceLevel::Medium => "Medium",
            SpiceLevel::Spicy => "Spicy",
            SpiceLevel::VerySpicy => "Very Spicy",
        }
    }
}

impl FromStr for SpiceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_choice(s).as_str() {
            "mild" => Ok(SpiceLevel::Mild),
            "medium" => Ok(SpiceLevel::Medium),
            "spicy" => Ok(SpiceLevel::Spicy),
            "very_spicy" => Ok(SpiceLevel::VerySpicy),
            _ => Err(format!("Unknown spice level '{s}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DietaryPreference {
    #[default]
    NoPreference,
    Vegetarian,
    Vegan,
    Pescatarian,
    NonVegetarian,
}

impl DietaryPreference {
    pub fn label(self) -> &'static str {
        match self {
            DietaryPreference::NoPreference => "No Preference",
            DietaryPreference::Vegetarian => "Vegetarian",
            DietaryPreference::Vegan => "Vegan",
            DietaryPreference::Pescatarian => "Pescatarian",
            DietaryPreference::NonVegetarian => "Non-Vegetarian",
        }
    }
}

impl FromStr for DietaryPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_choice(s).as_str() {
            "no_preference" | "none" | "any" => Ok(DietaryPreference::NoPreference),
            "vegetarian" => Ok(DietaryPreference::Vegetarian),
            "vegan" => Ok(DietaryPreference::Vegan),
            "pescatarian" => Ok(DietaryPreference::Pescatarian),
            "non_vegetarian" => Ok(DietaryPreference::NonVegetarian),
            _ => Err(format!("Unknown dietary preference '{s}'")),
        }
    }
}

/// Accepts both wire values ("very_spicy") and UI labels ("Very Spicy").
fn normalize_choice(s: &str) -> String {
    s.trim().to_lowercase().replace([' ', '-'], "_")
}

/// Raw preferences exactly as the client sent them.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesInput {
    cuisine: Option<String>,
    spice_level: Option<String>,
    dietary_restrictions: Option<Vec<String>>,
    meal_type: Option<String>,
    dietary_preference: Option<String>,
}

/// User-selected recipe customization.
///
/// All defaulting happens here, when the set is built from the request:
/// blank strings count as absent, "None" restrictions are dropped and
/// duplicate restrictions collapse to their first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "PreferencesInput")]
pub struct PreferenceSet {
    pub cuisine: Option<String>,
    pub spice_level: SpiceLevel,
    pub dietary_restrictions: Vec<String>,
    pub meal_type: Option<String>,
    pub dietary_preference: DietaryPreference,
}

impl TryFrom<PreferencesInput> for PreferenceSet {
    type Error = String;

    fn try_from(input: PreferencesInput) -> Result<Self, Self::Error> {
        let spice_level = match non_blank(input.spice_level) {
            Some(s) => s.parse()?,
            None => SpiceLevel::default(),
        };
        let dietary_preference = match non_blank(input.dietary_preference) {
            Some(s) => s.parse()?,
            None => DietaryPreference::default(),
        };

        let mut dietary_restrictions: Vec<String> = Vec::new();
        for restriction in input.dietary_restrictions.unwrap_or_default() {
            let restriction = restriction.trim();
            if restriction.is_empty() || restriction.eq_ignore_ascii_case("none") {
                continue;
            }
            if !dietary_restrictions
                .iter()
                .any(|r| r.eq_ignore_ascii_case(restriction))
            {
                dietary_restrictions.push(restriction.to_string());
            }
        }

        Ok(PreferenceSet {
            cuisine: non_blank(input.cuisine),
            spice_level,
            dietary_restrictions,
            meal_type: non_blank(input.meal_type),
            dietary_preference,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl PreferenceSet {
    pub fn cuisine_label(&self) -> &str {
        self.cuisine.as_deref().unwrap_or("Any")
    }

    pub fn meal_type_label(&self) -> &str {
        self.meal_type.as_deref().unwrap_or("Any")
    }

    pub fn restrictions_label(&self) -> String {
        if self.dietary_restrictions.is_empty() {
            "None".to_string()
        } else {
            self.dietary_restrictions.join(", ")
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Recipe
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    #[serde(default)]
    pub item: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub notes: String,
}

/// Strings carry their units, e.g. "350 kcal", "25g".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionalInfo {
    #[serde(default)]
    pub calories: String,
    #[serde(default)]
    pub protein: String,
    #[serde(default)]
    pub carbs: String,
    #[serde(default)]
    pub fat: String,
}

/// The canonical structured recipe produced by generation.
///
/// The four sequence fields are never null: absence is an empty `Vec`.
/// `created_at` and `original_ingredients` are set once by the extractor.
/// Keys outside this schema, and schema values whose shape could not be
/// coerced, are kept in `extra` under their original key.
///
/// Deserialization goes through [`RecipeRecord::from_fields`], so a body read
/// back from a client or from storage is held to the same rules as model output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "Map<String, Value>")]
pub struct RecipeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cook_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredient>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutritional_info: Option<NutritionalInfo>,
    #[serde(default)]
    pub tips: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub original_ingredients: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Saved-recipe metadata. Never part of a recipe body, so a client cannot
/// smuggle them in beside the real values.
pub const STORAGE_KEYS: &[&str] = &[
    "id",
    "userId",
    "savedAt",
    "rating",
    "reviews",
    "lastUpdated",
];

impl RecipeRecord {
    /// Builds a record from a loosely typed JSON object.
    ///
    /// Numbers are accepted where text was expected and "4 servings" reads as 4.
    /// A scalar field whose value cannot be coerced stays in `extra` as sent.
    /// Sequence elements are never dropped, only nulls.
    pub fn from_fields(
        mut fields: Map<String, Value>,
        created_at: DateTime<Utc>,
        original_ingredients: Vec<String>,
    ) -> Self {
        for key in STORAGE_KEYS {
            fields.remove(*key);
        }

        RecipeRecord {
            recipe_name: coerce(&mut fields, "recipeName", text),
            description: coerce(&mut fields, "description", text),
            prep_time: coerce(&mut fields, "prepTime", text),
            cook_time: coerce(&mut fields, "cookTime", text),
            servings: coerce(&mut fields, "servings", servings),
            difficulty: coerce(&mut fields, "difficulty", text),
            ingredients: sequence(&mut fields, "ingredients", ingredient),
            instructions: sequence(&mut fields, "instructions", step_text),
            nutritional_info: coerce(&mut fields, "nutritionalInfo", nutrition),
            tips: sequence(&mut fields, "tips", step_text),
            tags: sequence(&mut fields, "tags", step_text),
            created_at,
            original_ingredients,
            extra: fields,
        }
    }
}

impl TryFrom<Map<String, Value>> for RecipeRecord {
    type Error = String;

    fn try_from(mut fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let created_at = match fields.remove("createdAt") {
            Some(Value::String(s)) => s
                .parse::<DateTime<Utc>>()
                .map_err(|e| format!("invalid createdAt '{s}': {e}"))?,
            _ => return Err("recipe is missing createdAt".to_string()),
        };
        let original_ingredients = sequence(&mut fields, "originalIngredients", step_text);

        Ok(Self::from_fields(fields, created_at, original_ingredients))
    }
}

/// Removes and converts `key`. Values that do not convert are left in place.
fn coerce<T>(
    fields: &mut Map<String, Value>,
    key: &str,
    convert: fn(&Value) -> Option<T>,
) -> Option<T> {
    let value = fields.get(key)?;
    if value.is_null() {
        fields.remove(key);
        return None;
    }
    let converted = convert(value)?;
    fields.remove(key);
    Some(converted)
}

/// Removes `key` and converts each element. A lone non-array value counts as
/// a one-element sequence.
fn sequence<T>(
    fields: &mut Map<String, Value>,
    key: &str,
    convert: fn(&Value) -> Option<T>,
) -> Vec<T> {
    match fields.remove(key) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().filter_map(convert).collect(),
        Some(other) => convert(&other).into_iter().collect(),
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Steps, tips and tags. Objects like `{"step": 1, "text": "..."}` yield their
/// text; anything else structured is kept as its JSON form.
fn step_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Object(fields) => Some(
            ["text", "instruction", "description"]
                .iter()
                .find_map(|key| fields.get(*key).and_then(text))
                .unwrap_or_else(|| value.to_string()),
        ),
        Value::Array(_) => Some(value.to_string()),
        scalar => text(scalar),
    }
}

fn servings(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => {
            let digits: String = s
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

fn ingredient(value: &Value) -> Option<RecipeIngredient> {
    match value {
        Value::Null => None,
        Value::Object(fields) => {
            let field = |key: &str| fields.get(key).and_then(text);
            Some(RecipeIngredient {
                item: field("item").or_else(|| field("name")).unwrap_or_default(),
                amount: field("amount").unwrap_or_default(),
                notes: field("notes").unwrap_or_default(),
            })
        }
        other => Some(RecipeIngredient {
            item: text(other).unwrap_or_else(|| other.to_string()),
            ..Default::default()
        }),
    }
}

fn nutrition(value: &Value) -> Option<NutritionalInfo> {
    let Value::Object(fields) = value else {
        return None;
    };
    let field = |key: &str| fields.get(key).and_then(text).unwrap_or_default();

    Some(NutritionalInfo {
        calories: field("calories"),
        protein: field("protein"),
        carbs: field("carbs"),
        fat: field("fat"),
    })
}

impl fmt::Display for RecipeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.recipe_name.as_deref().unwrap_or("Untitled recipe"))
    }
}
