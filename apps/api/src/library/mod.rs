//! Saved-recipe library and its persistence backends.
//!
//! `AppState` holds an `Arc<dyn RecipeStore>`: `PgRecipeStore` when a database
//! is configured, `MemoryRecipeStore` otherwise.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::recipe::RecipeRecord;

pub mod handlers;
pub mod memory;
pub mod postgres;

pub use memory::MemoryRecipeStore;
pub use postgres::PgRecipeStore;

pub const MAX_RATING: u8 = 5;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("recipe not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("stored recipe is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    pub created_at: DateTime<Utc>,
}

/// A recipe the user chose to keep, with its storage metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRecipe {
    pub id: Uuid,
    pub user_id: String,
    pub saved_at: Option<DateTime<Utc>>,
    pub rating: u8,
    pub reviews: Vec<Review>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub recipe: RecipeRecord,
}

impl SavedRecipe {
    /// Save time when known, otherwise the recipe's creation time.
    pub fn recency(&self) -> DateTime<Utc> {
        self.saved_at.unwrap_or(self.recipe.created_at)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub recipes_generated: i64,
    pub recipes_saved: i64,
}

/// Newest first.
pub fn sort_by_recency(recipes: &mut [SavedRecipe]) {
    recipes.sort_by(|a, b| b.recency().cmp(&a.recency()));
}

/// Storage contract for saved recipes and per-user counters.
///
/// Saving increments both `recipes_saved` and `recipes_generated`; deleting
/// decrements `recipes_saved` only.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn save(&self, user_id: &str, recipe: &RecipeRecord) -> Result<SavedRecipe, StoreError>;

    /// Unordered; callers sort with `sort_by_recency`.
    async fn list(&self, user_id: &str) -> Result<Vec<SavedRecipe>, StoreError>;

    async fn get(&self, user_id: &str, id: Uuid) -> Result<SavedRecipe, StoreError>;

    async fn delete(&self, user_id: &str, id: Uuid) -> Result<(), StoreError>;

    async fn update_rating(&self, user_id: &str, id: Uuid, rating: u8) -> Result<(), StoreError>;

    async fn add_review(&self, user_id: &str, id: Uuid, review: Review) -> Result<(), StoreError>;

    async fn stats(&self, user_id: &str) -> Result<UserStats, StoreError>;

    fn backend(&self) -> &'static str;
}
