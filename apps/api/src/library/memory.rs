use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::library::{RecipeStore, Review, SavedRecipe, StoreError, UserStats};
use crate::models::recipe::RecipeRecord;

#[derive(Default)]
struct Inner {
    recipes: HashMap<Uuid, SavedRecipe>,
    stats: HashMap<String, UserStats>,
}

/// Process-local store. Used when no database is configured, and in tests.
/// Contents are lost on restart.
#[derive(Default)]
pub struct MemoryRecipeStore {
    inner: RwLock<Inner>,
}

impl MemoryRecipeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn owned_mut<'a>(
    inner: &'a mut Inner,
    user_id: &str,
    id: Uuid,
) -> Result<&'a mut SavedRecipe, StoreError> {
    inner
        .recipes
        .get_mut(&id)
        .filter(|r| r.user_id == user_id)
        .ok_or(StoreError::NotFound)
}

#[async_trait]
impl RecipeStore for MemoryRecipeStore {
    async fn save(&self, user_id: &str, recipe: &RecipeRecord) -> Result<SavedRecipe, StoreError> {
        let saved = SavedRecipe {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            saved_at: Some(Utc::now()),
            rating: 0,
            reviews: Vec::new(),
            last_updated: None,
            recipe: recipe.clone(),
        };

        let mut inner = self.inner.write().await;
        inner.recipes.insert(saved.id, saved.clone());
        let stats = inner.stats.entry(user_id.to_string()).or_default();
        stats.recipes_saved += 1;
        stats.recipes_generated += 1;

        Ok(saved)
    }

    async fn list(&self, user_id: &str) -> Result<Vec<SavedRecipe>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .recipes
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get(&self, user_id: &str, id: Uuid) -> Result<SavedRecipe, StoreError> {
        let inner = self.inner.read().await;
        inner
            .recipes
            .get(&id)
            .filter(|r| r.user_id == user_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, user_id: &str, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        owned_mut(&mut inner, user_id, id)?;
        inner.recipes.remove(&id);
        inner
            .stats
            .entry(user_id.to_string())
            .or_default()
            .recipes_saved -= 1;
        Ok(())
    }

    async fn update_rating(&self, user_id: &str, id: Uuid, rating: u8) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let recipe = owned_mut(&mut inner, user_id, id)?;
        recipe.rating = rating;
        recipe.last_updated = Some(Utc::now());
        Ok(())
    }

    async fn add_review(&self, user_id: &str, id: Uuid, review: Review) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let recipe = owned_mut(&mut inner, user_id, id)?;
        recipe.reviews.push(review);
        recipe.last_updated = Some(Utc::now());
        Ok(())
    }

    async fn stats(&self, user_id: &str) -> Result<UserStats, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.stats.get(user_id).copied().unwrap_or_default())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
