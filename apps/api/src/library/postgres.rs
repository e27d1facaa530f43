use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::library::{RecipeStore, Review, SavedRecipe, StoreError, UserStats};
use crate::models::recipe::RecipeRecord;

#[derive(Debug, FromRow)]
struct SavedRecipeRow {
    id: Uuid,
    user_id: String,
    recipe: Value,
    rating: i16,
    reviews: Value,
    saved_at: Option<DateTime<Utc>>,
    last_updated: Option<DateTime<Utc>>,
}

impl TryFrom<SavedRecipeRow> for SavedRecipe {
    type Error = StoreError;

    fn try_from(row: SavedRecipeRow) -> Result<Self, Self::Error> {
        Ok(SavedRecipe {
            id: row.id,
            user_id: row.user_id,
            saved_at: row.saved_at,
            rating: u8::try_from(row.rating).unwrap_or_default(),
            reviews: serde_json::from_value(row.reviews)?,
            last_updated: row.last_updated,
            recipe: serde_json::from_value(row.recipe)?,
        })
    }
}

#[derive(Debug, FromRow)]
struct UserStatsRow {
    recipes_generated: i64,
    recipes_saved: i64,
}

/// Postgres-backed store. The recipe body lives in a JSONB column so unknown
/// model fields survive a round trip; counters live in `user_stats`.
#[derive(Clone)]
pub struct PgRecipeStore {
    pool: PgPool,
}

impl PgRecipeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecipeStore for PgRecipeStore {
    async fn save(&self, user_id: &str, recipe: &RecipeRecord) -> Result<SavedRecipe, StoreError> {
        let id = Uuid::new_v4();
        let body = serde_json::to_value(recipe)?;

        let mut tx = self.pool.begin().await?;

        let saved_at: DateTime<Utc> = sqlx::query_scalar(
            r#"
            INSERT INTO saved_recipes (id, user_id, recipe, rating, reviews)
            VALUES ($1, $2, $3, 0, '[]'::jsonb)
            RETURNING saved_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&body)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO user_stats (user_id, recipes_generated, recipes_saved)
            VALUES ($1, 1, 1)
            ON CONFLICT (user_id) DO UPDATE
            SET recipes_generated = user_stats.recipes_generated + 1,
                recipes_saved = user_stats.recipes_saved + 1,
                updated_at = now()
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!("Saved recipe {id} for user {user_id}");

        Ok(SavedRecipe {
            id,
            user_id: user_id.to_string(),
            saved_at: Some(saved_at),
            rating: 0,
            reviews: Vec::new(),
            last_updated: None,
            recipe: recipe.clone(),
        })
    }

    async fn list(&self, user_id: &str) -> Result<Vec<SavedRecipe>, StoreError> {
        let rows = sqlx::query_as::<_, SavedRecipeRow>(
            "SELECT id, user_id, recipe, rating, reviews, saved_at, last_updated \
             FROM saved_recipes WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SavedRecipe::try_from).collect()
    }

    async fn get(&self, user_id: &str, id: Uuid) -> Result<SavedRecipe, StoreError> {
        let row = sqlx::query_as::<_, SavedRecipeRow>(
            "SELECT id, user_id, recipe, rating, reviews, saved_at, last_updated \
             FROM saved_recipes WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        SavedRecipe::try_from(row)
    }

    async fn delete(&self, user_id: &str, id: Uuid) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM saved_recipes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        // Dropping the transaction rolls it back.
        if deleted == 0 {
            return Err(StoreError::NotFound);
        }

        sqlx::query(
            "UPDATE user_stats SET recipes_saved = recipes_saved - 1, updated_at = now() \
             WHERE user_id = $1",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!("Deleted recipe {id} for user {user_id}");
        Ok(())
    }

    async fn update_rating(&self, user_id: &str, id: Uuid, rating: u8) -> Result<(), StoreError> {
        let updated = sqlx::query(
            "UPDATE saved_recipes SET rating = $3, last_updated = now() \
             WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .bind(i16::from(rating))
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn add_review(&self, user_id: &str, id: Uuid, review: Review) -> Result<(), StoreError> {
        let review = serde_json::to_value(&review)?;
        let updated = sqlx::query(
            "UPDATE saved_recipes SET reviews = reviews || jsonb_build_array($3::jsonb), \
             last_updated = now() WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .bind(&review)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn stats(&self, user_id: &str) -> Result<UserStats, StoreError> {
        let row = sqlx::query_as::<_, UserStatsRow>(
            "SELECT recipes_generated, recipes_saved FROM user_stats WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row
            .map(|r| UserStats {
                recipes_generated: r.recipes_generated,
                recipes_saved: r.recipes_saved,
            })
            .unwrap_or_default())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
