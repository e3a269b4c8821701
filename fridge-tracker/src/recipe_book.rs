use crate::recipes::{Recipe, RecipeAdapter};
use crate::store::{format_timestamp, parse_stored_timestamp, FridgeStore};
use crate::types::Result;
use chrono::{DateTime, Utc};
use sqlx::Row;
use tracing::{info, warn};

/// The saved recipe suggestions plus the fridge items they were made from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeSuggestions {
    pub recipes: Vec<Recipe>,
    pub last_updated: Option<DateTime<Utc>>,
    pub fridge_items_used: Vec<String>,
}

#[derive(Clone)]
pub struct RecipeBook {
    store: FridgeStore,
}

impl RecipeBook {
    pub fn new(store: FridgeStore) -> Self {
        Self { store }
    }

    pub async fn suggestions(&self) -> Result<RecipeSuggestions> {
        let rows = sqlx::query(
            r#"
            SELECT recipe_name, brief_description, main_ingredients, estimated_cooking_time, difficulty_level
            FROM recipes ORDER BY seq
            "#,
        )
        .fetch_all(self.store.pool())
        .await?;

        let mut recipes = Vec::with_capacity(rows.len());
        for row in rows {
            let main_ingredients: String = row.try_get("main_ingredients")?;
            recipes.push(Recipe {
                recipe_name: row.try_get("recipe_name")?,
                brief_description: row.try_get("brief_description")?,
                main_ingredients: serde_json::from_str(&main_ingredients)?,
                estimated_cooking_time: row.try_get("estimated_cooking_time")?,
                difficulty_level: row.try_get("difficulty_level")?,
            });
        }

        let meta = sqlx::query("SELECT last_updated, fridge_items FROM recipe_meta WHERE id = 0")
            .fetch_optional(self.store.pool())
            .await?;

        let (last_updated, fridge_items_used) = match meta {
            Some(row) => {
                let last_updated: Option<String> = row.try_get("last_updated")?;
                let fridge_items: String = row.try_get("fridge_items")?;
                (
                    last_updated.as_deref().map(parse_stored_timestamp).transpose()?,
                    serde_json::from_str(&fridge_items)?,
                )
            }
            None => (None, Vec::new()),
        };

        Ok(RecipeSuggestions {
            recipes,
            last_updated,
            fridge_items_used,
        })
    }

    /// Replaces all suggestions with a fresh batch, stored as given.
    pub async fn set_recipes(&self, recipes: &[Recipe], fridge_items: &[String], now: DateTime<Utc>) -> Result<()> {
        let mut tx = self.store.pool().begin().await?;
        sqlx::query("DELETE FROM recipes").execute(&mut *tx).await?;
        for recipe in recipes {
            insert_recipe(&mut tx, recipe).await?;
        }
        write_meta(&mut tx, Some(now), Some(fridge_items)).await?;
        tx.commit().await?;

        info!("Stored {} recipe suggestions", recipes.len());
        Ok(())
    }

    /// Adds a recipe unless one with the same name exists. Returns whether it was added.
    pub async fn add_recipe(&self, recipe: &Recipe, now: DateTime<Utc>) -> Result<bool> {
        let mut tx = self.store.pool().begin().await?;
        let exists = sqlx::query("SELECT 1 FROM recipes WHERE recipe_name = ?1")
            .bind(&recipe.recipe_name)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if exists {
            return Ok(false);
        }

        insert_recipe(&mut tx, recipe).await?;
        write_meta(&mut tx, Some(now), None).await?;
        tx.commit().await?;
        Ok(true)
    }

    pub async fn remove_recipe(&self, recipe_name: &str, now: DateTime<Utc>) -> Result<bool> {
        let mut tx = self.store.pool().begin().await?;
        let result = sqlx::query("DELETE FROM recipes WHERE recipe_name = ?1")
            .bind(recipe_name)
            .execute(&mut *tx)
            .await?;
        write_meta(&mut tx, Some(now), None).await?;
        tx.commit().await?;

        let removed = result.rows_affected() > 0;
        if !removed {
            warn!("No recipe named {:?}", recipe_name);
        }
        Ok(removed)
    }

    pub async fn clear_recipes(&self) -> Result<()> {
        let mut tx = self.store.pool().begin().await?;
        sqlx::query("DELETE FROM recipes").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM recipe_meta").execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Asks `adapter` for recipes and stores them.
    ///
    /// On any failure the saved suggestions are left as they were.
    pub async fn refresh(
        &self,
        adapter: &dyn RecipeAdapter,
        fridge_items: &[String],
        now: DateTime<Utc>,
    ) -> Result<Vec<Recipe>> {
        info!("Requesting recipes from {}", adapter.adapter_name());
        let recipes = adapter.suggest(fridge_items).await?;
        self.set_recipes(&recipes, fridge_items, now).await?;
        Ok(recipes)
    }
}

async fn insert_recipe(tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>, recipe: &Recipe) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO recipes
            (recipe_name, brief_description, main_ingredients, estimated_cooking_time, difficulty_level)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&recipe.recipe_name)
    .bind(&recipe.brief_description)
    .bind(serde_json::to_string(&recipe.main_ingredients)?)
    .bind(&recipe.estimated_cooking_time)
    .bind(&recipe.difficulty_level)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Upserts the single metadata row. `fridge_items: None` keeps the stored list.
async fn write_meta(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    last_updated: Option<DateTime<Utc>>,
    fridge_items: Option<&[String]>,
) -> Result<()> {
    let last_updated = last_updated.map(format_timestamp);
    match fridge_items {
        Some(items) => {
            sqlx::query(
                r#"
                INSERT INTO recipe_meta (id, last_updated, fridge_items) VALUES (0, ?1, ?2)
                ON CONFLICT (id) DO UPDATE SET last_updated = excluded.last_updated, fridge_items = excluded.fridge_items
                "#,
            )
            .bind(last_updated)
            .bind(serde_json::to_string(items)?)
            .execute(&mut **tx)
            .await?;
        }
        None => {
            sqlx::query(
                r#"
                INSERT INTO recipe_meta (id, last_updated, fridge_items) VALUES (0, ?1, '[]')
                ON CONFLICT (id) DO UPDATE SET last_updated = excluded.last_updated
                "#,
            )
            .bind(last_updated)
            .execute(&mut **tx)
            .await?;
        }
    }
    Ok(())
}
