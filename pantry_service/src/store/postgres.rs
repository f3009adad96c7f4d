//! PostgreSQL store
//!
//! Same four tables as the SQLite store. Inserts hand back the stored row with
//! `RETURNING`, and recipe creation runs in one transaction.

use super::RecipeStore;
use crate::error::StoreResult;
use async_trait::async_trait;
use pantry_common::{
    FoodRecipe, Ingredient, InventoryItem, NewIngredient, NewInventoryItem, NewRecipe,
    RecipeIngredient,
};
use sqlx::postgres::{PgExecutor, PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

const MAX_CONNECTIONS: u32 = 5;

const SCHEMA: [&str; 5] = [
    "CREATE TABLE IF NOT EXISTS ingredients (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        notes TEXT
    )",
    "CREATE TABLE IF NOT EXISTS inventory (
        id BIGSERIAL PRIMARY KEY,
        is_recipe BOOLEAN NOT NULL DEFAULT FALSE,
        name TEXT NOT NULL,
        measurement DOUBLE PRECISION NOT NULL,
        unit TEXT,
        price DOUBLE PRECISION,
        brand TEXT,
        notes TEXT,
        expiration DATE
    )",
    "CREATE TABLE IF NOT EXISTS recipes (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        notes TEXT
    )",
    "CREATE TABLE IF NOT EXISTS recipe_ingredients (
        id BIGSERIAL PRIMARY KEY,
        recipe_id BIGINT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        quantity DOUBLE PRECISION NOT NULL,
        unit TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_recipe_ingredients_recipe ON recipe_ingredients(recipe_id)",
];

const INVENTORY_COLUMNS: &str =
    "id, is_recipe, name, measurement, unit, price, brand, notes, expiration";

/// Create the tables if they don't exist
async fn init_schema(pool: &PgPool) -> sqlx::Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    log::info!("PostgreSQL schema initialized");
    Ok(())
}

/// Relational store over a PostgreSQL connection pool
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect to `database_url` and initialise the schema
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await?;
        log::info!("Connected to PostgreSQL");
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: PgPool) -> StoreResult<Self> {
        init_schema(&pool).await?;
        Ok(Self { pool })
    }

    /// Attach lines to a `recipes` row of (id, name, notes)
    async fn recipe_with_lines(&self, header: &PgRow) -> sqlx::Result<FoodRecipe> {
        let id: i64 = header.try_get("id")?;
        Ok(FoodRecipe {
            id,
            name: header.try_get("name")?,
            notes: header.try_get("notes")?,
            ingredients: recipe_lines(&self.pool, id).await?,
        })
    }
}

fn ingredient_from_row(row: &PgRow) -> sqlx::Result<Ingredient> {
    Ok(Ingredient {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        notes: row.try_get("notes")?,
    })
}

fn inventory_item_from_row(row: &PgRow) -> sqlx::Result<InventoryItem> {
    Ok(InventoryItem {
        id: row.try_get("id")?,
        is_recipe: row.try_get("is_recipe")?,
        name: row.try_get("name")?,
        measurement: row.try_get("measurement")?,
        unit: row.try_get("unit")?,
        price: row.try_get("price")?,
        brand: row.try_get("brand")?,
        notes: row.try_get("notes")?,
        expiration: row.try_get("expiration")?,
    })
}

fn line_from_row(row: &PgRow) -> sqlx::Result<RecipeIngredient> {
    Ok(RecipeIngredient {
        name: row.try_get("name")?,
        quantity: row.try_get("quantity")?,
        unit: row.try_get("unit")?,
    })
}

/// Requirement lines of one recipe, in insertion order
async fn recipe_lines<'e, E>(executor: E, recipe_id: i64) -> sqlx::Result<Vec<RecipeIngredient>>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        "SELECT name, quantity, unit
         FROM recipe_ingredients
         WHERE recipe_id = $1
         ORDER BY id ASC",
    )
    .bind(recipe_id)
    .fetch_all(executor)
    .await?
    .iter()
    .map(line_from_row)
    .collect()
}

#[async_trait]
impl RecipeStore for PostgresStore {
    async fn create_ingredient(&self, new: &NewIngredient) -> StoreResult<Ingredient> {
        let row = sqlx::query(
            "INSERT INTO ingredients (name, notes) VALUES ($1, $2) RETURNING id, name, notes",
        )
        .bind(&new.name)
        .bind(&new.notes)
        .fetch_one(&self.pool)
        .await?;
        let ingredient = ingredient_from_row(&row)?;

        log::debug!("Created ingredient {} ({})", ingredient.id, ingredient.name);
        Ok(ingredient)
    }

    async fn list_ingredients(&self) -> StoreResult<Vec<Ingredient>> {
        let rows = sqlx::query("SELECT id, name, notes FROM ingredients ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;
        let ingredients: sqlx::Result<Vec<Ingredient>> =
            rows.iter().map(ingredient_from_row).collect();
        Ok(ingredients?)
    }

    async fn create_inventory_item(&self, new: &NewInventoryItem) -> StoreResult<InventoryItem> {
        let row = sqlx::query(&format!(
            "INSERT INTO inventory
             (is_recipe, name, measurement, unit, price, brand, notes, expiration)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {}",
            INVENTORY_COLUMNS
        ))
        .bind(new.is_recipe)
        .bind(&new.name)
        .bind(new.measurement)
        .bind(&new.unit)
        .bind(new.price)
        .bind(&new.brand)
        .bind(&new.notes)
        .bind(new.expiration)
        .fetch_one(&self.pool)
        .await?;
        let item = inventory_item_from_row(&row)?;

        log::debug!("Created inventory item {} ({})", item.id, item.name);
        Ok(item)
    }

    async fn list_inventory_items(&self) -> StoreResult<Vec<InventoryItem>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM inventory ORDER BY id ASC",
            INVENTORY_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        let items: sqlx::Result<Vec<InventoryItem>> =
            rows.iter().map(inventory_item_from_row).collect();
        Ok(items?)
    }

    async fn create_recipe(&self, new: &NewRecipe) -> StoreResult<FoodRecipe> {
        let mut tx = self.pool.begin().await?;

        let header = sqlx::query(
            "INSERT INTO recipes (name, notes) VALUES ($1, $2) RETURNING id, name, notes",
        )
        .bind(&new.name)
        .bind(&new.notes)
        .fetch_one(&mut *tx)
        .await?;
        let recipe_id: i64 = header.try_get("id")?;

        for line in &new.ingredients {
            sqlx::query(
                "INSERT INTO recipe_ingredients (recipe_id, name, quantity, unit)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(recipe_id)
            .bind(&line.name)
            .bind(line.quantity)
            .bind(&line.unit)
            .execute(&mut *tx)
            .await?;
        }

        let recipe = FoodRecipe {
            id: recipe_id,
            name: header.try_get("name")?,
            notes: header.try_get("notes")?,
            ingredients: recipe_lines(&mut *tx, recipe_id).await?,
        };
        // Dropping `tx` on any error above rolls the whole recipe back
        tx.commit().await?;

        log::debug!(
            "Created recipe {} ({}) with {} ingredient line(s)",
            recipe.id,
            recipe.name,
            recipe.ingredients.len()
        );
        Ok(recipe)
    }

    async fn list_recipes(&self) -> StoreResult<Vec<FoodRecipe>> {
        let headers = sqlx::query("SELECT id, name, notes FROM recipes ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        let mut recipes = Vec::with_capacity(headers.len());
        for header in &headers {
            recipes.push(self.recipe_with_lines(header).await?);
        }
        Ok(recipes)
    }

    async fn get_recipe(&self, id: i64) -> StoreResult<Option<FoodRecipe>> {
        let header = sqlx::query("SELECT id, name, notes FROM recipes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match header {
            Some(header) => Ok(Some(self.recipe_with_lines(&header).await?)),
            None => Ok(None),
        }
    }
}
