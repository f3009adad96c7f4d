//! Record stores for ingredients, inventory and recipes
//!
//! Three interchangeable backends implement [`RecipeStore`]: a single JSON
//! document on disk, a SQLite database and a PostgreSQL database. All of them
//! hand back the same records.
//!
//! The file-based backends do blocking I/O. They implement [`SyncRecipeStore`]
//! and are served through [`BlockingStore`], which moves every call onto
//! tokio's blocking thread pool.

mod blocking;
mod json;
mod postgres;
mod sqlite;

pub use blocking::BlockingStore;
pub use json::JsonStore;
pub use postgres::PostgresStore;
pub use sqlite::{init_schema, SqliteStore};

use crate::config::{Backend, Config};
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use pantry_common::{
    FoodRecipe, Ingredient, InventoryItem, NewIngredient, NewInventoryItem, NewRecipe,
};
use std::sync::Arc;

/// Create/list/get contract shared by every backend.
///
/// Lists come back in id order. Every create either fully commits or fails.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn create_ingredient(&self, new: &NewIngredient) -> StoreResult<Ingredient>;

    async fn list_ingredients(&self) -> StoreResult<Vec<Ingredient>>;

    async fn create_inventory_item(&self, new: &NewInventoryItem) -> StoreResult<InventoryItem>;

    async fn list_inventory_items(&self) -> StoreResult<Vec<InventoryItem>>;

    /// Store the recipe and all of its lines as one unit
    async fn create_recipe(&self, new: &NewRecipe) -> StoreResult<FoodRecipe>;

    async fn list_recipes(&self) -> StoreResult<Vec<FoodRecipe>>;

    /// `Ok(None)` when no recipe has this id
    async fn get_recipe(&self, id: i64) -> StoreResult<Option<FoodRecipe>>;
}

/// The same contract for backends that block the calling thread
pub trait SyncRecipeStore: Send + Sync {
    fn create_ingredient(&self, new: &NewIngredient) -> StoreResult<Ingredient>;

    fn list_ingredients(&self) -> StoreResult<Vec<Ingredient>>;

    fn create_inventory_item(&self, new: &NewInventoryItem) -> StoreResult<InventoryItem>;

    fn list_inventory_items(&self) -> StoreResult<Vec<InventoryItem>>;

    fn create_recipe(&self, new: &NewRecipe) -> StoreResult<FoodRecipe>;

    fn list_recipes(&self) -> StoreResult<Vec<FoodRecipe>>;

    fn get_recipe(&self, id: i64) -> StoreResult<Option<FoodRecipe>>;
}

/// Open the backend selected in the configuration
pub async fn open_store(config: &Config) -> StoreResult<Arc<dyn RecipeStore>> {
    let store: Arc<dyn RecipeStore> = match config.backend {
        Backend::Json => Arc::new(BlockingStore::new(JsonStore::open(&config.db_file)?)),
        Backend::Sqlite => Arc::new(BlockingStore::new(SqliteStore::open(&config.sqlite_path)?)),
        Backend::Postgres => {
            let url = config.database_url.as_deref().ok_or_else(|| {
                StoreError::Config("the postgres backend needs DATABASE_URL".to_string())
            })?;
            Arc::new(PostgresStore::connect(url).await?)
        }
    };
    Ok(store)
}
