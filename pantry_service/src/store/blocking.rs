//! Async adapter for the file-based stores

use super::{RecipeStore, SyncRecipeStore};
use crate::error::StoreResult;
use async_trait::async_trait;
use pantry_common::{
    FoodRecipe, Ingredient, InventoryItem, NewIngredient, NewInventoryItem, NewRecipe,
};
use std::sync::Arc;

/// Runs each call of a [`SyncRecipeStore`] on the blocking thread pool so
/// file and SQLite I/O never stalls a runtime worker.
pub struct BlockingStore<S> {
    inner: Arc<S>,
}

impl<S: SyncRecipeStore + 'static> BlockingStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// The wrapped store, for direct synchronous access
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    async fn run<T, F>(&self, call: F) -> StoreResult<T>
    where
        F: FnOnce(&S) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || call(store.as_ref())).await?
    }
}

#[async_trait]
impl<S: SyncRecipeStore + 'static> RecipeStore for BlockingStore<S> {
    async fn create_ingredient(&self, new: &NewIngredient) -> StoreResult<Ingredient> {
        let new = new.clone();
        self.run(move |store| store.create_ingredient(&new)).await
    }

    async fn list_ingredients(&self) -> StoreResult<Vec<Ingredient>> {
        self.run(|store| store.list_ingredients()).await
    }

    async fn create_inventory_item(&self, new: &NewInventoryItem) -> StoreResult<InventoryItem> {
        let new = new.clone();
        self.run(move |store| store.create_inventory_item(&new)).await
    }

    async fn list_inventory_items(&self) -> StoreResult<Vec<InventoryItem>> {
        self.run(|store| store.list_inventory_items()).await
    }

    async fn create_recipe(&self, new: &NewRecipe) -> StoreResult<FoodRecipe> {
        let new = new.clone();
        self.run(move |store| store.create_recipe(&new)).await
    }

    async fn list_recipes(&self) -> StoreResult<Vec<FoodRecipe>> {
        self.run(|store| store.list_recipes()).await
    }

    async fn get_recipe(&self, id: i64) -> StoreResult<Option<FoodRecipe>> {
        self.run(move |store| store.get_recipe(id)).await
    }
}
