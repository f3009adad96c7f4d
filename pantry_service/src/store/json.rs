//! JSON document store
//!
//! The whole database is one JSON file holding the three collections and the
//! next id for each. Writes replace the file atomically: the new document goes
//! to a sibling `.tmp` file which is then renamed over the original, so readers
//! see either the old or the new version and never a partial one.

use super::SyncRecipeStore;
use crate::error::StoreResult;
use pantry_common::{
    FoodRecipe, Ingredient, InventoryItem, NewIngredient, NewInventoryItem, NewRecipe,
};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Next id to hand out per collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Sequences {
    #[serde(default = "first_id")]
    ingredients: i64,
    #[serde(default = "first_id")]
    inventory: i64,
    #[serde(default = "first_id")]
    recipes: i64,
}

fn first_id() -> i64 {
    1
}

impl Default for Sequences {
    fn default() -> Self {
        Self {
            ingredients: first_id(),
            inventory: first_id(),
            recipes: first_id(),
        }
    }
}

/// On-disk layout of the database file
#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    ingredients: Vec<Ingredient>,
    #[serde(default)]
    inventory: Vec<InventoryItem>,
    #[serde(default)]
    recipes: Vec<FoodRecipe>,
    #[serde(rename = "_seq", default)]
    seq: Sequences,
}

/// Take the current value of a counter and advance it
fn allocate(counter: &mut i64) -> i64 {
    let id = *counter;
    *counter += 1;
    id
}

/// File-backed store.
///
/// One lock guards every collection, so writes to unrelated collections still
/// queue behind each other. Reads take no lock.
pub struct JsonStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonStore {
    /// Open the document at `path`, creating an empty one if it does not exist
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
                log::info!("Created directory: {}", parent.display());
            }
        }

        let store = Self {
            path: path.to_path_buf(),
            lock: Mutex::new(()),
        };

        if !store.path.exists() {
            store.write(&Document::default())?;
            log::info!("Initialized JSON database: {}", store.path.display());
        } else {
            log::info!("Opened JSON database: {}", store.path.display());
        }
        Ok(store)
    }

    /// Location of the canonical document
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }

    fn read(&self) -> StoreResult<Document> {
        let bytes = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn write(&self, doc: &Document) -> StoreResult<()> {
        let tmp = self.tmp_path();
        if let Err(e) = Self::write_file(&tmp, doc) {
            // Best effort: the canonical document is untouched either way
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn write_file(path: &Path, doc: &Document) -> StoreResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, doc)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok(())
    }

    /// Read-modify-write cycle under the store lock
    fn update<T>(&self, mutate: impl FnOnce(&mut Document) -> T) -> StoreResult<T> {
        // The guarded state lives on disk, so a poisoned lock is still usable
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut doc = self.read()?;
        let out = mutate(&mut doc);
        self.write(&doc)?;
        Ok(out)
    }
}

impl SyncRecipeStore for JsonStore {
    fn create_ingredient(&self, new: &NewIngredient) -> StoreResult<Ingredient> {
        let ingredient = self.update(|doc| {
            let ingredient = Ingredient {
                id: allocate(&mut doc.seq.ingredients),
                name: new.name.clone(),
                notes: new.notes.clone(),
            };
            doc.ingredients.push(ingredient.clone());
            ingredient
        })?;
        log::debug!("Created ingredient {} ({})", ingredient.id, ingredient.name);
        Ok(ingredient)
    }

    fn list_ingredients(&self) -> StoreResult<Vec<Ingredient>> {
        Ok(self.read()?.ingredients)
    }

    fn create_inventory_item(&self, new: &NewInventoryItem) -> StoreResult<InventoryItem> {
        let item = self.update(|doc| {
            let item = new.clone().into_item(allocate(&mut doc.seq.inventory));
            doc.inventory.push(item.clone());
            item
        })?;
        log::debug!("Created inventory item {} ({})", item.id, item.name);
        Ok(item)
    }

    fn list_inventory_items(&self) -> StoreResult<Vec<InventoryItem>> {
        Ok(self.read()?.inventory)
    }

    fn create_recipe(&self, new: &NewRecipe) -> StoreResult<FoodRecipe> {
        let recipe = self.update(|doc| {
            let recipe = new.clone().into_recipe(allocate(&mut doc.seq.recipes));
            doc.recipes.push(recipe.clone());
            recipe
        })?;
        log::debug!(
            "Created recipe {} ({}) with {} ingredient line(s)",
            recipe.id,
            recipe.name,
            recipe.ingredients.len()
        );
        Ok(recipe)
    }

    fn list_recipes(&self) -> StoreResult<Vec<FoodRecipe>> {
        Ok(self.read()?.recipes)
    }

    fn get_recipe(&self, id: i64) -> StoreResult<Option<FoodRecipe>> {
        Ok(self
            .read()?
            .recipes
            .into_iter()
            .find(|recipe| recipe.id == id))
    }
}
