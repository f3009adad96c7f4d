//! SQLite store
//!
//! Uses parameterized queries exclusively. Recipe creation is transactional so
//! a recipe never exists without all of its ingredient lines.

use super::SyncRecipeStore;
use crate::error::StoreResult;
use chrono::NaiveDate;
use pantry_common::{
    FoodRecipe, Ingredient, InventoryItem, NewIngredient, NewInventoryItem, NewRecipe,
    RecipeIngredient,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Initialize the database schema
///
/// Creates tables if they don't exist:
/// - `ingredients`: ingredient catalog
/// - `inventory`: stocked items
/// - `recipes`: recipe headers
/// - `recipe_ingredients`: requirement lines owned by a recipe
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;

        -- AUTOINCREMENT keeps ids from ever being reused
        CREATE TABLE IF NOT EXISTS ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            notes TEXT
        );

        CREATE TABLE IF NOT EXISTS inventory (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            is_recipe INTEGER NOT NULL DEFAULT 0,
            name TEXT NOT NULL,
            measurement REAL NOT NULL,
            unit TEXT,
            price REAL,
            brand TEXT,
            notes TEXT,
            expiration TEXT
        );

        CREATE TABLE IF NOT EXISTS recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            notes TEXT
        );

        CREATE TABLE IF NOT EXISTS recipe_ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipe_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            quantity REAL NOT NULL,
            unit TEXT,
            FOREIGN KEY (recipe_id) REFERENCES recipes(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_recipe_ingredients_recipe ON recipe_ingredients(recipe_id);
        ",
    )?;

    log::info!("Database schema initialized");
    Ok(())
}

/// Relational store over a single SQLite connection
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file and initialise the schema
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
                log::info!("Created directory: {}", parent.display());
            }
        }

        let conn = Connection::open(path)?;
        log::info!("Opened database: {}", path.display());
        Self::from_connection(conn)
    }

    /// In-memory database, mostly for tests
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    // An open transaction rolls back when its guard unwinds, so the
    // connection is still consistent after a panic elsewhere
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn ingredient_from_row(row: &Row<'_>) -> rusqlite::Result<Ingredient> {
    Ok(Ingredient {
        id: row.get(0)?,
        name: row.get(1)?,
        notes: row.get(2)?,
    })
}

fn inventory_item_from_row(row: &Row<'_>) -> rusqlite::Result<InventoryItem> {
    let expiration: Option<NaiveDate> = row.get(8)?;
    Ok(InventoryItem {
        id: row.get(0)?,
        is_recipe: row.get(1)?,
        name: row.get(2)?,
        measurement: row.get(3)?,
        unit: row.get(4)?,
        price: row.get(5)?,
        brand: row.get(6)?,
        notes: row.get(7)?,
        expiration,
    })
}

/// (id, name, notes) of a `recipes` row
type RecipeHeader = (i64, String, Option<String>);

const INVENTORY_COLUMNS: &str =
    "id, is_recipe, name, measurement, unit, price, brand, notes, expiration";

/// Requirement lines of one recipe, in insertion order
fn recipe_lines(conn: &Connection, recipe_id: i64) -> rusqlite::Result<Vec<RecipeIngredient>> {
    let mut stmt = conn.prepare_cached(
        "SELECT name, quantity, unit
         FROM recipe_ingredients
         WHERE recipe_id = ?1
         ORDER BY id ASC",
    )?;

    let lines: rusqlite::Result<Vec<RecipeIngredient>> = stmt
        .query_map(params![recipe_id], |row| {
            Ok(RecipeIngredient {
                name: row.get(0)?,
                quantity: row.get(1)?,
                unit: row.get(2)?,
            })
        })?
        .collect();
    lines
}

/// Attach lines to a recipe header row of (id, name, notes)
fn recipe_with_lines(
    conn: &Connection,
    (id, name, notes): RecipeHeader,
) -> rusqlite::Result<FoodRecipe> {
    Ok(FoodRecipe {
        id,
        name,
        notes,
        ingredients: recipe_lines(conn, id)?,
    })
}

impl SyncRecipeStore for SqliteStore {
    fn create_ingredient(&self, new: &NewIngredient) -> StoreResult<Ingredient> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO ingredients (name, notes) VALUES (?1, ?2)",
            params![&new.name, &new.notes],
        )?;
        let id = conn.last_insert_rowid();
        let ingredient = conn.query_row(
            "SELECT id, name, notes FROM ingredients WHERE id = ?1",
            params![id],
            ingredient_from_row,
        )?;

        log::debug!("Created ingredient {} ({})", ingredient.id, ingredient.name);
        Ok(ingredient)
    }

    fn list_ingredients(&self) -> StoreResult<Vec<Ingredient>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, name, notes FROM ingredients ORDER BY id ASC")?;
        let rows: rusqlite::Result<Vec<Ingredient>> =
            stmt.query_map([], ingredient_from_row)?.collect();
        Ok(rows?)
    }

    fn create_inventory_item(&self, new: &NewInventoryItem) -> StoreResult<InventoryItem> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO inventory
             (is_recipe, name, measurement, unit, price, brand, notes, expiration)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                new.is_recipe,
                &new.name,
                new.measurement,
                &new.unit,
                new.price,
                &new.brand,
                &new.notes,
                new.expiration,
            ],
        )?;
        let id = conn.last_insert_rowid();
        let item = conn.query_row(
            &format!("SELECT {} FROM inventory WHERE id = ?1", INVENTORY_COLUMNS),
            params![id],
            inventory_item_from_row,
        )?;

        log::debug!("Created inventory item {} ({})", item.id, item.name);
        Ok(item)
    }

    fn list_inventory_items(&self) -> StoreResult<Vec<InventoryItem>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM inventory ORDER BY id ASC",
            INVENTORY_COLUMNS
        ))?;
        let rows: rusqlite::Result<Vec<InventoryItem>> =
            stmt.query_map([], inventory_item_from_row)?.collect();
        Ok(rows?)
    }

    fn create_recipe(&self, new: &NewRecipe) -> StoreResult<FoodRecipe> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO recipes (name, notes) VALUES (?1, ?2)",
            params![&new.name, &new.notes],
        )?;
        let recipe_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO recipe_ingredients (recipe_id, name, quantity, unit)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for line in &new.ingredients {
                stmt.execute(params![recipe_id, &line.name, line.quantity, &line.unit])?;
            }
        }

        let header: RecipeHeader = tx.query_row(
            "SELECT id, name, notes FROM recipes WHERE id = ?1",
            params![recipe_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        let recipe = recipe_with_lines(&tx, header)?;
        tx.commit()?;

        log::debug!(
            "Created recipe {} ({}) with {} ingredient line(s)",
            recipe.id,
            recipe.name,
            recipe.ingredients.len()
        );
        Ok(recipe)
    }

    fn list_recipes(&self) -> StoreResult<Vec<FoodRecipe>> {
        let conn = self.conn();
        let headers: Vec<RecipeHeader> = conn
            .prepare("SELECT id, name, notes FROM recipes ORDER BY id ASC")?
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let recipes: rusqlite::Result<Vec<FoodRecipe>> = headers
            .into_iter()
            .map(|header| recipe_with_lines(&conn, header))
            .collect();
        Ok(recipes?)
    }

    fn get_recipe(&self, id: i64) -> StoreResult<Option<FoodRecipe>> {
        let conn = self.conn();
        let header: Option<RecipeHeader> = conn
            .query_row(
                "SELECT id, name, notes FROM recipes WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        match header {
            Some(header) => Ok(Some(recipe_with_lines(&conn, header)?)),
            None => Ok(None),
        }
    }
}
