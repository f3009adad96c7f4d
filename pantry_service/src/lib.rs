//! Pantry Service - recipe and inventory tracking
//!
//! Stores ingredients, inventory items and recipes in a JSON document, a SQLite
//! database or PostgreSQL, and answers how many batches of a recipe the current
//! inventory covers and what is missing for a given batch count.

pub mod config;
pub mod error;
pub mod store;
pub mod web;

pub use config::{Backend, Config};
pub use error::{StoreError, StoreResult};
pub use store::{
    open_store, BlockingStore, JsonStore, PostgresStore, RecipeStore, SqliteStore, SyncRecipeStore,
};
