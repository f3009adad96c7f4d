//! Pantry Common - shared recipe and inventory types
//!
//! Holds the records exchanged between the stores and the web layer, plus the
//! pure batch computations: the availability index built from inventory and
//! the feasibility engine that answers "how many batches" and "what is missing".

pub mod availability;
pub mod error;
pub mod feasibility;
pub mod models;

pub use availability::AvailabilityIndex;
pub use error::ValidationError;
pub use feasibility::{compute_max_batches, validate};
pub use models::{
    FoodRecipe, Ingredient, InventoryItem, NewIngredient, NewInventoryItem, NewRecipe,
    RecipeIngredient, Shortage, ValidationRequest, ValidationResult,
};
