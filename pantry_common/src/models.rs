//! Records shared by the stores, the feasibility engine and the web layer

use crate::error::ValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A named ingredient in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Payload for creating an ingredient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIngredient {
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A stocked item on hand.
///
/// Items with `is_recipe` set are outputs of earlier recipes and never count
/// towards raw ingredient availability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: i64,
    pub is_recipe: bool,
    pub name: String,
    pub measurement: f64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub expiration: Option<NaiveDate>,
}

/// Payload for adding an item to inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInventoryItem {
    #[serde(default)]
    pub is_recipe: bool,
    pub name: String,
    pub measurement: f64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub expiration: Option<NaiveDate>,
}

impl NewInventoryItem {
    /// Rejects non-positive or non-finite measurements
    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_positive("measurement", self.measurement)
    }

    /// Attach a store-assigned id
    pub fn into_item(self, id: i64) -> InventoryItem {
        InventoryItem {
            id,
            is_recipe: self.is_recipe,
            name: self.name,
            measurement: self.measurement,
            unit: self.unit,
            price: self.price,
            brand: self.brand,
            notes: self.notes,
            expiration: self.expiration,
        }
    }
}

/// One requirement line of a recipe (per batch)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub name: String,
    pub quantity: f64,
    #[serde(default)]
    pub unit: Option<String>,
}

/// A recipe together with its ordered requirement lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodRecipe {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub ingredients: Vec<RecipeIngredient>,
}

/// Payload for creating a recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecipe {
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub ingredients: Vec<RecipeIngredient>,
}

impl NewRecipe {
    /// Every line needs a strictly positive quantity
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ingredients
            .iter()
            .try_for_each(|line| ensure_positive("quantity", line.quantity))
    }

    /// Attach a store-assigned id
    pub fn into_recipe(self, id: i64) -> FoodRecipe {
        FoodRecipe {
            id,
            name: self.name,
            notes: self.notes,
            ingredients: self.ingredients,
        }
    }
}

/// Request body for checking whether a recipe can be made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRequest {
    #[serde(default = "default_batches")]
    pub batches: i64,
}

fn default_batches() -> i64 {
    1
}

impl Default for ValidationRequest {
    fn default() -> Self {
        Self {
            batches: default_batches(),
        }
    }
}

impl ValidationRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.batches > 0 {
            Ok(())
        } else {
            Err(ValidationError::NonPositiveBatches(self.batches))
        }
    }
}

/// A requirement line that inventory cannot cover
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shortage {
    pub name: String,
    pub unit: Option<String>,
    pub required: f64,
    pub available: f64,
    pub missing: f64,
}

/// Outcome of checking a recipe against inventory for a batch count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub can_make: bool,
    pub batches_requested: i64,
    pub max_batches: u64,
    pub shortages: Vec<Shortage>,
}

// NaN fails the comparison, so it is rejected along with zero and negatives
fn ensure_positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonPositive { field, value })
    }
}
