//! Batch feasibility for a recipe against an inventory snapshot
//!
//! Both operations are pure: they rebuild the availability index from the
//! rows they are given and touch nothing else.

use crate::availability::{unit_key, AvailabilityIndex};
use crate::models::{FoodRecipe, InventoryItem, Shortage, ValidationResult};

/// Maximum number of whole batches the inventory can cover.
///
/// A line whose ingredient is absent, exhausted, or whose quantity is not
/// positive caps the result at zero. A recipe with no lines also yields zero.
pub fn compute_max_batches(recipe: &FoodRecipe, inventory: &[InventoryItem]) -> u64 {
    let index = AvailabilityIndex::from_inventory(inventory);
    max_batches_with(recipe, &index)
}

fn max_batches_with(recipe: &FoodRecipe, index: &AvailabilityIndex) -> u64 {
    let mut max_batches: Option<u64> = None;

    for req in &recipe.ingredients {
        // Wrong unit and unknown name look the same here
        let available = match index.get(&req.name, req.unit.as_deref()) {
            Some(amount) if amount > 0.0 => amount,
            _ => return 0,
        };
        if req.quantity <= 0.0 || req.quantity.is_nan() {
            return 0;
        }

        let batches = (available / req.quantity).floor() as u64;
        max_batches = Some(max_batches.map_or(batches, |current| current.min(batches)));
    }

    max_batches.unwrap_or(0)
}

/// Check whether `batches_requested` batches can be made and list what is short.
///
/// `max_batches` in the result is computed independently of the shortages.
pub fn validate(
    recipe: &FoodRecipe,
    inventory: &[InventoryItem],
    batches_requested: i64,
) -> ValidationResult {
    let index = AvailabilityIndex::from_inventory(inventory);

    let shortages: Vec<Shortage> = recipe
        .ingredients
        .iter()
        .filter_map(|req| {
            let needed = req.quantity * batches_requested as f64;
            let have = index.available(&req.name, req.unit.as_deref());
            if have < needed {
                let unit = unit_key(req.unit.as_deref());
                Some(Shortage {
                    name: req.name.clone(),
                    unit: (!unit.is_empty()).then(|| unit.to_string()),
                    required: needed,
                    available: have,
                    missing: (needed - have).max(0.0),
                })
            } else {
                None
            }
        })
        .collect();

    let max_batches = max_batches_with(recipe, &index);
    log::debug!(
        "Recipe {} ({}): {} batch(es) requested, {} possible, {} shortage(s)",
        recipe.id,
        recipe.name,
        batches_requested,
        max_batches,
        shortages.len()
    );

    ValidationResult {
        can_make: shortages.is_empty(),
        batches_requested,
        max_batches,
        shortages,
    }
}

#[cfg(test)]
#[path = "feasibility_tests.rs"]
mod tests;
