//! On-hand quantities keyed by ingredient name and unit
//!
//! Built fresh from the inventory rows for every computation and never stored.

use crate::models::InventoryItem;
use std::collections::HashMap;

/// Summed inventory per (lowercased name, unit).
///
/// A missing unit is keyed as the empty string. Quantities in different units
/// are kept apart; nothing is converted.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AvailabilityIndex {
    totals: HashMap<String, HashMap<String, f64>>,
}

impl AvailabilityIndex {
    /// Sum all raw inventory rows, skipping sub-recipe items
    pub fn from_inventory(items: &[InventoryItem]) -> Self {
        let mut totals: HashMap<String, HashMap<String, f64>> = HashMap::new();

        for item in items.iter().filter(|item| !item.is_recipe) {
            *totals
                .entry(item.name.to_lowercase())
                .or_default()
                .entry(unit_key(item.unit.as_deref()).to_string())
                .or_insert(0.0) += item.measurement;
        }

        log::debug!(
            "Built availability index: {} ingredients from {} inventory rows",
            totals.len(),
            items.len()
        );
        Self { totals }
    }

    /// Total on hand for an ingredient in a unit, `None` if nothing matches
    pub fn get(&self, name: &str, unit: Option<&str>) -> Option<f64> {
        self.totals
            .get(&name.to_lowercase())
            .and_then(|units| units.get(unit_key(unit)))
            .copied()
    }

    /// Total on hand, treating an unmatched key as zero
    pub fn available(&self, name: &str, unit: Option<&str>) -> f64 {
        self.get(name, unit).unwrap_or(0.0)
    }

    /// Number of distinct ingredient names tracked
    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

/// Normalize an optional unit to its lookup key
pub(crate) fn unit_key(unit: Option<&str>) -> &str {
    unit.unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, unit: Option<&str>, measurement: f64, is_recipe: bool) -> InventoryItem {
        InventoryItem {
            id: 0,
            is_recipe,
            name: name.to_string(),
            measurement,
            unit: unit.map(str::to_string),
            price: None,
            brand: None,
            notes: None,
            expiration: None,
        }
    }

    #[test]
    fn test_sums_rows_with_same_name_and_unit() {
        let index = AvailabilityIndex::from_inventory(&[
            item("flour", Some("g"), 300.0, false),
            item("flour", Some("g"), 250.0, false),
        ]);

        assert_eq!(index.get("flour", Some("g")), Some(550.0));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_keeps_units_apart() {
        let index = AvailabilityIndex::from_inventory(&[
            item("flour", Some("g"), 300.0, false),
            item("flour", Some("kg"), 5.0, false),
        ]);

        assert_eq!(index.get("flour", Some("g")), Some(300.0));
        assert_eq!(index.get("flour", Some("kg")), Some(5.0));
        assert_eq!(index.get("flour", None), None);
    }

    #[test]
    fn test_skips_sub_recipe_rows() {
        let index = AvailabilityIndex::from_inventory(&[
            item("dough", Some("g"), 800.0, true),
            item("flour", Some("g"), 100.0, false),
            item("flour", Some("g"), 900.0, true),
        ]);

        assert_eq!(index.get("dough", Some("g")), None);
        assert_eq!(index.available("dough", Some("g")), 0.0);
        assert_eq!(index.get("flour", Some("g")), Some(100.0));
    }

    #[test]
    fn test_names_match_case_insensitively() {
        let index = AvailabilityIndex::from_inventory(&[
            item("Flour", Some("g"), 100.0, false),
            item("FLOUR", Some("g"), 50.0, false),
        ]);

        assert_eq!(index.get("flour", Some("g")), Some(150.0));
        assert_eq!(index.get("fLoUr", Some("g")), Some(150.0));
    }

    #[test]
    fn test_units_match_exactly() {
        let index = AvailabilityIndex::from_inventory(&[item("milk", Some("L"), 2.0, false)]);

        assert_eq!(index.get("milk", Some("L")), Some(2.0));
        assert_eq!(index.get("milk", Some("l")), None);
    }

    #[test]
    fn test_missing_unit_is_empty_key() {
        let index = AvailabilityIndex::from_inventory(&[
            item("egg", None, 6.0, false),
            item("egg", Some(""), 6.0, false),
        ]);

        assert_eq!(index.get("egg", None), Some(12.0));
        assert_eq!(index.get("egg", Some("")), Some(12.0));
    }

    #[test]
    fn test_empty_inventory_gives_empty_index() {
        let index = AvailabilityIndex::from_inventory(&[]);
        assert!(index.is_empty());
        assert_eq!(index.available("anything", None), 0.0);
    }
}
