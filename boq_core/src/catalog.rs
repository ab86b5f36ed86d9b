//! # Price Catalog
//!
//! A catalog of priced materials, labor and plant used to pre-fill new line
//! items. Picking an entry copies its values into a fresh [`LineItem`]; the
//! item keeps no reference back to the catalog.
//!
//! ## Example
//!
//! ```rust
//! use boq_core::catalog::Catalog;
//!
//! let catalog = Catalog::standard();
//! let hits = catalog.search("drywall");
//! assert_eq!(hits.len(), 2);
//!
//! let item = hits[0].to_line_item("01");
//! assert_eq!(item.quantity, 1.0);
//! assert_eq!(item.material_rate, 12.0);
//! ```

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::{BoqError, BoqResult};
use crate::line_item::{ItemKind, LineItem};

/// Which rate of a line item a catalog cost fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CostComponent {
    #[default]
    Material,
    Labor,
    Plant,
}

/// A priced catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    /// Unit cost
    pub cost: f64,
    pub category: String,
    pub unit: String,
    #[serde(default)]
    pub component: CostComponent,
}

impl CatalogEntry {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        cost: f64,
        category: impl Into<String>,
        unit: impl Into<String>,
        component: CostComponent,
    ) -> Self {
        CatalogEntry {
            id: id.into(),
            name: name.into(),
            cost,
            category: category.into(),
            unit: unit.into(),
            component,
        }
    }

    /// Copy this entry into a new priced item with quantity 1.
    pub fn to_line_item(&self, code: impl Into<String>) -> LineItem {
        let (material, labor, plant) = match self.component {
            CostComponent::Material => (self.cost, 0.0, 0.0),
            CostComponent::Labor => (0.0, self.cost, 0.0),
            CostComponent::Plant => (0.0, 0.0, self.cost),
        };
        LineItem::new(ItemKind::PricedItem, code)
            .with_description(self.name.clone())
            .with_quantity(self.unit.clone(), 1.0)
            .with_rates(material, labor, plant)
    }

    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.category.to_lowercase().contains(needle)
    }
}

/// Ordered collection of catalog entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

static STANDARD: Lazy<Catalog> = Lazy::new(|| {
    Catalog::new(vec![
        CatalogEntry::new("m1", "2x4 Stud (8ft)", 4.50, "Framing", "ea", CostComponent::Material),
        CatalogEntry::new("m2", "Drywall Sheet (4x8)", 12.00, "Drywall", "sheet", CostComponent::Material),
        CatalogEntry::new("m3", "Joint Compound", 18.00, "Drywall", "bucket", CostComponent::Material),
        CatalogEntry::new("m4", "Interior Paint", 45.00, "Finishing", "gal", CostComponent::Material),
        CatalogEntry::new("l1", "General Labor", 65.00, "Labor", "hr", CostComponent::Labor),
        CatalogEntry::new("l2", "Electrical Rough-in", 85.00, "Labor", "hr", CostComponent::Labor),
        CatalogEntry::new("c1", "Concrete (3000psi)", 140.00, "Foundation", "yd³", CostComponent::Material),
        CatalogEntry::new("p1", "Concrete Mixer (day hire)", 120.00, "Plant", "day", CostComponent::Plant),
    ])
});

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Catalog { entries }
    }

    /// Built-in starter catalog.
    pub fn standard() -> &'static Catalog {
        &STANDARD
    }

    pub fn from_json_str(json: &str) -> BoqResult<Self> {
        serde_json::from_str(json).map_err(|e| BoqError::serialization(format!("Invalid catalog: {}", e)))
    }

    pub fn load(path: &Path) -> BoqResult<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| BoqError::file_error("read", path.display().to_string(), e.to_string()))?;
        Catalog::from_json_str(&contents)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Entries whose name or category contains `query`, ignoring case.
    /// An empty query matches everything.
    pub fn search(&self, query: &str) -> Vec<&CatalogEntry> {
        let needle = query.trim().to_lowercase();
        self.entries.iter().filter(|e| e.matches(&needle)).collect()
    }

    /// The first `n` entries, shown before the user types anything
    pub fn suggested(&self, n: usize) -> &[CatalogEntry] {
        &self.entries[..n.min(self.entries.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_name_and_category() {
        let catalog = Catalog::standard();
        let labor: Vec<_> = catalog.search("LABOR").iter().map(|e| e.id.as_str()).collect();
        assert_eq!(labor, vec!["l1", "l2"]);
        assert_eq!(catalog.search("paint")[0].id, "m4");
        assert!(catalog.search("granite").is_empty());
    }

    #[test]
    fn test_empty_query_returns_all() {
        let catalog = Catalog::standard();
        assert_eq!(catalog.search("").len(), catalog.entries().len());
    }

    #[test]
    fn test_suggested() {
        let catalog = Catalog::standard();
        assert_eq!(catalog.suggested(3).len(), 3);
        assert_eq!(catalog.suggested(100).len(), catalog.entries().len());
    }

    #[test]
    fn test_labor_entry_fills_labor_rate() {
        let item = Catalog::standard().get("l1").unwrap().to_line_item("05");
        assert_eq!(item.code, "05");
        assert_eq!(item.description, "General Labor");
        assert_eq!(item.unit, "hr");
        assert_eq!(item.material_rate, 0.0);
        assert_eq!(item.labor_rate, 65.0);
    }

    #[test]
    fn test_pick_copies_values() {
        let mut catalog = Catalog::new(vec![CatalogEntry::new(
            "x", "Rebar Y12", 900.0, "Steel", "kg", CostComponent::Material,
        )]);
        let item = catalog.get("x").unwrap().to_line_item("01");
        catalog.entries[0].cost = 1200.0;
        assert_eq!(item.material_rate, 900.0);
    }

    #[test]
    fn test_json_roundtrip_defaults_component() {
        let json = r#"[{ "id": "a", "name": "Sand", "cost": 3.0, "category": "Aggregates", "unit": "t" }]"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        assert_eq!(catalog.entries()[0].component, CostComponent::Material);
    }
}
