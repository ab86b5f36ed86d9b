//! # Line Items
//!
//! A `LineItem` is one row of an estimate: either priced work
//! (`ItemKind::PricedItem`) or a section header that only partitions the
//! table visually (`ItemKind::SectionHeader`).
//!
//! Edits arrive as raw text from form fields. [`LineItem::apply`] stores text
//! fields verbatim and coerces numeric fields with [`coerce_number`], so an
//! item is always in a computable state.
//!
//! ## Example
//!
//! ```rust
//! use boq_core::line_item::{ItemField, ItemKind, LineItem};
//!
//! let mut item = LineItem::new(ItemKind::PricedItem, "01");
//! item.apply(ItemField::MaterialRate, "45000");
//! item.apply(ItemField::Quantity, "abc"); // not a number -> 0
//!
//! assert_eq!(item.material_rate, 45000.0);
//! assert_eq!(item.quantity, 0.0);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::BoqError;

/// Default unit for a freshly added priced item
pub const DEFAULT_UNIT: &str = "Lot";

/// Default description for a freshly added section header
pub const DEFAULT_SECTION_TITLE: &str = "New Section";

/// Variant tag for a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ItemKind {
    /// Priced unit of work; contributes `rate * quantity` to totals
    #[default]
    PricedItem,
    /// Non-priced label row; never contributes to totals
    SectionHeader,
}

impl ItemKind {
    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            ItemKind::PricedItem => "Priced Item",
            ItemKind::SectionHeader => "Section Header",
        }
    }
}

impl FromStr for ItemKind {
    type Err = BoqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "item" | "priced" | "priceditem" => Ok(ItemKind::PricedItem),
            "section" | "header" | "sectionheader" => Ok(ItemKind::SectionHeader),
            _ => Err(BoqError::invalid_input("kind", s, "Expected 'item' or 'section'")),
        }
    }
}

/// A single row of the estimate.
///
/// ## JSON Example
///
/// ```json
/// {
///   "id": "6f1c1f0e-5a55-4c52-9d4e-0b7f7e0c8a11",
///   "kind": "PricedItem",
///   "code": "3.1.1",
///   "description": "Grade 25 Concrete in Foundations",
///   "unit": "m³",
///   "quantity": 150.0,
///   "material_rate": 45000.0,
///   "labor_rate": 5000.0,
///   "plant_rate": 2000.0,
///   "waste_percent": 0.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Unique within the project, assigned once at creation
    pub id: Uuid,

    pub kind: ItemKind,

    /// Display label (e.g. "03.1.1"); not guaranteed unique
    pub code: String,

    pub description: String,

    /// Free text, usually drawn from the master unit list
    pub unit: String,

    /// Any sign; negative quantities are credits
    pub quantity: f64,

    pub material_rate: f64,

    pub labor_rate: f64,

    pub plant_rate: f64,

    /// Inflates `material_rate` only
    #[serde(default)]
    pub waste_percent: f64,

    /// Division code this loose item is reported under. A lookup key, not ownership.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division_ref: Option<String>,
}

impl LineItem {
    /// Create a new item with a fresh id and default field values.
    pub fn new(kind: ItemKind, code: impl Into<String>) -> Self {
        let (description, unit, quantity) = match kind {
            ItemKind::PricedItem => (String::new(), DEFAULT_UNIT.to_string(), 1.0),
            ItemKind::SectionHeader => (DEFAULT_SECTION_TITLE.to_string(), String::new(), 0.0),
        };
        LineItem {
            id: Uuid::new_v4(),
            kind,
            code: code.into(),
            description,
            unit,
            quantity,
            material_rate: 0.0,
            labor_rate: 0.0,
            plant_rate: 0.0,
            waste_percent: 0.0,
            division_ref: None,
        }
    }

    /// Create a section header with a code and title.
    pub fn section_header(code: impl Into<String>, description: impl Into<String>) -> Self {
        let mut item = LineItem::new(ItemKind::SectionHeader, code);
        item.description = description.into();
        item
    }

    /// Builder: set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder: set unit and quantity
    pub fn with_quantity(mut self, unit: impl Into<String>, quantity: f64) -> Self {
        self.unit = unit.into();
        self.quantity = quantity;
        self
    }

    /// Builder: set the three unit rates
    pub fn with_rates(mut self, material: f64, labor: f64, plant: f64) -> Self {
        self.material_rate = material;
        self.labor_rate = labor;
        self.plant_rate = plant;
        self
    }

    /// Builder: set waste percentage
    pub fn with_waste(mut self, waste_percent: f64) -> Self {
        self.waste_percent = waste_percent;
        self
    }

    /// Builder: tag with a division code
    pub fn with_division(mut self, division_code: impl Into<String>) -> Self {
        self.division_ref = Some(division_code.into());
        self
    }

    pub fn is_priced(&self) -> bool {
        self.kind == ItemKind::PricedItem
    }

    /// Apply a raw edit to one field.
    ///
    /// Text fields store `raw` unmodified (empty strings included). Numeric
    /// fields store `coerce_number(raw)`. Never fails.
    pub fn apply(&mut self, field: ItemField, raw: &str) {
        match field {
            ItemField::Code => self.code = raw.to_string(),
            ItemField::Description => self.description = raw.to_string(),
            ItemField::Unit => self.unit = raw.to_string(),
            ItemField::DivisionRef => self.division_ref = Some(raw.to_string()),
            ItemField::Quantity => self.quantity = coerce_number(raw),
            ItemField::MaterialRate => self.material_rate = coerce_number(raw),
            ItemField::LaborRate => self.labor_rate = coerce_number(raw),
            ItemField::PlantRate => self.plant_rate = coerce_number(raw),
            ItemField::WastePercent => self.waste_percent = coerce_number(raw),
        }
    }
}

/// Editable fields of a [`LineItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemField {
    Code,
    Description,
    Unit,
    DivisionRef,
    Quantity,
    MaterialRate,
    LaborRate,
    PlantRate,
    WastePercent,
}

impl ItemField {
    pub const ALL: [ItemField; 9] = [
        ItemField::Code,
        ItemField::Description,
        ItemField::Unit,
        ItemField::DivisionRef,
        ItemField::Quantity,
        ItemField::MaterialRate,
        ItemField::LaborRate,
        ItemField::PlantRate,
        ItemField::WastePercent,
    ];

    /// True for fields that go through numeric coercion
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ItemField::Quantity
                | ItemField::MaterialRate
                | ItemField::LaborRate
                | ItemField::PlantRate
                | ItemField::WastePercent
        )
    }

    /// Stable key used on the command line and in edit events
    pub fn key(&self) -> &'static str {
        match self {
            ItemField::Code => "code",
            ItemField::Description => "description",
            ItemField::Unit => "unit",
            ItemField::DivisionRef => "division",
            ItemField::Quantity => "qty",
            ItemField::MaterialRate => "material",
            ItemField::LaborRate => "labor",
            ItemField::PlantRate => "plant",
            ItemField::WastePercent => "waste",
        }
    }
}

impl fmt::Display for ItemField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for ItemField {
    type Err = BoqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        let alias = match wanted.as_str() {
            "quantity" => "qty",
            "materialrate" | "material_rate" => "material",
            "laborrate" | "labor_rate" | "labour" => "labor",
            "plantrate" | "plant_rate" => "plant",
            "wastepercent" | "waste_percent" => "waste",
            "divisionref" | "division_ref" => "division",
            other => other,
        };
        ItemField::ALL
            .iter()
            .copied()
            .find(|field| field.key() == alias)
            .ok_or_else(|| BoqError::invalid_input("field", s, "Unknown line item field"))
    }
}

/// Numeric coercion policy for raw edits.
///
/// Returns the parsed value when `raw` (trimmed) parses to a finite `f64`,
/// otherwise `0.0`.
pub fn coerce_number(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Sequential display code for the item created when `count` items already exist.
///
/// Single digits are zero-padded: 0 -> "01", 8 -> "09", 9 -> "10".
pub fn sequential_code(count: usize) -> String {
    let next = count + 1;
    if next < 10 {
        format!("0{}", next)
    } else {
        next.to_string()
    }
}
