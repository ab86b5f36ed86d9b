//! # Column Configuration
//!
//! Which priced columns a table or export shows, and under what label.
//! This is a projection only: hiding or relabeling a column never touches
//! any line item or pricing value, and a hidden column's values reappear
//! unchanged once it is shown again.
//!
//! Columns always render in the canonical order of [`ColumnKey::ALL`],
//! whatever order they were configured in.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::BoqError;

/// Priced column keys, declared in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKey {
    Unit,
    Qty,
    Waste,
    Material,
    Labor,
    Plant,
    Rate,
    Amount,
}

impl ColumnKey {
    pub const ALL: [ColumnKey; 8] = [
        ColumnKey::Unit,
        ColumnKey::Qty,
        ColumnKey::Waste,
        ColumnKey::Material,
        ColumnKey::Labor,
        ColumnKey::Plant,
        ColumnKey::Rate,
        ColumnKey::Amount,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ColumnKey::Unit => "unit",
            ColumnKey::Qty => "qty",
            ColumnKey::Waste => "waste",
            ColumnKey::Material => "material",
            ColumnKey::Labor => "labor",
            ColumnKey::Plant => "plant",
            ColumnKey::Rate => "rate",
            ColumnKey::Amount => "amount",
        }
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for ColumnKey {
    type Err = BoqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ColumnKey::ALL
            .iter()
            .copied()
            .find(|key| key.key() == wanted)
            .ok_or_else(|| BoqError::invalid_input("column", s, "Unknown column key"))
    }
}

/// Label and visibility of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub label: String,
    pub visible: bool,
}

/// Column key -> label/visibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConfig {
    columns: BTreeMap<ColumnKey, ColumnSpec>,
}

impl ColumnConfig {
    fn from_labels(labels: [&str; 8], hidden: &[ColumnKey]) -> Self {
        let columns = ColumnKey::ALL
            .iter()
            .zip(labels)
            .map(|(key, label)| {
                (
                    *key,
                    ColumnSpec {
                        label: label.to_string(),
                        visible: !hidden.contains(key),
                    },
                )
            })
            .collect();
        ColumnConfig { columns }
    }

    /// Division schedule labels ("Unit", "Quantity", ... "Total Amount"); waste hidden.
    pub fn division_schedule() -> Self {
        ColumnConfig::from_labels(
            [
                "Unit",
                "Quantity",
                "Waste %",
                "Material Rate",
                "Labor Rate",
                "Plant Rate",
                "Total Rate",
                "Total Amount",
            ],
            &[ColumnKey::Waste],
        )
    }

    /// Flat quote labels ("UNIT", "QTY", ... "AMOUNT"); waste and plant hidden.
    pub fn flat_quote() -> Self {
        ColumnConfig::from_labels(
            ["UNIT", "QTY", "WASTE", "MATERIAL", "LABOR", "PLANT", "RATE", "AMOUNT"],
            &[ColumnKey::Waste, ColumnKey::Plant],
        )
    }

    fn spec_mut(&mut self, key: ColumnKey) -> &mut ColumnSpec {
        self.columns.entry(key).or_insert_with(|| ColumnSpec {
            label: key.key().to_string(),
            visible: true,
        })
    }

    pub fn set_visible(&mut self, key: ColumnKey, visible: bool) {
        self.spec_mut(key).visible = visible;
    }

    pub fn set_label(&mut self, key: ColumnKey, label: impl Into<String>) {
        self.spec_mut(key).label = label.into();
    }

    /// Missing entries count as visible
    pub fn is_visible(&self, key: ColumnKey) -> bool {
        self.columns.get(&key).map_or(true, |spec| spec.visible)
    }

    /// Missing entries fall back to the column key
    pub fn label(&self, key: ColumnKey) -> &str {
        self.columns.get(&key).map_or(key.key(), |spec| spec.label.as_str())
    }

    /// Visible columns in canonical order
    pub fn visible_columns(&self) -> Vec<ColumnKey> {
        ColumnKey::ALL
            .iter()
            .copied()
            .filter(|key| self.is_visible(*key))
            .collect()
    }
}

impl Default for ColumnConfig {
    fn default() -> Self {
        ColumnConfig::division_schedule()
    }
}
