//! # Master Reference Data
//!
//! Unit lists and the division taxonomy are supplied to the ledger as
//! read-only configuration. A standard set is built in; deployments can load
//! their own from JSON.
//!
//! ## JSON Format
//!
//! ```json
//! {
//!   "units": ["m", "m²", "m³", "nr"],
//!   "divisions": [
//!     { "code": "01", "name": "Preliminaries" },
//!     { "code": "03", "name": "Concrete Works" }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{BoqError, BoqResult};

/// An entry of the division taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Division {
    pub code: String,
    pub name: String,
}

impl Division {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Division {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// Ordered unit list and division taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterData {
    #[serde(default)]
    pub units: Vec<String>,
    #[serde(default)]
    pub divisions: Vec<Division>,
}

static STANDARD: Lazy<MasterData> = Lazy::new(|| MasterData {
    units: [
        "Lot", "Item", "nr", "m", "m²", "m³", "kg", "t", "hr", "day", "ea", "sheet", "bucket", "gal",
        "yd³",
    ]
    .iter()
    .map(|unit| unit.to_string())
    .collect(),
    divisions: vec![
        Division::new("01", "Preliminaries"),
        Division::new("02", "Substructure"),
        Division::new("03", "Concrete Works"),
        Division::new("04", "Blockwork"),
        Division::new("05", "Roofing"),
        Division::new("06", "Doors and Windows"),
        Division::new("07", "Finishes"),
        Division::new("08", "Electrical Installation"),
        Division::new("09", "Plumbing and Drainage"),
        Division::new("10", "External Works"),
    ],
});

impl MasterData {
    /// Built-in unit list and division taxonomy.
    pub fn standard() -> &'static MasterData {
        &STANDARD
    }

    pub fn from_json_str(json: &str) -> BoqResult<Self> {
        serde_json::from_str(json).map_err(|e| BoqError::serialization(format!("Invalid master data: {}", e)))
    }

    /// Exact, case-sensitive membership in the unit list
    pub fn is_known_unit(&self, unit: &str) -> bool {
        self.units.iter().any(|u| u == unit)
    }

    pub fn division(&self, code: &str) -> Option<&Division> {
        self.divisions.iter().find(|d| d.code == code)
    }
}

/// Load master data from a JSON file.
pub fn load_master_data(path: &Path) -> BoqResult<MasterData> {
    let contents = fs::read_to_string(path)
        .map_err(|e| BoqError::file_error("read", path.display().to_string(), e.to_string()))?;
    let data = MasterData::from_json_str(&contents)?;
    info!(
        path = %path.display(),
        units = data.units.len(),
        divisions = data.divisions.len(),
        "loaded master data"
    );
    Ok(data)
}
