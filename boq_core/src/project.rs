//! # Project Data Structures
//!
//! The `Project` struct is the aggregate root of an estimate and the only
//! thing the ledger mutates. Projects serialize to `.boq` files as
//! human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! Project
//! ├── meta: ProjectMetadata (version, id, title, client, timestamps)
//! ├── settings: ProjectSettings (currency, pricing mode, tax, quote status)
//! ├── groupings: Vec<Grouping> (divisions, each owning its items)
//! └── items: Vec<LineItem> (loose flat-list items, optionally tagged with a division code)
//! ```
//!
//! ## Editing
//!
//! Every edit is a discrete command on `&mut Project`. None of them fail:
//! numeric input is coerced (see [`crate::line_item::coerce_number`]) and
//! commands naming an unknown id are no-ops that leave the project,
//! including its modified timestamp, untouched.
//!
//! ## Example
//!
//! ```rust
//! use boq_core::line_item::{ItemField, ItemKind};
//! use boq_core::project::Project;
//!
//! let mut project = Project::new("Duplex at Lekki", "Mr. Ade");
//! let concrete = project.add_grouping("Concrete Works");
//! let item = project.add_item(Some(concrete), ItemKind::PricedItem).unwrap();
//!
//! project.update_field(&item, ItemField::Quantity, "150");
//! project.update_field(&item, ItemField::MaterialRate, "45000");
//! project.set_markup_percent("15");
//!
//! let json = serde_json::to_string_pretty(&project).unwrap();
//! assert!(json.contains("Concrete Works"));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::catalog::CatalogEntry;
use crate::grouping::Grouping;
use crate::history::QuoteStatus;
use crate::line_item::{coerce_number, sequential_code, ItemField, ItemKind, LineItem};
use crate::master::Division;
use crate::pricing::PricingMode;

/// Current schema version for .boq files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Currency symbol used when a project does not set one
pub const DEFAULT_CURRENCY_SYMBOL: &str = "₦";

/// Root project container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub meta: ProjectMetadata,

    pub settings: ProjectSettings,

    /// Divisions in display order
    #[serde(default)]
    pub groupings: Vec<Grouping>,

    /// Loose items in display order (flat-list estimates)
    #[serde(default)]
    pub items: Vec<LineItem>,
}

impl Project {
    /// Create a new empty project.
    ///
    /// # Example
    ///
    /// ```rust
    /// use boq_core::project::Project;
    ///
    /// let project = Project::new("Office Fit-out", "Acme Ltd");
    /// assert_eq!(project.meta.client_name, "Acme Ltd");
    /// assert!(project.settings.pricing.is_identity());
    /// ```
    pub fn new(title: impl Into<String>, client_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Project {
            meta: ProjectMetadata {
                version: SCHEMA_VERSION.to_string(),
                id: Uuid::new_v4(),
                title: title.into(),
                client_name: client_name.into(),
                created: now,
                modified: now,
            },
            settings: ProjectSettings::default(),
            groupings: Vec::new(),
            items: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.meta.id
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    // ------------------------------------------------------------------
    // Groupings
    // ------------------------------------------------------------------

    /// Append a grouping coded from the current grouping count.
    ///
    /// Returns the id assigned to the grouping.
    pub fn add_grouping(&mut self, name: impl Into<String>) -> Uuid {
        let grouping = Grouping::new(sequential_code(self.groupings.len()), name);
        self.push_grouping(grouping)
    }

    /// Append a grouping carrying a division's code and name from the taxonomy.
    pub fn add_division(&mut self, division: &Division) -> Uuid {
        self.push_grouping(Grouping::new(division.code.clone(), division.name.clone()))
    }

    fn push_grouping(&mut self, grouping: Grouping) -> Uuid {
        let id = grouping.id;
        debug!(grouping_id = %id, code = %grouping.code, name = %grouping.name, "added grouping");
        self.groupings.push(grouping);
        self.touch();
        id
    }

    /// Remove a grouping and every item it owns.
    ///
    /// Returns the removed grouping if it existed.
    pub fn delete_grouping(&mut self, id: &Uuid) -> Option<Grouping> {
        let Some(index) = self.groupings.iter().position(|g| g.id == *id) else {
            warn!(grouping_id = %id, "delete ignored: unknown grouping");
            return None;
        };
        let removed = self.groupings.remove(index);
        debug!(grouping_id = %id, items = removed.items.len(), "deleted grouping");
        self.touch();
        Some(removed)
    }

    /// Flip a grouping's collapsed flag. Returns the new state, or `None`
    /// if the id is unknown.
    pub fn toggle_grouping(&mut self, id: &Uuid) -> Option<bool> {
        let Some(grouping) = self.groupings.iter_mut().find(|g| g.id == *id) else {
            warn!(grouping_id = %id, "toggle ignored: unknown grouping");
            return None;
        };
        let collapsed = grouping.toggle();
        debug!(grouping_id = %id, collapsed, "toggled grouping");
        self.touch();
        Some(collapsed)
    }

    pub fn grouping(&self, id: &Uuid) -> Option<&Grouping> {
        self.groupings.iter().find(|g| g.id == *id)
    }

    /// First grouping with this code
    pub fn grouping_by_code(&self, code: &str) -> Option<&Grouping> {
        self.groupings.iter().find(|g| g.code == code)
    }

    // ------------------------------------------------------------------
    // Line items
    // ------------------------------------------------------------------

    /// Add a default item of `kind` to a grouping, or to the loose list when
    /// `grouping_id` is `None`.
    ///
    /// The item's code is derived from the number of items already in that
    /// scope and is never renumbered. Returns `None` (and changes nothing)
    /// when the grouping does not exist.
    pub fn add_item(&mut self, grouping_id: Option<Uuid>, kind: ItemKind) -> Option<Uuid> {
        let code = sequential_code(self.scope_len(grouping_id)?);
        self.add_line(grouping_id, LineItem::new(kind, code))
    }

    /// Add a pre-filled item from the catalog, coded like [`Project::add_item`].
    ///
    /// The entry's values are copied; later catalog changes do not affect the item.
    pub fn add_from_catalog(&mut self, grouping_id: Option<Uuid>, entry: &CatalogEntry) -> Option<Uuid> {
        let code = sequential_code(self.scope_len(grouping_id)?);
        self.add_line(grouping_id, entry.to_line_item(code))
    }

    /// Append an already-built item as-is. Returns `None` when the grouping
    /// does not exist or an item with the same id is already in the project.
    pub fn add_line(&mut self, grouping_id: Option<Uuid>, item: LineItem) -> Option<Uuid> {
        let id = item.id;
        let kind = item.kind;
        if self.find_item(&id).is_some() {
            warn!(item_id = %id, "add ignored: duplicate line item id");
            return None;
        }
        match grouping_id {
            Some(gid) => {
                let Some(grouping) = self.groupings.iter_mut().find(|g| g.id == gid) else {
                    warn!(grouping_id = %gid, "add ignored: unknown grouping");
                    return None;
                };
                grouping.items.push(item);
            }
            None => self.items.push(item),
        }
        debug!(item_id = %id, kind = kind.display_name(), "added line item");
        self.touch();
        Some(id)
    }

    fn scope_len(&self, grouping_id: Option<Uuid>) -> Option<usize> {
        match grouping_id {
            Some(gid) => self.grouping(&gid).map(Grouping::item_count),
            None => Some(self.items.len()),
        }
    }

    /// Apply a raw edit to one field of an item.
    ///
    /// Returns `false` (a no-op) when the item does not exist.
    pub fn update_field(&mut self, item_id: &Uuid, field: ItemField, raw_value: &str) -> bool {
        let Some(item) = self.find_item_mut(item_id) else {
            warn!(item_id = %item_id, %field, "update ignored: unknown line item");
            return false;
        };
        item.apply(field, raw_value);
        debug!(item_id = %item_id, %field, raw_value, "updated line item field");
        self.touch();
        true
    }

    /// Remove an item from whichever grouping (or the loose list) holds it.
    pub fn delete_item(&mut self, item_id: &Uuid) -> Option<LineItem> {
        let removed = self
            .groupings
            .iter_mut()
            .find_map(|g| g.remove_item(item_id))
            .or_else(|| {
                let index = self.items.iter().position(|item| item.id == *item_id)?;
                Some(self.items.remove(index))
            });
        match &removed {
            Some(_) => {
                debug!(item_id = %item_id, "deleted line item");
                self.touch();
            }
            None => warn!(item_id = %item_id, "delete ignored: unknown line item"),
        }
        removed
    }

    pub fn find_item(&self, item_id: &Uuid) -> Option<&LineItem> {
        self.groupings
            .iter()
            .find_map(|g| g.find_item(item_id))
            .or_else(|| self.items.iter().find(|item| item.id == *item_id))
    }

    fn find_item_mut(&mut self, item_id: &Uuid) -> Option<&mut LineItem> {
        if let Some(item) = self.groupings.iter_mut().find_map(|g| g.find_item_mut(item_id)) {
            return Some(item);
        }
        self.items.iter_mut().find(|item| item.id == *item_id)
    }

    /// Every item in display order: grouped items first, then loose items.
    pub fn all_items(&self) -> impl Iterator<Item = &LineItem> {
        self.groupings
            .iter()
            .flat_map(|g| g.items.iter())
            .chain(self.items.iter())
    }

    // ------------------------------------------------------------------
    // Project fields and pricing parameters
    // ------------------------------------------------------------------

    pub fn set_title(&mut self, title: &str) {
        self.meta.title = title.to_string();
        self.touch();
    }

    pub fn set_client_name(&mut self, client_name: &str) {
        self.meta.client_name = client_name.to_string();
        self.touch();
    }

    pub fn set_currency_symbol(&mut self, symbol: &str) {
        self.settings.currency_symbol = symbol.to_string();
        self.touch();
    }

    /// Switch to markup mode with a coerced percentage.
    pub fn set_markup_percent(&mut self, raw_value: &str) {
        let percent = coerce_number(raw_value);
        self.settings.pricing = PricingMode::Markup { percent };
        debug!(percent, "set markup percent");
        self.touch();
    }

    /// Switch to multiplier mode with a coerced factor, keeping any existing label.
    pub fn set_site_multiplier(&mut self, raw_value: &str) {
        let factor = coerce_number(raw_value);
        let label = match &self.settings.pricing {
            PricingMode::Multiplier { label, .. } => label.clone(),
            PricingMode::Markup { .. } => crate::pricing::DEFAULT_MULTIPLIER_LABEL.to_string(),
        };
        self.settings.pricing = PricingMode::Multiplier { factor, label };
        debug!(factor, "set site multiplier");
        self.touch();
    }

    /// Rename the multiplier row.
    ///
    /// Returns `false` (a no-op) in markup mode, which has no label.
    pub fn set_multiplier_label(&mut self, text: &str) -> bool {
        let PricingMode::Multiplier { label, .. } = &mut self.settings.pricing else {
            warn!(label = text, "label ignored: project is in markup mode");
            return false;
        };
        *label = text.to_string();
        self.touch();
        true
    }

    pub fn set_tax_percent(&mut self, raw_value: &str) {
        self.settings.tax_percent = coerce_number(raw_value);
        self.touch();
    }

    pub fn set_status(&mut self, status: QuoteStatus) {
        debug!(%status, "set quote status");
        self.settings.status = status;
        self.touch();
    }
}

impl Default for Project {
    fn default() -> Self {
        Project::new("", "")
    }
}

/// Project metadata stored in the file header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    pub id: Uuid,

    /// Project title; also names the CSV export
    pub title: String,

    pub client_name: String,

    pub created: DateTime<Utc>,

    pub modified: DateTime<Utc>,
}

/// Per-project pricing and display settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSettings {
    /// Symbol used for on-screen currency (not used in export)
    pub currency_symbol: String,

    /// Markup or multiplier aggregation
    #[serde(default)]
    pub pricing: PricingMode,

    /// Flat tax on the grand total
    #[serde(default)]
    pub tax_percent: f64,

    /// Whether the quote has gone out to the client
    #[serde(default)]
    pub status: QuoteStatus,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        ProjectSettings {
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
            pricing: PricingMode::default(),
            tax_percent: 0.0,
            status: QuoteStatus::Draft,
        }
    }
}
