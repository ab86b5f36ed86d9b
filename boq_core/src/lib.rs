//! # boq_core - Construction Cost Estimation Ledger
//!
//! `boq_core` holds the bill-of-quantities model behind the `boq` tool: an
//! in-memory project of line items (optionally grouped into divisions),
//! deterministic pricing, and CSV export. All types are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Single mutable aggregate**: every edit is a command on [`Project`]
//! - **Derived, never stored**: rates, amounts, and totals are recomputed on read
//! - **Total edits**: bad numbers coerce to zero, unknown ids are no-ops
//! - **I/O at the edges**: only `file_io`, `store`, and `export` touch bytes
//!
//! ## Quick Start
//!
//! ```rust
//! use boq_core::columns::ColumnConfig;
//! use boq_core::export::{export_csv, ExportLayout};
//! use boq_core::line_item::{ItemField, ItemKind};
//! use boq_core::pricing::compute_totals;
//! use boq_core::project::Project;
//!
//! let mut project = Project::new("Duplex at Lekki", "Mr. Ade");
//! let concrete = project.add_grouping("Concrete Works");
//! let item = project.add_item(Some(concrete), ItemKind::PricedItem).unwrap();
//! project.update_field(&item, ItemField::Quantity, "150");
//! project.update_field(&item, ItemField::MaterialRate, "45000");
//! project.update_field(&item, ItemField::LaborRate, "5000");
//! project.update_field(&item, ItemField::PlantRate, "2000");
//!
//! assert_eq!(compute_totals(&project).grand_total, 7_800_000.0);
//!
//! let csv = export_csv(&project, &ColumnConfig::default(), ExportLayout::Grouped).unwrap();
//! assert!(csv.contains("GRAND TOTAL"));
//! ```
//!
//! ## Modules
//!
//! - [`project`] - Project aggregate and editing commands
//! - [`line_item`] / [`grouping`] - Items, section headers, and divisions
//! - [`pricing`] - Item cost, cost base, markup or multiplier, tax
//! - [`rollup`] - Per-division subtotals and counts
//! - [`columns`] / [`export`] / [`format`] - Column projection, CSV rows, number text
//! - [`catalog`] / [`master`] - Reference data (cost catalog, units, divisions)
//! - [`history`] - Dashboard summaries of saved quotes
//! - [`file_io`] / [`store`] - Atomic saves, locking, project stores
//! - [`errors`] - Structured error types

pub mod catalog;
pub mod columns;
pub mod errors;
pub mod export;
pub mod file_io;
pub mod format;
pub mod grouping;
pub mod history;
pub mod line_item;
pub mod master;
pub mod pricing;
pub mod project;
pub mod rollup;
pub mod store;

pub use errors::{BoqError, BoqResult};
pub use file_io::{load_project, save_project, FileLock};
pub use line_item::{ItemField, ItemKind, LineItem};
pub use pricing::{compute_totals, PricingMode, Totals};
pub use project::{Project, ProjectMetadata, ProjectSettings};
pub use store::{DirectoryStore, MemoryStore, ProjectStore};
