//! # Tabular Export
//!
//! Renders a priced project plus a [`ColumnConfig`] into delimited text.
//! Output is a pure function of its inputs: the same snapshot and
//! configuration always give byte-identical text.
//!
//! ## Row Layout
//!
//! ```text
//! header   identity columns + visible priced columns (canonical order)
//! lines    one per item; section headers fill only the identity columns
//! summary  Subtotal + adjustment rows      (only when markup != 0 / multiplier != 1)
//!          GRAND TOTAL                     (always)
//!          Tax + TOTAL DUE rows            (only when tax != 0)
//! ```
//!
//! Summary labels sit in the description column and values in the last
//! column. Numbers are plain 2-decimal text. Fields containing the
//! delimiter or a quote are quoted with internal quotes doubled.
//!
//! ## Example
//!
//! ```rust
//! use boq_core::columns::ColumnConfig;
//! use boq_core::export::{export_csv, export_filename, ExportLayout};
//! use boq_core::project::Project;
//!
//! let project = Project::new("Duplex at Lekki", "Mr. Ade");
//! let csv = export_csv(&project, &ColumnConfig::division_schedule(), ExportLayout::Grouped).unwrap();
//!
//! assert!(csv.starts_with("Division,Item Code,Description,Unit,Quantity,"));
//! assert_eq!(export_filename(&project.meta.title), "Duplex_at_Lekki.csv");
//! ```

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::columns::{ColumnConfig, ColumnKey};
use crate::errors::{BoqError, BoqResult};
use crate::format::format_export_number;
use crate::grouping::Grouping;
use crate::line_item::LineItem;
use crate::pricing::{price_project, PricedLine, PricingMode};
use crate::project::Project;

pub const SUBTOTAL_LABEL: &str = "Subtotal";
pub const GRAND_TOTAL_LABEL: &str = "GRAND TOTAL";
pub const TOTAL_DUE_LABEL: &str = "TOTAL DUE";

/// Identity columns that prefix every row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExportLayout {
    /// Division, Item Code, Description
    #[default]
    Grouped,
    /// S/N, Description
    Flat,
}

impl ExportLayout {
    pub fn identity_labels(&self) -> &'static [&'static str] {
        match self {
            ExportLayout::Grouped => &["Division", "Item Code", "Description"],
            ExportLayout::Flat => &["S/N", "Description"],
        }
    }

    /// Column preset matching this layout's observed header
    pub fn default_columns(&self) -> ColumnConfig {
        match self {
            ExportLayout::Grouped => ColumnConfig::division_schedule(),
            ExportLayout::Flat => ColumnConfig::flat_quote(),
        }
    }

    fn description_index(&self) -> usize {
        self.identity_labels().len() - 1
    }
}

impl fmt::Display for ExportLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportLayout::Grouped => write!(f, "grouped"),
            ExportLayout::Flat => write!(f, "flat"),
        }
    }
}

impl FromStr for ExportLayout {
    type Err = BoqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grouped" | "division" => Ok(ExportLayout::Grouped),
            "flat" | "quote" => Ok(ExportLayout::Flat),
            _ => Err(BoqError::invalid_input("layout", s, "Expected 'grouped' or 'flat'")),
        }
    }
}

/// Build every export row, header first.
pub fn export_rows(project: &Project, columns: &ColumnConfig, layout: ExportLayout) -> Vec<Vec<String>> {
    let visible = columns.visible_columns();
    let priced = price_project(project);

    let mut header: Vec<String> = layout.identity_labels().iter().map(|s| s.to_string()).collect();
    header.extend(visible.iter().map(|key| columns.label(*key).to_string()));
    let width = header.len();

    let mut rows = vec![header];
    for (grouping, line) in priced.lines() {
        let mut row = identity_cells(project, layout, grouping, line.item);
        row.extend(priced_cells(&visible, line));
        rows.push(row);
    }

    let totals = &priced.totals;
    let summary = SummaryRows {
        width,
        label_index: layout.description_index(),
    };
    let pricing = &project.settings.pricing;
    if !pricing.is_identity() {
        rows.push(summary.row(SUBTOTAL_LABEL, Some(totals.cost_base)));
        let adjustment = match pricing {
            PricingMode::Markup { .. } => Some(totals.adjustment),
            PricingMode::Multiplier { .. } => None,
        };
        rows.push(summary.row(&pricing.adjustment_label(), adjustment));
    }
    rows.push(summary.row(GRAND_TOTAL_LABEL, Some(totals.grand_total)));
    if totals.tax_percent != 0.0 {
        rows.push(summary.row(&format!("Tax ({}%)", totals.tax_percent), Some(totals.tax)));
        rows.push(summary.row(TOTAL_DUE_LABEL, Some(totals.total_due)));
    }
    rows
}

fn identity_cells(project: &Project, layout: ExportLayout, grouping: Option<&Grouping>, item: &LineItem) -> Vec<String> {
    match layout {
        ExportLayout::Grouped => {
            let division = match grouping {
                Some(g) => g.name.clone(),
                None => item
                    .division_ref
                    .as_deref()
                    .map(|code| project.grouping_by_code(code).map_or(code, |g| g.name.as_str()))
                    .unwrap_or_default()
                    .to_string(),
            };
            vec![division, item.code.clone(), item.description.clone()]
        }
        ExportLayout::Flat => vec![item.code.clone(), item.description.clone()],
    }
}

fn priced_cells(visible: &[ColumnKey], line: &PricedLine<'_>) -> Vec<String> {
    let Some(cost) = line.cost else {
        return vec![String::new(); visible.len()];
    };
    let item = line.item;
    visible
        .iter()
        .map(|key| match key {
            ColumnKey::Unit => item.unit.clone(),
            ColumnKey::Qty => format_export_number(item.quantity),
            ColumnKey::Waste => format_export_number(item.waste_percent),
            ColumnKey::Material => format_export_number(item.material_rate),
            ColumnKey::Labor => format_export_number(item.labor_rate),
            ColumnKey::Plant => format_export_number(item.plant_rate),
            ColumnKey::Rate => format_export_number(cost.rate),
            ColumnKey::Amount => format_export_number(cost.amount),
        })
        .collect()
}

struct SummaryRows {
    width: usize,
    label_index: usize,
}

impl SummaryRows {
    fn row(&self, label: &str, value: Option<f64>) -> Vec<String> {
        let mut row = vec![String::new(); self.width];
        row[self.label_index] = label.to_string();
        if let Some(value) = value {
            let text = format_export_number(value);
            if self.width - 1 > self.label_index {
                row[self.width - 1] = text;
            } else {
                row.push(text);
            }
        }
        row
    }
}

/// Write export rows as CSV to `writer`.
pub fn write_csv<W: Write>(writer: W, project: &Project, columns: &ColumnConfig, layout: ExportLayout) -> BoqResult<()> {
    let rows = export_rows(project, columns, layout);
    let mut csv_writer = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(writer);
    for row in &rows {
        csv_writer.write_record(row)?;
    }
    csv_writer.flush().map_err(|e| BoqError::export(e.to_string()))?;
    info!(
        project_id = %project.id(),
        rows = rows.len(),
        %layout,
        "exported project"
    );
    Ok(())
}

/// Render the export as a CSV string.
pub fn export_csv(project: &Project, columns: &ColumnConfig, layout: ExportLayout) -> BoqResult<String> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, project, columns, layout)?;
    String::from_utf8(buffer).map_err(|e| BoqError::Internal {
        message: format!("CSV output was not UTF-8: {}", e),
    })
}

/// Export file name: title with whitespace runs replaced by `_`, plus `.csv`.
pub fn export_filename(title: &str) -> String {
    let mut name = String::with_capacity(title.len() + 4);
    let mut in_whitespace = false;
    for ch in title.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                name.push('_');
            }
            in_whitespace = true;
        } else {
            name.push(ch);
            in_whitespace = false;
        }
    }
    if name.is_empty() {
        name.push_str("estimate");
    }
    name.push_str(".csv");
    name
}

/// Summary values recovered from exported CSV text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportedTotals {
    pub subtotal: Option<f64>,
    pub grand_total: Option<f64>,
    pub total_due: Option<f64>,
}

/// Read the summary rows back out of exported CSV text.
pub fn read_export_totals(text: &str) -> BoqResult<ExportedTotals> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut totals = ExportedTotals::default();
    for record in reader.records() {
        let record = record?;
        let label = record.iter().find(|cell| !cell.is_empty()).unwrap_or_default();
        let slot = match label {
            SUBTOTAL_LABEL => &mut totals.subtotal,
            GRAND_TOTAL_LABEL => &mut totals.grand_total,
            TOTAL_DUE_LABEL => &mut totals.total_due,
            _ => continue,
        };
        let raw = record.iter().last().unwrap_or_default();
        let value = raw
            .parse::<f64>()
            .map_err(|_| BoqError::invalid_input(label, raw, "Summary value is not a number"))?;
        *slot = Some(value);
    }
    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_item::{ItemField, ItemKind};
    use crate::pricing::compute_totals;

    fn scenario_project() -> Project {
        let mut project = Project::new("Duplex at Lekki", "Mr. Ade");
        let concrete = project.add_grouping("Concrete Works");
        let block = project.add_grouping("Blockwork");
        project.add_line(
            Some(concrete),
            LineItem::new(ItemKind::PricedItem, "3.1.1")
                .with_description("Grade 25 Concrete in Foundations")
                .with_quantity("m³", 150.0)
                .with_rates(45000.0, 5000.0, 2000.0),
        );
        project.add_line(
            Some(block),
            LineItem::new(ItemKind::PricedItem, "4.1.1")
                .with_description("225mm Sandcrete Blockwork")
                .with_quantity("m²", 2500.0)
                .with_rates(850.0, 150.0, 0.0),
        );
        project
    }

    fn grouped(project: &Project) -> String {
        export_csv(project, &ColumnConfig::division_schedule(), ExportLayout::Grouped).unwrap()
    }

    #[test]
    fn test_grouped_export_with_markup() {
        let mut project = scenario_project();
        project.set_markup_percent("15");
        let expected = "\
Division,Item Code,Description,Unit,Quantity,Material Rate,Labor Rate,Plant Rate,Total Rate,Total Amount
Concrete Works,3.1.1,Grade 25 Concrete in Foundations,m³,150.00,45000.00,5000.00,2000.00,52000.00,7800000.00
Blockwork,4.1.1,225mm Sandcrete Blockwork,m²,2500.00,850.00,150.00,0.00,1000.00,2500000.00
,,Subtotal,,,,,,,10300000.00
,,Markup (15%),,,,,,,1545000.00
,,GRAND TOTAL,,,,,,,11845000.00
";
        assert_eq!(grouped(&project), expected);
    }

    #[test]
    fn test_identity_pricing_emits_only_grand_total() {
        let project = scenario_project();
        let csv = grouped(&project);
        assert!(!csv.contains(SUBTOTAL_LABEL));
        assert!(csv.ends_with(",,GRAND TOTAL,,,,,,,10300000.00\n"));
    }

    #[test]
    fn test_flat_export_with_multiplier_and_section() {
        let mut project = Project::new("Kitchen Remodel", "");
        project.add_item(None, ItemKind::SectionHeader);
        let id = project.add_item(None, ItemKind::PricedItem).unwrap();
        project.update_field(&id, ItemField::Description, "Item description");
        project.set_site_multiplier("1.25");
        project.set_multiplier_label("Location Factor");

        let csv = export_csv(&project, &ColumnConfig::flat_quote(), ExportLayout::Flat).unwrap();
        let expected = "\
S/N,Description,UNIT,QTY,MATERIAL,LABOR,RATE,AMOUNT
01,New Section,,,,,,
02,Item description,Lot,1.00,0.00,0.00,0.00,0.00
,Subtotal,,,,,,0.00
,Location Factor (x1.25),,,,,,
,GRAND TOTAL,,,,,,0.00
";
        assert_eq!(csv, expected);
    }

    #[test]
    fn test_text_fields_are_escaped() {
        let mut project = Project::new("Escapes", "");
        let id = project.add_item(None, ItemKind::PricedItem).unwrap();
        project.update_field(&id, ItemField::Description, "Formwork, \"sawn\" timber");
        let csv = export_csv(&project, &ColumnConfig::flat_quote(), ExportLayout::Flat).unwrap();
        assert!(csv.contains("01,\"Formwork, \"\"sawn\"\" timber\",Lot,"));
    }

    #[test]
    fn test_hidden_columns_are_omitted_but_values_kept() {
        let mut project = scenario_project();
        let mut columns = ColumnConfig::division_schedule();
        columns.set_visible(ColumnKey::Material, false);
        columns.set_visible(ColumnKey::Labor, false);
        columns.set_visible(ColumnKey::Plant, false);
        let before = compute_totals(&project);

        let csv = export_csv(&project, &columns, ExportLayout::Grouped).unwrap();
        let header = csv.lines().next().unwrap();
        assert_eq!(header, "Division,Item Code,Description,Unit,Quantity,Total Rate,Total Amount");
        assert_eq!(compute_totals(&project), before);

        columns.set_visible(ColumnKey::Material, true);
        let csv = export_csv(&project, &columns, ExportLayout::Grouped).unwrap();
        assert!(csv.contains(",45000.00,"));

        let first = project.groupings[0].id;
        project.toggle_grouping(&first);
        assert_eq!(compute_totals(&project), before);
    }

    #[test]
    fn test_summary_value_appended_when_no_priced_columns() {
        let mut project = scenario_project();
        project.set_markup_percent("10");
        let mut columns = ColumnConfig::division_schedule();
        for key in ColumnKey::ALL {
            columns.set_visible(key, false);
        }
        let csv = export_csv(&project, &columns, ExportLayout::Grouped).unwrap();
        assert!(csv.contains("\n,,GRAND TOTAL,11330000.00\n"));
    }

    #[test]
    fn test_loose_items_resolve_division_names() {
        let mut project = scenario_project();
        let id = project.add_item(None, ItemKind::PricedItem).unwrap();
        project.update_field(&id, ItemField::DivisionRef, "02");
        let other = project.add_item(None, ItemKind::PricedItem).unwrap();
        project.update_field(&other, ItemField::DivisionRef, "XX");

        let csv = grouped(&project);
        assert!(csv.contains("\nBlockwork,01,,Lot,"));
        assert!(csv.contains("\nXX,02,,Lot,"));
    }

    #[test]
    fn test_empty_project_still_exports() {
        let mut project = Project::new("Empty", "");
        project.set_tax_percent("7.5");
        project.set_markup_percent("20");
        let csv = grouped(&project);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[5], ",,TOTAL DUE,,,,,,,0.00");
    }

    #[test]
    fn test_export_is_deterministic_and_reparses() {
        let mut project = scenario_project();
        project.set_markup_percent("15");
        project.set_tax_percent("7.5");
        let first = grouped(&project);
        let second = grouped(&project);
        assert_eq!(first, second);

        let totals = compute_totals(&project);
        let parsed = read_export_totals(&first).unwrap();
        assert!((parsed.subtotal.unwrap() - totals.cost_base).abs() < 0.005);
        assert!((parsed.grand_total.unwrap() - totals.grand_total).abs() < 0.005);
        assert!((parsed.total_due.unwrap() - totals.total_due).abs() < 0.005);
    }

    #[test]
    fn test_export_filename() {
        assert_eq!(export_filename("Duplex at  Lekki"), "Duplex_at_Lekki.csv");
        assert_eq!(export_filename("Office\tFit-out"), "Office_Fit-out.csv");
        assert_eq!(export_filename(""), "estimate.csv");
    }

    #[test]
    fn test_layout_parsing() {
        assert_eq!("Flat".parse::<ExportLayout>().unwrap(), ExportLayout::Flat);
        assert!("pivot".parse::<ExportLayout>().is_err());
        assert_eq!(ExportLayout::Grouped.to_string(), "grouped");
    }
}
