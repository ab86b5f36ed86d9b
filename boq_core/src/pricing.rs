//! # Pricing Calculator
//!
//! Pure functions that derive rates, amounts and totals from a [`Project`]
//! snapshot. Nothing is cached: every call recomputes from current state,
//! and nothing computed here is ever written back into the model.
//!
//! ## Formulas
//!
//! ```text
//! effective_material = material_rate * (1 + waste_percent / 100)
//! rate               = effective_material + labor_rate + plant_rate
//! amount             = rate * quantity
//!
//! cost_base   = sum(amount) over every priced item
//! grand_total = cost_base * (1 + markup_percent / 100)   (markup mode)
//!             = cost_base * site_multiplier              (multiplier mode)
//! tax         = grand_total * tax_percent / 100
//! total_due   = grand_total + tax
//! ```
//!
//! ## Example
//!
//! ```rust
//! use boq_core::line_item::LineItem;
//! use boq_core::pricing::price_item;
//!
//! let item = LineItem::new(Default::default(), "01")
//!     .with_quantity("m³", 150.0)
//!     .with_rates(45000.0, 5000.0, 2000.0);
//!
//! let cost = price_item(&item).unwrap();
//! assert_eq!(cost.rate, 52000.0);
//! assert_eq!(cost.amount, 7_800_000.0);
//! ```

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::grouping::Grouping;
use crate::line_item::LineItem;
use crate::project::Project;

/// Label used for the multiplier row when none is configured
pub const DEFAULT_MULTIPLIER_LABEL: &str = "Site Multiplier";

fn default_multiplier_label() -> String {
    DEFAULT_MULTIPLIER_LABEL.to_string()
}

/// How the cost base is turned into the grand total.
///
/// ## JSON Format
///
/// ```json
/// { "mode": "Markup", "percent": 15.0 }
/// { "mode": "Multiplier", "factor": 1.25, "label": "Location Factor" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode")]
pub enum PricingMode {
    /// Additive percentage on top of the cost base
    Markup { percent: f64 },
    /// Multiplicative site/location factor
    Multiplier {
        factor: f64,
        #[serde(default = "default_multiplier_label")]
        label: String,
    },
}

impl Default for PricingMode {
    fn default() -> Self {
        PricingMode::Markup { percent: 0.0 }
    }
}

impl PricingMode {
    /// Multiplier mode with the default label
    pub fn multiplier(factor: f64) -> Self {
        PricingMode::Multiplier {
            factor,
            label: default_multiplier_label(),
        }
    }

    /// True when the grand total equals the cost base (0% / x1)
    pub fn is_identity(&self) -> bool {
        match self {
            PricingMode::Markup { percent } => *percent == 0.0,
            PricingMode::Multiplier { factor, .. } => *factor == 1.0,
        }
    }

    /// Grand total for a given cost base
    pub fn apply(&self, cost_base: f64) -> f64 {
        match self {
            PricingMode::Markup { percent } => cost_base * (1.0 + percent / 100.0),
            PricingMode::Multiplier { factor, .. } => cost_base * factor,
        }
    }

    /// Row label for the adjustment, e.g. "Markup (15%)" or "Site Multiplier (x1.25)"
    pub fn adjustment_label(&self) -> String {
        match self {
            PricingMode::Markup { percent } => format!("Markup ({}%)", percent),
            PricingMode::Multiplier { factor, label } => format!("{} (x{})", label, factor),
        }
    }
}

/// Derived per-unit and line values for a priced item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemCost {
    /// Material rate after waste inflation
    pub effective_material: f64,
    /// Per-unit rate: effective material + labor + plant
    pub rate: f64,
    /// rate * quantity
    pub amount: f64,
}

/// Price a single line item.
///
/// Returns `None` for section headers: they have no rate or amount (as
/// opposed to a zero one) and contribute nothing to any sum.
pub fn price_item(item: &LineItem) -> Option<ItemCost> {
    if !item.is_priced() {
        return None;
    }
    let effective_material = item.material_rate * (1.0 + item.waste_percent / 100.0);
    let rate = effective_material + item.labor_rate + item.plant_rate;
    Some(ItemCost {
        effective_material,
        rate,
        amount: rate * item.quantity,
    })
}

/// Amount an item contributes to sums (0 for section headers)
pub fn item_amount(item: &LineItem) -> f64 {
    price_item(item).map_or(0.0, |cost| cost.amount)
}

/// Sum of amounts over a sequence of items
pub fn sum_amounts<'a>(items: impl IntoIterator<Item = &'a LineItem>) -> f64 {
    items.into_iter().map(item_amount).sum()
}

/// Subtotal of one grouping. Ignores `collapsed`.
pub fn grouping_subtotal(grouping: &Grouping) -> f64 {
    sum_amounts(&grouping.items)
}

/// Direct cost base: every grouping subtotal plus every loose item.
///
/// `division_ref` on loose items only affects display grouping, never this sum.
pub fn cost_base(project: &Project) -> f64 {
    let grouped: f64 = project.groupings.iter().map(grouping_subtotal).sum();
    grouped + sum_amounts(&project.items)
}

/// Project-level totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    /// Sum of all line amounts
    pub cost_base: f64,
    /// grand_total - cost_base
    pub adjustment: f64,
    /// Cost base after markup or multiplier
    pub grand_total: f64,
    pub tax_percent: f64,
    pub tax: f64,
    /// grand_total + tax
    pub total_due: f64,
}

/// Compute project totals from the current snapshot.
pub fn compute_totals(project: &Project) -> Totals {
    let base = cost_base(project);
    let grand_total = project.settings.pricing.apply(base);
    let tax_percent = project.settings.tax_percent;
    let tax = grand_total * tax_percent / 100.0;
    trace!(cost_base = base, grand_total, tax, "recomputed project totals");
    Totals {
        cost_base: base,
        adjustment: grand_total - base,
        grand_total,
        tax_percent,
        tax,
        total_due: grand_total + tax,
    }
}

/// A line item alongside its derived values, for table renderers.
#[derive(Debug, Clone, Serialize)]
pub struct PricedLine<'a> {
    pub item: &'a LineItem,
    /// `None` for section headers
    pub cost: Option<ItemCost>,
}

impl<'a> PricedLine<'a> {
    pub fn new(item: &'a LineItem) -> Self {
        PricedLine {
            item,
            cost: price_item(item),
        }
    }
}

/// A grouping with its priced lines and subtotal.
#[derive(Debug, Clone, Serialize)]
pub struct PricedGroup<'a> {
    pub grouping: &'a Grouping,
    pub lines: Vec<PricedLine<'a>>,
    pub subtotal: f64,
}

/// The whole project priced for display.
#[derive(Debug, Clone, Serialize)]
pub struct PricedProject<'a> {
    pub groups: Vec<PricedGroup<'a>>,
    /// Loose (flat-list) items, in order
    pub loose: Vec<PricedLine<'a>>,
    pub totals: Totals,
}

impl<'a> PricedProject<'a> {
    /// Every priced line in export order: grouped lines first, then loose lines.
    pub fn lines(&self) -> impl Iterator<Item = (Option<&'a Grouping>, &PricedLine<'a>)> {
        self.groups
            .iter()
            .flat_map(|group| group.lines.iter().map(move |line| (Some(group.grouping), line)))
            .chain(self.loose.iter().map(|line| (None, line)))
    }
}

/// Price every line of the project in display order.
pub fn price_project(project: &Project) -> PricedProject<'_> {
    let groups = project
        .groupings
        .iter()
        .map(|grouping| PricedGroup {
            grouping,
            lines: grouping.items.iter().map(PricedLine::new).collect(),
            subtotal: grouping_subtotal(grouping),
        })
        .collect();
    PricedProject {
        groups,
        loose: project.items.iter().map(PricedLine::new).collect(),
        totals: compute_totals(project),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_item::{ItemKind, LineItem};
    use proptest::prelude::*;

    fn concrete() -> LineItem {
        LineItem::new(ItemKind::PricedItem, "3.1.1")
            .with_description("Grade 25 Concrete in Foundations")
            .with_quantity("m³", 150.0)
            .with_rates(45000.0, 5000.0, 2000.0)
    }

    fn blockwork() -> LineItem {
        LineItem::new(ItemKind::PricedItem, "4.1.1")
            .with_description("225mm Sandcrete Blockwork")
            .with_quantity("m²", 2500.0)
            .with_rates(850.0, 150.0, 0.0)
    }

    fn scenario_project(mode: PricingMode) -> Project {
        let mut project = Project::new("Duplex at Lekki", "Mr. Ade");
        let concrete_id = project.add_grouping("Concrete Works");
        let block_id = project.add_grouping("Blockwork");
        project.add_line(Some(concrete_id), concrete());
        project.add_line(Some(block_id), blockwork());
        project.settings.pricing = mode;
        project
    }

    #[test]
    fn test_item_rate_and_amount() {
        let cost = price_item(&concrete()).unwrap();
        assert_eq!(cost.rate, 52000.0);
        assert_eq!(cost.amount, 7_800_000.0);

        let cost = price_item(&blockwork()).unwrap();
        assert_eq!(cost.rate, 1000.0);
        assert_eq!(cost.amount, 2_500_000.0);
    }

    #[test]
    fn test_waste_applies_to_material_only() {
        let item = LineItem::new(ItemKind::PricedItem, "01")
            .with_quantity("m²", 10.0)
            .with_rates(100.0, 50.0, 20.0)
            .with_waste(10.0);
        let cost = price_item(&item).unwrap();
        assert!((cost.effective_material - 110.0).abs() < 1e-9);
        assert!((cost.rate - 180.0).abs() < 1e-9);
        assert!((cost.amount - 1800.0).abs() < 1e-9);
    }

    #[test]
    fn test_section_header_has_no_cost() {
        let header = LineItem::section_header("A", "Substructure").with_rates(1.0, 1.0, 1.0);
        assert!(price_item(&header).is_none());
        assert_eq!(item_amount(&header), 0.0);
    }

    #[test]
    fn test_negative_quantity_is_a_credit() {
        let credit = concrete().with_quantity("m³", -10.0);
        assert_eq!(item_amount(&credit), -520_000.0);
    }

    #[test]
    fn test_markup_scenario() {
        let project = scenario_project(PricingMode::Markup { percent: 15.0 });
        let totals = compute_totals(&project);
        assert_eq!(totals.cost_base, 10_300_000.0);
        assert!((totals.grand_total - 11_845_000.0).abs() < 0.01);
        assert!((totals.adjustment - 1_545_000.0).abs() < 0.01);
        assert_eq!(totals.tax, 0.0);
        assert_eq!(totals.total_due, totals.grand_total);
    }

    #[test]
    fn test_multiplier_scenario() {
        let project = scenario_project(PricingMode::multiplier(1.25));
        let totals = compute_totals(&project);
        assert_eq!(totals.grand_total, 12_875_000.0);
    }

    #[test]
    fn test_identity_modes() {
        assert!(PricingMode::default().is_identity());
        assert!(PricingMode::multiplier(1.0).is_identity());
        assert!(!PricingMode::Markup { percent: 5.0 }.is_identity());

        let project = scenario_project(PricingMode::multiplier(1.0));
        let totals = compute_totals(&project);
        assert_eq!(totals.grand_total, totals.cost_base);
    }

    #[test]
    fn test_tax_applies_after_grand_total() {
        let mut project = scenario_project(PricingMode::multiplier(2.0));
        project.settings.tax_percent = 10.0;
        let totals = compute_totals(&project);
        assert_eq!(totals.grand_total, 20_600_000.0);
        assert!((totals.tax - 2_060_000.0).abs() < 1e-6);
        assert!((totals.total_due - 22_660_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_loose_items_count_toward_cost_base() {
        let mut project = scenario_project(PricingMode::default());
        project.add_line(None, concrete().with_division("99"));
        assert_eq!(cost_base(&project), 18_100_000.0);
    }

    #[test]
    fn test_collapsed_grouping_still_counts() {
        let mut project = scenario_project(PricingMode::Markup { percent: 15.0 });
        let before = compute_totals(&project);
        let id = project.groupings[0].id;
        project.toggle_grouping(&id);
        assert!(project.groupings[0].collapsed);
        assert_eq!(compute_totals(&project), before);
    }

    #[test]
    fn test_adjustment_labels() {
        assert_eq!(PricingMode::Markup { percent: 15.0 }.adjustment_label(), "Markup (15%)");
        assert_eq!(PricingMode::multiplier(1.25).adjustment_label(), "Site Multiplier (x1.25)");
    }

    #[test]
    fn test_price_project_lines_in_export_order() {
        let mut project = scenario_project(PricingMode::default());
        project.add_item(None, ItemKind::SectionHeader);
        let priced = price_project(&project);
        let codes: Vec<_> = priced.lines().map(|(_, line)| line.item.code.as_str()).collect();
        assert_eq!(codes, vec!["3.1.1", "4.1.1", "01"]);
        assert_eq!(priced.groups[0].subtotal, 7_800_000.0);
        assert!(priced.loose[0].cost.is_none());
    }

    #[test]
    fn test_pricing_mode_json_shape() {
        let json = serde_json::to_string(&PricingMode::Markup { percent: 15.0 }).unwrap();
        assert_eq!(json, r#"{"mode":"Markup","percent":15.0}"#);
        let parsed: PricingMode = serde_json::from_str(r#"{"mode":"Multiplier","factor":1.1}"#).unwrap();
        assert_eq!(parsed, PricingMode::multiplier(1.1));
    }

    fn rate_strategy() -> impl Strategy<Value = f64> {
        (-10_000i32..10_000).prop_map(f64::from)
    }

    proptest! {
        #[test]
        fn prop_amount_matches_formula(
            material in -1.0e6f64..1.0e6,
            labor in -1.0e6f64..1.0e6,
            plant in -1.0e6f64..1.0e6,
            waste in -100.0f64..100.0,
            quantity in -1.0e4f64..1.0e4,
        ) {
            let item = LineItem::new(ItemKind::PricedItem, "01")
                .with_quantity("nr", quantity)
                .with_rates(material, labor, plant)
                .with_waste(waste);
            let expected = (material * (1.0 + waste / 100.0) + labor + plant) * quantity;
            prop_assert_eq!(item_amount(&item), expected);
        }

        #[test]
        fn prop_cost_base_is_order_and_placement_invariant(
            values in proptest::collection::vec((rate_strategy(), -100i32..100), 0..20),
            split in 0usize..20,
        ) {
            let items: Vec<LineItem> = values
                .iter()
                .map(|(rate, qty)| {
                    LineItem::new(ItemKind::PricedItem, "01")
                        .with_quantity("nr", f64::from(*qty))
                        .with_rates(*rate, 0.0, 0.0)
                })
                .collect();
            let expected: f64 = items.iter().map(item_amount).sum();

            let mut grouped = Project::new("Grouped", "");
            let first = grouped.add_grouping("A");
            let second = grouped.add_grouping("B");
            for (index, item) in items.iter().rev().enumerate() {
                let target = if index < split { first } else { second };
                grouped.add_line(Some(target), item.clone());
            }

            let mut flat = Project::new("Flat", "");
            flat.add_item(None, ItemKind::SectionHeader);
            for item in &items {
                flat.add_line(None, item.clone());
            }

            prop_assert_eq!(cost_base(&grouped), expected);
            prop_assert_eq!(cost_base(&flat), expected);
        }

        #[test]
        fn prop_grand_total_follows_mode(
            rate in rate_strategy(),
            qty in -100i32..100,
            percent in -50.0f64..200.0,
            factor in 0.0f64..5.0,
        ) {
            let mut project = Project::new("Props", "");
            project.add_line(
                None,
                LineItem::new(ItemKind::PricedItem, "01")
                    .with_quantity("nr", f64::from(qty))
                    .with_rates(rate, 0.0, 0.0),
            );
            let base = cost_base(&project);

            project.settings.pricing = PricingMode::Markup { percent };
            prop_assert_eq!(compute_totals(&project).grand_total, base * (1.0 + percent / 100.0));

            project.settings.pricing = PricingMode::multiplier(factor);
            prop_assert_eq!(compute_totals(&project).grand_total, base * factor);
        }
    }
}
