//! # Grouping Rollup
//!
//! Subtotals and counts over the containment tree. Sums are order-invariant:
//! adding a priced item with amount `a` anywhere in a grouping raises that
//! grouping's subtotal, and the project cost base, by exactly `a`.
//!
//! Loose items tagged with a `division_ref` can be rolled up by division code
//! for display. That lookup never changes the cost base.

use uuid::Uuid;

use crate::line_item::LineItem;
use crate::pricing::{grouping_subtotal, sum_amounts};
use crate::project::Project;

/// Subtotal of one grouping, or `None` if the id is unknown.
pub fn subtotal_for(project: &Project, grouping_id: &Uuid) -> Option<f64> {
    project.grouping(grouping_id).map(grouping_subtotal)
}

/// Every line item in the project, section headers included.
pub fn total_item_count(project: &Project) -> usize {
    project.all_items().count()
}

/// Line items that contribute to totals
pub fn priced_item_count(project: &Project) -> usize {
    project.all_items().filter(|item| item.is_priced()).count()
}

fn tagged_code(item: &LineItem) -> Option<&str> {
    item.division_ref.as_deref().map(str::trim).filter(|code| !code.is_empty())
}

/// Distinct division codes tagged on loose items, in first-seen order.
pub fn division_codes(project: &Project) -> Vec<&str> {
    let mut codes: Vec<&str> = Vec::new();
    for code in project.items.iter().filter_map(tagged_code) {
        if !codes.contains(&code) {
            codes.push(code);
        }
    }
    codes
}

/// Loose items with no division tag (blank tags count as none).
pub fn untagged_items(project: &Project) -> Vec<&LineItem> {
    project.items.iter().filter(|item| tagged_code(item).is_none()).collect()
}

/// Loose items whose `division_ref` equals `code`, in display order.
pub fn division_items<'a>(project: &'a Project, code: &str) -> Vec<&'a LineItem> {
    project
        .items
        .iter()
        .filter(|item| tagged_code(item) == Some(code))
        .collect()
}

/// Sum of amounts of the loose items tagged with `code`.
pub fn division_subtotal(project: &Project, code: &str) -> f64 {
    sum_amounts(division_items(project, code))
}
