//! # Groupings
//!
//! A `Grouping` is a division/section of the estimate. It owns an ordered
//! list of line items; deleting the grouping deletes its items.
//!
//! `collapsed` is presentation state only. It is stored so a reopened file
//! shows the same folds, but nothing in [`crate::pricing`] reads it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::line_item::LineItem;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grouping {
    pub id: Uuid,

    /// Division code (e.g. "03")
    pub code: String,

    /// Display name (e.g. "Concrete Works")
    pub name: String,

    /// Owned items, in display order
    #[serde(default)]
    pub items: Vec<LineItem>,

    #[serde(default)]
    pub collapsed: bool,
}

impl Grouping {
    /// Create an empty, expanded grouping with a fresh id.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Grouping {
            id: Uuid::new_v4(),
            code: code.into(),
            name: name.into(),
            items: Vec::new(),
            collapsed: false,
        }
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Number of priced items (section headers excluded)
    pub fn priced_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_priced()).count()
    }

    pub fn find_item(&self, id: &Uuid) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == *id)
    }

    pub fn find_item_mut(&mut self, id: &Uuid) -> Option<&mut LineItem> {
        self.items.iter_mut().find(|item| item.id == *id)
    }

    /// Remove an item by id, preserving the order of the rest.
    pub fn remove_item(&mut self, id: &Uuid) -> Option<LineItem> {
        let index = self.items.iter().position(|item| item.id == *id)?;
        Some(self.items.remove(index))
    }

    /// Flip the collapsed flag and return the new state.
    pub fn toggle(&mut self) -> bool {
        self.collapsed = !self.collapsed;
        self.collapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_item::ItemKind;

    fn with_items(kinds: &[ItemKind]) -> Grouping {
        let mut grouping = Grouping::new("03", "Concrete Works");
        for (index, kind) in kinds.iter().enumerate() {
            grouping.items.push(LineItem::new(*kind, format!("{:02}", index + 1)));
        }
        grouping
    }

    #[test]
    fn test_priced_count_skips_headers() {
        let grouping = with_items(&[ItemKind::SectionHeader, ItemKind::PricedItem]);
        assert_eq!(grouping.item_count(), 2);
        assert_eq!(grouping.priced_count(), 1);
    }

    #[test]
    fn test_remove_item_keeps_order() {
        let mut grouping = with_items(&[ItemKind::PricedItem, ItemKind::PricedItem, ItemKind::PricedItem]);
        let middle = grouping.items[1].id;
        assert_eq!(grouping.remove_item(&middle).unwrap().code, "02");
        let codes: Vec<_> = grouping.items.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["01", "03"]);
        assert!(grouping.find_item(&middle).is_none());
    }

    #[test]
    fn test_remove_unknown_item_is_none() {
        let mut grouping = with_items(&[ItemKind::PricedItem]);
        assert!(grouping.remove_item(&Uuid::new_v4()).is_none());
        assert_eq!(grouping.item_count(), 1);
    }

    #[test]
    fn test_toggle() {
        let mut grouping = Grouping::new("01", "Preliminaries");
        assert!(grouping.toggle());
        assert!(!grouping.toggle());
    }
}
