//! Static menu definition and the per-item live view derived from it.

use std::collections::HashSet;

use shared::{
    domain::DishId,
    menu::{DEFAULT_DISH_CAPACITY, DEFAULT_MENU},
};
use thiserror::Error;

/// Number of most recent selectors shown next to a dish.
pub const RECENT_SELECTORS_SHOWN: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: DishId,
    pub name: String,
    pub capacity: u32,
}

impl CatalogEntry {
    pub fn new(id: i64, name: impl Into<String>, capacity: u32) -> Self {
        Self {
            id: DishId(id),
            name: name.into(),
            capacity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("dish '{name}' must have a positive capacity")]
    ZeroCapacity { name: String },
    #[error("dish id {0} appears more than once")]
    DuplicateId(DishId),
    #[error("dish name '{0}' appears more than once")]
    DuplicateName(String),
}

/// Live view of one dish.
///
/// `available` is computed from `confirmed_count` and `capacity` on every
/// read, so it can never disagree with its inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    id: DishId,
    name: String,
    capacity: u32,
    confirmed_count: u32,
    recent_selectors: Vec<String>,
}

impl MenuItem {
    fn from_entry(entry: &CatalogEntry) -> Self {
        Self {
            id: entry.id,
            name: entry.name.clone(),
            capacity: entry.capacity,
            confirmed_count: 0,
            recent_selectors: Vec::new(),
        }
    }

    pub fn id(&self) -> DishId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn confirmed_count(&self) -> u32 {
        self.confirmed_count
    }

    pub fn available(&self) -> bool {
        self.confirmed_count < self.capacity
    }

    pub fn remaining(&self) -> u32 {
        self.capacity.saturating_sub(self.confirmed_count)
    }

    pub fn recent_selectors(&self) -> &[String] {
        &self.recent_selectors
    }

    /// The last two selectors, oldest first, plus how many earlier ones are hidden.
    pub fn recent_selectors_display(&self) -> (Vec<&str>, usize) {
        let hidden = self
            .recent_selectors
            .len()
            .saturating_sub(RECENT_SELECTORS_SHOWN);
        let shown = self.recent_selectors[hidden..]
            .iter()
            .map(String::as_str)
            .collect();
        (shown, hidden)
    }

    pub(crate) fn with_confirmed_count(&self, confirmed_count: u32) -> Self {
        Self {
            confirmed_count,
            ..self.clone()
        }
    }

    pub(crate) fn record_selection(&mut self, selector: &str) {
        self.confirmed_count = self.confirmed_count.saturating_add(1);
        self.recent_selectors.push(selector.to_string());
    }
}

/// Immutable menu with a fixed capacity per dish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuCatalog {
    entries: Vec<CatalogEntry>,
}

impl MenuCatalog {
    /// Server counts are matched by name when no stable id is reported, so
    /// duplicate names are refused along with duplicate ids.
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, CatalogError> {
        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for entry in &entries {
            if entry.capacity == 0 {
                return Err(CatalogError::ZeroCapacity {
                    name: entry.name.clone(),
                });
            }
            if !ids.insert(entry.id) {
                return Err(CatalogError::DuplicateId(entry.id));
            }
            if !names.insert(entry.name.as_str()) {
                return Err(CatalogError::DuplicateName(entry.name.clone()));
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fresh items in menu order: nothing confirmed, every dish available.
    pub fn load(&self) -> Vec<MenuItem> {
        self.entries.iter().map(MenuItem::from_entry).collect()
    }
}

impl Default for MenuCatalog {
    fn default() -> Self {
        Self {
            entries: DEFAULT_MENU
                .iter()
                .map(|(id, name)| CatalogEntry::new(*id, *name, DEFAULT_DISH_CAPACITY))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_loads_fresh_items_in_order() {
        let items = MenuCatalog::default().load();
        assert_eq!(items.len(), 18);
        assert_eq!(items[1].name(), "Torresmo");
        assert_eq!(items[1].id(), DishId(2));
        for item in &items {
            assert_eq!(item.capacity(), 7);
            assert_eq!(item.confirmed_count(), 0);
            assert!(item.recent_selectors().is_empty());
            assert!(item.available());
        }
        assert_eq!(MenuCatalog::default().load(), items);
    }

    #[test]
    fn rejects_zero_capacity_and_duplicates() {
        assert_eq!(
            MenuCatalog::new(vec![CatalogEntry::new(1, "Kibe", 0)]),
            Err(CatalogError::ZeroCapacity {
                name: "Kibe".into()
            })
        );
        assert_eq!(
            MenuCatalog::new(vec![
                CatalogEntry::new(1, "Kibe", 3),
                CatalogEntry::new(1, "Caldos", 3),
            ]),
            Err(CatalogError::DuplicateId(DishId(1)))
        );
        assert_eq!(
            MenuCatalog::new(vec![
                CatalogEntry::new(1, "Kibe", 3),
                CatalogEntry::new(2, "Kibe", 3),
            ]),
            Err(CatalogError::DuplicateName("Kibe".into()))
        );
    }

    #[test]
    fn availability_follows_count() {
        let catalog = MenuCatalog::new(vec![CatalogEntry::new(1, "Kibe", 2)]).expect("catalog");
        let mut item = catalog.load().remove(0);
        item.record_selection("Ana");
        assert!(item.available());
        assert_eq!(item.remaining(), 1);
        item.record_selection("Bia");
        assert!(!item.available());
        assert_eq!(item.remaining(), 0);

        let over = item.with_confirmed_count(5);
        assert!(!over.available());
        assert_eq!(over.remaining(), 0);
        assert_eq!(over.recent_selectors(), item.recent_selectors());
    }

    #[test]
    fn shows_last_two_selectors_and_hidden_count() {
        let catalog = MenuCatalog::new(vec![CatalogEntry::new(1, "Kibe", 7)]).expect("catalog");
        let mut item = catalog.load().remove(0);
        assert_eq!(item.recent_selectors_display(), (Vec::<&str>::new(), 0));
        for name in ["Ana", "Bia", "Caio", "Duda"] {
            item.record_selection(name);
        }
        assert_eq!(item.recent_selectors_display(), (vec!["Caio", "Duda"], 2));
    }
}
