use crate::{instance::Item, state::State, HashMap};
use anyhow::{anyhow, Result};
use std::collections::{BTreeMap, BTreeSet};

/// The items of an instance, indexed by position. Positions are the coordinates of every
/// [`State`] built from this catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<Item>,
    index: HashMap<usize, usize>,
}

impl Catalog {
    pub fn new(items: &[Item]) -> Result<Self> {
        let mut index = HashMap::default();
        for (position, item) in items.iter().enumerate() {
            if index.insert(item.id, position).is_some() {
                return Err(anyhow!("Duplicate item id ({})", item.id));
            }
        }
        Ok(Self {
            items: items.to_vec(),
            index,
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item(&self, index: usize) -> &Item {
        &self.items[index]
    }

    pub fn count(&self, index: usize) -> u32 {
        self.items[index].count
    }

    pub fn index_of(&self, id: usize) -> Result<usize> {
        self.index
            .get(&id)
            .copied()
            .ok_or_else(|| anyhow!("Item ({}) is not in the catalog", id))
    }

    /// Positions of the items whose category is in `categories`, in catalog order.
    pub fn indices_in(&self, categories: &BTreeSet<usize>) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| categories.contains(&item.category))
            .map(|(index, _)| index)
            .collect()
    }

    /// Full inventory.
    pub fn source(&self) -> State {
        State::new(self.items.iter().map(|item| item.count).collect())
    }

    /// Empty inventory.
    pub fn target(&self) -> State {
        State::zeros(self.items.len())
    }

    /// Non-zero counts of `state` keyed by item id.
    pub fn pack_items(&self, state: &State) -> BTreeMap<usize, u32> {
        self.items
            .iter()
            .zip(state.counts())
            .filter(|(_, count)| **count > 0)
            .map(|(item, &count)| (item.id, count))
            .collect()
    }

    pub fn state_from_items(&self, items: &BTreeMap<usize, u32>) -> Result<State> {
        let mut state = State::zeros(self.items.len());
        for (&id, &count) in items.iter() {
            state.set(self.index_of(id)?, count);
        }
        Ok(state)
    }
}
