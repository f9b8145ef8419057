use crate::serializable_struct_with_getters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// Solution child structs
serializable_struct_with_getters! {
    Pack {
        rule: usize,
        items: BTreeMap<usize, u32>,
    }
}
serializable_struct_with_getters! {
    Solution {
        packs: Vec<Pack>,
    }
}

impl Solution {
    pub fn new() -> Self {
        Self { packs: Vec::new() }
    }

    pub fn num_packs(&self) -> usize {
        self.packs.len()
    }

    /// Sum of every pack, keyed by item id.
    pub fn totals(&self) -> BTreeMap<usize, u64> {
        let mut totals = BTreeMap::new();
        for pack in self.packs.iter() {
            for (&id, &count) in pack.items.iter() {
                *totals.entry(id).or_insert(0u64) += count as u64;
            }
        }
        totals
    }
}

impl Default for Solution {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Solved,
    Infeasible,
    Aborted,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Enumeration,
    Search,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Enumeration => write!(f, "enumeration"),
            Stage::Search => write!(f, "search"),
        }
    }
}

// Runtime output
serializable_struct_with_getters! {
    OutputData {
        status: Status,
        solution: Option<Solution>,
        aborted_stage: Option<Stage>,
        num_edges: usize,
        steps: u64,
        elapsed_ms: u64,
    }
}
