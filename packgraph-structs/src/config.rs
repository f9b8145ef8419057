use crate::serializable_struct_with_getters;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which items a rule enumerates candidate packs over.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EnumerationScope {
    /// Only items some constraint of the rule touches: its own categories plus the categories
    /// its weight, price and count subsets name.
    #[default]
    RuleCategories,
    /// Every item in the catalog. Maximality is then checked over every item as well, so a
    /// rule generates nothing while the catalog holds an item none of its constraints touch.
    FullCatalog,
}

serializable_struct_with_getters! {
    SolveConfig {
        max_steps: Option<u64>,
        time_limit_ms: Option<u64>,
        #[serde(default)]
        scope: EnumerationScope,
        #[serde(default = "default_parallel")]
        parallel: bool,
    }
}

fn default_parallel() -> bool {
    true
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            max_steps: None,
            time_limit_ms: None,
            scope: EnumerationScope::default(),
            parallel: default_parallel(),
        }
    }
}

impl SolveConfig {
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }
}
