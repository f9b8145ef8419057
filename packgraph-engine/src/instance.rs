use crate::{catalog::Catalog, rule::PackRule, state::State};
use anyhow::{anyhow, Result};
use packgraph_structs::core::Solution;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Item {
    pub id: usize,
    #[serde(rename = "cid", alias = "category")]
    pub category: usize,
    #[serde(rename = "num", alias = "count")]
    pub count: u32,
    #[serde(rename = "w", alias = "weight")]
    pub weight: f64,
    #[serde(rename = "p", alias = "price")]
    pub price: f64,
}

/// A limit on the weighted sum of the items whose category is in `subset`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConstraintTemplate {
    #[serde(rename = "subcids", alias = "subset")]
    pub subset: BTreeSet<usize>,
    #[serde(alias = "W", alias = "P", alias = "N")]
    pub bound: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RuleSpec {
    #[serde(rename = "cids", alias = "categories")]
    pub categories: BTreeSet<usize>,
    #[serde(rename = "Ws", alias = "weight_rules", default)]
    pub weight_rules: Vec<ConstraintTemplate>,
    #[serde(rename = "Ps", alias = "price_rules", default)]
    pub price_rules: Vec<ConstraintTemplate>,
    #[serde(rename = "Ns", alias = "count_rules", default)]
    pub count_rules: Vec<ConstraintTemplate>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Track {
    pub num_items: usize,
    pub num_categories: usize,
    pub max_count: u32,
    pub num_rules: usize,
}

impl Default for Track {
    fn default() -> Self {
        Self {
            num_items: 6,
            num_categories: 3,
            max_count: 3,
            num_rules: 3,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Instance {
    pub items: Vec<Item>,
    #[serde(rename = "pack-rules", alias = "pack_rules", default)]
    pub pack_rules: Vec<RuleSpec>,
}

impl Instance {
    pub fn generate_instance(seed: &[u8; 32], track: &Track) -> Result<Self> {
        if track.num_categories == 0 {
            return Err(anyhow!("num_categories must be at least 1"));
        }
        let mut rng = SmallRng::from_seed(seed.clone());
        let all_categories: BTreeSet<usize> = (0..track.num_categories).collect();

        // Weights and prices in [0.5, 5.0] with one decimal
        let items: Vec<Item> = (0..track.num_items)
            .map(|id| Item {
                id,
                category: rng.gen_range(0..track.num_categories),
                count: rng.gen_range(0..=track.max_count),
                weight: rng.gen_range(5..=50) as f64 / 10.0,
                price: rng.gen_range(5..=50) as f64 / 10.0,
            })
            .collect();

        let mut pack_rules = Vec::with_capacity(track.num_rules + 1);
        for _ in 0..track.num_rules {
            let mut categories: BTreeSet<usize> = all_categories
                .iter()
                .cloned()
                .filter(|_| rng.gen_bool(0.5))
                .collect();
            if categories.is_empty() {
                categories.insert(rng.gen_range(0..track.num_categories));
            }
            let weight_rules = if rng.gen_bool(0.5) {
                vec![ConstraintTemplate {
                    subset: categories.clone(),
                    bound: rng.gen_range(20..=80) as f64 / 10.0,
                }]
            } else {
                Vec::new()
            };
            let count_rules = vec![ConstraintTemplate {
                subset: categories.clone(),
                bound: rng.gen_range(1..=3) as f64,
            }];
            pack_rules.push(RuleSpec {
                categories,
                weight_rules,
                price_rules: Vec::new(),
                count_rules,
            });
        }

        // One item per pack from any category, so every generated instance is feasible
        pack_rules.push(RuleSpec {
            categories: all_categories.clone(),
            weight_rules: Vec::new(),
            price_rules: Vec::new(),
            count_rules: vec![ConstraintTemplate {
                subset: all_categories,
                bound: 1.0,
            }],
        });

        Ok(Instance { items, pack_rules })
    }

    pub fn validate(&self) -> Result<()> {
        let mut ids = BTreeSet::new();
        for item in self.items.iter() {
            if !ids.insert(item.id) {
                return Err(anyhow!("Duplicate item id ({})", item.id));
            }
            if !item.weight.is_finite() || item.weight < 0.0 {
                return Err(anyhow!("Item ({}) has invalid weight {}", item.id, item.weight));
            }
            if !item.price.is_finite() || item.price < 0.0 {
                return Err(anyhow!("Item ({}) has invalid price {}", item.id, item.price));
            }
        }

        let categories: BTreeSet<usize> = self.items.iter().map(|item| item.category).collect();
        for (i, rule) in self.pack_rules.iter().enumerate() {
            for template in rule
                .weight_rules
                .iter()
                .chain(rule.price_rules.iter())
                .chain(rule.count_rules.iter())
            {
                if template.bound.is_nan() {
                    return Err(anyhow!("Rule {}: constraint bound is NaN", i));
                }
            }
            for category in rule.categories.difference(&categories) {
                log::warn!("Rule {}: no item has category {}", i, category);
            }
        }
        Ok(())
    }

    pub fn verify_solution(&self, solution: &Solution) -> Result<()> {
        self.validate()?;
        let catalog = Catalog::new(&self.items)?;
        let rules = self
            .pack_rules
            .iter()
            .map(|spec| {
                let mut rule = PackRule::new(spec);
                rule.compile(&catalog)?;
                Ok(rule)
            })
            .collect::<Result<Vec<_>>>()?;

        let source = catalog.source();
        let mut packed = State::zeros(catalog.len());
        for (i, pack) in solution.packs.iter().enumerate() {
            let rule = rules
                .get(pack.rule)
                .ok_or_else(|| anyhow!("Pack {}: rule ({}) does not exist", i, pack.rule))?;
            let contents = catalog
                .state_from_items(&pack.items)
                .map_err(|e| anyhow!("Pack {}: {}", i, e))?;
            if contents.is_zero() {
                return Err(anyhow!("Pack {} is empty", i));
            }
            if let Some(id) = pack
                .items
                .iter()
                .filter(|(_, count)| **count > 0)
                .map(|(&id, _)| id)
                .find(|&id| !catalog.index_of(id).is_ok_and(|index| rule.participates(index)))
            {
                return Err(anyhow!(
                    "Pack {}: item ({}) is not constrained by rule ({})",
                    i,
                    id,
                    pack.rule
                ));
            }
            if !rule.is_satisfied(&contents) {
                return Err(anyhow!(
                    "Pack {} violates the constraints of rule ({})",
                    i,
                    pack.rule
                ));
            }
            packed = packed.add(&contents);
            if !source.feasible(&packed) {
                return Err(anyhow!("Packs 0..={} exceed the available inventory", i));
            }
        }

        if packed != source {
            return Err(anyhow!(
                "Packs hold {} items but the inventory has {}",
                packed.total(),
                source.total()
            ));
        }
        Ok(())
    }
}
