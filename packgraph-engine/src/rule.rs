use crate::{
    budget::Budget,
    catalog::Catalog,
    constraint::{ConstraintKind, LinearConstraint},
    instance::{ConstraintTemplate, Item, RuleSpec},
    state::State,
};
use anyhow::Result;
use packgraph_structs::config::EnumerationScope;
use std::{collections::BTreeSet, time::Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enumeration {
    Complete { edges: usize },
    Aborted,
}

/// A set of categories plus the limits a single pack drawn from them must respect.
///
/// `compile` turns the limits into [`LinearConstraint`]s over a catalog, `enumerate_edges` then
/// collects every maximal pack those constraints allow.
#[derive(Debug, Clone)]
pub struct PackRule {
    categories: BTreeSet<usize>,
    weight_templates: Vec<ConstraintTemplate>,
    price_templates: Vec<ConstraintTemplate>,
    count_templates: Vec<ConstraintTemplate>,
    scope: EnumerationScope,
    participants: Vec<usize>,
    constraints: Vec<LinearConstraint>,
    edges: BTreeSet<State>,
}

impl PackRule {
    pub fn new(spec: &RuleSpec) -> Self {
        Self {
            categories: spec.categories.clone(),
            weight_templates: spec.weight_rules.clone(),
            price_templates: spec.price_rules.clone(),
            count_templates: spec.count_rules.clone(),
            scope: EnumerationScope::default(),
            participants: Vec::new(),
            constraints: Vec::new(),
            edges: BTreeSet::new(),
        }
    }

    pub fn with_scope(mut self, scope: EnumerationScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn categories(&self) -> &BTreeSet<usize> {
        &self.categories
    }

    pub fn scope(&self) -> EnumerationScope {
        self.scope
    }

    /// Catalog indices with a non-zero coefficient in some compiled constraint, ascending.
    pub fn participants(&self) -> &[usize] {
        &self.participants
    }

    pub fn participates(&self, index: usize) -> bool {
        self.participants.binary_search(&index).is_ok()
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn edges(&self) -> &BTreeSet<State> {
        &self.edges
    }

    pub fn compile(&mut self, catalog: &Catalog) -> Result<()> {
        self.constraints.clear();

        for index in catalog.indices_in(&self.categories) {
            let item = catalog.item(index);
            let mut availability =
                LinearConstraint::new(ConstraintKind::Availability, item.count as f64);
            availability.add_term(catalog, item.id, 1.0)?;
            self.constraints.push(availability);
        }
        for template in self.weight_templates.iter() {
            self.constraints.push(compile_template(
                catalog,
                ConstraintKind::Weight,
                template,
                |item| item.weight,
            )?);
        }
        for template in self.price_templates.iter() {
            self.constraints.push(compile_template(
                catalog,
                ConstraintKind::Price,
                template,
                |item| item.price,
            )?);
        }
        for template in self.count_templates.iter() {
            self.constraints.push(compile_template(
                catalog,
                ConstraintKind::Count,
                template,
                |_| 1.0,
            )?);
        }

        // A template subset may reach past the rule's own categories
        let participants: BTreeSet<usize> = self
            .constraints
            .iter()
            .flat_map(|c| c.terms().iter())
            .filter(|(_, coefficient)| *coefficient != 0.0)
            .map(|(index, _)| *index)
            .collect();
        self.participants = participants.into_iter().collect();

        log::debug!(
            "Rule {:?}: {} constraints over {} items",
            self.categories,
            self.constraints.len(),
            self.participants.len()
        );
        Ok(())
    }

    pub fn is_satisfied(&self, state: &State) -> bool {
        self.constraints.iter().all(|c| c.is_satisfied(state))
    }

    /// Satisfied, and no single enumerated item can be incremented without breaking a constraint.
    pub fn is_valid(&self, state: &State) -> bool {
        if !self.is_satisfied(state) {
            return false;
        }
        let mut scratch = state.clone();
        self.is_maximal(&mut scratch, &self.search_indices(state.len()))
    }

    /// Replaces the edge set with every valid pack. Idempotent.
    pub fn enumerate_edges(&mut self, catalog: &Catalog, budget: &Budget) -> Enumeration {
        self.edges.clear();
        let start = Instant::now();
        let indices = self.search_indices(catalog.len());
        let mut scratch = State::zeros(catalog.len());
        let mut edges = BTreeSet::new();
        let complete = self.search(catalog, &indices, 0, &mut scratch, &mut edges, budget);
        self.edges = edges;

        if !complete {
            log::warn!(
                "Rule {:?}: enumeration aborted with {} edges found",
                self.categories,
                self.edges.len()
            );
            return Enumeration::Aborted;
        }
        log::info!(
            "Rule {:?}: {} edges in {:.3} seconds",
            self.categories,
            self.edges.len(),
            start.elapsed().as_secs_f64()
        );
        Enumeration::Complete {
            edges: self.edges.len(),
        }
    }

    fn search_indices(&self, len: usize) -> Vec<usize> {
        match self.scope {
            EnumerationScope::RuleCategories => self.participants.clone(),
            EnumerationScope::FullCatalog => (0..len).collect(),
        }
    }

    fn is_maximal(&self, scratch: &mut State, indices: &[usize]) -> bool {
        for &index in indices.iter() {
            let count = scratch.get(index);
            scratch.set(index, count + 1);
            let still_satisfied = self.is_satisfied(scratch);
            scratch.set(index, count);
            if still_satisfied {
                return false;
            }
        }
        true
    }

    // Depth-first over `[0, count]` for each item in `indices`, largest count first. Returns
    // false if the budget ran out.
    fn search(
        &self,
        catalog: &Catalog,
        indices: &[usize],
        depth: usize,
        scratch: &mut State,
        edges: &mut BTreeSet<State>,
        budget: &Budget,
    ) -> bool {
        if !budget.tick() {
            return false;
        }
        if depth == indices.len() {
            if self.is_satisfied(scratch) && self.is_maximal(scratch, indices) {
                log::trace!("Add edge: {}", scratch);
                edges.insert(scratch.clone());
            }
            return true;
        }

        let index = indices[depth];
        for count in (0..=catalog.count(index)).rev() {
            scratch.set(index, count);
            // Items past `depth` are still zero and coefficients are non-negative, so a violated
            // prefix cannot be repaired deeper down.
            if !self.is_satisfied(scratch) {
                continue;
            }
            if !self.search(catalog, indices, depth + 1, scratch, edges, budget) {
                scratch.set(index, 0);
                return false;
            }
        }
        scratch.set(index, 0);
        true
    }
}

fn compile_template(
    catalog: &Catalog,
    kind: ConstraintKind,
    template: &ConstraintTemplate,
    coefficient: impl Fn(&Item) -> f64,
) -> Result<LinearConstraint> {
    let mut constraint = LinearConstraint::new(kind, template.bound);
    for item in catalog.items() {
        if template.subset.contains(&item.category) {
            constraint.add_term(catalog, item.id, coefficient(item))?;
        }
    }
    Ok(constraint)
}
