use crate::{
    budget::Budget,
    catalog::Catalog,
    instance::Instance,
    rule::{Enumeration, PackRule},
    state::State,
    HashMap,
};
use anyhow::Result;
use packgraph_structs::{
    config::{EnumerationScope, SolveConfig},
    core::{OutputData, Pack, Solution, Stage, Status},
};
use rayon::prelude::*;
use std::{
    collections::{BTreeMap, VecDeque},
    time::{Duration, Instant},
};

#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    Packed(Solution),
    /// No sequence of packs empties the inventory.
    Infeasible,
    Aborted {
        stage: Stage,
        steps: u64,
    },
}

#[derive(Debug, Clone)]
pub struct SolveReport {
    pub outcome: SolveOutcome,
    pub num_edges: usize,
    pub steps: u64,
    pub elapsed: Duration,
}

impl SolveReport {
    pub fn to_output_data(&self) -> OutputData {
        let (status, solution, aborted_stage) = match &self.outcome {
            SolveOutcome::Packed(solution) => (Status::Solved, Some(solution.clone()), None),
            SolveOutcome::Infeasible => (Status::Infeasible, None, None),
            SolveOutcome::Aborted { stage, .. } => (Status::Aborted, None, Some(*stage)),
        };
        OutputData {
            status,
            solution,
            aborted_stage,
            num_edges: self.num_edges,
            steps: self.steps,
            elapsed_ms: self.elapsed.as_millis() as u64,
        }
    }
}

/// Every distinct non-empty pack generated by any rule. Nodes are implicit: each is the
/// inventory left after some sequence of packs.
#[derive(Debug, Clone)]
pub struct PackGraph<'a> {
    catalog: &'a Catalog,
    edges: Vec<State>,
    // Index of the first rule that generated each edge.
    origins: Vec<usize>,
}

impl<'a> PackGraph<'a> {
    pub fn new(catalog: &'a Catalog, rules: &[PackRule]) -> Self {
        let mut merged: BTreeMap<State, usize> = BTreeMap::new();
        for (rule_index, rule) in rules.iter().enumerate() {
            for edge in rule.edges().iter() {
                if edge.is_zero() {
                    log::debug!("Dropping empty pack generated by rule {}", rule_index);
                    continue;
                }
                merged.entry(edge.clone()).or_insert(rule_index);
            }
        }
        let (edges, origins) = merged.into_iter().unzip();
        Self {
            catalog,
            edges,
            origins,
        }
    }

    pub fn edges(&self) -> &[State] {
        &self.edges
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn source(&self) -> State {
        self.catalog.source()
    }

    pub fn target(&self) -> State {
        self.catalog.target()
    }

    pub fn pack(&self, edge_index: usize) -> Pack {
        Pack {
            rule: self.origins[edge_index],
            items: self.catalog.pack_items(&self.edges[edge_index]),
        }
    }

    /// Fewest packs taking the full inventory to empty.
    ///
    /// Every edge costs one and the frontier is FIFO, so the first distance recorded for a state
    /// is already its shortest; the relaxation check below never fires twice for a state and the
    /// search behaves as a plain breadth-first traversal. Edges strictly decrease the remaining
    /// total, so no state is revisited through a cycle.
    pub fn solve(&self, budget: &Budget) -> SolveOutcome {
        let source = self.source();
        let target = self.target();
        let mut distance: HashMap<State, usize> = HashMap::default();
        let mut predecessor: HashMap<State, (State, usize)> = HashMap::default();
        let mut frontier: VecDeque<State> = VecDeque::new();

        distance.insert(source.clone(), 0);
        frontier.push_back(source);

        while let Some(current) = frontier.pop_front() {
            if !budget.tick() {
                return SolveOutcome::Aborted {
                    stage: Stage::Search,
                    steps: budget.steps(),
                };
            }
            log::trace!("Reach status: {}", current);
            if current == target {
                return SolveOutcome::Packed(self.reconstruct(&predecessor, current));
            }

            let next_distance = distance[&current] + 1;
            for (edge_index, edge) in self.edges.iter().enumerate() {
                if !current.feasible(edge) {
                    continue;
                }
                let next = current.move_by(edge);
                if matches!(distance.get(&next), Some(&d) if d <= next_distance) {
                    continue;
                }
                distance.insert(next.clone(), next_distance);
                predecessor.insert(next.clone(), (current.clone(), edge_index));
                frontier.push_back(next);
            }
        }
        SolveOutcome::Infeasible
    }

    fn reconstruct(&self, predecessor: &HashMap<State, (State, usize)>, target: State) -> Solution {
        let mut packs = Vec::new();
        let mut current = target;
        while let Some((previous, edge_index)) = predecessor.get(&current) {
            let pack = self.pack(*edge_index);
            log::debug!("Pack: {:?} (rule {})", pack.items, pack.rule);
            packs.push(pack);
            current = previous.clone();
        }
        packs.reverse();
        Solution { packs }
    }
}

/// Builds and compiles one [`PackRule`] per rule of the instance.
pub fn compile_rules(
    instance: &Instance,
    catalog: &Catalog,
    scope: EnumerationScope,
) -> Result<Vec<PackRule>> {
    instance
        .pack_rules
        .iter()
        .map(|spec| {
            let mut rule = PackRule::new(spec).with_scope(scope);
            rule.compile(catalog)?;
            Ok(rule)
        })
        .collect()
}

/// Enumerates the edges of every rule. Returns false if the budget ran out in any of them.
pub fn enumerate_rules(
    rules: &mut [PackRule],
    catalog: &Catalog,
    budget: &Budget,
    parallel: bool,
) -> bool {
    let outcomes: Vec<Enumeration> = if parallel {
        rules
            .par_iter_mut()
            .map(|rule| rule.enumerate_edges(catalog, budget))
            .collect()
    } else {
        rules
            .iter_mut()
            .map(|rule| rule.enumerate_edges(catalog, budget))
            .collect()
    };
    outcomes
        .iter()
        .all(|outcome| matches!(outcome, Enumeration::Complete { .. }))
}

pub fn solve_instance(instance: &Instance, config: &SolveConfig) -> Result<SolveReport> {
    let start = Instant::now();
    instance.validate()?;
    let catalog = Catalog::new(&instance.items)?;
    let budget = Budget::from_config(config);

    let mut rules = compile_rules(instance, &catalog, config.scope)?;
    if !enumerate_rules(&mut rules, &catalog, &budget, config.parallel) {
        return Ok(SolveReport {
            outcome: SolveOutcome::Aborted {
                stage: Stage::Enumeration,
                steps: budget.steps(),
            },
            num_edges: 0,
            steps: budget.steps(),
            elapsed: start.elapsed(),
        });
    }

    let graph = PackGraph::new(&catalog, &rules);
    log::info!(
        "Pack graph has {} edges from {} rules",
        graph.num_edges(),
        rules.len()
    );
    let outcome = graph.solve(&budget);
    match &outcome {
        SolveOutcome::Packed(solution) => log::info!(
            "Packed {} items into {} packs in {:.3} seconds",
            catalog.source().total(),
            solution.num_packs(),
            start.elapsed().as_secs_f64()
        ),
        SolveOutcome::Infeasible => log::info!("No pack sequence empties the inventory"),
        SolveOutcome::Aborted { .. } => {}
    }

    Ok(SolveReport {
        outcome,
        num_edges: graph.num_edges(),
        steps: budget.steps(),
        elapsed: start.elapsed(),
    })
}
