use ahash::RandomState;
pub(crate) type HashMap<K, V> = std::collections::HashMap<K, V, RandomState>;

/// Slack allowed when comparing a weighted sum against its bound.
pub const EPSILON: f64 = 1e-9;

pub mod budget;
pub mod catalog;
pub mod constraint;
pub mod instance;
pub mod rule;
pub mod solver;
pub mod state;

pub use budget::Budget;
pub use catalog::Catalog;
pub use constraint::{ConstraintKind, LinearConstraint};
pub use instance::{ConstraintTemplate, Instance, Item, RuleSpec, Track};
pub use rule::{Enumeration, PackRule};
pub use solver::{compile_rules, enumerate_rules, solve_instance, PackGraph, SolveOutcome, SolveReport};
pub use state::State;
