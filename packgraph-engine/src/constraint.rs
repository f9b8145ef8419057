use crate::{catalog::Catalog, state::State, EPSILON};
use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// An item can never be packed beyond its available count.
    Availability,
    Weight,
    Price,
    Count,
}

/// `sum(coefficient * state[index]) <= bound` over the listed terms. Items without a term have a
/// zero coefficient.
#[derive(Debug, Clone)]
pub struct LinearConstraint {
    kind: ConstraintKind,
    terms: Vec<(usize, f64)>,
    bound: f64,
}

impl LinearConstraint {
    pub fn new(kind: ConstraintKind, bound: f64) -> Self {
        Self {
            kind,
            terms: Vec::new(),
            bound,
        }
    }

    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    pub fn bound(&self) -> f64 {
        self.bound
    }

    /// `(catalog position, coefficient)` pairs.
    pub fn terms(&self) -> &[(usize, f64)] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Sets the coefficient of item `id`, replacing any earlier one.
    pub fn add_term(&mut self, catalog: &Catalog, id: usize, coefficient: f64) -> Result<()> {
        let index = catalog.index_of(id)?;
        match self.terms.iter_mut().find(|(i, _)| *i == index) {
            Some(term) => term.1 = coefficient,
            None => self.terms.push((index, coefficient)),
        }
        Ok(())
    }

    pub fn coefficient(&self, index: usize) -> f64 {
        self.terms
            .iter()
            .find(|(i, _)| *i == index)
            .map_or(0.0, |(_, c)| *c)
    }

    /// Left hand side of the inequality.
    pub fn lhs(&self, state: &State) -> f64 {
        self.terms
            .iter()
            .map(|&(index, coefficient)| coefficient * state.get(index) as f64)
            .sum()
    }

    pub fn is_satisfied(&self, state: &State) -> bool {
        // Coefficients are non-negative, so the running sum never comes back under the bound.
        let mut total = 0.0;
        for &(index, coefficient) in self.terms.iter() {
            total += coefficient * state.get(index) as f64;
            if total > self.bound + EPSILON {
                return false;
            }
        }
        total <= self.bound + EPSILON
    }
}
