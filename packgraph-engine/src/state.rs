use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

/// Per-item counts indexed by catalog position.
///
/// A `State` is a node of the pack graph when it holds the remaining inventory, and an edge when
/// it holds the contents of a single pack. Every state taking part in one solve spans the same
/// catalog, so comparing states of different lengths is a logic error and panics.
#[derive(Clone, Debug)]
pub struct State {
    counts: Box<[u32]>,
}

impl State {
    pub fn new(counts: Vec<u32>) -> Self {
        Self {
            counts: counts.into_boxed_slice(),
        }
    }

    pub fn zeros(len: usize) -> Self {
        Self::new(vec![0; len])
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    pub fn get(&self, index: usize) -> u32 {
        self.counts[index]
    }

    /// Only scratch states that have not been handed to a set or map may be written to.
    pub(crate) fn set(&mut self, index: usize, count: u32) {
        self.counts[index] = count;
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    pub fn is_zero(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    /// True when `edge` can be taken out of `self` without any count going negative.
    pub fn feasible(&self, edge: &State) -> bool {
        self.assert_same_universe(edge);
        self.counts
            .iter()
            .zip(edge.counts.iter())
            .all(|(have, take)| have >= take)
    }

    /// `self - edge`, component-wise. Panics unless `self.feasible(edge)`.
    pub fn move_by(&self, edge: &State) -> State {
        self.assert_same_universe(edge);
        let counts = self
            .counts
            .iter()
            .zip(edge.counts.iter())
            .map(|(have, take)| {
                have.checked_sub(*take)
                    .expect("move_by called with an infeasible edge")
            })
            .collect();
        State::new(counts)
    }

    /// `self + other`, component-wise.
    pub fn add(&self, other: &State) -> State {
        self.assert_same_universe(other);
        let counts = self
            .counts
            .iter()
            .zip(other.counts.iter())
            .map(|(a, b)| a + b)
            .collect();
        State::new(counts)
    }

    fn assert_same_universe(&self, other: &State) {
        assert_eq!(
            self.counts.len(),
            other.counts.len(),
            "States span different item universes"
        );
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.assert_same_universe(other);
        self.counts == other.counts
    }
}

impl Eq for State {}

impl Hash for State {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.counts.hash(state);
    }
}

// Lexicographic over catalog positions. Only used to give edge sets a stable order.
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        self.assert_same_universe(other);
        self.counts.cmp(&other.counts)
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.counts)
    }
}
