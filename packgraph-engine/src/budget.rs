use packgraph_structs::config::SolveConfig;
use std::{
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
    time::{Duration, Instant},
};

const DEADLINE_CHECK_INTERVAL: u64 = 1024;

/// Step and wall-clock allowance shared by every phase of a solve, including rules enumerated
/// on other threads.
#[derive(Debug)]
pub struct Budget {
    max_steps: Option<u64>,
    deadline: Option<Instant>,
    steps: AtomicU64,
    exhausted: AtomicBool,
}

impl Budget {
    pub fn new(max_steps: Option<u64>, time_limit: Option<Duration>) -> Self {
        Self {
            max_steps,
            deadline: time_limit.map(|limit| Instant::now() + limit),
            steps: AtomicU64::new(0),
            exhausted: AtomicBool::new(false),
        }
    }

    pub fn unlimited() -> Self {
        Self::new(None, None)
    }

    pub fn from_config(config: &SolveConfig) -> Self {
        Self::new(config.max_steps, config.time_limit())
    }

    /// Spends one step. Returns false once the budget is exhausted.
    pub fn tick(&self) -> bool {
        if self.exhausted.load(Ordering::Relaxed) {
            return false;
        }
        let steps = self.steps.fetch_add(1, Ordering::Relaxed) + 1;
        let over_steps = self.max_steps.map_or(false, |max| steps > max);
        let over_time = steps % DEADLINE_CHECK_INTERVAL == 0
            && self.deadline.map_or(false, |deadline| Instant::now() >= deadline);
        if over_steps || over_time {
            if !self.exhausted.swap(true, Ordering::Relaxed) {
                log::warn!("Search budget exhausted after {} steps", steps);
            }
            return false;
        }
        true
    }

    pub fn steps(&self) -> u64 {
        self.steps
            .load(Ordering::Relaxed)
            .min(self.max_steps.map_or(u64::MAX, |max| max))
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::Relaxed)
    }
}
