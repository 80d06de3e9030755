use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of random indices for `WeakReviewController::randomize`.
pub trait IndexPicker: Send {
    /// Pick an index in `0..len`. `len` is always at least 2.
    fn pick(&mut self, len: usize) -> usize;
}

/// Uniform picker backed by `StdRng`.
pub struct RandomPicker {
    rng: StdRng,
}

impl RandomPicker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic picker for reproducible runs.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPicker {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexPicker for RandomPicker {
    fn pick(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }
}

/// Replays a fixed list of draws, then repeats the last one.
///
/// Draws are reduced modulo `len`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPicker {
    draws: VecDeque<usize>,
    last: usize,
    calls: usize,
}

impl ScriptedPicker {
    #[must_use]
    pub fn new(draws: impl IntoIterator<Item = usize>) -> Self {
        Self {
            draws: draws.into_iter().collect(),
            last: 0,
            calls: 0,
        }
    }

    /// Number of draws taken so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl IndexPicker for ScriptedPicker {
    fn pick(&mut self, len: usize) -> usize {
        self.calls += 1;
        if let Some(next) = self.draws.pop_front() {
            self.last = next;
        }
        self.last % len
    }
}
