//! Random replacement: the victim index comes straight from the oracle.

use crate::rng::RandomSource;

/// Draws victim indices from the file-seeded stream. Does not check
/// occupancy; the caller's precondition guarantees every frame is mapped.
#[derive(Debug)]
pub struct RandomPager {
    num_frames: usize,
    source: RandomSource,
}

impl RandomPager {
    #[must_use]
    pub fn new(num_frames: usize, source: RandomSource) -> Self {
        Self { num_frames, source }
    }

    pub fn select_victim(&mut self) -> usize {
        self.source.next_in_range(self.num_frames)
    }
}
