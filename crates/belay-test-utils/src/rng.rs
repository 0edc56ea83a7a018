//! Deterministic RNG utilities for reproducible tests.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use belay_core::types::Action;

/// Create a deterministic `ChaCha8Rng` from a seed.
///
/// All test randomization should go through this to ensure reproducibility.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Deterministic action of length `dim` with entries in `[-1, 1)`.
pub fn deterministic_action(dim: usize, seed: u64) -> Action {
    let mut rng = seeded_rng(seed);
    Action::new((0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
