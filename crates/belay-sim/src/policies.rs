//! Basic climbing policies.
//!
//! All policies implement [`Policy`] from `belay-core`.

use std::sync::{Mutex, PoisonError};

use belay_core::traits::Policy;
use belay_core::types::{Action, BoxSpace, Observation};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// ---------------------------------------------------------------------------
// ZeroPolicy
// ---------------------------------------------------------------------------

/// Policy that always returns a zero action: no motion, every grasp released.
pub struct ZeroPolicy {
    dim: usize,
}

impl ZeroPolicy {
    pub const fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Policy for ZeroPolicy {
    fn get_action(&self, _obs: &Observation) -> Action {
        Action::zeros(self.dim)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ZeroPolicy"
    }
}

// ---------------------------------------------------------------------------
// ConstantPolicy
// ---------------------------------------------------------------------------

/// Policy that always returns the same fixed action.
pub struct ConstantPolicy {
    action: Action,
}

impl ConstantPolicy {
    pub const fn new(action: Action) -> Self {
        Self { action }
    }

    /// Still joints with fixed grasp intents: `1` where `grip` is set, `-1`
    /// elsewhere.
    pub fn grip(num_joints: usize, grip: [bool; 4]) -> Self {
        let mut data = vec![0.0; num_joints];
        data.extend(grip.map(|g| if g { 1.0 } else { -1.0 }));
        Self::new(Action::new(data))
    }
}

impl Policy for ConstantPolicy {
    fn get_action(&self, _obs: &Observation) -> Action {
        self.action.clone()
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ConstantPolicy"
    }
}

// ---------------------------------------------------------------------------
// RandomPolicy
// ---------------------------------------------------------------------------

/// Policy that samples random actions from the action space.
///
/// Uses a seeded RNG for determinism. Thread-safe via [`Mutex`].
pub struct RandomPolicy {
    space: BoxSpace,
    rng: Mutex<ChaCha8Rng>,
}

impl RandomPolicy {
    /// Create a random policy for the given action space and seed.
    pub fn new(space: BoxSpace, seed: u64) -> Self {
        Self {
            space,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }
}

impl Policy for RandomPolicy {
    fn get_action(&self, _obs: &Observation) -> Action {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        self.space.sample(&mut *rng)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "RandomPolicy"
    }

    fn is_deterministic(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
