use bevy::prelude::*;

use crate::error::SimError;
use crate::types::{Action, ClimbAction, EffectorDistances, Observation, StepSnapshot};

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// A policy that maps observations to actions.
pub trait Policy: Send + Sync + 'static {
    /// Given an observation, produce an action.
    fn get_action(&self, obs: &Observation) -> Action;

    /// Human-readable name for this policy.
    fn name(&self) -> &str;

    /// Whether this policy is deterministic (no randomness).
    fn is_deterministic(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// RewardFunction
// ---------------------------------------------------------------------------

/// Computes the shaped reward for one step.
///
/// `best` is the per-effector best-distance baseline for the current desired
/// stance. Strategies that track progress may lower it; the sequencer resets
/// it whenever the desired stance advances.
pub trait RewardFunction: Send + Sync + 'static {
    /// Compute the reward value.
    fn compute(&self, snapshot: &StepSnapshot, best: &mut EffectorDistances) -> f64;

    /// Human-readable name for this reward function.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// TerminationCondition
// ---------------------------------------------------------------------------

/// Determines whether an episode should terminate.
pub trait TerminationCondition: Send + Sync + 'static {
    /// Returns `true` if the episode should end.
    fn is_terminated(&self, snapshot: &StepSnapshot) -> bool;

    /// Human-readable name for this termination condition.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// ActionApplicator
// ---------------------------------------------------------------------------

/// Applies a validated action to the world before the physics tick.
pub trait ActionApplicator: Send + Sync + 'static {
    /// Apply the given action to the world.
    fn apply(&self, world: &mut World, action: &ClimbAction) -> Result<(), SimError>;

    /// Human-readable name for this applicator.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// CompositeReward
// ---------------------------------------------------------------------------

/// A weighted combination of multiple reward functions.
///
/// The total reward is the sum of each component reward multiplied by its
/// weight. Every component sees the same `best` baseline in insertion order.
/// Use [`breakdown`](Self::breakdown) to inspect individual contributions.
pub struct CompositeReward {
    rewards: Vec<(Box<dyn RewardFunction>, f64)>,
}

impl CompositeReward {
    /// Create an empty composite reward.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rewards: Vec::new(),
        }
    }

    /// Add a reward function with the given weight. Returns `self` for chaining.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn add(mut self, reward: Box<dyn RewardFunction>, weight: f64) -> Self {
        self.rewards.push((reward, weight));
        self
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// Compute each component reward and return `(name, weighted_value)` pairs.
    pub fn breakdown(
        &self,
        snapshot: &StepSnapshot,
        best: &mut EffectorDistances,
    ) -> Vec<(&str, f64)> {
        self.rewards
            .iter()
            .map(|(reward, weight)| (reward.name(), reward.compute(snapshot, best) * weight))
            .collect()
    }
}

impl Default for CompositeReward {
    fn default() -> Self {
        Self::new()
    }
}

impl RewardFunction for CompositeReward {
    fn compute(&self, snapshot: &StepSnapshot, best: &mut EffectorDistances) -> f64 {
        self.rewards
            .iter()
            .map(|(reward, weight)| reward.compute(snapshot, best) * weight)
            .sum()
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "CompositeReward"
    }
}

// ---------------------------------------------------------------------------
// CompositeTermination
// ---------------------------------------------------------------------------

/// OR-composition of multiple termination conditions.
///
/// Returns `true` if **any** contained condition is satisfied.
pub struct CompositeTermination {
    conditions: Vec<Box<dyn TerminationCondition>>,
}

impl CompositeTermination {
    /// Create an empty composite termination.
    #[must_use]
    pub fn new() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }

    /// Add a termination condition. Returns `self` for chaining.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn add(mut self, condition: Box<dyn TerminationCondition>) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Names of the conditions that fire for `snapshot`.
    pub fn triggered(&self, snapshot: &StepSnapshot) -> Vec<&str> {
        self.conditions
            .iter()
            .filter(|condition| condition.is_terminated(snapshot))
            .map(|condition| condition.name())
            .collect()
    }
}

impl Default for CompositeTermination {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminationCondition for CompositeTermination {
    fn is_terminated(&self, snapshot: &StepSnapshot) -> bool {
        self.conditions
            .iter()
            .any(|condition| condition.is_terminated(snapshot))
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "CompositeTermination"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
