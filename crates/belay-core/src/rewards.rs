//! Shaped reward strategies for stance-driven climbing.
//!
//! Three strategies are provided and selected through
//! [`RewardConfig`](crate::config::RewardConfig):
//!
//! - [`improved_reward`]: weighted sum of distance, climb velocity, posture
//!   and floor terms (default).
//! - [`NegativeDistanceReward`]: clipped negative distance with a floor
//!   penalty scaled by the remaining episode budget.
//! - [`EquationReward`]: exponential proximity per effector gated on beating
//!   the best-distance baseline.

use std::f64::consts::PI;

use crate::config::{RewardConfig, RewardVariant};
use crate::traits::{CompositeReward, RewardFunction};
use crate::types::{EffectorDistances, StepSnapshot};

/// Lower clip bound of the distance term.
pub const DISTANCE_FLOOR: f64 = -2.0;

/// Preferred torso pitch: a slight backward lean.
pub const TARGET_PITCH: f64 = -PI / 6.0;

/// `clip(-sum(distances), -2, +inf)`.
pub fn clipped_distance(distances: &EffectorDistances) -> f64 {
    (-distances.sum()).max(DISTANCE_FLOOR)
}

// ---------------------------------------------------------------------------
// Improved reward terms
// ---------------------------------------------------------------------------

/// Negative total distance to the desired stance, clipped at -2.
pub struct DistanceTerm;

impl RewardFunction for DistanceTerm {
    fn compute(&self, snapshot: &StepSnapshot, _best: &mut EffectorDistances) -> f64 {
        clipped_distance(&snapshot.distances)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "DistanceTerm"
    }
}

/// Upward torso speed; downward motion is not penalized.
pub struct ClimbVelocityTerm;

impl RewardFunction for ClimbVelocityTerm {
    fn compute(&self, snapshot: &StepSnapshot, _best: &mut EffectorDistances) -> f64 {
        snapshot.torso_velocity.z.max(0.0)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ClimbVelocityTerm"
    }
}

/// Peaks at `|target|` when the torso pitch equals `target`, and is zero once
/// the pitch is `|target|` or more away from it.
pub struct PostureTerm {
    target: f64,
}

impl PostureTerm {
    #[must_use]
    pub const fn new(target: f64) -> Self {
        Self { target }
    }
}

impl Default for PostureTerm {
    fn default() -> Self {
        Self::new(TARGET_PITCH)
    }
}

impl RewardFunction for PostureTerm {
    fn compute(&self, snapshot: &StepSnapshot, _best: &mut EffectorDistances) -> f64 {
        (self.target.abs() - (snapshot.pitch() - self.target).abs()).max(0.0)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "PostureTerm"
    }
}

/// `on_floor` when a non-foot part touches the floor, `off_floor` otherwise.
pub struct FloorContactTerm {
    on_floor: f64,
    off_floor: f64,
}

impl FloorContactTerm {
    #[must_use]
    pub const fn new(on_floor: f64, off_floor: f64) -> Self {
        Self {
            on_floor,
            off_floor,
        }
    }
}

impl Default for FloorContactTerm {
    fn default() -> Self {
        Self::new(-5.0, 0.1)
    }
}

impl RewardFunction for FloorContactTerm {
    fn compute(&self, snapshot: &StepSnapshot, _best: &mut EffectorDistances) -> f64 {
        if snapshot.on_floor {
            self.on_floor
        } else {
            self.off_floor
        }
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "FloorContactTerm"
    }
}

/// Flat bonus while the current stance equals the desired stance.
pub struct StanceCompletionBonus {
    bonus: f64,
}

impl StanceCompletionBonus {
    #[must_use]
    pub const fn new(bonus: f64) -> Self {
        Self { bonus }
    }
}

impl RewardFunction for StanceCompletionBonus {
    fn compute(&self, snapshot: &StepSnapshot, _best: &mut EffectorDistances) -> f64 {
        if snapshot.stance_reached() {
            self.bonus
        } else {
            0.0
        }
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "StanceCompletionBonus"
    }
}

/// Build the default climbing reward.
///
/// `distance + 4 * max(0, vz) + 0.5 * posture + floor + completion_bonus`.
#[must_use]
pub fn improved_reward(completion_bonus: f64) -> CompositeReward {
    CompositeReward::new()
        .add(Box::new(DistanceTerm), 1.0)
        .add(Box::new(ClimbVelocityTerm), 4.0)
        .add(Box::new(PostureTerm::default()), 0.5)
        .add(Box::new(FloorContactTerm::default()), 1.0)
        .add(Box::new(StanceCompletionBonus::new(completion_bonus)), 1.0)
}

// ---------------------------------------------------------------------------
// NegativeDistanceReward
// ---------------------------------------------------------------------------

/// Clipped negative distance with a completion bonus.
///
/// The whole baseline is replaced whenever the total distance is strictly
/// smaller than the best total so far. Falling to the floor costs two points
/// for every step left in the episode.
pub struct NegativeDistanceReward {
    completion_bonus: f64,
}

impl NegativeDistanceReward {
    pub const DEFAULT_COMPLETION_BONUS: f64 = 1000.0;

    #[must_use]
    pub const fn new(completion_bonus: f64) -> Self {
        Self { completion_bonus }
    }
}

impl Default for NegativeDistanceReward {
    fn default() -> Self {
        Self::new(Self::DEFAULT_COMPLETION_BONUS)
    }
}

impl RewardFunction for NegativeDistanceReward {
    fn compute(&self, snapshot: &StepSnapshot, best: &mut EffectorDistances) -> f64 {
        let distances = &snapshot.distances;
        if distances.sum() < best.sum() {
            *best = *distances;
        }

        let mut reward = clipped_distance(distances);
        if snapshot.stance_reached() {
            reward += self.completion_bonus;
        }
        if snapshot.on_floor {
            let remaining =
                f64::from(snapshot.max_episode_steps) - f64::from(snapshot.steps);
            reward += remaining * -2.0;
        }
        reward
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "NegativeDistanceReward"
    }
}

// ---------------------------------------------------------------------------
// EquationReward
// ---------------------------------------------------------------------------

/// Exponential proximity reward gated on progress.
///
/// Per effector `v_i = kappa * exp(-sigma * d_i) + [slot i matches]`. When the
/// total distance is no worse than the best total, the reward is `sum(v)` and
/// the baseline is lowered element-wise. Otherwise the reward is
/// `0.8 * (sum(best) - sum(d))`, which is negative. On the floor the reward
/// is replaced by `floor_reward`.
pub struct EquationReward {
    kappa: f64,
    sigma: f64,
    completion_bonus: f64,
    floor_reward: f64,
}

impl EquationReward {
    pub const DEFAULT_KAPPA: f64 = 0.6;
    pub const DEFAULT_SIGMA: f64 = 0.5;
    pub const DEFAULT_COMPLETION_BONUS: f64 = 3000.0;
    pub const DEFAULT_FLOOR_REWARD: f64 = -3000.0;
    const REGRESSION_WEIGHT: f64 = 0.8;

    #[must_use]
    pub const fn new(kappa: f64, sigma: f64) -> Self {
        Self {
            kappa,
            sigma,
            completion_bonus: Self::DEFAULT_COMPLETION_BONUS,
            floor_reward: Self::DEFAULT_FLOOR_REWARD,
        }
    }

    #[must_use]
    pub const fn with_completion_bonus(mut self, bonus: f64) -> Self {
        self.completion_bonus = bonus;
        self
    }

    #[must_use]
    pub const fn with_floor_reward(mut self, reward: f64) -> Self {
        self.floor_reward = reward;
        self
    }
}

impl Default for EquationReward {
    fn default() -> Self {
        Self::new(Self::DEFAULT_KAPPA, Self::DEFAULT_SIGMA)
    }
}

impl RewardFunction for EquationReward {
    fn compute(&self, snapshot: &StepSnapshot, best: &mut EffectorDistances) -> f64 {
        let distances = &snapshot.distances;
        let matches = snapshot
            .desired_stance
            .slot_matches(&snapshot.current_stance);

        let proximity: f64 = distances
            .0
            .iter()
            .zip(matches)
            .map(|(d, reached)| {
                self.kappa * (-self.sigma * d).exp() + if reached { 1.0 } else { 0.0 }
            })
            .sum();

        let mut reward = if distances.sum() > best.sum() {
            Self::REGRESSION_WEIGHT * (best.sum() - distances.sum())
        } else {
            best.min_assign(distances);
            proximity
        };

        if snapshot.stance_reached() {
            reward += self.completion_bonus;
        }
        if snapshot.on_floor {
            reward = self.floor_reward;
        }
        reward
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "EquationReward"
    }
}

// ---------------------------------------------------------------------------
// Construction from config
// ---------------------------------------------------------------------------

/// Instantiate the strategy named by `config`, applying any overrides.
pub fn build_reward(config: &RewardConfig) -> Box<dyn RewardFunction> {
    let bonus = config
        .completion_bonus
        .unwrap_or_else(|| config.variant.default_completion_bonus());
    match config.variant {
        RewardVariant::Improved => Box::new(improved_reward(bonus)),
        RewardVariant::NegativeDistance => Box::new(NegativeDistanceReward::new(bonus)),
        RewardVariant::Equation => {
            let mut reward = EquationReward::new(config.kappa, config.sigma)
                .with_completion_bonus(bonus);
            if let Some(floor) = config.floor_reward {
                reward = reward.with_floor_reward(floor);
            }
            Box::new(reward)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
