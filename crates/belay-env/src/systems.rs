//! Bevy resources and per-step systems of the climbing environment.

use bevy::log::debug;
use bevy::prelude::*;

use belay_core::physics::ClimbPhysics;
use belay_core::rewards::improved_reward;
use belay_core::terminations;
use belay_core::traits::{CompositeTermination, RewardFunction, TerminationCondition};
use belay_core::types::{Observation, StepSnapshot};

use crate::episode::{Episode, EpisodeConfig};
use crate::observation::ObservationBuffer;
use crate::plan::MotionPlan;
use crate::progress::{EpisodeProgress, is_on_floor, stance_distances};
use crate::sequencer::{self, StanceAdvance};
use crate::tracker;

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// The physics collaborator owned by this environment.
#[derive(Resource)]
pub struct Physics(pub Box<dyn ClimbPhysics>);

/// Reward strategy evaluated once per step.
#[derive(Resource)]
pub struct ActiveReward(pub Box<dyn RewardFunction>);

impl Default for ActiveReward {
    fn default() -> Self {
        Self(Box::new(improved_reward(0.0)))
    }
}

/// Conditions that end an episode.
#[derive(Resource)]
pub struct ActiveTermination(pub CompositeTermination);

impl Default for ActiveTermination {
    /// Plan completion or a fall.
    fn default() -> Self {
        Self(terminations::standard())
    }
}

/// Everything the last update produced, read back by the caller.
#[derive(Resource, Clone, Debug)]
pub struct StepOutcome {
    pub observation: Observation,
    /// Snapshot the reward was computed from (pre-advance).
    pub snapshot: StepSnapshot,
    /// Desired-stance index at observation time.
    pub desired_index: usize,
    pub reward: f64,
    /// Current stance equalled the desired stance at observation time.
    pub is_success: bool,
    pub advance: StanceAdvance,
    pub plan_complete: bool,
    pub terminated: bool,
    pub truncated: bool,
}

impl Default for StepOutcome {
    fn default() -> Self {
        Self {
            observation: Observation::zeros(0),
            snapshot: StepSnapshot::idle(0),
            desired_index: 0,
            reward: 0.0,
            is_success: false,
            advance: StanceAdvance::Holding,
            plan_complete: false,
            terminated: false,
            truncated: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Run condition
// ---------------------------------------------------------------------------

/// Step systems only run once a task is installed and the episode was reset.
#[allow(clippy::needless_pass_by_value)]
pub fn task_running(
    episode: Res<Episode>,
    plan: Option<Res<MotionPlan>>,
    physics: Option<Res<Physics>>,
) -> bool {
    episode.is_started() && plan.is_some() && physics.is_some()
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Advance the physics one tick and count the step.
///
/// Runs in [`ClimbSet::Simulate`](belay_core::ClimbSet::Simulate).
pub fn simulate_system(mut physics: ResMut<Physics>, mut episode: ResMut<Episode>) {
    physics.0.step_simulation();
    episode.begin_step();
}

/// Resolve attachment constraints into the current stance.
///
/// Runs in [`ClimbSet::Track`](belay_core::ClimbSet::Track).
#[allow(clippy::needless_pass_by_value)]
pub fn track_system(physics: Res<Physics>, mut progress: ResMut<EpisodeProgress>) {
    progress.current_stance = tracker::current_stance(physics.0.as_ref());
}

/// Build the observation and the reward snapshot.
///
/// Runs in [`ClimbSet::Observe`](belay_core::ClimbSet::Observe).
#[allow(clippy::needless_pass_by_value)]
pub fn observe_system(
    physics: Res<Physics>,
    plan: Res<MotionPlan>,
    progress: Res<EpisodeProgress>,
    episode: Res<Episode>,
    config: Res<EpisodeConfig>,
    mut buffer: ResMut<ObservationBuffer>,
    mut outcome: ResMut<StepOutcome>,
) {
    let physics = physics.0.as_ref();
    let desired = progress.desired_stance(&plan);
    let snapshot = StepSnapshot {
        current_stance: progress.current_stance,
        desired_stance: desired,
        distances: stance_distances(physics, &desired),
        torso_velocity: physics.torso_linear_velocity(),
        torso_orientation: physics.torso_orientation(),
        on_floor: is_on_floor(physics),
        plan_complete: progress.is_complete(&plan),
        steps: episode.step_count,
        max_episode_steps: config.max_episode_steps,
    };

    outcome.observation = buffer.collect(physics, &progress, &desired);
    outcome.is_success = snapshot.stance_reached();
    outcome.desired_index = progress.desired_index;
    outcome.snapshot = snapshot;
}

/// Compute the shaped reward against the pre-advance desired stance.
///
/// Runs in [`ClimbSet::Evaluate`](belay_core::ClimbSet::Evaluate).
#[allow(clippy::needless_pass_by_value)]
pub fn evaluate_system(
    reward: Res<ActiveReward>,
    mut progress: ResMut<EpisodeProgress>,
    mut episode: ResMut<Episode>,
    mut outcome: ResMut<StepOutcome>,
) {
    // The baseline is frozen once the plan is complete.
    let value = if outcome.snapshot.plan_complete {
        let mut scratch = progress.best_distances;
        reward.0.compute(&outcome.snapshot, &mut scratch)
    } else {
        reward
            .0
            .compute(&outcome.snapshot, &mut progress.best_distances)
    };
    debug!(
        "step {} reward {:.4} ({}), distances {:?}",
        episode.step_count,
        value,
        reward.0.name(),
        outcome.snapshot.distances.0
    );
    outcome.reward = value;
    episode.accumulate(value);
}

/// Advance the motion plan when the desired stance is held.
///
/// Runs in [`ClimbSet::Sequence`](belay_core::ClimbSet::Sequence).
#[allow(clippy::needless_pass_by_value)]
pub fn sequence_system(
    physics: Res<Physics>,
    plan: Res<MotionPlan>,
    mut progress: ResMut<EpisodeProgress>,
    mut outcome: ResMut<StepOutcome>,
) {
    outcome.advance = sequencer::advance(&mut progress, &plan, physics.0.as_ref());
}

/// Decide termination and truncation.
///
/// Runs in [`ClimbSet::Decide`](belay_core::ClimbSet::Decide).
#[allow(clippy::needless_pass_by_value)]
pub fn decide_system(
    termination: Res<ActiveTermination>,
    plan: Res<MotionPlan>,
    progress: Res<EpisodeProgress>,
    config: Res<EpisodeConfig>,
    mut episode: ResMut<Episode>,
    mut outcome: ResMut<StepOutcome>,
) {
    let plan_complete = progress.is_complete(&plan);
    let snapshot = StepSnapshot {
        plan_complete,
        ..outcome.snapshot
    };
    let terminated = termination.0.is_terminated(&snapshot);
    let truncated = config.is_truncated(episode.step_count, progress.steps_on_stance);

    if terminated && episode.is_running() {
        debug!(
            "episode {} terminated by {:?}",
            episode.episode_number,
            termination.0.triggered(&snapshot)
        );
    }
    episode.finish(terminated, truncated);

    outcome.plan_complete = plan_complete;
    outcome.terminated = terminated;
    outcome.truncated = truncated;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
