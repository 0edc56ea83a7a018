//! Stance tracking, sequencing and episode lifecycle for belay.
//!
//! This crate is the ECS layer of the climbing environment. Each step runs
//! the [`ClimbSet`] phases in order:
//!
//! 1. tick the physics and count the step,
//! 2. resolve attachments into the current stance,
//! 3. observe and snapshot,
//! 4. compute the reward against the pre-advance desired stance,
//! 5. advance the motion plan,
//! 6. decide termination and truncation.

pub mod episode;
pub mod observation;
pub mod plan;
pub mod progress;
pub mod sequencer;
pub mod systems;
pub mod tracker;

use bevy::prelude::*;

use belay_core::ClimbSet;
use belay_core::config::ClimbConfig;
use belay_core::error::ConfigError;
use belay_core::physics::ClimbPhysics;
use belay_core::rewards::build_reward;

use crate::episode::{Episode, EpisodeConfig};
use crate::observation::ObservationBuffer;
use crate::plan::MotionPlan;
use crate::progress::EpisodeProgress;
use crate::systems::{ActiveReward, ActiveTermination, Physics, StepOutcome};

// ---------------------------------------------------------------------------
// ClimbEnvPlugin
// ---------------------------------------------------------------------------

/// Registers the per-step systems and default resources.
///
/// Adds [`ClimbCorePlugin`](belay_core::ClimbCorePlugin) for set ordering.
/// Nothing runs until a [`MotionPlan`] and [`Physics`] are installed (see
/// [`install_task`]) and the [`Episode`] has been reset.
pub struct ClimbEnvPlugin;

impl Plugin for ClimbEnvPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<belay_core::ClimbCorePlugin>() {
            app.add_plugins(belay_core::ClimbCorePlugin);
        }
        app.init_resource::<Episode>()
            .init_resource::<EpisodeConfig>()
            .init_resource::<EpisodeProgress>()
            .init_resource::<ObservationBuffer>()
            .init_resource::<ActiveReward>()
            .init_resource::<ActiveTermination>()
            .init_resource::<StepOutcome>()
            .add_systems(
                Update,
                (
                    systems::simulate_system.in_set(ClimbSet::Simulate),
                    systems::track_system.in_set(ClimbSet::Track),
                    systems::observe_system.in_set(ClimbSet::Observe),
                    systems::evaluate_system.in_set(ClimbSet::Evaluate),
                    systems::sequence_system.in_set(ClimbSet::Sequence),
                    systems::decide_system.in_set(ClimbSet::Decide),
                )
                    .run_if(systems::task_running),
            );
    }
}

/// Install a validated task into `world`: plan, limits, reward, wall physics
/// and the matching observation layout.
pub fn install_task(
    world: &mut World,
    config: &ClimbConfig,
    physics: Box<dyn ClimbPhysics>,
) -> Result<(), ConfigError> {
    let plan = MotionPlan::from_config(config)?;
    if physics.hold_count() < config.wall.holds.len() {
        return Err(ConfigError::InvalidValue {
            field: "wall.holds".into(),
            message: format!(
                "physics '{}' has {} holds, config lists {}",
                physics.name(),
                physics.hold_count(),
                config.wall.holds.len()
            ),
        });
    }
    let buffer = ObservationBuffer::for_climber(physics.body_state().len());

    world.insert_resource(plan);
    world.insert_resource(EpisodeConfig::from(&config.simulation));
    world.insert_resource(ActiveReward(build_reward(&config.reward)));
    world.insert_resource(buffer);
    world.insert_resource(Physics(physics));
    world.insert_resource(config.clone());
    Ok(())
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        ClimbEnvPlugin,
        episode::{Episode, EpisodeConfig, EpisodeState},
        install_task,
        observation::ObservationBuffer,
        plan::{MotionPlan, PlannedStance},
        progress::EpisodeProgress,
        sequencer::{SequencerState, StanceAdvance},
        systems::{ActiveReward, ActiveTermination, Physics, StepOutcome},
    };
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
