//! Simulation layer for belay: a kinematic wall, basic policies, episode
//! statistics and a headless runner.
//!
//! [`ClimbSimPlugin`] adds the environment plugin plus episode statistics
//! tracking. [`SceneBuilder`] assembles a ready-to-step
//! [`ClimbEnv`](belay_gym::env::ClimbEnv) with it installed.
//!
//! # Example
//!
//! ```no_run
//! use belay_core::config::ClimbConfig;
//! use belay_sim::{HeadlessRunner, SceneBuilder, ZeroPolicy};
//!
//! let config = ClimbConfig::default();
//! let dim = config.simulation.action_dim();
//! let mut env = SceneBuilder::new(config).build().unwrap();
//! let summaries = HeadlessRunner::new(0)
//!     .run(&mut env, &ZeroPolicy::new(dim), 10)
//!     .unwrap();
//! ```

pub mod builder;
pub mod headless;
pub mod kinematic;
pub mod policies;
pub mod stats;

use bevy::prelude::*;
use belay_core::ClimbSet;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use builder::SceneBuilder;
pub use headless::{EpisodeSummary, HeadlessRunner, run_episode};
pub use kinematic::{ClimberPose, KinematicParams, KinematicWall};
pub use policies::{ConstantPolicy, RandomPolicy, ZeroPolicy};
pub use stats::EpisodeStats;

// ---------------------------------------------------------------------------
// ClimbSimPlugin
// ---------------------------------------------------------------------------

/// Meta-plugin for the full climbing simulation.
///
/// Includes:
/// - [`ClimbEnvPlugin`](belay_env::ClimbEnvPlugin): step systems and episode lifecycle
/// - [`EpisodeStats`] resource and tracking system
///
/// The wall physics and motion plan are installed separately, see
/// [`SceneBuilder`].
pub struct ClimbSimPlugin;

impl Plugin for ClimbSimPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<belay_env::ClimbEnvPlugin>() {
            app.add_plugins(belay_env::ClimbEnvPlugin);
        }
        app.init_resource::<EpisodeStats>().add_systems(
            Update,
            stats::episode_stats_system
                .in_set(ClimbSet::Communicate)
                .run_if(belay_env::systems::task_running),
        );
    }
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        ClimbSimPlugin, ConstantPolicy, EpisodeStats, EpisodeSummary, HeadlessRunner,
        KinematicParams, KinematicWall, RandomPolicy, SceneBuilder, ZeroPolicy, run_episode,
    };
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
