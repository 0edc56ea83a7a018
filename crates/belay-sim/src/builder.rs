//! Scene builder for a ready-to-step climbing environment.
//!
//! [`SceneBuilder`] starts from a [`ClimbConfig`], lets callers adjust the
//! common knobs and picks the wall physics, then returns a [`ClimbEnv`] with
//! [`ClimbSimPlugin`] installed.
//!
//! # Example
//!
//! ```no_run
//! use belay_core::config::ClimbConfig;
//! use belay_sim::SceneBuilder;
//!
//! let env = SceneBuilder::new(ClimbConfig::default())
//!     .with_max_episode_steps(500)
//!     .build();
//! ```

use bevy::prelude::*;

use belay_core::config::{ClimbConfig, RewardVariant};
use belay_core::error::BelayError;
use belay_core::physics::ClimbPhysics;
use belay_gym::env::ClimbEnv;

use crate::ClimbSimPlugin;
use crate::kinematic::{KinematicParams, KinematicWall};

// ---------------------------------------------------------------------------
// SceneBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for a complete climbing simulation.
///
/// Uses a [`KinematicWall`] over the configured holds unless another
/// physics backend is supplied.
pub struct SceneBuilder {
    config: ClimbConfig,
    physics: Option<Box<dyn ClimbPhysics>>,
    params: KinematicParams,
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self::new(ClimbConfig::default())
    }
}

impl SceneBuilder {
    pub fn new(config: ClimbConfig) -> Self {
        Self {
            config,
            physics: None,
            params: KinematicParams::default(),
        }
    }

    /// Set the maximum episode steps.
    #[must_use]
    pub const fn with_max_episode_steps(mut self, max_steps: u32) -> Self {
        self.config.simulation.max_episode_steps = max_steps;
        self
    }

    /// Truncate after `budget` steps spent on one stance.
    #[must_use]
    pub const fn with_stance_step_budget(mut self, budget: Option<u32>) -> Self {
        self.config.simulation.stance_step_budget = budget;
        self
    }

    /// Set the master seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.config.simulation.seed = seed;
        self
    }

    /// Select the reward strategy.
    #[must_use]
    pub const fn with_reward_variant(mut self, variant: RewardVariant) -> Self {
        self.config.reward.variant = variant;
        self
    }

    /// Parameters of the default [`KinematicWall`]. Ignored when a custom
    /// physics backend is set.
    #[must_use]
    pub fn with_kinematic_params(mut self, params: KinematicParams) -> Self {
        self.params = params;
        self
    }

    /// Use `physics` instead of a [`KinematicWall`].
    #[must_use]
    pub fn with_physics(mut self, physics: Box<dyn ClimbPhysics>) -> Self {
        self.physics = Some(physics);
        self
    }

    pub const fn config(&self) -> &ClimbConfig {
        &self.config
    }

    /// Validate the config and build the environment.
    pub fn build(self) -> Result<ClimbEnv, BelayError> {
        self.build_in(App::new())
    }

    /// Like [`build`](Self::build), on an unfinished `app` that may already
    /// carry plugins such as `LogPlugin`.
    pub fn build_in(self, mut app: App) -> Result<ClimbEnv, BelayError> {
        let physics = match self.physics {
            Some(physics) => physics,
            None => Box::new(KinematicWall::with_params(
                &self.config.wall.layout(),
                self.params,
            )),
        };
        if !app.is_plugin_added::<ClimbSimPlugin>() {
            app.add_plugins(ClimbSimPlugin);
        }
        ClimbEnv::from_app(app, &self.config, physics)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EpisodeStats;
    use belay_core::error::ConfigError;
    use belay_test_utils::fixtures::{TEST_JOINTS, line_config, release_action};
    use belay_test_utils::mocks::ScriptedWall;

    #[test]
    fn default_builder_uses_kinematic_wall() {
        let env = SceneBuilder::default().build().unwrap();
        assert!(env.app().world().get_resource::<EpisodeStats>().is_some());
        assert_eq!(env.plan().len(), 4);
        assert_eq!(
            env.action_space().dim(),
            ClimbConfig::default().simulation.action_dim()
        );
    }

    #[test]
    fn knobs_reach_the_config() {
        let builder = SceneBuilder::default()
            .with_max_episode_steps(200)
            .with_stance_step_budget(Some(50))
            .with_seed(9)
            .with_reward_variant(RewardVariant::Equation);
        let config = builder.config();
        assert_eq!(config.simulation.max_episode_steps, 200);
        assert_eq!(config.simulation.stance_step_budget, Some(50));
        assert_eq!(config.simulation.seed, 9);
        assert_eq!(config.reward.variant, RewardVariant::Equation);
    }

    #[test]
    fn invalid_config_rejected() {
        let result = SceneBuilder::default().with_max_episode_steps(0).build();
        assert!(matches!(
            result.err(),
            Some(BelayError::Config(ConfigError::ZeroEpisodeSteps))
        ));
    }

    #[test]
    fn custom_physics_runs_episode() {
        let config = line_config(2, &[[0, -1, -1, -1]]);
        let mut env = SceneBuilder::new(config)
            .with_max_episode_steps(5)
            .with_physics(Box::new(ScriptedWall::new(2)))
            .build()
            .unwrap();

        env.reset(Some(1));
        for _ in 0..5 {
            env.step(&release_action(TEST_JOINTS)).unwrap();
        }

        let stats = env.app().world().resource::<EpisodeStats>();
        assert_eq!(stats.episodes_completed, 1);
        assert_eq!(stats.truncated, 1);
        assert_eq!(stats.total_steps, 5);
    }
}
