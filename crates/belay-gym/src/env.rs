//! Gymnasium-style climbing environment wrapping a Bevy App.
//!
//! [`ClimbEnv`] drives one climbing simulation step by step, exposing the
//! `step`/`reset` API that training loops expect.

use bevy::prelude::*;

use belay_core::config::ClimbConfig;
use belay_core::error::{BelayError, SimError};
use belay_core::physics::ClimbPhysics;
use belay_core::traits::{ActionApplicator, CompositeTermination, RewardFunction};
use belay_core::types::{
    Action, BoxSpace, ClimbAction, ResetInfo, ResetResult, StepInfo, StepResult,
};
use belay_env::ClimbEnvPlugin;
use belay_env::episode::Episode;
use belay_env::observation::{ObservationBuffer, TASK_DIM};
use belay_env::plan::MotionPlan;
use belay_env::progress::EpisodeProgress;
use belay_env::systems::{ActiveReward, ActiveTermination, Physics, StepOutcome};

use crate::applicator::GraspApplicator;

// ---------------------------------------------------------------------------
// ClimbEnv
// ---------------------------------------------------------------------------

/// Climbing environment owning its Bevy [`App`] and physics collaborator.
///
/// Each call to [`step`](Self::step) validates the action, hands it to the
/// [`ActionApplicator`], runs one ECS update and reads back the
/// [`StepOutcome`].
///
/// # Example
///
/// ```no_run
/// use belay_core::config::ClimbConfig;
/// use belay_core::physics::ClimbPhysics;
/// use belay_core::types::Action;
/// use belay_gym::env::ClimbEnv;
///
/// fn run(physics: Box<dyn ClimbPhysics>) -> Result<(), belay_core::error::BelayError> {
///     let config = ClimbConfig::default();
///     let mut env = ClimbEnv::from_config(&config, physics)?;
///     env.reset(Some(42));
///     let result = env.step(&Action::zeros(config.simulation.action_dim()))?;
///     println!("reward {}", result.reward);
///     Ok(())
/// }
/// ```
pub struct ClimbEnv {
    app: App,
    applicator: Box<dyn ActionApplicator>,
    num_joints: usize,
    obs_space: BoxSpace,
    act_space: BoxSpace,
}

impl ClimbEnv {
    /// Build an environment for `config` on top of `physics`.
    ///
    /// The config is validated and the wall must offer at least as many
    /// holds as the config lists. Call [`reset`](Self::reset) before the
    /// first step.
    pub fn from_config(
        config: &ClimbConfig,
        physics: Box<dyn ClimbPhysics>,
    ) -> Result<Self, BelayError> {
        Self::from_app(App::new(), config, physics)
    }

    /// Like [`from_config`](Self::from_config), on an `app` that may already
    /// carry extra plugins. The app must not be finished yet.
    pub fn from_app(
        mut app: App,
        config: &ClimbConfig,
        physics: Box<dyn ClimbPhysics>,
    ) -> Result<Self, BelayError> {
        config.validate()?;
        let body_dim = physics.body_state().len();

        if !app.is_plugin_added::<ClimbEnvPlugin>() {
            app.add_plugins(ClimbEnvPlugin);
        }
        belay_env::install_task(app.world_mut(), config, physics)?;
        app.finish();
        app.cleanup();

        Ok(Self {
            app,
            applicator: Box::new(GraspApplicator),
            num_joints: config.simulation.num_joints,
            obs_space: BoxSpace::uniform(body_dim + TASK_DIM, f32::NEG_INFINITY, f32::INFINITY),
            act_space: BoxSpace::uniform(config.simulation.action_dim(), -1.0, 1.0),
        })
    }

    /// Builder: replace the action applicator.
    #[must_use]
    pub fn with_applicator(mut self, applicator: Box<dyn ActionApplicator>) -> Self {
        self.applicator = applicator;
        self
    }

    /// Builder: replace the configured reward strategy.
    #[must_use]
    pub fn with_reward(mut self, reward: Box<dyn RewardFunction>) -> Self {
        self.app.insert_resource(ActiveReward(reward));
        self
    }

    /// Builder: replace the termination conditions.
    #[must_use]
    pub fn with_termination(mut self, termination: CompositeTermination) -> Self {
        self.app.insert_resource(ActiveTermination(termination));
        self
    }

    /// Observation space descriptor.
    pub const fn observation_space(&self) -> &BoxSpace {
        &self.obs_space
    }

    /// Action space descriptor: joint controls then four grasp intents.
    pub const fn action_space(&self) -> &BoxSpace {
        &self.act_space
    }

    pub const fn num_joints(&self) -> usize {
        self.num_joints
    }

    /// Reset the physics and start a new episode at stance 0.
    ///
    /// Every attachment is dropped, the exclusion set and best-distance
    /// baseline of the first stance are activated and the step counter is
    /// cleared. No ECS update runs.
    pub fn reset(&mut self, seed: Option<u64>) -> ResetResult {
        let world = self.app.world_mut();
        world.resource_mut::<Physics>().0.reset(seed);
        world.resource_mut::<Episode>().reset(seed);

        let progress = {
            let plan = world.resource::<MotionPlan>();
            let physics = world.resource::<Physics>();
            EpisodeProgress::start(plan, physics.0.as_ref())
        };
        let desired = progress.desired_stance(world.resource::<MotionPlan>());
        let is_success = desired.is_reached_by(&progress.current_stance);

        let observation = world.resource_scope(|world, mut buffer: Mut<ObservationBuffer>| {
            let physics = world.resource::<Physics>();
            buffer.collect(physics.0.as_ref(), &progress, &desired)
        });
        world.insert_resource(progress);
        world.insert_resource(StepOutcome {
            observation: observation.clone(),
            is_success,
            ..StepOutcome::default()
        });

        ResetResult {
            observation,
            info: ResetInfo {
                seed,
                is_success,
                desired_stance: desired,
            },
        }
    }

    /// Take one step with the given action.
    ///
    /// The action is validated before anything touches the simulation.
    /// Stepping may continue after termination or truncation.
    pub fn step(&mut self, action: &Action) -> Result<StepResult, BelayError> {
        let action = ClimbAction::from_action(action, self.num_joints)?;
        if !self.app.world().resource::<Episode>().is_started() {
            return Err(SimError::ResetRequired.into());
        }

        self.applicator.apply(self.app.world_mut(), &action)?;
        self.app.update();

        let world = self.app.world();
        let outcome = world.resource::<StepOutcome>();
        let episode = world.resource::<Episode>();
        Ok(StepResult {
            observation: outcome.observation.clone(),
            reward: outcome.reward,
            terminated: outcome.terminated,
            truncated: outcome.truncated,
            info: StepInfo {
                is_success: outcome.is_success,
                episode_length: episode.step_count,
                episode_reward: episode.total_reward,
                desired_stance_index: outcome.desired_index,
                current_stance: outcome.snapshot.current_stance,
                desired_stance: outcome.snapshot.desired_stance,
                plan_complete: outcome.plan_complete,
                on_floor: outcome.snapshot.on_floor,
            },
        })
    }

    /// Progress of the running episode.
    pub fn progress(&self) -> &EpisodeProgress {
        self.app.world().resource::<EpisodeProgress>()
    }

    pub fn episode(&self) -> &Episode {
        self.app.world().resource::<Episode>()
    }

    pub fn plan(&self) -> &MotionPlan {
        self.app.world().resource::<MotionPlan>()
    }

    /// Read-only access to the underlying [`App`].
    pub const fn app(&self) -> &App {
        &self.app
    }

    /// Mutable access to the underlying [`App`].
    pub const fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
