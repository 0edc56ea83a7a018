//! Vectorized climbing environments for batched training.
//!
//! [`ClimbVecEnv`] owns several independent [`ClimbEnv`]s, each with its own
//! App and physics. Reset seeds are derived per environment and per episode
//! from one root seed, and finished environments reset themselves on the
//! step that ends them.

use bevy::log::debug;
use serde::{Deserialize, Serialize};

use belay_core::config::ClimbConfig;
use belay_core::error::{BelayError, ConfigError, SimError, ValidationError};
use belay_core::physics::ClimbPhysics;
use belay_core::seed::SeedHierarchy;
use belay_core::types::{Action, BoxSpace, ClimbAction, Observation, ResetResult, StepInfo};

use crate::env::ClimbEnv;

// ---------------------------------------------------------------------------
// BatchStepResult
// ---------------------------------------------------------------------------

/// Results of stepping every environment once.
///
/// For an environment that finished this step, `observations` holds the
/// first observation of its next episode and `final_observations` the last
/// observation of the finished one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchStepResult {
    pub observations: Vec<Observation>,
    pub rewards: Vec<f64>,
    pub terminated: Vec<bool>,
    pub truncated: Vec<bool>,
    pub infos: Vec<StepInfo>,
    pub final_observations: Vec<Option<Observation>>,
}

impl BatchStepResult {
    fn with_capacity(n: usize) -> Self {
        Self {
            observations: Vec::with_capacity(n),
            rewards: Vec::with_capacity(n),
            terminated: Vec::with_capacity(n),
            truncated: Vec::with_capacity(n),
            infos: Vec::with_capacity(n),
            final_observations: Vec::with_capacity(n),
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Indices of environments that finished this step.
    pub fn done_indices(&self) -> Vec<usize> {
        (0..self.len())
            .filter(|&i| self.terminated[i] || self.truncated[i])
            .collect()
    }
}

// ---------------------------------------------------------------------------
// ClimbVecEnv
// ---------------------------------------------------------------------------

/// A fixed batch of climbing environments sharing one task config.
pub struct ClimbVecEnv {
    envs: Vec<ClimbEnv>,
    seeds: SeedHierarchy,
    episodes: Vec<u64>,
    auto_reset: bool,
}

impl ClimbVecEnv {
    /// Build `num_envs` environments, asking `make_physics` for the wall of
    /// each one by index. The root seed comes from `config.simulation.seed`.
    pub fn new(
        config: &ClimbConfig,
        num_envs: usize,
        mut make_physics: impl FnMut(usize) -> Box<dyn ClimbPhysics>,
    ) -> Result<Self, BelayError> {
        if num_envs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "num_envs".into(),
                message: "must be > 0".into(),
            }
            .into());
        }
        let envs = (0..num_envs)
            .map(|i| ClimbEnv::from_config(config, make_physics(i)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            envs,
            seeds: SeedHierarchy::new(config.simulation.seed),
            episodes: vec![0; num_envs],
            auto_reset: true,
        })
    }

    /// Builder: toggle automatic reset of finished environments.
    #[must_use]
    pub const fn with_auto_reset(mut self, auto_reset: bool) -> Self {
        self.auto_reset = auto_reset;
        self
    }

    pub fn num_envs(&self) -> usize {
        self.envs.len()
    }

    pub fn observation_space(&self) -> &BoxSpace {
        self.envs[0].observation_space()
    }

    pub fn action_space(&self) -> &BoxSpace {
        self.envs[0].action_space()
    }

    pub fn env(&self, index: usize) -> Option<&ClimbEnv> {
        self.envs.get(index)
    }

    pub fn env_mut(&mut self, index: usize) -> Option<&mut ClimbEnv> {
        self.envs.get_mut(index)
    }

    /// Seed the next reset of environment `index` will use.
    pub fn next_seed(&self, index: usize) -> u64 {
        self.seeds.episode_seed(index, self.episodes[index])
    }

    /// Reset every environment. `seed`, when given, replaces the root seed
    /// and restarts the per-environment episode counters.
    pub fn reset_all(&mut self, seed: Option<u64>) -> Vec<ResetResult> {
        if let Some(root) = seed {
            self.seeds = SeedHierarchy::new(root);
            self.episodes.fill(0);
        }
        (0..self.envs.len()).map(|i| self.reset_env(i)).collect()
    }

    /// Step every environment with its own action.
    ///
    /// Fails without stepping anything if the batch size is wrong, any
    /// action is invalid or any environment has not been reset.
    pub fn step_all(&mut self, actions: &[Action]) -> Result<BatchStepResult, BelayError> {
        if actions.len() != self.envs.len() {
            return Err(ValidationError::BatchSizeMismatch {
                expected: self.envs.len(),
                got: actions.len(),
            }
            .into());
        }
        for (env, action) in self.envs.iter().zip(actions) {
            ClimbAction::from_action(action, env.num_joints())?;
            if !env.episode().is_started() {
                return Err(SimError::ResetRequired.into());
            }
        }

        let mut batch = BatchStepResult::with_capacity(self.envs.len());
        for (i, action) in actions.iter().enumerate() {
            let result = self.envs[i].step(action)?;
            let done = result.terminated || result.truncated;
            let (observation, final_observation) = if done && self.auto_reset {
                debug!(
                    "env {i} finished after {} steps, auto-resetting",
                    result.info.episode_length
                );
                (self.reset_env(i).observation, Some(result.observation))
            } else {
                (result.observation, None)
            };
            batch.observations.push(observation);
            batch.rewards.push(result.reward);
            batch.terminated.push(result.terminated);
            batch.truncated.push(result.truncated);
            batch.infos.push(result.info);
            batch.final_observations.push(final_observation);
        }
        Ok(batch)
    }

    fn reset_env(&mut self, index: usize) -> ResetResult {
        let seed = self.next_seed(index);
        self.episodes[index] += 1;
        self.envs[index].reset(Some(seed))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use belay_core::types::Effector;
    use belay_test_utils::fixtures::{TEST_JOINTS, grip_action, line_config, release_action};
    use belay_test_utils::mocks::{ScriptHandle, ScriptedWall};

    fn build(num_envs: usize, max_steps: u32) -> (ClimbVecEnv, Vec<ScriptHandle>) {
        let mut config = line_config(3, &[[0, -1, -1, -1]]);
        config.simulation.max_episode_steps = max_steps;
        config.simulation.seed = 11;
        let mut handles = Vec::new();
        let vec_env = ClimbVecEnv::new(&config, num_envs, |_| {
            let wall = ScriptedWall::new(3);
            handles.push(wall.handle());
            Box::new(wall)
        })
        .unwrap();
        (vec_env, handles)
    }

    #[test]
    fn zero_envs_rejected() {
        let config = line_config(1, &[[0, -1, -1, -1]]);
        let result = ClimbVecEnv::new(&config, 0, |_| Box::new(ScriptedWall::new(1)));
        assert!(matches!(result.err(), Some(BelayError::Config(_))));
    }

    #[test]
    fn reset_all_uses_distinct_derived_seeds() {
        let (mut vec_env, handles) = build(3, 10);
        let results = vec_env.reset_all(None);
        assert_eq!(results.len(), 3);

        let seeds: Vec<_> = handles.iter().map(|h| h.last_seed().unwrap()).collect();
        assert_ne!(seeds[0], seeds[1]);
        assert_ne!(seeds[1], seeds[2]);
        assert_eq!(seeds[0], SeedHierarchy::new(11).episode_seed(0, 0));
    }

    #[test]
    fn explicit_root_seed_is_reproducible() {
        let (mut a, ha) = build(2, 10);
        let (mut b, hb) = build(2, 10);
        a.reset_all(Some(5));
        a.reset_all(Some(5));
        b.reset_all(Some(5));
        assert_eq!(ha[1].last_seed(), hb[1].last_seed());
    }

    #[test]
    fn wrong_batch_size_rejected() {
        let (mut vec_env, handles) = build(2, 10);
        vec_env.reset_all(None);
        let err = vec_env
            .step_all(&[release_action(TEST_JOINTS)])
            .unwrap_err();
        assert!(matches!(
            err,
            BelayError::Validation(ValidationError::BatchSizeMismatch { expected: 2, got: 1 })
        ));
        assert_eq!(handles[0].ticks(), 0);
    }

    #[test]
    fn invalid_action_steps_nothing() {
        let (mut vec_env, handles) = build(2, 10);
        vec_env.reset_all(None);
        let actions = [release_action(TEST_JOINTS), Action::zeros(1)];
        assert!(vec_env.step_all(&actions).is_err());
        assert_eq!(handles[0].ticks(), 0);
    }

    #[test]
    fn unreset_env_steps_nothing() {
        let (mut vec_env, handles) = build(2, 10);
        vec_env.env_mut(0).unwrap().reset(None);
        let actions = [release_action(TEST_JOINTS), release_action(TEST_JOINTS)];
        let err = vec_env.step_all(&actions).unwrap_err();
        assert!(matches!(
            err,
            BelayError::Simulation(SimError::ResetRequired)
        ));
        assert_eq!(handles[0].ticks(), 0);
        assert_eq!(vec_env.env(0).unwrap().episode().step_count, 0);
    }

    #[test]
    fn finished_env_auto_resets() {
        let (mut vec_env, handles) = build(2, 10);
        vec_env.reset_all(None);
        handles[1].attach(Effector::LeftHand, 0);

        let actions = [
            release_action(TEST_JOINTS),
            grip_action(TEST_JOINTS, [true, false, false, false]),
        ];
        let batch = vec_env.step_all(&actions).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.done_indices(), vec![1]);
        assert!(batch.infos[1].is_success);
        assert!(batch.final_observations[0].is_none());
        assert!(batch.final_observations[1].is_some());

        // Fresh episode: attachment dropped, new derived seed.
        assert_eq!(handles[1].attachment(Effector::LeftHand), None);
        assert_eq!(handles[1].resets(), 2);
        assert_eq!(vec_env.env(1).unwrap().episode().step_count, 0);
        assert_eq!(vec_env.env(0).unwrap().episode().step_count, 1);
    }

    #[test]
    fn batch_result_serializes() {
        let (mut vec_env, _) = build(2, 10);
        vec_env.reset_all(None);
        let actions = [release_action(TEST_JOINTS), release_action(TEST_JOINTS)];
        let batch = vec_env.step_all(&actions).unwrap();

        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(json["rewards"].as_array().unwrap().len(), 2);
        assert_eq!(json["final_observations"][0], serde_json::Value::Null);
        assert_eq!(json["infos"][1]["episode_length"], 1);
    }

    #[test]
    fn truncation_without_auto_reset_keeps_stepping() {
        let (vec_env, handles) = build(1, 2);
        let mut vec_env = vec_env.with_auto_reset(false);
        vec_env.reset_all(None);
        let actions = [release_action(TEST_JOINTS)];
        vec_env.step_all(&actions).unwrap();
        let batch = vec_env.step_all(&actions).unwrap();
        assert!(batch.truncated[0]);
        assert!(batch.final_observations[0].is_none());

        let batch = vec_env.step_all(&actions).unwrap();
        assert!(batch.truncated[0]);
        assert_eq!(batch.infos[0].episode_length, 3);
        assert_eq!(handles[0].resets(), 1);
    }
}
