//! Headless episode runner.
//!
//! Drives a [`ClimbEnv`] with a [`Policy`] until each episode terminates or
//! is truncated. Seeds come from a [`SeedHierarchy`] so a run is
//! reproducible from its root seed.

use bevy::log::{debug, info};
use serde::{Deserialize, Serialize};

use belay_core::error::BelayError;
use belay_core::seed::SeedHierarchy;
use belay_core::traits::Policy;
use belay_gym::env::ClimbEnv;

// ---------------------------------------------------------------------------
// EpisodeSummary
// ---------------------------------------------------------------------------

/// Outcome of one headless episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub seed: Option<u64>,
    pub steps: u32,
    pub total_reward: f64,
    /// The final step matched the desired stance.
    pub is_success: bool,
    pub plan_complete: bool,
    pub terminated: bool,
    pub truncated: bool,
    /// Index of the desired stance when the episode ended.
    pub final_stance_index: usize,
}

/// Run one episode from `reset(seed)` to termination or truncation.
pub fn run_episode(
    env: &mut ClimbEnv,
    policy: &dyn Policy,
    seed: Option<u64>,
) -> Result<EpisodeSummary, BelayError> {
    let mut observation = env.reset(seed).observation;
    loop {
        let action = policy.get_action(&observation);
        let result = env.step(&action)?;
        if result.terminated || result.truncated {
            let summary = EpisodeSummary {
                seed,
                steps: result.info.episode_length,
                total_reward: result.info.episode_reward,
                is_success: result.info.is_success,
                plan_complete: result.info.plan_complete,
                terminated: result.terminated,
                truncated: result.truncated,
                final_stance_index: env.progress().desired_index,
            };
            debug!(
                "episode seed {seed:?}: {} steps, reward {:.3}, success {}",
                summary.steps, summary.total_reward, summary.is_success
            );
            return Ok(summary);
        }
        observation = result.observation;
    }
}

// ---------------------------------------------------------------------------
// HeadlessRunner
// ---------------------------------------------------------------------------

/// Runs batches of episodes with per-episode derived seeds.
pub struct HeadlessRunner {
    seeds: SeedHierarchy,
    episodes_run: u64,
}

impl HeadlessRunner {
    pub const fn new(root_seed: u64) -> Self {
        Self {
            seeds: SeedHierarchy::new(root_seed),
            episodes_run: 0,
        }
    }

    pub const fn episodes_run(&self) -> u64 {
        self.episodes_run
    }

    /// Run `episodes` episodes with `policy`.
    pub fn run(
        &mut self,
        env: &mut ClimbEnv,
        policy: &dyn Policy,
        episodes: usize,
    ) -> Result<Vec<EpisodeSummary>, BelayError> {
        info!("running {episodes} episodes with {}", policy.name());
        let mut summaries = Vec::with_capacity(episodes);
        for _ in 0..episodes {
            let seed = self.seeds.episode_seed(0, self.episodes_run);
            self.episodes_run += 1;
            summaries.push(run_episode(env, policy, Some(seed))?);
        }
        Ok(summaries)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EpisodeStats;
    use crate::builder::SceneBuilder;
    use crate::policies::{ConstantPolicy, ZeroPolicy};
    use belay_core::physics::{BodyPart, Surface};
    use belay_core::types::{Effector, HoldIndex};
    use belay_test_utils::fixtures::{TEST_JOINTS, line_config};
    use belay_test_utils::mocks::{ScriptEvent, ScriptHandle, ScriptedWall};

    fn scripted_env(max_steps: u32) -> (ClimbEnv, ScriptHandle) {
        let wall = ScriptedWall::new(3);
        let handle = wall.handle();
        let env = SceneBuilder::new(line_config(3, &[[0, -1, -1, -1], [1, -1, -1, -1]]))
            .with_max_episode_steps(max_steps)
            .with_physics(Box::new(wall))
            .build()
            .unwrap();
        (env, handle)
    }

    #[test]
    fn idle_policy_truncates() {
        let (mut env, _) = scripted_env(8);
        let summary = run_episode(&mut env, &ZeroPolicy::new(TEST_JOINTS + 4), Some(3)).unwrap();
        assert!(summary.truncated);
        assert!(!summary.terminated);
        assert!(!summary.plan_complete);
        assert_eq!(summary.steps, 8);
        assert_eq!(summary.final_stance_index, 0);
    }

    #[test]
    fn gripping_policy_completes_plan() {
        let (mut env, handle) = scripted_env(20);
        let hand = BodyPart::of(Effector::LeftHand);
        handle.set_contact(hand, Surface::Hold(HoldIndex(0)), true);
        // After the first stance, move the hand from hold 0 to hold 1.
        handle.schedule(2, ScriptEvent::Detach(Effector::LeftHand));
        handle.schedule(2, ScriptEvent::Contact(hand, Surface::Hold(HoldIndex(0)), false));
        handle.schedule(2, ScriptEvent::Contact(hand, Surface::Hold(HoldIndex(1)), true));

        let policy = ConstantPolicy::grip(TEST_JOINTS, [true, false, false, false]);
        let summary = run_episode(&mut env, &policy, None).unwrap();
        assert!(summary.terminated);
        assert!(summary.plan_complete);
        assert!(summary.is_success);
        assert_eq!(summary.steps, 3);
        assert_eq!(summary.final_stance_index, 2);

        let stats = env.app().world().resource::<EpisodeStats>();
        assert_eq!(stats.episodes_completed, 1);
        assert_eq!(stats.successes, 1);
        assert_eq!(stats.stance_advances, 2);
    }

    #[test]
    fn runner_derives_distinct_seeds() {
        let (mut env, handle) = scripted_env(3);
        let mut runner = HeadlessRunner::new(17);
        let summaries = runner
            .run(&mut env, &ZeroPolicy::new(TEST_JOINTS + 4), 3)
            .unwrap();

        assert_eq!(summaries.len(), 3);
        assert_eq!(runner.episodes_run(), 3);
        assert_ne!(summaries[0].seed, summaries[1].seed);
        assert_eq!(handle.resets(), 3);
        assert_eq!(handle.last_seed(), summaries[2].seed);

        let stats = env.app().world().resource::<EpisodeStats>();
        assert_eq!(stats.episodes_completed, 3);
        assert_eq!(stats.total_steps, 9);
    }
}
