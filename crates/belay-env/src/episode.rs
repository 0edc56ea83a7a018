//! Episode state machine and lifecycle management.
//!
//! An episode is a single climb attempt from reset to termination or
//! truncation. The [`Episode`] resource owns the step counter and the
//! accumulated reward.

use bevy::prelude::*;

use belay_core::config::SimulationConfig;

// ---------------------------------------------------------------------------
// EpisodeState
// ---------------------------------------------------------------------------

/// Lifecycle state of an episode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EpisodeState {
    /// Before the first reset.
    #[default]
    Idle,
    /// Actively stepping.
    Running,
    /// Ended by plan completion or a fall.
    Done,
    /// Ended by a step limit.
    Truncated,
}

impl EpisodeState {
    /// Returns `true` if the episode is finished (Done or Truncated).
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Truncated)
    }

    /// Returns `true` if the episode is active.
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}

// ---------------------------------------------------------------------------
// EpisodeConfig
// ---------------------------------------------------------------------------

/// Step limits for an episode.
#[derive(Resource, Clone, Debug, PartialEq, Eq)]
pub struct EpisodeConfig {
    /// Truncate once this many steps have been taken.
    pub max_episode_steps: u32,
    /// Truncate after this many steps without reaching the desired stance.
    ///
    /// Fires on the step where `steps_on_stance` reaches the budget, one
    /// step before a strict `steps_on_stance > budget` check would.
    pub stance_step_budget: Option<u32>,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self::from(&SimulationConfig::default())
    }
}

impl From<&SimulationConfig> for EpisodeConfig {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            max_episode_steps: config.max_episode_steps,
            stance_step_budget: config.stance_step_budget,
        }
    }
}

impl EpisodeConfig {
    /// Builder: set max episode steps.
    #[must_use]
    pub const fn with_max_steps(mut self, steps: u32) -> Self {
        self.max_episode_steps = steps;
        self
    }

    /// Builder: set the per-stance step budget.
    #[must_use]
    pub const fn with_stance_step_budget(mut self, budget: Option<u32>) -> Self {
        self.stance_step_budget = budget;
        self
    }

    /// Whether `step_count` total steps, `steps_on_stance` of them on the
    /// current stance, hit a limit.
    pub fn is_truncated(&self, step_count: u32, steps_on_stance: u32) -> bool {
        step_count >= self.max_episode_steps
            || self
                .stance_step_budget
                .is_some_and(|budget| steps_on_stance >= budget)
    }
}

// ---------------------------------------------------------------------------
// Episode
// ---------------------------------------------------------------------------

/// Bevy resource tracking the current episode's state.
#[derive(Resource, Clone, Debug, Default)]
pub struct Episode {
    /// Current lifecycle state.
    pub state: EpisodeState,
    /// Number of steps taken this episode.
    pub step_count: u32,
    /// Total accumulated reward this episode.
    pub total_reward: f64,
    /// Seed used for this episode (set on reset).
    pub seed: Option<u64>,
    /// Number of episodes started since app start.
    pub episode_number: u32,
}

impl Episode {
    /// Reset the episode to `Running` with an optional seed.
    pub const fn reset(&mut self, seed: Option<u64>) {
        self.state = EpisodeState::Running;
        self.step_count = 0;
        self.total_reward = 0.0;
        self.seed = seed;
        self.episode_number += 1;
    }

    /// Whether the episode has been reset at least once.
    pub fn is_started(&self) -> bool {
        self.state != EpisodeState::Idle
    }

    /// Count one step. Returns `false` before the first reset.
    ///
    /// Steps keep counting after the episode has ended.
    pub const fn begin_step(&mut self) -> bool {
        if matches!(self.state, EpisodeState::Idle) {
            return false;
        }
        self.step_count = self.step_count.saturating_add(1);
        true
    }

    /// Add the reward of the current step.
    pub fn accumulate(&mut self, reward: f64) {
        self.total_reward += reward;
    }

    /// Mark the episode as done (plan complete or fallen).
    pub const fn terminate(&mut self) {
        self.state = EpisodeState::Done;
    }

    /// Mark the episode as truncated (step limit).
    pub const fn truncate(&mut self) {
        self.state = EpisodeState::Truncated;
    }

    /// Record the outcome of a step. Only a running episode changes state;
    /// termination wins over truncation.
    pub const fn finish(&mut self, terminated: bool, truncated: bool) {
        if !self.state.is_running() {
            return;
        }
        if terminated {
            self.terminate();
        } else if truncated {
            self.truncate();
        }
    }

    /// Whether the episode is in a terminal state.
    pub const fn is_done(&self) -> bool {
        self.state.is_terminal()
    }

    /// Whether the episode is actively running.
    pub const fn is_running(&self) -> bool {
        self.state.is_running()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
