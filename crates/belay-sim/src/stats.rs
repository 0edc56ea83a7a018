//! Episode statistics tracking.
//!
//! [`EpisodeStats`] records cumulative statistics across episodes: episodes
//! finished, successes, steps, rewards and stance advances.

use bevy::prelude::*;

use belay_env::episode::{Episode, EpisodeState};
use belay_env::systems::StepOutcome;

// ---------------------------------------------------------------------------
// EpisodeStats
// ---------------------------------------------------------------------------

/// Bevy resource that tracks cumulative statistics across episodes.
#[derive(Resource, Clone, Debug, Default)]
pub struct EpisodeStats {
    /// Total number of finished episodes.
    pub episodes_completed: u32,
    /// Episodes whose last step matched the desired stance.
    pub successes: u32,
    /// Episodes that ended by plan completion or a fall.
    pub terminated: u32,
    /// Episodes that ended by a step limit.
    pub truncated: u32,
    /// Total steps across finished episodes.
    pub total_steps: u64,
    /// Stance transitions (including plan completion) across all episodes.
    pub stance_advances: u64,
    /// Steps per finished episode.
    pub step_history: Vec<u32>,
    /// Total reward per finished episode.
    pub reward_history: Vec<f64>,
    /// Episode number last recorded, so a finished episode counts once.
    last_recorded: Option<u32>,
}

impl EpisodeStats {
    /// Create empty stats.
    pub const fn new() -> Self {
        Self {
            episodes_completed: 0,
            successes: 0,
            terminated: 0,
            truncated: 0,
            total_steps: 0,
            stance_advances: 0,
            step_history: Vec::new(),
            reward_history: Vec::new(),
            last_recorded: None,
        }
    }

    /// Fraction of finished episodes that ended in success.
    pub fn success_rate(&self) -> Option<f64> {
        (self.episodes_completed > 0)
            .then(|| f64::from(self.successes) / f64::from(self.episodes_completed))
    }

    /// Average episode length (steps) across all finished episodes.
    pub fn mean_episode_length(&self) -> Option<f32> {
        if self.step_history.is_empty() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let sum: f32 = self.step_history.iter().map(|&s| s as f32).sum();
        #[allow(clippy::cast_precision_loss)]
        Some(sum / self.step_history.len() as f32)
    }

    /// Average total reward across all finished episodes.
    pub fn mean_episode_reward(&self) -> Option<f64> {
        if self.reward_history.is_empty() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        Some(self.reward_history.iter().sum::<f64>() / self.reward_history.len() as f64)
    }

    /// Record one finished episode.
    pub fn record(&mut self, episode: &Episode, is_success: bool) {
        self.episodes_completed += 1;
        if is_success {
            self.successes += 1;
        }
        match episode.state {
            EpisodeState::Done => self.terminated += 1,
            EpisodeState::Truncated => self.truncated += 1,
            EpisodeState::Idle | EpisodeState::Running => {}
        }
        self.total_steps += u64::from(episode.step_count);
        self.step_history.push(episode.step_count);
        self.reward_history.push(episode.total_reward);
        self.last_recorded = Some(episode.episode_number);
    }

    /// Reset all statistics.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

/// Records stance advances every step and the episode once it finishes.
///
/// Runs in [`ClimbSet::Communicate`](belay_core::ClimbSet::Communicate).
#[allow(clippy::needless_pass_by_value)]
pub fn episode_stats_system(
    episode: Res<Episode>,
    outcome: Res<StepOutcome>,
    mut stats: ResMut<EpisodeStats>,
) {
    let just_finished =
        episode.is_done() && stats.last_recorded != Some(episode.episode_number);
    if !(episode.is_running() || just_finished) {
        return;
    }
    if outcome.advance.reached() {
        stats.stance_advances += 1;
    }
    if just_finished {
        stats.record(&episode, outcome.is_success);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
