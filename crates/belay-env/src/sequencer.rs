//! Stance sequencer: advances the motion plan when the desired stance is held.
//!
//! ```text
//! AwaitingStance(0) -> AwaitingStance(1) -> ... -> AwaitingStance(n-1) -> PlanComplete
//! ```
//!
//! Each transition fires when the current stance equals the desired stance
//! exactly. `PlanComplete` is terminal.

use bevy::log::info;

use belay_core::physics::ClimbPhysics;

use crate::plan::MotionPlan;
use crate::progress::{EpisodeProgress, stance_distances};

// ---------------------------------------------------------------------------
// SequencerState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequencerState {
    AwaitingStance(usize),
    PlanComplete,
}

impl SequencerState {
    pub fn of(progress: &EpisodeProgress, plan: &MotionPlan) -> Self {
        if progress.is_complete(plan) {
            Self::PlanComplete
        } else {
            Self::AwaitingStance(progress.desired_index)
        }
    }

    pub const fn is_complete(self) -> bool {
        matches!(self, Self::PlanComplete)
    }
}

// ---------------------------------------------------------------------------
// StanceAdvance
// ---------------------------------------------------------------------------

/// What one sequencer step did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StanceAdvance {
    /// Desired stance not reached yet.
    #[default]
    Holding,
    /// Moved on to the next stance.
    Advanced { from: usize, to: usize },
    /// Reached the final stance; the plan is now complete.
    Completed,
    /// Plan was already complete; nothing changed.
    AlreadyComplete,
}

impl StanceAdvance {
    /// A stance was reached this step.
    pub const fn reached(self) -> bool {
        matches!(self, Self::Advanced { .. } | Self::Completed)
    }
}

// ---------------------------------------------------------------------------
// advance
// ---------------------------------------------------------------------------

/// Compare the current stance against the desired one and advance the plan.
///
/// On a transition to a new stance the exclusion set, the best-distance
/// baseline and the per-stance step count are reset for it. Completing the
/// plan, or being asked to advance past it, touches none of them.
pub fn advance(
    progress: &mut EpisodeProgress,
    plan: &MotionPlan,
    physics: &dyn ClimbPhysics,
) -> StanceAdvance {
    let from = progress.desired_index;
    let Ok(desired) = plan.stance(from) else {
        return StanceAdvance::AlreadyComplete;
    };

    if !desired.is_reached_by(&progress.current_stance) {
        progress.steps_on_stance = progress.steps_on_stance.saturating_add(1);
        return StanceAdvance::Holding;
    }

    let to = from + 1;
    progress.desired_index = to;

    let Ok(next) = plan.planned(to) else {
        info!(
            "Motion plan complete: reached final stance {} '{}' {}",
            from,
            plan.last().name,
            desired
        );
        return StanceAdvance::Completed;
    };

    progress.excluded_holds.clone_from(&next.exclude);
    progress.best_distances = stance_distances(physics, &next.stance);
    progress.steps_on_stance = 0;
    info!(
        "Stance {} reached {}; now targeting stance {} '{}' {}",
        from, desired, to, next.name, next.stance
    );
    StanceAdvance::Advanced { from, to }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
