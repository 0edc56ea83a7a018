//! Grasp control layer between the caller's action and the wall physics.
//!
//! Each step the active stance's action override replaces the caller's grasp
//! intents where set. An effector that wants to grip and is free attaches to
//! the first hold it touches that the current stance does not exclude; an
//! effector that lets go while attached is released.

use bevy::log::debug;
use bevy::prelude::*;

use belay_core::error::SimError;
use belay_core::physics::{BodyPart, ClimbPhysics, Surface};
use belay_core::traits::ActionApplicator;
use belay_core::types::{ClimbAction, Effector, HoldIndex};
use belay_env::plan::MotionPlan;
use belay_env::progress::EpisodeProgress;
use belay_env::systems::Physics;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Grasp intents after the planned stance's overrides.
pub fn effective_grasp(action: &ClimbAction, overrides: &[Option<f32>; 4]) -> [f32; 4] {
    let mut grasp = action.grasp;
    for (intent, forced) in grasp.iter_mut().zip(overrides) {
        if let Some(value) = forced {
            *intent = *value;
        }
    }
    grasp
}

/// First hold `effector` touches that is not in `excluded`.
pub fn touched_hold(
    physics: &dyn ClimbPhysics,
    effector: Effector,
    excluded: &[HoldIndex],
) -> Option<HoldIndex> {
    let part = BodyPart::of(effector);
    (0..physics.hold_count())
        .map(HoldIndex)
        .filter(|hold| !excluded.contains(hold))
        .find(|&hold| physics.is_body_part_in_contact(part, Surface::Hold(hold)))
}

// ---------------------------------------------------------------------------
// GraspApplicator
// ---------------------------------------------------------------------------

/// Default [`ActionApplicator`]: joint controls pass straight through, grasp
/// intents create and destroy attachments.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraspApplicator;

impl ActionApplicator for GraspApplicator {
    fn apply(&self, world: &mut World, action: &ClimbAction) -> Result<(), SimError> {
        let (overrides, excluded) = {
            let plan = world
                .get_resource::<MotionPlan>()
                .ok_or(SimError::ResetRequired)?;
            let progress = world.resource::<EpisodeProgress>();
            let planned = plan
                .planned(progress.desired_index)
                .unwrap_or_else(|_| plan.last());
            (planned.action_override, progress.excluded_holds.clone())
        };
        let grasp = effective_grasp(action, &overrides);

        let mut physics = world
            .get_resource_mut::<Physics>()
            .ok_or(SimError::ResetRequired)?;
        let physics = physics.0.as_mut();

        let mut grips = Vec::new();
        let mut releases = Vec::new();
        for effector in Effector::ALL {
            let grip = grasp[effector.index()] > 0.0;
            let attached = physics.attachment_target(effector).is_some();
            if grip && !attached {
                if let Some(hold) = touched_hold(physics, effector, &excluded) {
                    if physics.hold_position(hold).is_none() {
                        return Err(SimError::UnknownHold { effector, hold });
                    }
                    grips.push((effector, hold));
                }
            } else if !grip && attached {
                releases.push(effector);
            }
        }

        // Nothing below runs unless every grip target is a real hold.
        physics.apply_joint_controls(&action.joints);
        for effector in releases {
            physics.destroy_attachment(effector);
            debug!("{effector} lets go");
        }
        for (effector, hold) in grips {
            physics.create_attachment(effector, hold)?;
            debug!("{effector} grips hold {hold}");
        }
        Ok(())
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "GraspApplicator"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
