//! Attachment tracking: which hold, if any, each effector is gripping.

use bevy::log::warn;

use belay_core::error::SimError;
use belay_core::physics::ClimbPhysics;
use belay_core::types::{Effector, HoldIndex, Stance};

/// Resolve the effector's attachment constraint to a hold.
///
/// Returns `Ok(None)` for a free effector and
/// [`SimError::DanglingAttachment`] when the constraint targets a body that
/// is not one of the wall's holds.
pub fn resolve_attachment(
    physics: &dyn ClimbPhysics,
    effector: Effector,
) -> Result<Option<HoldIndex>, SimError> {
    match physics.attachment_target(effector) {
        None => Ok(None),
        Some(target) if target < physics.hold_count() => Ok(Some(HoldIndex(target))),
        Some(target) => Err(SimError::DanglingAttachment { effector, target }),
    }
}

/// Current stance of the climber.
///
/// Dangling attachments are logged and reported as unattached.
pub fn current_stance(physics: &dyn ClimbPhysics) -> Stance {
    let mut stance = Stance::FREE;
    for effector in Effector::ALL {
        let hold = resolve_attachment(physics, effector).unwrap_or_else(|err| {
            warn!("{err}; treating {effector} as unattached");
            None
        });
        stance.set(effector, hold);
    }
    stance
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
