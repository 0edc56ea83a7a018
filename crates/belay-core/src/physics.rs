//! Boundary with the physics engine that simulates the climber.
//!
//! Rigid-body dynamics, constraint solving and contact detection live behind
//! [`ClimbPhysics`]. The environment only queries positions, contacts and
//! attachment constraints, creates or destroys attachments, and advances the
//! simulation one tick at a time.

use bevy::math::DVec3;

use crate::error::SimError;
use crate::types::{Effector, HoldIndex};

// ---------------------------------------------------------------------------
// BodyPart
// ---------------------------------------------------------------------------

/// Rigid links of the humanoid climber that can touch the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyPart {
    Head,
    Torso,
    Pelvis,
    LeftUpperArm,
    LeftLowerArm,
    LeftHand,
    RightUpperArm,
    RightLowerArm,
    RightHand,
    LeftThigh,
    LeftShin,
    LeftFoot,
    RightThigh,
    RightShin,
    RightFoot,
}

impl BodyPart {
    pub const ALL: [Self; 15] = [
        Self::Head,
        Self::Torso,
        Self::Pelvis,
        Self::LeftUpperArm,
        Self::LeftLowerArm,
        Self::LeftHand,
        Self::RightUpperArm,
        Self::RightLowerArm,
        Self::RightHand,
        Self::LeftThigh,
        Self::LeftShin,
        Self::LeftFoot,
        Self::RightThigh,
        Self::RightShin,
        Self::RightFoot,
    ];

    /// The link that carries `effector`.
    pub const fn of(effector: Effector) -> Self {
        match effector {
            Effector::LeftHand => Self::LeftHand,
            Effector::RightHand => Self::RightHand,
            Effector::LeftFoot => Self::LeftFoot,
            Effector::RightFoot => Self::RightFoot,
        }
    }

    pub const fn is_foot(self) -> bool {
        matches!(self, Self::LeftFoot | Self::RightFoot)
    }
}

// ---------------------------------------------------------------------------
// Surface
// ---------------------------------------------------------------------------

/// Static scene body a part can be in contact with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    Floor,
    Wall,
    Hold(HoldIndex),
}

// ---------------------------------------------------------------------------
// ClimbPhysics
// ---------------------------------------------------------------------------

/// Trait that concrete physics engines implement to host a climber.
///
/// Implementations own the simulated world. The environment holds exactly one
/// instance per episode and never shares it, so methods take `&mut self`
/// where they change state and no interior locking is expected.
pub trait ClimbPhysics: Send + Sync + 'static {
    /// Number of holds on the wall. Valid hold indices are `0..hold_count()`.
    fn hold_count(&self) -> usize;

    /// World position of a hold, `None` for an unknown index.
    fn hold_position(&self, hold: HoldIndex) -> Option<DVec3>;

    /// World position of an effector link.
    fn effector_position(&self, effector: Effector) -> DVec3;

    /// Raw body index targeted by the effector's active attachment constraint.
    ///
    /// Implementations report whatever the constraint points at; callers must
    /// check the result against [`hold_count`](Self::hold_count).
    fn attachment_target(&self, effector: Effector) -> Option<usize>;

    /// Rigidly attach an effector to a hold, replacing any existing attachment.
    fn create_attachment(&mut self, effector: Effector, hold: HoldIndex) -> Result<(), SimError>;

    /// Remove the effector's attachment, if any.
    fn destroy_attachment(&mut self, effector: Effector);

    /// Whether `part` currently touches `surface`.
    fn is_body_part_in_contact(&self, part: BodyPart, surface: Surface) -> bool;

    /// Torso orientation as (roll, pitch, yaw) in radians.
    fn torso_orientation(&self) -> DVec3;

    /// Torso linear velocity in world coordinates; `z` is up.
    fn torso_linear_velocity(&self) -> DVec3;

    /// Set motor targets for the next tick. `controls` holds one value per joint.
    fn apply_joint_controls(&mut self, controls: &[f32]);

    /// Advance the simulation by one fixed tick.
    fn step_simulation(&mut self);

    /// Restore the initial pose, dropping every attachment constraint.
    fn reset(&mut self, seed: Option<u64>);

    /// Per-link kinematic state appended to observations.
    fn body_state(&self) -> Vec<f32> {
        Vec::new()
    }

    /// Human-readable engine name.
    fn name(&self) -> &str;
}
