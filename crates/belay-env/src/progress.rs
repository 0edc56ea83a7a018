//! Per-episode progress state and the physics queries that feed it.

use bevy::prelude::*;

use belay_core::physics::{BodyPart, ClimbPhysics, Surface};
use belay_core::types::{Effector, EffectorDistances, HoldIndex, Stance};

use crate::plan::MotionPlan;
use crate::tracker;

// ---------------------------------------------------------------------------
// Physics queries
// ---------------------------------------------------------------------------

/// Euclidean distance from each effector to the hold `stance` names for it.
///
/// Free slots, and holds the physics layer cannot place, measure 0.
pub fn stance_distances(physics: &dyn ClimbPhysics, stance: &Stance) -> EffectorDistances {
    let mut distances = EffectorDistances::ZERO;
    for effector in Effector::ALL {
        let Some(hold) = stance.get(effector) else {
            continue;
        };
        if let Some(target) = physics.hold_position(hold) {
            distances.0[effector.index()] = physics.effector_position(effector).distance(target);
        }
    }
    distances
}

/// Any body part other than the feet touches the floor.
pub fn is_on_floor(physics: &dyn ClimbPhysics) -> bool {
    BodyPart::ALL
        .iter()
        .filter(|part| !part.is_foot())
        .any(|&part| physics.is_body_part_in_contact(part, Surface::Floor))
}

/// Any body part touches `surface`.
pub fn is_touching(physics: &dyn ClimbPhysics, surface: Surface) -> bool {
    BodyPart::ALL
        .iter()
        .any(|&part| physics.is_body_part_in_contact(part, surface))
}

// ---------------------------------------------------------------------------
// EpisodeProgress
// ---------------------------------------------------------------------------

/// Mutable stance-tracking state of the running episode.
///
/// Created at reset, updated every step, discarded at the next reset.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct EpisodeProgress {
    /// Holds gripped right now, written only by the attachment tracker.
    pub current_stance: Stance,
    /// Index of the desired stance; equals the plan length once complete.
    pub desired_index: usize,
    /// Closest distances seen since the desired stance was activated.
    pub best_distances: EffectorDistances,
    /// Holds that may not be gripped for the desired stance.
    pub excluded_holds: Vec<HoldIndex>,
    /// Steps spent since the desired stance was activated.
    pub steps_on_stance: u32,
}

impl EpisodeProgress {
    /// Fresh state for stance 0 of `plan`.
    pub fn start(plan: &MotionPlan, physics: &dyn ClimbPhysics) -> Self {
        let first = plan.planned(0).map(|p| (p.stance, p.exclude.clone()));
        let (stance, excluded_holds) = first.unwrap_or_default();
        Self {
            current_stance: tracker::current_stance(physics),
            desired_index: 0,
            best_distances: stance_distances(physics, &stance),
            excluded_holds,
            steps_on_stance: 0,
        }
    }

    /// Every stance of `plan` has been reached.
    pub fn is_complete(&self, plan: &MotionPlan) -> bool {
        self.desired_index >= plan.len()
    }

    /// Stance the agent is working towards.
    ///
    /// Once the plan is complete this stays at the final stance.
    pub fn desired_stance(&self, plan: &MotionPlan) -> Stance {
        plan.stance(self.desired_index)
            .unwrap_or_else(|_| plan.last().stance)
    }

    /// Whether `hold` may be gripped right now.
    pub fn is_excluded(&self, hold: HoldIndex) -> bool {
        self.excluded_holds.contains(&hold)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlannedStance;
    use approx::assert_relative_eq;
    use bevy::math::DVec3;
    use belay_test_utils::mocks::ScriptedWall;

    fn stance(raw: [i64; 4]) -> Stance {
        Stance::from_raw(raw).unwrap()
    }

    fn plan() -> MotionPlan {
        MotionPlan::new(vec![
            PlannedStance::new("a", stance([0, 1, -1, -1])).with_exclude([HoldIndex(2)]),
            PlannedStance::new("b", stance([0, 1, 2, -1])),
        ])
        .unwrap()
    }

    #[test]
    fn distances_zero_for_free_slots() {
        let wall = ScriptedWall::new(3);
        wall.handle()
            .set_effector_position(Effector::LeftFoot, DVec3::new(5.0, 5.0, 5.0));
        let d = stance_distances(&wall, &stance([-1, -1, -1, -1]));
        assert_eq!(d, EffectorDistances::ZERO);
    }

    #[test]
    fn distances_are_euclidean() {
        let wall = ScriptedWall::new(3);
        let handle = wall.handle();
        handle.set_hold_position(1, DVec3::new(0.0, 3.0, 4.0));
        handle.set_effector_position(Effector::RightHand, DVec3::ZERO);
        let d = stance_distances(&wall, &stance([-1, 1, -1, -1]));
        assert_relative_eq!(d.get(Effector::RightHand), 5.0);
        assert_relative_eq!(d.sum(), 5.0);
    }

    #[test]
    fn floor_contact_ignores_feet() {
        let wall = ScriptedWall::new(1);
        let handle = wall.handle();
        handle.set_contact(BodyPart::LeftFoot, Surface::Floor, true);
        handle.set_contact(BodyPart::RightFoot, Surface::Floor, true);
        assert!(!is_on_floor(&wall));
        assert!(is_touching(&wall, Surface::Floor));

        handle.set_contact(BodyPart::Pelvis, Surface::Floor, true);
        assert!(is_on_floor(&wall));
    }

    #[test]
    fn start_uses_first_stance() {
        let wall = ScriptedWall::new(3);
        let handle = wall.handle();
        handle.set_hold_position(0, DVec3::new(1.0, 0.0, 0.0));
        handle.set_hold_position(1, DVec3::new(0.0, 2.0, 0.0));

        let progress = EpisodeProgress::start(&plan(), &wall);
        assert_eq!(progress.desired_index, 0);
        assert_eq!(progress.current_stance, Stance::FREE);
        assert_eq!(progress.excluded_holds, vec![HoldIndex(2)]);
        assert!(progress.is_excluded(HoldIndex(2)));
        assert!(!progress.is_excluded(HoldIndex(0)));
        assert_eq!(progress.best_distances, EffectorDistances([1.0, 2.0, 0.0, 0.0]));
    }

    #[test]
    fn desired_stance_stays_final_once_complete() {
        let wall = ScriptedWall::new(3);
        let plan = plan();
        let mut progress = EpisodeProgress::start(&plan, &wall);
        assert_eq!(progress.desired_stance(&plan), stance([0, 1, -1, -1]));
        progress.desired_index = 2;
        assert!(progress.is_complete(&plan));
        assert_eq!(progress.desired_stance(&plan), stance([0, 1, 2, -1]));
    }
}
