//! Termination conditions for climbing episodes.
//!
//! Truncation (step limits) is handled by the episode controller, not here.

use crate::traits::{CompositeTermination, TerminationCondition};
use crate::types::StepSnapshot;

// ---------------------------------------------------------------------------
// PlanCompleteTermination
// ---------------------------------------------------------------------------

/// Terminates once every stance of the motion plan has been reached.
pub struct PlanCompleteTermination;

impl TerminationCondition for PlanCompleteTermination {
    fn is_terminated(&self, snapshot: &StepSnapshot) -> bool {
        snapshot.plan_complete
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "PlanCompleteTermination"
    }
}

// ---------------------------------------------------------------------------
// FloorContactTermination
// ---------------------------------------------------------------------------

/// Terminates when any body part other than the feet touches the floor.
pub struct FloorContactTermination;

impl TerminationCondition for FloorContactTermination {
    fn is_terminated(&self, snapshot: &StepSnapshot) -> bool {
        snapshot.on_floor
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "FloorContactTermination"
    }
}

/// Plan completion or a fall.
#[must_use]
pub fn standard() -> CompositeTermination {
    CompositeTermination::new()
        .add(Box::new(PlanCompleteTermination))
        .add(Box::new(FloorContactTermination))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_snapshot_does_not_terminate() {
        assert!(!standard().is_terminated(&StepSnapshot::idle(602)));
    }

    #[test]
    fn plan_complete_terminates() {
        let snapshot = StepSnapshot {
            plan_complete: true,
            ..StepSnapshot::idle(602)
        };
        assert!(PlanCompleteTermination.is_terminated(&snapshot));
        assert!(!FloorContactTermination.is_terminated(&snapshot));
        assert!(standard().is_terminated(&snapshot));
    }

    #[test]
    fn floor_contact_terminates() {
        let snapshot = StepSnapshot {
            on_floor: true,
            ..StepSnapshot::idle(602)
        };
        assert!(FloorContactTermination.is_terminated(&snapshot));
        assert_eq!(standard().triggered(&snapshot), vec!["FloorContactTermination"]);
    }

    #[test]
    fn standard_checks_plan_then_floor() {
        let snapshot = StepSnapshot {
            plan_complete: true,
            on_floor: true,
            ..StepSnapshot::idle(602)
        };
        assert_eq!(
            standard().triggered(&snapshot),
            vec!["PlanCompleteTermination", "FloorContactTermination"]
        );
    }

    #[test]
    fn step_limit_alone_does_not_terminate() {
        let snapshot = StepSnapshot {
            steps: 602,
            ..StepSnapshot::idle(602)
        };
        assert!(!standard().is_terminated(&snapshot));
    }
}
