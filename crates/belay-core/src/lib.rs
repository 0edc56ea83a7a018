//! Types, traits, config, rewards and errors for the belay climbing environment.
//!
//! Every per-step system in the workspace runs in one of the [`ClimbSet`]
//! phases, which [`ClimbCorePlugin`] chains in a fixed order on `Update`.

pub mod config;
pub mod error;
pub mod physics;
pub mod rewards;
pub mod seed;
pub mod terminations;
pub mod traits;
pub mod types;

use bevy::prelude::*;

// ---------------------------------------------------------------------------
// ClimbSet
// ---------------------------------------------------------------------------

/// Per-step phases, run in declaration order.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClimbSet {
    /// Advance the physics collaborator one tick.
    Simulate,
    /// Resolve attachment constraints into the current stance.
    Track,
    /// Build the observation and the step snapshot.
    Observe,
    /// Compute the shaped reward against the pre-advance desired stance.
    Evaluate,
    /// Advance the motion plan when the desired stance is reached.
    Sequence,
    /// Decide termination and truncation.
    Decide,
    /// Statistics and other read-only consumers.
    Communicate,
}

// ---------------------------------------------------------------------------
// ClimbCorePlugin
// ---------------------------------------------------------------------------

/// Configures [`ClimbSet`] ordering.
pub struct ClimbCorePlugin;

impl Plugin for ClimbCorePlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            Update,
            (
                ClimbSet::Simulate,
                ClimbSet::Track,
                ClimbSet::Observe,
                ClimbSet::Evaluate,
                ClimbSet::Sequence,
                ClimbSet::Decide,
                ClimbSet::Communicate,
            )
                .chain(),
        );
    }
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::config::{ClimbConfig, RewardConfig, RewardVariant, StanceConfig};
    pub use crate::error::{BelayError, ConfigError, PlanError, SimError, ValidationError};
    pub use crate::physics::{BodyPart, ClimbPhysics, Surface};
    pub use crate::traits::{
        ActionApplicator, CompositeReward, CompositeTermination, Policy, RewardFunction,
        TerminationCondition,
    };
    pub use crate::types::{
        Action, BoxSpace, ClimbAction, Effector, EffectorDistances, HoldIndex, Observation,
        ResetInfo, ResetResult, Stance, StepInfo, StepResult, StepSnapshot,
    };
    pub use crate::{ClimbCorePlugin, ClimbSet};
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Resource, Default)]
    struct Order(Vec<&'static str>);

    #[test]
    fn sets_run_in_declaration_order() {
        let mut app = App::new();
        app.add_plugins(ClimbCorePlugin);
        app.init_resource::<Order>();
        // Registered in reverse to prove the set chain decides ordering.
        app.add_systems(
            Update,
            (
                (|mut o: ResMut<Order>| o.0.push("communicate")).in_set(ClimbSet::Communicate),
                (|mut o: ResMut<Order>| o.0.push("decide")).in_set(ClimbSet::Decide),
                (|mut o: ResMut<Order>| o.0.push("sequence")).in_set(ClimbSet::Sequence),
                (|mut o: ResMut<Order>| o.0.push("evaluate")).in_set(ClimbSet::Evaluate),
                (|mut o: ResMut<Order>| o.0.push("observe")).in_set(ClimbSet::Observe),
                (|mut o: ResMut<Order>| o.0.push("track")).in_set(ClimbSet::Track),
                (|mut o: ResMut<Order>| o.0.push("simulate")).in_set(ClimbSet::Simulate),
            ),
        );
        app.update();
        assert_eq!(
            app.world().resource::<Order>().0,
            vec![
                "simulate",
                "track",
                "observe",
                "evaluate",
                "sequence",
                "decide",
                "communicate"
            ]
        );
    }
}
