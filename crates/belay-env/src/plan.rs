//! Motion plan: the ordered stances an episode must satisfy.

use bevy::prelude::*;
use serde::Serialize;

use belay_core::config::{ClimbConfig, NO_OVERRIDE, StanceConfig};
use belay_core::error::{ConfigError, PlanError};
use belay_core::types::{Effector, HoldIndex, Stance};

// ---------------------------------------------------------------------------
// PlannedStance
// ---------------------------------------------------------------------------

/// One step of a [`MotionPlan`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedStance {
    pub name: String,
    pub stance: Stance,
    /// Holds that may not be gripped while this stance is desired.
    pub exclude: Vec<HoldIndex>,
    /// Forced grasp intent per effector.
    pub action_override: [Option<f32>; 4],
}

impl PlannedStance {
    pub fn new(name: impl Into<String>, stance: Stance) -> Self {
        Self {
            name: name.into(),
            stance,
            exclude: Vec::new(),
            action_override: [None; 4],
        }
    }

    #[must_use]
    pub fn with_exclude(mut self, exclude: impl IntoIterator<Item = HoldIndex>) -> Self {
        self.exclude = exclude.into_iter().collect();
        self
    }

    #[must_use]
    pub const fn with_override(mut self, effector: Effector, intent: f32) -> Self {
        self.action_override[effector.index()] = Some(intent);
        self
    }

    /// Convert a validated [`StanceConfig`].
    fn from_config(config: &StanceConfig, hold_count: usize) -> Result<Self, ConfigError> {
        config.validate(hold_count)?;
        let stance = Stance::from_raw(config.holds).ok_or_else(|| ConfigError::UnknownHold {
            stance: config.name.clone(),
            hold: config.holds.iter().copied().min().unwrap_or(-1),
            hold_count,
        })?;
        #[allow(clippy::float_cmp)]
        let action_override = config
            .action_override
            .map(|v| if v == NO_OVERRIDE { None } else { Some(v) });
        Ok(Self {
            name: config.name.clone(),
            stance,
            exclude: config.exclude.iter().copied().map(HoldIndex).collect(),
            action_override,
        })
    }
}

// ---------------------------------------------------------------------------
// MotionPlan
// ---------------------------------------------------------------------------

/// Ordered, non-empty sequence of stances. Read-only once built.
#[derive(Resource, Debug, Clone, PartialEq, Serialize)]
pub struct MotionPlan {
    stances: Vec<PlannedStance>,
}

impl MotionPlan {
    /// Build a plan from stances. Fails on an empty list.
    pub fn new(stances: Vec<PlannedStance>) -> Result<Self, ConfigError> {
        if stances.is_empty() {
            return Err(ConfigError::EmptyPlan);
        }
        Ok(Self { stances })
    }

    /// Build and validate the plan described by `config` against its wall.
    pub fn from_config(config: &ClimbConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let hold_count = config.wall.holds.len();
        let stances = config
            .stances
            .iter()
            .map(|s| PlannedStance::from_config(s, hold_count))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(stances)
    }

    pub fn len(&self) -> usize {
        self.stances.len()
    }

    /// Always `false`; plans are never empty.
    pub fn is_empty(&self) -> bool {
        self.stances.is_empty()
    }

    pub fn planned(&self, index: usize) -> Result<&PlannedStance, PlanError> {
        self.stances
            .get(index)
            .ok_or(PlanError::OutOfRangeStanceIndex {
                index,
                len: self.stances.len(),
            })
    }

    pub fn stance(&self, index: usize) -> Result<Stance, PlanError> {
        self.planned(index).map(|p| p.stance)
    }

    pub fn exclusions(&self, index: usize) -> Result<&[HoldIndex], PlanError> {
        self.planned(index).map(|p| p.exclude.as_slice())
    }

    /// The final stance, reported as "desired" once the plan is complete.
    pub fn last(&self) -> &PlannedStance {
        // Non-empty by construction.
        &self.stances[self.stances.len() - 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlannedStance> {
        self.stances.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
