use std::fmt;
use std::str::FromStr;

use bevy::math::DVec3;
use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::rewards::{EquationReward, NegativeDistanceReward};

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_max_episode_steps() -> u32 {
    602
}
const fn default_num_joints() -> usize {
    17
}
const fn default_kappa() -> f64 {
    EquationReward::DEFAULT_KAPPA
}
const fn default_sigma() -> f64 {
    EquationReward::DEFAULT_SIGMA
}
const fn default_action_override() -> [f32; 4] {
    [NO_OVERRIDE; 4]
}
fn default_holds() -> Vec<[f64; 3]> {
    HoldLayout::standard().positions
}

/// Sentinel in `action_override` meaning "use the caller's grasp intent".
pub const NO_OVERRIDE: f32 = -1.0;

// ---------------------------------------------------------------------------
// SimulationConfig
// ---------------------------------------------------------------------------

/// Episode-level limits and action layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Truncate after this many steps (default: 602).
    #[serde(default = "default_max_episode_steps")]
    pub max_episode_steps: u32,

    /// Master random seed.
    #[serde(default)]
    pub seed: u64,

    /// Joint controls at the front of every action (default: 17).
    #[serde(default = "default_num_joints")]
    pub num_joints: usize,

    /// Truncate after this many steps without reaching the desired stance.
    /// The step on which the count reaches the budget is already truncated,
    /// so a budget of 700 allows 699 steps that keep the stance pending.
    #[serde(default)]
    pub stance_step_budget: Option<u32>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_episode_steps: default_max_episode_steps(),
            seed: 0,
            num_joints: default_num_joints(),
            stance_step_budget: None,
        }
    }
}

impl SimulationConfig {
    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_episode_steps == 0 {
            return Err(ConfigError::ZeroEpisodeSteps);
        }
        if self.stance_step_budget == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "simulation.stance_step_budget".into(),
                message: "must be > 0 when set".into(),
            });
        }
        Ok(())
    }

    /// Flat action length: joints followed by four grasp intents.
    pub const fn action_dim(&self) -> usize {
        self.num_joints + 4
    }
}

// ---------------------------------------------------------------------------
// HoldLayout / WallConfig
// ---------------------------------------------------------------------------

/// World positions of the holds, indexed by [`HoldIndex`](crate::types::HoldIndex).
#[derive(Debug, Clone, PartialEq)]
pub struct HoldLayout {
    pub positions: Vec<[f64; 3]>,
}

impl HoldLayout {
    const ROWS: usize = 5;
    const COLUMNS: usize = 4;
    const WALL_X: f64 = 0.40;
    const COLUMN_SPACING: f64 = 0.6;
    const COLUMN_OFFSET: f64 = -1.5;
    const ROW_SPACING: f64 = 0.65;

    /// Staggered 5x4 grid with a single top hold, 21 holds in total.
    ///
    /// Rows are numbered bottom-up from 1 and columns left to right from 1.
    /// Odd columns sit 0.2 higher than even ones.
    #[allow(clippy::cast_precision_loss)]
    pub fn standard() -> Self {
        let mut positions = Vec::with_capacity(Self::ROWS * Self::COLUMNS + 1);
        for row in 1..=Self::ROWS {
            for column in 1..=Self::COLUMNS {
                let stagger = 0.2 * (column & 1) as f64 - 0.4;
                positions.push([
                    Self::WALL_X,
                    column as f64 * Self::COLUMN_SPACING + Self::COLUMN_OFFSET,
                    row as f64 * Self::ROW_SPACING + stagger,
                ]);
            }
        }
        positions.push([0.4, 0.0, 3.5]);
        Self { positions }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn position(&self, index: usize) -> Option<DVec3> {
        self.positions.get(index).copied().map(DVec3::from_array)
    }
}

/// Climbing wall description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallConfig {
    /// Hold positions `[x, y, z]` in metres; defaults to [`HoldLayout::standard`].
    #[serde(default = "default_holds")]
    pub holds: Vec<[f64; 3]>,
}

impl Default for WallConfig {
    fn default() -> Self {
        Self {
            holds: default_holds(),
        }
    }
}

impl WallConfig {
    pub fn layout(&self) -> HoldLayout {
        HoldLayout {
            positions: self.holds.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.holds.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "wall.holds".into(),
                message: "wall needs at least one hold".into(),
            });
        }
        if self.holds.iter().flatten().any(|c| !c.is_finite()) {
            return Err(ConfigError::InvalidValue {
                field: "wall.holds".into(),
                message: "hold coordinates must be finite".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RewardConfig
// ---------------------------------------------------------------------------

/// Shaped reward strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardVariant {
    #[default]
    Improved,
    NegativeDistance,
    Equation,
}

impl RewardVariant {
    pub const ALL: [Self; 3] = [Self::Improved, Self::NegativeDistance, Self::Equation];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Improved => "improved",
            Self::NegativeDistance => "negative_distance",
            Self::Equation => "equation",
        }
    }

    /// Bonus paid on a stance match when the config leaves it unset.
    pub const fn default_completion_bonus(self) -> f64 {
        match self {
            Self::Improved => 0.0,
            Self::NegativeDistance => NegativeDistanceReward::DEFAULT_COMPLETION_BONUS,
            Self::Equation => EquationReward::DEFAULT_COMPLETION_BONUS,
        }
    }
}

impl fmt::Display for RewardVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RewardVariant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "reward.variant".into(),
                message: format!("unknown variant '{s}'"),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardConfig {
    #[serde(default)]
    pub variant: RewardVariant,

    /// Overrides the variant's default completion bonus.
    #[serde(default)]
    pub completion_bonus: Option<f64>,

    /// Equation variant proximity scale.
    #[serde(default = "default_kappa")]
    pub kappa: f64,

    /// Equation variant distance decay.
    #[serde(default = "default_sigma")]
    pub sigma: f64,

    /// Equation variant reward while on the floor.
    #[serde(default)]
    pub floor_reward: Option<f64>,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            variant: RewardVariant::default(),
            completion_bonus: None,
            kappa: default_kappa(),
            sigma: default_sigma(),
            floor_reward: None,
        }
    }
}

impl RewardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sigma < 0.0 || !self.sigma.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "reward.sigma".into(),
                message: format!("must be finite and >= 0, got {}", self.sigma),
            });
        }
        if !self.kappa.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "reward.kappa".into(),
                message: "must be finite".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// StanceConfig
// ---------------------------------------------------------------------------

/// One entry of the motion plan as written in TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StanceConfig {
    #[serde(default)]
    pub name: String,

    /// Hold per effector in `[left_hand, right_hand, left_foot, right_foot]`
    /// order; `-1` leaves the effector free.
    pub holds: [i64; 4],

    /// Holds that may not be gripped while this stance is desired.
    #[serde(default)]
    pub exclude: Vec<usize>,

    /// Forced grasp intent per effector; `-1` keeps the caller's intent.
    #[serde(default = "default_action_override")]
    pub action_override: [f32; 4],
}

impl StanceConfig {
    pub fn new(name: impl Into<String>, holds: [i64; 4]) -> Self {
        Self {
            name: name.into(),
            holds,
            exclude: Vec::new(),
            action_override: default_action_override(),
        }
    }

    #[must_use]
    pub fn with_exclude(mut self, exclude: Vec<usize>) -> Self {
        self.exclude = exclude;
        self
    }

    #[must_use]
    pub const fn with_action_override(mut self, action_override: [f32; 4]) -> Self {
        self.action_override = action_override;
        self
    }

    /// Check every hold reference against a wall of `hold_count` holds.
    pub fn validate(&self, hold_count: usize) -> Result<(), ConfigError> {
        let unknown = |hold: i64| ConfigError::UnknownHold {
            stance: self.name.clone(),
            hold,
            hold_count,
        };
        for &hold in &self.holds {
            let in_range = usize::try_from(hold).is_ok_and(|h| h < hold_count);
            if hold != -1 && !in_range {
                return Err(unknown(hold));
            }
        }
        for &hold in &self.exclude {
            if hold >= hold_count {
                return Err(unknown(i64::try_from(hold).unwrap_or(i64::MAX)));
            }
        }
        if self.action_override.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::InvalidValue {
                field: format!("stances.{}.action_override", self.name),
                message: "values must be finite".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ClimbConfig
// ---------------------------------------------------------------------------

/// Complete description of a climbing task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
pub struct ClimbConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,

    #[serde(default)]
    pub wall: WallConfig,

    #[serde(default)]
    pub reward: RewardConfig,

    /// Ordered motion plan.
    #[serde(default)]
    pub stances: Vec<StanceConfig>,
}

impl Default for ClimbConfig {
    /// Four-stance route up the standard wall.
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            wall: WallConfig::default(),
            reward: RewardConfig::default(),
            stances: vec![
                StanceConfig::new("hands_up", [10, 9, -1, -1]),
                StanceConfig::new("left_foot_up", [10, 9, 2, -1]),
                StanceConfig::new("right_foot_up", [10, 9, 2, 1]),
                StanceConfig::new("reach_high", [14, 13, -1, -1]),
            ],
        }
    }
}

impl ClimbConfig {
    /// Validate every section and the plan against the wall.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate()?;
        self.wall.validate()?;
        self.reward.validate()?;
        if self.stances.is_empty() {
            return Err(ConfigError::EmptyPlan);
        }
        let hold_count = self.wall.holds.len();
        for stance in &self.stances {
            stance.validate(hold_count)?;
        }
        Ok(())
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Serialize back to TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue {
            field: "config".into(),
            message: e.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
