use thiserror::Error;

use crate::types::{Effector, HoldIndex};

/// Top-level error type for belay.
#[derive(Debug, Error)]
pub enum BelayError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] SimError),

    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("max_episode_steps must be > 0")]
    ZeroEpisodeSteps,

    #[error("Motion plan has no stances")]
    EmptyPlan,

    #[error("Stance '{stance}' references unknown hold {hold} (wall has {hold_count} holds)")]
    UnknownHold {
        stance: String,
        hold: i64,
        hold_count: usize,
    },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Simulation runtime errors.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Episode must be reset before stepping")]
    ResetRequired,

    #[error("Attachment of {effector} points at body {target}, which is not a hold")]
    DanglingAttachment { effector: Effector, target: usize },

    #[error("Cannot attach {effector} to missing hold {hold}")]
    UnknownHold { effector: Effector, hold: HoldIndex },
}

/// Motion plan lookup errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("Stance index {index} out of range (plan has {len} stances)")]
    OutOfRangeStanceIndex { index: usize, len: usize },
}

/// Action validation errors.
///
/// Copy + static messages for cheap propagation in hot paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Action dimension mismatch: expected {expected}, got {got}")]
    ActionDimMismatch { expected: usize, got: usize },

    #[error("Action contains NaN")]
    ActionContainsNan,

    #[error("Action contains Inf")]
    ActionContainsInf,

    #[error("Batch size mismatch: expected {expected} actions, got {got}")]
    BatchSizeMismatch { expected: usize, got: usize },
}
