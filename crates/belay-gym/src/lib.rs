//! Gymnasium-style training interface for belay.
//!
//! - [`env`](mod@env): [`ClimbEnv`] wrapping a Bevy App with the standard
//!   `step`/`reset` interface
//! - [`applicator`]: [`GraspApplicator`] turning grasp intents into
//!   attachments
//! - [`vec_env`]: [`ClimbVecEnv`] for batched training with derived seeds
//!   and auto-reset

pub mod applicator;
pub mod env;
pub mod vec_env;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use applicator::GraspApplicator;
pub use env::ClimbEnv;
pub use vec_env::{BatchStepResult, ClimbVecEnv};

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{BatchStepResult, ClimbEnv, ClimbVecEnv, GraspApplicator};
}
