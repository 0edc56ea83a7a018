//! Shared test fixtures and utilities for belay crates.
//!
//! Provides a scriptable wall physics, small task configs, action builders
//! and deterministic RNG setup.

pub mod fixtures;
pub mod mocks;
pub mod rng;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use fixtures::{grip_action, line_config, release_action};
pub use mocks::{ScriptEvent, ScriptHandle, ScriptedWall};
pub use rng::seeded_rng;
