//! Observation vector layout and collection.
//!
//! The observation is a flat `f32` vector split into named slots, written in
//! this order:
//!
//! | slot             | dim | contents                                           |
//! |------------------|-----|----------------------------------------------------|
//! | `body_state`     | n   | [`ClimbPhysics::body_state`]                       |
//! | `targets`        | 16  | per effector: desired hold `x, y, z, distance`     |
//! | `current_stance` | 4   | gripped hold per effector, `-1` when free          |
//! | `desired_stance` | 4   | desired hold per effector, `-1` when free          |
//! | `stance_match`   | 4   | `1` where current and desired slots agree          |
//! | `best_distances` | 4   | best-distance baseline                             |
//! | `contacts`       | 2   | any part touching the floor, the wall              |
//!
//! A free target slot reads `[-1, -1, -1, 0]`.

use bevy::prelude::*;

use belay_core::physics::{ClimbPhysics, Surface};
use belay_core::types::{Effector, Observation, Stance};

use crate::progress::{EpisodeProgress, is_touching};

pub const BODY_SLOT: usize = 0;
pub const TARGETS_SLOT: usize = 1;
pub const CURRENT_STANCE_SLOT: usize = 2;
pub const DESIRED_STANCE_SLOT: usize = 3;
pub const STANCE_MATCH_SLOT: usize = 4;
pub const BEST_DISTANCES_SLOT: usize = 5;
pub const CONTACTS_SLOT: usize = 6;

/// Length of everything after the body state.
pub const TASK_DIM: usize = 16 + 4 + 4 + 4 + 4 + 2;

const FREE_TARGET: [f32; 4] = [-1.0, -1.0, -1.0, 0.0];

// ---------------------------------------------------------------------------
// ObservationSlot
// ---------------------------------------------------------------------------

/// Metadata for a named region of the observation buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObservationSlot {
    /// Human-readable slot name.
    pub name: String,
    /// Number of f32 values in this slot.
    pub dim: usize,
    /// Start offset into the observation buffer.
    pub offset: usize,
}

// ---------------------------------------------------------------------------
// ObservationBuffer
// ---------------------------------------------------------------------------

/// Pre-allocated buffer the observe phase writes into.
///
/// Each slot owns a fixed range `[offset..offset+dim)`. After all slots are
/// written the buffer is read out as an [`Observation`].
#[derive(Resource, Clone, Debug)]
pub struct ObservationBuffer {
    data: Vec<f32>,
    slots: Vec<ObservationSlot>,
    total_dim: usize,
}

impl Default for ObservationBuffer {
    fn default() -> Self {
        Self::for_climber(0)
    }
}

impl ObservationBuffer {
    /// Create an empty buffer with no slots.
    pub const fn new() -> Self {
        Self {
            data: Vec::new(),
            slots: Vec::new(),
            total_dim: 0,
        }
    }

    /// Standard climbing layout with `body_dim` body-state values.
    pub fn for_climber(body_dim: usize) -> Self {
        let mut buffer = Self::new();
        buffer.register("body_state", body_dim);
        buffer.register("targets", 4 * Effector::ALL.len());
        buffer.register("current_stance", 4);
        buffer.register("desired_stance", 4);
        buffer.register("stance_match", 4);
        buffer.register("best_distances", 4);
        buffer.register("contacts", 2);
        buffer
    }

    /// Append a slot. Returns the slot index.
    pub fn register(&mut self, name: impl Into<String>, dim: usize) -> usize {
        let offset = self.total_dim;
        let index = self.slots.len();
        self.slots.push(ObservationSlot {
            name: name.into(),
            dim,
            offset,
        });
        self.total_dim += dim;
        self.data.resize(self.total_dim, 0.0);
        index
    }

    /// Total observation dimension.
    pub const fn dim(&self) -> usize {
        self.total_dim
    }

    pub const fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slot(&self, index: usize) -> Option<&ObservationSlot> {
        self.slots.get(index)
    }

    pub fn slots(&self) -> &[ObservationSlot] {
        &self.slots
    }

    /// Write values into a slot. Panics if `values.len() != slot.dim`.
    pub fn write(&mut self, slot_index: usize, values: &[f32]) {
        let slot = &self.slots[slot_index];
        assert_eq!(
            values.len(),
            slot.dim,
            "slot '{}': expected {} values, got {}",
            slot.name,
            slot.dim,
            values.len()
        );
        self.data[slot.offset..slot.offset + slot.dim].copy_from_slice(values);
    }

    /// Read the values of a slot.
    pub fn read(&self, slot_index: usize) -> &[f32] {
        let slot = &self.slots[slot_index];
        &self.data[slot.offset..slot.offset + slot.dim]
    }

    pub fn as_observation(&self) -> Observation {
        Observation::new(self.data.clone())
    }

    /// Fill with zeros. Slots remain registered.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Write the full climbing observation and return it.
    ///
    /// `desired` is the stance the agent is working towards this step. The
    /// layout is rebuilt if the physics body state changed length.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn collect(
        &mut self,
        physics: &dyn ClimbPhysics,
        progress: &EpisodeProgress,
        desired: &Stance,
    ) -> Observation {
        let body = physics.body_state();
        if self.slot(BODY_SLOT).is_none_or(|s| s.dim != body.len()) {
            *self = Self::for_climber(body.len());
        }
        self.write(BODY_SLOT, &body);

        let mut targets = [0.0f32; 16];
        for (effector, chunk) in Effector::ALL.iter().zip(targets.chunks_exact_mut(4)) {
            let placed = desired
                .get(*effector)
                .and_then(|hold| physics.hold_position(hold));
            let values = placed.map_or(FREE_TARGET, |pos| {
                let distance = physics.effector_position(*effector).distance(pos);
                [pos.x as f32, pos.y as f32, pos.z as f32, distance as f32]
            });
            chunk.copy_from_slice(&values);
        }
        self.write(TARGETS_SLOT, &targets);

        let current = progress.current_stance;
        self.write(CURRENT_STANCE_SLOT, &current.to_raw().map(|h| h as f32));
        self.write(DESIRED_STANCE_SLOT, &desired.to_raw().map(|h| h as f32));
        let matches = desired
            .slot_matches(&current)
            .map(|m| if m { 1.0 } else { 0.0 });
        self.write(STANCE_MATCH_SLOT, &matches);
        self.write(BEST_DISTANCES_SLOT, &progress.best_distances.to_f32());

        let flag = |touching: bool| if touching { 1.0 } else { 0.0 };
        self.write(
            CONTACTS_SLOT,
            &[
                flag(is_touching(physics, Surface::Floor)),
                flag(is_touching(physics, Surface::Wall)),
            ],
        );

        self.as_observation()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
