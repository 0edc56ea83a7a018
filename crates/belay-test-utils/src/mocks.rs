//! Mock implementations of core traits for testing.
//!
//! [`ScriptedWall`] is a [`ClimbPhysics`] whose every reading is set by the
//! test, either directly through a [`ScriptHandle`] or as events scheduled
//! for a given physics tick.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bevy::math::DVec3;

use belay_core::error::SimError;
use belay_core::physics::{BodyPart, ClimbPhysics, Surface};
use belay_core::traits::{RewardFunction, TerminationCondition};
use belay_core::types::{Effector, EffectorDistances, HoldIndex, StepSnapshot};

// ---------------------------------------------------------------------------
// ScriptEvent
// ---------------------------------------------------------------------------

/// A change applied to the scripted world when its tick comes up.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptEvent {
    /// Raw attachment target; may point past the last hold.
    Attach(Effector, usize),
    Detach(Effector),
    Contact(BodyPart, Surface, bool),
    MoveEffector(Effector, DVec3),
    TorsoVelocity(DVec3),
    TorsoOrientation(DVec3),
}

// ---------------------------------------------------------------------------
// ScriptState
// ---------------------------------------------------------------------------

/// Everything a [`ScriptedWall`] reports.
#[derive(Debug, Clone, Default)]
pub struct ScriptState {
    pub hold_positions: Vec<DVec3>,
    /// Holds past `hold_positions` that are counted but have no position and
    /// reject attachments.
    pub unplaced_holds: usize,
    pub effector_positions: [DVec3; 4],
    pub attachments: [Option<usize>; 4],
    pub contacts: HashSet<(BodyPart, Surface)>,
    pub torso_orientation: DVec3,
    pub torso_velocity: DVec3,
    pub body_state: Vec<f32>,
    /// Controls passed to the last `apply_joint_controls` call.
    pub last_controls: Vec<f32>,
    /// Ticks since the last reset.
    pub ticks: u32,
    pub resets: u32,
    pub last_seed: Option<u64>,
    /// Events keyed by the tick after which they apply.
    pub schedule: BTreeMap<u32, Vec<ScriptEvent>>,
}

impl ScriptState {
    fn apply(&mut self, event: ScriptEvent) {
        match event {
            ScriptEvent::Attach(effector, target) => {
                self.attachments[effector.index()] = Some(target);
            }
            ScriptEvent::Detach(effector) => self.attachments[effector.index()] = None,
            ScriptEvent::Contact(part, surface, on) => {
                if on {
                    self.contacts.insert((part, surface));
                } else {
                    self.contacts.remove(&(part, surface));
                }
            }
            ScriptEvent::MoveEffector(effector, pos) => {
                self.effector_positions[effector.index()] = pos;
            }
            ScriptEvent::TorsoVelocity(v) => self.torso_velocity = v,
            ScriptEvent::TorsoOrientation(o) => self.torso_orientation = o,
        }
    }
}

// ---------------------------------------------------------------------------
// ScriptHandle
// ---------------------------------------------------------------------------

/// Shared handle to a [`ScriptedWall`]'s state, usable after the wall has
/// been moved into an environment.
#[derive(Debug, Clone, Default)]
pub struct ScriptHandle(Arc<Mutex<ScriptState>>);

impl ScriptHandle {
    pub fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn attach(&self, effector: Effector, target: usize) {
        self.lock().apply(ScriptEvent::Attach(effector, target));
    }

    pub fn detach(&self, effector: Effector) {
        self.lock().apply(ScriptEvent::Detach(effector));
    }

    pub fn set_contact(&self, part: BodyPart, surface: Surface, on: bool) {
        self.lock().apply(ScriptEvent::Contact(part, surface, on));
    }

    pub fn set_effector_position(&self, effector: Effector, pos: DVec3) {
        self.lock().apply(ScriptEvent::MoveEffector(effector, pos));
    }

    pub fn set_hold_position(&self, hold: usize, pos: DVec3) {
        let mut state = self.lock();
        if let Some(slot) = state.hold_positions.get_mut(hold) {
            *slot = pos;
        }
    }

    /// Count `n` more holds that have no position.
    pub fn add_unplaced_holds(&self, n: usize) {
        self.lock().unplaced_holds += n;
    }

    pub fn set_torso_velocity(&self, velocity: DVec3) {
        self.lock().apply(ScriptEvent::TorsoVelocity(velocity));
    }

    /// Set the torso pitch, leaving roll and yaw at zero.
    pub fn set_pitch(&self, pitch: f64) {
        self.lock()
            .apply(ScriptEvent::TorsoOrientation(DVec3::new(0.0, pitch, 0.0)));
    }

    pub fn set_body_state(&self, state: Vec<f32>) {
        self.lock().body_state = state;
    }

    /// Apply `event` once the wall has ticked `tick` times since reset.
    pub fn schedule(&self, tick: u32, event: ScriptEvent) {
        self.lock().schedule.entry(tick).or_default().push(event);
    }

    pub fn attachment(&self, effector: Effector) -> Option<usize> {
        self.lock().attachments[effector.index()]
    }

    pub fn ticks(&self) -> u32 {
        self.lock().ticks
    }

    pub fn resets(&self) -> u32 {
        self.lock().resets
    }

    pub fn last_seed(&self) -> Option<u64> {
        self.lock().last_seed
    }

    pub fn last_controls(&self) -> Vec<f32> {
        self.lock().last_controls.clone()
    }
}

// ---------------------------------------------------------------------------
// ScriptedWall
// ---------------------------------------------------------------------------

/// Scriptable [`ClimbPhysics`] with every hold and effector at the origin.
///
/// Nothing moves on its own: ticking only counts and fires scheduled events.
/// Reset drops attachments and restarts the tick count; scripted contacts,
/// positions and motion survive it.
#[derive(Debug, Clone)]
pub struct ScriptedWall {
    state: ScriptHandle,
}

impl ScriptedWall {
    pub fn new(hold_count: usize) -> Self {
        let state = ScriptState {
            hold_positions: vec![DVec3::ZERO; hold_count],
            ..ScriptState::default()
        };
        Self {
            state: ScriptHandle(Arc::new(Mutex::new(state))),
        }
    }

    /// A handle sharing this wall's state.
    pub fn handle(&self) -> ScriptHandle {
        self.state.clone()
    }
}

impl ClimbPhysics for ScriptedWall {
    fn hold_count(&self) -> usize {
        let state = self.state.lock();
        state.hold_positions.len() + state.unplaced_holds
    }

    fn hold_position(&self, hold: HoldIndex) -> Option<DVec3> {
        self.state.lock().hold_positions.get(hold.get()).copied()
    }

    fn effector_position(&self, effector: Effector) -> DVec3 {
        self.state.lock().effector_positions[effector.index()]
    }

    fn attachment_target(&self, effector: Effector) -> Option<usize> {
        self.state.lock().attachments[effector.index()]
    }

    fn create_attachment(&mut self, effector: Effector, hold: HoldIndex) -> Result<(), SimError> {
        let mut state = self.state.lock();
        if hold.get() >= state.hold_positions.len() {
            return Err(SimError::UnknownHold { effector, hold });
        }
        state.attachments[effector.index()] = Some(hold.get());
        Ok(())
    }

    fn destroy_attachment(&mut self, effector: Effector) {
        self.state.lock().attachments[effector.index()] = None;
    }

    fn is_body_part_in_contact(&self, part: BodyPart, surface: Surface) -> bool {
        self.state.lock().contacts.contains(&(part, surface))
    }

    fn torso_orientation(&self) -> DVec3 {
        self.state.lock().torso_orientation
    }

    fn torso_linear_velocity(&self) -> DVec3 {
        self.state.lock().torso_velocity
    }

    fn apply_joint_controls(&mut self, controls: &[f32]) {
        self.state.lock().last_controls = controls.to_vec();
    }

    fn step_simulation(&mut self) {
        let mut state = self.state.lock();
        state.ticks += 1;
        let tick = state.ticks;
        if let Some(events) = state.schedule.remove(&tick) {
            for event in events {
                state.apply(event);
            }
        }
    }

    fn reset(&mut self, seed: Option<u64>) {
        let mut state = self.state.lock();
        state.attachments = [None; 4];
        state.ticks = 0;
        state.resets += 1;
        state.last_seed = seed;
    }

    fn body_state(&self) -> Vec<f32> {
        self.state.lock().body_state.clone()
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ScriptedWall"
    }
}

// ---------------------------------------------------------------------------
// ConstantReward
// ---------------------------------------------------------------------------

/// A reward function that always returns a fixed value.
pub struct ConstantReward {
    value: f64,
    label: &'static str,
}

impl ConstantReward {
    pub const fn new(value: f64) -> Self {
        Self {
            value,
            label: "ConstantReward",
        }
    }

    pub const fn with_label(value: f64, label: &'static str) -> Self {
        Self { value, label }
    }
}

impl RewardFunction for ConstantReward {
    fn compute(&self, _snapshot: &StepSnapshot, _best: &mut EffectorDistances) -> f64 {
        self.value
    }

    fn name(&self) -> &str {
        self.label
    }
}

// ---------------------------------------------------------------------------
// Termination stubs
// ---------------------------------------------------------------------------

/// Always terminates.
pub struct AlwaysTerminate;

impl TerminationCondition for AlwaysTerminate {
    fn is_terminated(&self, _snapshot: &StepSnapshot) -> bool {
        true
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "AlwaysTerminate"
    }
}

/// Never terminates.
pub struct NeverTerminate;

impl TerminationCondition for NeverTerminate {
    fn is_terminated(&self, _snapshot: &StepSnapshot) -> bool {
        false
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "NeverTerminate"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
