use std::fmt;

use bevy::math::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// Effector
// ---------------------------------------------------------------------------

/// One of the four limb endpoints that can grip a hold.
///
/// The ordinal (`as usize`) is the slot index in every per-effector array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effector {
    LeftHand = 0,
    RightHand = 1,
    LeftFoot = 2,
    RightFoot = 3,
}

impl Effector {
    /// All effectors in slot order.
    pub const ALL: [Self; 4] = [
        Self::LeftHand,
        Self::RightHand,
        Self::LeftFoot,
        Self::RightFoot,
    ];

    /// Slot index of this effector.
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn is_foot(self) -> bool {
        matches!(self, Self::LeftFoot | Self::RightFoot)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LeftHand => "left_hand",
            Self::RightHand => "right_hand",
            Self::LeftFoot => "left_foot",
            Self::RightFoot => "right_foot",
        }
    }
}

impl fmt::Display for Effector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// HoldIndex
// ---------------------------------------------------------------------------

/// Stable index of a hold on the wall, in wall-climbing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HoldIndex(pub usize);

impl HoldIndex {
    pub const fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for HoldIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for HoldIndex {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

// ---------------------------------------------------------------------------
// Stance
// ---------------------------------------------------------------------------

/// Hold assignment for all four effectors, indexed by [`Effector`].
///
/// `None` in a slot means "not attached" when describing the agent and
/// "must not be attached" when describing a target. The two compare with
/// plain equality, so a `None` target slot is only satisfied by a free
/// effector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stance([Option<HoldIndex>; 4]);

impl Stance {
    /// No effector attached.
    pub const FREE: Self = Self([None; 4]);

    pub const fn new(slots: [Option<HoldIndex>; 4]) -> Self {
        Self(slots)
    }

    /// Build from the persisted `-1`-sentinel form.
    ///
    /// Returns `None` if any value is below `-1`.
    pub fn from_raw(raw: [i64; 4]) -> Option<Self> {
        let mut slots = [None; 4];
        for (slot, value) in slots.iter_mut().zip(raw) {
            *slot = match value {
                -1 => None,
                v if v >= 0 => Some(HoldIndex(usize::try_from(v).ok()?)),
                _ => return None,
            };
        }
        Some(Self(slots))
    }

    /// `-1`-sentinel form used by observations and config files.
    #[allow(clippy::cast_possible_wrap)]
    pub fn to_raw(&self) -> [i64; 4] {
        self.0.map(|slot| slot.map_or(-1, |h| h.0 as i64))
    }

    pub const fn get(&self, effector: Effector) -> Option<HoldIndex> {
        self.0[effector.index()]
    }

    pub const fn set(&mut self, effector: Effector, hold: Option<HoldIndex>) {
        self.0[effector.index()] = hold;
    }

    pub const fn slots(&self) -> &[Option<HoldIndex>; 4] {
        &self.0
    }

    /// Per-slot equality against `other`.
    pub fn slot_matches(&self, other: &Self) -> [bool; 4] {
        std::array::from_fn(|i| self.0[i] == other.0[i])
    }

    /// Whether `current` satisfies this stance exactly.
    pub fn is_reached_by(&self, current: &Self) -> bool {
        self == current
    }

    /// Holds named by this stance, skipping free slots.
    pub fn holds(&self) -> impl Iterator<Item = HoldIndex> + '_ {
        self.0.iter().flatten().copied()
    }

    /// Whether `hold` appears in any slot.
    pub fn contains(&self, hold: HoldIndex) -> bool {
        self.0.contains(&Some(hold))
    }
}

impl std::ops::Index<Effector> for Stance {
    type Output = Option<HoldIndex>;
    fn index(&self, effector: Effector) -> &Option<HoldIndex> {
        &self.0[effector.index()]
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.to_raw();
        write!(f, "({a}, {b}, {c}, {d})")
    }
}

// ---------------------------------------------------------------------------
// EffectorDistances
// ---------------------------------------------------------------------------

/// Distance from each effector to the hold its desired stance names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectorDistances(pub [f64; 4]);

impl EffectorDistances {
    pub const ZERO: Self = Self([0.0; 4]);

    pub const fn get(&self, effector: Effector) -> f64 {
        self.0[effector.index()]
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Lower each slot to `other`'s value where `other` is smaller.
    pub fn min_assign(&mut self, other: &Self) {
        for (best, d) in self.0.iter_mut().zip(other.0) {
            if d < *best {
                *best = d;
            }
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn to_f32(&self) -> [f32; 4] {
        self.0.map(|d| d as f32)
    }
}

// ---------------------------------------------------------------------------
// StepSnapshot
// ---------------------------------------------------------------------------

/// Everything reward and termination logic may read about one step.
///
/// Built after the attachment tracker runs and before the sequencer decides
/// whether to advance, so `desired_stance` and `distances` refer to the
/// stance the agent was working towards during this step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepSnapshot {
    pub current_stance: Stance,
    pub desired_stance: Stance,
    pub distances: EffectorDistances,
    pub torso_velocity: DVec3,
    /// Roll, pitch, yaw in radians.
    pub torso_orientation: DVec3,
    /// A non-foot body part touches the floor.
    pub on_floor: bool,
    pub plan_complete: bool,
    pub steps: u32,
    pub max_episode_steps: u32,
}

impl StepSnapshot {
    /// Snapshot of a motionless, unattached agent with no target.
    pub fn idle(max_episode_steps: u32) -> Self {
        Self {
            current_stance: Stance::FREE,
            desired_stance: Stance::FREE,
            distances: EffectorDistances::ZERO,
            torso_velocity: DVec3::ZERO,
            torso_orientation: DVec3::ZERO,
            on_floor: false,
            plan_complete: false,
            steps: 0,
            max_episode_steps,
        }
    }

    pub fn stance_reached(&self) -> bool {
        self.desired_stance.is_reached_by(&self.current_stance)
    }

    pub const fn pitch(&self) -> f64 {
        self.torso_orientation.y
    }
}

// ---------------------------------------------------------------------------
// Observation
// ---------------------------------------------------------------------------

/// Flat f32 vector representing environment state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    data: Vec<f32>,
}

impl Observation {
    pub const fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    pub fn zeros(len: usize) -> Self {
        Self {
            data: vec![0.0; len],
        }
    }

    pub const fn len(&self) -> usize {
        self.data.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}

impl std::ops::Index<usize> for Observation {
    type Output = f32;
    fn index(&self, i: usize) -> &f32 {
        &self.data[i]
    }
}

impl From<Vec<f32>> for Observation {
    fn from(data: Vec<f32>) -> Self {
        Self::new(data)
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// Flat continuous control vector sent by the caller.
///
/// Layout: one value per joint, followed by four grasp intents in
/// [`Effector`] order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    data: Vec<f32>,
}

impl Action {
    pub const fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    pub fn zeros(len: usize) -> Self {
        Self {
            data: vec![0.0; len],
        }
    }

    pub const fn len(&self) -> usize {
        self.data.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Reject NaN and Inf values.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for val in &self.data {
            if val.is_nan() {
                return Err(ValidationError::ActionContainsNan);
            }
            if val.is_infinite() {
                return Err(ValidationError::ActionContainsInf);
            }
        }
        Ok(())
    }
}

impl From<Vec<f32>> for Action {
    fn from(data: Vec<f32>) -> Self {
        Self::new(data)
    }
}

// ---------------------------------------------------------------------------
// ClimbAction
// ---------------------------------------------------------------------------

/// An [`Action`] split into joint controls and per-effector grasp intents.
#[derive(Debug, Clone, PartialEq)]
pub struct ClimbAction {
    pub joints: Vec<f32>,
    pub grasp: [f32; 4],
}

impl ClimbAction {
    /// Split a flat action for an agent with `num_joints` joints.
    ///
    /// The action must hold exactly `num_joints + 4` finite values.
    pub fn from_action(action: &Action, num_joints: usize) -> Result<Self, ValidationError> {
        let expected = num_joints + Effector::ALL.len();
        if action.len() != expected {
            return Err(ValidationError::ActionDimMismatch {
                expected,
                got: action.len(),
            });
        }
        action.validate()?;

        let (joints, grasp) = action.as_slice().split_at(num_joints);
        let mut intents = [0.0; 4];
        intents.copy_from_slice(grasp);
        Ok(Self {
            joints: joints.to_vec(),
            grasp: intents,
        })
    }

    /// Whether the caller asks `effector` to grip.
    pub fn wants_grip(&self, effector: Effector) -> bool {
        self.grasp[effector.index()] > 0.0
    }
}

// ---------------------------------------------------------------------------
// BoxSpace
// ---------------------------------------------------------------------------

/// Bounded continuous space. Follows Gymnasium `Box` conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxSpace {
    pub low: Vec<f32>,
    pub high: Vec<f32>,
}

impl BoxSpace {
    /// `dim`-dimensional space with identical bounds on every axis.
    pub fn uniform(dim: usize, low: f32, high: f32) -> Self {
        Self {
            low: vec![low; dim],
            high: vec![high; dim],
        }
    }

    pub fn shape(&self) -> Vec<usize> {
        vec![self.low.len()]
    }

    pub fn dim(&self) -> usize {
        self.low.len()
    }

    pub fn contains(&self, values: &[f32]) -> bool {
        values.len() == self.low.len()
            && values
                .iter()
                .zip(self.low.iter().zip(self.high.iter()))
                .all(|(v, (l, h))| v >= l && v <= h)
    }

    /// Sample a random action. Takes `&mut impl Rng` for determinism.
    pub fn sample(&self, rng: &mut impl rand::Rng) -> Action {
        let data = self
            .low
            .iter()
            .zip(self.high.iter())
            .map(|(l, h)| rng.gen_range(*l..=*h))
            .collect();
        Action::new(data)
    }
}

// ---------------------------------------------------------------------------
// StepResult / ResetResult
// ---------------------------------------------------------------------------

/// Result of `env.step(action)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f64,
    /// Plan complete or agent on the floor.
    pub terminated: bool,
    /// Episode or stance step limit reached.
    pub truncated: bool,
    pub info: StepInfo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepInfo {
    /// Current stance equals the desired stance at observation time.
    pub is_success: bool,
    pub episode_length: u32,
    pub episode_reward: f64,
    pub desired_stance_index: usize,
    pub current_stance: Stance,
    pub desired_stance: Stance,
    pub plan_complete: bool,
    pub on_floor: bool,
}

/// Result of `env.reset()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResult {
    pub observation: Observation,
    pub info: ResetInfo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResetInfo {
    pub seed: Option<u64>,
    pub is_success: bool,
    pub desired_stance: Stance,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn stance(raw: [i64; 4]) -> Stance {
        Stance::from_raw(raw).unwrap()
    }

    // ---- Effector ----

    #[test]
    fn effector_ordinals_are_slot_indices() {
        for (i, e) in Effector::ALL.iter().enumerate() {
            assert_eq!(e.index(), i);
        }
    }

    #[test]
    fn only_feet_are_feet() {
        assert!(!Effector::LeftHand.is_foot());
        assert!(!Effector::RightHand.is_foot());
        assert!(Effector::LeftFoot.is_foot());
        assert!(Effector::RightFoot.is_foot());
    }

    // ---- Stance ----

    #[test]
    fn stance_raw_conversion() {
        let s = stance([10, 9, -1, -1]);
        assert_eq!(s.get(Effector::LeftHand), Some(HoldIndex(10)));
        assert_eq!(s.get(Effector::RightHand), Some(HoldIndex(9)));
        assert_eq!(s[Effector::LeftFoot], None);
        assert_eq!(s.to_raw(), [10, 9, -1, -1]);
    }

    #[test]
    fn stance_rejects_values_below_sentinel() {
        assert!(Stance::from_raw([0, -2, 1, 2]).is_none());
    }

    #[test]
    fn reached_requires_every_slot_to_match() {
        let desired = stance([0, 1, 2, 3]);
        assert!(desired.is_reached_by(&stance([0, 1, 2, 3])));
        assert!(!desired.is_reached_by(&stance([0, 1, 2, -1])));
        assert!(!desired.is_reached_by(&stance([1, 0, 2, 3])));
    }

    #[test]
    fn free_slot_is_not_a_wildcard() {
        let desired = stance([0, -1, -1, -1]);
        assert!(desired.is_reached_by(&stance([0, -1, -1, -1])));
        assert!(!desired.is_reached_by(&stance([0, 5, -1, -1])));
    }

    #[test]
    fn slot_matches_per_effector() {
        let a = stance([0, 1, -1, 3]);
        let b = stance([0, 2, -1, -1]);
        assert_eq!(a.slot_matches(&b), [true, false, true, false]);
    }

    #[test]
    fn stance_holds_skip_free_slots() {
        let s = stance([4, -1, 7, -1]);
        let holds: Vec<_> = s.holds().collect();
        assert_eq!(holds, vec![HoldIndex(4), HoldIndex(7)]);
        assert!(s.contains(HoldIndex(7)));
        assert!(!s.contains(HoldIndex(5)));
    }

    #[test]
    fn stance_display() {
        assert_eq!(stance([10, 9, 2, -1]).to_string(), "(10, 9, 2, -1)");
    }

    // ---- EffectorDistances ----

    #[test]
    fn distances_min_assign_is_per_slot() {
        let mut best = EffectorDistances([1.0, 2.0, 3.0, 4.0]);
        best.min_assign(&EffectorDistances([0.5, 2.5, 3.0, 1.0]));
        assert_eq!(best.0, [0.5, 2.0, 3.0, 1.0]);
        assert!((best.sum() - 6.5).abs() < f64::EPSILON);
    }

    // ---- ClimbAction ----

    #[test]
    fn climb_action_splits_joints_and_grasp() {
        let action = Action::new(vec![0.1, 0.2, 0.3, 1.0, -1.0, 0.0, 0.5]);
        let split = ClimbAction::from_action(&action, 3).unwrap();
        assert_eq!(split.joints, vec![0.1, 0.2, 0.3]);
        assert_eq!(split.grasp, [1.0, -1.0, 0.0, 0.5]);
        assert!(split.wants_grip(Effector::LeftHand));
        assert!(!split.wants_grip(Effector::RightHand));
        assert!(!split.wants_grip(Effector::LeftFoot));
        assert!(split.wants_grip(Effector::RightFoot));
    }

    #[test]
    fn climb_action_rejects_wrong_arity() {
        let action = Action::zeros(20);
        let err = ClimbAction::from_action(&action, 17).unwrap_err();
        assert_eq!(
            err,
            ValidationError::ActionDimMismatch {
                expected: 21,
                got: 20
            }
        );
    }

    #[test]
    fn climb_action_rejects_non_finite() {
        let action = Action::new(vec![0.0, f32::NAN, 0.0, 0.0, 0.0]);
        assert_eq!(
            ClimbAction::from_action(&action, 1).unwrap_err(),
            ValidationError::ActionContainsNan
        );
        let action = Action::new(vec![0.0, 0.0, f32::INFINITY, 0.0, 0.0]);
        assert_eq!(
            ClimbAction::from_action(&action, 1).unwrap_err(),
            ValidationError::ActionContainsInf
        );
    }

    // ---- BoxSpace ----

    #[test]
    fn box_space_sample_is_contained() {
        let space = BoxSpace::uniform(21, -1.0, 1.0);
        let mut rng = test_rng();
        for _ in 0..10 {
            let action = space.sample(&mut rng);
            assert!(space.contains(action.as_slice()));
        }
        assert_eq!(space.shape(), vec![21]);
    }

    fn test_rng() -> rand::rngs::StdRng {
        rand::rngs::StdRng::seed_from_u64(7)
    }

    // ---- Serde ----

    #[test]
    fn step_info_serializes_stances() {
        let info = StepInfo {
            is_success: true,
            current_stance: stance([1, -1, -1, -1]),
            ..Default::default()
        };
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("\"is_success\":true"));
        let back: StepInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back.current_stance, info.current_stance);
    }
}
