//! Deterministic point-limb climber implementing [`ClimbPhysics`].
//!
//! The climber is a torso point with four limb endpoints. Joint controls are
//! read as velocities:
//!
//! | controls  | drives                                  |
//! |-----------|-----------------------------------------|
//! | `0..12`   | `x, y, z` velocity of each effector     |
//! | `12..15`  | torso velocity while supported          |
//! | `15`      | torso pitch rate                        |
//!
//! Extra controls are ignored and missing ones read as zero. Limbs never
//! reach further than [`KinematicParams::reach`] from the torso. The torso is
//! supported while any effector is attached or a foot stands on the floor;
//! otherwise it falls under gravity until it hits the floor.

use bevy::math::DVec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use belay_core::config::{ClimbConfig, HoldLayout};
use belay_core::error::SimError;
use belay_core::physics::{BodyPart, ClimbPhysics, Surface};
use belay_core::types::{Effector, HoldIndex};

/// Control index of the first torso velocity component.
pub const TORSO_CONTROL: usize = 12;
/// Control index of the pitch rate.
pub const PITCH_CONTROL: usize = 15;

// ---------------------------------------------------------------------------
// KinematicParams
// ---------------------------------------------------------------------------

/// Integration and body parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct KinematicParams {
    /// Integration timestep in seconds.
    pub dt: f64,
    /// Substeps per [`ClimbPhysics::step_simulation`] call.
    pub substeps: usize,
    /// Vertical acceleration while unsupported.
    pub gravity: f64,
    /// Maximum torso to effector distance.
    pub reach: f64,
    /// Effector speed per unit of control.
    pub limb_speed: f64,
    /// Torso speed per unit of control.
    pub torso_speed: f64,
    /// Pitch rate per unit of control, rad/s.
    pub pitch_rate: f64,
    /// An effector touches a hold within this distance.
    pub grip_radius: f64,
    /// Tolerance for floor and wall contact.
    pub contact_epsilon: f64,
    /// Lowest torso height; the body lies on the floor there.
    pub torso_floor_height: f64,
    /// Amplitude of the seeded jitter applied to the start pose.
    pub start_jitter: f64,
}

impl Default for KinematicParams {
    fn default() -> Self {
        Self {
            dt: 0.02,
            substeps: 5,
            gravity: 9.81,
            reach: 0.9,
            limb_speed: 1.0,
            torso_speed: 0.5,
            pitch_rate: 1.0,
            grip_radius: 0.12,
            contact_epsilon: 0.02,
            torso_floor_height: 0.35,
            start_jitter: 0.02,
        }
    }
}

// ---------------------------------------------------------------------------
// ClimberPose
// ---------------------------------------------------------------------------

/// Full kinematic state of the climber.
#[derive(Debug, Clone, PartialEq)]
pub struct ClimberPose {
    pub torso: DVec3,
    pub torso_velocity: DVec3,
    pub pitch: f64,
    pub effectors: [DVec3; 4],
    pub attachments: [Option<usize>; 4],
}

impl ClimberPose {
    /// Standing in front of the wall, feet on the floor, hands at chest
    /// height.
    pub const fn standing() -> Self {
        Self {
            torso: DVec3::new(0.0, 0.0, 0.85),
            torso_velocity: DVec3::ZERO,
            pitch: 0.0,
            effectors: [
                DVec3::new(0.2, 0.25, 1.25),
                DVec3::new(0.2, -0.25, 1.25),
                DVec3::new(0.1, 0.15, 0.0),
                DVec3::new(0.1, -0.15, 0.0),
            ],
            attachments: [None; 4],
        }
    }
}

// ---------------------------------------------------------------------------
// KinematicWall
// ---------------------------------------------------------------------------

/// Reference climbing world without a rigid-body engine.
#[derive(Debug, Clone)]
pub struct KinematicWall {
    holds: Vec<DVec3>,
    wall_x: f64,
    params: KinematicParams,
    pose: ClimberPose,
    initial: ClimberPose,
    controls: Vec<f32>,
}

impl KinematicWall {
    /// Wall with the given holds and default parameters.
    pub fn new(layout: &HoldLayout) -> Self {
        Self::with_params(layout, KinematicParams::default())
    }

    pub fn with_params(layout: &HoldLayout, params: KinematicParams) -> Self {
        let holds: Vec<DVec3> = (0..layout.len()).filter_map(|i| layout.position(i)).collect();
        let wall_x = holds
            .iter()
            .map(|h| h.x)
            .reduce(f64::min)
            .unwrap_or(f64::INFINITY);
        Self {
            holds,
            wall_x,
            params,
            pose: ClimberPose::standing(),
            initial: ClimberPose::standing(),
            controls: Vec::new(),
        }
    }

    /// Wall described by `config.wall`.
    pub fn from_config(config: &ClimbConfig) -> Self {
        Self::new(&config.wall.layout())
    }

    /// Builder: replace the start pose.
    #[must_use]
    pub fn with_start_pose(mut self, pose: ClimberPose) -> Self {
        self.initial = pose.clone();
        self.pose = pose;
        self
    }

    pub const fn params(&self) -> &KinematicParams {
        &self.params
    }

    pub const fn pose(&self) -> &ClimberPose {
        &self.pose
    }

    /// Plane the limbs cannot pass.
    pub const fn wall_x(&self) -> f64 {
        self.wall_x
    }

    /// The torso is held by an attachment or a foot on the floor.
    pub fn is_supported(&self) -> bool {
        self.pose.attachments.iter().any(Option::is_some)
            || [Effector::LeftFoot, Effector::RightFoot]
                .iter()
                .any(|&foot| self.pose.effectors[foot.index()].z <= self.params.contact_epsilon)
    }

    fn control(&self, index: usize) -> f64 {
        self.controls.get(index).copied().map_or(0.0, f64::from)
    }

    fn control_vec(&self, start: usize) -> DVec3 {
        DVec3::new(
            self.control(start),
            self.control(start + 1),
            self.control(start + 2),
        )
    }

    fn effector_of(part: BodyPart) -> Option<Effector> {
        Effector::ALL.into_iter().find(|&e| BodyPart::of(e) == part)
    }

    fn substep(&mut self) {
        let dt = self.params.dt;
        let previous = self.pose.torso;

        let pitch = self.control(PITCH_CONTROL).mul_add(self.params.pitch_rate * dt, self.pose.pitch);
        self.pose.pitch = pitch.clamp(-std::f64::consts::FRAC_PI_2, std::f64::consts::FRAC_PI_2);

        for effector in Effector::ALL {
            let i = effector.index();
            if self.pose.attachments[i].is_some() {
                continue;
            }
            let velocity = self.control_vec(3 * i) * self.params.limb_speed;
            self.pose.effectors[i] = self.bounded(self.pose.effectors[i] + velocity * dt);
        }

        if self.is_supported() {
            let velocity = self.control_vec(TORSO_CONTROL) * self.params.torso_speed;
            self.pose.torso += velocity * dt;
            self.pose.torso_velocity = DVec3::ZERO;
        } else {
            self.pose.torso_velocity.z -= self.params.gravity * dt;
            self.pose.torso.z += self.pose.torso_velocity.z * dt;
        }

        // Attached limbs hold the torso within reach.
        for _ in 0..3 {
            for i in 0..4 {
                if self.pose.attachments[i].is_some() {
                    self.pose.torso = self.within_reach(self.pose.effectors[i], self.pose.torso);
                }
            }
        }
        if self.pose.torso.z <= self.params.torso_floor_height {
            self.pose.torso.z = self.params.torso_floor_height;
            self.pose.torso_velocity.z = 0.0;
        }

        for i in 0..4 {
            if self.pose.attachments[i].is_none() {
                let dragged = self.within_reach(self.pose.torso, self.pose.effectors[i]);
                self.pose.effectors[i] = self.bounded(dragged);
            }
        }

        self.pose.torso_velocity = (self.pose.torso - previous) / dt;
    }

    /// `point` pulled towards `anchor` until it is within reach.
    fn within_reach(&self, anchor: DVec3, point: DVec3) -> DVec3 {
        let offset = point - anchor;
        if offset.length() > self.params.reach {
            anchor + offset.normalize_or_zero() * self.params.reach
        } else {
            point
        }
    }

    /// Keep limbs in front of the wall and above the floor.
    fn bounded(&self, mut point: DVec3) -> DVec3 {
        point.x = point.x.min(self.wall_x);
        point.z = point.z.max(0.0);
        point
    }
}

impl ClimbPhysics for KinematicWall {
    fn hold_count(&self) -> usize {
        self.holds.len()
    }

    fn hold_position(&self, hold: HoldIndex) -> Option<DVec3> {
        self.holds.get(hold.get()).copied()
    }

    fn effector_position(&self, effector: Effector) -> DVec3 {
        self.pose.effectors[effector.index()]
    }

    fn attachment_target(&self, effector: Effector) -> Option<usize> {
        self.pose.attachments[effector.index()]
    }

    fn create_attachment(&mut self, effector: Effector, hold: HoldIndex) -> Result<(), SimError> {
        let position = self
            .hold_position(hold)
            .ok_or(SimError::UnknownHold { effector, hold })?;
        let i = effector.index();
        self.pose.attachments[i] = Some(hold.get());
        self.pose.effectors[i] = position;
        Ok(())
    }

    fn destroy_attachment(&mut self, effector: Effector) {
        self.pose.attachments[effector.index()] = None;
    }

    fn is_body_part_in_contact(&self, part: BodyPart, surface: Surface) -> bool {
        let eps = self.params.contact_epsilon;
        match (Self::effector_of(part), surface) {
            (Some(effector), Surface::Hold(hold)) => self.hold_position(hold).is_some_and(|h| {
                self.effector_position(effector).distance(h) <= self.params.grip_radius
            }),
            (Some(effector), Surface::Floor) => self.effector_position(effector).z <= eps,
            (Some(effector), Surface::Wall) => {
                self.effector_position(effector).x >= self.wall_x - eps
            }
            (None, Surface::Floor) => self.pose.torso.z <= self.params.torso_floor_height + eps,
            (None, Surface::Wall) => self.pose.torso.x >= self.wall_x - eps,
            (None, Surface::Hold(_)) => false,
        }
    }

    fn torso_orientation(&self) -> DVec3 {
        DVec3::new(0.0, self.pose.pitch, 0.0)
    }

    fn torso_linear_velocity(&self) -> DVec3 {
        self.pose.torso_velocity
    }

    fn apply_joint_controls(&mut self, controls: &[f32]) {
        self.controls.clear();
        self.controls.extend_from_slice(controls);
    }

    fn step_simulation(&mut self) {
        for _ in 0..self.params.substeps {
            self.substep();
        }
    }

    fn reset(&mut self, seed: Option<u64>) {
        self.pose = self.initial.clone();
        self.controls.clear();
        let Some(seed) = seed else {
            return;
        };
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let jitter = self.params.start_jitter;
        for i in 0..self.pose.effectors.len() {
            let offset = DVec3::new(
                rng.gen_range(-jitter..=jitter),
                rng.gen_range(-jitter..=jitter),
                0.0,
            );
            self.pose.effectors[i] = self.bounded(self.pose.effectors[i] + offset);
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn body_state(&self) -> Vec<f32> {
        let pose = &self.pose;
        let mut state = Vec::with_capacity(23);
        state.extend(pose.torso.to_array());
        state.extend(pose.torso_velocity.to_array());
        state.push(pose.pitch);
        for effector in &pose.effectors {
            state.extend((*effector - pose.torso).to_array());
        }
        state.extend(
            pose.attachments
                .iter()
                .map(|a| if a.is_some() { 1.0 } else { 0.0 }),
        );
        state.into_iter().map(|v| v as f32).collect()
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "KinematicWall"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn wall() -> KinematicWall {
        KinematicWall::new(&HoldLayout::standard())
    }

    fn controls(entries: &[(usize, f32)]) -> Vec<f32> {
        let mut c = vec![0.0; 17];
        for &(i, v) in entries {
            c[i] = v;
        }
        c
    }

    #[test]
    fn standard_layout() {
        let w = wall();
        assert_eq!(w.hold_count(), 21);
        assert_relative_eq!(w.wall_x(), 0.4);
        assert!(w.hold_position(HoldIndex(21)).is_none());
        assert_eq!(w.body_state().len(), 23);
    }

    #[test]
    fn standing_pose_is_stable() {
        let mut w = wall();
        w.reset(Some(3));
        let start = w.pose().torso;
        for _ in 0..20 {
            w.step_simulation();
        }
        assert_relative_eq!(w.pose().torso.z, start.z);
        assert!(!w.is_body_part_in_contact(BodyPart::Torso, Surface::Floor));
        assert!(w.is_body_part_in_contact(BodyPart::LeftFoot, Surface::Floor));
    }

    #[test]
    fn unsupported_climber_falls_to_floor() {
        let mut w = wall();
        w.reset(None);
        w.apply_joint_controls(&controls(&[(8, 1.0), (11, 1.0)]));
        for _ in 0..30 {
            w.step_simulation();
        }
        assert!(w.is_body_part_in_contact(BodyPart::Pelvis, Surface::Floor));
        assert_relative_eq!(w.pose().torso.z, w.params().torso_floor_height);
    }

    #[test]
    fn limbs_stay_within_reach_and_before_wall() {
        let mut w = wall();
        w.reset(None);
        w.apply_joint_controls(&controls(&[(0, 1.0), (2, 1.0)]));
        for _ in 0..50 {
            w.step_simulation();
        }
        let hand = w.effector_position(Effector::LeftHand);
        assert!(hand.x <= w.wall_x() + 1e-12);
        assert!(hand.distance(w.pose().torso) <= w.params().reach + 1e-9);
        assert!(w.is_body_part_in_contact(BodyPart::LeftHand, Surface::Wall));
    }

    #[test]
    fn attachment_snaps_and_holds_torso() {
        let mut w = wall();
        w.reset(None);
        // Hold 9 sits at chest height in the middle of the wall.
        let hold = w.hold_position(HoldIndex(9)).unwrap();
        w.create_attachment(Effector::LeftHand, HoldIndex(9)).unwrap();
        assert_eq!(w.effector_position(Effector::LeftHand), hold);
        assert!(w.is_body_part_in_contact(BodyPart::LeftHand, Surface::Hold(HoldIndex(9))));

        // Lift both feet: the hand keeps the torso up.
        w.apply_joint_controls(&controls(&[(8, 1.0), (11, 1.0)]));
        for _ in 0..30 {
            w.step_simulation();
        }
        assert!(!w.is_body_part_in_contact(BodyPart::Torso, Surface::Floor));
        assert!(w.pose().torso.distance(hold) <= w.params().reach + 1e-9);
        assert_eq!(w.attachment_target(Effector::LeftHand), Some(9));
    }

    #[test]
    fn unknown_hold_rejected() {
        let mut w = wall();
        let err = w.create_attachment(Effector::RightFoot, HoldIndex(40)).unwrap_err();
        assert!(matches!(err, SimError::UnknownHold { .. }));
        assert_eq!(w.attachment_target(Effector::RightFoot), None);
    }

    #[test]
    fn supported_torso_follows_controls() {
        let mut w = wall();
        w.reset(None);
        w.create_attachment(Effector::LeftHand, HoldIndex(9)).unwrap();
        w.apply_joint_controls(&controls(&[(TORSO_CONTROL + 2, 1.0)]));
        let before = w.pose().torso.z;
        w.step_simulation();
        assert!(w.pose().torso.z > before);
        assert!(w.torso_linear_velocity().z > 0.0);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut w = wall();
        w.apply_joint_controls(&controls(&[(PITCH_CONTROL, -1.0)]));
        for _ in 0..100 {
            w.step_simulation();
        }
        assert_relative_eq!(w.torso_orientation().y, -std::f64::consts::FRAC_PI_2);
    }

    #[test]
    fn reset_is_seeded_and_detaches() {
        let mut a = wall();
        let mut b = wall();
        a.create_attachment(Effector::LeftHand, HoldIndex(0)).unwrap();
        a.reset(Some(9));
        b.reset(Some(9));
        assert_eq!(a.attachment_target(Effector::LeftHand), None);
        assert_eq!(a.body_state(), b.body_state());

        b.reset(Some(10));
        assert_ne!(a.body_state(), b.body_state());
    }
}
