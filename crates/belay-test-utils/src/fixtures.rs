//! Small task configs and action builders.

use belay_core::config::{ClimbConfig, SimulationConfig, StanceConfig, WallConfig};
use belay_core::types::Action;

/// Joint count used by the fixture configs.
pub const TEST_JOINTS: usize = 2;

/// A wall of `hold_count` holds in a vertical line, 0.5 apart, with one
/// plan stance per entry of `stances`.
#[allow(clippy::cast_precision_loss)]
pub fn line_config(hold_count: usize, stances: &[[i64; 4]]) -> ClimbConfig {
    ClimbConfig {
        simulation: SimulationConfig {
            max_episode_steps: 50,
            num_joints: TEST_JOINTS,
            ..SimulationConfig::default()
        },
        wall: WallConfig {
            holds: (0..hold_count).map(|i| [0.4, 0.0, 0.5 * i as f64]).collect(),
        },
        stances: stances
            .iter()
            .enumerate()
            .map(|(i, holds)| StanceConfig::new(format!("stance_{i}"), *holds))
            .collect(),
        ..ClimbConfig::default()
    }
}

/// Zero joint controls followed by a grasp intent of `1` where `grip` is set
/// and `-1` elsewhere.
pub fn grip_action(num_joints: usize, grip: [bool; 4]) -> Action {
    let mut data = vec![0.0; num_joints];
    data.extend(grip.map(|g| if g { 1.0 } else { -1.0 }));
    Action::new(data)
}

/// Zero joint controls, every effector letting go.
pub fn release_action(num_joints: usize) -> Action {
    grip_action(num_joints, [false; 4])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_config_is_valid() {
        let config = line_config(4, &[[0, -1, -1, -1], [1, 0, -1, -1]]);
        config.validate().unwrap();
        assert_eq!(config.wall.holds.len(), 4);
        assert_eq!(config.stances[1].name, "stance_1");
        assert_eq!(config.simulation.action_dim(), TEST_JOINTS + 4);
    }

    #[test]
    fn grip_action_layout() {
        let action = grip_action(2, [true, false, false, true]);
        assert_eq!(action.as_slice(), &[0.0, 0.0, 1.0, -1.0, -1.0, 1.0]);
        assert_eq!(release_action(1).as_slice(), &[0.0, -1.0, -1.0, -1.0, -1.0]);
    }
}
