//! Integration test: full step/reset cycles against a scripted wall.
//!
//! Covers stance matching, plan advancement, the best-distance baseline,
//! reward shaping at the environment boundary, termination, truncation and
//! stepping past plan completion.

use std::f64::consts::PI;

use approx::assert_relative_eq;
use bevy::math::DVec3;

use belay_core::config::{ClimbConfig, RewardVariant, StanceConfig};
use belay_core::physics::{BodyPart, Surface};
use belay_core::types::{Action, Effector, EffectorDistances, HoldIndex};
use belay_gym::ClimbEnv;
use belay_test_utils::fixtures::{TEST_JOINTS, grip_action, line_config, release_action};
use belay_test_utils::mocks::{ScriptEvent, ScriptHandle, ScriptedWall};

fn env_for(config: &ClimbConfig, holds: usize) -> (ClimbEnv, ScriptHandle) {
    let wall = ScriptedWall::new(holds);
    let handle = wall.handle();
    let env = ClimbEnv::from_config(config, Box::new(wall)).unwrap();
    (env, handle)
}

fn hold_all() -> Action {
    grip_action(TEST_JOINTS, [true; 4])
}

// ---------------------------------------------------------------------------
// Stance matching
// ---------------------------------------------------------------------------

#[test]
fn all_four_attach_in_one_step_completes_plan() {
    let (mut env, handle) = env_for(&line_config(4, &[[0, 1, 2, 3]]), 4);
    env.reset(Some(1));
    for (i, effector) in Effector::ALL.into_iter().enumerate() {
        handle.set_contact(BodyPart::of(effector), Surface::Hold(HoldIndex(i)), true);
    }

    let result = env.step(&hold_all()).unwrap();
    assert!(result.info.is_success);
    assert!(result.info.plan_complete);
    assert!(result.terminated);
    assert!(!result.truncated);
    assert_eq!(result.info.current_stance.to_raw(), [0, 1, 2, 3]);
}

#[test]
fn single_hand_stance_reached() {
    let (mut env, handle) = env_for(&line_config(2, &[[0, -1, -1, -1]]), 2);
    env.reset(None);
    handle.attach(Effector::LeftHand, 0);

    let result = env.step(&hold_all()).unwrap();
    assert!(result.info.is_success);
    assert!(result.terminated);
}

#[test]
fn extra_grip_is_not_a_match() {
    let (mut env, handle) = env_for(&line_config(2, &[[0, -1, -1, -1]]), 2);
    env.reset(None);
    handle.attach(Effector::LeftHand, 0);
    handle.attach(Effector::RightHand, 1);

    let result = env.step(&hold_all()).unwrap();
    assert!(!result.info.is_success);
    assert!(!result.info.plan_complete);
    assert_eq!(result.info.desired_stance_index, 0);
}

#[test]
fn dangling_attachment_reads_as_free() {
    let (mut env, handle) = env_for(&line_config(2, &[[-1, -1, -1, -1], [0, -1, -1, -1]]), 2);
    env.reset(None);
    handle.attach(Effector::RightFoot, 99);

    let result = env.step(&hold_all()).unwrap();
    // Free stance matches even though the physics reports a constraint.
    assert!(result.info.is_success);
    assert_eq!(env.progress().desired_index, 1);
}

// ---------------------------------------------------------------------------
// Plan advancement
// ---------------------------------------------------------------------------

#[test]
fn desired_index_never_decreases() {
    let config = line_config(3, &[[0, -1, -1, -1], [0, 1, -1, -1], [2, 1, -1, -1]]);
    let (mut env, handle) = env_for(&config, 3);
    env.reset(None);

    let script: [&[(Effector, Option<usize>)]; 6] = [
        &[(Effector::LeftHand, Some(0))],
        &[(Effector::LeftHand, None)],
        &[(Effector::LeftHand, Some(0)), (Effector::RightHand, Some(1))],
        &[(Effector::RightHand, None)],
        &[(Effector::LeftHand, Some(2)), (Effector::RightHand, Some(1))],
        &[(Effector::LeftHand, None), (Effector::RightHand, None)],
    ];

    let mut last = 0;
    for changes in script {
        for &(effector, target) in changes {
            match target {
                Some(hold) => handle.attach(effector, hold),
                None => handle.detach(effector),
            }
        }
        env.step(&hold_all()).unwrap();
        let index = env.progress().desired_index;
        assert!(index >= last, "index went from {last} to {index}");
        last = index;
    }
    assert_eq!(last, 3);
}

#[test]
fn baseline_resets_to_fresh_distances_on_advance() {
    let config = line_config(2, &[[0, -1, -1, -1], [1, -1, -1, -1]]);
    let (mut env, handle) = env_for(&config, 2);
    handle.set_hold_position(1, DVec3::new(0.0, 0.0, 2.0));
    handle.set_effector_position(Effector::LeftHand, DVec3::new(0.0, 0.0, 0.5));
    env.reset(None);
    handle.attach(Effector::LeftHand, 0);

    env.step(&hold_all()).unwrap();
    assert_eq!(env.progress().desired_index, 1);
    assert_relative_eq!(env.progress().best_distances.0[0], 1.5);
    assert_eq!(env.progress().best_distances.0[1..], [0.0; 3]);
}

#[test]
fn exclusion_set_blocks_grip() {
    let mut config = line_config(3, &[[0, -1, -1, -1], [2, -1, -1, -1]]);
    config.stances[1] = StanceConfig::new("reach", [2, -1, -1, -1]).with_exclude(vec![1]);
    let (mut env, handle) = env_for(&config, 3);
    env.reset(None);
    handle.attach(Effector::LeftHand, 0);
    env.step(&hold_all()).unwrap();
    assert_eq!(env.progress().excluded_holds, vec![HoldIndex(1)]);

    // Right hand touches the excluded hold and asks to grip.
    handle.set_contact(BodyPart::RightHand, Surface::Hold(HoldIndex(1)), true);
    env.step(&hold_all()).unwrap();
    assert_eq!(handle.attachment(Effector::RightHand), None);
}

#[test]
fn action_override_forces_grip() {
    let mut config = line_config(2, &[[0, -1, -1, -1]]);
    config.stances[0] =
        StanceConfig::new("forced", [0, -1, -1, -1]).with_action_override([1.0, -1.0, -1.0, -1.0]);
    let (mut env, handle) = env_for(&config, 2);
    env.reset(None);
    handle.set_contact(BodyPart::LeftHand, Surface::Hold(HoldIndex(0)), true);

    let result = env.step(&release_action(TEST_JOINTS)).unwrap();
    assert!(result.info.is_success);
    assert_eq!(handle.attachment(Effector::LeftHand), Some(0));
}

// ---------------------------------------------------------------------------
// Reward
// ---------------------------------------------------------------------------

#[test]
fn distance_term_is_floored() {
    let (mut env, handle) = env_for(&line_config(1, &[[0, -1, -1, -1]]), 1);
    handle.set_effector_position(Effector::LeftHand, DVec3::new(0.0, 0.0, -25.0));
    env.reset(None);

    let result = env.step(&release_action(TEST_JOINTS)).unwrap();
    // -2 distance floor, +0.1 off the floor, level torso, still.
    assert_relative_eq!(result.reward, -1.9, epsilon = 1e-9);
}

#[test]
fn posture_and_velocity_terms() {
    let (mut env, handle) = env_for(&line_config(1, &[[0, -1, -1, -1]]), 1);
    env.reset(None);
    handle.set_pitch(-PI / 6.0);
    handle.set_torso_velocity(DVec3::new(0.0, 0.0, 0.25));

    let result = env.step(&release_action(TEST_JOINTS)).unwrap();
    let expected = 4.0 * 0.25 + 0.5 * (PI / 6.0) + 0.1;
    assert_relative_eq!(result.reward, expected, epsilon = 1e-9);
}

#[test]
fn floor_contact_terminates_with_penalty() {
    let (mut env, handle) = env_for(&line_config(1, &[[0, -1, -1, -1]]), 1);
    env.reset(None);
    handle.schedule(1, ScriptEvent::Contact(BodyPart::Pelvis, Surface::Floor, true));

    let result = env.step(&release_action(TEST_JOINTS)).unwrap();
    assert!(result.terminated);
    assert!(result.info.on_floor);
    assert!(!result.info.plan_complete);
    assert_relative_eq!(result.reward, -5.0, epsilon = 1e-9);
}

#[test]
fn feet_on_floor_do_not_terminate() {
    let (mut env, handle) = env_for(&line_config(1, &[[0, -1, -1, -1]]), 1);
    env.reset(None);
    handle.set_contact(BodyPart::LeftFoot, Surface::Floor, true);
    handle.set_contact(BodyPart::RightFoot, Surface::Floor, true);

    let result = env.step(&release_action(TEST_JOINTS)).unwrap();
    assert!(!result.terminated);
    assert!(!result.info.on_floor);
}

#[test]
fn equation_reward_penalises_regression() {
    let mut config = line_config(1, &[[0, -1, -1, -1]]);
    config.reward.variant = RewardVariant::Equation;
    let (mut env, handle) = env_for(&config, 1);
    handle.set_effector_position(Effector::LeftHand, DVec3::new(0.0, 0.0, 1.0));
    env.reset(None);
    assert_eq!(env.progress().best_distances, EffectorDistances([1.0, 0.0, 0.0, 0.0]));

    handle.set_effector_position(Effector::LeftHand, DVec3::new(0.0, 0.0, 2.0));
    let result = env.step(&release_action(TEST_JOINTS)).unwrap();
    assert!(result.reward < 0.0);
    assert_relative_eq!(env.progress().best_distances.0[0], 1.0);
}

// ---------------------------------------------------------------------------
// Termination / truncation
// ---------------------------------------------------------------------------

#[test]
fn step_limit_truncates_without_terminating() {
    let mut config = line_config(1, &[[0, -1, -1, -1]]);
    config.simulation.max_episode_steps = 4;
    let (mut env, _handle) = env_for(&config, 1);
    env.reset(None);

    for step in 1..=4 {
        let result = env.step(&release_action(TEST_JOINTS)).unwrap();
        assert_eq!(result.truncated, step == 4);
        assert!(!result.terminated);
    }
}

#[test]
fn stance_budget_truncates() {
    let mut config = line_config(2, &[[0, -1, -1, -1], [1, -1, -1, -1]]);
    config.simulation.stance_step_budget = Some(3);
    let (mut env, handle) = env_for(&config, 2);
    env.reset(None);

    let first = env.step(&release_action(TEST_JOINTS)).unwrap();
    assert!(!first.truncated);
    // Advancing restarts the budget.
    handle.attach(Effector::LeftHand, 0);
    env.step(&hold_all()).unwrap();
    assert_eq!(env.progress().steps_on_stance, 0);

    let results: Vec<_> = (0..3)
        .map(|_| env.step(&hold_all()).unwrap().truncated)
        .collect();
    assert_eq!(results, vec![false, false, true]);
}

#[test]
fn stepping_after_completion_is_stable() {
    let config = line_config(2, &[[0, -1, -1, -1], [1, -1, -1, -1]]);
    let (mut env, handle) = env_for(&config, 2);
    env.reset(None);
    handle.attach(Effector::LeftHand, 0);
    env.step(&hold_all()).unwrap();
    handle.attach(Effector::LeftHand, 1);
    let done = env.step(&hold_all()).unwrap();
    assert!(done.terminated);
    assert!(done.info.plan_complete);

    let progress = env.progress().clone();
    for _ in 0..3 {
        let result = env.step(&hold_all()).unwrap();
        assert!(result.info.plan_complete);
        assert!(result.terminated);
        assert_eq!(result.info.desired_stance.to_raw(), [1, -1, -1, -1]);
    }
    assert_eq!(env.progress().desired_index, 2);
    assert_eq!(env.progress().excluded_holds, progress.excluded_holds);
    assert_eq!(env.progress().best_distances, progress.best_distances);
    assert_eq!(env.episode().step_count, 5);
}

#[test]
fn baseline_frozen_after_completion() {
    for variant in [RewardVariant::Equation, RewardVariant::NegativeDistance] {
        let mut config = line_config(2, &[[0, -1, -1, -1], [1, -1, -1, -1]]);
        config.reward.variant = variant;
        let (mut env, handle) = env_for(&config, 2);
        env.reset(None);
        handle.attach(Effector::LeftHand, 0);
        env.step(&hold_all()).unwrap();
        handle.attach(Effector::LeftHand, 1);
        assert!(env.step(&hold_all()).unwrap().info.plan_complete);

        let best = env.progress().best_distances;
        // Closer to the final hold than the baseline ever was.
        handle.set_effector_position(Effector::LeftHand, DVec3::new(0.4, 0.0, 0.6));
        let result = env.step(&hold_all()).unwrap();
        assert!(result.info.plan_complete, "{variant}");
        assert_eq!(env.progress().best_distances, best, "{variant}");

        let again = env.step(&hold_all()).unwrap();
        assert_relative_eq!(again.reward, result.reward, epsilon = 1e-12);
        assert_eq!(env.progress().best_distances, best, "{variant}");
    }
}

#[test]
fn episode_reward_accumulates() {
    let (mut env, _handle) = env_for(&line_config(1, &[[0, -1, -1, -1]]), 1);
    env.reset(None);
    let mut total = 0.0;
    for _ in 0..5 {
        total += env.step(&release_action(TEST_JOINTS)).unwrap().reward;
    }
    let result = env.step(&release_action(TEST_JOINTS)).unwrap();
    assert_relative_eq!(result.info.episode_reward, total + result.reward, epsilon = 1e-9);
}
