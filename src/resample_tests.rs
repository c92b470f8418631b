use super::*;

use nalgebra::Vector2;

use crate::generator::{ControlInput, RobotState, SolvedTrajectory};

/// A zero module force set for the given number of node intervals. The
/// resampler never looks at the forces.
fn no_forces(interval_count: usize) -> Vec<[Vector2<f64>; 4]> {
    vec![[Vector2::zeros(); 4]; interval_count]
}

/// A solved trajectory moving linearly from x = 0 to x = 1 in one segment of
/// four intervals at 0.1 s spacing.
fn linear_trajectory() -> SolvedTrajectory {
    let states = (0..5)
        .map(|k| RobotState {
            x: k as f64 * 0.25,
            y: 1.0,
            theta: 0.5,
            vx: 2.5,
            vy: 0.0,
            omega: 0.0,
        })
        .collect();
    SolvedTrajectory::new(
        states,
        vec![ControlInput::default(); 4],
        no_forces(4),
        vec![0.1],
        4,
    )
}

#[test]
fn test_identity_resample_reproduces_nodes() {
    let solved = linear_trajectory();

    // A grid step equal to the node spacing lands every grid time on a node.
    let trajectory = resample(&solved, 0.1).unwrap();

    assert_eq!(trajectory.len(), 5);
    for (k, sample) in trajectory.samples().iter().enumerate() {
        assert!((sample.ts - k as f64 * 0.1).abs() < 1e-9);
        assert!((sample.x - k as f64 * 0.25).abs() < 1e-9);
        assert_eq!(sample.y, 1.0);
        assert_eq!(sample.theta, 0.5);
    }
}

#[test]
fn test_interpolation_between_nodes() {
    let solved = linear_trajectory();

    let trajectory = resample(&solved, 0.05).unwrap();

    // t = 0.05 sits halfway between the first two nodes.
    let halfway = trajectory.samples()[1];
    assert_eq!(halfway.ts, 0.05);
    assert_eq!(halfway.x, 0.125);
    assert_eq!(halfway.vx, 2.5);
}

#[test]
fn test_final_sample_is_exact_last_node() {
    let solved = linear_trajectory();

    // 0.07 does not divide the total duration, so the grid would stop short of
    // the end; the final node is appended regardless.
    let trajectory = resample(&solved, 0.07).unwrap();

    let last = trajectory.samples()[trajectory.len() - 1];
    assert_eq!(last.x, 1.0);
    assert_eq!(last.ts, 0.4);
}

#[test]
fn test_timestamps_increase_monotonically() {
    let solved = linear_trajectory();
    let trajectory = resample(&solved, 0.03).unwrap();

    assert_eq!(trajectory.samples()[0].ts, 0.0);
    for pair in trajectory.samples().windows(2) {
        assert!(pair[1].ts > pair[0].ts);
    }
}

#[test]
fn test_values_are_rounded_to_four_digits() {
    let states = vec![
        RobotState {
            x: 0.123456789,
            ..RobotState::default()
        },
        RobotState {
            x: 0.987654321,
            ..RobotState::default()
        },
    ];
    let solved = SolvedTrajectory::new(
        states,
        vec![ControlInput::default()],
        no_forces(1),
        vec![0.02],
        1,
    );

    let trajectory = resample(&solved, 0.02).unwrap();

    assert_eq!(trajectory.samples()[0].x, 0.1235);
    let last = trajectory.samples()[trajectory.len() - 1];
    assert_eq!(last.x, 0.9877);
}

#[test]
fn test_multiple_segments_with_different_spacing() {
    let states = (0..5)
        .map(|k| RobotState {
            x: k as f64,
            ..RobotState::default()
        })
        .collect();
    let solved = SolvedTrajectory::new(
        states,
        vec![ControlInput::default(); 4],
        no_forces(4),
        vec![0.1, 0.3],
        2,
    );

    let trajectory = resample(&solved, 0.2).unwrap();

    // Node timestamps are 0, 0.1, 0.2, 0.5, 0.8. The grid sample at t = 0.4
    // falls two thirds into the third interval.
    let samples = trajectory.samples();
    assert_eq!(samples[1].ts, 0.2);
    assert_eq!(samples[1].x, 2.0);
    assert_eq!(samples[2].ts, 0.4);
    assert!((samples[2].x - 2.6667).abs() < 1e-9);
}

#[test]
fn test_zero_duration_is_degenerate() {
    let solved = SolvedTrajectory::new(
        vec![RobotState::default(); 3],
        vec![ControlInput::default(); 2],
        no_forces(2),
        vec![0.0, 0.0],
        1,
    );

    assert_eq!(
        resample(&solved, 0.02),
        Err(Error::DegenerateTrajectory { duration: 0.0 })
    );
}

#[test]
fn test_non_positive_step_is_degenerate() {
    let solved = linear_trajectory();
    assert!(matches!(
        resample(&solved, 0.0),
        Err(Error::DegenerateTrajectory { .. })
    ));
}
