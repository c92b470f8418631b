use super::*;

use crate::solver::augmented_lagrangian::{AugmentedLagrangian, AugmentedLagrangianConfig};
use crate::solver::NlpSolver;

/// A solver configuration sized for the small test problems: looser feasibility
/// than the default, but a bigger iteration budget.
fn test_solver() -> Box<dyn NlpSolver> {
    let config = AugmentedLagrangianConfig::new()
        .with_constraint_tolerance(1e-4)
        .with_max_outer_iterations(150)
        .with_max_inner_iterations(800);
    Box::new(AugmentedLagrangian::with_config(config))
}

fn test_generator(samples_per_segment: usize) -> TrajectoryGenerator {
    TrajectoryGenerator::new(SwerveDrivetrain::default_robot())
        .with_samples_per_segment(samples_per_segment)
        .with_solver(test_solver())
}

#[test]
fn test_solve_with_too_few_waypoints() {
    let generator = test_generator(4);
    let result = generator.solve(&[Waypoint::new(0.0, 0.0, 0.0)]);
    assert_eq!(result.unwrap_err(), Error::TooFewWaypoints { count: 1 });
}

#[test]
fn test_solve_with_no_waypoints() {
    let generator = test_generator(4);
    let result = generator.solve(&[]);
    assert_eq!(result.unwrap_err(), Error::TooFewWaypoints { count: 0 });
}

#[test]
fn test_solve_with_non_finite_waypoint() {
    let generator = test_generator(4);
    let result = generator.solve(&[
        Waypoint::new(0.0, 0.0, 0.0),
        Waypoint::new(f64::NAN, 1.0, 0.0),
    ]);
    assert_eq!(result.unwrap_err(), Error::NonFiniteWaypoint { index: 1 });
}

#[test]
fn test_waypoint_from_triple() {
    let waypoint = Waypoint::from([1.0, 2.0, 0.5]);
    assert_eq!(waypoint, Waypoint::new(1.0, 2.0, 0.5));
}

#[test]
fn test_identical_start_and_end_is_degenerate_but_feasible() {
    let generator = test_generator(4);
    let pose = Waypoint::new(2.0, 1.0, 0.5);

    let solved = generator.solve(&[pose, pose]).unwrap();

    // The robot has nowhere to go, so the optimal trajectory is a single point
    // in space traversed in (near) zero time.
    assert!(solved.total_duration().abs() < 0.2);
    for state in solved.states() {
        assert!((state.x - pose.x).abs() < 1e-2);
        assert!((state.y - pose.y).abs() < 1e-2);
        assert!((state.theta - pose.theta).abs() < 1e-2);
        assert!(state.vx.abs() < 1e-2);
        assert!(state.vy.abs() < 1e-2);
        assert!(state.omega.abs() < 1e-2);
    }
}

#[test]
fn test_short_translation() {
    let generator = test_generator(3);
    let waypoints = [Waypoint::new(0.0, 0.0, 0.0), Waypoint::new(0.1, 0.0, 0.0)];

    let solved = generator.solve(&waypoints).unwrap();

    // Node layout.
    assert_eq!(solved.states().len(), 4);
    assert_eq!(solved.controls().len(), 3);
    assert_eq!(solved.segment_dts().len(), 1);

    // The solver only reports success when the constraint violation is within
    // tolerance, so the waypoint and boundary constraints must hold.
    let first = solved.states()[0];
    let last = solved.states()[3];
    assert!((first.x).abs() < 1e-3);
    assert!((last.x - 0.1).abs() < 1e-3);
    assert!(first.vx.abs() < 1e-3 && first.vy.abs() < 1e-3 && first.omega.abs() < 1e-3);
    assert!(last.vx.abs() < 1e-3 && last.vy.abs() < 1e-3 && last.omega.abs() < 1e-3);

    // Moving a positive distance from rest to rest takes time, so the node
    // spacing is positive and the timestamps increase monotonically from zero.
    let timestamps = solved.timestamps();
    assert_eq!(timestamps[0], 0.0);
    for pair in timestamps.windows(2) {
        assert!(pair[1] > pair[0]);
    }

    // The module limits hold at every node within the feasibility tolerance.
    let drivetrain = generator.drivetrain();
    let speed_limit = drivetrain.max_module_speed();
    for state in solved.states() {
        for module in crate::drivetrain::ModuleId::ALL {
            let position = drivetrain.module_position(module, state.theta);
            let module_vx = state.vx + position.y * state.omega;
            let module_vy = state.vy - position.x * state.omega;
            let speed = f64::hypot(module_vx, module_vy);
            assert!(speed <= speed_limit + 1e-2);
        }
    }

    // The solved module forces are part of the result and stay within what the
    // motor torque can deliver at the wheel.
    let force_limit = drivetrain.max_module_force();
    assert_eq!(solved.module_forces().len(), solved.controls().len());
    for interval in solved.module_forces() {
        for force in interval {
            assert!(force.norm() <= force_limit + 1e-2);
        }
    }
}

#[test]
fn test_dynamics_hold_on_solved_trajectory() {
    let generator = test_generator(3);
    let waypoints = [Waypoint::new(0.0, 0.0, 0.0), Waypoint::new(0.1, 0.0, 0.0)];

    let solved = generator.solve(&waypoints).unwrap();

    let dt = solved.segment_dts()[0];
    for k in 0..solved.controls().len() {
        let current = solved.states()[k];
        let next = solved.states()[k + 1];
        let control = solved.controls()[k];

        assert!((next.x - (current.x + current.vx * dt)).abs() < 1e-3);
        assert!((next.y - (current.y + current.vy * dt)).abs() < 1e-3);
        assert!((next.theta - (current.theta + current.omega * dt)).abs() < 1e-3);
        assert!((next.vx - (current.vx + control.ax * dt)).abs() < 1e-3);
        assert!((next.vy - (current.vy + control.ay * dt)).abs() < 1e-3);
        assert!((next.omega - (current.omega + control.alpha * dt)).abs() < 1e-3);
    }
}

// A full two-segment path is too slow for the default debug-mode test run; run
// it explicitly with `cargo test -- --ignored`.
#[test]
#[ignore]
fn test_three_waypoint_path() {
    let generator = test_generator(10);
    let waypoints = [
        Waypoint::new(0.0, 0.0, 0.0),
        Waypoint::new(3.0, 3.0, 0.0),
        Waypoint::new(9.0, 0.0, 0.0),
    ];

    let solved = generator.solve(&waypoints).unwrap();

    assert_eq!(solved.states().len(), 21);
    let middle = solved.states()[10];
    assert!((middle.x - 3.0).abs() < 1e-3);
    assert!((middle.y - 3.0).abs() < 1e-3);

    let last = solved.states()[20];
    assert!((last.x - 9.0).abs() < 1e-3);
    assert!((last.y).abs() < 1e-3);
    assert!(last.vx.abs() < 1e-3 && last.vy.abs() < 1e-3);

    // Roughly 11 m of path against a 3.6 m/s module speed limit cannot go
    // faster than a few seconds.
    assert!(solved.total_duration() > 3.0);
}

#[test]
fn test_timestamps_replicate_segment_spacing() {
    let solved = SolvedTrajectory::new(
        vec![RobotState::default(); 5],
        vec![ControlInput::default(); 4],
        vec![[Vector2::zeros(); 4]; 4],
        vec![0.5, 0.25],
        2,
    );

    let timestamps = solved.timestamps();
    assert_eq!(timestamps, vec![0.0, 0.5, 1.0, 1.25, 1.5]);
    assert_eq!(solved.total_duration(), 1.5);
    assert_eq!(solved.samples_per_segment(), 2);
}

#[test]
fn test_generate_resamples_onto_fixed_grid() {
    let generator = test_generator(3).with_output_step(0.05);
    let waypoints = [Waypoint::new(0.0, 0.0, 0.0), Waypoint::new(0.1, 0.0, 0.0)];

    let trajectory = generator.generate(&waypoints).unwrap();

    assert!(!trajectory.is_empty());
    assert_eq!(trajectory.step(), 0.05);

    // The last sample is the exact final node, on the final waypoint.
    let last = trajectory.samples()[trajectory.len() - 1];
    assert!((last.x - 0.1).abs() < 1e-3);
}
