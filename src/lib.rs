#![warn(missing_docs)]

//! Time-optimal trajectory generation for a swerve (4 wheel steering and 4 wheel drive) robot.
//!
//! Takes an ordered sequence of pose waypoints and produces a dynamically feasible,
//! time-minimal trajectory by posing the problem as a constrained nonlinear program:
//! per-segment durations, robot states and controls are decision variables, the robot
//! rigid-body dynamics and the per-module wheel velocity and force limits are
//! constraints, and the total traversal time is the objective. The solved trajectory
//! is resampled onto a fixed time grid for consumption by a motion controller.

use thiserror::Error;

/// Defines the swerve drivetrain geometry, its physical limits and the constraints it
/// contributes to the trajectory problem.
pub mod drivetrain;

/// Builds the piecewise-linear seed trajectory used to warm-start the solver.
pub mod initial_guess;

/// Defines the nonlinear program representation and the solver backends.
pub mod solver;

/// Assembles and solves the trajectory optimization problem.
pub mod generator;

/// Resamples a solved trajectory onto a fixed time grid.
pub mod resample;

/// Loads waypoint documents and exports solved trajectories.
pub mod trajectory_io;

/// Defines the different errors for the swerve trajectory crate.
#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The input document could not be parsed into the expected path structure.
    #[error("Unable to parse the input document: {reason}")]
    InvalidDocument {
        /// A human readable description of what was wrong with the document.
        reason: String,
    },

    /// The requested path name does not exist in the input document.
    #[error("Could not find a path named [{name}] in the input document.")]
    PathNotFound {
        /// The name of the path that was requested.
        name: String,
    },

    /// A trajectory needs at least a start and an end waypoint.
    #[error("A trajectory requires at least 2 waypoints, got {count}.")]
    TooFewWaypoints {
        /// The number of waypoints that were provided.
        count: usize,
    },

    /// A waypoint contains a coordinate that is not a finite number.
    #[error("Waypoint [{index}] contains a non-finite coordinate.")]
    NonFiniteWaypoint {
        /// The index of the offending waypoint in the input sequence.
        index: usize,
    },

    /// A drivetrain parameter is outside its valid range.
    #[error("Invalid drivetrain parameter [{name}]: {value}. Expected a strictly positive number.")]
    InvalidDrivetrainParameter {
        /// The name of the offending parameter.
        name: &'static str,
        /// The value that was provided for the parameter.
        value: f64,
    },

    /// The solver failed to find a feasible, optimal point for the trajectory problem.
    #[error(
        "The solver failed to converge after {iterations} iterations. Remaining constraint violation: {violation}."
    )]
    SolverDivergence {
        /// The number of outer iterations that were performed before giving up.
        iterations: usize,
        /// The largest remaining constraint violation when the solver gave up.
        violation: f64,
    },

    /// The solved trajectory cannot be resampled onto a time grid.
    #[error("The solved trajectory has a non-positive total duration ({duration}) and cannot be resampled.")]
    DegenerateTrajectory {
        /// The total duration of the solved trajectory.
        duration: f64,
    },
}
