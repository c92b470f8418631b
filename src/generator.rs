//! Assembles and solves the trajectory optimization problem.
//!
//! The trajectory between `w` waypoints is discretized into `w - 1` segments of
//! `samples_per_segment` node intervals each. Every segment owns a free duration
//! variable; the robot state (pose and velocities) lives on the nodes and the
//! control (accelerations) lives on the intervals between nodes. The problem
//! minimizes the summed segment durations subject to forward-Euler rigid-body
//! dynamics, rest at both trajectory ends, exact waypoint poses at the segment
//! boundary nodes and the drivetrain velocity/force limits at every node.

extern crate nalgebra as na;

use na::Vector2;

use crate::drivetrain::SwerveDrivetrain;
use crate::initial_guess::generate_initial_trajectory;
use crate::resample::{resample, FixedRateTrajectory};
use crate::solver::augmented_lagrangian::AugmentedLagrangian;
use crate::solver::problem::NlpProblem;
use crate::solver::NlpSolver;
use crate::Error;

#[cfg(test)]
#[path = "generator_tests.rs"]
mod generator_tests;

/// The number of discretization nodes per trajectory segment used when no other
/// value is configured. Dense enough to keep the forward-Euler integration error
/// small on paths of a few meters.
pub const DEFAULT_SAMPLES_PER_SEGMENT: usize = 100;

/// The default spacing of the fixed-rate output trajectory in seconds.
pub const DEFAULT_OUTPUT_STEP: f64 = 0.02;

/// The initial guess for every segment duration in seconds. Most competition
/// paths take a few seconds per segment.
const SEGMENT_DURATION_GUESS: f64 = 5.0;

/// A pose the trajectory must pass through at some solver-chosen time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Waypoint {
    /// The x position in m.
    pub x: f64,
    /// The y position in m.
    pub y: f64,
    /// The heading in rad.
    pub theta: f64,
}

impl Waypoint {
    /// Creates a new waypoint from a pose.
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        Self { x, y, theta }
    }

    /// Returns a value indicating whether all coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.theta.is_finite()
    }
}

impl From<[f64; 3]> for Waypoint {
    fn from(pose: [f64; 3]) -> Self {
        Self::new(pose[0], pose[1], pose[2])
    }
}

/// The robot state at a single discretization node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RobotState {
    /// The x position in m.
    pub x: f64,
    /// The y position in m.
    pub y: f64,
    /// The heading in rad.
    pub theta: f64,
    /// The x velocity in m/s.
    pub vx: f64,
    /// The y velocity in m/s.
    pub vy: f64,
    /// The angular velocity in rad/s.
    pub omega: f64,
}

/// The control input active during a single node interval.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ControlInput {
    /// The x acceleration in m/s^2.
    pub ax: f64,
    /// The y acceleration in m/s^2.
    pub ay: f64,
    /// The angular acceleration in rad/s^2.
    pub alpha: f64,
}

/// The solved, variable-timestep trajectory as returned by the optimizer.
#[derive(Clone, Debug, PartialEq)]
pub struct SolvedTrajectory {
    states: Vec<RobotState>,
    controls: Vec<ControlInput>,
    module_forces: Vec<[Vector2<f64>; 4]>,
    segment_dts: Vec<f64>,
    samples_per_segment: usize,
}

impl SolvedTrajectory {
    /// Creates a new solved trajectory from the given sample arrays.
    pub(crate) fn new(
        states: Vec<RobotState>,
        controls: Vec<ControlInput>,
        module_forces: Vec<[Vector2<f64>; 4]>,
        segment_dts: Vec<f64>,
        samples_per_segment: usize,
    ) -> Self {
        Self {
            states,
            controls,
            module_forces,
            segment_dts,
            samples_per_segment,
        }
    }

    /// Returns the robot state at every discretization node.
    pub fn states(&self) -> &[RobotState] {
        &self.states
    }

    /// Returns the control input for every node interval.
    pub fn controls(&self) -> &[ControlInput] {
        &self.controls
    }

    /// Returns the solved ground force of the four modules in N for every node
    /// interval, in [crate::drivetrain::ModuleId::ALL] order.
    pub fn module_forces(&self) -> &[[Vector2<f64>; 4]] {
        &self.module_forces
    }

    /// Returns the solved node spacing for every segment in seconds.
    pub fn segment_dts(&self) -> &[f64] {
        &self.segment_dts
    }

    /// Returns the number of node intervals per segment.
    pub fn samples_per_segment(&self) -> usize {
        self.samples_per_segment
    }

    /// Returns the absolute timestamp of every discretization node, starting at
    /// zero.
    pub fn timestamps(&self) -> Vec<f64> {
        let mut timestamps = Vec::with_capacity(self.states.len());
        let mut time = 0.0;
        timestamps.push(time);
        for dt in &self.segment_dts {
            for _ in 0..self.samples_per_segment {
                time += dt;
                timestamps.push(time);
            }
        }
        timestamps
    }

    /// Returns the total duration of the trajectory in seconds.
    pub fn total_duration(&self) -> f64 {
        self.segment_dts
            .iter()
            .map(|dt| dt * self.samples_per_segment as f64)
            .sum()
    }
}

/// Generates time-optimal trajectories for a swerve drivetrain.
///
/// A generator owns the drivetrain description, the discretization density and the
/// solver backend. Each call to [TrajectoryGenerator::solve] constructs a fresh
/// problem; nothing is shared between solves, so one generator can serve many
/// trajectories sequentially and the (copyable) drivetrain can be shared between
/// generators freely.
pub struct TrajectoryGenerator {
    drivetrain: SwerveDrivetrain,
    samples_per_segment: usize,
    output_step: f64,
    solver: Box<dyn NlpSolver>,
}

impl TrajectoryGenerator {
    /// Creates a new generator for the given drivetrain with the default
    /// discretization density, output rate and solver backend.
    pub fn new(drivetrain: SwerveDrivetrain) -> Self {
        Self {
            drivetrain,
            samples_per_segment: DEFAULT_SAMPLES_PER_SEGMENT,
            output_step: DEFAULT_OUTPUT_STEP,
            solver: Box::new(AugmentedLagrangian::new()),
        }
    }

    /// Builder-style setter for the number of node intervals per segment.
    pub fn with_samples_per_segment(mut self, samples_per_segment: usize) -> Self {
        self.samples_per_segment = samples_per_segment.max(1);
        self
    }

    /// Builder-style setter for the fixed-rate output spacing in seconds.
    pub fn with_output_step(mut self, output_step: f64) -> Self {
        self.output_step = output_step;
        self
    }

    /// Builder-style setter for the solver backend.
    pub fn with_solver(mut self, solver: Box<dyn NlpSolver>) -> Self {
        self.solver = solver;
        self
    }

    /// Returns the drivetrain this generator plans for.
    pub fn drivetrain(&self) -> &SwerveDrivetrain {
        &self.drivetrain
    }

    /// Validates the waypoint sequence before any problem construction.
    fn validate_waypoints(waypoints: &[Waypoint]) -> Result<(), Error> {
        if waypoints.len() < 2 {
            return Err(Error::TooFewWaypoints {
                count: waypoints.len(),
            });
        }

        for (index, waypoint) in waypoints.iter().enumerate() {
            if !waypoint.is_finite() {
                return Err(Error::NonFiniteWaypoint { index });
            }
        }

        Ok(())
    }

    /// Solves for the time-optimal trajectory through the given waypoints.
    ///
    /// The first and last waypoint are the trajectory endpoints; the robot starts
    /// and ends at rest.
    ///
    /// ## Parameters
    ///
    /// * 'waypoints' - The waypoint sequence, at least two entries with finite
    ///   coordinates.
    ///
    /// ## Errors
    ///
    /// * [Error::TooFewWaypoints] - Returned when fewer than two waypoints are given.
    /// * [Error::NonFiniteWaypoint] - Returned when a waypoint coordinate is NaN or
    ///   infinite.
    /// * [Error::SolverDivergence] - Returned when the solver backend fails to find
    ///   a feasible, optimal trajectory. No partial result is returned.
    pub fn solve(&self, waypoints: &[Waypoint]) -> Result<SolvedTrajectory, Error> {
        Self::validate_waypoints(waypoints)?;

        let segment_count = waypoints.len() - 1;
        let n = self.samples_per_segment;
        let total_intervals = n * segment_count;
        let node_count = total_intervals + 1;

        let mut problem = NlpProblem::new();

        // One free duration per segment, seeded at a few seconds.
        let durations = problem.add_variables(segment_count);
        for duration in &durations {
            problem.set_initial(*duration, SEGMENT_DURATION_GUESS);
            let duration = *duration;
            problem.constrain_inequality(move |x| -x[duration.index()]);
        }

        let objective_durations = durations.clone();
        problem.minimize(move |x| {
            objective_durations
                .iter()
                .map(|t| x[t.index()])
                .sum::<f64>()
        });

        // State on the nodes, control on the intervals.
        let x = problem.add_variables(node_count);
        let y = problem.add_variables(node_count);
        let theta = problem.add_variables(node_count);
        let vx = problem.add_variables(node_count);
        let vy = problem.add_variables(node_count);
        let omega = problem.add_variables(node_count);

        let ax = problem.add_variables(total_intervals);
        let ay = problem.add_variables(total_intervals);
        let alpha = problem.add_variables(total_intervals);

        // Forward-Euler dynamics: the position and heading derivatives are the
        // velocities, the velocity derivatives are the commanded accelerations.
        // The node spacing within a segment is the segment duration divided by the
        // interval count, itself a function of a decision variable.
        let interval_count = n as f64;
        for k in 0..total_intervals {
            let duration = durations[k / n];
            let pairs = [
                (x[k], x[k + 1], vx[k]),
                (y[k], y[k + 1], vy[k]),
                (theta[k], theta[k + 1], omega[k]),
                (vx[k], vx[k + 1], ax[k]),
                (vy[k], vy[k + 1], ay[k]),
                (omega[k], omega[k + 1], alpha[k]),
            ];
            for (current, next, derivative) in pairs {
                problem.constrain_equality(move |p| {
                    let dt = p[duration.index()] / interval_count;
                    p[next.index()] - (p[current.index()] + p[derivative.index()] * dt)
                });
            }
        }

        // The robot is at rest when starting and ending a path.
        for node in [0, total_intervals] {
            for variable in [vx[node], vy[node], omega[node]] {
                problem.constrain_equality(move |p| p[variable.index()]);
            }
        }

        // The robot passes through every waypoint pose at the segment boundaries.
        for (j, waypoint) in waypoints.iter().enumerate() {
            let node = j * n;
            let pins = [
                (x[node], waypoint.x),
                (y[node], waypoint.y),
                (theta[node], waypoint.theta),
            ];
            for (variable, target) in pins {
                problem.constrain_equality(move |p| p[variable.index()] - target);
            }
        }

        let force_variables = self.drivetrain.add_kinematics_constraints(
            &mut problem,
            &theta,
            &vx,
            &vy,
            &omega,
            &ax,
            &ay,
            &alpha,
        );

        // Seed positions and heading with the piecewise-linear interpolation; the
        // remaining variables start at zero.
        let seed = generate_initial_trajectory(waypoints, n);
        for k in 0..node_count {
            problem.set_initial(x[k], seed.x[k]);
            problem.set_initial(y[k], seed.y[k]);
            problem.set_initial(theta[k], seed.theta[k]);
        }

        let solution = self.solver.solve(&problem)?;

        let states = (0..node_count)
            .map(|k| RobotState {
                x: solution.value(x[k]),
                y: solution.value(y[k]),
                theta: solution.value(theta[k]),
                vx: solution.value(vx[k]),
                vy: solution.value(vy[k]),
                omega: solution.value(omega[k]),
            })
            .collect();

        let controls = (0..total_intervals)
            .map(|k| ControlInput {
                ax: solution.value(ax[k]),
                ay: solution.value(ay[k]),
                alpha: solution.value(alpha[k]),
            })
            .collect();

        let module_forces = force_variables
            .into_iter()
            .map(|forces| forces.map(|f| Vector2::new(solution.value(f.x), solution.value(f.y))))
            .collect();

        let segment_dts = durations
            .iter()
            .map(|t| solution.value(*t) / interval_count)
            .collect();

        Ok(SolvedTrajectory::new(
            states,
            controls,
            module_forces,
            segment_dts,
            n,
        ))
    }

    /// Solves for the time-optimal trajectory and resamples it onto the configured
    /// fixed-rate time grid.
    ///
    /// ## Errors
    ///
    /// All errors of [TrajectoryGenerator::solve], plus
    /// [Error::DegenerateTrajectory] when the solved trajectory has no positive
    /// duration to lay a time grid over.
    pub fn generate(&self, waypoints: &[Waypoint]) -> Result<FixedRateTrajectory, Error> {
        let solved = self.solve(waypoints)?;
        resample(&solved, self.output_step)
    }
}
