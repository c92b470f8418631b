//! Builds the seed trajectory used to warm-start the solver.
//!
//! The seed is a piecewise-linear interpolation between the waypoints with no
//! attempt at dynamic feasibility; its only job is to start the solver in the
//! right region of the search space. It is a pure function of the waypoints and
//! the sample count, so repeated runs seed the solver identically.

use crate::generator::Waypoint;

#[cfg(test)]
#[path = "initial_guess_tests.rs"]
mod initial_guess_tests;

/// The piecewise-linear seed trajectory: position and heading at every
/// discretization node.
#[derive(Clone, Debug, PartialEq)]
pub struct InitialTrajectory {
    /// The x position at every node.
    pub x: Vec<f64>,
    /// The y position at every node.
    pub y: Vec<f64>,
    /// The heading at every node.
    pub theta: Vec<f64>,
}

/// Linearly interpolates 'count' evenly spaced values from 'start' towards 'end',
/// excluding 'end' itself, and appends them to 'values'.
fn interpolate_segment(values: &mut Vec<f64>, start: f64, end: f64, count: usize) {
    for i in 0..count {
        values.push(start + (end - start) * (i as f64) / (count as f64));
    }
}

/// Generates the piecewise-linear seed trajectory through the given waypoints.
///
/// Each segment contributes 'samples_per_segment' nodes, evenly spaced and
/// excluding the segment's end waypoint so that segment boundaries are not
/// duplicated; the final waypoint is appended once. The result therefore holds
/// `samples_per_segment * (waypoints.len() - 1) + 1` nodes, and the pose at every
/// node `j * samples_per_segment` equals waypoint `j` exactly.
///
/// ## Parameters
///
/// * 'waypoints' - The waypoint sequence, at least two entries.
/// * 'samples_per_segment' - The number of nodes per trajectory segment.
pub fn generate_initial_trajectory(
    waypoints: &[Waypoint],
    samples_per_segment: usize,
) -> InitialTrajectory {
    let node_count = samples_per_segment * waypoints.len().saturating_sub(1) + 1;
    let mut result = InitialTrajectory {
        x: Vec::with_capacity(node_count),
        y: Vec::with_capacity(node_count),
        theta: Vec::with_capacity(node_count),
    };

    for pair in waypoints.windows(2) {
        interpolate_segment(&mut result.x, pair[0].x, pair[1].x, samples_per_segment);
        interpolate_segment(&mut result.y, pair[0].y, pair[1].y, samples_per_segment);
        interpolate_segment(
            &mut result.theta,
            pair[0].theta,
            pair[1].theta,
            samples_per_segment,
        );
    }

    if let Some(last) = waypoints.last() {
        result.x.push(last.x);
        result.y.push(last.y);
        result.theta.push(last.theta);
    }

    result
}
