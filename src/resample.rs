//! Resamples a solved, variable-timestep trajectory onto a fixed time grid.
//!
//! The solver places nodes at whatever spacing the optimized segment durations
//! dictate, but a motion controller consumes samples at a fixed rate. The
//! resampler reconstructs the absolute timestamp of every node, walks a uniform
//! grid over the total duration and linearly interpolates between the two nodes
//! bracketing each grid time. All values are rounded to four decimal digits for
//! output stability, and the final sample is the exact last solved node so the
//! trajectory terminates precisely on the last waypoint.

use crate::generator::SolvedTrajectory;
use crate::Error;

#[cfg(test)]
#[path = "resample_tests.rs"]
mod resample_tests;

/// A single sample of a fixed-rate trajectory.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TrajectorySample {
    /// The timestamp in seconds since the start of the trajectory.
    pub ts: f64,
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

/// A trajectory sampled on a uniform time grid, the final deliverable of the
/// generation pipeline. Immutable once created.
#[derive(Clone, Debug, PartialEq)]
pub struct FixedRateTrajectory {
    samples: Vec<TrajectorySample>,
    step: f64,
}

impl FixedRateTrajectory {
    /// Returns the samples of the trajectory in time order.
    pub fn samples(&self) -> &[TrajectorySample] {
        &self.samples
    }

    /// Returns the grid spacing in seconds.
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns a value indicating whether the trajectory holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Rounds a value to four decimal digits.
fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Linearly interpolates between two values.
fn lerp(start: f64, end: f64, percent: f64) -> f64 {
    start + (end - start) * percent
}

/// Resamples a solved trajectory onto a uniform time grid.
///
/// Grid samples are taken at `t = k * step` for every grid time strictly inside
/// the trajectory duration; the exact final node is appended as the last sample.
///
/// ## Parameters
///
/// * 'solved' - The solved trajectory to resample.
/// * 'step' - The grid spacing in seconds.
///
/// ## Errors
///
/// * [Error::DegenerateTrajectory] - Returned when the solved trajectory has a
///   non-positive total duration, leaving the time grid undefined.
pub fn resample(solved: &SolvedTrajectory, step: f64) -> Result<FixedRateTrajectory, Error> {
    let timestamps = solved.timestamps();
    let states = solved.states();
    let total_duration = solved.total_duration();
    if !(total_duration > 0.0) || !(step > 0.0) {
        return Err(Error::DegenerateTrajectory {
            duration: total_duration,
        });
    }

    let grid_count = (total_duration / step) as usize;
    let mut samples = Vec::with_capacity(grid_count + 1);

    let mut index = 0;
    for k in 0..grid_count {
        let t = k as f64 * step;

        // Advance to the node interval bracketing t.
        while index + 2 < timestamps.len() && timestamps[index + 1] < t {
            index += 1;
        }

        let bracket = timestamps[index + 1] - timestamps[index];
        let percent = if bracket > 0.0 {
            (t - timestamps[index]) / bracket
        } else {
            // Zero-width interval, both nodes coincide.
            0.0
        };

        let from = &states[index];
        let to = &states[index + 1];
        samples.push(TrajectorySample {
            ts: round4(t),
            x: round4(lerp(from.x, to.x, percent)),
            y: round4(lerp(from.y, to.y, percent)),
            theta: round4(lerp(from.theta, to.theta, percent)),
            vx: round4(lerp(from.vx, to.vx, percent)),
            vy: round4(lerp(from.vy, to.vy, percent)),
            omega: round4(lerp(from.omega, to.omega, percent)),
        });
    }

    // The last sample is the exact final node, never an interpolation, so the
    // trajectory ends precisely on the last waypoint pose.
    if let (Some(last_state), Some(last_ts)) = (states.last(), timestamps.last()) {
        samples.push(TrajectorySample {
            ts: round4(*last_ts),
            x: round4(last_state.x),
            y: round4(last_state.y),
            theta: round4(last_state.theta),
            vx: round4(last_state.vx),
            vy: round4(last_state.vy),
            omega: round4(last_state.omega),
        });
    }

    Ok(FixedRateTrajectory { samples, step })
}
