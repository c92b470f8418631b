//! Loads waypoint documents and exports solved trajectories.
//!
//! The input document is a JSON object holding an array of named paths and an
//! optional `robot_configuration` object that overrides a subset of the drivetrain
//! parameters. The document schema is declarative (serde derive); unrecognized
//! configuration keys are ignored and missing keys keep the drivetrain defaults.
//!
//! The export format is a JSON array of `{ts, x, y, theta, vx, vy, omega}` records
//! with every value rendered as a decimal string rounded to four digits, the format
//! the downstream trajectory follower consumes.

use std::io;

use serde::{Deserialize, Serialize};

use crate::drivetrain::{DrivetrainOverrides, SwerveDrivetrain};
use crate::generator::Waypoint;
use crate::resample::FixedRateTrajectory;
use crate::Error;

#[cfg(test)]
#[path = "trajectory_io_tests.rs"]
mod trajectory_io_tests;

/// A named path inside an input document.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PathEntry {
    /// The name the path is selected by.
    pub name: String,
    /// The ordered waypoint poses as `[x, y, theta]` triples.
    pub waypoints: Vec<[f64; 3]>,
}

impl PathEntry {
    /// Returns the waypoints of this path as [Waypoint] values.
    pub fn to_waypoints(&self) -> Vec<Waypoint> {
        self.waypoints.iter().map(|w| Waypoint::from(*w)).collect()
    }
}

/// An input document: a set of named paths plus optional drivetrain overrides.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct PathDocument {
    /// The named paths in the document.
    #[serde(default)]
    pub paths: Vec<PathEntry>,

    /// Optional overrides for the drivetrain configuration.
    #[serde(default)]
    pub robot_configuration: Option<DrivetrainOverrides>,
}

impl PathDocument {
    /// Parses a document from JSON text.
    ///
    /// ## Errors
    ///
    /// * [Error::InvalidDocument] - Returned when the text is not valid JSON or
    ///   does not match the expected document shape.
    pub fn parse(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text).map_err(|e| Error::InvalidDocument {
            reason: e.to_string(),
        })
    }

    /// Reads and parses a document from the given reader.
    ///
    /// ## Errors
    ///
    /// * [Error::InvalidDocument] - Returned when the content is not valid JSON or
    ///   does not match the expected document shape.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, Error> {
        serde_json::from_reader(reader).map_err(|e| Error::InvalidDocument {
            reason: e.to_string(),
        })
    }

    /// Returns the path with the given name.
    ///
    /// ## Errors
    ///
    /// * [Error::PathNotFound] - Returned when no path in the document carries the
    ///   given name.
    pub fn find_path(&self, name: &str) -> Result<&PathEntry, Error> {
        self.paths
            .iter()
            .find(|path| path.name == name)
            .ok_or_else(|| Error::PathNotFound {
                name: name.to_string(),
            })
    }

    /// Returns the drivetrain to plan with: the given defaults with this
    /// document's overrides, if any, merged on top.
    ///
    /// ## Errors
    ///
    /// * [Error::InvalidDrivetrainParameter] - Returned when an override is not a
    ///   strictly positive, finite number.
    pub fn drivetrain(&self, defaults: &SwerveDrivetrain) -> Result<SwerveDrivetrain, Error> {
        match &self.robot_configuration {
            Some(overrides) => defaults.with_overrides(overrides),
            None => Ok(*defaults),
        }
    }
}

/// A single exported trajectory record with all values as decimal strings.
#[derive(Debug, Serialize)]
struct TrajectoryRecord {
    ts: String,
    x: String,
    y: String,
    theta: String,
    vx: String,
    vy: String,
    omega: String,
}

/// Renders a value that was already rounded to four digits as a decimal string.
fn decimal_string(value: f64) -> String {
    format!("{}", value)
}

/// Writes a fixed-rate trajectory to the given writer as a JSON array of records
/// with decimal-string values.
///
/// ## Parameters
///
/// * 'trajectory' - The trajectory to export.
/// * 'writer' - The destination for the JSON text.
pub fn write_trajectory_json<W: io::Write>(
    trajectory: &FixedRateTrajectory,
    writer: W,
) -> io::Result<()> {
    let records: Vec<TrajectoryRecord> = trajectory
        .samples()
        .iter()
        .map(|sample| TrajectoryRecord {
            ts: decimal_string(sample.ts),
            x: decimal_string(sample.x),
            y: decimal_string(sample.y),
            theta: decimal_string(sample.theta),
            vx: decimal_string(sample.vx),
            vy: decimal_string(sample.vy),
            omega: decimal_string(sample.omega),
        })
        .collect();

    serde_json::to_writer_pretty(writer, &records).map_err(io::Error::from)
}
