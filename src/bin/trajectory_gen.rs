//! Command line adapter around the trajectory generator: loads a waypoint
//! document, solves the selected path and writes the fixed-rate trajectory to a
//! JSON file.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use clap::Parser;

use swerve_trajopt::drivetrain::SwerveDrivetrain;
use swerve_trajopt::generator::TrajectoryGenerator;
use swerve_trajopt::trajectory_io::{write_trajectory_json, PathDocument};

/// A tool for generating time-optimal trajectories for swerve drive robots.
/// Accepts waypoints and robot characteristics and outputs a list of sample
/// points that a trajectory follower can use.
#[derive(Debug, Parser)]
#[command(name = "trajectory_gen", version, about)]
struct Args {
    /// A path to a file containing json path data.
    #[arg(short, long)]
    input: PathBuf,

    /// Which path to build a trajectory for.
    #[arg(short, long)]
    pathname: Option<String>,

    /// The file to write the generated trajectory to.
    #[arg(short, long, default_value = "out.json")]
    output: PathBuf,
}

fn run(args: &Args) -> Result<(), String> {
    let file = File::open(&args.input).map_err(|e| {
        format!(
            "Error loading input file \"{}\": {}",
            args.input.display(),
            e
        )
    })?;

    let document =
        PathDocument::from_reader(file).map_err(|e| format!("Error parsing json data: {}", e))?;

    let drivetrain = document
        .drivetrain(&SwerveDrivetrain::default_robot())
        .map_err(|e| format!("Error in robot configuration: {}", e))?;

    // Leaving the selector off the command line gets a printed message, not a
    // usage error.
    let pathname = args.pathname.as_deref().ok_or_else(|| {
        "Unable to find a path to build a trajectory on. Check the structure of the input json."
            .to_string()
    })?;

    let path = document.find_path(pathname).map_err(|e| format!("{}", e))?;

    let generator = TrajectoryGenerator::new(drivetrain);
    let trajectory = generator
        .generate(&path.to_waypoints())
        .map_err(|e| format!("Error generating trajectory, check waypoints. ({})", e))?;

    let output = File::create(&args.output).map_err(|e| {
        format!(
            "Error creating output file \"{}\": {}",
            args.output.display(),
            e
        )
    })?;
    write_trajectory_json(&trajectory, BufWriter::new(output)).map_err(|e| {
        format!(
            "Error writing trajectory to \"{}\": {}",
            args.output.display(),
            e
        )
    })?;

    println!(
        "Wrote {} samples to \"{}\".",
        trajectory.len(),
        args.output.display()
    );
    Ok(())
}

fn main() {
    let args = Args::parse();
    if let Err(message) = run(&args) {
        // Best-effort message, no exit-code contract beyond printing it.
        println!("{}", message);
    }
}
