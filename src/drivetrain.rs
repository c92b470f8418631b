//! Defines the swerve drivetrain: geometry, physical limits and the constraints the
//! drivetrain contributes to the trajectory problem.
//!
//! The robot coordinate system has its origin at the center of the robot with the
//! x-axis pointing towards the front face and the y-axis pointing 90 degrees
//! counter-clockwise. The four wheel modules sit at the corners of the wheelbase
//! rectangle, `wheelbase_x` apart along the x-axis and `wheelbase_y` apart along
//! the y-axis.

extern crate nalgebra as na;

use na::Vector2;
use serde::Deserialize;

use crate::solver::problem::{NlpProblem, Variable};
use crate::Error;

#[cfg(test)]
#[path = "drivetrain_tests.rs"]
mod drivetrain_tests;

/// Identifies one of the four wheel modules of the drivetrain.
///
/// Module identity is explicit so that module positions and module force variables
/// can never be paired up through a mismatched positional convention.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ModuleId {
    /// The module at the front-left corner (+x, +y) of the wheelbase.
    FrontLeft,
    /// The module at the front-right corner (+x, -y) of the wheelbase.
    FrontRight,
    /// The module at the rear-left corner (-x, +y) of the wheelbase.
    RearLeft,
    /// The module at the rear-right corner (-x, -y) of the wheelbase.
    RearRight,
}

impl ModuleId {
    /// All four modules, in a fixed order.
    pub const ALL: [ModuleId; 4] = [
        ModuleId::FrontLeft,
        ModuleId::FrontRight,
        ModuleId::RearLeft,
        ModuleId::RearRight,
    ];

    /// Returns the sign pair of the module corner on the (x, y) axes.
    fn corner_signs(&self) -> (f64, f64) {
        match self {
            ModuleId::FrontLeft => (1.0, 1.0),
            ModuleId::FrontRight => (1.0, -1.0),
            ModuleId::RearLeft => (-1.0, 1.0),
            ModuleId::RearRight => (-1.0, -1.0),
        }
    }
}

/// The decision variables for the ground force of a single module during a
/// single node interval.
#[derive(Clone, Copy, Debug)]
pub struct ModuleForceVariables {
    /// The x component of the module ground force in N.
    pub x: Variable,
    /// The y component of the module ground force in N.
    pub y: Variable,
}

/// Overrides for a subset of the drivetrain parameters, as they appear in the
/// `robot_configuration` object of an input document.
///
/// Every field is optional; a missing field keeps the default value. Unknown keys
/// in the document are ignored by the deserializer.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
pub struct DrivetrainOverrides {
    /// Overrides the horizontal distance between the front and rear modules.
    pub wheel_horizontal_distance: Option<f64>,
    /// Overrides the horizontal distance between the left and right modules.
    pub wheel_vertical_distance: Option<f64>,
    /// Overrides the bumper length.
    pub bumper_length: Option<f64>,
    /// Overrides the bumper width.
    pub bumper_width: Option<f64>,
    /// Overrides the robot mass.
    pub mass: Option<f64>,
    /// Overrides the robot moment of inertia.
    pub moment_of_inertia: Option<f64>,
    /// Overrides the maximum angular speed of the wheel drive motors.
    pub motor_max_angular_speed: Option<f64>,
    /// Overrides the maximum torque of the wheel drive motors.
    pub motor_max_torque: Option<f64>,
}

/// Defines a four module swerve drivetrain: chassis geometry, inertia and wheel
/// motor limits.
///
/// All parameters are validated to be strictly positive on construction, so a
/// stored drivetrain is always safe to build a trajectory problem from. The
/// maximum module force is derived from torque and wheel radius on demand and is
/// never stored, so the two can never get out of sync.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SwerveDrivetrain {
    /// When facing the side of the robot, the horizontal distance between modules in m.
    wheelbase_x: f64,
    /// When facing the front of the robot, the horizontal distance between modules in m.
    wheelbase_y: f64,
    /// When facing the side of the robot, the horizontal distance across the bumpers in m.
    bumper_length: f64,
    /// When facing the front of the robot, the horizontal distance across the bumpers in m.
    bumper_width: f64,
    /// The mass of the robot in kg.
    mass: f64,
    /// The moment of inertia of the robot about the vertical axis through the
    /// center of the robot coordinate system, in kg m^2.
    moment_of_inertia: f64,
    /// The maximum angular speed of the wheel drive motors in rad/s.
    max_wheel_angular_speed: f64,
    /// The maximum torque of the wheel drive motors in Nm.
    max_wheel_torque: f64,
    /// The wheel radius in m.
    wheel_radius: f64,
}

/// Validates that a drivetrain parameter is strictly positive and finite.
fn validate_parameter(name: &'static str, value: f64) -> Result<f64, Error> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(Error::InvalidDrivetrainParameter { name, value })
    }
}

impl SwerveDrivetrain {
    /// Creates a new drivetrain from the given characteristics.
    ///
    /// ## Parameters
    ///
    /// * 'wheelbase_x' - When facing the side of the robot, the horizontal distance
    ///   between modules in m.
    /// * 'wheelbase_y' - When facing the front of the robot, the horizontal distance
    ///   between modules in m.
    /// * 'bumper_length' - When facing the side of the robot, the horizontal distance
    ///   across the bumpers in m.
    /// * 'bumper_width' - When facing the front of the robot, the horizontal distance
    ///   across the bumpers in m.
    /// * 'mass' - The mass of the robot in kg.
    /// * 'moment_of_inertia' - The moment of inertia of the robot about its vertical
    ///   axis in kg m^2.
    /// * 'max_wheel_angular_speed' - The maximum angular speed of the wheel drive
    ///   motors in rad/s.
    /// * 'max_wheel_torque' - The maximum torque of the wheel drive motors in Nm.
    /// * 'wheel_radius' - The wheel radius in m.
    ///
    /// ## Errors
    ///
    /// * [Error::InvalidDrivetrainParameter] - Returned when any parameter is not a
    ///   strictly positive, finite number.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        wheelbase_x: f64,
        wheelbase_y: f64,
        bumper_length: f64,
        bumper_width: f64,
        mass: f64,
        moment_of_inertia: f64,
        max_wheel_angular_speed: f64,
        max_wheel_torque: f64,
        wheel_radius: f64,
    ) -> Result<Self, Error> {
        Ok(Self {
            wheelbase_x: validate_parameter("wheelbase_x", wheelbase_x)?,
            wheelbase_y: validate_parameter("wheelbase_y", wheelbase_y)?,
            bumper_length: validate_parameter("bumper_length", bumper_length)?,
            bumper_width: validate_parameter("bumper_width", bumper_width)?,
            mass: validate_parameter("mass", mass)?,
            moment_of_inertia: validate_parameter("moment_of_inertia", moment_of_inertia)?,
            max_wheel_angular_speed: validate_parameter(
                "max_wheel_angular_speed",
                max_wheel_angular_speed,
            )?,
            max_wheel_torque: validate_parameter("max_wheel_torque", max_wheel_torque)?,
            wheel_radius: validate_parameter("wheel_radius", wheel_radius)?,
        })
    }

    /// Returns the stock robot used by the original trajectory tool: a 46.7 kg
    /// competition robot with a 0.622 m by 0.572 m wheelbase.
    pub fn default_robot() -> Self {
        Self {
            wheelbase_x: 0.622,
            wheelbase_y: 0.572,
            bumper_length: 0.954,
            bumper_width: 0.903,
            mass: 46.7,
            moment_of_inertia: 5.6,
            max_wheel_angular_speed: 70.0,
            max_wheel_torque: 1.9,
            wheel_radius: 0.051,
        }
    }

    /// Returns a new drivetrain with the given overrides applied on top of the
    /// current values.
    ///
    /// The merge is pure: the current drivetrain is not modified and the merged
    /// parameter set is re-validated as a whole.
    ///
    /// ## Errors
    ///
    /// * [Error::InvalidDrivetrainParameter] - Returned when an override is not a
    ///   strictly positive, finite number.
    pub fn with_overrides(&self, overrides: &DrivetrainOverrides) -> Result<Self, Error> {
        Self::new(
            overrides.wheel_horizontal_distance.unwrap_or(self.wheelbase_x),
            overrides.wheel_vertical_distance.unwrap_or(self.wheelbase_y),
            overrides.bumper_length.unwrap_or(self.bumper_length),
            overrides.bumper_width.unwrap_or(self.bumper_width),
            overrides.mass.unwrap_or(self.mass),
            overrides.moment_of_inertia.unwrap_or(self.moment_of_inertia),
            overrides
                .motor_max_angular_speed
                .unwrap_or(self.max_wheel_angular_speed),
            overrides.motor_max_torque.unwrap_or(self.max_wheel_torque),
            self.wheel_radius,
        )
    }

    /// Returns the horizontal distance between the front and rear modules in m.
    pub fn wheelbase_x(&self) -> f64 {
        self.wheelbase_x
    }

    /// Returns the horizontal distance between the left and right modules in m.
    pub fn wheelbase_y(&self) -> f64 {
        self.wheelbase_y
    }

    /// Returns the bumper length in m.
    pub fn bumper_length(&self) -> f64 {
        self.bumper_length
    }

    /// Returns the bumper width in m.
    pub fn bumper_width(&self) -> f64 {
        self.bumper_width
    }

    /// Returns the mass of the robot in kg.
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Returns the moment of inertia of the robot in kg m^2.
    pub fn moment_of_inertia(&self) -> f64 {
        self.moment_of_inertia
    }

    /// Returns the maximum angular speed of the wheel drive motors in rad/s.
    pub fn max_wheel_angular_speed(&self) -> f64 {
        self.max_wheel_angular_speed
    }

    /// Returns the maximum torque of the wheel drive motors in Nm.
    pub fn max_wheel_torque(&self) -> f64 {
        self.max_wheel_torque
    }

    /// Returns the wheel radius in m.
    pub fn wheel_radius(&self) -> f64 {
        self.wheel_radius
    }

    /// Returns the maximum ground speed of a module in m/s, derived from the motor
    /// angular speed limit and the wheel radius.
    pub fn max_module_speed(&self) -> f64 {
        self.max_wheel_angular_speed * self.wheel_radius
    }

    /// Returns the maximum ground force of a module in N, derived from the motor
    /// torque limit and the wheel radius.
    pub fn max_module_force(&self) -> f64 {
        self.max_wheel_torque / self.wheel_radius
    }

    /// Returns the angle between the robot x-axis and the vector from the robot
    /// center to the given module, in rad.
    fn module_angle(&self, module: ModuleId) -> f64 {
        let (sign_x, sign_y) = module.corner_signs();
        f64::atan2(sign_y * self.wheelbase_y, sign_x * self.wheelbase_x)
    }

    /// Returns the position of the given module relative to the robot coordinate
    /// system when the robot heading is 'theta'.
    ///
    /// ## Parameters
    ///
    /// * 'module' - The module to locate.
    /// * 'theta' - The instantaneous heading of the robot in rad.
    pub fn module_position(&self, module: ModuleId, theta: f64) -> Vector2<f64> {
        let distance = f64::hypot(self.wheelbase_x, self.wheelbase_y);
        let angle = self.module_angle(module) + theta;
        Vector2::new(distance * angle.cos(), distance * angle.sin())
    }

    /// Returns the four corners of the bumper rectangle for the robot at the given
    /// pose, in world coordinates.
    ///
    /// ## Parameters
    ///
    /// * 'x' - The x position of the robot center in m.
    /// * 'y' - The y position of the robot center in m.
    /// * 'theta' - The heading of the robot in rad.
    pub fn bumper_corners(&self, x: f64, y: f64, theta: f64) -> [Vector2<f64>; 4] {
        let sin = theta.sin();
        let cos = theta.cos();
        let half_width = self.bumper_width / 2.0;
        let half_length = self.bumper_length / 2.0;
        [
            Vector2::new(
                x + half_width * cos - half_length * sin,
                y + half_length * cos + half_width * sin,
            ),
            Vector2::new(
                x - half_width * cos - half_length * sin,
                y + half_length * cos - half_width * sin,
            ),
            Vector2::new(
                x + half_width * cos + half_length * sin,
                y - half_length * cos + half_width * sin,
            ),
            Vector2::new(
                x - half_width * cos + half_length * sin,
                y - half_length * cos - half_width * sin,
            ),
        ]
    }

    /// Adds the drivetrain constraints for every node interval to the given
    /// problem: the module velocity limits, the module force limits (introducing
    /// four force component pairs per node as fresh decision variables) and the
    /// rigid-body force/torque balance between the module forces and the commanded
    /// accelerations.
    ///
    /// All variable slices are indexed by node; 'theta', 'vx', 'vy' and 'omega'
    /// must hold one more entry than the control slices 'ax', 'ay' and 'alpha'.
    ///
    /// Returns the force variables introduced for every node interval, in
    /// [ModuleId::ALL] order, so that the solved module forces can be read back
    /// from the solution.
    ///
    /// ## Parameters
    ///
    /// * 'problem' - The trajectory problem under construction.
    /// * 'theta' - The heading variable at every node.
    /// * 'vx' - The x velocity variable at every node.
    /// * 'vy' - The y velocity variable at every node.
    /// * 'omega' - The angular velocity variable at every node.
    /// * 'ax' - The x acceleration variable for every node interval.
    /// * 'ay' - The y acceleration variable for every node interval.
    /// * 'alpha' - The angular acceleration variable for every node interval.
    #[allow(clippy::too_many_arguments)]
    pub fn add_kinematics_constraints(
        &self,
        problem: &mut NlpProblem,
        theta: &[Variable],
        vx: &[Variable],
        vy: &[Variable],
        omega: &[Variable],
        ax: &[Variable],
        ay: &[Variable],
        alpha: &[Variable],
    ) -> Vec<[ModuleForceVariables; 4]> {
        let drivetrain = *self;
        let max_speed_squared = self.max_module_speed() * self.max_module_speed();
        let max_force_squared = self.max_module_force() * self.max_module_force();
        let mut force_variables = Vec::with_capacity(ax.len());

        for k in 0..ax.len() {
            let theta_k = theta[k];
            let vx_k = vx[k];
            let vy_k = vy[k];
            let omega_k = omega[k];

            // Module ground speed must stay within what the drive motor can turn
            // the wheel at, in squared form to avoid the square root.
            for module in ModuleId::ALL {
                problem.constrain_inequality(move |x| {
                    let position = drivetrain.module_position(module, x[theta_k.index()]);
                    let module_vx = x[vx_k.index()] + position.y * x[omega_k.index()];
                    let module_vy = x[vy_k.index()] - position.x * x[omega_k.index()];
                    module_vx * module_vx + module_vy * module_vy - max_speed_squared
                });
            }

            // One force component pair per module, limited by the motor torque.
            let forces: [ModuleForceVariables; 4] = std::array::from_fn(|_| ModuleForceVariables {
                x: problem.add_variable(),
                y: problem.add_variable(),
            });
            for force in forces {
                problem.constrain_inequality(move |x| {
                    x[force.x.index()] * x[force.x.index()]
                        + x[force.y.index()] * x[force.y.index()]
                        - max_force_squared
                });
            }

            // Force balance along both axes and torque balance about the center.
            let ax_k = ax[k];
            problem.constrain_equality(move |x| {
                drivetrain.mass * x[ax_k.index()]
                    - forces.iter().map(|f| x[f.x.index()]).sum::<f64>()
            });

            let ay_k = ay[k];
            problem.constrain_equality(move |x| {
                drivetrain.mass * x[ay_k.index()]
                    - forces.iter().map(|f| x[f.y.index()]).sum::<f64>()
            });

            let alpha_k = alpha[k];
            problem.constrain_equality(move |x| {
                let torque: f64 = ModuleId::ALL
                    .iter()
                    .zip(forces.iter())
                    .map(|(module, force)| {
                        let position = drivetrain.module_position(*module, x[theta_k.index()]);
                        position.y * x[force.x.index()] - position.x * x[force.y.index()]
                    })
                    .sum();
                drivetrain.moment_of_inertia * x[alpha_k.index()] - torque
            });

            force_variables.push(forces);
        }

        force_variables
    }
}
