// Motor outputs for the drivetrain
//
// Provides:
// - Wheel mixing (tank / cartesian -> per-wheel outputs)
// - Speed-controller-backed drive actuator
// - Simulated controllers for running without hardware

mod driver;
pub mod kinematics;
mod sim;

pub use driver::{ControllerGroup, MotorError, SpeedController, WheelDrive};
pub use sim::SimulatedMotors;
