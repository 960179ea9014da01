// Speed-controller-backed drive actuator
//
// Combines wheel mixing and per-wheel speed controllers to implement the
// tank / cartesian drive calls for every supported topology.

use tracing::{debug, info, warn};

use crate::drive::{select_topology, DriveActuator, DriveError, Topology};
use crate::messages::DriveActuation;

use super::kinematics::{killough_wheels, mecanum_wheels, tank_wheels};

/// Error types for speed controllers
#[derive(Debug, thiserror::Error)]
pub enum MotorError {
    #[error("Motor {channel} fault: {reason}")]
    Fault { channel: usize, reason: String },
}

/// One motor output taking a normalized speed in [-1, 1]
pub trait SpeedController: Send {
    fn set(&mut self, speed: f64) -> Result<(), MotorError>;
}

/// Several controllers driven as one (e.g. all motors on one side)
pub struct ControllerGroup {
    members: Vec<Box<dyn SpeedController>>,
}

impl ControllerGroup {
    pub fn new(members: Vec<Box<dyn SpeedController>>) -> Self {
        Self { members }
    }
}

impl SpeedController for ControllerGroup {
    fn set(&mut self, speed: f64) -> Result<(), MotorError> {
        for member in &mut self.members {
            member.set(speed)?;
        }
        Ok(())
    }
}

/// Drivetrain made of one speed controller per actuator binding
///
/// Binding order: differential [left, right]; killough [left, right, back];
/// mecanum [front_left, rear_left, front_right, rear_right].
pub struct WheelDrive {
    topology: Topology,
    controllers: Vec<Box<dyn SpeedController>>,
    speeds: Vec<f64>,
    last: DriveActuation,
}

impl WheelDrive {
    /// Infer the topology from how many controllers are bound
    pub fn from_controllers(controllers: Vec<Box<dyn SpeedController>>) -> Result<Self, DriveError> {
        let topology = select_topology(controllers.len())?;
        Ok(Self::build(topology, controllers))
    }

    /// Use an explicit topology; the controller count must match it
    pub fn with_topology(
        topology: Topology,
        controllers: Vec<Box<dyn SpeedController>>,
    ) -> Result<Self, DriveError> {
        if controllers.len() != topology.actuator_count() {
            return Err(DriveError::InvalidConfiguration(format!(
                "{} drive needs {} controllers, got {}",
                topology,
                topology.actuator_count(),
                controllers.len()
            )));
        }
        Ok(Self::build(topology, controllers))
    }

    /// Differential drive with any number of motors per side
    ///
    /// Each side's motors are grouped and always receive the same output.
    pub fn differential(
        left: Vec<Box<dyn SpeedController>>,
        right: Vec<Box<dyn SpeedController>>,
    ) -> Result<Self, DriveError> {
        if left.is_empty() || right.is_empty() {
            return Err(DriveError::InvalidConfiguration(format!(
                "Differential drive needs motors on both sides, got {} left and {} right",
                left.len(),
                right.len()
            )));
        }
        let sides: Vec<Box<dyn SpeedController>> = vec![
            Box::new(ControllerGroup::new(left)),
            Box::new(ControllerGroup::new(right)),
        ];
        Ok(Self::build(Topology::Differential, sides))
    }

    fn build(topology: Topology, controllers: Vec<Box<dyn SpeedController>>) -> Self {
        info!("Created {} drive with {} controllers", topology, controllers.len());
        Self {
            topology,
            speeds: vec![0.0; controllers.len()],
            controllers,
            last: DriveActuation::Stopped,
        }
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Last drive call that reached every wheel
    pub fn last_actuation(&self) -> DriveActuation {
        self.last
    }

    /// Last per-wheel outputs, in binding order
    pub fn wheel_speeds(&self) -> &[f64] {
        &self.speeds
    }

    /// Send one output per controller, in binding order
    ///
    /// Each wheel's speed is recorded as soon as its controller accepts it, so
    /// after a fault `wheel_speeds` still matches what the motors were given.
    fn set_wheels(&mut self, speeds: &[f64]) -> Result<(), MotorError> {
        debug!("Setting {} wheel outputs: {:?}", self.topology, speeds);
        for ((controller, recorded), &speed) in self.controllers.iter_mut().zip(&mut self.speeds).zip(speeds) {
            controller.set(speed)?;
            *recorded = speed;
        }
        Ok(())
    }

    /// Stop all wheels immediately
    pub fn stop(&mut self) -> Result<(), MotorError> {
        info!("Stopping all {} wheels", self.controllers.len());
        let zeros = vec![0.0; self.controllers.len()];
        self.set_wheels(&zeros)?;
        self.last = DriveActuation::Stopped;
        Ok(())
    }

    fn wrong_call(&self, call: &str) -> DriveError {
        DriveError::UnsupportedDrivetrain(format!("{} drive cannot take {} commands", self.topology, call))
    }
}

impl DriveActuator for WheelDrive {
    fn tank(&mut self, left: f64, right: f64) -> Result<(), DriveError> {
        if self.topology != Topology::Differential {
            return Err(self.wrong_call("tank"));
        }
        self.set_wheels(&tank_wheels(left, right))?;
        self.last = DriveActuation::Tank { left, right };
        Ok(())
    }

    fn cartesian(&mut self, x: f64, y: f64, rotation: f64) -> Result<(), DriveError> {
        match self.topology {
            Topology::Killough => self.set_wheels(&killough_wheels(x, y, rotation))?,
            Topology::Mecanum => self.set_wheels(&mecanum_wheels(x, y, rotation))?,
            Topology::Differential => return Err(self.wrong_call("cartesian")),
        }
        self.last = DriveActuation::Cartesian { x, y, rotation };
        Ok(())
    }
}

impl Drop for WheelDrive {
    fn drop(&mut self) {
        // Try to stop wheels when the drive is dropped
        if let Err(e) = self.stop() {
            warn!("Failed to stop wheels on drop: {}", e);
        }
    }
}
