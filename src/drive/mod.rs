// Drivetrain abstraction
//
// Provides:
// - Dead-band normalized axis reads
// - Teleop mapping from one gamepad or two joysticks
// - PID output -> drive vector translation with a stale-output safety guard
// - Topology selection and dispatch to tank / cartesian drive calls

pub mod deadband;
pub mod dispatch;
mod error;
pub mod pid;
pub mod safety;
mod subsystem;
pub mod teleop;
pub mod topology;
mod vector;

pub use deadband::{axis_with_deadband, normalize, InputDevice};
pub use dispatch::{dispatch, DriveActuator};
pub use error::{DriveError, Result};
pub use pid::{BaseIndependent, PidHandoff, PidOutputSink, PidStatus, PidTranslator};
pub use safety::{BufferedDiagnostics, DiagnosticSink, TracingDiagnostics};
pub use subsystem::{DriveSettings, DriveSubsystem, SUGGESTED_NAME};
pub use teleop::map_teleop;
pub use topology::{select_topology, Topology};
pub use vector::{InvertMask, StickVector};
