use crate::motor::MotorError;

/// Error types for the drive subsystem
#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    /// Wiring or setup mistake detected while building the subsystem
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A topology tag that names none of the supported drivetrains
    #[error("Unsupported drivetrain: {0}")]
    UnsupportedDrivetrain(String),

    #[error("Motor error: {0}")]
    Motor(#[from] MotorError),
}

pub type Result<T> = std::result::Result<T, DriveError>;
