// Human input -> stick vector

use super::deadband::{axis_with_deadband, InputDevice};
use super::error::{DriveError, Result};
use super::vector::StickVector;

/// Axis indices on a single gamepad
pub mod gamepad {
    pub const AXIS_LEFT_X: usize = 0;
    pub const AXIS_LEFT_Y: usize = 1;
    pub const AXIS_RIGHT_X: usize = 4;
    pub const AXIS_RIGHT_Y: usize = 5;
}

/// Axis indices on a flight-style joystick
pub mod joystick {
    pub const AXIS_X: usize = 0;
    pub const AXIS_Y: usize = 1;
}

/// Check that a device count maps to a teleop layout
pub fn check_device_count(count: usize) -> Result<()> {
    match count {
        1 | 2 => Ok(()),
        n => Err(device_count_error(n)),
    }
}

fn device_count_error(count: usize) -> DriveError {
    DriveError::InvalidConfiguration(format!(
        "Must be either 1 (gamepad drive) or 2 (dual-joystick drive) input devices, got {}",
        count
    ))
}

/// Build the stick vector from one gamepad or two joysticks
///
/// Every axis goes through the dead-band. Inversion is not applied here; the
/// dispatcher owns the single inversion point.
pub fn map_teleop<D: InputDevice>(devices: &[D], deadband: f64) -> Result<StickVector> {
    let read = |device: &D, axis| axis_with_deadband(device, axis, deadband);

    let sticks = match devices {
        [pad] => StickVector::new(
            read(pad, gamepad::AXIS_LEFT_X),
            read(pad, gamepad::AXIS_LEFT_Y),
            read(pad, gamepad::AXIS_RIGHT_X),
            read(pad, gamepad::AXIS_RIGHT_Y),
        ),
        [left, right] => StickVector::new(
            read(left, joystick::AXIS_X),
            read(left, joystick::AXIS_Y),
            read(right, joystick::AXIS_X),
            read(right, joystick::AXIS_Y),
        ),
        other => return Err(device_count_error(other.len())),
    };

    Ok(sticks)
}
