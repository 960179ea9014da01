// Wheel mixing for the supported drivetrains
// Converts tank (left, right) or cartesian (x, y, rotation) commands into
// normalized per-wheel outputs in actuator binding order.

use std::f64::consts::PI;

/// Killough wheel drive directions (degrees, counter-clockwise from +x)
/// in binding order [left, right, back]
pub const KILLOUGH_ANGLES_DEG: [f64; 3] = [60.0, 120.0, 270.0];

/// Largest output any wheel may receive
const MAX_OUTPUT: f64 = 1.0;

/// Tank command to [left, right], each clamped to [-1, 1]
pub fn tank_wheels(left: f64, right: f64) -> [f64; 2] {
    [
        left.clamp(-MAX_OUTPUT, MAX_OUTPUT),
        right.clamp(-MAX_OUTPUT, MAX_OUTPUT),
    ]
}

/// Cartesian command to Killough outputs [left, right, back]
///
/// # Arguments
/// * `x` - Strafe (positive = right)
/// * `y` - Forward (positive = forward)
/// * `rotation` - Rotation rate (same sign on every wheel)
pub fn killough_wheels(x: f64, y: f64, rotation: f64) -> [f64; 3] {
    killough_wheels_with_angles(x, y, rotation, KILLOUGH_ANGLES_DEG)
}

/// Killough mixing with custom wheel directions
pub fn killough_wheels_with_angles(x: f64, y: f64, rotation: f64, angles_deg: [f64; 3]) -> [f64; 3] {
    let mut speeds = angles_deg.map(|angle_deg| {
        let angle_rad = angle_deg * (PI / 180.0);
        // Projection of (x, y) onto the wheel's drive direction
        angle_rad.cos() * x + angle_rad.sin() * y + rotation
    });
    desaturate(&mut speeds);
    speeds
}

/// Cartesian command to Mecanum outputs
/// [front_left, rear_left, front_right, rear_right]
pub fn mecanum_wheels(x: f64, y: f64, rotation: f64) -> [f64; 4] {
    let mut speeds = [
        y + x + rotation, // front left
        y - x + rotation, // rear left
        y - x - rotation, // front right
        y + x - rotation, // rear right
    ];
    desaturate(&mut speeds);
    speeds
}

/// Scale all speeds down together if any exceeds MAX_OUTPUT
fn desaturate(speeds: &mut [f64]) {
    let max = speeds.iter().map(|s| s.abs()).fold(0.0f64, f64::max);
    if max > MAX_OUTPUT {
        let scale = MAX_OUTPUT / max;
        for speed in speeds.iter_mut() {
            *speed *= scale;
        }
    }
}
