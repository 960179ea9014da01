// Message types exchanged with the drive runtime

use serde::{Deserialize, Serialize};

use crate::drive::Topology;

/// Which period the robot is in; decides where drive commands come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotMode {
    #[default]
    Disabled,
    Teleop,
    Autonomous,
}

/// Snapshot of one input device's raw axes, as published by a driver station
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HidState {
    pub axes: Vec<f64>,
}

/// Latest process-variable reading for the PID loop
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MeasurementSample {
    pub value: f64,
}

/// New target for the PID loop
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SetpointCommand {
    pub setpoint: f64,
}

/// Physical drive call that was last applied
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DriveActuation {
    #[default]
    Stopped,
    Tank {
        left: f64,
        right: f64,
    },
    Cartesian {
        x: f64,
        y: f64,
        rotation: f64,
    },
}

/// Per-wheel outputs in actuator binding order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelOutputs {
    pub topology: Topology,
    pub speeds: Vec<f64>,
}

/// Diagnostic event raised by a subsystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub subsystem: String,
    pub message: String,
}

/// Health status published by runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    Disabled,
    HidStale,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actuation_wire_format() {
        let json = serde_json::to_string(&DriveActuation::Tank { left: 0.5, right: -0.5 }).unwrap();
        assert_eq!(json, r#"{"kind":"tank","left":0.5,"right":-0.5}"#);
        assert_eq!(
            serde_json::to_string(&DriveActuation::Stopped).unwrap(),
            r#"{"kind":"stopped"}"#
        );
    }

    #[test]
    fn test_mode_parsing() {
        let mode: RobotMode = serde_json::from_str(r#""autonomous""#).unwrap();
        assert_eq!(mode, RobotMode::Autonomous);
        assert!(serde_json::from_str::<RobotMode>(r#""test""#).is_err());
    }

    #[test]
    fn test_health_snake_case() {
        assert_eq!(serde_json::to_string(&RuntimeHealth::HidStale).unwrap(), r#""hid_stale""#);
    }
}
