// Loop timing, topics, and the file-backed drive configuration
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::control::{PidController, PidTarget};
use crate::drive::{select_topology, DriveError, DriveSettings, InvertMask, Topology, SUGGESTED_NAME};

// Runtime loop frequency
pub const LOOP_HZ: u64 = 50;
pub const MAX_LOOP_HZ: u64 = 1000; // one tick per millisecond at most

// Input devices older than this read as centered
pub const HID_TIMEOUT: Duration = Duration::from_millis(250);

// Zenoh topics
pub const TOPIC_HID_PREFIX: &str = "drive/hid"; // one per device: drive/hid/<index>
pub const TOPIC_MODE: &str = "drive/cmd/mode"; // robot mode
pub const TOPIC_SETPOINT: &str = "drive/cmd/setpoint"; // PID setpoint
pub const TOPIC_MEASUREMENT: &str = "drive/sensor/measurement"; // PID process variable
pub const TOPIC_RT_ACTUATION: &str = "drive/rt/actuation"; // applied drive call
pub const TOPIC_RT_WHEELS: &str = "drive/rt/wheels"; // per-wheel outputs
pub const TOPIC_HEALTH: &str = "drive/state/health"; // health status
pub const TOPIC_DIAGNOSTICS: &str = "drive/state/diagnostics"; // subsystem diagnostics

/// Topic carrying input device `index`
pub fn hid_topic(index: usize) -> String {
    format!("{}/{}", TOPIC_HID_PREFIX, index)
}

/// Error types for loading a drive configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] DriveError),
}

/// PID loop gains and timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidConfig {
    pub p: f64,
    pub i: f64,
    pub d: f64,
    pub f: f64,
    pub period_ms: u64,
    pub setpoint: f64,
    pub min_output: f64,
    pub max_output: f64,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            p: 0.0,
            i: 0.0,
            d: 0.0,
            f: 0.0,
            period_ms: 50,
            setpoint: 0.0,
            min_output: -1.0,
            max_output: 1.0,
        }
    }
}

/// Drive subsystem configuration, loaded from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    pub name: String,
    pub deadband: f64,
    pub inverts: InvertMask,
    /// Number of actuator bindings (2, 3, or 4)
    pub wheels: usize,
    /// Explicit topology tag; inferred from `wheels` when absent
    pub topology: Option<String>,
    /// Motors ganged on each side of a differential drive
    pub motors_per_side: usize,
    /// 1 for a gamepad, 2 for dual joysticks
    pub hid_devices: usize,
    pub pid: PidConfig,
    pub target: PidTarget,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            name: SUGGESTED_NAME.to_string(),
            deadband: 0.1,
            inverts: InvertMask::NONE,
            wheels: 4,
            topology: None,
            motors_per_side: 1,
            hid_devices: 1,
            pid: PidConfig::default(),
            target: PidTarget::default(),
        }
    }
}

impl DriveConfig {
    /// Read and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: DriveConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DriveError> {
        self.settings().validate()?;
        let topology = self.topology()?;
        if self.motors_per_side == 0 {
            return Err(DriveError::InvalidConfiguration("motors_per_side must be at least 1".to_string()));
        }
        if self.motors_per_side > 1 && topology != Topology::Differential {
            return Err(DriveError::InvalidConfiguration(format!(
                "{} drive binds one motor per wheel, got motors_per_side = {}",
                topology, self.motors_per_side
            )));
        }
        if self.pid.period_ms == 0 {
            return Err(DriveError::InvalidConfiguration("PID period must be non-zero".to_string()));
        }
        if self.pid.min_output > self.pid.max_output {
            return Err(DriveError::InvalidConfiguration(format!(
                "PID output range [{}, {}] is empty",
                self.pid.min_output, self.pid.max_output
            )));
        }
        Ok(())
    }

    /// Topology from the explicit tag, checked against `wheels`, or inferred
    pub fn topology(&self) -> Result<Topology, DriveError> {
        let inferred = select_topology(self.wheels)?;
        match &self.topology {
            None => Ok(inferred),
            Some(tag) => {
                let explicit: Topology = tag.parse()?;
                if explicit != inferred {
                    return Err(DriveError::InvalidConfiguration(format!(
                        "{} drive needs {} wheels, configured {}",
                        explicit,
                        explicit.actuator_count(),
                        self.wheels
                    )));
                }
                Ok(explicit)
            }
        }
    }

    pub fn settings(&self) -> DriveSettings {
        DriveSettings {
            name: self.name.clone(),
            deadband: self.deadband,
            inverts: self.inverts,
            input_devices: self.hid_devices,
        }
    }

    pub fn pid_period(&self) -> Duration {
        Duration::from_millis(self.pid.period_ms)
    }

    /// A fresh controller with the configured gains, limits and setpoint
    pub fn pid_controller(&self) -> PidController {
        let mut controller = PidController::new(self.pid.p, self.pid.i, self.pid.d, self.pid.f)
            .with_output_limits(self.pid.min_output, self.pid.max_output);
        controller.set_setpoint(self.pid.setpoint);
        controller
    }
}
