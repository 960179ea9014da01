// Drive subsystem: per-tick delegation between teleop and autonomous
//
// Teleop sticks and autonomous PID output both end up as a StickVector that
// goes through one dispatch call. Topology, inverts and dead-band are fixed
// when the subsystem is built.

use std::sync::Arc;

use tracing::{debug, info};

use crate::messages::RobotMode;

use super::deadband::InputDevice;
use super::dispatch::{dispatch, DriveActuator};
use super::error::{DriveError, Result};
use super::pid::{BaseIndependent, PidHandoff, PidStatus, PidTranslator};
use super::safety::{zero_if_disabled, DiagnosticSink, TracingDiagnostics};
use super::teleop::{check_device_count, map_teleop};
use super::topology::Topology;
use super::vector::{InvertMask, StickVector};

/// Name used when a subsystem is not given one
pub const SUGGESTED_NAME: &str = "Drive Train";

/// Construction-time settings of a drive subsystem
#[derive(Debug, Clone, PartialEq)]
pub struct DriveSettings {
    pub name: String,
    pub deadband: f64,
    pub inverts: InvertMask,
    /// 1 for a gamepad, 2 for dual joysticks
    pub input_devices: usize,
}

impl Default for DriveSettings {
    fn default() -> Self {
        Self {
            name: SUGGESTED_NAME.to_string(),
            deadband: 0.0,
            inverts: InvertMask::NONE,
            input_devices: 1,
        }
    }
}

impl DriveSettings {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.deadband) {
            return Err(DriveError::InvalidConfiguration(format!(
                "Dead-band must be in [0, 1), got {}",
                self.deadband
            )));
        }
        check_device_count(self.input_devices)
    }
}

/// Autonomous half: the PID sample slot, the loop's status, and the translator
struct Autonomous {
    handoff: Arc<PidHandoff>,
    status: Arc<dyn PidStatus>,
    translator: PidTranslator,
}

pub struct DriveSubsystem<A: DriveActuator> {
    settings: DriveSettings,
    topology: Topology,
    actuator: A,
    autonomous: Option<Autonomous>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl<A: DriveActuator> DriveSubsystem<A> {
    /// Build a subsystem driving `actuator` as `topology`
    pub fn new(settings: DriveSettings, topology: Topology, actuator: A) -> Result<Self> {
        settings.validate()?;
        info!(
            "{}: {} drive, dead-band {}, {} input device(s)",
            settings.name, topology, settings.deadband, settings.input_devices
        );

        Ok(Self {
            settings,
            topology,
            actuator,
            autonomous: None,
            diagnostics: Arc::new(TracingDiagnostics),
        })
    }

    /// Attach a PID loop: outputs arrive through `handoff`, `status` says
    /// whether the loop runs, `base` gives the output its meaning
    pub fn with_pid(
        mut self,
        handoff: Arc<PidHandoff>,
        status: Arc<dyn PidStatus>,
        base: impl BaseIndependent + 'static,
    ) -> Self {
        self.autonomous = Some(Autonomous {
            handoff,
            status,
            translator: PidTranslator::new(self.topology, base),
        });
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn name(&self) -> &str {
        &self.settings.name
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn settings(&self) -> &DriveSettings {
        &self.settings
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn actuator_mut(&mut self) -> &mut A {
        &mut self.actuator
    }

    /// Stick vector from the operator's devices, dead-banded, not yet inverted
    pub fn drive_teleop<D: InputDevice>(&self, devices: &[D]) -> Result<StickVector> {
        if devices.len() != self.settings.input_devices {
            return Err(DriveError::InvalidConfiguration(format!(
                "{} expects {} input device(s), got {}",
                self.settings.name,
                self.settings.input_devices,
                devices.len()
            )));
        }
        map_teleop(devices, self.settings.deadband)
    }

    /// Cached autonomous output, refreshed on a new PID sample and zeroed if
    /// the PID loop has been disabled
    ///
    /// Without an attached PID loop this is always zero.
    pub fn drive_auto(&mut self) -> StickVector {
        let Some(auto) = self.autonomous.as_mut() else {
            return StickVector::ZERO;
        };

        auto.translator.tick(&auto.handoff);
        zero_if_disabled(
            &mut auto.translator,
            auto.status.is_enabled(),
            &self.settings.name,
            self.diagnostics.as_ref(),
        );
        auto.translator.cached()
    }

    /// Switch off the autonomous path: drop any pending PID output and zero
    /// the cached vector through the safety guard
    ///
    /// Returns true when a non-zero output was discarded.
    pub fn disable_pid(&mut self) -> bool {
        let Some(auto) = self.autonomous.as_mut() else {
            return false;
        };

        if auto.handoff.take().is_some() {
            debug!("{}: dropped pending PID output", self.settings.name);
        }
        zero_if_disabled(
            &mut auto.translator,
            false,
            &self.settings.name,
            self.diagnostics.as_ref(),
        )
    }

    /// Send `sticks` to the actuator, applying the inverts
    pub fn drive(&mut self, sticks: StickVector) -> Result<StickVector> {
        dispatch(sticks, self.settings.inverts, self.topology, &mut self.actuator)
    }

    /// Drive with zero output
    pub fn stop(&mut self) -> Result<()> {
        self.drive(StickVector::ZERO).map(|_| ())
    }

    /// One control tick: teleop reads `devices`, autonomous uses the PID
    /// output, disabled does nothing
    ///
    /// Returns the vector that was dispatched, after inversion.
    pub fn update<D: InputDevice>(
        &mut self,
        mode: RobotMode,
        devices: &[D],
    ) -> Result<Option<StickVector>> {
        let sticks = match mode {
            RobotMode::Teleop => self.drive_teleop(devices)?,
            RobotMode::Autonomous => self.drive_auto(),
            RobotMode::Disabled => return Ok(None),
        };

        debug!("{} {:?} sticks: {:?}", self.settings.name, mode, sticks);
        self.drive(sticks).map(Some)
    }
}
