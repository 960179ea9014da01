// Fixed-rate drive loop with input watchdog
// Each tick: drain inputs, run the drive subsystem for the current mode,
// publish what reached the wheels.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::config::{
    hid_topic, DriveConfig, HID_TIMEOUT, MAX_LOOP_HZ, TOPIC_DIAGNOSTICS, TOPIC_HEALTH, TOPIC_MEASUREMENT, TOPIC_MODE,
    TOPIC_RT_ACTUATION, TOPIC_RT_WHEELS, TOPIC_SETPOINT,
};
use crate::control::PidLoop;
use crate::drive::{BufferedDiagnostics, DriveError, DriveSubsystem, InputDevice, PidHandoff, Topology};
use crate::messages::{
    Diagnostic, DriveActuation, HidState, MeasurementSample, RobotMode, RuntimeHealth, SetpointCommand,
    WheelOutputs,
};
use crate::motor::{SimulatedMotors, WheelDrive};

/// Input device fed from the network
#[derive(Debug, Default)]
pub struct RemoteHid {
    axes: Vec<f64>,
    received_at: Option<Instant>,
}

impl RemoteHid {
    fn update(&mut self, state: HidState) {
        self.axes = state.axes;
        self.received_at = Some(Instant::now());
    }

    fn is_stale(&self, timeout: Duration) -> bool {
        self.received_at.is_none_or(|at| at.elapsed() > timeout)
    }

    /// Center every axis
    fn release(&mut self) {
        self.axes.clear();
    }
}

impl InputDevice for RemoteHid {
    fn read_axis(&self, axis: usize) -> f64 {
        self.axes.get(axis).copied().unwrap_or(0.0).clamp(-1.0, 1.0)
    }
}

/// Everything one tick produced
#[derive(Debug, Clone)]
pub struct TickReport {
    pub actuation: DriveActuation,
    pub wheels: WheelOutputs,
    pub health: RuntimeHealth,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct Runtime {
    subsystem: DriveSubsystem<WheelDrive>,
    motors: SimulatedMotors,
    hids: Vec<RemoteHid>,
    hid_timeout: Duration,
    mode: RobotMode,
    health: RuntimeHealth,
    pid: PidLoop,
    measurement: Arc<Mutex<f64>>,
    diagnostics: Arc<BufferedDiagnostics>,
}

impl Runtime {
    /// Build the drive subsystem on simulated motors and start its PID loop
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: &DriveConfig) -> Result<Self, DriveError> {
        config.validate()?;
        let topology = config.topology()?;

        let (wheels, motors) = match topology {
            Topology::Differential => {
                let (motors, mut left) = SimulatedMotors::new(2 * config.motors_per_side);
                let right = left.split_off(config.motors_per_side);
                (WheelDrive::differential(left, right)?, motors)
            }
            _ => {
                let (motors, controllers) = SimulatedMotors::new(topology.actuator_count());
                (WheelDrive::with_topology(topology, controllers)?, motors)
            }
        };

        let handoff = Arc::new(PidHandoff::new());
        let measurement = Arc::new(Mutex::new(0.0));
        let source = {
            let measurement = measurement.clone();
            move || *measurement.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
        };
        let pid = PidLoop::spawn(config.pid_controller(), source, handoff.clone(), config.pid_period());

        let diagnostics = Arc::new(BufferedDiagnostics::new());
        let subsystem = DriveSubsystem::new(config.settings(), topology, wheels)?
            .with_pid(handoff, pid.state(), config.target)
            .with_diagnostics(diagnostics.clone());

        Ok(Self {
            subsystem,
            motors,
            hids: (0..config.hid_devices).map(|_| RemoteHid::default()).collect(),
            hid_timeout: HID_TIMEOUT,
            mode: RobotMode::Disabled,
            health: RuntimeHealth::Disabled,
            pid,
            measurement,
            diagnostics,
        })
    }

    pub fn mode(&self) -> RobotMode {
        self.mode
    }

    pub fn health(&self) -> RuntimeHealth {
        self.health
    }

    pub fn subsystem(&self) -> &DriveSubsystem<WheelDrive> {
        &self.subsystem
    }

    pub fn pid(&self) -> &PidLoop {
        &self.pid
    }

    /// Process an input device snapshot
    pub fn on_hid(&mut self, index: usize, state: HidState) {
        match self.hids.get_mut(index) {
            Some(hid) => hid.update(state),
            None => warn!("Ignoring input for unconfigured device {}", index),
        }
    }

    pub fn on_measurement(&mut self, sample: MeasurementSample) {
        *self
            .measurement
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = sample.value;
    }

    pub fn on_setpoint(&mut self, cmd: SetpointCommand) {
        info!("Received setpoint: {}", cmd.setpoint);
        self.pid.set_setpoint(cmd.setpoint);
    }

    /// Switch robot mode; the PID loop runs only in autonomous
    pub fn on_mode(&mut self, mode: RobotMode) -> Result<(), DriveError> {
        if mode == self.mode {
            return Ok(());
        }
        info!("{} is now in {:?} mode", self.subsystem.name(), mode);

        if self.mode == RobotMode::Autonomous {
            self.pid.disable();
            self.subsystem.disable_pid();
        }
        match mode {
            RobotMode::Autonomous => {
                // Start from zero, not from a sample left over by the last run
                self.subsystem.disable_pid();
                self.pid.enable();
            }
            RobotMode::Teleop => {}
            RobotMode::Disabled => self.subsystem.actuator_mut().stop()?,
        }
        self.mode = mode;
        Ok(())
    }

    /// Center stale input devices and derive health
    fn check_watchdog(&mut self) {
        let mut stale = false;
        for (index, hid) in self.hids.iter_mut().enumerate() {
            if hid.is_stale(self.hid_timeout) {
                if !hid.axes.is_empty() {
                    warn!("Input device {} stale, centering its axes", index);
                }
                hid.release();
                stale = true;
            }
        }

        self.health = match self.mode {
            RobotMode::Disabled => RuntimeHealth::Disabled,
            RobotMode::Teleop if stale => RuntimeHealth::HidStale,
            _ => RuntimeHealth::Ok,
        };
    }

    /// Run one control tick
    pub fn step(&mut self) -> Result<TickReport, DriveError> {
        self.check_watchdog();

        if let Some(applied) = self.subsystem.update(self.mode, &self.hids)? {
            debug!("Applied {:?}", applied);
        }

        let wheels = self.subsystem.actuator();
        Ok(TickReport {
            actuation: wheels.last_actuation(),
            wheels: WheelOutputs {
                topology: wheels.topology(),
                speeds: self.motors.speeds(),
            },
            health: self.health,
            diagnostics: self.diagnostics.drain(),
        })
    }
}

/// Tick period for a loop running at `loop_hz`
pub fn tick_period(loop_hz: u64) -> Result<Duration, DriveError> {
    if !(1..=MAX_LOOP_HZ).contains(&loop_hz) {
        return Err(DriveError::InvalidConfiguration(format!(
            "Loop frequency must be 1..={} Hz, got {}",
            MAX_LOOP_HZ, loop_hz
        )));
    }
    Ok(Duration::from_nanos(1_000_000_000 / loop_hz))
}

/// Decode a JSON payload, logging failures
fn parse<T: DeserializeOwned>(payload: &[u8], what: &str) -> Option<T> {
    match serde_json::from_slice(payload) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Failed to parse {}: {}", what, e);
            None
        }
    }
}

pub async fn run(config: DriveConfig, loop_hz: u64) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let period = tick_period(loop_hz)?;

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let mut sub_hids = Vec::with_capacity(config.hid_devices);
    for index in 0..config.hid_devices {
        sub_hids.push(session.declare_subscriber(hid_topic(index)).await?);
    }
    let sub_mode = session.declare_subscriber(TOPIC_MODE).await?;
    let sub_setpoint = session.declare_subscriber(TOPIC_SETPOINT).await?;
    let sub_measurement = session.declare_subscriber(TOPIC_MEASUREMENT).await?;
    let pub_actuation = session.declare_publisher(TOPIC_RT_ACTUATION).await?;
    let pub_wheels = session.declare_publisher(TOPIC_RT_WHEELS).await?;
    let pub_health = session.declare_publisher(TOPIC_HEALTH).await?;
    let pub_diagnostics = session.declare_publisher(TOPIC_DIAGNOSTICS).await?;

    let mut runtime = Runtime::new(&config)?;
    let mut tick = interval(period);

    info!(
        "Runtime started: {}Hz loop, {}ms input watchdog, {} drive",
        loop_hz,
        HID_TIMEOUT.as_millis(),
        runtime.subsystem().topology()
    );
    info!("Publishing to: {}, {}, {}, {}", TOPIC_RT_ACTUATION, TOPIC_RT_WHEELS, TOPIC_HEALTH, TOPIC_DIAGNOSTICS);

    loop {
        tick.tick().await;

        // 1. Drain all pending inputs (non-blocking), keep latest
        for (index, subscriber) in sub_hids.iter().enumerate() {
            while let Ok(Some(sample)) = subscriber.try_recv() {
                if let Some(state) = parse::<HidState>(&sample.payload().to_bytes(), "input state") {
                    runtime.on_hid(index, state);
                }
            }
        }
        while let Ok(Some(sample)) = sub_mode.try_recv() {
            if let Some(mode) = parse::<RobotMode>(&sample.payload().to_bytes(), "mode") {
                runtime.on_mode(mode)?;
            }
        }
        while let Ok(Some(sample)) = sub_setpoint.try_recv() {
            if let Some(cmd) = parse::<SetpointCommand>(&sample.payload().to_bytes(), "setpoint") {
                runtime.on_setpoint(cmd);
            }
        }
        while let Ok(Some(sample)) = sub_measurement.try_recv() {
            if let Some(m) = parse::<MeasurementSample>(&sample.payload().to_bytes(), "measurement") {
                runtime.on_measurement(m);
            }
        }

        // 2. Drive for the current mode (includes watchdog and safety guard)
        let report = runtime.step()?;

        // 3. Publish actuation and wheel outputs
        pub_actuation.put(serde_json::to_string(&report.actuation)?).await?;
        pub_wheels.put(serde_json::to_string(&report.wheels)?).await?;

        // 4. Publish health and diagnostics
        pub_health.put(serde_json::to_string(&report.health)?).await?;
        for diagnostic in &report.diagnostics {
            pub_diagnostics.put(serde_json::to_string(diagnostic)?).await?;
        }
    }
}
