use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use drive_subsystem::control::PidTarget;
use drive_subsystem::drive::{
    BufferedDiagnostics, DriveActuator, DriveError, DriveSettings, DriveSubsystem, InputDevice, InvertMask,
    PidHandoff, PidOutputSink, PidStatus, StickVector, Topology,
};
use drive_subsystem::messages::{DriveActuation, RobotMode};
use drive_subsystem::motor::{SimulatedMotors, WheelDrive};

const EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Call {
    Tank(f64, f64),
    Cartesian(f64, f64, f64),
}

#[derive(Default)]
struct Recorder(Vec<Call>);

impl DriveActuator for Recorder {
    fn tank(&mut self, left: f64, right: f64) -> Result<(), DriveError> {
        self.0.push(Call::Tank(left, right));
        Ok(())
    }

    fn cartesian(&mut self, x: f64, y: f64, rotation: f64) -> Result<(), DriveError> {
        self.0.push(Call::Cartesian(x, y, rotation));
        Ok(())
    }
}

struct Switch(AtomicBool);

impl PidStatus for Switch {
    fn is_enabled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

struct Stick(Vec<f64>);

impl InputDevice for Stick {
    fn read_axis(&self, axis: usize) -> f64 {
        self.0.get(axis).copied().unwrap_or(0.0)
    }
}

#[test]
fn test_dual_joystick_inverted_tank() {
    let settings = DriveSettings {
        deadband: 0.2,
        inverts: InvertMask::new(false, true, false, true),
        input_devices: 2,
        ..DriveSettings::default()
    };
    let mut drive = DriveSubsystem::new(settings, Topology::Differential, Recorder::default()).unwrap();

    // Joystick Y pushed fully forward reads -1
    let left = Stick(vec![0.0, -1.0]);
    let right = Stick(vec![0.0, -0.6]);
    drive.update(RobotMode::Teleop, &[left, right]).unwrap();

    let [Call::Tank(l, r)] = drive.actuator().0.as_slice() else {
        panic!("expected one tank call, got {:?}", drive.actuator().0);
    };
    assert!((l - 1.0).abs() < EPS);
    assert!((r - 0.5).abs() < EPS);
}

#[test]
fn test_autonomous_heading_hold_on_mecanum() {
    let handoff = Arc::new(PidHandoff::new());
    let status = Arc::new(Switch(AtomicBool::new(true)));
    let diagnostics = Arc::new(BufferedDiagnostics::new());
    let settings = DriveSettings {
        name: "Chassis".to_string(),
        ..DriveSettings::default()
    };

    let mut drive = DriveSubsystem::new(settings, Topology::Mecanum, Recorder::default())
        .unwrap()
        .with_pid(handoff.clone(), status.clone(), PidTarget::Heading { cruise_speed: 0.6 })
        .with_diagnostics(diagnostics.clone());
    let no_devices: [Stick; 0] = [];

    handoff.use_output(0.2);
    let applied = drive.update(RobotMode::Autonomous, &no_devices).unwrap();
    assert_eq!(applied, Some(StickVector::new(0.0, 0.6, 0.2, 0.0)));

    // No new PID output: the same vector is driven again
    drive.update(RobotMode::Autonomous, &no_devices).unwrap();

    // Loop switched off: the next tick drives zero and reports it once
    status.0.store(false, Ordering::SeqCst);
    drive.update(RobotMode::Autonomous, &no_devices).unwrap();
    drive.update(RobotMode::Autonomous, &no_devices).unwrap();

    assert_eq!(
        drive.actuator().0,
        vec![
            Call::Cartesian(0.0, 0.6, 0.2),
            Call::Cartesian(0.0, 0.6, 0.2),
            Call::Cartesian(0.0, 0.0, 0.0),
            Call::Cartesian(0.0, 0.0, 0.0),
        ]
    );
    let events = diagnostics.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].subsystem, "Chassis");
}

#[test]
fn test_wheel_drive_end_to_end() {
    let (motors, controllers) = SimulatedMotors::new(2);
    let wheels = WheelDrive::from_controllers(controllers).unwrap();
    let topology = wheels.topology();
    assert_eq!(topology, Topology::Differential);

    let handoff = Arc::new(PidHandoff::new());
    let status = Arc::new(Switch(AtomicBool::new(true)));
    let mut drive = DriveSubsystem::new(DriveSettings::default(), topology, wheels)
        .unwrap()
        .with_pid(handoff.clone(), status, |u: f64| (0.6, u));

    handoff.use_output(0.2);
    drive.update(RobotMode::Autonomous, &[] as &[Stick]).unwrap();

    let speeds = motors.speeds();
    assert!((speeds[0] - 0.4).abs() < EPS && (speeds[1] - 0.8).abs() < EPS, "{:?}", speeds);
    match drive.actuator().last_actuation() {
        DriveActuation::Tank { left, right } => {
            assert!((left - 0.4).abs() < EPS && (right - 0.8).abs() < EPS);
        }
        other => panic!("unexpected actuation {:?}", other),
    }

    drop(drive);
    assert_eq!(motors.speeds(), vec![0.0, 0.0]);
}
