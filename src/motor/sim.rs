// Simulated speed controllers for running without hardware

use std::sync::{Arc, Mutex};

use super::driver::{MotorError, SpeedController};

/// Shared view of a bank of simulated motor outputs
#[derive(Debug, Clone)]
pub struct SimulatedMotors {
    outputs: Arc<Mutex<Vec<f64>>>,
}

impl SimulatedMotors {
    /// Create `count` simulated controllers plus the handle that observes them
    pub fn new(count: usize) -> (Self, Vec<Box<dyn SpeedController>>) {
        let outputs = Arc::new(Mutex::new(vec![0.0; count]));
        let controllers = (0..count)
            .map(|channel| {
                Box::new(SimulatedController {
                    channel,
                    outputs: outputs.clone(),
                }) as Box<dyn SpeedController>
            })
            .collect();
        (Self { outputs }, controllers)
    }

    /// Current output of every channel
    pub fn speeds(&self) -> Vec<f64> {
        self.outputs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

struct SimulatedController {
    channel: usize,
    outputs: Arc<Mutex<Vec<f64>>>,
}

impl SpeedController for SimulatedController {
    fn set(&mut self, speed: f64) -> Result<(), MotorError> {
        if !speed.is_finite() {
            return Err(MotorError::Fault {
                channel: self.channel,
                reason: format!("non-finite speed {}", speed),
            });
        }
        let mut outputs = self
            .outputs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        outputs[self.channel] = speed.clamp(-1.0, 1.0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channels_are_independent() {
        let (motors, mut controllers) = SimulatedMotors::new(3);
        controllers[1].set(0.5).unwrap();
        controllers[2].set(-2.0).unwrap();
        assert_eq!(motors.speeds(), vec![0.0, 0.5, -1.0]);
    }

    #[test]
    fn test_nan_rejected() {
        let (motors, mut controllers) = SimulatedMotors::new(1);
        assert!(matches!(
            controllers[0].set(f64::NAN),
            Err(MotorError::Fault { channel: 0, .. })
        ));
        assert_eq!(motors.speeds(), vec![0.0]);
    }
}
