// PID controller and the periodic task that runs it
// The loop runs on its own tokio task at a fixed period, independent of the
// robot tick, and pushes every output into a PidOutputSink.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::drive::{PidOutputSink, PidStatus};

/// PID controller with feed-forward and output clamping.
#[derive(Debug, Clone)]
pub struct PidController {
    /// Proportional gain
    p: f64,
    /// Integral gain
    i: f64,
    /// Derivative gain
    d: f64,
    /// Feed-forward gain, multiplied by the setpoint
    f: f64,

    setpoint: f64,

    /// Integrator state
    integral: f64,
    /// Error from the previous update (for derivative term)
    prev_error: Option<f64>,

    out_min: f64,
    out_max: f64,
}

impl PidController {
    pub fn new(p: f64, i: f64, d: f64, f: f64) -> Self {
        Self {
            p,
            i,
            d,
            f,
            setpoint: 0.0,
            integral: 0.0,
            prev_error: None,
            out_min: -1.0,
            out_max: 1.0,
        }
    }

    /// Set output limits.
    pub fn with_output_limits(mut self, min: f64, max: f64) -> Self {
        self.out_min = min;
        self.out_max = max;
        self
    }

    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.setpoint = setpoint;
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    /// Reset integrator + derivative history.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
    }

    /// Update the controller with a new `measurement`, `dt` seconds after the last.
    ///
    /// Returns an output clamped to the configured limits.
    pub fn calculate(&mut self, measurement: f64, dt: f64) -> f64 {
        let error = self.setpoint - measurement;

        self.integral += error * dt;
        // Anti-windup: the I term alone never exceeds the output range
        if self.i != 0.0 {
            let (lo, hi) = (self.out_min / self.i, self.out_max / self.i);
            self.integral = self.integral.clamp(lo.min(hi), lo.max(hi));
        }

        let derivative = match self.prev_error {
            Some(prev) if dt > 0.0 => (error - prev) / dt,
            _ => 0.0,
        };
        self.prev_error = Some(error);

        let out = self.p * error + self.i * self.integral + self.d * derivative + self.f * self.setpoint;
        out.clamp(self.out_min, self.out_max)
    }
}

/// Supplies the process variable to a PID loop
pub trait PidSource: Send {
    fn measurement(&self) -> f64;
}

impl<F> PidSource for F
where
    F: Fn() -> f64 + Send,
{
    fn measurement(&self) -> f64 {
        self()
    }
}

/// State shared between a running PID loop and its owner
#[derive(Debug, Default)]
pub struct PidLoopState {
    enabled: AtomicBool,
    setpoint: Mutex<Option<f64>>,
}

impl PidLoopState {
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    /// Queue a new setpoint for the loop to pick up on its next period
    pub fn set_setpoint(&self, setpoint: f64) {
        *self
            .setpoint
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(setpoint);
    }

    fn take_setpoint(&self) -> Option<f64> {
        self.setpoint
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }
}

impl PidStatus for PidLoopState {
    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

/// Handle to a PID controller running on its own periodic task
///
/// The loop starts disabled. Disabling resets the controller and stops
/// outputs; it does not push a final zero. The task is aborted on drop.
pub struct PidLoop {
    state: Arc<PidLoopState>,
    task: JoinHandle<()>,
}

impl PidLoop {
    /// Spawn the loop on the current tokio runtime
    pub fn spawn(
        mut controller: PidController,
        source: impl PidSource + 'static,
        sink: Arc<dyn PidOutputSink>,
        period: Duration,
    ) -> Self {
        let state = Arc::new(PidLoopState::default());
        let shared = state.clone();
        info!("Starting PID loop every {}ms", period.as_millis());

        let task = tokio::spawn(async move {
            let mut tick = interval(period);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let dt = period.as_secs_f64();
            let mut was_enabled = false;

            loop {
                tick.tick().await;

                if let Some(setpoint) = shared.take_setpoint() {
                    debug!("PID setpoint -> {}", setpoint);
                    controller.set_setpoint(setpoint);
                }

                if !shared.is_enabled() {
                    if was_enabled {
                        controller.reset();
                        info!("PID loop disabled");
                    }
                    was_enabled = false;
                    continue;
                }
                if !was_enabled {
                    info!("PID loop enabled, setpoint {}", controller.setpoint());
                }
                was_enabled = true;

                let output = controller.calculate(source.measurement(), dt);
                sink.use_output(output);
            }
        });

        Self { state, task }
    }

    pub fn enable(&self) {
        self.state.enable();
    }

    pub fn disable(&self) {
        self.state.disable();
    }

    pub fn set_setpoint(&self, setpoint: f64) {
        self.state.set_setpoint(setpoint);
    }

    pub fn is_enabled(&self) -> bool {
        self.state.is_enabled()
    }

    /// Shared state, usable as the subsystem's [`PidStatus`]
    pub fn state(&self) -> Arc<PidLoopState> {
        self.state.clone()
    }
}

impl Drop for PidLoop {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::PidHandoff;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_proportional_only() {
        let mut pid = PidController::new(0.5, 0.0, 0.0, 0.0);
        pid.set_setpoint(1.0);
        assert!((pid.calculate(0.0, 0.02) - 0.5).abs() < EPS);
        assert!((pid.calculate(1.0, 0.02)).abs() < EPS);
    }

    #[test]
    fn test_output_clamped() {
        let mut pid = PidController::new(10.0, 0.0, 0.0, 0.0).with_output_limits(-0.5, 0.5);
        pid.set_setpoint(1.0);
        assert_eq!(pid.calculate(0.0, 0.02), 0.5);
        assert_eq!(pid.calculate(2.0, 0.02), -0.5);
    }

    #[test]
    fn test_integral_accumulates_and_resets() {
        let mut pid = PidController::new(0.0, 1.0, 0.0, 0.0);
        pid.set_setpoint(1.0);
        pid.calculate(0.0, 0.1);
        let second = pid.calculate(0.0, 0.1);
        assert!((second - 0.2).abs() < EPS);

        pid.reset();
        assert!((pid.calculate(0.0, 0.1) - 0.1).abs() < EPS);
    }

    #[test]
    fn test_integral_windup_bounded() {
        let mut pid = PidController::new(0.0, 1.0, 0.0, 0.0);
        pid.set_setpoint(1.0);
        for _ in 0..1000 {
            pid.calculate(0.0, 0.1);
        }
        // Wound up to the limit, one step of opposite error pulls it back below
        assert!(pid.calculate(2.0, 0.1) < 1.0);
    }

    #[test]
    fn test_derivative_skips_first_update() {
        let mut pid = PidController::new(0.0, 0.0, 1.0, 0.0).with_output_limits(-100.0, 100.0);
        pid.set_setpoint(1.0);
        assert_eq!(pid.calculate(0.0, 0.1), 0.0);
        // Error drops from 1.0 to 0.5 in 0.1s
        assert!((pid.calculate(0.5, 0.1) + 5.0).abs() < EPS);
    }

    #[test]
    fn test_feed_forward() {
        let mut pid = PidController::new(0.0, 0.0, 0.0, 0.25);
        pid.set_setpoint(2.0);
        assert!((pid.calculate(2.0, 0.02) - 0.5).abs() < EPS);
    }

    #[tokio::test]
    async fn test_loop_pushes_only_while_enabled() {
        let handoff = Arc::new(PidHandoff::new());
        let pid = PidLoop::spawn(
            PidController::new(1.0, 0.0, 0.0, 0.0),
            || 0.25,
            handoff.clone(),
            Duration::from_millis(5),
        );
        pid.set_setpoint(1.0);

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(!pid.is_enabled());
        assert_eq!(handoff.take(), None);

        pid.enable();
        tokio::time::sleep(Duration::from_millis(40)).await;
        let output = handoff.take().expect("enabled loop should push outputs");
        assert!((output - 0.75).abs() < EPS);

        pid.disable();
        tokio::time::sleep(Duration::from_millis(20)).await;
        handoff.take();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(handoff.take(), None);
    }
}
