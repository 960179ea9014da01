// PID output -> drive vector translation
//
// The PID loop pushes scalar outputs from its own task; the tick thread takes
// them. Value and "new" flag live in one lock so they always change together.

use std::sync::Mutex;

use tracing::debug;

use super::topology::Topology;
use super::vector::StickVector;

/// Receiver of scalar PID outputs (push side of the PID controller)
pub trait PidOutputSink: Send + Sync {
    fn use_output(&self, output: f64);
}

/// Reports whether the PID loop is currently running
pub trait PidStatus: Send + Sync {
    fn is_enabled(&self) -> bool;
}

/// Single-producer/single-consumer slot for the latest PID output
///
/// `Some` means a sample arrived since the last [`take`](Self::take).
#[derive(Debug, Default)]
pub struct PidHandoff {
    pending: Mutex<Option<f64>>,
}

impl PidHandoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the pending sample and clear the flag in one step
    pub fn take(&self) -> Option<f64> {
        // A poisoned lock still holds a valid Option<f64>
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    /// True when a sample is waiting
    pub fn has_new_sample(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }
}

impl PidOutputSink for PidHandoff {
    fn use_output(&self, output: f64) {
        *self
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(output);
    }
}

/// Maps a PID output `u` to a drivetrain-agnostic `(speed, turn)` pair
///
/// This is where `u` gets its physical meaning (heading correction, distance
/// correction, ...).
pub trait BaseIndependent: Send {
    fn speed_turn(&self, pid_output: f64) -> (f64, f64);
}

impl<F> BaseIndependent for F
where
    F: Fn(f64) -> (f64, f64) + Send,
{
    fn speed_turn(&self, pid_output: f64) -> (f64, f64) {
        self(pid_output)
    }
}

/// Expand `(speed, turn)` into the stick vector for `topology`
///
/// Holonomic drives get `{0, speed, turn, 0}`; differential gets tank sides
/// `{0, speed - turn, 0, speed + turn}`.
pub fn expand_speed_turn(topology: Topology, speed: f64, turn: f64) -> StickVector {
    if topology.is_holonomic() {
        StickVector::new(0.0, speed, turn, 0.0)
    } else {
        StickVector::new(0.0, speed - turn, 0.0, speed + turn)
    }
}

/// Turns buffered PID outputs into a cached drive vector, once per sample
pub struct PidTranslator {
    topology: Topology,
    base: Box<dyn BaseIndependent>,
    cached: StickVector,
}

impl PidTranslator {
    pub fn new(topology: Topology, base: impl BaseIndependent + 'static) -> Self {
        Self {
            topology,
            base: Box::new(base),
            cached: StickVector::ZERO,
        }
    }

    /// Consume a new sample from `handoff` if there is one, then return the cache
    ///
    /// Without a new sample the previous output is reused unchanged.
    pub fn tick(&mut self, handoff: &PidHandoff) -> StickVector {
        if let Some(output) = handoff.take() {
            let (speed, turn) = self.base.speed_turn(output);
            self.cached = expand_speed_turn(self.topology, speed, turn);
            debug!(
                "PID output {} -> speed={}, turn={}, drive={:?}",
                output, speed, turn, self.cached
            );
        }
        self.cached
    }

    /// Last computed drive vector
    pub fn cached(&self) -> StickVector {
        self.cached
    }

    /// Override the cache with the zero vector
    pub(crate) fn force_zero(&mut self) {
        self.cached = StickVector::ZERO;
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    use super::*;

    const EPS: f64 = 1e-12;

    fn approx(a: StickVector, b: StickVector) -> bool {
        a.as_array()
            .iter()
            .zip(b.as_array())
            .all(|(x, y)| (x - y).abs() < EPS)
    }

    #[test]
    fn test_differential_expansion() {
        let v = expand_speed_turn(Topology::Differential, 0.6, 0.2);
        assert!(approx(v, StickVector::new(0.0, 0.4, 0.0, 0.8)), "{:?}", v);
    }

    #[test]
    fn test_holonomic_expansion() {
        for topology in [Topology::Mecanum, Topology::Killough] {
            let v = expand_speed_turn(topology, 0.6, 0.2);
            assert!(approx(v, StickVector::new(0.0, 0.6, 0.2, 0.0)), "{:?}", v);
        }
    }

    #[test]
    fn test_handoff_take_clears_flag() {
        let handoff = PidHandoff::new();
        assert!(!handoff.has_new_sample());
        assert_eq!(handoff.take(), None);

        handoff.use_output(0.3);
        handoff.use_output(0.7);
        assert!(handoff.has_new_sample());
        assert_eq!(handoff.take(), Some(0.7));
        assert!(!handoff.has_new_sample());
        assert_eq!(handoff.take(), None);
    }

    #[test]
    fn test_tick_recomputes_only_on_new_sample() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut translator = PidTranslator::new(Topology::Differential, move |u: f64| {
            counter.fetch_add(1, Ordering::SeqCst);
            (u, 0.0)
        });
        let handoff = PidHandoff::new();

        assert_eq!(translator.tick(&handoff), StickVector::ZERO);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        handoff.use_output(0.5);
        let first = translator.tick(&handoff);
        let second = translator.tick(&handoff);
        assert_eq!(first, second);
        assert_eq!(first, StickVector::new(0.0, 0.5, 0.0, 0.5));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        handoff.use_output(-0.25);
        assert_eq!(translator.tick(&handoff), StickVector::new(0.0, -0.25, 0.0, -0.25));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_force_zero_keeps_until_next_sample() {
        let mut translator = PidTranslator::new(Topology::Mecanum, |u: f64| (u, u / 2.0));
        let handoff = PidHandoff::new();
        handoff.use_output(0.4);
        translator.tick(&handoff);
        assert!(!translator.cached().is_zero());

        translator.force_zero();
        assert!(translator.tick(&handoff).is_zero());

        handoff.use_output(0.4);
        assert_eq!(translator.tick(&handoff), StickVector::new(0.0, 0.4, 0.2, 0.0));
    }

    #[test]
    fn test_concurrent_writer_never_loses_last_value() {
        let handoff = Arc::new(PidHandoff::new());
        let writer = {
            let handoff = handoff.clone();
            thread::spawn(move || {
                for i in 1..=1000 {
                    handoff.use_output(i as f64);
                }
            })
        };

        let mut last_seen = 0.0;
        while !writer.is_finished() {
            if let Some(v) = handoff.take() {
                assert!(v > last_seen, "values must arrive in order");
                last_seen = v;
            }
        }
        writer.join().unwrap();
        if let Some(v) = handoff.take() {
            last_seen = v;
        }
        assert_eq!(last_seen, 1000.0);
    }
}
