// Zero stale autonomous output once the PID loop is off

use std::sync::Mutex;

use tracing::warn;

use crate::messages::Diagnostic;

use super::pid::PidTranslator;

/// Fire-and-forget diagnostic channel; must never block the tick
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, subsystem: &str, message: &str);
}

/// Emits diagnostics as tracing events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn report(&self, subsystem: &str, message: &str) {
        warn!(subsystem, "{}", message);
    }
}

/// Logs and keeps diagnostics until drained
#[derive(Debug, Default)]
pub struct BufferedDiagnostics {
    events: Mutex<Vec<Diagnostic>>,
}

impl BufferedDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything reported so far
    pub fn drain(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Diagnostic>> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DiagnosticSink for BufferedDiagnostics {
    fn report(&self, subsystem: &str, message: &str) {
        TracingDiagnostics.report(subsystem, message);
        self.lock().push(Diagnostic {
            subsystem: subsystem.to_string(),
            message: message.to_string(),
        });
    }
}

pub const ZEROED_MESSAGE: &str =
    "Set drive outputs to zero because PID loop was disabled and they were nonzero";

/// Force the translator's cached output to zero if the PID loop is disabled
///
/// Returns true when it intervened. A disabled loop with an already-zero
/// cache is left alone and reports nothing.
pub fn zero_if_disabled(
    translator: &mut PidTranslator,
    pid_enabled: bool,
    subsystem: &str,
    diagnostics: &dyn DiagnosticSink,
) -> bool {
    if pid_enabled || translator.cached().is_zero() {
        return false;
    }

    translator.force_zero();
    diagnostics.report(subsystem, ZEROED_MESSAGE);
    true
}
