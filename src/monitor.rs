//! The optional monitor capability.
//!
//! An achievement may subscribe itself to raw host signals (movement
//! sampling, jump events, elapsed-time ticks) through a pair of start/stop
//! hooks. Monitors never touch an [`crate::Achievement`] directly: they push
//! [`ProgressSignal`]s into a channel and the manager applies them through
//! its own `update`, keeping every mutation behind the authorization gate.

use std::fmt;
use std::sync::mpsc::Sender;

/// One raw progress signal produced by a monitor.
#[derive(Debug, Clone)]
pub struct ProgressSignal {
    /// Identifier of the achievement to update.
    pub id: String,
    /// Progress amount to add.
    pub delta: f64,
    /// Capability token, required when the target is protected.
    pub token: Option<String>,
}

/// Channel end a monitor pushes its signals into.
pub type SignalSender = Sender<ProgressSignal>;

/// Start/stop hooks an achievement may carry.
///
/// `stop` must be idempotent and must fully cancel the underlying timer or
/// subscription so that a later `start` never produces duplicate signals.
pub struct MonitorHooks {
    start: Box<dyn FnMut(SignalSender)>,
    stop: Box<dyn FnMut()>,
}

impl MonitorHooks {
    pub fn new(
        start: impl FnMut(SignalSender) + 'static,
        stop: impl FnMut() + 'static,
    ) -> Self {
        Self {
            start: Box::new(start),
            stop: Box::new(stop),
        }
    }

    /// Begins monitoring; signals flow into `tx`.
    pub fn start(&mut self, tx: SignalSender) {
        (self.start)(tx);
    }

    /// Cancels monitoring.
    pub fn stop(&mut self) {
        (self.stop)();
    }
}

impl fmt::Debug for MonitorHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorHooks").finish_non_exhaustive()
    }
}
