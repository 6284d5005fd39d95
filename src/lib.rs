//! Achievement tracking for an embedding host application.
//!
//! The host supplies raw progress signals (distance moved, actions
//! performed, elapsed time); this crate converts them into bounded,
//! multi-level achievement state, persists that state durably and
//! tamper-evidently, and notifies the host when a level is unlocked.
//!
//! The [`AchievementManager`] is the single entry point: it owns the
//! collection, gates mutation of the built-in achievements behind a
//! capability token, drives monitor lifecycles, and reconciles stored
//! state against definitions that changed between sessions.

pub mod achievement;
pub mod builtin;
pub mod events;
pub mod manager;
pub mod monitor;
pub mod persist;
pub mod reconcile;
pub mod thresholds;

pub use achievement::Achievement;
pub use error::TrackerError;
pub use events::{
    ACHIEVEMENT_UNLOCKED, EventSink, LogSink, NotificationQueue, UNLOCK_STAGGER, UnlockEvent,
};
pub use manager::{AchievementManager, CapabilityToken, ManagerConfig, Origin};
pub use monitor::{MonitorHooks, ProgressSignal, SignalSender};
pub use reconcile::{ExternalDescriptor, RegistrationHook};
pub use store::{FileStore, KvStore, MemoryStore, STATE_KEY};
pub use thresholds::{LevelPalette, ThresholdTable};
