//! Unlock events and their delivery.
//!
//! State changes are immediate; notification delivery may lag. Every unlock
//! is scheduled on a [`NotificationQueue`] with a per-event delay, so that a
//! multi-level jump does not flood the sink with simultaneous notifications.
//! The queue is drained against a caller-supplied instant, which keeps event
//! delivery testable with a controllable clock.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Event name published to the host when a level is unlocked.
pub const ACHIEVEMENT_UNLOCKED: &str = "achievement.unlocked";

/// Delay between notifications when one update crosses several levels.
pub const UNLOCK_STAGGER: Duration = Duration::from_millis(200);

/// Payload published when an achievement level is unlocked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnlockEvent {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image: String,
}

/// Collaborator-facing event emission, implemented by the host's event bus.
pub trait EventSink {
    fn emit(&mut self, event: &str, payload: &UnlockEvent);
}

/// Sink that logs unlock events instead of publishing them anywhere.
#[derive(Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&mut self, event: &str, payload: &UnlockEvent) {
        tracing::info!(event, id = %payload.id, name = %payload.name, "achievement unlocked");
    }
}

/// One unlock waiting for its delivery time.
#[derive(Debug, Clone)]
pub struct ScheduledUnlock {
    pub due: Instant,
    pub event: UnlockEvent,
}

/// Queue of unlock notifications ordered by due time.
#[derive(Debug, Default)]
pub struct NotificationQueue {
    pending: VecDeque<ScheduledUnlock>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `event` for delivery `delay` from now.
    pub fn schedule(&mut self, event: UnlockEvent, delay: Duration) {
        let scheduled = ScheduledUnlock {
            due: Instant::now() + delay,
            event,
        };
        // Keep the queue sorted by due time; entries are appended in
        // near-monotonic order so this walk is short.
        let at = self
            .pending
            .iter()
            .position(|other| other.due > scheduled.due)
            .unwrap_or(self.pending.len());
        self.pending.insert(at, scheduled);
    }

    /// Removes and returns every event due at or before `now`.
    pub fn drain_due_at(&mut self, now: Instant) -> Vec<UnlockEvent> {
        let mut due = Vec::new();
        while let Some(next) = self.pending.front() {
            if next.due > now {
                break;
            }
            if let Some(scheduled) = self.pending.pop_front() {
                due.push(scheduled.event);
            }
        }
        due
    }

    /// Removes and returns every event due by now.
    pub fn drain_due(&mut self) -> Vec<UnlockEvent> {
        self.drain_due_at(Instant::now())
    }

    /// Removes and returns all pending events regardless of due time.
    pub fn drain_all(&mut self) -> Vec<UnlockEvent> {
        self.pending.drain(..).map(|s| s.event).collect()
    }

    /// Number of notifications still waiting for delivery.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
