//! A single achievement: a bounded, multi-level progress tracker.

use std::time::Duration;

use error::TrackerError;

use crate::events::{NotificationQueue, UNLOCK_STAGGER, UnlockEvent};
use crate::thresholds::{LevelPalette, ThresholdTable};

/// Multi-level progress state machine.
///
/// Converts a raw cumulative progress value into a discrete
/// `(level, intra-level progress)` pair and schedules one unlock
/// notification per level boundary crossed. Once the final level's width is
/// consumed the achievement is maxed and further updates are no-ops until a
/// reset.
#[derive(Debug, Clone)]
pub struct Achievement {
    id: String,
    table: ThresholdTable,
    level: usize,
    progress: f64,
    cumulative: f64,
    maxed: bool,
}

impl Achievement {
    /// Creates a fresh achievement at level 0 with no progress.
    pub fn new(id: impl Into<String>, table: ThresholdTable) -> Self {
        Self {
            id: id.into(),
            table,
            level: 0,
            progress: 0.0,
            cumulative: 0.0,
            maxed: false,
        }
    }

    /// Reconstructs an achievement from persisted fields.
    ///
    /// Fails with a definition error when `level` or `progress` fall outside
    /// the table.
    pub fn restore(
        id: impl Into<String>,
        table: ThresholdTable,
        level: usize,
        progress: f64,
    ) -> Result<Self, TrackerError> {
        let id = id.into();
        if level >= table.len() {
            return Err(TrackerError::InvalidDefinition(format!(
                "achievement {id:?}: level {level} is outside the {}-level table",
                table.len()
            )));
        }
        if !progress.is_finite() || progress < 0.0 || progress > table.width(level) {
            return Err(TrackerError::InvalidDefinition(format!(
                "achievement {id:?}: progress {progress} is outside level {level} (width {})",
                table.width(level)
            )));
        }

        let cumulative = table.prefix_width(level) + progress;
        let maxed = level == table.len() - 1 && progress >= table.width(level);
        Ok(Self {
            id,
            table,
            level,
            progress,
            cumulative,
            maxed,
        })
    }

    /// Applies a progress delta, scheduling one unlock notification per
    /// crossed level boundary. Returns the number of levels unlocked.
    ///
    /// A delta large enough to overshoot the entire table snaps straight to
    /// the terminal state and announces only the final level; smaller deltas
    /// ripple level by level, staggering each notification by
    /// [`UNLOCK_STAGGER`] so multi-level jumps do not flood the sink.
    pub fn update(
        &mut self,
        delta: f64,
        queue: &mut NotificationQueue,
    ) -> Result<u32, TrackerError> {
        if !delta.is_finite() || delta < 0.0 {
            return Err(TrackerError::InvalidDelta(delta));
        }
        if self.maxed {
            return Ok(0);
        }

        let last = self.table.len() - 1;
        let total = self.table.total_width();

        // Terminal snap: the input alone finishes the entire table. Only the
        // final level is announced; intermediate levels are intentionally
        // not announced on this path.
        if delta >= total - self.cumulative {
            self.level = last;
            self.progress = self.table.width(last);
            self.cumulative = total;
            self.maxed = true;
            queue.schedule(self.unlock_event(last), Duration::ZERO);
            return Ok(1);
        }

        let mut carried = self.progress + delta;
        let mut level = self.level;
        let mut crossed: u32 = 0;

        // Boundary-inclusive walk: landing exactly on a level's width
        // advances past it.
        while carried >= self.table.width(level) {
            if level == last {
                self.maxed = true;
                carried = self.table.width(level);
                queue.schedule(self.unlock_event(level), UNLOCK_STAGGER * crossed);
                crossed += 1;
                break;
            }
            carried -= self.table.width(level);
            queue.schedule(self.unlock_event(level), UNLOCK_STAGGER * crossed);
            crossed += 1;
            level += 1;
        }

        self.level = level;
        self.progress = carried;
        self.cumulative = self.table.prefix_width(level) + carried;
        Ok(crossed)
    }

    /// Resets progress within the current level, or the whole achievement
    /// when `overall` is `true`. Always clears the maxed flag.
    pub fn reset(&mut self, overall: bool) {
        if overall {
            self.level = 0;
        }
        self.progress = 0.0;
        self.cumulative = self.table.prefix_width(self.level);
        self.maxed = false;
    }

    fn unlock_event(&self, level: usize) -> UnlockEvent {
        UnlockEvent {
            id: self.id.clone(),
            name: self.table.name(level).to_string(),
            description: self.table.description(level).to_string(),
            image: self.table.image(level).to_string(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn table(&self) -> &ThresholdTable {
        &self.table
    }

    /// Current level index.
    pub fn level(&self) -> usize {
        self.level
    }

    /// Progress within the current level.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Width of the current level.
    pub fn progress_max(&self) -> f64 {
        self.table.width(self.level)
    }

    /// Progress through the current level, as a percentage.
    pub fn progress_percent(&self) -> f64 {
        (self.progress / self.table.width(self.level)) * 100.0
    }

    /// Total progress accrued across all levels.
    pub fn cumulative_progress(&self) -> f64 {
        self.cumulative
    }

    /// `true` once the final level's threshold has been reached.
    pub fn is_maxed(&self) -> bool {
        self.maxed
    }

    /// Name of the current level.
    pub fn name(&self) -> &str {
        self.table.name(self.level)
    }

    /// Description of the current level.
    pub fn description(&self) -> &str {
        self.table.description(self.level)
    }

    /// Image of the current level.
    pub fn image(&self) -> &str {
        self.table.image(self.level)
    }

    /// Color palette of the current level.
    pub fn colors(&self) -> LevelPalette {
        self.table.palette(self.level)
    }
}
