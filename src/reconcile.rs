//! Reconciling stored state against live achievement definitions.
//!
//! Definitions can change between sessions: built-ins gain levels or change
//! thresholds, and external collaborators register achievements whose
//! definitions were unknown at load time. Reconciliation remaps stored
//! cumulative progress onto the current tables instead of discarding it.

use error::TrackerError;

use crate::achievement::Achievement;
use crate::monitor::MonitorHooks;
use crate::thresholds::{LevelPalette, ThresholdTable};

/// Achievement descriptor supplied by an external collaborator.
pub struct ExternalDescriptor {
    pub id: String,
    pub names: Vec<String>,
    pub descriptions: Vec<String>,
    /// Per-level widths.
    pub thresholds: Vec<f64>,
    pub images: Vec<String>,
    pub colors: Option<Vec<LevelPalette>>,
    /// Optional monitor capability.
    pub monitor: Option<MonitorHooks>,
}

impl ExternalDescriptor {
    /// Validates the descriptor into a fresh achievement plus its monitor.
    pub fn into_parts(self) -> Result<(Achievement, Option<MonitorHooks>), TrackerError> {
        let table = ThresholdTable::from_widths(
            self.thresholds,
            self.names,
            self.descriptions,
            self.images,
            self.colors,
        )?;
        Ok((Achievement::new(self.id, table), self.monitor))
    }
}

/// Hook through which external collaborators register achievements.
pub trait RegistrationHook {
    fn achievements(&mut self) -> Vec<ExternalDescriptor>;
}

/// Deduplicates descriptors by identifier; the last registration for a
/// given identifier wins, keeping its first-seen position.
pub fn dedupe_last_wins(descriptors: Vec<ExternalDescriptor>) -> Vec<ExternalDescriptor> {
    let mut latest: Vec<ExternalDescriptor> = Vec::new();
    for descriptor in descriptors {
        match latest.iter().position(|d| d.id == descriptor.id) {
            Some(at) => latest[at] = descriptor,
            None => latest.push(descriptor),
        }
    }
    latest
}

/// Remaps a stored cumulative progress value onto a new table.
///
/// Walks the new widths accumulating a running total; the first level whose
/// cumulative total strictly exceeds the stored value becomes the current
/// level, with intra-level progress equal to the remainder. Stored progress
/// beyond the new table's total pins to the final level at its maximum,
/// mirroring the terminal snap of the update path.
pub fn remap_progress(table: &ThresholdTable, cumulative: f64) -> (usize, f64) {
    let mut total = 0.0;
    for level in 0..table.len() {
        let width = table.width(level);
        if total + width > cumulative {
            return (level, cumulative - total);
        }
        total += width;
    }
    let last = table.len() - 1;
    (last, table.width(last))
}

/// Migrates one achievement onto its live definition.
///
/// Returns `None` when the live definition matches what is already loaded.
/// Cosmetic-only changes (names, descriptions, images, colors) keep the
/// current level and progress; threshold changes remap the cumulative
/// progress through [`remap_progress`].
pub fn migrate(
    current: &Achievement,
    live: ThresholdTable,
) -> Result<Option<Achievement>, TrackerError> {
    if *current.table() == live {
        return Ok(None);
    }

    if current.table().same_widths(&live) {
        let migrated =
            Achievement::restore(current.id(), live, current.level(), current.progress())?;
        return Ok(Some(migrated));
    }

    let (level, progress) = remap_progress(&live, current.cumulative_progress());
    let migrated = Achievement::restore(current.id(), live, level, progress)?;
    Ok(Some(migrated))
}
