//! Serialized shape of the persisted achievement collection.
//!
//! One record per achievement:
//! `{ "id", "settings": { "names", "descriptions", "thresholds", "images",
//! "colors"? }, "level", "progress" }`. Thresholds are written as plain
//! width numbers; the legacy `{ "min", "max" }` range objects are still
//! accepted on load.

use error::TrackerError;
use serde::{Deserialize, Serialize};

use crate::achievement::Achievement;
use crate::thresholds::{LevelPalette, ThresholdTable};

/// One persisted achievement record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAchievement {
    pub id: String,
    pub settings: StoredSettings,
    pub level: usize,
    pub progress: f64,
}

/// Persisted threshold table fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSettings {
    pub names: Vec<String>,
    pub descriptions: Vec<String>,
    pub thresholds: Vec<StoredThreshold>,
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<LevelPalette>>,
}

/// A threshold entry: a width, or a legacy `{min, max}` range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredThreshold {
    Width(f64),
    Range { min: f64, max: f64 },
}

impl StoredSettings {
    /// Reconstructs a validated threshold table from persisted settings.
    pub fn to_table(&self) -> Result<ThresholdTable, TrackerError> {
        let mut widths = Vec::new();
        let mut ranges = Vec::new();
        for threshold in &self.thresholds {
            match threshold {
                StoredThreshold::Width(w) => widths.push(*w),
                StoredThreshold::Range { min, max } => ranges.push((*min, *max)),
            }
        }
        if !widths.is_empty() && !ranges.is_empty() {
            return Err(TrackerError::MalformedData(
                "threshold entries mix widths and legacy ranges".into(),
            ));
        }

        if ranges.is_empty() {
            ThresholdTable::from_widths(
                widths,
                self.names.clone(),
                self.descriptions.clone(),
                self.images.clone(),
                self.colors.clone(),
            )
        } else {
            ThresholdTable::from_ranges(
                ranges,
                self.names.clone(),
                self.descriptions.clone(),
                self.images.clone(),
                self.colors.clone(),
            )
        }
    }

    /// Captures a live table into its persisted form (widths, never ranges).
    pub fn from_table(table: &ThresholdTable) -> Self {
        Self {
            names: table.names().to_vec(),
            descriptions: table.descriptions().to_vec(),
            thresholds: table.widths().iter().map(|w| StoredThreshold::Width(*w)).collect(),
            images: table.images().to_vec(),
            colors: table.colors().map(|c| c.to_vec()),
        }
    }
}

impl StoredAchievement {
    pub fn from_achievement(achievement: &Achievement) -> Self {
        Self {
            id: achievement.id().to_string(),
            settings: StoredSettings::from_table(achievement.table()),
            level: achievement.level(),
            progress: achievement.progress(),
        }
    }

    /// Reconstructs the live achievement this record describes.
    pub fn to_achievement(&self) -> Result<Achievement, TrackerError> {
        let table = self.settings.to_table()?;
        Achievement::restore(self.id.clone(), table, self.level, self.progress)
    }

    /// Cumulative progress this record represents under its own table.
    pub fn cumulative_progress(&self) -> Result<f64, TrackerError> {
        let table = self.settings.to_table()?;
        if self.level >= table.len() {
            return Err(TrackerError::MalformedData(format!(
                "stored level {} is outside the {}-level table",
                self.level,
                table.len()
            )));
        }
        Ok(table.prefix_width(self.level) + self.progress)
    }
}

/// Serializes the collection to its canonical plaintext encoding.
pub fn encode_collection(records: &[StoredAchievement]) -> Result<String, TrackerError> {
    Ok(serde_json::to_string(records)?)
}

/// Parses the canonical plaintext encoding back into records.
pub fn decode_collection(plaintext: &str) -> Result<Vec<StoredAchievement>, TrackerError> {
    Ok(serde_json::from_str(plaintext)?)
}
