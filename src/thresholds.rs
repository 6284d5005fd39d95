//! Threshold tables: the fixed, ordered level structure of an achievement.

use error::TrackerError;
use serde::{Deserialize, Serialize};

/// Number of built-in level palettes available when a table carries no
/// explicit colors.
pub const DEFAULT_PALETTE_COUNT: usize = 5;

/// Three-tone color set used to style one achievement level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelPalette {
    pub base: String,
    pub accent: String,
    pub text: String,
}

impl LevelPalette {
    pub fn new(base: impl Into<String>, accent: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            accent: accent.into(),
            text: text.into(),
        }
    }

    fn validate(&self) -> Result<(), TrackerError> {
        for tone in [&self.base, &self.accent, &self.text] {
            let hex_part = tone.strip_prefix('#').ok_or_else(|| {
                TrackerError::InvalidDefinition(format!("color {tone:?} must start with '#'"))
            })?;
            let valid_len = hex_part.len() == 3 || hex_part.len() == 6;
            if !valid_len || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(TrackerError::InvalidDefinition(format!(
                    "color {tone:?} is not a valid hex color"
                )));
            }
        }
        Ok(())
    }
}

/// Built-in tier palette applied when a table defines no colors of its own.
pub fn default_palette(level: usize) -> LevelPalette {
    // Bronze, silver, gold, platinum, diamond.
    const TIERS: [(&str, &str, &str); DEFAULT_PALETTE_COUNT] = [
        ("#cd7f32", "#8c5a23", "#ffffff"),
        ("#c0c0c0", "#8f8f8f", "#1a1a1a"),
        ("#ffd700", "#b39700", "#1a1a1a"),
        ("#e5e4e2", "#a8a8a6", "#1a1a1a"),
        ("#b9f2ff", "#6fc7d9", "#1a1a1a"),
    ];
    let (base, accent, text) = TIERS[level.min(DEFAULT_PALETTE_COUNT - 1)];
    LevelPalette::new(base, accent, text)
}

/// Ordered, immutable level structure of one achievement.
///
/// Each level has a width (the amount of progress needed to complete it) and
/// parallel name/description/image entries. Constructed once, validated
/// once, and never mutated in place; definition changes produce a new table.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdTable {
    widths: Vec<f64>,
    names: Vec<String>,
    descriptions: Vec<String>,
    images: Vec<String>,
    colors: Option<Vec<LevelPalette>>,
}

impl ThresholdTable {
    /// Builds a table from per-level widths.
    pub fn from_widths(
        widths: Vec<f64>,
        names: Vec<String>,
        descriptions: Vec<String>,
        images: Vec<String>,
        colors: Option<Vec<LevelPalette>>,
    ) -> Result<Self, TrackerError> {
        let table = Self {
            widths,
            names,
            descriptions,
            images,
            colors,
        };
        table.validate()?;
        Ok(table)
    }

    /// Builds a table from the legacy `(min, max)` range representation.
    ///
    /// Each range must have `min < max` and each level's minimum must be
    /// strictly above the previous level's maximum.
    pub fn from_ranges(
        ranges: Vec<(f64, f64)>,
        names: Vec<String>,
        descriptions: Vec<String>,
        images: Vec<String>,
        colors: Option<Vec<LevelPalette>>,
    ) -> Result<Self, TrackerError> {
        let mut widths = Vec::with_capacity(ranges.len());
        for (idx, &(min, max)) in ranges.iter().enumerate() {
            if !min.is_finite() || !max.is_finite() || min >= max {
                return Err(TrackerError::InvalidDefinition(format!(
                    "threshold range {idx} must have a minimum lower than its maximum"
                )));
            }
            if idx > 0 && min <= ranges[idx - 1].1 {
                return Err(TrackerError::InvalidDefinition(format!(
                    "threshold range {idx} must have a minimum above the previous maximum"
                )));
            }
            widths.push(max - min);
        }
        Self::from_widths(widths, names, descriptions, images, colors)
    }

    fn validate(&self) -> Result<(), TrackerError> {
        let n = self.widths.len();
        if n < 1 {
            return Err(TrackerError::InvalidDefinition(
                "threshold table must have at least one level".into(),
            ));
        }
        if self.names.len() != n || self.descriptions.len() != n || self.images.len() != n {
            return Err(TrackerError::InvalidDefinition(format!(
                "names ({}), descriptions ({}), thresholds ({n}) and images ({}) must have the \
                 same number of elements",
                self.names.len(),
                self.descriptions.len(),
                self.images.len()
            )));
        }
        for (idx, &width) in self.widths.iter().enumerate() {
            if !width.is_finite() || width <= 0.0 {
                return Err(TrackerError::InvalidDefinition(format!(
                    "threshold width for level {idx} must be a positive number"
                )));
            }
        }
        match &self.colors {
            Some(colors) => {
                if colors.len() != n {
                    return Err(TrackerError::InvalidDefinition(format!(
                        "colors ({}) must have one palette per level ({n})",
                        colors.len()
                    )));
                }
                for palette in colors {
                    palette.validate()?;
                }
            }
            None => {
                if n > DEFAULT_PALETTE_COUNT {
                    return Err(TrackerError::InvalidDefinition(format!(
                        "tables with more than {DEFAULT_PALETTE_COUNT} levels must define colors"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Number of levels.
    pub fn len(&self) -> usize {
        self.widths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }

    /// Width of the given level.
    pub fn width(&self, level: usize) -> f64 {
        self.widths[level]
    }

    pub fn widths(&self) -> &[f64] {
        &self.widths
    }

    /// Sum of the widths of all levels before `level`.
    pub fn prefix_width(&self, level: usize) -> f64 {
        self.widths[..level].iter().sum()
    }

    /// Total width of the entire table.
    pub fn total_width(&self) -> f64 {
        self.widths.iter().sum()
    }

    pub fn name(&self, level: usize) -> &str {
        &self.names[level]
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn description(&self, level: usize) -> &str {
        &self.descriptions[level]
    }

    pub fn descriptions(&self) -> &[String] {
        &self.descriptions
    }

    pub fn image(&self, level: usize) -> &str {
        &self.images[level]
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    /// Palette for the given level, falling back to the built-in tiers.
    pub fn palette(&self, level: usize) -> LevelPalette {
        match &self.colors {
            Some(colors) => colors[level].clone(),
            None => default_palette(level),
        }
    }

    pub fn colors(&self) -> Option<&[LevelPalette]> {
        self.colors.as_deref()
    }

    /// `true` when both tables have the same widths, ignoring cosmetic
    /// fields (names, descriptions, images, colors).
    pub fn same_widths(&self, other: &ThresholdTable) -> bool {
        self.widths == other.widths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n: usize) -> (Vec<String>, Vec<String>, Vec<String>) {
        let names = (0..n).map(|i| format!("Level {i}")).collect();
        let descriptions = (0..n).map(|i| format!("Reach level {i}.")).collect();
        let images = (0..n).map(|i| format!("images/level-{i}.svg")).collect();
        (names, descriptions, images)
    }

    #[test]
    fn builds_from_widths() {
        let (names, descriptions, images) = labels(3);
        let table =
            ThresholdTable::from_widths(vec![10.0, 40.0, 50.0], names, descriptions, images, None)
                .expect("valid table");
        assert_eq!(table.len(), 3);
        assert_eq!(table.total_width(), 100.0);
        assert_eq!(table.prefix_width(0), 0.0);
        assert_eq!(table.prefix_width(2), 50.0);
        assert_eq!(table.name(1), "Level 1");
    }

    #[test]
    fn rejects_empty_and_mismatched_tables() {
        let (names, descriptions, images) = labels(0);
        assert!(ThresholdTable::from_widths(vec![], names, descriptions, images, None).is_err());

        let (names, descriptions, images) = labels(2);
        assert!(
            ThresholdTable::from_widths(vec![10.0, 20.0, 30.0], names, descriptions, images, None)
                .is_err()
        );
    }

    #[test]
    fn rejects_non_positive_widths() {
        let (names, descriptions, images) = labels(2);
        assert!(
            ThresholdTable::from_widths(vec![10.0, 0.0], names, descriptions, images, None)
                .is_err()
        );
        let (names, descriptions, images) = labels(2);
        assert!(
            ThresholdTable::from_widths(vec![10.0, -5.0], names, descriptions, images, None)
                .is_err()
        );
    }

    #[test]
    fn legacy_ranges_convert_to_widths() {
        let (names, descriptions, images) = labels(3);
        let table = ThresholdTable::from_ranges(
            vec![(0.0, 10.0), (11.0, 100.0), (101.0, 10_000.0)],
            names,
            descriptions,
            images,
            None,
        )
        .expect("valid legacy table");
        assert_eq!(table.widths(), &[10.0, 89.0, 9_899.0]);
    }

    #[test]
    fn legacy_ranges_must_be_increasing() {
        let (names, descriptions, images) = labels(2);
        assert!(
            ThresholdTable::from_ranges(
                vec![(0.0, 10.0), (5.0, 100.0)],
                names,
                descriptions,
                images,
                None
            )
            .is_err()
        );
        let (names, descriptions, images) = labels(1);
        assert!(
            ThresholdTable::from_ranges(vec![(10.0, 10.0)], names, descriptions, images, None)
                .is_err()
        );
    }

    #[test]
    fn colors_required_beyond_default_palettes() {
        let n = DEFAULT_PALETTE_COUNT + 1;
        let (names, descriptions, images) = labels(n);
        let err =
            ThresholdTable::from_widths(vec![1.0; n], names, descriptions, images, None)
                .expect_err("needs colors");
        assert!(err.to_string().contains("colors"));

        let (names, descriptions, images) = labels(n);
        let colors = vec![LevelPalette::new("#fff", "#000", "#abc123"); n];
        assert!(
            ThresholdTable::from_widths(vec![1.0; n], names, descriptions, images, Some(colors))
                .is_ok()
        );
    }

    #[test]
    fn rejects_invalid_color_strings() {
        let (names, descriptions, images) = labels(1);
        let colors = vec![LevelPalette::new("fff", "#000", "#000")];
        assert!(
            ThresholdTable::from_widths(vec![1.0], names, descriptions, images, Some(colors))
                .is_err()
        );

        let (names, descriptions, images) = labels(1);
        let colors = vec![LevelPalette::new("#ggg", "#000", "#000")];
        assert!(
            ThresholdTable::from_widths(vec![1.0], names, descriptions, images, Some(colors))
                .is_err()
        );
    }

    #[test]
    fn palette_falls_back_to_built_in_tiers() {
        let (names, descriptions, images) = labels(2);
        let table =
            ThresholdTable::from_widths(vec![1.0, 2.0], names, descriptions, images, None)
                .expect("valid table");
        assert_eq!(table.palette(0), default_palette(0));
        assert_ne!(table.palette(0), table.palette(1));
    }
}
