//! Compiled built-in achievement definitions.
//!
//! These four achievements ship with the tracker and are protected: mutating
//! them requires the manager's capability token, and they can never be
//! removed. Their widths are chosen so the cumulative totals line up with
//! the level descriptions.

use error::TrackerError;

use crate::achievement::Achievement;
use crate::thresholds::ThresholdTable;

pub const MOVE_ID: &str = "move";
pub const JUMP_ID: &str = "jump";
pub const TIME_ID: &str = "time";
pub const CONTENT_ID: &str = "content";

/// Identifiers whose achievements are protected.
pub const PROTECTED_IDS: [&str; 4] = [MOVE_ID, JUMP_ID, TIME_ID, CONTENT_ID];

/// Identifier reserved for the "reset everything" sentinel.
pub const RESERVED_ID: &str = "all";

/// `true` when the identifier names a built-in achievement.
pub fn is_protected(id: &str) -> bool {
    PROTECTED_IDS.contains(&id)
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// Live threshold table for a built-in identifier.
pub fn definition(id: &str) -> Option<ThresholdTable> {
    let table = match id {
        // Cumulative totals: 1, 50, 1 000, 50 000, 1 000 000 metres.
        MOVE_ID => ThresholdTable::from_widths(
            vec![1.0, 49.0, 950.0, 49_000.0, 950_000.0],
            strings(&[
                "Learn to Move",
                "Let's Get Moving",
                "Now We're Moving",
                "Movement Pro",
                "Movement Master",
            ]),
            strings(&[
                "Move 1 metre.",
                "Move 50 metres.",
                "Move 1 000 metres.",
                "Move 50 000 metres.",
                "Move 1 000 000 metres.",
            ]),
            strings(&[
                "images/move-1.svg",
                "images/move-2.svg",
                "images/move-3.svg",
                "images/move-4.svg",
                "images/move-5.svg",
            ]),
            None,
        ),
        // Cumulative totals: 1, 10, 100, 10 000, 100 000 jumps.
        JUMP_ID => ThresholdTable::from_widths(
            vec![1.0, 9.0, 90.0, 9_900.0, 90_000.0],
            strings(&[
                "First Jump",
                "Jumping Jack",
                "Jumping Jill",
                "Jumping Pro",
                "Too Much Jumping",
            ]),
            strings(&[
                "Jump for the first time.",
                "Jump 10 times.",
                "Jump 100 times.",
                "Jump 10 000 times.",
                "Jump 100 000 times.",
            ]),
            strings(&[
                "images/jump-1.svg",
                "images/jump-2.svg",
                "images/jump-3.svg",
                "images/jump-4.svg",
                "images/jump-5.svg",
            ]),
            None,
        ),
        // Milliseconds; cumulative totals: 1 minute, 10 minutes, 1 hour, 1 day.
        TIME_ID => ThresholdTable::from_widths(
            vec![60_000.0, 540_000.0, 3_000_000.0, 82_800_000.0],
            strings(&[
                "Time Flies",
                "Time Flies Faster",
                "Time Flies Fastest",
                "Time Flies Too Fast",
            ]),
            strings(&[
                "Spend 1 minute in the world.",
                "Spend 10 minutes in the world.",
                "Spend 1 hour in the world.",
                "Spend 1 day in the world.",
            ]),
            strings(&[
                "images/time-1.png",
                "images/time-2.png",
                "images/time-3.png",
                "images/time-4.png",
            ]),
            None,
        ),
        // Cumulative totals: 1, 10, 50, 1 000 distinct content views.
        CONTENT_ID => ThresholdTable::from_widths(
            vec![1.0, 9.0, 40.0, 950.0],
            strings(&[
                "Content Consumer",
                "Regular Content Consumer",
                "Avid Content Consumer",
                "Content Consumer Extraordinaire",
            ]),
            strings(&[
                "Look at your first piece of content.",
                "Look at 10 different pieces of content.",
                "Look at 50 different pieces of content.",
                "Look at 1 000 different pieces of content.",
            ]),
            strings(&[
                "images/content-1.png",
                "images/content-2.png",
                "images/content-3.png",
                "images/content-4.png",
            ]),
            None,
        ),
        _ => return None,
    };

    match table {
        Ok(table) => Some(table),
        // Unreachable for the tables above; surfaced loudly if a definition
        // edit ever breaks validation.
        Err(err) => {
            tracing::error!(id, error = %err, "built-in achievement definition is invalid");
            None
        }
    }
}

/// Fresh built-in achievements at level 0.
pub fn default_achievements() -> Result<Vec<Achievement>, TrackerError> {
    PROTECTED_IDS
        .iter()
        .map(|id| {
            let table = definition(id).ok_or_else(|| {
                TrackerError::InvalidDefinition(format!("missing built-in definition for {id:?}"))
            })?;
            Ok(Achievement::new(*id, table))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_built_in_definitions_are_valid() {
        for id in PROTECTED_IDS {
            let table = definition(id).expect("definition exists");
            assert!(table.len() >= 4, "{id} should have at least 4 levels");
        }
        assert!(definition("custom").is_none());
    }

    #[test]
    fn cumulative_totals_match_descriptions() {
        let moves = definition(MOVE_ID).expect("move");
        assert_eq!(moves.prefix_width(1), 1.0);
        assert_eq!(moves.total_width(), 1_000_000.0);

        let time = definition(TIME_ID).expect("time");
        assert_eq!(time.prefix_width(1), 60_000.0);
        assert_eq!(time.total_width(), 86_400_000.0);
    }

    #[test]
    fn protected_classification() {
        assert!(is_protected("move"));
        assert!(is_protected("content"));
        assert!(!is_protected("all"));
        assert!(!is_protected("custom"));
    }

    #[test]
    fn default_achievements_start_fresh() {
        let defaults = default_achievements().expect("defaults");
        assert_eq!(defaults.len(), PROTECTED_IDS.len());
        for ach in &defaults {
            assert_eq!(ach.level(), 0);
            assert_eq!(ach.cumulative_progress(), 0.0);
            assert!(!ach.is_maxed());
        }
    }
}
