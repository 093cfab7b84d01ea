//! Parsed race-sheet model.
//!
//! A `RaceSheet` is the normalized form of one imported workbook: race
//! metadata from the first data row plus one result entry per pilot.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One result row: a finishing place and the pilot who took it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetResult {
    /// Finishing place as written in the sheet
    pub place: String,

    /// Pilot display name
    pub pilot_name: String,
}

/// One race extracted from a spreadsheet file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceSheet {
    /// Competition name
    pub competition_name: String,

    /// Track name as written (may carry a layout suffix)
    pub track_name: String,

    /// Race start date
    pub start_date: NaiveDate,

    /// Car class
    pub class: String,

    /// Skill tier (1 = Pro, 2 = Am)
    pub split: i64,

    /// Best qualifying lap, canonical "mm:ss.mmm"
    pub best_qualifying_lap_time: Option<String>,

    /// Pilot who set the best qualifying lap
    pub best_qualifying_lap_pilot: Option<String>,

    /// Best race lap, canonical "mm:ss.mmm"
    pub best_race_lap_time: Option<String>,

    /// Pilot who set the best race lap
    pub best_race_lap_pilot: Option<String>,

    /// Result rows, in original sheet order
    pub results: Vec<SheetResult>,
}

impl RaceSheet {
    /// First pilot name that appears more than once in the result rows.
    ///
    /// A duplicate aborts the whole import, so detection runs before any row
    /// of the sheet is persisted.
    pub fn find_duplicate_pilot(&self) -> Option<&str> {
        let mut seen = std::collections::HashSet::new();
        for result in &self.results {
            if !seen.insert(result.pilot_name.as_str()) {
                return Some(result.pilot_name.as_str());
            }
        }
        None
    }

    /// Human-readable descriptor used in operator-facing errors.
    pub fn descriptor(&self) -> String {
        format!(
            "{}, {} on {} (class {}, split {})",
            self.competition_name, self.track_name, self.start_date, self.class, self.split
        )
    }
}
