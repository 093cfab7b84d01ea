//! Competition and race models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{CompetitionId, EntityId, RaceId};

/// A named competition (championship, cup, one-off series).
///
/// Created the first time a spreadsheet references the name; immutable
/// afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Competition {
    /// Unique identifier (derived from the name)
    pub id: CompetitionId,

    /// Competition name (unique)
    pub name: String,
}

impl Competition {
    /// Create a new competition with auto-generated ID.
    pub fn new(name: String) -> Self {
        let id = EntityId::generate(&["competition", &name]);
        Self { id, name }
    }
}

/// A single race within a competition.
///
/// Identity is the tuple (track, date, class, split, competition); a second
/// sheet describing the same tuple resolves to the existing row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Race {
    /// Unique identifier (derived from the uniqueness tuple)
    pub id: RaceId,

    /// Owning competition
    pub competition_id: CompetitionId,

    /// Track name as written in the sheet
    pub track_name: String,

    /// Race start date
    pub start_date: NaiveDate,

    /// Car class (e.g. "GT3")
    pub class: String,

    /// Skill tier (1 = Pro, 2 = Am)
    pub split: i64,

    /// Best qualifying lap in the race, canonical "mm:ss.mmm"
    pub best_qualifying_lap_time: Option<String>,

    /// Pilot who set the best qualifying lap
    pub best_qualifying_lap_pilot: Option<String>,

    /// Best race lap, canonical "mm:ss.mmm"
    pub best_race_lap_time: Option<String>,

    /// Pilot who set the best race lap
    pub best_race_lap_pilot: Option<String>,
}

impl Race {
    /// Create a new race with an ID derived from the uniqueness tuple.
    pub fn new(
        competition_id: CompetitionId,
        track_name: String,
        start_date: NaiveDate,
        class: String,
        split: i64,
    ) -> Self {
        let id = EntityId::generate(&[
            "race",
            competition_id.as_str(),
            &track_name,
            &start_date.to_string(),
            &class,
            &split.to_string(),
        ]);

        Self {
            id,
            competition_id,
            track_name,
            start_date,
            class,
            split,
            best_qualifying_lap_time: None,
            best_qualifying_lap_pilot: None,
            best_race_lap_time: None,
            best_race_lap_pilot: None,
        }
    }

    /// Builder method to set the qualifying-lap record.
    pub fn with_best_qualifying(mut self, time: Option<String>, pilot: Option<String>) -> Self {
        self.best_qualifying_lap_time = time;
        self.best_qualifying_lap_pilot = pilot;
        self
    }

    /// Builder method to set the race-lap record.
    pub fn with_best_race_lap(mut self, time: Option<String>, pilot: Option<String>) -> Self {
        self.best_race_lap_time = time;
        self.best_race_lap_pilot = pilot;
        self
    }

    /// Human-readable descriptor used in operator-facing errors.
    pub fn descriptor(&self) -> String {
        format!(
            "{} on {} (class {}, split {})",
            self.track_name, self.start_date, self.class, self.split
        )
    }
}
