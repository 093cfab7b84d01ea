//! Race participation model.

use serde::{Deserialize, Serialize};

use super::{CompetitionId, EntityId, ParticipantId, PilotId, RaceId};

/// One pilot's entry in one race.
///
/// `elo_at_race` snapshots the rating before the race's update was applied,
/// so a pilot's rating curve can be rebuilt exactly from history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceParticipant {
    /// Unique identifier (derived from race + pilot)
    pub id: ParticipantId,

    /// Race entered
    pub race_id: RaceId,

    /// Competition the race belongs to
    pub competition_id: CompetitionId,

    /// The pilot
    pub pilot_id: PilotId,

    /// Finishing place as recorded in the sheet ("1", "2", "DNF", ...)
    pub place: String,

    /// Rating before this race's update
    pub elo_at_race: f64,

    /// Rating delta applied for this race
    pub elo_change: f64,
}

impl RaceParticipant {
    /// Create a new participant row with auto-generated ID.
    ///
    /// The rating snapshot starts at the pilot's current rating with a zero
    /// delta; the rating engine finalizes both once the field is complete.
    pub fn new(
        race_id: RaceId,
        competition_id: CompetitionId,
        pilot_id: PilotId,
        place: String,
        current_rating: f64,
    ) -> Self {
        let id = EntityId::generate(&["participant", race_id.as_str(), pilot_id.as_str()]);

        Self {
            id,
            race_id,
            competition_id,
            pilot_id,
            place,
            elo_at_race: current_rating,
            elo_change: 0.0,
        }
    }

    /// Finishing place as an integer, when it parses as one.
    ///
    /// Entries like "DNF" or "DSQ" yield `None` and are excluded from both
    /// the rating computation and the statistics counters.
    pub fn place_number(&self) -> Option<u32> {
        self.place.trim().parse().ok()
    }
}
