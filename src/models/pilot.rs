//! Pilot model.

use serde::{Deserialize, Serialize};

use super::{EntityId, PilotId};

/// Rating assigned to a pilot on first appearance.
pub const INITIAL_RATING: f64 = 1500.0;

/// A league pilot and their cumulative record.
///
/// Statistics counters are always a pure function of the pilot's full
/// participation history; the aggregator overwrites them wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pilot {
    /// Unique identifier (derived from the display name)
    pub id: PilotId,

    /// Display name (unique across the league)
    pub name: String,

    /// Current Elo rating
    pub rating: f64,

    /// Races entered
    pub race_count: u32,

    /// First-place finishes
    pub wins: u32,

    /// Finishes in places 1-3
    pub podiums: u32,

    /// Finishes in places 1-5
    pub top5: u32,

    /// Finishes in places 1-10
    pub top10: u32,

    /// Podium share of entered races, as a percentage
    pub podium_percentage: f64,

    /// Mean rating delta across the full history
    pub average_change: f64,
}

impl Pilot {
    /// Create a new pilot with the initial rating and zeroed counters.
    pub fn new(name: String) -> Self {
        let id = EntityId::generate(&["pilot", &name]);

        Self {
            id,
            name,
            rating: INITIAL_RATING,
            race_count: 0,
            wins: 0,
            podiums: 0,
            top5: 0,
            top10: 0,
            podium_percentage: 0.0,
            average_change: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_pilot_defaults() {
        let pilot = Pilot::new("K. Raikkonen".to_string());

        assert_eq!(pilot.name, "K. Raikkonen");
        assert_eq!(pilot.rating, INITIAL_RATING);
        assert_eq!(pilot.race_count, 0);
        assert_eq!(pilot.wins, 0);
        assert_eq!(pilot.podium_percentage, 0.0);
        assert_eq!(pilot.average_change, 0.0);
    }

    #[test]
    fn test_pilot_id_deterministic_by_name() {
        let a = Pilot::new("K. Raikkonen".to_string());
        let b = Pilot::new("K. Raikkonen".to_string());
        let c = Pilot::new("M. Hakkinen".to_string());

        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn test_pilot_serialization() {
        let pilot = Pilot::new("K. Raikkonen".to_string());
        let json = serde_json::to_string(&pilot).unwrap();
        let deserialized: Pilot = serde_json::from_str(&json).unwrap();

        assert_eq!(pilot.id, deserialized.id);
        assert_eq!(pilot.rating, deserialized.rating);
    }
}
