//! Track record model.

use serde::{Deserialize, Serialize};

/// Best-ever lap times for a track, keyed by the normalized track name
/// (layout suffixes in parentheses stripped, so "Spa (Reverse)" and "Spa"
/// share one record).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackRecord {
    /// Normalized track name
    pub track_name: String,

    /// Fastest qualifying lap ever observed, canonical "mm:ss.mmm"
    pub best_qualifying_lap_time: Option<String>,

    /// Pilot who set the qualifying record
    pub best_qualifying_lap_pilot: Option<String>,

    /// Fastest race lap ever observed, canonical "mm:ss.mmm"
    pub best_race_lap_time: Option<String>,

    /// Pilot who set the race-lap record
    pub best_race_lap_pilot: Option<String>,
}

impl TrackRecord {
    /// Create an empty record for a track.
    pub fn new(track_name: String) -> Self {
        Self {
            track_name,
            best_qualifying_lap_time: None,
            best_qualifying_lap_pilot: None,
            best_race_lap_time: None,
            best_race_lap_pilot: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_record() {
        let record = TrackRecord::new("Monza".to_string());
        assert_eq!(record.track_name, "Monza");
        assert!(record.best_qualifying_lap_time.is_none());
        assert!(record.best_race_lap_time.is_none());
    }

    #[test]
    fn test_record_serialization() {
        let mut record = TrackRecord::new("Monza".to_string());
        record.best_race_lap_time = Some("01:42.500".to_string());
        record.best_race_lap_pilot = Some("A. Senna".to_string());

        let json = serde_json::to_string(&record).unwrap();
        let deserialized: TrackRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(
            deserialized.best_race_lap_time.as_deref(),
            Some("01:42.500")
        );
    }
}
