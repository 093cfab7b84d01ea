//! Track record maintenance.
//!
//! One record row per normalized track name. Qualifying and race-lap bests
//! move independently, and only when the newly observed canonical
//! "mm:ss.mmm" time is strictly faster. Because that format is fixed-width
//! and zero-padded, plain string comparison orders times correctly.

use rusqlite::Connection;
use tracing::{debug, info};

use crate::models::{RaceSheet, TrackRecord};
use crate::storage::{self, StorageError};

/// Strip a trailing parenthesized layout suffix: "Spa (Reverse)" -> "Spa".
pub fn normalize_track_name(name: &str) -> String {
    let trimmed = name.trim();
    match trimmed.rfind('(') {
        Some(idx) if trimmed.ends_with(')') => trimmed[..idx].trim_end().to_string(),
        _ => trimmed.to_string(),
    }
}

/// Whether `candidate` beats `current` (missing current always loses).
pub fn is_faster(candidate: &str, current: Option<&str>) -> bool {
    match current {
        Some(current) => candidate < current,
        None => true,
    }
}

/// Fold one sheet's best laps into the track's record row.
pub fn apply_track_records(conn: &Connection, sheet: &RaceSheet) -> Result<(), StorageError> {
    let track = normalize_track_name(&sheet.track_name);

    let Some(existing) = storage::get_track_record(conn, &track)? else {
        let record = TrackRecord {
            track_name: track.clone(),
            best_qualifying_lap_time: sheet.best_qualifying_lap_time.clone(),
            best_qualifying_lap_pilot: sheet.best_qualifying_lap_pilot.clone(),
            best_race_lap_time: sheet.best_race_lap_time.clone(),
            best_race_lap_pilot: sheet.best_race_lap_pilot.clone(),
        };
        storage::insert_track_record(conn, &record)?;
        info!("New track record row for {}", track);
        return Ok(());
    };

    if let Some(time) = &sheet.best_qualifying_lap_time {
        if is_faster(time, existing.best_qualifying_lap_time.as_deref()) {
            storage::set_track_qualifying_best(
                conn,
                &track,
                time,
                sheet.best_qualifying_lap_pilot.as_deref(),
            )?;
            info!(
                "Qualifying record at {}: {} by {}",
                track,
                time,
                sheet.best_qualifying_lap_pilot.as_deref().unwrap_or("?")
            );
        } else {
            debug!("Qualifying lap {} does not beat record at {}", time, track);
        }
    }

    if let Some(time) = &sheet.best_race_lap_time {
        if is_faster(time, existing.best_race_lap_time.as_deref()) {
            storage::set_track_race_best(
                conn,
                &track,
                time,
                sheet.best_race_lap_pilot.as_deref(),
            )?;
            info!(
                "Race-lap record at {}: {} by {}",
                track,
                time,
                sheet.best_race_lap_pilot.as_deref().unwrap_or("?")
            );
        } else {
            debug!("Race lap {} does not beat record at {}", time, track);
        }
    }

    Ok(())
}
