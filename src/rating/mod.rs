//! Elo rating engine.
//!
//! Ratings move once per race: every pilot in the field is scored against
//! the field's mean rating, and the actual score interpolates linearly over
//! finishing places. Because expectation is taken against the field mean
//! rather than pairwise, the deltas of one race do not sum to zero; that is
//! an accepted property of the model.

use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::models::{PilotId, RaceId};
use crate::storage::{self, StorageError};

/// K-factor by field size and skill split.
///
/// Larger fields and the Pro split move ratings faster; unknown splits get
/// a flat 16.
pub fn k_factor(field_size: usize, split: i64) -> f64 {
    match split {
        1 => match field_size {
            n if n >= 10 => 32.0,
            n if n >= 5 => 24.0,
            _ => 16.0,
        },
        2 => match field_size {
            n if n >= 10 => 24.0,
            n if n >= 5 => 16.0,
            _ => 8.0,
        },
        _ => 16.0,
    }
}

/// Logistic Elo expectation of a pilot against the field mean.
pub fn expected_score(rating: f64, field_mean: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((field_mean - rating) / 400.0))
}

/// Actual score from a finishing place: first scores 1.0, last scores 0.0,
/// interpolated linearly in between. A single-pilot field scores 1.0.
///
/// Two entries recorded with the same place receive the same score; the
/// formula depends only on the recorded place, never on iteration order.
pub fn actual_score(place: u32, field_size: usize) -> f64 {
    if field_size <= 1 {
        return 1.0;
    }
    1.0 - (place.saturating_sub(1)) as f64 / (field_size - 1) as f64
}

/// One scorable entry of a race field.
#[derive(Debug, Clone)]
pub struct FieldEntry {
    pub pilot_id: PilotId,
    pub place: u32,
    pub rating: f64,
}

/// The computed outcome for one pilot.
#[derive(Debug, Clone)]
pub struct RatingUpdate {
    pub pilot_id: PilotId,
    /// Rating going into the race
    pub elo_at_race: f64,
    /// Rating after the race
    pub new_rating: f64,
    /// `new_rating - elo_at_race`
    pub change: f64,
}

/// Score a complete race field. Pure; persistence happens in
/// [`apply_race_ratings`].
pub fn rate_field(entries: &[FieldEntry], split: i64) -> Vec<RatingUpdate> {
    if entries.is_empty() {
        return Vec::new();
    }

    let k = k_factor(entries.len(), split);
    let field_mean = entries.iter().map(|e| e.rating).sum::<f64>() / entries.len() as f64;

    entries
        .iter()
        .map(|entry| {
            let expected = expected_score(entry.rating, field_mean);
            let actual = actual_score(entry.place, entries.len());
            let new_rating = entry.rating + k * (actual - expected);
            RatingUpdate {
                pilot_id: entry.pilot_id.clone(),
                elo_at_race: entry.rating,
                new_rating,
                change: new_rating - entry.rating,
            }
        })
        .collect()
}

/// Apply rating updates for one race and refresh each affected pilot's
/// mean delta. Returns the pilots that were updated.
///
/// Only participants whose place parses as an integer enter the
/// computation; the rest keep their snapshot row untouched.
pub fn apply_race_ratings(
    conn: &Connection,
    race_id: &RaceId,
    split: i64,
) -> Result<Vec<PilotId>, StorageError> {
    let field = storage::race_field(conn, race_id)?;
    if field.is_empty() {
        debug!("Race {} has no participants to rate", race_id);
        return Ok(Vec::new());
    }

    let mut entries = Vec::with_capacity(field.len());
    for row in &field {
        match row.place.trim().parse::<u32>() {
            Ok(place) => entries.push(FieldEntry {
                pilot_id: row.pilot_id.clone(),
                place,
                rating: row.rating,
            }),
            Err(_) => warn!(
                "Pilot {} has non-numeric place '{}'; excluded from rating",
                row.pilot_name, row.place
            ),
        }
    }

    let updates = rate_field(&entries, split);
    for update in &updates {
        storage::update_pilot_rating(conn, &update.pilot_id, update.new_rating)?;
        storage::set_participant_result(
            conn,
            race_id,
            &update.pilot_id,
            update.elo_at_race,
            update.change,
        )?;
        debug!(
            "Rated pilot {}: {:.2} -> {:.2} ({:+.2})",
            update.pilot_id, update.elo_at_race, update.new_rating, update.change
        );
    }

    // Mean delta is recomputed over the full history rather than nudged
    // incrementally, so repeated runs cannot drift.
    for update in &updates {
        let changes = storage::pilot_elo_changes(conn, &update.pilot_id)?;
        let average = if changes.is_empty() {
            0.0
        } else {
            changes.iter().sum::<f64>() / changes.len() as f64
        };
        storage::set_pilot_average_change(conn, &update.pilot_id, average)?;
    }

    info!("Ratings updated for race {}", race_id);
    Ok(updates.into_iter().map(|u| u.pilot_id).collect())
}
