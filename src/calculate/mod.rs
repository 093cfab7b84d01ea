//! Statistics aggregation.
//!
//! Recomputes each pilot's counters from their full participation history.
//! Every counter is overwritten unconditionally, which makes the pass
//! idempotent and safe to run either incrementally (pilots touched by an
//! import) or over the whole corpus.

use rusqlite::Connection;
use tracing::{debug, info};

use crate::models::{PilotId, PilotStatistics};
use crate::storage::{self, Database, StorageError};

/// Tally recorded places into statistics counters.
///
/// Places that do not parse as integers (DNF, DSQ, blanks) still count as
/// entered races but are excluded from every placement counter.
pub fn tally_places<'a, I>(places: I) -> PilotStatistics
where
    I: IntoIterator<Item = &'a str>,
{
    let mut stats = PilotStatistics::default();

    for place in places {
        stats.race_count += 1;
        let Ok(place) = place.trim().parse::<u32>() else {
            continue;
        };
        if place == 1 {
            stats.wins += 1;
        }
        if (1..=3).contains(&place) {
            stats.podiums += 1;
        }
        if (1..=5).contains(&place) {
            stats.top5 += 1;
        }
        if (1..=10).contains(&place) {
            stats.top10 += 1;
        }
    }

    stats.podium_percentage = podium_percentage(stats.podiums, stats.race_count);
    stats
}

/// `podiums / race_count * 100`, rounded to 2 decimals; 0 for an empty
/// history.
pub fn podium_percentage(podiums: u32, race_count: u32) -> f64 {
    if race_count == 0 {
        return 0.0;
    }
    let pct = podiums as f64 / race_count as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}

/// Recompute and store one pilot's statistics from scratch.
pub fn update_pilot_statistics(conn: &Connection, pilot_id: &PilotId) -> Result<(), StorageError> {
    let places = storage::pilot_places(conn, pilot_id)?;
    let stats = tally_places(places.iter().map(String::as_str));

    storage::set_pilot_statistics(conn, pilot_id, &stats)?;
    debug!(
        "Statistics for pilot {}: {} races, {} wins, {} podiums ({}%)",
        pilot_id, stats.race_count, stats.wins, stats.podiums, stats.podium_percentage
    );
    Ok(())
}

/// Full-corpus recompute: every pilot in the database, one transaction.
pub fn recalculate_all(db: &mut Database) -> Result<usize, StorageError> {
    let tx = db.transaction()?;

    let pilots = storage::all_pilot_ids(&tx)?;
    if pilots.is_empty() {
        info!("No pilots in the database; nothing to recompute");
        tx.commit()?;
        return Ok(0);
    }

    for pilot_id in &pilots {
        update_pilot_statistics(&tx, pilot_id)?;
    }

    tx.commit()?;
    info!("Recomputed statistics for {} pilots", pilots.len());
    Ok(pilots.len())
}
