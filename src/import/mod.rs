//! Import orchestration.
//!
//! One invocation imports every sheet found in the input directory inside a
//! single all-or-nothing transaction: races and their participants are
//! persisted together, ratings are applied once the field is complete, and
//! statistics plus track records follow. Any error rolls the whole batch
//! back; the operator fixes the input and re-runs.

use std::collections::HashSet;
use std::path::Path;

use rusqlite::Connection;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::calculate;
use crate::ingest::{self, IngestError};
use crate::models::{PilotId, Race, RaceParticipant, RaceSheet};
use crate::rating;
use crate::records;
use crate::storage::{self, Database, StorageError};

/// Errors that abort an import batch.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("duplicate pilot '{pilot}' in race results: {descriptor}")]
    DuplicatePilot { pilot: String, descriptor: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Ingest(#[from] IngestError),
}

/// What one import run did.
#[derive(Debug, Clone, Default)]
pub struct ImportOutcome {
    /// Sheets imported (including re-imports that changed nothing)
    pub files_imported: usize,

    /// Files rejected during ingestion
    pub files_skipped: usize,

    /// Races newly created
    pub races_created: usize,

    /// Races that already existed and were reused
    pub races_reused: usize,

    /// Participant rows newly inserted
    pub participants_added: usize,

    /// Pilots whose rating or statistics were refreshed
    pub pilots_updated: usize,
}

/// Ingest every spreadsheet in `input_dir` and apply it to the database.
pub fn run_import(db: &mut Database, input_dir: &Path) -> Result<ImportOutcome, ImportError> {
    info!("Importing spreadsheets from {:?}", input_dir);
    let (sheets, files_skipped) = ingest::load_sheets(input_dir)?;

    let mut outcome = import_sheets(db, &sheets)?;
    outcome.files_skipped += files_skipped;
    Ok(outcome)
}

/// Apply already-parsed sheets inside one transaction.
pub fn import_sheets(
    db: &mut Database,
    sheets: &[RaceSheet],
) -> Result<ImportOutcome, ImportError> {
    let mut outcome = ImportOutcome::default();
    if sheets.is_empty() {
        info!("No importable sheets found");
        return Ok(outcome);
    }

    let tx = db.transaction()?;
    let mut touched: HashSet<PilotId> = HashSet::new();

    for sheet in sheets {
        // The transaction rolls back on drop, so an error here leaves
        // nothing of the batch behind.
        import_sheet(&tx, sheet, &mut outcome, &mut touched)?;
    }

    outcome.pilots_updated = touched.len();
    tx.commit().map_err(StorageError::from)?;

    info!(
        "Import complete: {} sheets, {} new races, {} participants, {} pilots updated",
        outcome.files_imported,
        outcome.races_created,
        outcome.participants_added,
        outcome.pilots_updated
    );
    Ok(outcome)
}

fn import_sheet(
    conn: &Connection,
    sheet: &RaceSheet,
    outcome: &mut ImportOutcome,
    touched: &mut HashSet<PilotId>,
) -> Result<(), ImportError> {
    if let Some(pilot) = sheet.find_duplicate_pilot() {
        return Err(ImportError::DuplicatePilot {
            pilot: pilot.to_string(),
            descriptor: sheet.descriptor(),
        });
    }

    let competition_id = storage::get_or_create_competition(conn, &sheet.competition_name)?;

    let existing = storage::find_race(
        conn,
        &competition_id,
        &sheet.track_name,
        sheet.start_date,
        &sheet.class,
        sheet.split,
    )?;

    let (race_id, race_is_new) = match existing {
        Some(race_id) => {
            info!("Race already exists: {}", sheet.descriptor());
            let (quali, race_lap) = storage::race_best_laps(conn, &race_id)?;
            if quali != sheet.best_qualifying_lap_time || race_lap != sheet.best_race_lap_time {
                // The stored race wins; a re-import never rewrites it.
                warn!(
                    "Best-lap fields in {} differ from the stored race; keeping stored values",
                    sheet.descriptor()
                );
            }
            (race_id, false)
        }
        None => {
            let race = Race::new(
                competition_id.clone(),
                sheet.track_name.clone(),
                sheet.start_date,
                sheet.class.clone(),
                sheet.split,
            )
            .with_best_qualifying(
                sheet.best_qualifying_lap_time.clone(),
                sheet.best_qualifying_lap_pilot.clone(),
            )
            .with_best_race_lap(
                sheet.best_race_lap_time.clone(),
                sheet.best_race_lap_pilot.clone(),
            );
            storage::insert_race(conn, &race)?;
            info!("New race: {}", sheet.descriptor());
            (race.id, true)
        }
    };

    let mut field_pilots = Vec::new();
    for result in &sheet.results {
        let pilot_id = storage::get_or_create_pilot(conn, &result.pilot_name)?;
        field_pilots.push(pilot_id.clone());

        if storage::participant_exists(conn, &race_id, &pilot_id)? {
            debug!(
                "Pilot {} already recorded for {}",
                result.pilot_name,
                sheet.descriptor()
            );
            continue;
        }

        let rating = storage::pilot_rating(conn, &pilot_id)?;
        let participant = RaceParticipant::new(
            race_id.clone(),
            competition_id.clone(),
            pilot_id,
            result.place.clone(),
            rating,
        );
        storage::insert_participant(conn, &participant)?;
        outcome.participants_added += 1;
    }

    // Ratings move exactly once, when the race first becomes known; a
    // re-imported race must not move them again.
    if race_is_new {
        let rated = rating::apply_race_ratings(conn, &race_id, sheet.split)?;
        touched.extend(rated);
        outcome.races_created += 1;
    } else {
        outcome.races_reused += 1;
    }

    for pilot_id in &field_pilots {
        calculate::update_pilot_statistics(conn, pilot_id)?;
        touched.insert(pilot_id.clone());
    }

    records::apply_track_records(conn, sheet)?;

    outcome.files_imported += 1;
    Ok(())
}
