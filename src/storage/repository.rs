//! Row-level queries for the league tables.
//!
//! Functions take a plain `&Connection` so the same code runs inside an
//! import transaction (via deref from `Transaction`) or standalone for
//! read-only commands.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

use crate::models::{
    Competition, CompetitionId, Pilot, PilotId, PilotStatistics, Race, RaceId, RaceParticipant,
    TrackRecord,
};

use super::StorageError;

/// One participant row joined with the pilot's current rating, as the
/// rating engine consumes it.
#[derive(Debug, Clone)]
pub struct FieldRow {
    pub pilot_id: PilotId,
    pub pilot_name: String,
    pub place: String,
    pub rating: f64,
}

fn row_to_pilot(row: &Row<'_>) -> rusqlite::Result<Pilot> {
    Ok(Pilot {
        id: PilotId::new(row.get::<_, String>(0)?),
        name: row.get(1)?,
        rating: row.get(2)?,
        race_count: row.get(3)?,
        average_change: row.get(4)?,
        wins: row.get(5)?,
        podiums: row.get(6)?,
        top5: row.get(7)?,
        top10: row.get(8)?,
        podium_percentage: row.get(9)?,
    })
}

// ==================== Pilots ====================

/// Look up a pilot id by exact display name.
pub fn find_pilot_by_name(conn: &Connection, name: &str) -> Result<Option<PilotId>, StorageError> {
    let id = conn
        .query_row(
            "SELECT UUID FROM Pilots WHERE Name = ?1",
            params![name],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(id.map(PilotId::new))
}

/// Insert a new pilot row.
pub fn insert_pilot(conn: &Connection, pilot: &Pilot) -> Result<(), StorageError> {
    conn.execute(
        r#"
        INSERT INTO Pilots
        (UUID, Name, EloRanking, RaceCount, AverageChange, Wins, Podiums, Top5, Top10, PodiumPercentage)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
        params![
            pilot.id.as_str(),
            pilot.name,
            pilot.rating,
            pilot.race_count,
            pilot.average_change,
            pilot.wins,
            pilot.podiums,
            pilot.top5,
            pilot.top10,
            pilot.podium_percentage,
        ],
    )?;
    Ok(())
}

/// Exact-name lookup or create. Idempotent across races and runs.
pub fn get_or_create_pilot(conn: &Connection, name: &str) -> Result<PilotId, StorageError> {
    if let Some(id) = find_pilot_by_name(conn, name)? {
        return Ok(id);
    }

    let pilot = Pilot::new(name.to_string());
    insert_pilot(conn, &pilot)?;
    info!(
        "New pilot: {} with initial rating {}",
        pilot.name, pilot.rating
    );
    Ok(pilot.id)
}

/// Current rating of a pilot.
pub fn pilot_rating(conn: &Connection, pilot_id: &PilotId) -> Result<f64, StorageError> {
    Ok(conn.query_row(
        "SELECT EloRanking FROM Pilots WHERE UUID = ?1",
        params![pilot_id.as_str()],
        |row| row.get(0),
    )?)
}

/// Store a pilot's new current rating.
pub fn update_pilot_rating(
    conn: &Connection,
    pilot_id: &PilotId,
    rating: f64,
) -> Result<(), StorageError> {
    conn.execute(
        "UPDATE Pilots SET EloRanking = ?1 WHERE UUID = ?2",
        params![rating, pilot_id.as_str()],
    )?;
    Ok(())
}

/// Store a pilot's recomputed mean rating delta.
pub fn set_pilot_average_change(
    conn: &Connection,
    pilot_id: &PilotId,
    average_change: f64,
) -> Result<(), StorageError> {
    conn.execute(
        "UPDATE Pilots SET AverageChange = ?1 WHERE UUID = ?2",
        params![average_change, pilot_id.as_str()],
    )?;
    Ok(())
}

/// Overwrite a pilot's aggregated statistics counters.
pub fn set_pilot_statistics(
    conn: &Connection,
    pilot_id: &PilotId,
    stats: &PilotStatistics,
) -> Result<(), StorageError> {
    conn.execute(
        r#"
        UPDATE Pilots
        SET Wins = ?1, Podiums = ?2, Top5 = ?3, Top10 = ?4, PodiumPercentage = ?5, RaceCount = ?6
        WHERE UUID = ?7
        "#,
        params![
            stats.wins,
            stats.podiums,
            stats.top5,
            stats.top10,
            stats.podium_percentage,
            stats.race_count,
            pilot_id.as_str(),
        ],
    )?;
    Ok(())
}

/// Every pilot id in the database.
pub fn all_pilot_ids(conn: &Connection) -> Result<Vec<PilotId>, StorageError> {
    let mut stmt = conn.prepare("SELECT UUID FROM Pilots")?;
    let ids = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids.into_iter().map(PilotId::new).collect())
}

/// Pilots ordered by current rating, best first.
pub fn top_pilots_by_rating(conn: &Connection, limit: usize) -> Result<Vec<Pilot>, StorageError> {
    let mut stmt = conn.prepare(
        r#"
        SELECT UUID, Name, EloRanking, RaceCount, AverageChange, Wins, Podiums, Top5, Top10, PodiumPercentage
        FROM Pilots
        ORDER BY EloRanking DESC
        LIMIT ?1
        "#,
    )?;
    let pilots = stmt
        .query_map(params![limit as i64], row_to_pilot)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(pilots)
}

// ==================== Competitions ====================

/// Exact-name lookup or create. No mutation once created.
pub fn get_or_create_competition(
    conn: &Connection,
    name: &str,
) -> Result<CompetitionId, StorageError> {
    let existing = conn
        .query_row(
            "SELECT UUID FROM Competitions WHERE Name = ?1",
            params![name],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok(CompetitionId::new(id));
    }

    let competition = Competition::new(name.to_string());
    conn.execute(
        "INSERT INTO Competitions (UUID, Name) VALUES (?1, ?2)",
        params![competition.id.as_str(), competition.name],
    )?;
    info!("New competition: {}", competition.name);
    Ok(competition.id)
}

// ==================== Races ====================

/// Look up a race by its uniqueness tuple.
pub fn find_race(
    conn: &Connection,
    competition_id: &CompetitionId,
    track_name: &str,
    start_date: NaiveDate,
    class: &str,
    split: i64,
) -> Result<Option<RaceId>, StorageError> {
    let id = conn
        .query_row(
            r#"
            SELECT UUID FROM Races
            WHERE TrackName = ?1 AND StartDate = ?2 AND Class = ?3 AND Split = ?4 AND CompetitionUUID = ?5
            "#,
            params![
                track_name,
                start_date.to_string(),
                class,
                split,
                competition_id.as_str()
            ],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(id.map(RaceId::new))
}

/// Insert a new race row.
pub fn insert_race(conn: &Connection, race: &Race) -> Result<(), StorageError> {
    conn.execute(
        r#"
        INSERT INTO Races
        (UUID, CompetitionUUID, TrackName, StartDate, Class, Split,
         BestQualifyingLapTime, BestQualifyingLapPilot, BestRaceLapTime, BestRaceLapPilot)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
        params![
            race.id.as_str(),
            race.competition_id.as_str(),
            race.track_name,
            race.start_date.to_string(),
            race.class,
            race.split,
            race.best_qualifying_lap_time,
            race.best_qualifying_lap_pilot,
            race.best_race_lap_time,
            race.best_race_lap_pilot,
        ],
    )?;
    Ok(())
}

/// Stored best-lap fields of an existing race, for divergence warnings.
pub fn race_best_laps(
    conn: &Connection,
    race_id: &RaceId,
) -> Result<(Option<String>, Option<String>), StorageError> {
    Ok(conn.query_row(
        "SELECT BestQualifyingLapTime, BestRaceLapTime FROM Races WHERE UUID = ?1",
        params![race_id.as_str()],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?)
}

// ==================== Participants ====================

/// Whether a (race, pilot) pair is already recorded.
pub fn participant_exists(
    conn: &Connection,
    race_id: &RaceId,
    pilot_id: &PilotId,
) -> Result<bool, StorageError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM RaceParticipants WHERE RaceUUID = ?1 AND PilotUUID = ?2",
        params![race_id.as_str(), pilot_id.as_str()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Insert a participant row.
pub fn insert_participant(
    conn: &Connection,
    participant: &RaceParticipant,
) -> Result<(), StorageError> {
    conn.execute(
        r#"
        INSERT INTO RaceParticipants
        (UUID, CompetitionUUID, RaceUUID, PilotUUID, Place, EloAtRace, EloChange)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            participant.id.as_str(),
            participant.competition_id.as_str(),
            participant.race_id.as_str(),
            participant.pilot_id.as_str(),
            participant.place,
            participant.elo_at_race,
            participant.elo_change,
        ],
    )?;
    Ok(())
}

/// The full field of a race, joined with each pilot's current rating.
pub fn race_field(conn: &Connection, race_id: &RaceId) -> Result<Vec<FieldRow>, StorageError> {
    let mut stmt = conn.prepare(
        r#"
        SELECT rp.PilotUUID, p.Name, rp.Place, p.EloRanking
        FROM RaceParticipants rp
        JOIN Pilots p ON p.UUID = rp.PilotUUID
        WHERE rp.RaceUUID = ?1
        "#,
    )?;
    let rows = stmt
        .query_map(params![race_id.as_str()], |row| {
            Ok(FieldRow {
                pilot_id: PilotId::new(row.get::<_, String>(0)?),
                pilot_name: row.get(1)?,
                place: row.get(2)?,
                rating: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Finalize a participant row with the pre-race snapshot and applied delta.
pub fn set_participant_result(
    conn: &Connection,
    race_id: &RaceId,
    pilot_id: &PilotId,
    elo_at_race: f64,
    elo_change: f64,
) -> Result<(), StorageError> {
    conn.execute(
        "UPDATE RaceParticipants SET EloChange = ?1, EloAtRace = ?2 WHERE PilotUUID = ?3 AND RaceUUID = ?4",
        params![elo_change, elo_at_race, pilot_id.as_str(), race_id.as_str()],
    )?;
    Ok(())
}

/// Every rating delta in a pilot's history.
pub fn pilot_elo_changes(conn: &Connection, pilot_id: &PilotId) -> Result<Vec<f64>, StorageError> {
    let mut stmt =
        conn.prepare("SELECT EloChange FROM RaceParticipants WHERE PilotUUID = ?1")?;
    let changes = stmt
        .query_map(params![pilot_id.as_str()], |row| row.get::<_, f64>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(changes)
}

/// Every recorded finishing place in a pilot's history.
pub fn pilot_places(conn: &Connection, pilot_id: &PilotId) -> Result<Vec<String>, StorageError> {
    let mut stmt = conn.prepare("SELECT Place FROM RaceParticipants WHERE PilotUUID = ?1")?;
    let places = stmt
        .query_map(params![pilot_id.as_str()], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(places)
}

// ==================== Track records ====================

/// Stored record for a normalized track name.
pub fn get_track_record(
    conn: &Connection,
    track_name: &str,
) -> Result<Option<TrackRecord>, StorageError> {
    let record = conn
        .query_row(
            r#"
            SELECT TrackName, BestQualifyingLapTime, BestQualifyingLapPilot, BestRaceLapTime, BestRaceLapPilot
            FROM TrackRecords WHERE TrackName = ?1
            "#,
            params![track_name],
            |row| {
                Ok(TrackRecord {
                    track_name: row.get(0)?,
                    best_qualifying_lap_time: row.get(1)?,
                    best_qualifying_lap_pilot: row.get(2)?,
                    best_race_lap_time: row.get(3)?,
                    best_race_lap_pilot: row.get(4)?,
                })
            },
        )
        .optional()?;
    Ok(record)
}

/// Insert a fresh track record.
pub fn insert_track_record(conn: &Connection, record: &TrackRecord) -> Result<(), StorageError> {
    conn.execute(
        r#"
        INSERT INTO TrackRecords
        (TrackName, BestQualifyingLapTime, BestQualifyingLapPilot, BestRaceLapTime, BestRaceLapPilot)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
        params![
            record.track_name,
            record.best_qualifying_lap_time,
            record.best_qualifying_lap_pilot,
            record.best_race_lap_time,
            record.best_race_lap_pilot,
        ],
    )?;
    Ok(())
}

/// Overwrite the qualifying-lap best for a track.
pub fn set_track_qualifying_best(
    conn: &Connection,
    track_name: &str,
    time: &str,
    pilot: Option<&str>,
) -> Result<(), StorageError> {
    conn.execute(
        "UPDATE TrackRecords SET BestQualifyingLapTime = ?1, BestQualifyingLapPilot = ?2 WHERE TrackName = ?3",
        params![time, pilot, track_name],
    )?;
    Ok(())
}

/// Overwrite the race-lap best for a track.
pub fn set_track_race_best(
    conn: &Connection,
    track_name: &str,
    time: &str,
    pilot: Option<&str>,
) -> Result<(), StorageError> {
    conn.execute(
        "UPDATE TrackRecords SET BestRaceLapTime = ?1, BestRaceLapPilot = ?2 WHERE TrackName = ?3",
        params![time, pilot, track_name],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityId;
    use crate::storage::Database;

    #[test]
    fn test_get_or_create_pilot_idempotent() {
        let db = Database::in_memory().unwrap();
        let conn = db.connection();

        let first = get_or_create_pilot(conn, "A. Senna").unwrap();
        let second = get_or_create_pilot(conn, "A. Senna").unwrap();
        assert_eq!(first, second);

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM Pilots", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_new_pilot_starts_at_initial_rating() {
        let db = Database::in_memory().unwrap();
        let conn = db.connection();

        let id = get_or_create_pilot(conn, "A. Senna").unwrap();
        assert_eq!(pilot_rating(conn, &id).unwrap(), 1500.0);
    }

    #[test]
    fn test_get_or_create_competition_idempotent() {
        let db = Database::in_memory().unwrap();
        let conn = db.connection();

        let first = get_or_create_competition(conn, "GT World Series").unwrap();
        let second = get_or_create_competition(conn, "GT World Series").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_find_race_by_tuple() {
        let db = Database::in_memory().unwrap();
        let conn = db.connection();

        let comp = get_or_create_competition(conn, "GT World Series").unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let race = Race::new(comp.clone(), "Monza".to_string(), date, "GT3".to_string(), 1);
        insert_race(conn, &race).unwrap();

        let found = find_race(conn, &comp, "Monza", date, "GT3", 1).unwrap();
        assert_eq!(found, Some(race.id));

        let other_split = find_race(conn, &comp, "Monza", date, "GT3", 2).unwrap();
        assert_eq!(other_split, None);
    }

    #[test]
    fn test_participant_roundtrip() {
        let db = Database::in_memory().unwrap();
        let conn = db.connection();

        let comp = get_or_create_competition(conn, "GT World Series").unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let race = Race::new(comp.clone(), "Monza".to_string(), date, "GT3".to_string(), 1);
        insert_race(conn, &race).unwrap();
        let pilot = get_or_create_pilot(conn, "A. Senna").unwrap();

        assert!(!participant_exists(conn, &race.id, &pilot).unwrap());

        let participant = RaceParticipant::new(
            race.id.clone(),
            comp.clone(),
            pilot.clone(),
            "1".to_string(),
            1500.0,
        );
        insert_participant(conn, &participant).unwrap();

        assert!(participant_exists(conn, &race.id, &pilot).unwrap());

        let field = race_field(conn, &race.id).unwrap();
        assert_eq!(field.len(), 1);
        assert_eq!(field[0].pilot_name, "A. Senna");
        assert_eq!(field[0].place, "1");
        assert_eq!(field[0].rating, 1500.0);
    }

    #[test]
    fn test_set_participant_result() {
        let db = Database::in_memory().unwrap();
        let conn = db.connection();

        let comp = get_or_create_competition(conn, "GT World Series").unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let race = Race::new(comp.clone(), "Monza".to_string(), date, "GT3".to_string(), 1);
        insert_race(conn, &race).unwrap();
        let pilot = get_or_create_pilot(conn, "A. Senna").unwrap();
        let participant = RaceParticipant::new(
            race.id.clone(),
            comp.clone(),
            pilot.clone(),
            "1".to_string(),
            1500.0,
        );
        insert_participant(conn, &participant).unwrap();

        set_participant_result(conn, &race.id, &pilot, 1500.0, 8.0).unwrap();

        let changes = pilot_elo_changes(conn, &pilot).unwrap();
        assert_eq!(changes, vec![8.0]);
    }

    #[test]
    fn test_top_pilots_by_rating_order() {
        let db = Database::in_memory().unwrap();
        let conn = db.connection();

        let a = get_or_create_pilot(conn, "A. Senna").unwrap();
        let b = get_or_create_pilot(conn, "A. Prost").unwrap();
        update_pilot_rating(conn, &a, 1520.0).unwrap();
        update_pilot_rating(conn, &b, 1540.0).unwrap();

        let top = top_pilots_by_rating(conn, 10).unwrap();
        assert_eq!(top[0].name, "A. Prost");
        assert_eq!(top[1].name, "A. Senna");
    }

    #[test]
    fn test_track_record_roundtrip() {
        let db = Database::in_memory().unwrap();
        let conn = db.connection();

        assert!(get_track_record(conn, "Monza").unwrap().is_none());

        let mut record = TrackRecord::new("Monza".to_string());
        record.best_race_lap_time = Some("01:42.500".to_string());
        record.best_race_lap_pilot = Some("A. Senna".to_string());
        insert_track_record(conn, &record).unwrap();

        set_track_race_best(conn, "Monza", "01:41.999", Some("A. Prost")).unwrap();

        let stored = get_track_record(conn, "Monza").unwrap().unwrap();
        assert_eq!(stored.best_race_lap_time.as_deref(), Some("01:41.999"));
        assert_eq!(stored.best_race_lap_pilot.as_deref(), Some("A. Prost"));
    }

    #[test]
    fn test_pilot_places_history() {
        let db = Database::in_memory().unwrap();
        let conn = db.connection();

        let comp = get_or_create_competition(conn, "GT World Series").unwrap();
        let pilot = get_or_create_pilot(conn, "A. Senna").unwrap();
        for (i, place) in ["1", "DNF", "3"].iter().enumerate() {
            let date = NaiveDate::from_ymd_opt(2024, 3, 10 + i as u32).unwrap();
            let race = Race::new(comp.clone(), "Monza".to_string(), date, "GT3".to_string(), 1);
            insert_race(conn, &race).unwrap();
            let participant = RaceParticipant::new(
                race.id.clone(),
                comp.clone(),
                pilot.clone(),
                place.to_string(),
                1500.0,
            );
            insert_participant(conn, &participant).unwrap();
        }

        let places = pilot_places(conn, &pilot).unwrap();
        assert_eq!(places.len(), 3);
        assert!(places.contains(&"DNF".to_string()));
    }

    #[test]
    fn test_all_pilot_ids() {
        let db = Database::in_memory().unwrap();
        let conn = db.connection();

        get_or_create_pilot(conn, "A. Senna").unwrap();
        get_or_create_pilot(conn, "A. Prost").unwrap();

        let ids = all_pilot_ids(conn).unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&EntityId::generate(&["pilot", "A. Senna"])));
    }
}
