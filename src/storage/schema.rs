//! SQLite schema for the league database.
//!
//! Table and column names are the read contract with the league's web
//! frontend and must stay exactly as they are:
//! - Pilots: identity, rating, and aggregated statistics
//! - Competitions: named championships
//! - Races: one row per (track, date, class, split, competition)
//! - RaceParticipants: per-pilot results with rating snapshots
//! - TrackRecords: best-ever laps per normalized track name

use rusqlite::{Connection, Result};

/// Create all tables in the database.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS Pilots (
            UUID TEXT PRIMARY KEY,
            Name TEXT NOT NULL UNIQUE,
            EloRanking REAL NOT NULL,
            RaceCount INTEGER NOT NULL DEFAULT 0,
            AverageChange REAL NOT NULL DEFAULT 0,
            Wins INTEGER NOT NULL DEFAULT 0,
            Podiums INTEGER NOT NULL DEFAULT 0,
            Top5 INTEGER NOT NULL DEFAULT 0,
            Top10 INTEGER NOT NULL DEFAULT 0,
            PodiumPercentage REAL NOT NULL DEFAULT 0
        )
        "#,
        [],
    )?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS Competitions (
            UUID TEXT PRIMARY KEY,
            Name TEXT NOT NULL UNIQUE
        )
        "#,
        [],
    )?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS Races (
            UUID TEXT PRIMARY KEY,
            CompetitionUUID TEXT NOT NULL REFERENCES Competitions(UUID),
            TrackName TEXT NOT NULL,
            StartDate TEXT NOT NULL,
            Class TEXT NOT NULL,
            Split INTEGER NOT NULL,
            BestQualifyingLapTime TEXT,
            BestQualifyingLapPilot TEXT,
            BestRaceLapTime TEXT,
            BestRaceLapPilot TEXT,
            UNIQUE(TrackName, StartDate, Class, Split, CompetitionUUID)
        )
        "#,
        [],
    )?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS RaceParticipants (
            UUID TEXT PRIMARY KEY,
            CompetitionUUID TEXT NOT NULL REFERENCES Competitions(UUID),
            RaceUUID TEXT NOT NULL REFERENCES Races(UUID),
            PilotUUID TEXT NOT NULL REFERENCES Pilots(UUID),
            Place TEXT NOT NULL,
            EloAtRace REAL NOT NULL,
            EloChange REAL NOT NULL,
            UNIQUE(RaceUUID, PilotUUID)
        )
        "#,
        [],
    )?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS TrackRecords (
            TrackName TEXT PRIMARY KEY,
            BestQualifyingLapTime TEXT,
            BestQualifyingLapPilot TEXT,
            BestRaceLapTime TEXT,
            BestRaceLapPilot TEXT
        )
        "#,
        [],
    )?;

    Ok(())
}
