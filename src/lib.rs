//! # Grid Ledger
//!
//! Offline batch updater for a sim-racing league: ingests race-result
//! spreadsheets and maintains Elo ratings, per-pilot statistics, and track
//! records in the SQLite database the league's web frontend reads.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (pilots, races, participants, sheets)
//! - **ingest**: Spreadsheet reading and normalization
//! - **storage**: SQLite schema and row-level queries
//! - **rating**: Elo rating engine
//! - **calculate**: Statistics aggregation
//! - **records**: Track record maintenance
//! - **import**: Transactional import orchestration
//! - **config**: Configuration loading and validation

pub mod calculate;
pub mod config;
pub mod import;
pub mod ingest;
pub mod models;
pub mod rating;
pub mod records;
pub mod storage;

pub use models::*;
