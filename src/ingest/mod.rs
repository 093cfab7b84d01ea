//! Spreadsheet ingestion.
//!
//! Reads every `*.xlsx` workbook in the input directory and normalizes each
//! into a [`RaceSheet`]. Workbook access goes through calamine; parsing
//! operates on an owned cell model so the column handling is testable
//! without fixture files.
//!
//! A malformed file is never fatal to the batch: it is skipped with a
//! logged reason and processing continues with the remaining files.

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Days, NaiveDate};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{RaceSheet, SheetResult};

/// Day 0 of the spreadsheet date serial.
const SHEET_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Columns that must be present and non-blank for a sheet to import.
const MANDATORY_COLUMNS: [&str; 5] = ["Competition Name", "Track Name", "Start Date", "Class", "Split"];

/// Errors for a single workbook. File-scoped: the caller logs and skips.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("no header row in {0}")]
    MissingHeader(PathBuf),

    #[error("missing column '{column}' in {path}")]
    MissingColumn { column: &'static str, path: PathBuf },

    #[error("mandatory field '{field}' is blank in {path}")]
    BlankField { field: &'static str, path: PathBuf },

    #[error("failed to read workbook {path}: {source}")]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("invalid input directory {0}")]
    InputDir(PathBuf),
}

/// One spreadsheet cell, reduced to what the importer cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

impl CellValue {
    fn from_cell(data: &Data) -> Self {
        match data {
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Number(if *b { 1.0 } else { 0.0 }),
            Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Empty | Data::Error(_) => CellValue::Empty,
        }
    }

    /// Cell content as trimmed text; whole numbers render without a
    /// fractional part ("1", not "1.0").
    pub fn text(&self) -> Option<String> {
        match self {
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            CellValue::Number(n) => {
                if n.fract() == 0.0 {
                    Some(format!("{}", *n as i64))
                } else {
                    Some(n.to_string())
                }
            }
            CellValue::Empty => None,
        }
    }

    /// Cell content as a number, parsing numeric text.
    pub fn number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse().ok(),
            CellValue::Empty => None,
        }
    }
}

/// Normalize a date cell to a calendar date.
///
/// Numeric cells are a day serial counted from 1899-12-30; text cells must
/// already be ISO `YYYY-MM-DD`.
pub fn convert_date(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::Number(serial) => {
            if *serial < 0.0 {
                return None;
            }
            let epoch = NaiveDate::from_ymd_opt(SHEET_EPOCH.0, SHEET_EPOCH.1, SHEET_EPOCH.2)?;
            epoch.checked_add_days(Days::new(*serial as u64))
        }
        CellValue::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok(),
        CellValue::Empty => None,
    }
}

/// Normalize a lap-time cell to canonical "mm:ss.mmm".
///
/// Numeric cells hold a fraction of a day; text cells pass through trimmed.
/// The fixed-width zero-padded form makes lexicographic order equal time
/// order, which the track-record comparison relies on.
pub fn convert_lap_time(cell: &CellValue) -> Option<String> {
    match cell {
        CellValue::Number(day_fraction) => Some(format_lap_time(*day_fraction)),
        CellValue::Text(_) | CellValue::Empty => cell.text(),
    }
}

fn format_lap_time(day_fraction: f64) -> String {
    // Rounding at millisecond precision carries into seconds, so values a
    // hair under a full second still format as a valid "mm:ss.mmm".
    let total_ms = (day_fraction * 24.0 * 60.0 * 60.0 * 1000.0).round() as i64;
    let minutes = total_ms / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{:02}:{:02}.{:03}", minutes, seconds, millis)
}

/// Read the first worksheet of a workbook into owned cell rows.
pub fn read_workbook(path: &Path) -> Result<Vec<Vec<CellValue>>, IngestError> {
    let mut workbook = open_workbook_auto(path).map_err(|source| IngestError::Workbook {
        path: path.to_path_buf(),
        source,
    })?;

    let range = match workbook.worksheet_range_at(0) {
        Some(Ok(range)) => range,
        Some(Err(source)) => {
            return Err(IngestError::Workbook {
                path: path.to_path_buf(),
                source,
            })
        }
        None => return Err(IngestError::MissingHeader(path.to_path_buf())),
    };

    let rows = range
        .rows()
        .map(|row| row.iter().map(CellValue::from_cell).collect())
        .collect();
    Ok(rows)
}

/// Parse one workbook's rows into a [`RaceSheet`].
///
/// Row 0 is the header; race metadata comes from the first data row; every
/// data row contributes one result when both place and pilot name are
/// present.
pub fn parse_sheet(path: &Path, rows: &[Vec<CellValue>]) -> Result<RaceSheet, IngestError> {
    let header = match rows.first() {
        Some(header) if !header.is_empty() => header,
        _ => return Err(IngestError::MissingHeader(path.to_path_buf())),
    };

    let column = |name: &'static str| -> Result<usize, IngestError> {
        header
            .iter()
            .position(|cell| cell.text().as_deref() == Some(name))
            .ok_or(IngestError::MissingColumn { column: name, path: path.to_path_buf() })
    };

    for name in MANDATORY_COLUMNS {
        column(name)?;
    }
    let place_col = column("Place")?;
    let pilot_col = column("Pilot Name")?;

    let cell = |row: usize, col: usize| -> CellValue {
        rows.get(row)
            .and_then(|r| r.get(col))
            .cloned()
            .unwrap_or(CellValue::Empty)
    };
    let meta = |name: &'static str| -> Result<CellValue, IngestError> {
        Ok(cell(1, column(name)?))
    };
    let mandatory_text = |name: &'static str| -> Result<String, IngestError> {
        meta(name)?
            .text()
            .ok_or(IngestError::BlankField { field: name, path: path.to_path_buf() })
    };

    let competition_name = mandatory_text("Competition Name")?;
    let track_name = mandatory_text("Track Name")?;
    let start_date = convert_date(&meta("Start Date")?).ok_or(IngestError::BlankField {
        field: "Start Date",
        path: path.to_path_buf(),
    })?;
    let class = mandatory_text("Class")?;
    let split = meta("Split")?.number().ok_or(IngestError::BlankField {
        field: "Split",
        path: path.to_path_buf(),
    })? as i64;

    // Optional best-lap metadata; a sheet without them still imports.
    let best_qualifying_lap_time = convert_lap_time(&meta("Best Qualifying Lap Time")?);
    let best_qualifying_lap_pilot = meta("Best Qualifying Lap Pilot")?.text();
    let best_race_lap_time = convert_lap_time(&meta("Best Race Lap Time")?);
    let best_race_lap_pilot = meta("Best Race Lap Pilot")?.text();

    let mut results = Vec::new();
    for row in 1..rows.len() {
        let place = cell(row, place_col).text();
        let pilot_name = cell(row, pilot_col).text();
        let (Some(place), Some(pilot_name)) = (place, pilot_name) else {
            continue;
        };
        // Some exports repeat the header labels mid-sheet.
        if place == "Place" && pilot_name == "Pilot Name" {
            continue;
        }
        results.push(SheetResult { place, pilot_name });
    }

    debug!(
        "Parsed {:?}: {} at {} with {} results",
        path,
        track_name,
        start_date,
        results.len()
    );

    Ok(RaceSheet {
        competition_name,
        track_name,
        start_date,
        class,
        split,
        best_qualifying_lap_time,
        best_qualifying_lap_pilot,
        best_race_lap_time,
        best_race_lap_pilot,
        results,
    })
}

/// Load every importable sheet from a directory.
///
/// Returns the parsed sheets plus the number of files skipped; skipping is
/// logged per file and never fails the batch.
pub fn load_sheets(dir: &Path) -> Result<(Vec<RaceSheet>, usize), IngestError> {
    if !dir.is_dir() {
        warn!("Input directory {:?} does not exist; nothing to import", dir);
    }
    let pattern = dir.join("*.xlsx");
    let pattern = pattern
        .to_str()
        .ok_or_else(|| IngestError::InputDir(dir.to_path_buf()))?;
    let paths = glob::glob(pattern).map_err(|_| IngestError::InputDir(dir.to_path_buf()))?;

    let mut sheets = Vec::new();
    let mut skipped = 0usize;
    for entry in paths {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!("Skipping unreadable path: {}", e);
                skipped += 1;
                continue;
            }
        };

        info!("Reading file: {:?}", path);
        let parsed = read_workbook(&path).and_then(|rows| parse_sheet(&path, &rows));
        match parsed {
            Ok(sheet) => sheets.push(sheet),
            Err(e) => {
                warn!("Skipping {:?}: {}", path, e);
                skipped += 1;
            }
        }
    }

    Ok((sheets, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn header_row() -> Vec<CellValue> {
        [
            "Competition Name",
            "Track Name",
            "Start Date",
            "Class",
            "Split",
            "Best Qualifying Lap Time",
            "Best Qualifying Lap Pilot",
            "Best Race Lap Time",
            "Best Race Lap Pilot",
            "Place",
            "Pilot Name",
        ]
        .iter()
        .map(|s| text(s))
        .collect()
    }

    fn sample_rows() -> Vec<Vec<CellValue>> {
        vec![
            header_row(),
            vec![
                text("GT World Series"),
                text("Monza"),
                CellValue::Number(44197.0),
                text("GT3"),
                CellValue::Number(1.0),
                text("01:47.120"),
                text("A. Senna"),
                CellValue::Number(103.456 / 86_400.0),
                text("A. Prost"),
                CellValue::Number(1.0),
                text("A. Senna"),
            ],
            vec![
                CellValue::Empty,
                CellValue::Empty,
                CellValue::Empty,
                CellValue::Empty,
                CellValue::Empty,
                CellValue::Empty,
                CellValue::Empty,
                CellValue::Empty,
                CellValue::Empty,
                CellValue::Number(2.0),
                text("A. Prost"),
            ],
        ]
    }

    #[test]
    fn test_convert_date_from_serial() {
        let date = convert_date(&CellValue::Number(44197.0)).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
    }

    #[test]
    fn test_convert_date_from_iso_text() {
        let date = convert_date(&text("2024-03-10")).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    }

    #[test]
    fn test_convert_date_rejects_garbage() {
        assert_eq!(convert_date(&text("next sunday")), None);
        assert_eq!(convert_date(&CellValue::Empty), None);
        assert_eq!(convert_date(&CellValue::Number(-5.0)), None);
    }

    #[test]
    fn test_convert_lap_time_from_day_fraction() {
        // 103.456 seconds of a day
        let lap = convert_lap_time(&CellValue::Number(103.456 / 86_400.0)).unwrap();
        assert_eq!(lap, "01:43.456");
    }

    #[test]
    fn test_convert_lap_time_rounding_carries() {
        // 59.9996 s rounds up to a full minute, not "00:59.1000"
        let lap = convert_lap_time(&CellValue::Number(59.9996 / 86_400.0)).unwrap();
        assert_eq!(lap, "01:00.000");
    }

    #[test]
    fn test_convert_lap_time_text_passthrough() {
        let lap = convert_lap_time(&text(" 01:42.500 ")).unwrap();
        assert_eq!(lap, "01:42.500");
        assert_eq!(convert_lap_time(&CellValue::Empty), None);
    }

    #[test]
    fn test_cell_text_renders_whole_numbers_as_integers() {
        assert_eq!(CellValue::Number(1.0).text().as_deref(), Some("1"));
        assert_eq!(CellValue::Number(3.5).text().as_deref(), Some("3.5"));
        assert_eq!(text("  ").text(), None);
    }

    #[test]
    fn test_parse_sheet_happy_path() {
        let sheet = parse_sheet(Path::new("race.xlsx"), &sample_rows()).unwrap();

        assert_eq!(sheet.competition_name, "GT World Series");
        assert_eq!(sheet.track_name, "Monza");
        assert_eq!(sheet.start_date, NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
        assert_eq!(sheet.class, "GT3");
        assert_eq!(sheet.split, 1);
        assert_eq!(sheet.best_qualifying_lap_time.as_deref(), Some("01:47.120"));
        assert_eq!(sheet.best_race_lap_time.as_deref(), Some("01:43.456"));
        assert_eq!(sheet.results.len(), 2);
        assert_eq!(sheet.results[0].place, "1");
        assert_eq!(sheet.results[0].pilot_name, "A. Senna");
        assert_eq!(sheet.results[1].place, "2");
    }

    #[test]
    fn test_parse_sheet_missing_header() {
        let err = parse_sheet(Path::new("empty.xlsx"), &[]).unwrap_err();
        assert!(matches!(err, IngestError::MissingHeader(_)));
    }

    #[test]
    fn test_parse_sheet_missing_column() {
        let mut rows = sample_rows();
        rows[0].retain(|cell| cell.text().as_deref() != Some("Split"));
        let err = parse_sheet(Path::new("race.xlsx"), &rows).unwrap_err();
        assert!(matches!(err, IngestError::MissingColumn { column: "Split", .. }));
    }

    #[test]
    fn test_parse_sheet_blank_mandatory_field() {
        let mut rows = sample_rows();
        rows[1][1] = CellValue::Empty; // Track Name
        let err = parse_sheet(Path::new("race.xlsx"), &rows).unwrap_err();
        assert!(matches!(err, IngestError::BlankField { field: "Track Name", .. }));
    }

    #[test]
    fn test_parse_sheet_blank_date() {
        let mut rows = sample_rows();
        rows[1][2] = text("soon");
        let err = parse_sheet(Path::new("race.xlsx"), &rows).unwrap_err();
        assert!(matches!(err, IngestError::BlankField { field: "Start Date", .. }));
    }

    #[test]
    fn test_parse_sheet_drops_incomplete_result_rows() {
        let mut rows = sample_rows();
        // Place without a pilot name
        let mut partial = vec![CellValue::Empty; 11];
        partial[9] = CellValue::Number(3.0);
        rows.push(partial);

        let sheet = parse_sheet(Path::new("race.xlsx"), &rows).unwrap();
        assert_eq!(sheet.results.len(), 2);
    }

    #[test]
    fn test_parse_sheet_skips_header_echo_rows() {
        let mut rows = sample_rows();
        let mut echo = vec![CellValue::Empty; 11];
        echo[9] = text("Place");
        echo[10] = text("Pilot Name");
        rows.push(echo);

        let sheet = parse_sheet(Path::new("race.xlsx"), &rows).unwrap();
        assert_eq!(sheet.results.len(), 2);
    }

    #[test]
    fn test_parse_sheet_split_from_text() {
        let mut rows = sample_rows();
        rows[1][4] = text("2");
        let sheet = parse_sheet(Path::new("race.xlsx"), &rows).unwrap();
        assert_eq!(sheet.split, 2);
    }

    #[test]
    fn test_load_sheets_empty_dir() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let (sheets, skipped) = load_sheets(temp_dir.path()).unwrap();
        assert!(sheets.is_empty());
        assert_eq!(skipped, 0);
    }

    #[test]
    fn test_load_sheets_skips_broken_workbook() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("broken.xlsx"), b"not a workbook").unwrap();

        let (sheets, skipped) = load_sheets(temp_dir.path()).unwrap();
        assert!(sheets.is_empty());
        assert_eq!(skipped, 1);
    }
}
