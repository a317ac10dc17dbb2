// OrderPulse - core/parser.rs
//
// Snapshot parsing: semicolon-delimited exports into typed OrderRecords.
//
// One code path for both modes. `ParseMode` decides what happens to an
// unreadable day-first date cell and to a row the CSV reader cannot decode:
// strict fails the file, tolerant keeps going and counts it.
//
// Row-level outcomes:
//   - UPDATE DATE missing or unreadable -> row dropped, counted (both modes)
//   - CSV-level row error (bad UTF-8 etc.) -> Err in strict, dropped and counted in tolerant
// File-level failures (I/O, header, missing column, strict row/date) -> Err.

use crate::core::model::{FieldTime, OrderRecord, ParseMode};
use crate::util::constants;
use crate::util::error::ParseError;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::io::Read;
use std::path::Path;

/// Configuration for parsing a snapshot.
#[derive(Debug, Clone)]
pub struct ParseConfig {
    pub delimiter: u8,
    pub mode: ParseMode,
    /// Date encoded in the file name, stamped onto every record.
    pub snapshot_date: Option<NaiveDate>,
}

impl ParseConfig {
    pub fn new(mode: ParseMode) -> Self {
        Self {
            delimiter: constants::DEFAULT_DELIMITER,
            mode,
            snapshot_date: None,
        }
    }
}

/// Per-file parse statistics. Counts are exact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    /// Data rows seen (header excluded).
    pub rows_read: usize,

    /// Rows dropped because UPDATE DATE was empty or not `DD/MM/YYYY`.
    pub rows_bad_update_date: usize,

    /// Rows the CSV reader itself could not decode.
    pub rows_malformed: usize,

    /// Tolerated unreadable values per column (tolerant mode only).
    pub unparsed_run_time: usize,
    pub unparsed_date: usize,
    pub unparsed_modified_time: usize,
}

impl ParseStats {
    pub fn rows_dropped(&self) -> usize {
        self.rows_bad_update_date + self.rows_malformed
    }

    pub fn tolerated_failures(&self) -> usize {
        self.unparsed_run_time + self.unparsed_date + self.unparsed_modified_time
    }
}

/// Result of parsing a single snapshot.
#[derive(Debug)]
pub struct ParseResult {
    pub records: Vec<OrderRecord>,
    pub stats: ParseStats,
    /// First few tolerated/dropped problems, for the run report.
    pub issues: Vec<String>,
}

/// Column positions resolved from the header row.
struct ColumnIndex {
    order_code: usize,
    country: usize,
    base_store: usize,
    order_type_code: usize,
    pmi_order_status: usize,
    run_time: usize,
    date: usize,
    update_date: usize,
    modified_time: usize,
}

impl ColumnIndex {
    fn resolve(headers: &csv::StringRecord, file: &Path) -> Result<Self, ParseError> {
        let find = |column: &'static str| {
            headers
                .iter()
                .position(|h| h.trim().trim_start_matches('\u{feff}').eq_ignore_ascii_case(column))
                .ok_or_else(|| ParseError::MissingColumn {
                    file: file.to_path_buf(),
                    column,
                })
        };
        let mut positions = [0usize; constants::REQUIRED_COLUMNS.len()];
        for (slot, column) in positions.iter_mut().zip(constants::REQUIRED_COLUMNS) {
            *slot = find(column)?;
        }
        // Destructured in REQUIRED_COLUMNS order.
        let [order_code, country, base_store, order_type_code, pmi_order_status, run_time, date, update_date, modified_time] =
            positions;
        Ok(Self {
            order_code,
            country,
            base_store,
            order_type_code,
            pmi_order_status,
            run_time,
            date,
            update_date,
            modified_time,
        })
    }
}

/// Open and parse a snapshot file.
pub fn parse_file(path: &Path, config: &ParseConfig) -> Result<ParseResult, ParseError> {
    let file = std::fs::File::open(path).map_err(|e| ParseError::Io {
        file: path.to_path_buf(),
        source: e,
    })?;
    parse_reader(file, path, config)
}

/// Parse a snapshot from any reader. `source` is used for error context only.
pub fn parse_reader<R: Read>(
    reader: R,
    source: &Path,
    config: &ParseConfig,
) -> Result<ParseResult, ParseError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| ParseError::Csv {
            file: source.to_path_buf(),
            source: e,
        })?
        .clone();
    let columns = ColumnIndex::resolve(&headers, source)?;

    let mut records = Vec::new();
    let mut stats = ParseStats::default();
    let mut issues = Vec::new();

    for (idx, row) in csv_reader.records().enumerate() {
        // Header is line 1.
        let line_number = idx as u64 + 2;
        stats.rows_read += 1;

        let row = match row {
            Ok(r) => r,
            Err(e) if config.mode == ParseMode::Strict => {
                return Err(ParseError::Csv {
                    file: source.to_path_buf(),
                    source: e,
                });
            }
            Err(e) => {
                stats.rows_malformed += 1;
                note(&mut issues, format!("line {line_number}: unreadable row: {e}"));
                continue;
            }
        };
        let cell = |i: usize| row.get(i).map(str::trim).unwrap_or("");

        let raw_update = cell(columns.update_date);
        let Some(update_date) = parse_update_date(raw_update) else {
            stats.rows_bad_update_date += 1;
            note(
                &mut issues,
                format!("line {line_number}: dropped, bad UPDATE DATE '{raw_update}'"),
            );
            continue;
        };

        let mut day_first = |column: &'static str, raw: &str| -> Result<FieldTime, ParseError> {
            let value = parse_day_first_field(raw);
            if let FieldTime::Unparsed(ref bad) = value {
                match config.mode {
                    ParseMode::Strict => {
                        return Err(ParseError::FieldParse {
                            file: source.to_path_buf(),
                            line_number,
                            column,
                            raw_value: bad.clone(),
                        });
                    }
                    ParseMode::Tolerant => {
                        match column {
                            constants::COL_RUN_TIME => stats.unparsed_run_time += 1,
                            constants::COL_DATE => stats.unparsed_date += 1,
                            _ => stats.unparsed_modified_time += 1,
                        }
                        note(
                            &mut issues,
                            format!("line {line_number}: tolerated bad {column} '{bad}'"),
                        );
                    }
                }
            }
            Ok(value)
        };

        let run_time = day_first(constants::COL_RUN_TIME, cell(columns.run_time))?;
        let date = day_first(constants::COL_DATE, cell(columns.date))?;
        let modified_time = day_first(constants::COL_MODIFIED_TIME, cell(columns.modified_time))?;

        let base_store = Some(cell(columns.base_store))
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        records.push(OrderRecord {
            order_code: cell(columns.order_code).to_string(),
            country: cell(columns.country).to_string(),
            base_store,
            order_type_code: cell(columns.order_type_code).to_string(),
            pmi_order_status: cell(columns.pmi_order_status).to_string(),
            run_time,
            date,
            update_date,
            modified_time,
            days_since_run_time: None,
            snapshot_date: config.snapshot_date,
            line_number,
        });
    }

    tracing::debug!(
        file = %source.display(),
        mode = ?config.mode,
        rows_read = stats.rows_read,
        rows_kept = records.len(),
        rows_bad_update_date = stats.rows_bad_update_date,
        rows_malformed = stats.rows_malformed,
        tolerated = stats.tolerated_failures(),
        "Snapshot parsed"
    );

    Ok(ParseResult {
        records,
        stats,
        issues,
    })
}

fn note(issues: &mut Vec<String>, msg: String) {
    if issues.len() < constants::MAX_PARSE_ISSUES_PER_FILE {
        issues.push(msg);
    }
}

/// Parse the date portion of an UPDATE DATE cell.
///
/// Anything after the first whitespace (a time of day) is discarded before
/// applying the fixed `DD/MM/YYYY` format.
pub fn parse_update_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.split_whitespace().next()?;
    NaiveDate::parse_from_str(date_part, constants::UPDATE_DATE_FORMAT).ok()
}

/// Parse a day-first date or date-time cell. Empty cells are `Missing`.
pub fn parse_day_first_field(raw: &str) -> FieldTime {
    let raw = raw.trim();
    if raw.is_empty() {
        return FieldTime::Missing;
    }
    match parse_day_first(raw) {
        Some(ts) => FieldTime::Valid(ts),
        None => FieldTime::Unparsed(raw.to_string()),
    }
}

fn parse_day_first(raw: &str) -> Option<NaiveDateTime> {
    for fmt in constants::DAY_FIRST_DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ts);
        }
    }
    for fmt in constants::DAY_FIRST_DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}
