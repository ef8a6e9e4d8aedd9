//! Data loading and saving utilities
//!
//! Pipeline tables live in CSV files whose first column is the `timestamp`
//! index and whose remaining columns are numeric.

use super::types::{Frame, TIMESTAMP_COLUMN};
use crate::error::{PipelineError, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use csv::{Reader, Writer};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse an ISO-8601 timestamp; values without an offset are taken as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Format a timestamp the way pipeline files store it
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Load a table from CSV and check that `required` columns are present
pub fn load_frame<P: AsRef<Path>>(path: P, required: &[&str]) -> Result<Frame> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    let mut reader = Reader::from_reader(file);

    let headers = reader.headers()?.clone();
    let index_pos = headers
        .iter()
        .position(|h| h == TIMESTAMP_COLUMN)
        .ok_or_else(|| {
            PipelineError::Schema(format!("{:?} has no `{}` column", path, TIMESTAMP_COLUMN))
        })?;

    let names: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index_pos)
        .map(|(i, h)| (i, h.to_string()))
        .collect();

    let mut timestamps = Vec::new();
    let mut values: Vec<Vec<f64>> = vec![Vec::new(); names.len()];

    for (row, record) in reader.records().enumerate() {
        let record = record?;

        let raw_ts = record.get(index_pos).unwrap_or_default();
        let ts = parse_timestamp(raw_ts).ok_or_else(|| {
            PipelineError::Schema(format!("row {}: unparseable timestamp `{}`", row, raw_ts))
        })?;
        timestamps.push(ts);

        for ((pos, name), column) in names.iter().zip(values.iter_mut()) {
            let raw = record.get(*pos).unwrap_or_default().trim();
            let value = raw.parse::<f64>().map_err(|_| {
                PipelineError::Schema(format!(
                    "row {}: column `{}` is not numeric (`{}`)",
                    row, name, raw
                ))
            })?;
            column.push(value);
        }
    }

    let mut frame = Frame::new(timestamps);
    for ((_, name), column) in names.into_iter().zip(values) {
        frame.push_column(name, column)?;
    }
    frame.require_all(required)?;

    debug!("Loaded {} rows x {} columns from {:?}", frame.len(), frame.columns().len(), path);
    Ok(frame)
}

/// Save a table to CSV, creating parent directories as needed
///
/// The table is written to a sibling temporary file first and renamed into
/// place, so `path` only ever holds a complete table.
pub fn save_frame<P: AsRef<Path>>(frame: &Frame, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }

    let tmp_path = temporary_path(path);
    if let Err(e) = write_csv(frame, &tmp_path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    fs::rename(&tmp_path, path).map_err(|e| PipelineError::io(path, e))?;

    info!("Saved {} rows to {:?}", frame.len(), path);
    Ok(())
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_csv(frame: &Frame, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    let mut writer = Writer::from_writer(file);

    let mut header = vec![TIMESTAMP_COLUMN];
    header.extend(frame.column_names());
    writer.write_record(&header)?;

    for (row, ts) in frame.timestamps().iter().enumerate() {
        let mut record = Vec::with_capacity(frame.columns().len() + 1);
        record.push(format_timestamp(ts));
        record.extend(frame.columns().iter().map(|c| c.values[row].to_string()));
        writer.write_record(&record)?;
    }

    writer.flush().map_err(|e| PipelineError::io(path, e))?;
    Ok(())
}
