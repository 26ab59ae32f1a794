use chrono::{DateTime, NaiveDateTime, Timelike};
use data_contracts::TIMESTAMP_COLUMN;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::types::{SegmentationError, SegmentationResult};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// A raw recording with its wall-clock column replaced by elapsed seconds.
#[derive(Debug, Clone)]
pub struct Recording {
    pub source: PathBuf,
    /// Timestamp of the first row.
    pub start: NaiveDateTime,
    /// Every non-timestamp column, in file order.
    pub columns: Vec<String>,
    /// Row-major values for `columns`.
    pub rows: Vec<Vec<f32>>,
    /// Seconds since `start`, one per row.
    pub time_s: Vec<f64>,
}

impl Recording {
    pub fn from_path(path: &Path) -> SegmentationResult<Self> {
        let file = File::open(path).map_err(|source| SegmentationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(file, path)
    }

    /// Parse CSV text. `source` is only used for error messages.
    pub fn parse<R: Read>(reader: R, source: &Path) -> SegmentationResult<Self> {
        let csv_err = |e: csv::Error| SegmentationError::Csv {
            path: source.to_path_buf(),
            source: e,
        };
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let headers: Vec<String> = reader
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let ts_idx = headers
            .iter()
            .position(|h| h == TIMESTAMP_COLUMN)
            .ok_or_else(|| SegmentationError::MissingTimestampColumn {
                path: source.to_path_buf(),
            })?;
        let columns: Vec<String> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != ts_idx)
            .map(|(_, h)| h.clone())
            .collect();

        let mut stamps = Vec::new();
        let mut rows = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(csv_err)?;
            if record.len() != headers.len() {
                return Err(SegmentationError::RowWidth {
                    path: source.to_path_buf(),
                    row,
                    expected: headers.len(),
                    found: record.len(),
                });
            }
            let raw_ts = record.get(ts_idx).unwrap_or_default();
            let ts = parse_timestamp(raw_ts).ok_or_else(|| SegmentationError::Timestamp {
                path: source.to_path_buf(),
                row,
                value: raw_ts.to_string(),
            })?;
            stamps.push(ts);

            let mut values = Vec::with_capacity(columns.len());
            for (i, cell) in record.iter().enumerate() {
                if i == ts_idx {
                    continue;
                }
                let value = cell
                    .trim()
                    .parse::<f32>()
                    .map_err(|_| SegmentationError::Value {
                        path: source.to_path_buf(),
                        row,
                        column: headers[i].clone(),
                        value: cell.to_string(),
                    })?;
                values.push(value);
            }
            rows.push(values);
        }

        let start = *stamps.first().ok_or_else(|| SegmentationError::Empty {
            path: source.to_path_buf(),
        })?;
        let time_s = stamps
            .iter()
            .map(|ts| elapsed_seconds(start, *ts))
            .collect();

        Ok(Self {
            source: source.to_path_buf(),
            start,
            columns,
            rows,
            time_s,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn elapsed_seconds(start: NaiveDateTime, ts: NaiveDateTime) -> f64 {
    let delta = ts.signed_duration_since(start);
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1e6,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}

/// Accepts `YYYY-MM-DD HH:MM:SS[.f]`, the `T`-separated variant, and RFC 3339 (converted to UTC).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    for fmt in NAIVE_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ts);
        }
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.naive_utc())
}

/// `YYYY-MM-DD HH:MM:SS`, with microseconds appended only when non-zero.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    if ts.nanosecond() == 0 {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn parses_supported_timestamp_forms() {
        let a = parse_timestamp("2024-05-01 12:00:00.250").unwrap();
        let b = parse_timestamp("2024-05-01T12:00:00.250").unwrap();
        let c = parse_timestamp("2024-05-01T12:00:00.250Z").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn formats_whole_and_fractional_seconds() {
        let whole = parse_timestamp("2024-05-01 12:00:00").unwrap();
        assert_eq!(format_timestamp(&whole), "2024-05-01 12:00:00");
        let frac = parse_timestamp("2024-05-01 12:00:00.5").unwrap();
        assert_eq!(format_timestamp(&frac), "2024-05-01 12:00:00.500000");
    }

    #[test]
    fn trims_headers_and_cells() {
        let raw = " timestamp , mouse_x ,flower_x\n 2024-05-01 12:00:00 , 1.5 , 2\n2024-05-01 12:00:00.100,  3 ,4 \n";
        let rec = Recording::parse(raw.as_bytes(), Path::new("mem.txt")).unwrap();
        assert_eq!(rec.columns, vec!["mouse_x", "flower_x"]);
        assert_eq!(rec.rows, vec![vec![1.5, 2.0], vec![3.0, 4.0]]);
        assert_relative_eq!(rec.time_s[0], 0.0);
        assert_relative_eq!(rec.time_s[1], 0.1, epsilon = 1e-9);
    }

    #[test]
    fn rejects_non_numeric_cells() {
        let raw = "timestamp,mouse_x\n2024-05-01 12:00:00,abc\n";
        let err = Recording::parse(raw.as_bytes(), Path::new("mem.txt")).unwrap_err();
        assert!(matches!(err, SegmentationError::Value { row: 0, .. }));
    }

    #[test]
    fn rejects_headers_only() {
        let raw = "timestamp,mouse_x\n";
        let err = Recording::parse(raw.as_bytes(), Path::new("mem.txt")).unwrap_err();
        assert!(matches!(err, SegmentationError::Empty { .. }));
    }
}
