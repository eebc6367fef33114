//! CSV price import.
//!
//! The expected layout is two columns with a header row:
//!
//! ```text
//! timestamp,price_eur_per_mwh
//! 2024-01-01 00:00,52.10
//! 2024-01-01 00:15,49.87
//! ```
//!
//! Timestamps may be RFC 3339 (converted to UTC) or naive
//! `YYYY-MM-DD HH:MM[:SS]` with a space or `T` separator. Extra columns
//! are ignored; a bad row is an error, never skipped.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use chrono::{DateTime, NaiveDateTime};

use crate::error::ImportError;
use crate::prices::{PricePoint, PriceSeries};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Reads a price series from a CSV file.
///
/// # Errors
///
/// Returns an `ImportError` if the file cannot be opened, a row cannot be
/// parsed, or the rows do not form a uniformly spaced series.
pub fn read_prices_csv(path: &Path) -> Result<PriceSeries, ImportError> {
    let file = File::open(path).map_err(|source| ImportError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_prices(io::BufReader::new(file))
}

/// Reads a price series from any CSV source. Row numbers in errors count
/// data rows from 1.
///
/// # Errors
///
/// See [`read_prices_csv`].
pub fn read_prices(reader: impl Read) -> Result<PriceSeries, ImportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut points = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let row = i + 1;
        let record = record.map_err(|source| ImportError::Row { row, source })?;

        let ts_cell = record.get(0).unwrap_or_default();
        let timestamp = parse_timestamp(ts_cell).ok_or_else(|| ImportError::Timestamp {
            row,
            value: ts_cell.to_owned(),
        })?;

        let price_cell = record.get(1).unwrap_or_default();
        let price = price_cell
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite())
            .ok_or_else(|| ImportError::Price {
                row,
                value: price_cell.to_owned(),
            })?;

        points.push(PricePoint::new(timestamp, price));
    }

    Ok(PriceSeries::new(points)?)
}

/// Parses the accepted timestamp forms.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}
