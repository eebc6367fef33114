//! Error types shared across the crate.

use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::sim::price_cap::PriceCapError;

/// A price series that breaks the ordering or cadence contract.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PriceSeriesError {
    /// Timestamps must be strictly increasing.
    #[error("timestamp {current} at index {index} does not come after {previous}")]
    NotIncreasing {
        index: usize,
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },

    /// Every interval must span the same number of seconds.
    #[error("interval ending at index {index} spans {found_secs} s, expected {expected_secs} s")]
    IrregularStep {
        index: usize,
        expected_secs: i64,
        found_secs: i64,
    },

    /// Prices must be finite numbers.
    #[error("price at index {index} is not a finite number")]
    NonFinitePrice { index: usize },
}

/// Failure while reading a price file.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The file could not be opened.
    #[error("cannot read \"{path}\": {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A row could not be decoded.
    #[error("row {row}: {source}")]
    Row { row: usize, source: csv::Error },

    /// A timestamp did not match any accepted format.
    #[error("row {row}: cannot parse timestamp \"{value}\"")]
    Timestamp { row: usize, value: String },

    /// A price cell is missing or not a number.
    #[error("row {row}: cannot parse price \"{value}\"")]
    Price { row: usize, value: String },

    /// Rows parsed but do not form a valid series.
    #[error(transparent)]
    Series(#[from] PriceSeriesError),
}

/// Failure while writing results.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// A scenario run that could not be carried out.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The dispatch threshold could not be resolved; dispatch is refused.
    #[error("cannot resolve dispatch price cap: {0}")]
    PriceCap(#[from] PriceCapError),

    /// The scenario failed validation.
    #[error("scenario is invalid: {}", .0.join("; "))]
    InvalidScenario(Vec<String>),
}
