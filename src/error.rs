//! Error types for the metrics preparation pipeline.

use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Dataset or boundary file absent, empty or unparseable.
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// A province/year lacks a value the caller required.
    #[error("Incomplete series: {0}")]
    IncompleteSeries(String),

    /// No province in the dataset resolves to a boundary key.
    #[error("Key mismatch: {0}")]
    KeyMismatch(String),

    /// Requested national reference row is absent.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate observation for {province} in {year}")]
    DuplicateKey { province: String, year: i32 },

    #[error("Palette exhausted: {needed} provinces but only {available} colors")]
    PaletteExhausted { needed: usize, available: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn missing_input(msg: impl Into<String>) -> Self {
        Self::MissingInput(msg.into())
    }

    #[must_use]
    pub fn incomplete(msg: impl Into<String>) -> Self {
        Self::IncompleteSeries(msg.into())
    }

    #[must_use]
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}
