use std::io;

use thiserror::Error;

/// Errors raised at the input and storage boundary.
///
/// The aggregation functions in [`crate::stats`] never fail; everything here
/// comes from validating user input or touching the filesystem.
#[derive(Debug, Error)]
pub enum DakaError {
    #[error("restaurant name must not be empty")]
    EmptyName,
    #[error("restaurant type must not be empty")]
    EmptyCategory,
    #[error("date '{0}' is not in YYYY-MM-DD form")]
    InvalidDate(String),
    #[error("score '{0}' is not a number")]
    InvalidScore(String),
    #[error("score {0} is outside 0.0..=10.0")]
    ScoreOutOfRange(f64),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DakaError>;
