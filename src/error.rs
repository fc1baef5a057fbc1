//! Error types for filters and cascades

use thiserror::Error;

/// Errors raised while reconstructing a [`BitFilter`](crate::BitFilter) from a record.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("record should include filter data \"data\"")]
    MissingFilterData,

    #[error("record should include number of hash functions \"hashFuncCount\"")]
    MissingHashFuncCount,

    #[error("\"hashFuncCount\" exceeded max size: {count} > {max}")]
    HashFuncCountExceedsMax { count: u32, max: u32 },

    #[error("unrecognized argument, expected a filter record")]
    UnrecognizedArgument,

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while building or decoding a [`FilterCascade`](crate::FilterCascade).
#[derive(Debug, Error)]
pub enum CascadeError {
    #[error("invalid false positive rate: {rate} (must be between 0 and 1, exclusive)")]
    InvalidFalsePositiveRate { rate: f64 },

    #[error("invalid level limit: {limit} (a cascade needs at least 2 levels)")]
    InvalidLevelLimit { limit: usize },

    #[error("cascade did not converge within {limit} levels")]
    LevelLimitExceeded { limit: usize },

    #[error("level filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
