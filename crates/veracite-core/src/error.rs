use thiserror::Error;

/// Validation and contract errors exposed by `veracite-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("ticker cannot be empty")]
    EmptyTicker,
    #[error("ticker length {len} exceeds max {max}")]
    TickerTooLong { len: usize, max: usize },
    #[error("ticker must start with an ASCII letter: '{ch}'")]
    TickerInvalidStart { ch: char },
    #[error("ticker contains invalid character '{ch}' at index {index}")]
    TickerInvalidChar { ch: char, index: usize },

    #[error("date must be ISO YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },

    #[error("invalid frequency '{value}', expected one of D, W, M, Q, A")]
    InvalidFrequency { value: String },
    #[error("invalid scale '{value}', expected one of K, M, B, T, U")]
    InvalidScale { value: String },
    #[error("invalid operator '{value}', expected one of =, <, <=, >, >=, change, yoy, qoq")]
    InvalidOperator { value: String },

    #[error("accession must match NNNNNNNNNN-NN-NNNNNN: '{value}'")]
    InvalidAccessionFormat { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },

    #[error("series dates must be strictly ascending: violation at index {index}")]
    SeriesNotAscending { index: usize },
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
