use thiserror::Error;

/// Validation and contract errors exposed by `oddsfeed-core`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("bookmaker id cannot be empty")]
    EmptyBookmaker,
    #[error("bookmaker id length {len} exceeds max {max}")]
    BookmakerTooLong { len: usize, max: usize },
    #[error("bookmaker id contains invalid character '{ch}' at index {index}")]
    BookmakerInvalidChar { ch: char, index: usize },

    #[error("timestamp {value} is outside the supported range")]
    TimestampOutOfRange { value: i64 },
    #[error("start time must be unix seconds/millis, RFC3339 or 'YYYY-MM-DD HH:MM': '{value}'")]
    UnparseableStartTime { value: String },
    #[error("timestamp must be RFC3339: '{value}'")]
    UnparseableTimestamp { value: String },

    #[error("odds price must be a finite decimal >= 1.0, got {value}")]
    InvalidPrice { value: f64 },

    #[error("team name cannot be empty")]
    EmptyTeam,
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("dataset io error: {0}")]
    Io(#[from] std::io::Error),
}
