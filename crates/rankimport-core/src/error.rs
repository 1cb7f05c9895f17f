use thiserror::Error;

/// Validation errors exposed by `rankimport-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("ticker cannot be empty")]
    EmptyTicker,
    #[error("ticker length {len} exceeds max {max}")]
    TickerTooLong { len: usize, max: usize },
    #[error("ticker contains invalid character '{ch}' at index {index}")]
    TickerInvalidChar { ch: char, index: usize },

    #[error("report date must be YYYY-MM-DD: '{value}'")]
    InvalidReportDate { value: String },
    #[error("period label must be {expected}: '{value}'")]
    InvalidPeriodLabel {
        value: String,
        expected: &'static str,
    },
    #[error("date {value} cannot be written as {pattern}")]
    UnformattableDate {
        value: String,
        pattern: &'static str,
    },

    #[error("unknown balance-sheet dimension '{value}'")]
    InvalidDimension { value: String },
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Figment extraction or merge error.
    #[error("configuration error: {0}")]
    Figment(#[from] figment::Error),

    /// A required configuration section is not configured.
    #[error("configuration section '{section}' is not configured (missing required fields)")]
    NotConfigured { section: String },

    /// A configuration field has an invalid value.
    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}
