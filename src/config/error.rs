//! Configuration error types.

use thiserror::Error;

/// A single problem found while validating configuration
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigViolation {
    #[error("expected {expected} bill type denominations, found {found}")]
    BillTypeCount { expected: usize, found: usize },

    #[error("bill type {index} has negative denomination {value}")]
    NegativeDenomination { index: usize, value: i64 },

    #[error("port name is empty")]
    EmptyPort,

    #[error("baud rate must be greater than zero")]
    ZeroBaudRate,

    #[error("data bits must be between 5 and 8, got {0}")]
    InvalidDataBits(u8),

    #[error("status poll interval must be greater than zero")]
    ZeroPollInterval,

    #[error("status polls per attempt must be greater than zero")]
    ZeroPollsPerAttempt,

    #[error("status max attempts must be greater than zero")]
    ZeroMaxAttempts,
}

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more settings are out of range
    #[error("invalid configuration: {}", join(.0))]
    Invalid(Vec<ConfigViolation>),

    /// The configuration document is not valid JSON for this schema
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration file could not be read
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

fn join(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
