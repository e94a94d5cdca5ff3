//! Retry policy violations.

use std::time::Duration;
use thiserror::Error;

/// Limits a status poll can run into
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RetryViolation {
    #[error("maximum attempts ({max}) exceeded (current: {current})")]
    MaxAttemptsExceeded { max: usize, current: usize },

    #[error("timeout ({timeout:?}) exceeded (elapsed: {elapsed:?})")]
    TimeoutExceeded {
        timeout: Duration,
        elapsed: Duration,
    },
}
