//! Acceptor error types.

use crate::config::ConfigError;
use crate::retry::RetryViolation;
use thiserror::Error;

/// Errors returned by [`BillAcceptor`](super::BillAcceptor) operations.
#[derive(Debug, Error)]
pub enum AcceptorError {
    /// The serial port is not open; nothing was sent.
    #[error("port is closed")]
    PortClosed,

    /// The serial port is open and the requested change needs it closed.
    #[error("port is open, close it before changing the {0}")]
    PortOpen(&'static str),

    /// A required setting has not been provided; nothing was sent.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// The transport failed to open, close, read or write.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The peripheral never answered a status request.
    #[error("no status reply after {attempts} attempt(s): {}", join(.violations))]
    StatusTimeout {
        attempts: usize,
        violations: Vec<RetryViolation>,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn join(violations: &[RetryViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
