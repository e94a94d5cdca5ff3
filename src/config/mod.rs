//! Acceptor configuration.
//!
//! Settings can be built in code or loaded from JSON. Validation uses
//! Stillwater's `Validation` so that every problem in a configuration is
//! reported at once instead of one per attempt.
//!
//! ```rust
//! use ict104::config::AcceptorConfig;
//!
//! let config = AcceptorConfig::from_json_str(r#"{
//!     "port": "/dev/ttyUSB0",
//!     "bill_types": [1000, 5000, 10000, 50000, 0]
//! }"#).unwrap();
//!
//! assert_eq!(config.serial.baud_rate, 9600);
//! assert_eq!(config.port.as_deref(), Some("/dev/ttyUSB0"));
//! ```

pub mod error;

pub use error::{ConfigError, ConfigViolation};

use crate::engine::{EngineSettings, BILL_TYPE_COUNT};
use crate::retry::{RetryPolicy, RetryPolicyBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Outcome of a validation pass: success or every violation found.
pub type Checked = Validation<(), NonEmptyVec<ConfigViolation>>;

/// Parity of the serial line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    None,
    Odd,
    Even,
}

/// Stop bits of the serial line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopBits {
    One,
    Two,
}

/// Serial line parameters. The peripheral expects 9600 baud, 8E1.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SerialSettings {
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: StopBits,
    /// Read timeout of the reader loop, in milliseconds
    pub read_timeout_ms: u64,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: 8,
            parity: Parity::Even,
            stop_bits: StopBits::One,
            read_timeout_ms: 100,
        }
    }
}

impl SerialSettings {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    fn validate(&self) -> Checked {
        let baud = if self.baud_rate == 0 {
            Validation::fail(ConfigViolation::ZeroBaudRate)
        } else {
            Validation::success(())
        };
        let data_bits = if (5..=8).contains(&self.data_bits) {
            Validation::success(())
        } else {
            Validation::fail(ConfigViolation::InvalidDataBits(self.data_bits))
        };
        Validation::all_vec(vec![baud, data_bits]).map(|_| ())
    }
}

/// How status requests are polled. `None` limits mean "never give up".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StatusPollSettings {
    pub interval_ms: u64,
    pub polls_per_attempt: usize,
    pub max_attempts: Option<usize>,
    pub timeout_ms: Option<u64>,
}

impl Default for StatusPollSettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            interval_ms: policy.poll_interval().as_millis() as u64,
            polls_per_attempt: policy.polls_per_attempt(),
            max_attempts: policy.max_attempts(),
            timeout_ms: policy.timeout().map(|t| t.as_millis() as u64),
        }
    }
}

impl StatusPollSettings {
    pub fn to_policy(&self) -> RetryPolicy {
        let mut builder = RetryPolicyBuilder::new()
            .poll_interval(Duration::from_millis(self.interval_ms))
            .polls_per_attempt(self.polls_per_attempt);
        builder = match self.max_attempts {
            Some(max) => builder.max_attempts(max),
            None => builder.unbounded_attempts(),
        };
        builder = match self.timeout_ms {
            Some(ms) => builder.timeout(Duration::from_millis(ms)),
            None => builder.unbounded_time(),
        };
        builder.build()
    }

    fn validate(&self) -> Checked {
        let mut checks: Vec<Checked> = Vec::new();
        if self.interval_ms == 0 {
            checks.push(Validation::fail(ConfigViolation::ZeroPollInterval));
        }
        if self.polls_per_attempt == 0 {
            checks.push(Validation::fail(ConfigViolation::ZeroPollsPerAttempt));
        }
        if self.max_attempts == Some(0) {
            checks.push(Validation::fail(ConfigViolation::ZeroMaxAttempts));
        }
        Validation::all_vec(checks).map(|_| ())
    }
}

/// Complete configuration of one bill acceptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AcceptorConfig {
    /// Serial port name, e.g. `COM3` or `/dev/ttyUSB0`
    pub port: Option<String>,
    /// Denominations of `BillType1..BillType5`
    pub bill_types: Option<Vec<i64>>,
    pub serial: SerialSettings,
    pub status_poll: StatusPollSettings,
    /// Pause after acknowledging a reset or power-on, in milliseconds
    pub reset_settle_ms: u64,
    pub max_pending_bytes: usize,
    pub history_capacity: usize,
}

impl Default for AcceptorConfig {
    fn default() -> Self {
        let engine = EngineSettings::default();
        Self {
            port: None,
            bill_types: None,
            serial: SerialSettings::default(),
            status_poll: StatusPollSettings::default(),
            reset_settle_ms: engine.reset_settle.as_millis() as u64,
            max_pending_bytes: engine.max_pending_bytes,
            history_capacity: engine.history_capacity,
        }
    }
}

impl AcceptorConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validated()
    }

    /// Read, parse and validate a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check every setting, accumulating ALL violations.
    pub fn validate(&self) -> Checked {
        let port = match self.port.as_deref() {
            Some(name) => validate_port(name),
            None => Validation::success(()),
        };
        let bill_types = match self.bill_types.as_deref() {
            Some(values) => validate_bill_types(values),
            None => Validation::success(()),
        };
        Validation::all_vec(vec![
            port,
            bill_types,
            self.serial.validate(),
            self.status_poll.validate(),
        ])
        .map(|_| ())
    }

    /// Return the configuration if it is valid.
    pub fn validated(self) -> Result<Self, ConfigError> {
        match self.validate() {
            Validation::Success(_) => Ok(self),
            Validation::Failure(violations) => {
                Err(ConfigError::Invalid(violations.iter().cloned().collect()))
            }
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            reset_settle: Duration::from_millis(self.reset_settle_ms),
            max_pending_bytes: self.max_pending_bytes,
            history_capacity: self.history_capacity,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.status_poll.to_policy()
    }
}

/// Check a port name.
pub fn validate_port(name: &str) -> Checked {
    if name.trim().is_empty() {
        Validation::fail(ConfigViolation::EmptyPort)
    } else {
        Validation::success(())
    }
}

/// Check a denomination table: exactly five non-negative values.
pub fn validate_bill_types(values: &[i64]) -> Checked {
    let mut checks: Vec<Checked> = Vec::new();
    if values.len() != BILL_TYPE_COUNT {
        checks.push(Validation::fail(ConfigViolation::BillTypeCount {
            expected: BILL_TYPE_COUNT,
            found: values.len(),
        }));
    }
    for (index, &value) in values.iter().enumerate() {
        if value < 0 {
            checks.push(Validation::fail(ConfigViolation::NegativeDenomination {
                index,
                value,
            }));
        }
    }
    Validation::all_vec(checks).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violations(config: &AcceptorConfig) -> Vec<ConfigViolation> {
        match config.validate() {
            Validation::Success(_) => Vec::new(),
            Validation::Failure(errors) => errors.iter().cloned().collect(),
        }
    }

    #[test]
    fn defaults_match_ict104_line_settings() {
        let config = AcceptorConfig::default();
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.serial.data_bits, 8);
        assert_eq!(config.serial.parity, Parity::Even);
        assert_eq!(config.serial.stop_bits, StopBits::One);
        assert!(config.validate().is_success());
    }

    #[test]
    fn default_poll_settings_match_default_policy() {
        assert_eq!(AcceptorConfig::default().retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn validation_accumulates_all_violations() {
        let config = AcceptorConfig {
            port: Some("  ".to_string()),
            bill_types: Some(vec![100, -1]),
            serial: SerialSettings {
                baud_rate: 0,
                data_bits: 9,
                ..SerialSettings::default()
            },
            status_poll: StatusPollSettings {
                interval_ms: 0,
                polls_per_attempt: 0,
                max_attempts: Some(0),
                timeout_ms: None,
            },
            ..AcceptorConfig::default()
        };

        let found = violations(&config);
        assert_eq!(found.len(), 8);
        assert!(found.contains(&ConfigViolation::EmptyPort));
        assert!(found.contains(&ConfigViolation::BillTypeCount {
            expected: 5,
            found: 2
        }));
        assert!(found.contains(&ConfigViolation::NegativeDenomination {
            index: 1,
            value: -1
        }));
        assert!(found.contains(&ConfigViolation::ZeroBaudRate));
        assert!(found.contains(&ConfigViolation::InvalidDataBits(9)));
        assert!(found.contains(&ConfigViolation::ZeroPollInterval));
        assert!(found.contains(&ConfigViolation::ZeroPollsPerAttempt));
        assert!(found.contains(&ConfigViolation::ZeroMaxAttempts));
    }

    #[test]
    fn json_uses_defaults_for_missing_fields() {
        let config = AcceptorConfig::from_json_str(r#"{ "reset_settle_ms": 250 }"#).unwrap();
        assert_eq!(config.reset_settle_ms, 250);
        assert_eq!(config.engine_settings().reset_settle, Duration::from_millis(250));
        assert_eq!(config.serial, SerialSettings::default());
        assert!(config.port.is_none());
    }

    #[test]
    fn json_null_limits_mean_unbounded() {
        let config = AcceptorConfig::from_json_str(
            r#"{ "status_poll": { "max_attempts": null, "timeout_ms": null } }"#,
        )
        .unwrap();
        assert!(!config.retry_policy().is_bounded());
    }

    #[test]
    fn json_rejects_unknown_fields() {
        let err = AcceptorConfig::from_json_str(r#"{ "baud": 9600 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn json_reports_invalid_values() {
        let err = AcceptorConfig::from_json_str(r#"{ "bill_types": [1, 2, 3] }"#).unwrap_err();
        match err {
            ConfigError::Invalid(found) => assert_eq!(
                found,
                vec![ConfigViolation::BillTypeCount {
                    expected: 5,
                    found: 3
                }]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = AcceptorConfig::from_json_file("/nonexistent/ict104.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn parity_serializes_lowercase() {
        let json = serde_json::to_string(&SerialSettings::default()).unwrap();
        assert!(json.contains("\"parity\":\"even\""));
        assert!(json.contains("\"stop_bits\":\"one\""));
    }

    #[test]
    fn error_message_lists_every_violation() {
        let err = ConfigError::Invalid(vec![
            ConfigViolation::EmptyPort,
            ConfigViolation::ZeroBaudRate,
        ]);
        assert_eq!(
            err.to_string(),
            "invalid configuration: port name is empty; baud rate must be greater than zero"
        );
    }
}
