//! Operating modes of the bill acceptor.
//!
//! The engine is always in exactly one [`Mode`]. The same inbound byte can
//! mean different things depending on the mode, so every classification
//! decision starts by looking at the current mode.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

/// Trait for protocol states tracked in a [`StateHistory`](super::StateHistory).
///
/// All methods are pure. States are small values describing where the
/// protocol currently is.
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync
{
    /// Get the state's name for display/logging.
    fn name(&self) -> &str;

    /// Check if a bill is in escrow while in this state.
    ///
    /// Default implementation returns `false`.
    fn holds_bill(&self) -> bool {
        false
    }
}

/// Operating mode of the protocol engine.
///
/// ```rust
/// use ict104::core::{Mode, State};
///
/// let mode = Mode::default();
/// assert_eq!(mode, Mode::Idle);
/// assert_eq!(mode.name(), "Idle");
/// assert!(Mode::Accepting.holds_bill());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Waiting for a validated bill.
    #[default]
    Idle,
    /// Reset issued or a critical fault seen; waiting for the handshake.
    Reset,
    /// A status request is outstanding.
    CheckStatus,
    /// A bill has been validated and is being held/stacked.
    Accepting,
}

impl State for Mode {
    fn name(&self) -> &str {
        match self {
            Self::Idle => "Idle",
            Self::Reset => "Reset",
            Self::CheckStatus => "CheckStatus",
            Self::Accepting => "Accepting",
        }
    }

    fn holds_bill(&self) -> bool {
        matches!(self, Self::Accepting)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_name_returns_correct_value() {
        assert_eq!(Mode::Idle.name(), "Idle");
        assert_eq!(Mode::Reset.name(), "Reset");
        assert_eq!(Mode::CheckStatus.name(), "CheckStatus");
        assert_eq!(Mode::Accepting.name(), "Accepting");
    }

    #[test]
    fn default_mode_is_idle() {
        assert_eq!(Mode::default(), Mode::Idle);
    }

    #[test]
    fn only_accepting_holds_a_bill() {
        assert!(!Mode::Idle.holds_bill());
        assert!(!Mode::Reset.holds_bill());
        assert!(!Mode::CheckStatus.holds_bill());
        assert!(Mode::Accepting.holds_bill());
    }

    #[test]
    fn mode_serializes_correctly() {
        let json = serde_json::to_string(&Mode::Accepting).unwrap();
        assert_eq!(json, "\"Accepting\"");
        let deserialized: Mode = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, Mode::Accepting);
    }

    #[test]
    fn display_matches_name() {
        assert_eq!(Mode::CheckStatus.to_string(), "CheckStatus");
    }
}
