//! Effects requested by the protocol engine.

use crate::core::Mode;
use crate::protocol::{Command, CriticalFault, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A validated bill was stacked.
///
/// `amount` is the configured denomination for the bill type, or
/// [`AcceptEvent::UNMAPPED`] when the bill type byte could not be mapped.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct AcceptEvent {
    pub amount: i64,
}

impl AcceptEvent {
    /// Amount reported when the bill type is unknown or no table is set.
    pub const UNMAPPED: i64 = -1;

    pub fn new(amount: i64) -> Self {
        Self { amount }
    }

    pub fn unmapped() -> Self {
        Self::new(Self::UNMAPPED)
    }

    pub fn is_mapped(&self) -> bool {
        self.amount != Self::UNMAPPED
    }
}

impl fmt::Display for AcceptEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_mapped() {
            write!(f, "bill accepted: {}", self.amount)
        } else {
            f.write_str("bill accepted: unmapped bill type")
        }
    }
}

/// Actions returned by the engine, executed in order by the driver.
///
/// - `Send`: write the command byte to the transport
/// - `Pause`: wait before executing the next action
/// - `BillAccepted`: hand the event to the sink
/// - the rest are informational and only feed diagnostics
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineAction {
    /// Write this command to the peripheral
    Send(Command),

    /// Let the peripheral settle before the next action
    Pause(Duration),

    /// A bill was stacked
    BillAccepted(AcceptEvent),

    /// A status byte answered an outstanding status request
    StatusObserved(StatusCode),

    /// A critical fault preempted normal processing
    FaultDetected(CriticalFault),

    /// The engine changed mode
    ModeChanged {
        /// Previous mode
        from: Mode,
        /// New mode
        to: Mode,
    },
}

impl EngineAction {
    /// Command carried by a `Send` action.
    pub fn command(&self) -> Option<Command> {
        match self {
            EngineAction::Send(command) => Some(*command),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmapped_event_reports_minus_one() {
        let event = AcceptEvent::unmapped();
        assert_eq!(event.amount, -1);
        assert!(!event.is_mapped());
        assert_eq!(event.to_string(), "bill accepted: unmapped bill type");
    }

    #[test]
    fn mapped_event_displays_amount() {
        let event = AcceptEvent::new(1000);
        assert!(event.is_mapped());
        assert_eq!(event.to_string(), "bill accepted: 1000");
    }

    #[test]
    fn command_extracts_only_sends() {
        assert_eq!(
            EngineAction::Send(Command::Hold).command(),
            Some(Command::Hold)
        );
        assert_eq!(
            EngineAction::Pause(Duration::from_millis(1)).command(),
            None
        );
    }
}
