//! Single-byte vocabularies of the ICT-104 RS-232 protocol.
//!
//! Every frame on the wire is one byte or a short run of bytes. The host
//! sends [`Command`]s; the peripheral sends [`Recognition`] bytes during
//! the bill flow and [`StatusCode`]s in reply to a status request or when
//! something goes wrong.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Commands (host → peripheral)
// ============================================================================

/// Bytes the host sends to the peripheral.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[repr(u8)]
pub enum Command {
    /// Accept the held bill, or acknowledge a reset/power-on signal.
    Accept = 0x02,
    /// Keep the validated bill in escrow.
    Hold = 0x18,
    /// Stack the bill into the cash box.
    Stack = 0x10,
    /// Reset the peripheral.
    Reset = 0x30,
    /// Request a status report.
    CheckStatus = 0x0C,
    /// Allow bill insertion.
    Enable = 0x3E,
    /// Inhibit bill insertion.
    Disable = 0x5E,
}

impl Command {
    pub const ALL: [Command; 7] = [
        Command::Accept,
        Command::Hold,
        Command::Stack,
        Command::Reset,
        Command::CheckStatus,
        Command::Enable,
        Command::Disable,
    ];

    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Upper-case name used in log lines.
    pub const fn name(self) -> &'static str {
        match self {
            Command::Accept => "ACCEPT",
            Command::Hold => "HOLD",
            Command::Stack => "STACK",
            Command::Reset => "RESET",
            Command::CheckStatus => "CHECK_STATUS",
            Command::Enable => "ENABLE",
            Command::Disable => "DISABLE",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X} ({})", self.as_byte(), self.name())
    }
}

// ============================================================================
// Recognition bytes (peripheral → host)
// ============================================================================

/// Non-status bytes the peripheral sends during the bill flow and power-up.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[repr(u8)]
pub enum Recognition {
    /// A bill passed validation; the bill type byte follows.
    BillValidated = 0x81,
    BillType1 = 0x40,
    BillType2 = 0x41,
    BillType3 = 0x42,
    BillType4 = 0x43,
    BillType5 = 0x44,
    /// The held bill has been deposited in the stacker.
    Stacking = 0x10,
    PowerSupplyOn1 = 0x80,
    PowerSupplyOn2 = 0x8F,
}

impl Recognition {
    pub const ALL: [Recognition; 9] = [
        Recognition::BillValidated,
        Recognition::BillType1,
        Recognition::BillType2,
        Recognition::BillType3,
        Recognition::BillType4,
        Recognition::BillType5,
        Recognition::Stacking,
        Recognition::PowerSupplyOn1,
        Recognition::PowerSupplyOn2,
    ];

    /// Bill type bytes in denomination-table order.
    pub const BILL_TYPES: [Recognition; 5] = [
        Recognition::BillType1,
        Recognition::BillType2,
        Recognition::BillType3,
        Recognition::BillType4,
        Recognition::BillType5,
    ];

    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_byte() == byte)
    }

    /// Index of a bill type byte in the denomination table.
    ///
    /// ```rust
    /// use ict104::protocol::Recognition;
    ///
    /// assert_eq!(Recognition::bill_index(0x42), Some(2));
    /// assert_eq!(Recognition::bill_index(0x81), None);
    /// ```
    pub fn bill_index(byte: u8) -> Option<usize> {
        Self::BILL_TYPES.iter().position(|r| r.as_byte() == byte)
    }

    pub fn is_bill_type(byte: u8) -> bool {
        Self::bill_index(byte).is_some()
    }

    pub fn is_power_signal(byte: u8) -> bool {
        byte == Self::PowerSupplyOn1.as_byte() || byte == Self::PowerSupplyOn2.as_byte()
    }

    pub const fn name(self) -> &'static str {
        match self {
            Recognition::BillValidated => "BILL_VALIDATED",
            Recognition::BillType1 => "BILL_TYPE_1",
            Recognition::BillType2 => "BILL_TYPE_2",
            Recognition::BillType3 => "BILL_TYPE_3",
            Recognition::BillType4 => "BILL_TYPE_4",
            Recognition::BillType5 => "BILL_TYPE_5",
            Recognition::Stacking => "STACKING",
            Recognition::PowerSupplyOn1 => "POWER_SUPPLY_ON_1",
            Recognition::PowerSupplyOn2 => "POWER_SUPPLY_ON_2",
        }
    }
}

// ============================================================================
// Status codes (peripheral → host)
// ============================================================================

/// Operational faults that force a reset handshake.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[repr(u8)]
pub enum CriticalFault {
    MotorFailure = 0x20,
    ChecksumError = 0x21,
    BillJam = 0x22,
    BillRemove = 0x23,
    StackerOpen = 0x24,
    SensorProblem = 0x25,
    BillFish = 0x27,
    StackerProblem = 0x28,
    BillReject = 0x29,
    InvalidCommand = 0x2A,
    ErrorStatusExclusion = 0x2F,
}

impl CriticalFault {
    pub const ALL: [CriticalFault; 11] = [
        CriticalFault::MotorFailure,
        CriticalFault::ChecksumError,
        CriticalFault::BillJam,
        CriticalFault::BillRemove,
        CriticalFault::StackerOpen,
        CriticalFault::SensorProblem,
        CriticalFault::BillFish,
        CriticalFault::StackerProblem,
        CriticalFault::BillReject,
        CriticalFault::InvalidCommand,
        CriticalFault::ErrorStatusExclusion,
    ];

    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_byte() == byte)
    }

    pub const fn name(self) -> &'static str {
        match self {
            CriticalFault::MotorFailure => "MOTOR_FAILURE",
            CriticalFault::ChecksumError => "CHECKSUM_ERROR",
            CriticalFault::BillJam => "BILL_JAM",
            CriticalFault::BillRemove => "BILL_REMOVE",
            CriticalFault::StackerOpen => "STACKER_OPEN",
            CriticalFault::SensorProblem => "SENSOR_PROBLEM",
            CriticalFault::BillFish => "BILL_FISH",
            CriticalFault::StackerProblem => "STACKER_PROBLEM",
            CriticalFault::BillReject => "BILL_REJECT",
            CriticalFault::InvalidCommand => "INVALID_COMMAND",
            CriticalFault::ErrorStatusExclusion => "ERROR_STATUS_EXCLUSION",
        }
    }
}

impl fmt::Display for CriticalFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X} ({})", self.as_byte(), self.name())
    }
}

/// A status byte reported by the peripheral.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum StatusCode {
    /// Bill insertion is enabled.
    Enabled,
    /// Bill insertion is inhibited.
    Inhibited,
    /// The peripheral reports an operational fault.
    Fault(CriticalFault),
    /// A byte outside the status vocabulary.
    Unknown(u8),
}

impl StatusCode {
    pub const ENABLED_BYTE: u8 = 0x3E;
    pub const INHIBITED_BYTE: u8 = 0x5E;

    /// Classify a status byte.
    ///
    /// ```rust
    /// use ict104::protocol::{CriticalFault, StatusCode};
    ///
    /// assert_eq!(StatusCode::from_byte(0x3E), StatusCode::Enabled);
    /// assert_eq!(StatusCode::from_byte(0x22), StatusCode::Fault(CriticalFault::BillJam));
    /// assert_eq!(StatusCode::from_byte(0x99), StatusCode::Unknown(0x99));
    /// ```
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            Self::ENABLED_BYTE => StatusCode::Enabled,
            Self::INHIBITED_BYTE => StatusCode::Inhibited,
            other => CriticalFault::from_byte(other)
                .map(StatusCode::Fault)
                .unwrap_or(StatusCode::Unknown(other)),
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            StatusCode::Enabled => Self::ENABLED_BYTE,
            StatusCode::Inhibited => Self::INHIBITED_BYTE,
            StatusCode::Fault(fault) => fault.as_byte(),
            StatusCode::Unknown(byte) => byte,
        }
    }

    pub fn is_fault(self) -> bool {
        matches!(self, StatusCode::Fault(_))
    }

    pub fn name(self) -> &'static str {
        match self {
            StatusCode::Enabled => "ENABLED",
            StatusCode::Inhibited => "INHIBITED",
            StatusCode::Fault(fault) => fault.name(),
            StatusCode::Unknown(_) => "UNKNOWN",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X} ({})", self.as_byte(), self.name())
    }
}

/// Outcome of a status poll.
///
/// `NotAvailable` means the poll could not be made at all (the port is
/// closed); it never corresponds to a byte on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum DeviceStatus {
    Reported(StatusCode),
    NotAvailable,
}

impl DeviceStatus {
    pub fn code(self) -> Option<StatusCode> {
        match self {
            DeviceStatus::Reported(code) => Some(code),
            DeviceStatus::NotAvailable => None,
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceStatus::Reported(code) => code.fmt(f),
            DeviceStatus::NotAvailable => f.write_str("NOT_AVAILABLE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn command_bytes_match_wire_values() {
        assert_eq!(Command::Accept.as_byte(), 0x02);
        assert_eq!(Command::Hold.as_byte(), 0x18);
        assert_eq!(Command::Stack.as_byte(), 0x10);
        assert_eq!(Command::Reset.as_byte(), 0x30);
        assert_eq!(Command::CheckStatus.as_byte(), 0x0C);
        assert_eq!(Command::Enable.as_byte(), 0x3E);
        assert_eq!(Command::Disable.as_byte(), 0x5E);
    }

    #[test]
    fn command_display_includes_hex_and_name() {
        assert_eq!(Command::Hold.to_string(), "0x18 (HOLD)");
    }

    #[test]
    fn bill_index_covers_all_five_types() {
        for (i, bill) in Recognition::BILL_TYPES.iter().enumerate() {
            assert_eq!(Recognition::bill_index(bill.as_byte()), Some(i));
        }
        assert_eq!(Recognition::bill_index(Recognition::Stacking.as_byte()), None);
        assert_eq!(Recognition::bill_index(0x45), None);
    }

    #[test]
    fn recognition_round_trips_through_from_byte() {
        for r in Recognition::ALL {
            assert_eq!(Recognition::from_byte(r.as_byte()), Some(r));
        }
        assert_eq!(Recognition::from_byte(0x00), None);
    }

    #[test]
    fn power_signals_are_recognised() {
        assert!(Recognition::is_power_signal(0x80));
        assert!(Recognition::is_power_signal(0x8F));
        assert!(!Recognition::is_power_signal(0x81));
    }

    #[test]
    fn status_code_classifies_every_fault() {
        for fault in CriticalFault::ALL {
            let code = StatusCode::from_byte(fault.as_byte());
            assert_eq!(code, StatusCode::Fault(fault));
            assert!(code.is_fault());
            assert_eq!(code.as_byte(), fault.as_byte());
        }
    }

    #[test]
    fn gaps_in_fault_range_are_not_faults() {
        assert_eq!(CriticalFault::from_byte(0x26), None);
        assert_eq!(CriticalFault::from_byte(0x2B), None);
        assert_eq!(StatusCode::from_byte(0x26), StatusCode::Unknown(0x26));
    }

    #[test]
    fn normal_states_are_not_faults() {
        assert!(!StatusCode::Enabled.is_fault());
        assert!(!StatusCode::Inhibited.is_fault());
        assert_eq!(StatusCode::from_byte(0x5E), StatusCode::Inhibited);
    }

    #[test]
    fn not_available_has_no_code() {
        assert_eq!(DeviceStatus::NotAvailable.code(), None);
        assert_eq!(
            DeviceStatus::Reported(StatusCode::Enabled).code(),
            Some(StatusCode::Enabled)
        );
        assert_eq!(DeviceStatus::NotAvailable.to_string(), "NOT_AVAILABLE");
    }

    #[test]
    fn fault_bytes_never_collide_with_sent_or_recognised_bytes() {
        let faults: HashSet<u8> = CriticalFault::ALL.iter().map(|f| f.as_byte()).collect();
        for command in Command::ALL {
            assert!(!faults.contains(&command.as_byte()), "{command}");
        }
        for r in Recognition::ALL {
            assert!(!faults.contains(&r.as_byte()), "{}", r.name());
        }
        assert!(!faults.contains(&StatusCode::ENABLED_BYTE));
        assert!(!faults.contains(&StatusCode::INHIBITED_BYTE));
    }

    #[test]
    fn accepting_branch_bytes_are_disjoint() {
        // Stacking and the bill type bytes are both looked for while accepting.
        let stacking = Recognition::Stacking.as_byte();
        assert!(!Recognition::is_bill_type(stacking));
        assert!(!Recognition::is_power_signal(stacking));
    }

    #[test]
    fn reset_branch_bytes_are_disjoint() {
        let power: HashSet<u8> = [Recognition::PowerSupplyOn1, Recognition::PowerSupplyOn2]
            .iter()
            .map(|r| r.as_byte())
            .collect();
        assert_eq!(power.len(), 2);
        for command in Command::ALL {
            assert!(!power.contains(&command.as_byte()));
        }
        for bill in Recognition::BILL_TYPES {
            assert!(!power.contains(&bill.as_byte()));
        }
    }

    #[test]
    fn idle_branch_marker_is_not_a_bill_type_or_command() {
        let marker = Recognition::BillValidated.as_byte();
        assert!(!Recognition::is_bill_type(marker));
        assert!(Command::ALL.iter().all(|c| c.as_byte() != marker));
    }

    #[test]
    fn bytes_shared_across_modes_are_intentional() {
        // Stack/Stacking, Enable/Enabled and Disable/Inhibited share a byte;
        // each is only ever sent or only ever matched within a given branch.
        assert_eq!(Command::Stack.as_byte(), Recognition::Stacking.as_byte());
        assert_eq!(Command::Enable.as_byte(), StatusCode::ENABLED_BYTE);
        assert_eq!(Command::Disable.as_byte(), StatusCode::INHIBITED_BYTE);
    }
}
