//! Human-readable names for wire bytes, used only in log lines.

use super::bytes::{CriticalFault, Recognition, StatusCode};
use std::fmt::Write;

/// Name of a byte received from the peripheral, if it has one.
///
/// Recognition bytes win over status names; `0x3E`/`0x5E` are named after
/// the status they report.
pub fn received_name(byte: u8) -> Option<&'static str> {
    if let Some(r) = Recognition::from_byte(byte) {
        return Some(r.name());
    }
    if let Some(fault) = CriticalFault::from_byte(byte) {
        return Some(fault.name());
    }
    match byte {
        StatusCode::ENABLED_BYTE => Some(StatusCode::Enabled.name()),
        StatusCode::INHIBITED_BYTE => Some(StatusCode::Inhibited.name()),
        _ => None,
    }
}

/// Render a received frame as `0x81 (BILL_VALIDATED) 0x42 (BILL_TYPE_3)`.
///
/// ```rust
/// use ict104::protocol::format_frame;
///
/// assert_eq!(format_frame(&[0x81, 0x42]), "0x81 (BILL_VALIDATED) 0x42 (BILL_TYPE_3)");
/// assert_eq!(format_frame(&[0x77]), "0x77");
/// assert_eq!(format_frame(&[]), "");
/// ```
pub fn format_frame(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 8);
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "0x{byte:02X}");
        if let Some(name) = received_name(*byte) {
            let _ = write!(out, " ({name})");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn received_names_prefer_recognition() {
        assert_eq!(received_name(0x10), Some("STACKING"));
        assert_eq!(received_name(0x80), Some("POWER_SUPPLY_ON_1"));
    }

    #[test]
    fn received_names_cover_status_bytes() {
        assert_eq!(received_name(0x3E), Some("ENABLED"));
        assert_eq!(received_name(0x5E), Some("INHIBITED"));
        assert_eq!(received_name(0x24), Some("STACKER_OPEN"));
        assert_eq!(received_name(0xFF), None);
    }

    #[test]
    fn format_frame_handles_unknown_bytes() {
        assert_eq!(format_frame(&[0x2F, 0x01]), "0x2F (ERROR_STATUS_EXCLUSION) 0x01");
    }
}
