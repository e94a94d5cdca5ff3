//! ICT-104 wire vocabulary.
//!
//! The protocol is a fixed set of single-byte commands, recognition bytes
//! and status codes exchanged over a 9600 baud, 8E1 serial line.

mod bytes;
mod names;

pub use bytes::{Command, CriticalFault, DeviceStatus, Recognition, StatusCode};
pub use names::{format_frame, received_name};
