//! ict104: protocol engine and driver for ICT-104 RS-232 bill acceptors
//!
//! The crate follows a "pure core, imperative shell" split. The core
//! [`engine::ProtocolEngine`] interprets inbound bytes and decides what to
//! send, without doing any I/O. The shell [`acceptor::BillAcceptor`] owns
//! the transport, serialises access to the engine and executes its actions.
//!
//! # Modules
//!
//! - [`core`]: operating [`Mode`](core::Mode) and bounded transition history
//! - [`protocol`]: command, recognition and status byte vocabularies
//! - [`engine`]: the protocol state machine
//! - [`retry`]: bounded retry policy for status polls
//! - [`config`]: serde configuration with accumulated validation
//! - [`acceptor`]: the driver, plus its transport, sink and clock traits
//! - `serial` (feature `serial`): transport over a real serial port
//!
//! # Example
//!
//! ```rust
//! use ict104::core::Mode;
//! use ict104::engine::{AcceptEvent, BillTypeTable, EngineAction, ProtocolEngine};
//! use ict104::protocol::Command;
//!
//! let mut engine = ProtocolEngine::new();
//! engine.set_bill_types(BillTypeTable::new([100, 500, 1000, 5000, 10000]));
//!
//! // Bill validated, type 3: hold it in escrow and accept it.
//! let actions = engine.feed(&[0x81, 0x42]);
//! let sent: Vec<Command> = actions.iter().filter_map(EngineAction::command).collect();
//! assert_eq!(sent, vec![Command::Hold, Command::Accept]);
//! assert_eq!(engine.mode(), Mode::Accepting);
//!
//! // Stacked: the bill is ours.
//! let actions = engine.feed(&[0x10]);
//! assert!(actions.contains(&EngineAction::BillAccepted(AcceptEvent::new(1000))));
//! assert_eq!(engine.mode(), Mode::Idle);
//! ```

pub mod acceptor;
pub mod config;
pub mod core;
pub mod engine;
pub mod protocol;
pub mod retry;
#[cfg(feature = "serial")]
pub mod serial;

// Re-export commonly used types
pub use acceptor::{AcceptorError, BillAcceptor, Sink, Transport};
pub use config::AcceptorConfig;
pub use core::Mode;
pub use engine::{AcceptEvent, ProtocolEngine};
pub use protocol::{DeviceStatus, StatusCode};
#[cfg(feature = "serial")]
pub use serial::SerialTransport;
