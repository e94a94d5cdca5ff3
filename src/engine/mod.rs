//! Pure protocol engine.
//!
//! This module is the "pure core": [`ProtocolEngine`] turns inbound bytes
//! and controller requests into [`EngineAction`]s without touching the
//! transport or the clock. The [`acceptor`](crate::acceptor) module is the
//! shell that executes those actions.

mod action;
mod machine;
mod table;

pub use action::{AcceptEvent, EngineAction};
pub use machine::{EngineSettings, ProtocolEngine};
pub use table::{BillTypeTable, BILL_TYPE_COUNT};
