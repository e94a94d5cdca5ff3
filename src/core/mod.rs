//! Core state types.
//!
//! - [`Mode`]: the protocol engine's operating mode
//! - [`State`]: trait implemented by tracked protocol states
//! - [`StateHistory`]: bounded, timestamped record of mode changes

mod history;
mod state;

pub use history::{StateHistory, StateTransition, DEFAULT_HISTORY_CAPACITY};
pub use state::{Mode, State};
