//! Context provided to retry checks.

use std::time::{Duration, Instant};

/// Where a status poll stands when deciding whether to try again
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollContext {
    /// Attempt about to be made, starting at 1
    pub attempt: usize,
    /// When the first attempt started
    pub started_at: Instant,
    /// Current time, as seen by the driver's clock
    pub now: Instant,
}

impl PollContext {
    /// Time spent since the first attempt (pure)
    pub fn elapsed(&self) -> Duration {
        self.now.saturating_duration_since(self.started_at)
    }
}
