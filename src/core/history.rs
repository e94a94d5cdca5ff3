//! Mode transition history.
//!
//! The engine records every mode change with a timestamp and the cause
//! that triggered it. The history is bounded: once `capacity` transitions
//! are stored, the oldest entry is dropped for each new one.

use super::state::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of transitions kept by [`StateHistory::new`].
pub const DEFAULT_HISTORY_CAPACITY: usize = 64;

/// Record of a single state transition.
///
/// ```rust
/// use ict104::core::{Mode, StateTransition};
/// use chrono::Utc;
///
/// let transition = StateTransition {
///     from: Mode::Idle,
///     to: Mode::Accepting,
///     timestamp: Utc::now(),
///     cause: "bill validated".to_string(),
/// };
/// assert_eq!(transition.to, Mode::Accepting);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateTransition<S: State> {
    /// The state being transitioned from
    pub from: S,
    /// The state being transitioned to
    pub to: S,
    /// When the transition occurred
    pub timestamp: DateTime<Utc>,
    /// What triggered the transition
    pub cause: String,
}

/// Bounded, ordered history of state transitions.
///
/// ```rust
/// use ict104::core::{Mode, StateHistory, StateTransition};
/// use chrono::Utc;
///
/// let mut history = StateHistory::with_capacity(2);
/// for (from, to) in [
///     (Mode::Idle, Mode::Reset),
///     (Mode::Reset, Mode::Idle),
///     (Mode::Idle, Mode::Accepting),
/// ] {
///     history.record(StateTransition {
///         from,
///         to,
///         timestamp: Utc::now(),
///         cause: "test".to_string(),
///     });
/// }
///
/// // Oldest transition was evicted.
/// assert_eq!(history.len(), 2);
/// assert_eq!(history.get_path(), vec![&Mode::Reset, &Mode::Idle, &Mode::Accepting]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateHistory<S: State> {
    transitions: VecDeque<StateTransition<S>>,
    capacity: usize,
}

impl<S: State> Default for StateHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> StateHistory<S> {
    /// Create an empty history holding up to [`DEFAULT_HISTORY_CAPACITY`] entries.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create an empty history holding up to `capacity` entries.
    ///
    /// A capacity of zero disables recording.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            transitions: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
            capacity,
        }
    }

    /// Record a transition, evicting the oldest one when full.
    pub fn record(&mut self, transition: StateTransition<S>) {
        if self.capacity == 0 {
            return;
        }
        while self.transitions.len() >= self.capacity {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    /// Get the path of states traversed.
    ///
    /// Returns the `from` state of the oldest retained transition followed
    /// by the `to` state of each transition.
    pub fn get_path(&self) -> Vec<&S> {
        let mut path = Vec::with_capacity(self.transitions.len() + 1);
        if let Some(first) = self.transitions.front() {
            path.push(&first.from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Most recent transition, if any.
    pub fn last(&self) -> Option<&StateTransition<S>> {
        self.transitions.back()
    }

    /// Iterate over retained transitions, oldest first.
    pub fn transitions(&self) -> impl Iterator<Item = &StateTransition<S>> {
        self.transitions.iter()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
