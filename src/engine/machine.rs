//! ICT-104 protocol state machine.
//!
//! The engine owns the operating mode, the pending byte buffer, the
//! transient handshake flags and the denomination table. It performs no
//! I/O: every method returns the [`EngineAction`]s the driver must execute,
//! in order.
//!
//! # State Machine
//!
//! ```text
//!              BILL_VALIDATED
//!   ┌──────┐ ────────────────> ┌───────────┐
//!   │ Idle │                   │ Accepting │
//!   └──────┘ <──────────────── └───────────┘
//!    ↑    ↑   STACKING (emit)
//!    │    │
//!    │    │ status byte   ┌─────────────┐
//!    │    └───────────────│ CheckStatus │
//!    │                    └─────────────┘
//!    │ handshake done     ┌───────┐
//!    └────────────────────│ Reset │ <── critical fault (any mode but CheckStatus)
//!                         └───────┘
//! ```

use super::action::{AcceptEvent, EngineAction};
use super::table::BillTypeTable;
use crate::core::{Mode, State, StateHistory, StateTransition, DEFAULT_HISTORY_CAPACITY};
use crate::protocol::{format_frame, Command, CriticalFault, Recognition, StatusCode};
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Tunables of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Pause after acknowledging a reset or power-on before the next command
    pub reset_settle: Duration,
    /// Unrecognised bytes kept before the pending buffer is discarded
    pub max_pending_bytes: usize,
    /// Mode transitions retained for diagnostics
    pub history_capacity: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            reset_settle: Duration::from_millis(100),
            max_pending_bytes: 64,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// Protocol engine for one peripheral connection.
#[derive(Debug, Clone)]
pub struct ProtocolEngine {
    id: Uuid,
    mode: Mode,
    settings: EngineSettings,
    pending: Vec<u8>,
    bill_type: Option<u8>,
    bill_types: Option<BillTypeTable>,
    pending_critical_reset: bool,
    saw_one_power_signal: bool,
    observed_status: Option<StatusCode>,
    history: StateHistory<Mode>,
}

impl Default for ProtocolEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolEngine {
    /// Create an engine in `Idle` with an empty buffer.
    pub fn new() -> Self {
        Self::with_settings(EngineSettings::default())
    }

    pub fn with_settings(settings: EngineSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode: Mode::Idle,
            history: StateHistory::with_capacity(settings.history_capacity),
            settings,
            pending: Vec::new(),
            bill_type: None,
            bill_types: None,
            pending_critical_reset: false,
            saw_one_power_signal: false,
            observed_status: None,
        }
    }

    /// Identifier used to tell engines apart in logs.
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Bytes received but not yet consumed by a recognised pattern.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Bill type byte recorded for the bill currently in escrow.
    pub fn bill_type(&self) -> Option<u8> {
        self.bill_type
    }

    pub fn bill_types(&self) -> Option<&BillTypeTable> {
        self.bill_types.as_ref()
    }

    pub fn set_bill_types(&mut self, table: BillTypeTable) {
        debug!(engine = %self.id, values = ?table.values(), "bill types configured");
        self.bill_types = Some(table);
    }

    pub fn is_configured(&self) -> bool {
        self.bill_types.is_some()
    }

    pub fn pending_critical_reset(&self) -> bool {
        self.pending_critical_reset
    }

    pub fn saw_one_power_signal(&self) -> bool {
        self.saw_one_power_signal
    }

    pub fn history(&self) -> &StateHistory<Mode> {
        &self.history
    }

    /// Take the status byte observed since the last status request.
    pub fn take_observed_status(&mut self) -> Option<StatusCode> {
        self.observed_status.take()
    }

    /// Put the peripheral through a reset handshake.
    pub fn begin_reset(&mut self) -> Vec<EngineAction> {
        let mut actions = Vec::new();
        self.change_mode(Mode::Reset, "reset requested", &mut actions);
        actions.push(EngineAction::Send(Command::Reset));
        actions
    }

    /// Issue a status request; the reply lands in the observed-status slot.
    ///
    /// Bytes still pending belong to an earlier exchange and are dropped, so
    /// the first byte after the request is read as the reply.
    pub fn begin_status_check(&mut self) -> Vec<EngineAction> {
        let mut actions = Vec::new();
        if !self.pending.is_empty() {
            debug!(
                engine = %self.id,
                frame = %format_frame(&self.pending),
                "dropping stale bytes before status request"
            );
            self.pending.clear();
        }
        self.observed_status = None;
        self.change_mode(Mode::CheckStatus, "status requested", &mut actions);
        actions.push(EngineAction::Send(Command::CheckStatus));
        actions
    }

    /// Leave `CheckStatus` after the driver gave up waiting for a reply.
    pub fn abandon_status_check(&mut self) -> Vec<EngineAction> {
        let mut actions = Vec::new();
        if self.mode == Mode::CheckStatus {
            self.change_mode(Mode::Idle, "status check abandoned", &mut actions);
        }
        actions
    }

    /// Allow bill insertion. Returns `None` when no bill types are configured.
    pub fn enable(&self) -> Option<Vec<EngineAction>> {
        self.is_configured()
            .then(|| vec![EngineAction::Send(Command::Enable)])
    }

    /// Inhibit bill insertion.
    pub fn disable(&self) -> Vec<EngineAction> {
        vec![EngineAction::Send(Command::Disable)]
    }

    /// Append inbound bytes and interpret the buffer.
    ///
    /// A critical fault is recognised at the start of the buffer or at the
    /// start of the new chunk, so unrecognised leftovers cannot hide it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<EngineAction> {
        let chunk_first = chunk.first().copied();
        self.pending.extend_from_slice(chunk);
        let mut actions = Vec::new();
        if self.pending.is_empty() {
            return actions;
        }

        let frame = self.pending.clone();
        debug!(engine = %self.id, mode = %self.mode, frame = %format_frame(&frame), "interpreting");
        self.interpret(&frame, chunk_first, &mut actions);

        if self.pending.len() > self.settings.max_pending_bytes {
            warn!(
                engine = %self.id,
                mode = %self.mode,
                discarded = self.pending.len(),
                "pending buffer overflow, discarding unrecognised bytes"
            );
            self.pending.clear();
        }
        actions
    }

    fn interpret(
        &mut self,
        frame: &[u8],
        chunk_first: Option<u8>,
        actions: &mut Vec<EngineAction>,
    ) {
        let Some(&first) = frame.first() else {
            return;
        };

        if self.mode != Mode::CheckStatus {
            let fault = CriticalFault::from_byte(first)
                .or_else(|| chunk_first.and_then(CriticalFault::from_byte));
            if let Some(fault) = fault {
                if self.mode.holds_bill() {
                    warn!(engine = %self.id, bill_type = ?self.bill_type, "bill in escrow abandoned");
                    self.bill_type = None;
                }
                warn!(engine = %self.id, %fault, "critical fault, resetting");
                actions.push(EngineAction::FaultDetected(fault));
                self.change_mode(Mode::Reset, "critical fault", actions);
                self.pending_critical_reset = true;
                self.pending.clear();
                return;
            }
        }

        match self.mode {
            Mode::Idle => self.on_idle(frame, actions),
            Mode::Accepting => self.on_accepting(frame, actions),
            Mode::Reset => self.on_reset(frame, actions),
            Mode::CheckStatus => self.on_status(first, actions),
        }
    }

    fn on_idle(&mut self, frame: &[u8], actions: &mut Vec<EngineAction>) {
        let marker = Recognition::BillValidated.as_byte();
        let Some(position) = frame.iter().position(|&b| b == marker) else {
            return;
        };

        self.bill_type = frame.get(position + 1).copied();
        if self.bill_type.is_some() {
            actions.push(EngineAction::Send(Command::Hold));
            actions.push(EngineAction::Send(Command::Accept));
        } else {
            debug!(engine = %self.id, "bill validated without bill type, waiting for it");
        }
        self.change_mode(Mode::Accepting, "bill validated", actions);
        self.pending.clear();
    }

    fn on_accepting(&mut self, frame: &[u8], actions: &mut Vec<EngineAction>) {
        if frame.contains(&Recognition::Stacking.as_byte()) {
            self.pending.clear();
            let event = self.finalize_acceptance();
            actions.push(EngineAction::BillAccepted(event));
            self.change_mode(Mode::Idle, "bill stacked", actions);
        } else if frame.iter().any(|&b| Recognition::is_bill_type(b)) {
            self.bill_type = frame.first().copied();
            actions.push(EngineAction::Send(Command::Hold));
            actions.push(EngineAction::Send(Command::Accept));
            self.pending.clear();
        }
    }

    fn on_reset(&mut self, frame: &[u8], actions: &mut Vec<EngineAction>) {
        if self.pending_critical_reset {
            actions.push(EngineAction::Send(Command::Accept));
            self.pending.clear();
            self.change_mode(Mode::Idle, "critical fault acknowledged", actions);
            actions.push(EngineAction::Pause(self.settings.reset_settle));
            match self.enable() {
                Some(enable) => actions.extend(enable),
                None => debug!(engine = %self.id, "bill types not configured, staying disabled"),
            }
            self.pending_critical_reset = false;
            return;
        }

        let on1 = frame.contains(&Recognition::PowerSupplyOn1.as_byte());
        let on2 = frame.contains(&Recognition::PowerSupplyOn2.as_byte());

        if on1 && on2 {
            self.finish_power_on("power-on signal", actions);
        } else if frame.iter().any(|&b| Recognition::is_power_signal(b)) {
            if self.saw_one_power_signal {
                info!(engine = %self.id, "second power-on signal");
                self.finish_power_on("second power-on signal", actions);
                self.saw_one_power_signal = false;
            } else {
                info!(engine = %self.id, "only one power-on signal, waiting for another");
                actions.push(EngineAction::Send(Command::Accept));
                self.pending.clear();
                self.saw_one_power_signal = true;
            }
        }
    }

    fn finish_power_on(&mut self, cause: &str, actions: &mut Vec<EngineAction>) {
        actions.push(EngineAction::Send(Command::Accept));
        self.pending.clear();
        self.change_mode(Mode::Idle, cause, actions);
        actions.push(EngineAction::Pause(self.settings.reset_settle));
        actions.extend(self.disable());
    }

    fn on_status(&mut self, first: u8, actions: &mut Vec<EngineAction>) {
        let status = StatusCode::from_byte(first);
        info!(engine = %self.id, %status, "status observed");
        self.observed_status = Some(status);
        actions.push(EngineAction::StatusObserved(status));
        self.pending.clear();
        self.change_mode(Mode::Idle, "status received", actions);
    }

    fn finalize_acceptance(&mut self) -> AcceptEvent {
        let bill_type = self.bill_type.take();
        let amount = bill_type.and_then(|byte| self.bill_types.as_ref()?.amount_for(byte));

        match amount {
            Some(amount) => {
                info!(engine = %self.id, amount, "bill accepted");
                AcceptEvent::new(amount)
            }
            None => {
                warn!(
                    engine = %self.id,
                    bill_type = ?bill_type,
                    configured = self.is_configured(),
                    "could not map bill type to a denomination"
                );
                AcceptEvent::unmapped()
            }
        }
    }

    fn change_mode(&mut self, to: Mode, cause: &str, actions: &mut Vec<EngineAction>) {
        let from = self.mode;
        info!(engine = %self.id, "changed mode from {} to {} ({})", from.name(), to.name(), cause);
        self.history.record(StateTransition {
            from,
            to,
            timestamp: Utc::now(),
            cause: cause.to_string(),
        });
        self.mode = to;
        actions.push(EngineAction::ModeChanged { from, to });
    }
}
