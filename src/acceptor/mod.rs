//! Bill acceptor driver: the imperative shell around [`ProtocolEngine`].
//!
//! [`BillAcceptor`] guards the engine with a mutex so that bytes pushed by
//! the transport's reader and calls made by the controller never interleave
//! partial updates. Engine actions are executed while the lock is held
//! (sends and handshake pauses keep their order); accept events and
//! diagnostics are delivered to the [`Sink`] after the lock is released.
//!
//! # Example
//!
//! ```rust,no_run
//! use ict104::acceptor::{BillAcceptor, FnSink, Transport};
//! # fn run<T: Transport>(transport: T) -> Result<(), ict104::acceptor::AcceptorError> {
//! let acceptor = BillAcceptor::new(
//!     transport,
//!     FnSink(|event: ict104::engine::AcceptEvent| println!("{event}")),
//! );
//! acceptor.set_port("/dev/ttyUSB0")?;
//! acceptor.set_bill_types(&[1000, 5000, 10000, 50000, 0])?;
//! acceptor.open_port()?;
//! acceptor.initialize()?;
//! let status = acceptor.check_status()?;
//! acceptor.enable()?;
//! # let _ = status;
//! # Ok(())
//! # }
//! ```

mod error;
mod transport;

pub use error::AcceptorError;
pub use transport::{Clock, FnSink, Sink, SystemClock, Transport};

use crate::config::{validate_port, AcceptorConfig, ConfigError};
use crate::core::{Mode, StateTransition};
use crate::engine::{AcceptEvent, BillTypeTable, EngineAction, ProtocolEngine};
use crate::protocol::{format_frame, DeviceStatus, StatusCode};
use crate::retry::{PollContext, RetryPolicy, RetryViolation};
use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};
use stillwater::validation::Validation;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Something to hand to the sink once the engine lock is released.
enum Notice {
    Diagnostic(String),
    Accepted(AcceptEvent),
}

/// Result of executing a batch of engine actions.
#[derive(Default)]
struct Outcome {
    notices: Vec<Notice>,
    failure: Option<io::Error>,
}

/// Driver for one ICT-104 bill acceptor.
pub struct BillAcceptor<T: Transport, K: Sink, C: Clock = SystemClock> {
    id: Uuid,
    transport: T,
    sink: K,
    clock: C,
    policy: RetryPolicy,
    engine: Mutex<ProtocolEngine>,
    status_poll: Mutex<()>,
}

impl<T: Transport, K: Sink> BillAcceptor<T, K> {
    /// Create an acceptor with default settings and the system clock.
    pub fn new(transport: T, sink: K) -> Self {
        Self::with_clock(transport, sink, SystemClock)
    }
}

impl<T: Transport, K: Sink, C: Clock> BillAcceptor<T, K, C> {
    pub fn with_clock(transport: T, sink: K, clock: C) -> Self {
        Self::assemble(
            transport,
            sink,
            clock,
            RetryPolicy::default(),
            ProtocolEngine::new(),
        )
    }

    /// Create an acceptor from a validated configuration.
    ///
    /// Applies the port name and bill types when the configuration has them.
    pub fn from_config(
        config: &AcceptorConfig,
        transport: T,
        sink: K,
        clock: C,
    ) -> Result<Self, AcceptorError> {
        let config = config.clone().validated()?;
        let acceptor = Self::assemble(
            transport,
            sink,
            clock,
            config.retry_policy(),
            ProtocolEngine::with_settings(config.engine_settings()),
        );
        if let Some(port) = config.port.as_deref() {
            acceptor.set_port(port)?;
        }
        if let Some(values) = config.bill_types.as_deref() {
            acceptor.set_bill_types(values)?;
        }
        Ok(acceptor)
    }

    fn assemble(transport: T, sink: K, clock: C, policy: RetryPolicy, engine: ProtocolEngine) -> Self {
        let id = engine.id();
        info!(engine = %id, "bill acceptor created");
        Self {
            id,
            transport,
            sink,
            clock,
            policy,
            engine: Mutex::new(engine),
            status_poll: Mutex::new(()),
        }
    }

    /// Replace the status poll retry policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn mode(&self) -> Mode {
        self.lock().mode()
    }

    /// Run a read-only closure against the engine.
    pub fn inspect<R>(&self, f: impl FnOnce(&ProtocolEngine) -> R) -> R {
        f(&self.lock())
    }

    /// Retained mode transitions, oldest first.
    pub fn history(&self) -> Vec<StateTransition<Mode>> {
        self.lock().history().transitions().cloned().collect()
    }

    // ------------------------------------------------------------------------
    // Port lifecycle and configuration
    // ------------------------------------------------------------------------

    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }

    pub fn current_port(&self) -> Option<String> {
        self.transport.port_name()
    }

    /// Select the serial port. The port must be closed.
    pub fn set_port(&self, name: &str) -> Result<(), AcceptorError> {
        if self.transport.is_open() {
            return Err(AcceptorError::PortOpen("port"));
        }
        if let Validation::Failure(violations) = validate_port(name) {
            return Err(ConfigError::Invalid(violations.iter().cloned().collect()).into());
        }
        self.transport.set_port_name(name)?;
        info!(engine = %self.id, port = name, "port set");
        Ok(())
    }

    /// Configure the denominations of `BillType1..BillType5`.
    pub fn set_bill_types(&self, values: &[i64]) -> Result<(), AcceptorError> {
        let table = BillTypeTable::try_from_slice(values)?;
        self.lock().set_bill_types(table);
        Ok(())
    }

    pub fn open_port(&self) -> Result<(), AcceptorError> {
        let Some(port) = self.transport.port_name() else {
            return Err(AcceptorError::NotConfigured("port"));
        };
        if self.transport.is_open() {
            debug!(engine = %self.id, %port, "port already open");
            return Ok(());
        }
        match self.transport.open() {
            Ok(()) => {
                info!(engine = %self.id, %port, "port opened");
                self.sink.on_diagnostic(&format!("opened port {port}"));
                Ok(())
            }
            Err(e) => {
                error!(engine = %self.id, %port, error = %e, "failed to open port");
                Err(e.into())
            }
        }
    }

    pub fn close_port(&self) -> Result<(), AcceptorError> {
        match self.transport.close() {
            Ok(()) => {
                info!(engine = %self.id, "port closed");
                self.sink.on_diagnostic("closed port");
                Ok(())
            }
            Err(e) => {
                error!(engine = %self.id, error = %e, "failed to close port");
                Err(e.into())
            }
        }
    }

    // ------------------------------------------------------------------------
    // Controller operations
    // ------------------------------------------------------------------------

    /// Reset the peripheral. The power-on handshake completes in [`receive`](Self::receive).
    pub fn initialize(&self) -> Result<(), AcceptorError> {
        self.ensure_open()?;
        self.run(|engine| Ok(engine.begin_reset()))
    }

    /// Allow bill insertion. Requires an open port and configured bill types.
    pub fn enable(&self) -> Result<(), AcceptorError> {
        self.ensure_open()?;
        self.run(|engine| {
            engine
                .enable()
                .ok_or(AcceptorError::NotConfigured("bill types"))
        })
    }

    /// Inhibit bill insertion. Never changes the mode.
    pub fn disable(&self) -> Result<(), AcceptorError> {
        self.ensure_open()?;
        self.run(|engine| Ok(engine.disable()))
    }

    /// Ask the peripheral for its status.
    ///
    /// Returns [`DeviceStatus::NotAvailable`] without sending anything when
    /// the port is closed. A request that gets no reply is re-issued until
    /// the retry policy gives up, which yields
    /// [`AcceptorError::StatusTimeout`]. With an unbounded policy this call
    /// blocks until the peripheral answers.
    pub fn check_status(&self) -> Result<DeviceStatus, AcceptorError> {
        if !self.transport.is_open() {
            debug!(engine = %self.id, "status requested while port is closed");
            return Ok(DeviceStatus::NotAvailable);
        }

        let _poll = self.status_poll.lock().unwrap_or_else(PoisonError::into_inner);
        let started_at = self.clock.now();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let context = PollContext {
                attempt,
                started_at,
                now: self.clock.now(),
            };
            if let Validation::Failure(violations) = self.policy.enforce(&context) {
                let violations: Vec<RetryViolation> = violations.iter().cloned().collect();
                warn!(engine = %self.id, attempts = attempt - 1, ?violations, "giving up on status request");
                self.run(|engine| Ok(engine.abandon_status_check()))?;
                return Err(AcceptorError::StatusTimeout {
                    attempts: attempt - 1,
                    violations,
                });
            }

            if !self.transport.is_open() {
                self.run(|engine| Ok(engine.abandon_status_check()))?;
                return Ok(DeviceStatus::NotAvailable);
            }

            if let Err(e) = self.run(|engine| Ok(engine.begin_status_check())) {
                self.run(|engine| Ok(engine.abandon_status_check()))?;
                return Err(e);
            }

            match self.await_status() {
                Ok(Some(status)) => return Ok(DeviceStatus::Reported(status)),
                Ok(None) => {}
                Err(e) => {
                    self.run(|engine| Ok(engine.abandon_status_check()))?;
                    return Err(e);
                }
            }

            warn!(engine = %self.id, attempt, "status request timed out");
            self.sink
                .on_diagnostic(&format!("status request timed out (attempt {attempt})"));
        }
    }

    fn await_status(&self) -> Result<Option<StatusCode>, AcceptorError> {
        for _ in 0..self.policy.polls_per_attempt() {
            self.clock.sleep(self.policy.poll_interval());

            let pulled = self.transport.read_available()?;
            if !pulled.is_empty() {
                self.receive(&pulled)?;
            }

            if let Some(status) = self.lock().take_observed_status() {
                return Ok(Some(status));
            }
        }
        Ok(None)
    }

    // ------------------------------------------------------------------------
    // Inbound bytes
    // ------------------------------------------------------------------------

    /// Feed bytes delivered by the transport.
    ///
    /// An empty chunk with nothing pending triggers one read of whatever the
    /// transport still has buffered.
    pub fn receive(&self, chunk: &[u8]) -> Result<(), AcceptorError> {
        let mut notices = Vec::new();
        let outcome = {
            let mut engine = self.lock();

            let pulled;
            let bytes = if chunk.is_empty() && engine.pending().is_empty() {
                pulled = match self.transport.read_available() {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        debug!(engine = %self.id, error = %e, "secondary read failed");
                        Vec::new()
                    }
                };
                &pulled[..]
            } else {
                chunk
            };

            if !bytes.is_empty() {
                let frame = format_frame(bytes);
                debug!(engine = %self.id, %frame, "received");
                notices.push(Notice::Diagnostic(format!("received {frame}")));
            }

            let actions = engine.feed(bytes);
            self.execute(actions)
        };
        notices.extend(outcome.notices);
        self.dispatch(Outcome {
            notices,
            failure: outcome.failure,
        })
    }

    // ------------------------------------------------------------------------
    // Action execution
    // ------------------------------------------------------------------------

    fn ensure_open(&self) -> Result<(), AcceptorError> {
        if self.transport.is_open() {
            Ok(())
        } else {
            debug!(engine = %self.id, "port is closed, ignoring request");
            Err(AcceptorError::PortClosed)
        }
    }

    fn lock(&self) -> MutexGuard<'_, ProtocolEngine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn run(
        &self,
        f: impl FnOnce(&mut ProtocolEngine) -> Result<Vec<EngineAction>, AcceptorError>,
    ) -> Result<(), AcceptorError> {
        let outcome = {
            let mut engine = self.lock();
            let actions = f(&mut engine)?;
            self.execute(actions)
        };
        self.dispatch(outcome)
    }

    /// Execute actions in order. Called with the engine lock held.
    ///
    /// After a failed write the remaining sends and pauses are skipped, but
    /// accept events are still reported.
    fn execute(&self, actions: Vec<EngineAction>) -> Outcome {
        let mut outcome = Outcome::default();
        for action in actions {
            match action {
                EngineAction::Send(command) => {
                    if outcome.failure.is_some() {
                        continue;
                    }
                    match self.transport.write(&[command.as_byte()]) {
                        Ok(()) => {
                            debug!(engine = %self.id, %command, "sent");
                            outcome
                                .notices
                                .push(Notice::Diagnostic(format!("sent {command}")));
                        }
                        Err(e) => {
                            error!(engine = %self.id, %command, error = %e, "write failed");
                            outcome.failure = Some(e);
                        }
                    }
                }
                EngineAction::Pause(duration) => {
                    if outcome.failure.is_none() {
                        self.clock.sleep(duration);
                    }
                }
                EngineAction::BillAccepted(event) => {
                    outcome.notices.push(Notice::Diagnostic(event.to_string()));
                    outcome.notices.push(Notice::Accepted(event));
                }
                EngineAction::StatusObserved(status) => {
                    outcome
                        .notices
                        .push(Notice::Diagnostic(format!("status {status}")));
                }
                EngineAction::FaultDetected(fault) => {
                    outcome
                        .notices
                        .push(Notice::Diagnostic(format!("critical fault {fault}")));
                }
                EngineAction::ModeChanged { from, to } => {
                    outcome
                        .notices
                        .push(Notice::Diagnostic(format!("changed mode from {from} to {to}")));
                }
            }
        }
        outcome
    }

    /// Deliver notices to the sink. Called without the engine lock.
    fn dispatch(&self, outcome: Outcome) -> Result<(), AcceptorError> {
        for notice in outcome.notices {
            match notice {
                Notice::Diagnostic(line) => self.sink.on_diagnostic(&line),
                Notice::Accepted(event) => self.sink.on_bill_accepted(event),
            }
        }
        match outcome.failure {
            Some(e) => Err(AcceptorError::Transport(e)),
            None => Ok(()),
        }
    }
}
