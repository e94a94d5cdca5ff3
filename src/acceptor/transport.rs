//! Collaborators of the acceptor: byte transport, event sink and clock.
//!
//! All three are shared between the transport's reader (which calls
//! [`BillAcceptor::receive`](super::BillAcceptor::receive)) and the
//! controller, so every method takes `&self`.

use crate::engine::AcceptEvent;
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Byte link to the peripheral.
///
/// Inbound bytes are normally pushed into the acceptor by the transport's
/// own reader. [`read_available`](Transport::read_available) is the pull
/// path: it returns whatever is buffered and not yet delivered, or nothing.
pub trait Transport: Send + Sync {
    fn open(&self) -> io::Result<()>;

    fn close(&self) -> io::Result<()>;

    fn is_open(&self) -> bool;

    /// Name of the configured port, if any.
    fn port_name(&self) -> Option<String>;

    /// Select the port to open. Only called while closed.
    fn set_port_name(&self, name: &str) -> io::Result<()>;

    fn write(&self, bytes: &[u8]) -> io::Result<()>;

    /// Drain bytes that arrived but were not delivered yet.
    ///
    /// Must return nothing while the transport's own reader is delivering
    /// bytes, so that one frame is never split between two readers.
    fn read_available(&self) -> io::Result<Vec<u8>>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn open(&self) -> io::Result<()> {
        (**self).open()
    }

    fn close(&self) -> io::Result<()> {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn port_name(&self) -> Option<String> {
        (**self).port_name()
    }

    fn set_port_name(&self, name: &str) -> io::Result<()> {
        (**self).set_port_name(name)
    }

    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        (**self).write(bytes)
    }

    fn read_available(&self) -> io::Result<Vec<u8>> {
        (**self).read_available()
    }
}

/// Receiver of accept events and diagnostic lines.
///
/// Called without the engine lock held, so a sink may call back into the
/// acceptor (for example to disable it after a bill).
pub trait Sink: Send + Sync {
    /// Fired exactly once per stacked bill.
    fn on_bill_accepted(&self, event: AcceptEvent);

    /// Human-readable trace line.
    fn on_diagnostic(&self, _line: &str) {}
}

impl<S: Sink + ?Sized> Sink for Arc<S> {
    fn on_bill_accepted(&self, event: AcceptEvent) {
        (**self).on_bill_accepted(event)
    }

    fn on_diagnostic(&self, line: &str) {
        (**self).on_diagnostic(line)
    }
}

/// Sink that forwards accept events to a closure and drops diagnostics.
pub struct FnSink<F>(pub F);

impl<F> Sink for FnSink<F>
where
    F: Fn(AcceptEvent) + Send + Sync,
{
    fn on_bill_accepted(&self, event: AcceptEvent) {
        (self.0)(event)
    }
}

/// Time source and sleep primitive.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    fn sleep(&self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Wall clock backed by `std::thread::sleep`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration)
    }
}
