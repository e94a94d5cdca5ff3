//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use ict104::acceptor::{Clock, Sink, Transport};
use ict104::engine::AcceptEvent;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

/// In-memory transport.
///
/// Written bytes are recorded. A reply scripted for a command byte is queued
/// for [`Transport::read_available`] every time that command is written.
#[derive(Default)]
pub struct MockTransport {
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    open: bool,
    port_name: Option<String>,
    written: Vec<u8>,
    inbound: VecDeque<u8>,
    replies: HashMap<u8, Vec<u8>>,
    fail_writes: bool,
    fail_open: bool,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A transport with a port selected and already open.
    pub fn opened() -> Arc<Self> {
        let transport = Self::new();
        {
            let mut state = transport.state.lock().unwrap();
            state.port_name = Some("/dev/ttyMOCK0".to_string());
            state.open = true;
        }
        transport
    }

    pub fn written(&self) -> Vec<u8> {
        self.state.lock().unwrap().written.clone()
    }

    pub fn clear_written(&self) {
        self.state.lock().unwrap().written.clear();
    }

    pub fn reply_to(&self, command: u8, reply: &[u8]) {
        self.state
            .lock()
            .unwrap()
            .replies
            .insert(command, reply.to_vec());
    }

    pub fn push_inbound(&self, bytes: &[u8]) {
        self.state.lock().unwrap().inbound.extend(bytes);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().unwrap().fail_writes = fail;
    }

    pub fn fail_open(&self, fail: bool) {
        self.state.lock().unwrap().fail_open = fail;
    }
}

impl Transport for MockTransport {
    fn open(&self) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_open {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "port busy"));
        }
        state.open = true;
        Ok(())
    }

    fn close(&self) -> io::Result<()> {
        self.state.lock().unwrap().open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.state.lock().unwrap().open
    }

    fn port_name(&self) -> Option<String> {
        self.state.lock().unwrap().port_name.clone()
    }

    fn set_port_name(&self, name: &str) -> io::Result<()> {
        self.state.lock().unwrap().port_name = Some(name.to_string());
        Ok(())
    }

    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "cable unplugged"));
        }
        state.written.extend_from_slice(bytes);
        for byte in bytes {
            if let Some(reply) = state.replies.get(byte).cloned() {
                state.inbound.extend(reply);
            }
        }
        Ok(())
    }

    fn read_available(&self) -> io::Result<Vec<u8>> {
        Ok(self.state.lock().unwrap().inbound.drain(..).collect())
    }
}

/// Clock that only moves when slept on.
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(Vec::new()),
        })
    }

    pub fn elapsed(&self) -> Duration {
        *self.offset.lock().unwrap()
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock().unwrap()
    }

    fn sleep(&self, duration: Duration) {
        *self.offset.lock().unwrap() += duration;
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// Sink that records everything it is given.
///
/// An optional hook runs after every accept event, which lets a test call
/// back into the acceptor from inside the sink.
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<AcceptEvent>>,
    diagnostics: Mutex<Vec<String>>,
    on_accept: OnceLock<Box<dyn Fn(AcceptEvent) + Send + Sync>>,
}

impl CollectingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<AcceptEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn amounts(&self) -> Vec<i64> {
        self.events().iter().map(|e| e.amount).collect()
    }

    pub fn diagnostics(&self) -> Vec<String> {
        self.diagnostics.lock().unwrap().clone()
    }

    pub fn has_diagnostic(&self, needle: &str) -> bool {
        self.diagnostics().iter().any(|line| line.contains(needle))
    }

    pub fn set_on_accept(&self, hook: impl Fn(AcceptEvent) + Send + Sync + 'static) {
        assert!(self.on_accept.set(Box::new(hook)).is_ok(), "hook already set");
    }
}

impl Sink for CollectingSink {
    fn on_bill_accepted(&self, event: AcceptEvent) {
        self.events.lock().unwrap().push(event);
        if let Some(hook) = self.on_accept.get() {
            hook(event);
        }
    }

    fn on_diagnostic(&self, line: &str) {
        self.diagnostics.lock().unwrap().push(line.to_string());
    }
}
