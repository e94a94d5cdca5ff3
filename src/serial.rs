//! Serial port transport backed by the `serialport` crate.
//!
//! Enabled with the `serial` feature. Inbound bytes are delivered by a
//! reader thread started with [`SerialTransport::spawn_reader`], normally
//! wired to [`BillAcceptor::receive`](crate::acceptor::BillAcceptor::receive).
//! While that thread runs it is the only reader of the port, and
//! [`Transport::read_available`] returns nothing.

use crate::acceptor::Transport;
use crate::config::{Parity, SerialSettings, StopBits};
use serialport::SerialPort;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

const READ_CHUNK: usize = 64;

/// RS-232 link to the peripheral.
pub struct SerialTransport {
    settings: SerialSettings,
    port_name: Mutex<Option<String>>,
    port: Mutex<Option<Box<dyn SerialPort>>>,
    reading: Arc<AtomicBool>,
    reader_active: Arc<AtomicBool>,
}

impl SerialTransport {
    pub fn new(settings: SerialSettings) -> Self {
        Self {
            settings,
            port_name: Mutex::new(None),
            port: Mutex::new(None),
            reading: Arc::new(AtomicBool::new(false)),
            reader_active: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn settings(&self) -> &SerialSettings {
        &self.settings
    }

    /// Start a thread that reads the open port and hands every chunk to
    /// `on_data`. The thread exits when the port is closed.
    ///
    /// Only one reader runs at a time.
    pub fn spawn_reader<F>(&self, mut on_data: F) -> io::Result<JoinHandle<()>>
    where
        F: FnMut(&[u8]) + Send + 'static,
    {
        let mut reader = self
            .port()
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "port is not open"))?
            .try_clone()?;
        if self.reader_active.swap(true, Ordering::AcqRel) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "a reader is already running",
            ));
        }
        let reading = Arc::clone(&self.reading);
        let active = Arc::clone(&self.reader_active);

        let spawned = thread::Builder::new()
            .name("ict104-reader".to_string())
            .spawn(move || {
                let mut buf = [0u8; READ_CHUNK];
                while reading.load(Ordering::Acquire) {
                    match reader.read(&mut buf) {
                        Ok(0) => {}
                        Ok(n) => on_data(&buf[..n]),
                        Err(e) if e.kind() == io::ErrorKind::TimedOut => {}
                        Err(e) => {
                            warn!(error = %e, "serial read failed, stopping reader");
                            break;
                        }
                    }
                }
                active.store(false, Ordering::Release);
                debug!("serial reader stopped");
            });
        if spawned.is_err() {
            self.reader_active.store(false, Ordering::Release);
        }
        spawned
    }

    /// Whether a reader thread currently owns the inbound side of the port.
    pub fn has_reader(&self) -> bool {
        self.reader_active.load(Ordering::Acquire)
    }

    fn port(&self) -> MutexGuard<'_, Option<Box<dyn SerialPort>>> {
        self.port.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn not_open() -> io::Error {
        io::Error::new(io::ErrorKind::NotConnected, "port is not open")
    }
}

impl Transport for SerialTransport {
    fn open(&self) -> io::Result<()> {
        let name = self
            .port_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no port selected"))?;
        let data_bits = match self.settings.data_bits {
            5 => serialport::DataBits::Five,
            6 => serialport::DataBits::Six,
            7 => serialport::DataBits::Seven,
            8 => serialport::DataBits::Eight,
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("unsupported data bits: {other}"),
                ))
            }
        };
        let parity = match self.settings.parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        };
        let stop_bits = match self.settings.stop_bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        };

        let port = serialport::new(name.as_str(), self.settings.baud_rate)
            .data_bits(data_bits)
            .parity(parity)
            .stop_bits(stop_bits)
            .timeout(self.settings.read_timeout())
            .open()?;

        *self.port() = Some(port);
        self.reading.store(true, Ordering::Release);
        debug!(port = %name, baud = self.settings.baud_rate, "serial port opened");
        Ok(())
    }

    fn close(&self) -> io::Result<()> {
        self.reading.store(false, Ordering::Release);
        self.port().take();
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port().is_some()
    }

    fn port_name(&self) -> Option<String> {
        self.port_name
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_port_name(&self, name: &str) -> io::Result<()> {
        *self.port_name.lock().unwrap_or_else(PoisonError::into_inner) = Some(name.to_string());
        Ok(())
    }

    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        let mut guard = self.port();
        let port = guard.as_mut().ok_or_else(Self::not_open)?;
        port.write_all(bytes)?;
        port.flush()
    }

    fn read_available(&self) -> io::Result<Vec<u8>> {
        if self.has_reader() {
            return Ok(Vec::new());
        }
        let mut guard = self.port();
        let port = guard.as_mut().ok_or_else(Self::not_open)?;
        let available = port.bytes_to_read()? as usize;
        if available == 0 {
            return Ok(Vec::new());
        }
        let mut buf = vec![0u8; available];
        let n = port.read(&mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }
}
