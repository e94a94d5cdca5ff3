//! Serial Bill Acceptor
//!
//! Drives a real ICT-104 acceptor: opens the port, resets the device,
//! checks its status, enables it and prints every accepted bill.
//!
//! Run with:
//!   cargo run --example serial_acceptor --features serial -- /dev/ttyUSB0 [config.json]
//!
//! Set RUST_LOG=ict104=debug to see every byte.

use ict104::acceptor::{BillAcceptor, Sink, SystemClock};
use ict104::config::AcceptorConfig;
use ict104::engine::AcceptEvent;
use ict104::SerialTransport;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

struct PrintSink;

impl Sink for PrintSink {
    fn on_bill_accepted(&self, event: AcceptEvent) {
        if event.is_mapped() {
            println!("accepted bill worth {}", event.amount);
        } else {
            println!("accepted a bill of unknown type");
        }
    }

    fn on_diagnostic(&self, line: &str) {
        println!("  | {line}");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let port = args.next().ok_or("usage: serial_acceptor <port> [config.json]")?;
    let mut config = match args.next() {
        Some(path) => AcceptorConfig::from_json_file(path)?,
        None => AcceptorConfig::default(),
    };
    config.port = Some(port);
    if config.bill_types.is_none() {
        config.bill_types = Some(vec![1000, 5000, 10000, 50000, 0]);
    }

    let transport = SerialTransport::new(config.serial.clone());
    let acceptor = Arc::new(BillAcceptor::from_config(
        &config,
        transport,
        PrintSink,
        SystemClock,
    )?);

    acceptor.open_port()?;
    let reader = Arc::clone(&acceptor);
    let _handle = acceptor.transport().spawn_reader(move |bytes| {
        if let Err(e) = reader.receive(bytes) {
            eprintln!("failed to handle inbound bytes: {e}");
        }
    })?;

    acceptor.initialize()?;
    std::thread::sleep(Duration::from_secs(2));

    println!("status: {}", acceptor.check_status()?);
    acceptor.enable()?;
    println!("accepting bills for 60 seconds...");
    std::thread::sleep(Duration::from_secs(60));

    acceptor.disable()?;
    acceptor.close_port()?;
    Ok(())
}
