//! Line sources: child-process stdout and serial port readers.
//!
//! A source runs one dedicated background thread that blocks on the
//! underlying read call and forwards non-empty trimmed lines through an mpsc
//! channel. The receiving side (the monitor's event loop) is the only place
//! telemetry is processed, so all session/chart state stays on one thread.

use crate::error::Result;
use crate::telemetry::SourceConfig;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Read timeout applied to the serial port so the reader thread can re-check
/// the running flag between reads.
pub const SERIAL_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// How long [`SourceHandle::stop`] waits for the reader thread before
/// abandoning it. Longer than [`SERIAL_READ_TIMEOUT`] so an idle serial read
/// can expire and observe the stopped flag within the wait.
pub const JOIN_TIMEOUT: Duration = Duration::from_millis(1500);

/// One event from the background reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    /// A non-empty trimmed line of telemetry text.
    Line(String),
    /// The channel failed to open or a read failed. Sent at most once;
    /// the read loop ends afterwards and there is no automatic retry.
    Failed(String),
}

/// Handle to a running line source.
///
/// Returned by [`SourceHandle::start`] together with the event receiver.
/// Dropping the handle stops the source.
#[derive(Debug)]
pub struct SourceHandle {
    running: Arc<AtomicBool>,
    child: Arc<Mutex<Option<Child>>>,
    reader: Option<JoinHandle<()>>,
}

impl SourceHandle {
    /// Start reading lines from the configured source.
    ///
    /// Opening the underlying channel happens on the reader thread, so an
    /// open failure arrives as a single [`SourceEvent::Failed`] rather than
    /// an error here.
    pub fn start(config: SourceConfig) -> (SourceHandle, Receiver<SourceEvent>) {
        let (tx, rx) = mpsc::channel();
        let running = Arc::new(AtomicBool::new(true));
        let child = Arc::new(Mutex::new(None));

        let reader = {
            let running = Arc::clone(&running);
            let child = Arc::clone(&child);
            thread::spawn(move || match config {
                SourceConfig::Simulator { command } => {
                    read_from_child(&command, &running, &child, &tx)
                }
                SourceConfig::Serial { port, baud_rate } => {
                    read_from_serial(&port, baud_rate, &running, &tx)
                }
            })
        };

        (
            SourceHandle {
                running,
                child,
                reader: Some(reader),
            },
            rx,
        )
    }

    /// Whether the reader thread is still alive.
    pub fn is_running(&self) -> bool {
        self.reader
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Stop the source.
    ///
    /// Flips the running flag, terminates the child process if one was
    /// spawned (which unblocks a pending stdout read), and joins the reader
    /// thread with a bounded wait. Safe to call repeatedly or when the
    /// source already ended on its own.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);

        if let Ok(mut slot) = self.child.lock() {
            if let Some(mut child) = slot.take() {
                let _ = child.kill();
                let _ = child.wait();
            }
        }

        if let Some(handle) = self.reader.take() {
            let deadline = Instant::now() + JOIN_TIMEOUT;
            while !handle.is_finished() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(10));
            }
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                warn!("reader thread did not exit within {:?}, abandoning it", JOIN_TIMEOUT);
            }
        }
    }
}

impl Drop for SourceHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spawn the simulator executable and forward its stdout line by line.
fn read_from_child(
    command: &Path,
    running: &AtomicBool,
    slot: &Mutex<Option<Child>>,
    tx: &Sender<SourceEvent>,
) {
    let spawned = Command::new(command)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn();

    let mut child = match spawned {
        Ok(child) => child,
        Err(err) => {
            let _ = tx.send(SourceEvent::Failed(format!(
                "failed to spawn {}: {}",
                command.display(),
                err
            )));
            return;
        }
    };

    let stdout = match child.stdout.take() {
        Some(stdout) => stdout,
        None => {
            let _ = child.kill();
            let _ = tx.send(SourceEvent::Failed(format!(
                "no stdout pipe from {}",
                command.display()
            )));
            return;
        }
    };

    // Park the child where stop() can reach it to unblock the read below.
    if let Ok(mut guard) = slot.lock() {
        *guard = Some(child);
    }

    for line in BufReader::new(stdout).lines() {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        match line {
            Ok(line) => {
                if !forward_line(&line, tx) {
                    break;
                }
            }
            Err(err) => {
                let _ = tx.send(SourceEvent::Failed(format!("read error: {}", err)));
                break;
            }
        }
    }

    debug!("child process stream closed");
}

/// Open the serial port and forward newline-delimited UTF-8 lines.
fn read_from_serial(port_name: &str, baud_rate: u32, running: &AtomicBool, tx: &Sender<SourceEvent>) {
    let port = serialport::new(port_name, baud_rate)
        .timeout(SERIAL_READ_TIMEOUT)
        .open();

    let port = match port {
        Ok(port) => port,
        Err(err) => {
            let _ = tx.send(SourceEvent::Failed(format!(
                "failed to open {}: {}",
                port_name, err
            )));
            return;
        }
    };

    let mut reader = BufReader::new(port);
    let mut buf = String::new();

    while running.load(Ordering::SeqCst) {
        match reader.read_line(&mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let forwarded = forward_line(&buf, tx);
                buf.clear();
                if !forwarded {
                    break;
                }
            }
            // Timed-out read: keep any partial line in buf and re-check the
            // running flag.
            Err(err) if err.kind() == io::ErrorKind::TimedOut => continue,
            Err(err) => {
                let _ = tx.send(SourceEvent::Failed(format!(
                    "read error on {}: {}",
                    port_name, err
                )));
                break;
            }
        }
    }

    debug!("serial port {} closed", port_name);
}

/// Send the trimmed line if non-empty. Returns false when the receiver is
/// gone and the loop should end.
fn forward_line(line: &str, tx: &Sender<SourceEvent>) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return true;
    }
    tx.send(SourceEvent::Line(trimmed.to_string())).is_ok()
}

/// A serial port visible to the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Port name suitable for [`SourceConfig::Serial`], e.g. "/dev/ttyUSB0"
    pub name: String,
    /// Human-readable description, e.g. "USB Serial (FTDI)"
    pub description: String,
}

/// Enumerate the serial ports currently available, sorted by name.
pub fn list_ports() -> Result<Vec<PortInfo>> {
    let mut out = Vec::new();

    for port in serialport::available_ports()? {
        let description = match port.port_type {
            serialport::SerialPortType::UsbPort(info) => {
                let mut parts = Vec::new();
                if let Some(manufacturer) = info.manufacturer {
                    parts.push(manufacturer);
                }
                if let Some(product) = info.product {
                    parts.push(product);
                }
                if parts.is_empty() {
                    "USB Serial".to_string()
                } else {
                    parts.join(" ")
                }
            }
            serialport::SerialPortType::BluetoothPort => "Bluetooth".to_string(),
            serialport::SerialPortType::PciPort => "PCI".to_string(),
            serialport::SerialPortType::Unknown => String::new(),
        };

        out.push(PortInfo {
            name: port.port_name,
            description,
        });
    }

    out.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(out)
}
