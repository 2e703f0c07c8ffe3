//! # enviromon - Environmental Telemetry Monitor
//!
//! A clean, minimalist Rust crate for ingesting live environmental sensor
//! readings (temperature, humidity, CO2) from either a spawned simulator
//! process or a serial port, with synchronous fan-out to display/chart/gauge
//! consumers and on-demand CSV export of the session history.
//!
//! ## Features
//!
//! - **Line sources**: child-process stdout or serial port, read on one
//!   background thread and delivered in order over an mpsc channel
//! - **Telemetry parsing**: the `T:<t>,H:<h>,CO2:<c>` wire format, with typed
//!   rejection of malformed lines
//! - **Fan-out bus**: synchronous, order-preserving delivery to registered
//!   consumers; parse failures reach raw-line consumers only
//! - **Session store**: append-only raw line history with filtered CSV export
//! - **Library + Binary**: use as a crate or through the `enviromon` CLI
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use enviromon::{Monitor, SourceConfig};
//! use std::time::Duration;
//!
//! fn main() -> enviromon::Result<()> {
//!     let mut monitor = Monitor::new();
//!     monitor.start(SourceConfig::serial("/dev/ttyUSB0", 9600));
//!     monitor.run_for(Some(Duration::from_secs(60)));
//!     monitor.stop();
//!
//!     let summary = monitor.export_csv("sensor_data.csv".as_ref())?;
//!     println!("exported {}/{} records", summary.written, summary.total);
//!     Ok(())
//! }
//! ```

pub mod bus;
pub mod consumers;
pub mod error;
pub mod monitor;
pub mod session;
pub mod source;
pub mod telemetry;

// Re-export public API
pub use bus::{TelemetryBus, TelemetryConsumer};
pub use consumers::{AirQuality, ChartRecorder, GaugePanel, LogSink};
pub use error::{MonitorError, Result};
pub use monitor::Monitor;
pub use session::{ExportSummary, SessionStore, CSV_HEADER};
pub use source::{list_ports, PortInfo, SourceEvent, SourceHandle};
pub use telemetry::{parse_line, ParseError, Reading, SourceConfig};

/// The default serial baud rate
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Baud rate presets offered by the CLI; any other positive integer is also
/// accepted as a custom rate
pub const BAUD_RATE_PRESETS: [u32; 5] = [9600, 19200, 38400, 57600, 115200];
