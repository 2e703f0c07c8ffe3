//! Data structures for telemetry readings and source selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A single parsed environmental reading.
///
/// Created by [`crate::telemetry::parse_line`] from exactly one raw line and
/// never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Temperature in degrees Celsius
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    /// CO2 concentration in ppm
    pub co2: f64,
}

/// Where telemetry lines come from for one monitoring session.
///
/// Selected once per session start and immutable for the session's duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SourceConfig {
    /// Spawn a child process (no arguments) and read its standard output.
    Simulator {
        /// Path to the simulator executable
        command: PathBuf,
    },
    /// Open a serial port and read newline-delimited UTF-8 text.
    Serial {
        /// Port name, e.g. "/dev/ttyUSB0" or "COM6"
        port: String,
        /// Baud rate, e.g. 9600
        baud_rate: u32,
    },
}

impl SourceConfig {
    /// Create a simulator configuration for the given executable.
    pub fn simulator(command: impl Into<PathBuf>) -> Self {
        Self::Simulator {
            command: command.into(),
        }
    }

    /// Create a serial configuration for the given port and baud rate.
    pub fn serial(port: impl Into<String>, baud_rate: u32) -> Self {
        Self::Serial {
            port: port.into(),
            baud_rate,
        }
    }
}

impl fmt::Display for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceConfig::Simulator { command } => {
                write!(f, "simulator ({})", command.display())
            }
            SourceConfig::Serial { port, baud_rate } => {
                write!(f, "serial ({} @ {} baud)", port, baud_rate)
            }
        }
    }
}
