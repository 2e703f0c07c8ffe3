//! Error handling for the enviromon telemetry crate.

/// A specialized `Result` type for enviromon operations.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// The main error type for monitoring operations.
///
/// Parse failures have their own typed result ([`crate::telemetry::ParseError`])
/// because they are recovered per line and never surface through this enum.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Telemetry channel (child process or serial port) failed
    #[error("Channel error: {0}")]
    Channel(String),

    /// Serial port enumeration or configuration failed
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// CSV export failed
    #[error("Export error: {0}")]
    Export(String),

    /// Consumer-side failure during fan-out
    #[error("Consumer error: {0}")]
    Consumer(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MonitorError {
    /// Create a new channel error
    pub fn channel_error(msg: impl Into<String>) -> Self {
        Self::Channel(msg.into())
    }

    /// Create a new export error
    pub fn export_error(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Create a new consumer error
    pub fn consumer_error(msg: impl Into<String>) -> Self {
        Self::Consumer(msg.into())
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
