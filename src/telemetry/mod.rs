//! Telemetry data structures and line parsing.
//!
//! This module defines the wire-level contract of the system: one
//! newline-delimited text line per reading, in the form
//! `T:<temperature>,H:<humidity>,CO2:<co2>`, and the parser that turns such a
//! line into a structured [`Reading`].

pub mod data;
pub mod parser;

// Re-export commonly used items
pub use data::{Reading, SourceConfig};
pub use parser::{parse_line, ParseError};
