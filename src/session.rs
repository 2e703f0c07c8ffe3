//! Session storage and CSV export.
//!
//! A session is the ordered history of raw lines received during one
//! monitoring run. Every line is retained, parseable or not, so export can
//! re-attempt extraction on the full history.

use crate::error::{MonitorError, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Header row of the export file.
pub const CSV_HEADER: &str = "Temperature,Humidity,CO2";

/// Outcome of a CSV export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    /// Rows actually written to the file
    pub written: usize,
    /// Session lines considered (including rejected ones)
    pub total: usize,
}

impl ExportSummary {
    /// True when the session had no lines at all.
    pub fn nothing_to_export(&self) -> bool {
        self.total == 0
    }
}

/// Ordered, append-only store of raw session lines.
#[derive(Debug, Default)]
pub struct SessionStore {
    lines: Vec<String>,
}

impl SessionStore {
    /// Create an empty session store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw line to the end of the session. No deduplication, no cap.
    pub fn append(&mut self, raw: impl Into<String>) {
        self.lines.push(raw.into());
    }

    /// Number of lines in the session.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the session holds no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The raw lines, in arrival order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Drop all lines. Called when a new monitoring session starts.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Export the session to a CSV file.
    ///
    /// Each line is re-extracted with the strict marker convention
    /// (`T:`…`,H:`…`,CO2:`…) and filtered: temperature and humidity must be
    /// plain unsigned decimals, CO2 must be digits only. This is deliberately
    /// stricter than live parsing (a CO2 value of `612.0` charts live but is
    /// skipped here); rejected lines count toward `total` but not `written`.
    /// Rows are atomic: all three fields or nothing.
    ///
    /// An empty session creates no file and reports `written: 0, total: 0`.
    pub fn export_csv(&self, path: &Path) -> Result<ExportSummary> {
        if self.lines.is_empty() {
            return Ok(ExportSummary {
                written: 0,
                total: 0,
            });
        }

        let written = self
            .write_rows(path)
            .map_err(|err| MonitorError::export_error(format!("{}: {}", path.display(), err)))?;

        Ok(ExportSummary {
            written,
            total: self.lines.len(),
        })
    }

    fn write_rows(&self, path: &Path) -> std::io::Result<usize> {
        let mut out = BufWriter::new(File::create(path)?);
        writeln!(out, "{}", CSV_HEADER)?;

        let mut written = 0;
        for line in &self.lines {
            if let Some((temperature, humidity, co2)) = extract_export_fields(line) {
                if is_decimal(temperature) && is_decimal(humidity) && is_integer(co2) {
                    // Fields go out exactly as extracted, never reformatted.
                    writeln!(out, "{},{},{}", temperature, humidity, co2)?;
                    written += 1;
                }
            }
        }

        out.flush()?;
        Ok(written)
    }
}

/// Strict field extraction for export: temperature between `T:` and `,H:`,
/// humidity between `,H:` and `,CO2:`, CO2 after `,CO2:`, trimmed.
fn extract_export_fields(line: &str) -> Option<(&str, &str, &str)> {
    let after_t = &line[line.find("T:")? + 2..];
    let (temperature, rest) = after_t.split_once(",H:")?;
    let (humidity, co2) = rest.split_once(",CO2:")?;
    Some((temperature, humidity, co2.trim()))
}

/// `digits(.digits)?` — unsigned, no leading/trailing dot.
fn is_decimal(s: &str) -> bool {
    match s.split_once('.') {
        Some((int, frac)) => {
            !int.is_empty()
                && !frac.is_empty()
                && int.bytes().all(|b| b.is_ascii_digit())
                && frac.bytes().all(|b| b.is_ascii_digit())
        }
        None => is_integer(s),
    }
}

/// Digits only, non-empty.
fn is_integer(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
