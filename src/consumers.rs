//! Built-in telemetry consumers.
//!
//! These implement the collaborator roles of a monitoring front end: a
//! display log of raw lines, per-metric chart series, and a latest-value
//! gauge panel with display clamping. A GUI would render them; the CLI
//! prints their state in its end-of-run summary.

use crate::bus::TelemetryConsumer;
use crate::error::Result;
use crate::telemetry::Reading;
use serde::Serialize;
use std::fmt;
use tracing::info;

/// Display range of the temperature gauge, in degrees Celsius.
pub const TEMPERATURE_RANGE: (f64, f64) = (-25.0, 55.0);
/// Display range of the humidity gauge, in percent.
pub const HUMIDITY_RANGE: (f64, f64) = (0.0, 100.0);

/// CO2 level below which air quality is considered excellent, in ppm.
pub const CO2_EXCELLENT_BELOW: f64 = 800.0;
/// CO2 level below which air quality is considered good, in ppm.
pub const CO2_GOOD_BELOW: f64 = 1200.0;

/// Mirrors the console display: keeps every raw line and logs it.
#[derive(Debug, Default)]
pub struct LogSink {
    lines: Vec<String>,
}

impl LogSink {
    /// Create an empty log sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All raw lines received so far, in arrival order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl TelemetryConsumer for LogSink {
    fn on_raw(&mut self, raw: &str) {
        info!(target: "telemetry", "{}", raw);
        self.lines.push(raw.to_string());
    }

    fn on_reading(&mut self, _raw: &str, _reading: &Reading) -> Result<()> {
        Ok(())
    }
}

/// Appends one `(time-index, value)` point per metric for each valid reading.
///
/// The index is a monotonic counter incremented once per reading, matching
/// the sample counter a plot widget would use on its x-axis.
#[derive(Debug, Default)]
pub struct ChartRecorder {
    temperature: Vec<(u64, f64)>,
    humidity: Vec<(u64, f64)>,
    co2: Vec<(u64, f64)>,
    tick: u64,
}

impl ChartRecorder {
    /// Create an empty chart recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Temperature series in arrival order.
    pub fn temperature(&self) -> &[(u64, f64)] {
        &self.temperature
    }

    /// Humidity series in arrival order.
    pub fn humidity(&self) -> &[(u64, f64)] {
        &self.humidity
    }

    /// CO2 series in arrival order.
    pub fn co2(&self) -> &[(u64, f64)] {
        &self.co2
    }

    /// Number of readings recorded.
    pub fn len(&self) -> usize {
        self.temperature.len()
    }

    /// Whether no readings have been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.temperature.is_empty()
    }
}

impl TelemetryConsumer for ChartRecorder {
    fn on_reading(&mut self, _raw: &str, reading: &Reading) -> Result<()> {
        self.temperature.push((self.tick, reading.temperature));
        self.humidity.push((self.tick, reading.humidity));
        self.co2.push((self.tick, reading.co2));
        self.tick += 1;
        Ok(())
    }
}

/// Air quality classification derived from the CO2 level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AirQuality {
    Excellent,
    Good,
    Poor,
}

impl AirQuality {
    /// Classify a CO2 concentration in ppm.
    pub fn from_co2(co2: f64) -> Self {
        if co2 < CO2_EXCELLENT_BELOW {
            AirQuality::Excellent
        } else if co2 < CO2_GOOD_BELOW {
            AirQuality::Good
        } else {
            AirQuality::Poor
        }
    }
}

impl fmt::Display for AirQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AirQuality::Excellent => write!(f, "Excellent"),
            AirQuality::Good => write!(f, "Good"),
            AirQuality::Poor => write!(f, "Poor"),
        }
    }
}

/// Holds the latest reading, display-mapped the way the gauges show it:
/// temperature clamped to [`TEMPERATURE_RANGE`], humidity to
/// [`HUMIDITY_RANGE`], CO2 unclamped.
#[derive(Debug, Default)]
pub struct GaugePanel {
    latest: Option<Reading>,
}

impl GaugePanel {
    /// Create a gauge panel with no reading yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// The latest clamped reading, if any arrived.
    pub fn latest(&self) -> Option<Reading> {
        self.latest
    }

    /// Air quality of the latest reading.
    pub fn air_quality(&self) -> Option<AirQuality> {
        self.latest.map(|r| AirQuality::from_co2(r.co2))
    }
}

impl TelemetryConsumer for GaugePanel {
    fn on_reading(&mut self, _raw: &str, reading: &Reading) -> Result<()> {
        self.latest = Some(Reading {
            temperature: reading.temperature.clamp(TEMPERATURE_RANGE.0, TEMPERATURE_RANGE.1),
            humidity: reading.humidity.clamp(HUMIDITY_RANGE.0, HUMIDITY_RANGE.1),
            co2: reading.co2,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(temperature: f64, humidity: f64, co2: f64) -> Reading {
        Reading {
            temperature,
            humidity,
            co2,
        }
    }

    #[test]
    fn test_chart_recorder_appends_per_metric() {
        let mut chart = ChartRecorder::new();
        chart.on_reading("", &reading(20.0, 40.0, 300.0)).unwrap();
        chart.on_reading("", &reading(21.0, 41.0, 301.0)).unwrap();

        assert_eq!(chart.temperature(), &[(0, 20.0), (1, 21.0)]);
        assert_eq!(chart.humidity(), &[(0, 40.0), (1, 41.0)]);
        assert_eq!(chart.co2(), &[(0, 300.0), (1, 301.0)]);
        assert_eq!(chart.len(), 2);
    }

    #[test]
    fn test_gauge_panel_clamps_for_display() {
        let mut gauges = GaugePanel::new();
        gauges.on_reading("", &reading(90.0, 120.0, 2500.0)).unwrap();

        let latest = gauges.latest().unwrap();
        assert_eq!(latest.temperature, 55.0);
        assert_eq!(latest.humidity, 100.0);
        assert_eq!(latest.co2, 2500.0);
        assert_eq!(gauges.air_quality(), Some(AirQuality::Poor));
    }

    #[test]
    fn test_air_quality_thresholds() {
        assert_eq!(AirQuality::from_co2(500.0), AirQuality::Excellent);
        assert_eq!(AirQuality::from_co2(800.0), AirQuality::Good);
        assert_eq!(AirQuality::from_co2(1200.0), AirQuality::Poor);
    }

    #[test]
    fn test_log_sink_records_raw_lines() {
        let mut log = LogSink::new();
        log.on_raw("T:20,H:40,CO2:300");
        log.on_raw("garbage");
        assert_eq!(log.lines().len(), 2);
        assert_eq!(log.lines()[1], "garbage");
    }
}
