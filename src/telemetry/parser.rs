//! Parsing of raw telemetry lines into [`Reading`]s.

use crate::telemetry::data::Reading;

/// Marker introducing the temperature field.
pub const TEMPERATURE_MARKER: &str = "T:";
/// Marker introducing the humidity field.
pub const HUMIDITY_MARKER: &str = "H:";
/// Marker introducing the CO2 field.
pub const CO2_MARKER: &str = "CO2:";

/// Why a raw line was rejected by the parser.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// One of the `T:`/`H:`/`CO2:` markers is absent
    #[error("missing `{0}` marker in telemetry line")]
    MissingField(&'static str),

    /// A field substring was present but did not parse as a number
    #[error("malformed {field} value `{value}`")]
    MalformedField {
        /// Human-readable field name ("temperature", "humidity", "co2")
        field: &'static str,
        /// The offending substring, as extracted
        value: String,
    },
}

/// Parse one raw line into a [`Reading`].
///
/// The line must contain all three markers. Temperature and humidity are the
/// substrings between their markers and the next `,`; CO2 runs from its
/// marker to the end of the line, trimmed, so trailing fields after the CO2
/// value poison it. Each field must parse as a decimal number. Text before
/// `T:` is tolerated. Never panics on malformed input.
pub fn parse_line(line: &str) -> Result<Reading, ParseError> {
    for marker in [TEMPERATURE_MARKER, HUMIDITY_MARKER, CO2_MARKER] {
        if !line.contains(marker) {
            return Err(ParseError::MissingField(marker));
        }
    }

    let temperature = parse_field(extract(line, TEMPERATURE_MARKER), "temperature")?;
    let humidity = parse_field(extract(line, HUMIDITY_MARKER), "humidity")?;
    let co2 = parse_field(extract_to_end(line, CO2_MARKER).trim(), "co2")?;

    Ok(Reading {
        temperature,
        humidity,
        co2,
    })
}

/// Substring after the first occurrence of `marker`, up to the next `,`
/// (or the end of the line if no comma follows).
///
/// Callers must have verified that `marker` is present.
fn extract<'a>(line: &'a str, marker: &str) -> &'a str {
    let start = line.find(marker).map(|i| i + marker.len()).unwrap_or(0);
    let rest = &line[start..];
    match rest.find(',') {
        Some(end) => &rest[..end],
        None => rest,
    }
}

/// Substring after the first occurrence of `marker`, to the end of the line.
///
/// Callers must have verified that `marker` is present.
fn extract_to_end<'a>(line: &'a str, marker: &str) -> &'a str {
    let start = line.find(marker).map(|i| i + marker.len()).unwrap_or(0);
    &line[start..]
}

fn parse_field(value: &str, field: &'static str) -> Result<f64, ParseError> {
    value.parse::<f64>().map_err(|_| ParseError::MalformedField {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_line() {
        let reading = parse_line("T:23.5,H:48,CO2:612").unwrap();
        assert_eq!(reading.temperature, 23.5);
        assert_eq!(reading.humidity, 48.0);
        assert_eq!(reading.co2, 612.0);
    }

    #[test]
    fn test_parse_float_co2() {
        // The live parser is float-tolerant for CO2; only export is stricter.
        let reading = parse_line("T:23.5,H:48,CO2:612.0").unwrap();
        assert_eq!(reading.co2, 612.0);
    }

    #[test]
    fn test_parse_tolerates_surrounding_text() {
        let reading = parse_line("sensor v2 T:21,H:55,CO2: 430 ").unwrap();
        assert_eq!(reading.temperature, 21.0);
        assert_eq!(reading.humidity, 55.0);
        assert_eq!(reading.co2, 430.0);
    }

    #[test]
    fn test_parse_missing_markers() {
        assert_eq!(
            parse_line("garbage"),
            Err(ParseError::MissingField(TEMPERATURE_MARKER))
        );
        assert_eq!(
            parse_line("T:20,CO2:400"),
            Err(ParseError::MissingField(HUMIDITY_MARKER))
        );
        assert_eq!(
            parse_line("T:20,H:50"),
            Err(ParseError::MissingField(CO2_MARKER))
        );
    }

    #[test]
    fn test_parse_malformed_field() {
        let err = parse_line("T:hot,H:50,CO2:400").unwrap_err();
        assert_eq!(
            err,
            ParseError::MalformedField {
                field: "temperature",
                value: "hot".to_string(),
            }
        );

        let err = parse_line("T:20,H:50,CO2:4o0").unwrap_err();
        assert!(matches!(err, ParseError::MalformedField { field: "co2", .. }));
    }

    #[test]
    fn test_parse_missing_comma_after_temperature() {
        // Without a comma the temperature substring runs to end of line and
        // fails numeric parsing.
        let err = parse_line("T:20 H:50,CO2:400").unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedField {
                field: "temperature",
                ..
            }
        ));
    }

    #[test]
    fn test_parse_rejects_trailing_fields_after_co2() {
        // CO2 runs to the end of the line, so a fourth field corrupts it.
        let err = parse_line("T:20,H:50,CO2:400,X:1").unwrap_err();
        assert!(matches!(err, ParseError::MalformedField { field: "co2", .. }));

        let err = parse_line("T:20,H:50,CO2:400,").unwrap_err();
        assert!(matches!(err, ParseError::MalformedField { field: "co2", .. }));
    }

    #[test]
    fn test_parse_negative_values() {
        let reading = parse_line("T:-5.5,H:30,CO2:410").unwrap();
        assert_eq!(reading.temperature, -5.5);
    }
}
