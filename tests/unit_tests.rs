use enviromon::{
    parse_line, AirQuality, ChartRecorder, GaugePanel, LogSink, ParseError, Reading, SessionStore,
    SourceConfig, TelemetryBus, TelemetryConsumer, CSV_HEADER,
};
use std::cell::RefCell;
use std::fs;
use std::rc::Rc;
use tempfile::tempdir;

/// Scenario: a well-formed line parses to the exact numeric values.
#[test]
fn test_parse_exact_values() {
    let reading = parse_line("T:23.5,H:48,CO2:612").expect("line should parse");
    assert_eq!(
        reading,
        Reading {
            temperature: 23.5,
            humidity: 48.0,
            co2: 612.0,
        }
    );
}

/// Scenario: live parse accepts a float CO2, export rejects the same line.
#[test]
fn test_float_co2_parses_live_but_is_not_exported() {
    let line = "T:23.5,H:48,CO2:612.0";
    let reading = parse_line(line).expect("live parse is float-tolerant");
    assert_eq!(reading.co2, 612.0);

    let mut store = SessionStore::new();
    store.append(line);

    let dir = tempdir().unwrap();
    let path = dir.path().join("out.csv");
    let summary = store.export_csv(&path).unwrap();
    assert_eq!(summary.written, 0);
    assert_eq!(summary.total, 1);
}

/// Scenario: garbage is rejected with MissingField but still lands in the
/// session for export attempts.
#[test]
fn test_garbage_is_retained_but_not_published_as_reading() {
    assert!(matches!(
        parse_line("garbage"),
        Err(ParseError::MissingField(_))
    ));

    let charts = Rc::new(RefCell::new(ChartRecorder::new()));
    let mut bus = TelemetryBus::new();
    bus.register(Box::new(Rc::clone(&charts)));

    bus.publish("garbage");

    assert!(charts.borrow().is_empty());
    assert_eq!(bus.session().lines(), &["garbage".to_string()]);
}

/// End to end through the bus: mixed lines, then export, checking both the
/// chart/gauge side effects and the exported bytes.
#[test]
fn test_pipeline_fan_out_and_export() {
    let log = Rc::new(RefCell::new(LogSink::new()));
    let charts = Rc::new(RefCell::new(ChartRecorder::new()));
    let gauges = Rc::new(RefCell::new(GaugePanel::new()));

    let mut bus = TelemetryBus::new();
    bus.register(Box::new(Rc::clone(&log)));
    bus.register(Box::new(Rc::clone(&charts)));
    bus.register(Box::new(Rc::clone(&gauges)));

    let lines = [
        "T:23.5,H:48,CO2:612",
        "garbage",
        "T:24,H:50,CO2:615.5", // live-parses, export rejects the CO2
        "T:25.5,H:51,CO2:620",
    ];
    for line in lines {
        bus.publish(line);
    }

    // Every consumer saw every raw line, in order.
    assert_eq!(log.borrow().lines(), &lines.map(String::from));

    // Only the three parseable lines reached the chart, in order.
    let chart_state = charts.borrow();
    assert_eq!(chart_state.temperature(), &[(0, 23.5), (1, 24.0), (2, 25.5)]);
    assert_eq!(chart_state.co2(), &[(0, 612.0), (1, 615.5), (2, 620.0)]);

    // The gauge holds the last valid reading.
    let latest = gauges.borrow().latest().unwrap();
    assert_eq!(latest.temperature, 25.5);
    assert_eq!(gauges.borrow().air_quality(), Some(AirQuality::Excellent));

    // Export keeps only the integer-CO2 rows, verbatim.
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.csv");
    let summary = bus.session().export_csv(&path).unwrap();
    assert_eq!(summary.written, 2);
    assert_eq!(summary.total, 4);

    let contents = fs::read_to_string(&path).unwrap();
    let expected = format!("{}\n23.5,48,612\n25.5,51,620\n", CSV_HEADER);
    assert_eq!(contents, expected);
}

/// A fourth field after the CO2 value poisons the whole line: it is rejected
/// live (the CO2 substring runs to end of line) and skipped on export.
#[test]
fn test_trailing_fields_after_co2_reject_the_line() {
    assert!(matches!(
        parse_line("T:20,H:50,CO2:400,X:1"),
        Err(ParseError::MalformedField { field: "co2", .. })
    ));

    let mut store = SessionStore::new();
    store.append("T:20,H:50,CO2:400,X:1");

    let dir = tempdir().unwrap();
    let path = dir.path().join("out.csv");
    let summary = store.export_csv(&path).unwrap();
    assert_eq!(summary.written, 0);
    assert_eq!(summary.total, 1);
}

/// Order preservation across consumers registered in different positions.
#[test]
fn test_consumers_observe_identical_order() {
    struct Ordered(Rc<RefCell<Vec<String>>>);

    impl TelemetryConsumer for Ordered {
        fn on_raw(&mut self, raw: &str) {
            self.0.borrow_mut().push(raw.to_string());
        }

        fn on_reading(&mut self, _raw: &str, _reading: &Reading) -> enviromon::Result<()> {
            Ok(())
        }
    }

    let first = Rc::new(RefCell::new(Vec::new()));
    let second = Rc::new(RefCell::new(Vec::new()));

    let mut bus = TelemetryBus::new();
    bus.register(Box::new(Ordered(Rc::clone(&first))));
    bus.register(Box::new(Ordered(Rc::clone(&second))));

    for i in 0..100 {
        bus.publish(&format!("T:{},H:50,CO2:400", i));
    }

    assert_eq!(*first.borrow(), *second.borrow());
    assert_eq!(first.borrow().len(), 100);
    assert!(first.borrow()[0].starts_with("T:0,"));
    assert!(first.borrow()[99].starts_with("T:99,"));
}

/// Exporting twice with no intervening append is byte-identical.
#[test]
fn test_export_idempotence() {
    let mut bus = TelemetryBus::new();
    bus.publish("T:20,H:40,CO2:300");
    bus.publish("not telemetry");
    bus.publish("T:21,H:41,CO2:301");

    let dir = tempdir().unwrap();
    let first = dir.path().join("first.csv");
    let second = dir.path().join("second.csv");
    bus.session().export_csv(&first).unwrap();
    bus.session().export_csv(&second).unwrap();

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

/// Scenario: empty session exports nothing and creates no file.
#[test]
fn test_empty_session_export() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.csv");

    let summary = SessionStore::new().export_csv(&path).unwrap();
    assert_eq!(summary.written, 0);
    assert_eq!(summary.total, 0);
    assert!(!path.exists());
}

/// SourceConfig is selected once per session and serializes cleanly.
#[test]
fn test_source_config_round_trip() {
    let config = SourceConfig::serial("/dev/ttyACM0", 115200);
    let json = serde_json::to_string(&config).unwrap();
    let back: SourceConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}
