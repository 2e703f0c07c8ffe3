//! enviromon - Environmental Telemetry Monitor Binary
//!
//! A headless front end for the telemetry pipeline: reads lines from a
//! simulator process or a serial port, echoes and charts them, and exports
//! the session to CSV.

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use enviromon::{
    list_ports, parse_line, ChartRecorder, GaugePanel, Monitor, MonitorError, Reading,
    Result as MonitorResult, SourceConfig, TelemetryConsumer, DEFAULT_BAUD_RATE,
};
use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{error, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "enviromon")]
#[command(about = "Environmental telemetry monitor")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = "Reads T:/H:/CO2: telemetry lines from a simulator process or a serial \
                        port, fans them out to display/chart/gauge consumers, and exports the \
                        session to CSV")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start monitoring (default)
    Run(RunArgs),

    /// List available serial ports
    Ports,

    /// Emit synthetic telemetry lines to stdout
    Simulate(SimulateArgs),

    /// Parse telemetry lines from stdin and print the readings
    Parse(ParseArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    /// Spawn the simulator executable and read its stdout
    Simulator,
    /// Read from a serial port
    Serial,
}

#[derive(Args)]
struct RunArgs {
    /// Where telemetry lines come from
    #[arg(short, long, value_enum, default_value_t = SourceKind::Simulator)]
    source: SourceKind,

    /// Simulator executable to spawn (simulator source only)
    #[arg(long, default_value = "simulator")]
    simulator_cmd: PathBuf,

    /// Serial port name, e.g. /dev/ttyUSB0 (serial source only)
    #[arg(short, long)]
    port: Option<String>,

    /// Serial baud rate
    #[arg(short, long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Stop after this many seconds (0 = run until the source ends)
    #[arg(long, default_value_t = 0)]
    duration: u64,

    /// CSV export path (default: sensor_data_<timestamp>.csv)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip the CSV export at the end of the session
    #[arg(long)]
    no_export: bool,
}

#[derive(Args)]
struct SimulateArgs {
    /// Number of lines to emit (0 = forever)
    #[arg(short, long, default_value_t = 0)]
    count: u64,

    /// Milliseconds between lines
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,
}

#[derive(Args)]
struct ParseArgs {
    /// Output format: json or pretty
    #[arg(short, long, default_value = "pretty")]
    format: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    match &cli.command {
        Some(Commands::Run(args)) => run_command(args)?,
        Some(Commands::Ports) => ports_command()?,
        Some(Commands::Simulate(args)) => simulate_command(args)?,
        Some(Commands::Parse(args)) => parse_command(args)?,
        None => {
            let args = RunArgs {
                source: SourceKind::Simulator,
                simulator_cmd: PathBuf::from("simulator"),
                port: None,
                baud: DEFAULT_BAUD_RATE,
                duration: 0,
                output: None,
                no_export: false,
            };
            run_command(&args)?;
        }
    }

    Ok(())
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

/// Echoes every raw line, mirroring the console display of a GUI front end.
struct StdoutSink;

impl TelemetryConsumer for StdoutSink {
    fn on_raw(&mut self, raw: &str) {
        println!("{}", raw);
    }

    fn on_reading(&mut self, _raw: &str, _reading: &Reading) -> MonitorResult<()> {
        Ok(())
    }
}

fn run_command(args: &RunArgs) -> anyhow::Result<()> {
    let config = match args.source {
        SourceKind::Simulator => SourceConfig::simulator(&args.simulator_cmd),
        SourceKind::Serial => {
            let port = args.port.clone().ok_or_else(|| {
                MonitorError::config_error("--port is required with --source serial")
            })?;
            if args.baud == 0 {
                return Err(MonitorError::config_error("--baud must be a positive integer").into());
            }
            SourceConfig::serial(port, args.baud)
        }
    };

    let charts = Rc::new(RefCell::new(ChartRecorder::new()));
    let gauges = Rc::new(RefCell::new(GaugePanel::new()));

    let mut monitor = Monitor::new();
    monitor.register(Box::new(StdoutSink));
    monitor.register(Box::new(Rc::clone(&charts)));
    monitor.register(Box::new(Rc::clone(&gauges)));

    println!("Monitoring started ({})", config);
    monitor.start(config);

    let limit = (args.duration > 0).then(|| Duration::from_secs(args.duration));
    monitor.run_for(limit);
    monitor.stop();
    println!("Monitoring stopped.");

    if let Some(err) = monitor.last_error() {
        println!("Channel error: {}", err);
    }

    let gauges = gauges.borrow();
    if let Some(reading) = gauges.latest() {
        let quality = gauges
            .air_quality()
            .map(|q| q.to_string())
            .unwrap_or_default();
        println!(
            "Latest: {:.1} °C, {:.0} % RH, {:.0} ppm CO2 ({})",
            reading.temperature, reading.humidity, reading.co2, quality
        );
    }
    println!(
        "Readings: {} charted, {} rejected",
        charts.borrow().len(),
        monitor.rejected()
    );

    if !args.no_export {
        let path = args.output.clone().unwrap_or_else(default_export_path);
        let summary = monitor
            .export_csv(&path)
            .with_context(|| format!("exporting session to {}", path.display()))?;
        if summary.nothing_to_export() {
            println!("Nothing to export: the session is empty.");
        } else {
            println!("File saved: {}", path.display());
            println!("Records: {}/{}", summary.written, summary.total);
        }
    }

    Ok(())
}

fn default_export_path() -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    PathBuf::from(format!("sensor_data_{}.csv", timestamp))
}

fn ports_command() -> anyhow::Result<()> {
    let ports = list_ports().context("scanning serial ports")?;

    if ports.is_empty() {
        println!("No serial ports found.");
        return Ok(());
    }

    for port in ports {
        if port.description.is_empty() {
            println!("{}", port.name);
        } else {
            println!("{}: {}", port.name, port.description);
        }
    }

    Ok(())
}

fn simulate_command(args: &SimulateArgs) -> anyhow::Result<()> {
    let interval = Duration::from_millis(args.interval_ms);
    let mut tick = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let mut emitted = 0u64;
    let stdout = io::stdout();

    loop {
        // Deterministic waveforms over the ranges the reference simulator
        // used: 20-29 °C, 40-59 %, 300-699 ppm.
        let temperature = 20 + tick % 10;
        let humidity = 40 + (tick * 7) % 20;
        let co2 = 300 + (tick * 37) % 400;

        {
            let mut out = stdout.lock();
            writeln!(out, "T:{},H:{},CO2:{}", temperature, humidity, co2)?;
            out.flush()?;
        }

        emitted += 1;
        if args.count > 0 && emitted >= args.count {
            break;
        }
        tick += 1;
        thread::sleep(interval);
    }

    Ok(())
}

fn parse_command(args: &ParseArgs) -> anyhow::Result<()> {
    for line in io::stdin().lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match parse_line(trimmed) {
            Ok(reading) => match args.format.as_str() {
                "json" => println!("{}", serde_json::to_string(&reading)?),
                "pretty" => println!(
                    "T={:.1} °C  H={:.1} %  CO2={:.1} ppm",
                    reading.temperature, reading.humidity, reading.co2
                ),
                _ => {
                    error!("Unsupported format: {}. Use 'json' or 'pretty'", args.format);
                    std::process::exit(1);
                }
            },
            Err(err) => eprintln!("rejected {:?}: {}", trimmed, err),
        }
    }

    Ok(())
}
