//! Synchronous fan-out of parsed telemetry to registered consumers.

use crate::error::Result;
use crate::session::SessionStore;
use crate::telemetry::{parse_line, Reading};
use tracing::{debug, warn};

/// A consumer of telemetry events.
///
/// Consumers are registered before monitoring starts and are invoked
/// synchronously, in registration order, once per published line.
pub trait TelemetryConsumer {
    /// Called for every raw line, whether or not it parses. Consumers that
    /// only care about structured readings keep the default no-op.
    fn on_raw(&mut self, _raw: &str) {}

    /// Called only when the line parsed into a [`Reading`]. An `Err` is
    /// logged by the bus and does not stop delivery to other consumers.
    fn on_reading(&mut self, raw: &str, reading: &Reading) -> Result<()>;
}

/// Fans each raw line out to the session store and all registered consumers.
///
/// The bus owns the session store for the lifetime of the monitoring
/// component; every published line lands there first, then raw-line
/// consumers, then (on successful parse) reading consumers. Each line is
/// fully processed before the next is accepted, so arrival order is update
/// order for every consumer.
pub struct TelemetryBus {
    session: SessionStore,
    consumers: Vec<Box<dyn TelemetryConsumer>>,
    rejected: u64,
}

impl TelemetryBus {
    /// Create a bus with a fresh, empty session.
    pub fn new() -> Self {
        Self {
            session: SessionStore::new(),
            consumers: Vec::new(),
            rejected: 0,
        }
    }

    /// Register a consumer. Call before monitoring starts.
    pub fn register(&mut self, consumer: Box<dyn TelemetryConsumer>) {
        self.consumers.push(consumer);
    }

    /// Publish one raw line: append to the session, notify raw-line
    /// consumers, parse, and on success notify every consumer with the
    /// reading. Parse failures are logged as diagnostics and otherwise
    /// ignored; the next line proceeds normally.
    pub fn publish(&mut self, raw: &str) {
        let raw = raw.trim();
        if raw.is_empty() {
            return;
        }

        self.session.append(raw);

        for consumer in &mut self.consumers {
            consumer.on_raw(raw);
        }

        match parse_line(raw) {
            Ok(reading) => {
                for consumer in &mut self.consumers {
                    if let Err(err) = consumer.on_reading(raw, &reading) {
                        warn!("consumer failed on {:?}: {}", raw, err);
                    }
                }
            }
            Err(err) => {
                self.rejected += 1;
                debug!("rejected line {:?}: {}", raw, err);
            }
        }
    }

    /// Clear the session for a new monitoring run.
    pub fn start_session(&mut self) {
        self.session.clear();
        self.rejected = 0;
    }

    /// The session accumulated so far.
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Lines rejected by the parser in the current session.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }
}

impl Default for TelemetryBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Lets callers keep a handle to a consumer they registered: register a
/// `Box<Rc<RefCell<C>>>` and read the consumer's state after (or between)
/// published lines. Delivery is synchronous, so the interior borrow is never
/// held across lines.
impl<C: TelemetryConsumer> TelemetryConsumer for std::rc::Rc<std::cell::RefCell<C>> {
    fn on_raw(&mut self, raw: &str) {
        self.borrow_mut().on_raw(raw);
    }

    fn on_reading(&mut self, raw: &str, reading: &Reading) -> Result<()> {
        self.borrow_mut().on_reading(raw, reading)
    }
}
