//! Monitoring orchestration: one source, one bus, one session.
//!
//! The [`Monitor`] drains the reader thread's event queue on the calling
//! thread, so the bus, its consumers, and the session store are only ever
//! touched from one place.

use crate::bus::{TelemetryBus, TelemetryConsumer};
use crate::error::{MonitorError, Result};
use crate::session::{ExportSummary, SessionStore};
use crate::source::{SourceEvent, SourceHandle};
use crate::telemetry::SourceConfig;
use std::path::Path;
use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::{Duration, Instant};
use tracing::{error, info};

/// How often the blocking run loop wakes to check its deadline.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Owns the telemetry pipeline for the lifetime of the monitoring component.
pub struct Monitor {
    bus: TelemetryBus,
    source: Option<(SourceHandle, Receiver<SourceEvent>)>,
    last_error: Option<MonitorError>,
}

impl Monitor {
    /// Create a monitor with an empty session and no consumers.
    pub fn new() -> Self {
        Self {
            bus: TelemetryBus::new(),
            source: None,
            last_error: None,
        }
    }

    /// Register a consumer. Call before [`Monitor::start`].
    pub fn register(&mut self, consumer: Box<dyn TelemetryConsumer>) {
        self.bus.register(consumer);
    }

    /// Start a new monitoring session from the given source.
    ///
    /// Any previous session is stopped first and its event queue dropped, so
    /// a line from the old source can never reach the new session's
    /// consumers. The session history starts empty.
    pub fn start(&mut self, config: SourceConfig) {
        self.stop();
        self.bus.start_session();
        self.last_error = None;
        info!("monitoring started ({})", config);
        self.source = Some(SourceHandle::start(config));
    }

    /// Whether a source is attached and its reader thread is alive.
    pub fn is_monitoring(&self) -> bool {
        self.source
            .as_ref()
            .map(|(handle, _)| handle.is_running())
            .unwrap_or(false)
    }

    /// Process all events currently queued, without blocking.
    ///
    /// Returns the number of events handled. Suitable for a UI tick handler.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        loop {
            let polled = match &self.source {
                Some((_, rx)) => rx.try_recv(),
                None => return handled,
            };
            match polled {
                Ok(event) => {
                    self.handle_event(event);
                    handled += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return handled,
            }
        }
    }

    /// Drain events until the source ends or the time limit elapses.
    ///
    /// With `limit = None` this returns only when the source closes (end of
    /// stream or a channel failure).
    pub fn run_for(&mut self, limit: Option<Duration>) {
        let deadline = limit.map(|d| Instant::now() + d);

        loop {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    break;
                }
            }

            let polled = match &self.source {
                Some((_, rx)) => rx.recv_timeout(POLL_INTERVAL),
                None => break,
            };
            match polled {
                Ok(event) => self.handle_event(event),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    fn handle_event(&mut self, event: SourceEvent) {
        match event {
            SourceEvent::Line(line) => self.bus.publish(&line),
            SourceEvent::Failed(msg) => {
                error!("telemetry channel failed: {}", msg);
                self.last_error = Some(MonitorError::channel_error(msg));
            }
        }
    }

    /// Stop the current session's source. Safe when nothing is running.
    pub fn stop(&mut self) {
        if let Some((mut handle, rx)) = self.source.take() {
            handle.stop();
            drop(rx);
            info!("monitoring stopped");
        }
    }

    /// Export the current session to CSV. See [`SessionStore::export_csv`].
    pub fn export_csv(&self, path: &Path) -> Result<ExportSummary> {
        self.bus.session().export_csv(path)
    }

    /// The current session's raw line history.
    pub fn session(&self) -> &SessionStore {
        self.bus.session()
    }

    /// Lines the parser rejected in the current session.
    pub fn rejected(&self) -> u64 {
        self.bus.rejected()
    }

    /// The channel failure, if the source failed this session.
    pub fn last_error(&self) -> Option<&MonitorError> {
        self.last_error.as_ref()
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_is_a_noop_when_never_started() {
        let mut monitor = Monitor::new();
        monitor.stop();
        monitor.stop();
        assert!(!monitor.is_monitoring());
    }

    #[test]
    fn test_channel_failure_is_recorded_once() {
        let mut monitor = Monitor::new();
        monitor.start(SourceConfig::simulator("/nonexistent/simulator-binary"));
        monitor.run_for(Some(Duration::from_secs(2)));

        let err = monitor.last_error().expect("failure should be recorded");
        assert!(matches!(err, MonitorError::Channel(_)));
        assert!(err.to_string().contains("failed to spawn"));
        assert!(monitor.session().is_empty());

        // Stop is still safe after the source failed on its own.
        monitor.stop();
    }

    #[test]
    fn test_restart_clears_previous_session() {
        let mut monitor = Monitor::new();
        monitor.start(SourceConfig::simulator("/nonexistent/simulator-binary"));
        monitor.run_for(Some(Duration::from_secs(2)));
        monitor.stop();

        monitor.start(SourceConfig::simulator("/nonexistent/simulator-binary"));
        assert!(monitor.session().is_empty());
        assert!(monitor.last_error().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_pump_drains_queued_events_without_blocking() {
        let mut monitor = Monitor::new();
        assert_eq!(monitor.pump(), 0);

        monitor.start(SourceConfig::simulator("yes"));
        std::thread::sleep(Duration::from_millis(200));

        // Everything queued so far is handled in one non-blocking pass.
        let handled = monitor.pump();
        assert!(handled > 0);
        assert_eq!(monitor.session().len(), handled);

        monitor.stop();
        assert_eq!(monitor.pump(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_lines_flow_from_child_to_session() {
        let mut monitor = Monitor::new();
        monitor.start(SourceConfig::simulator("yes"));

        // `yes` floods quickly; a short drain is plenty.
        monitor.run_for(Some(Duration::from_millis(300)));
        monitor.stop();

        assert!(!monitor.session().is_empty());
        assert_eq!(monitor.session().lines()[0], "y");
        // "y" has no markers, so everything was rejected by the parser.
        assert_eq!(monitor.rejected() as usize, monitor.session().len());
    }
}
