//! Event governor: rate limiting of change notifications
//!
//! The governor decides, for every raw event, whether the work callback runs.
//! It uses a rolling-restart window: any gap longer than the configured window
//! between the window start and the next relevant event starts a fresh window,
//! and every admitted event slides the window start forward. Suppressed events
//! still count toward the window's tally but never move its start, so a
//! sustained burst stays suppressed until it pauses for longer than the window.

use crate::events::RawEvent;
use dirwatch_core::config::GovernorSettings;
use dirwatch_core::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, trace};

/// Work callback, invoked with the watched directory
pub type WorkFn = Arc<dyn Fn(&Path) + Send + Sync>;

/// Immutable governor configuration
#[derive(Clone)]
pub struct GovernorConfig {
    work: WorkFn,
    max_events: usize,
    event_window: Duration,
}

impl GovernorConfig {
    /// Create a configuration, rejecting a zero event cap or an empty window
    pub fn new<F>(work: F, max_events: usize, event_window: Duration) -> Result<Self>
    where
        F: Fn(&Path) + Send + Sync + 'static,
    {
        Self::with_work_fn(Arc::new(work), max_events, event_window)
    }

    /// Create a configuration from an already shared callback
    pub fn with_work_fn(work: WorkFn, max_events: usize, event_window: Duration) -> Result<Self> {
        if max_events == 0 {
            return Err(Error::config(
                "max_events must be greater than 0".to_string(),
            ));
        }
        if event_window.is_zero() {
            return Err(Error::config(
                "event_window must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            work,
            max_events,
            event_window,
        })
    }

    /// Create a configuration from loaded settings
    pub fn from_settings<F>(settings: &GovernorSettings, work: F) -> Result<Self>
    where
        F: Fn(&Path) + Send + Sync + 'static,
    {
        Self::new(work, settings.max_events, settings.event_window())
    }

    pub fn max_events(&self) -> usize {
        self.max_events
    }

    pub fn event_window(&self) -> Duration {
        self.event_window
    }
}

impl std::fmt::Debug for GovernorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GovernorConfig")
            .field("work", &"<callback>")
            .field("max_events", &self.max_events)
            .field("event_window", &self.event_window)
            .finish()
    }
}

/// Window bookkeeping, owned by the governor loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GovernorState {
    /// Relevant events counted in the current window, suppressed ones included
    pub event_count: usize,
    /// Start of the current window (time of the last admitted event)
    pub window_start: Instant,
}

impl GovernorState {
    fn new(now: Instant) -> Self {
        Self {
            event_count: 0,
            window_start: now,
        }
    }
}

/// Details of a suppressed event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suppression {
    pub count: usize,
    pub max: usize,
    pub event_window: Duration,
    pub window_start: Instant,
    pub now: Instant,
    /// Window time left, truncated to whole seconds
    pub time_remaining: Duration,
}

/// Outcome of evaluating one raw event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Irrelevant operation kind; no state was touched
    Ignored,
    /// The work callback runs for this event
    Admitted,
    /// Counted, but over the window's cap
    Suppressed(Suppression),
}

impl Decision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted)
    }
}

/// Running tallies for a governor session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GovernorStats {
    pub admitted: u64,
    pub suppressed: u64,
    pub ignored: u64,
    pub transport_errors: u64,
}

/// Rate limiter sitting between the watch source and the work callback
pub struct EventGovernor {
    dir: PathBuf,
    config: GovernorConfig,
    state: GovernorState,
    stats: GovernorStats,
}

impl EventGovernor {
    /// Create a governor for `dir`, with its first window starting at `now`
    pub fn new(dir: impl Into<PathBuf>, config: GovernorConfig, now: Instant) -> Self {
        Self {
            dir: dir.into(),
            config,
            state: GovernorState::new(now),
            stats: GovernorStats::default(),
        }
    }

    /// Classify an event and update the window state. Does not run the callback.
    pub fn evaluate(&mut self, event: &RawEvent, now: Instant) -> Decision {
        if !event.kind.is_relevant() {
            return Decision::Ignored;
        }

        let elapsed = now.saturating_duration_since(self.state.window_start);
        if elapsed > self.config.event_window {
            self.state.event_count = 1;
            self.state.window_start = now;
            return Decision::Admitted;
        }

        self.state.event_count += 1;
        if self.state.event_count > self.config.max_events {
            let remaining = self.config.event_window.saturating_sub(elapsed);
            return Decision::Suppressed(Suppression {
                count: self.state.event_count,
                max: self.config.max_events,
                event_window: self.config.event_window,
                window_start: self.state.window_start,
                now,
                time_remaining: Duration::from_secs(remaining.as_secs()),
            });
        }

        self.state.window_start = now;
        Decision::Admitted
    }

    /// Evaluate an event, log the outcome, and run the work callback if admitted
    pub fn process(&mut self, event: &RawEvent, now: Instant) -> Decision {
        let decision = self.evaluate(event, now);

        match &decision {
            Decision::Ignored => {
                self.stats.ignored += 1;
                trace!(op = %event.kind, path = %event.path.display(), "ignoring event");
            }
            Decision::Suppressed(s) => {
                self.stats.suppressed += 1;
                debug!(
                    count = s.count,
                    max = s.max,
                    event_window = ?s.event_window,
                    window_start = ?s.window_start,
                    now = ?s.now,
                    time_remaining = ?s.time_remaining,
                    "too many events, suppressing"
                );
                info!(
                    op = %event.kind,
                    event_window = ?s.event_window,
                    time_remaining = ?s.time_remaining,
                    "suppression stats"
                );
            }
            Decision::Admitted => {
                self.stats.admitted += 1;
                debug!(
                    op = %event.kind,
                    fname = %event.file_name(),
                    dir = %self.dir.display(),
                    "file event"
                );
                (self.config.work)(&self.dir);
            }
        }

        decision
    }

    /// Count a transport error. Window state is untouched.
    pub fn record_transport_error(&mut self) {
        self.stats.transport_errors += 1;
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }

    pub fn state(&self) -> GovernorState {
        self.state
    }

    pub fn stats(&self) -> GovernorStats {
        self.stats
    }
}
