//! Watch sessions: source subscription plus governor loop
//!
//! A session ties one directory's subscription to one governor. The governor
//! loop is the sole owner of the window state; it selects over the stop
//! signal, the event sequence, and the error sequence until it is cancelled or
//! both sequences have closed, and releases the subscription on the way out.

use crate::governor::{EventGovernor, GovernorConfig, GovernorStats};
use crate::source::{NotifySource, Subscription, WatchSource};
use dirwatch_core::config::WatcherSettings;
use dirwatch_core::error::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Watch `path` until `shutdown` is cancelled or the source closes
///
/// Setup failures (missing directory, subscription or registration errors)
/// are returned before any event is processed.
pub async fn watch_directory(
    path: impl AsRef<Path>,
    config: GovernorConfig,
    settings: &WatcherSettings,
    shutdown: CancellationToken,
) -> Result<GovernorStats> {
    let source = NotifySource::new(settings.channel_capacity);
    watch_directory_with(&source, path, config, shutdown).await
}

/// [`watch_directory`] over an arbitrary watch source
pub async fn watch_directory_with<S>(
    source: &S,
    path: impl AsRef<Path>,
    config: GovernorConfig,
    shutdown: CancellationToken,
) -> Result<GovernorStats>
where
    S: WatchSource + ?Sized,
{
    let path = path.as_ref().to_path_buf();
    let subscription = source.open(&path)?;
    info!(path = %path.display(), "watching directory");

    let governor = EventGovernor::new(path, config, Instant::now());
    Ok(run_governor(subscription, governor, shutdown).await)
}

/// Drive the governor until cancelled or both sequences close
pub(crate) async fn run_governor(
    mut subscription: Subscription,
    mut governor: EventGovernor,
    shutdown: CancellationToken,
) -> GovernorStats {
    let (events, errors) = subscription.channels();
    let mut events_open = true;
    let mut errors_open = true;

    while events_open || errors_open {
        tokio::select! {
            _ = shutdown.cancelled() => {
                debug!(path = %governor.dir().display(), "stop requested");
                break;
            }
            event = events.recv(), if events_open => match event {
                Some(event) => {
                    governor.process(&event, Instant::now());
                }
                None => {
                    debug!(path = %governor.dir().display(), "event stream closed");
                    events_open = false;
                }
            },
            err = errors.recv(), if errors_open => match err {
                Some(err) => {
                    error!(err = %err, "watcher error");
                    governor.record_transport_error();
                }
                None => {
                    debug!(path = %governor.dir().display(), "error stream closed");
                    errors_open = false;
                }
            },
        }
    }

    subscription.close();

    let stats = governor.stats();
    info!(
        path = %governor.dir().display(),
        admitted = stats.admitted,
        suppressed = stats.suppressed,
        ignored = stats.ignored,
        transport_errors = stats.transport_errors,
        "stopped watching directory"
    );
    stats
}

/// A running watch session on a background task
pub struct WatchSession {
    path: PathBuf,
    shutdown: CancellationToken,
    handle: JoinHandle<GovernorStats>,
}

impl WatchSession {
    /// Open a notify subscription for `path` and spawn its governor loop
    ///
    /// Must be called from within a tokio runtime. Setup failures are returned
    /// here and leave nothing running.
    pub fn start(
        path: impl AsRef<Path>,
        config: GovernorConfig,
        settings: &WatcherSettings,
    ) -> Result<Self> {
        let source = NotifySource::new(settings.channel_capacity);
        Self::start_with(&source, path, config)
    }

    /// [`WatchSession::start`] over an arbitrary watch source
    pub fn start_with<S>(source: &S, path: impl AsRef<Path>, config: GovernorConfig) -> Result<Self>
    where
        S: WatchSource + ?Sized,
    {
        let path = path.as_ref().to_path_buf();
        let subscription = source.open(&path)?;
        info!(path = %path.display(), "watching directory");

        let shutdown = CancellationToken::new();
        let governor = EventGovernor::new(path.clone(), config, Instant::now());
        let handle = tokio::spawn(run_governor(subscription, governor, shutdown.clone()));

        Ok(Self {
            path,
            shutdown,
            handle,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Token that stops this session when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Whether the governor loop has exited
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop the session and wait for the loop to release its subscription
    pub async fn stop(self) -> Result<GovernorStats> {
        self.shutdown.cancel();
        self.wait().await
    }

    /// Wait for the session to end on its own or through its token
    pub async fn wait(self) -> Result<GovernorStats> {
        self.handle
            .await
            .map_err(|e| Error::watcher(format!("governor task failed: {e}")))
    }
}

impl std::fmt::Debug for WatchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSession")
            .field("path", &self.path)
            .field("cancelled", &self.shutdown.is_cancelled())
            .field("finished", &self.handle.is_finished())
            .finish()
    }
}
