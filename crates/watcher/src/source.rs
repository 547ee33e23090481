//! Watch source: OS change notifications for a single directory
//!
//! The source owns the notify watcher and exposes two live sequences, raw
//! events and transport errors, as bounded channels. Releasing a
//! [`Subscription`] drops the watcher, after which both sequences drain and
//! close.

use crate::events::RawEvent;
use dirwatch_core::error::{Error, Result};
use notify::{
    Config as NotifyConfig, Event as NotifyEvent, RecommendedWatcher, RecursiveMode,
    Watcher as NotifyWatcher,
};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Something that can subscribe to change notifications for a directory
pub trait WatchSource {
    /// Validate `path` and subscribe to its change notifications
    fn open(&self, path: &Path) -> Result<Subscription>;
}

/// Live event and error sequences for one watched directory
pub struct Subscription {
    path: PathBuf,
    events: mpsc::Receiver<RawEvent>,
    errors: mpsc::Receiver<Error>,
    watcher: Option<RecommendedWatcher>,
    closed: bool,
}

impl Subscription {
    /// Build a subscription over externally produced sequences
    ///
    /// Both sequences close once every sender is dropped or the subscription
    /// is released.
    pub fn from_channels(
        path: impl Into<PathBuf>,
        events: mpsc::Receiver<RawEvent>,
        errors: mpsc::Receiver<Error>,
    ) -> Self {
        Self {
            path: path.into(),
            events,
            errors,
            watcher: None,
            closed: false,
        }
    }

    /// Directory this subscription was opened for
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The raw event sequence
    pub fn events(&mut self) -> &mut mpsc::Receiver<RawEvent> {
        &mut self.events
    }

    /// The transport error sequence
    pub fn errors(&mut self) -> &mut mpsc::Receiver<Error> {
        &mut self.errors
    }

    /// Both sequences at once, for selecting over them
    pub fn channels(&mut self) -> (&mut mpsc::Receiver<RawEvent>, &mut mpsc::Receiver<Error>) {
        (&mut self.events, &mut self.errors)
    }

    /// Whether the subscription has been released
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Release the subscription. Safe to call more than once.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        // Drop the OS watcher first so its callback stops producing
        drop(self.watcher.take());
        self.events.close();
        self.errors.close();

        debug!(path = %self.path.display(), "released watch subscription");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("path", &self.path)
            .field("os_watcher", &self.watcher.is_some())
            .field("closed", &self.closed)
            .finish()
    }
}

/// [`WatchSource`] backed by the platform's recommended notify watcher
#[derive(Debug, Clone)]
pub struct NotifySource {
    capacity: usize,
}

impl NotifySource {
    /// Create a source whose event and error buffers hold `capacity` items
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Create a notify watcher that forwards into the given channels
    fn create_notify_watcher(
        &self,
        event_tx: mpsc::Sender<RawEvent>,
        error_tx: mpsc::Sender<Error>,
    ) -> Result<RecommendedWatcher> {
        RecommendedWatcher::new(
            move |res: std::result::Result<NotifyEvent, notify::Error>| match res {
                Ok(event) => {
                    for raw in RawEvent::from_notify(&event) {
                        if let Err(e) = event_tx.try_send(raw) {
                            warn!("Dropping change event: {e}");
                        }
                    }
                }
                Err(e) => {
                    if let Err(send_err) = error_tx.try_send(Error::watcher(e.to_string())) {
                        warn!("Dropping watcher error: {send_err}");
                    }
                }
            },
            NotifyConfig::default(),
        )
        .map_err(|e| Error::watch_setup(format!("failed to create watcher: {e}")))
    }
}

impl WatchSource for NotifySource {
    fn open(&self, path: &Path) -> Result<Subscription> {
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::DirectoryNotFound(path.to_path_buf()));
            }
            Err(e) => {
                return Err(Error::watch_setup(format!(
                    "failed to stat {}: {e}",
                    path.display()
                )));
            }
        };
        if !metadata.is_dir() {
            return Err(Error::NotADirectory(path.to_path_buf()));
        }

        if self.capacity == 0 {
            return Err(Error::config(
                "watch source capacity must be greater than 0".to_string(),
            ));
        }

        let (event_tx, event_rx) = mpsc::channel(self.capacity);
        let (error_tx, error_rx) = mpsc::channel(self.capacity);

        let mut watcher = self.create_notify_watcher(event_tx, error_tx)?;
        watcher
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|e| {
                Error::watch_setup(format!("failed to add directory to watcher: {e}"))
            })?;

        let mut subscription = Subscription::from_channels(path, event_rx, error_rx);
        subscription.watcher = Some(watcher);
        Ok(subscription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::OperationKind;
    use tempfile::TempDir;

    #[test]
    fn test_open_missing_directory() {
        let temp_dir = TempDir::new().expect("test setup failed");
        let missing = temp_dir.path().join("missing");

        let err = NotifySource::new(8).open(&missing).unwrap_err();
        assert!(matches!(err, Error::DirectoryNotFound(ref p) if *p == missing));
    }

    #[test]
    fn test_open_regular_file() {
        let temp_dir = TempDir::new().expect("test setup failed");
        let file = temp_dir.path().join("plain.txt");
        std::fs::write(&file, "hello").expect("test setup failed");

        let err = NotifySource::new(8).open(&file).unwrap_err();
        assert!(matches!(err, Error::NotADirectory(_)));
    }

    #[test]
    fn test_open_zero_capacity() {
        let temp_dir = TempDir::new().expect("test setup failed");
        let err = NotifySource::new(0).open(temp_dir.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_open_directory() {
        let temp_dir = TempDir::new().expect("test setup failed");
        let subscription = NotifySource::new(8)
            .open(temp_dir.path())
            .expect("test setup failed");
        assert_eq!(subscription.path(), temp_dir.path());
        assert!(!subscription.is_closed());
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_ends_sequences() {
        let (event_tx, event_rx) = mpsc::channel(4);
        let (error_tx, error_rx) = mpsc::channel(4);
        let mut subscription = Subscription::from_channels("/watched", event_rx, error_rx);

        event_tx
            .send(RawEvent::new(OperationKind::Write, "/watched/a"))
            .await
            .expect("test setup failed");

        subscription.close();
        subscription.close();
        assert!(subscription.is_closed());
        assert!(event_tx.is_closed());
        assert!(error_tx.is_closed());

        // Buffered items are still delivered before the sequence ends
        assert!(subscription.events().recv().await.is_some());
        assert!(subscription.events().recv().await.is_none());
        assert!(subscription.errors().recv().await.is_none());
    }

    #[tokio::test]
    async fn test_drop_releases_subscription() {
        let (event_tx, event_rx) = mpsc::channel::<RawEvent>(4);
        let (_error_tx, error_rx) = mpsc::channel(4);
        let subscription = Subscription::from_channels("/watched", event_rx, error_rx);

        drop(subscription);
        assert!(event_tx.is_closed());
    }
}
