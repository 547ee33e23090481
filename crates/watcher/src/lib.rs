#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

//! Rate-limited directory watching
//!
//! This crate watches a single directory for change notifications and runs a
//! caller-supplied callback when activity occurs, while suppressing bursts:
//! - Operation-kind filtering (write, create, remove, permission change)
//! - A rolling-restart window capping callbacks per window
//! - A single-owner governor loop with an explicit stop signal
//!
//! # Example
//!
//! ```no_run
//! use dirwatch_core::WatcherSettings;
//! use dirwatch_watcher::{GovernorConfig, WatchSession};
//! use std::path::Path;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GovernorConfig::new(
//!     |dir: &Path| println!("activity in {}", dir.display()),
//!     1,
//!     Duration::from_secs(5),
//! )?;
//!
//! let session = WatchSession::start("/path/to/dir", config, &WatcherSettings::default())?;
//!
//! // ... later
//! let stats = session.stop().await?;
//! println!("admitted {} events", stats.admitted);
//! # Ok(())
//! # }
//! ```

mod events;
mod governor;
mod session;
mod source;

pub use events::{OperationKind, RawEvent};
pub use governor::{
    Decision, EventGovernor, GovernorConfig, GovernorState, GovernorStats, Suppression, WorkFn,
};
pub use session::{watch_directory, watch_directory_with, WatchSession};
pub use source::{NotifySource, Subscription, WatchSource};

