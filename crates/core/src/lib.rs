//! Core types for the dirwatch directory watcher
//!
//! This crate provides the pieces shared by the watcher library and the CLI:
//!
//! - **Configuration**: governor and watch source settings, loaded from TOML
//!   files and `DIRWATCH_*` environment variables
//! - **Error handling**: unified error type covering setup and transport failures
//!

pub mod config;
pub mod error;

pub use config::{Config, GovernorSettings, WatcherSettings};
pub use error::{Error, Result, ResultExt};
