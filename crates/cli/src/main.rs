//! dirwatch CLI - rate-limited directory watcher
//!
//! Watches one directory and runs a command (or just logs) when it changes,
//! suppressing bursts of notifications.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use anyhow::{Context, Result};
use clap::Parser;
use dirwatch_core::config::Config;
use dirwatch_watcher::{GovernorConfig, WatchSession, WorkFn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dirwatch")]
#[command(about = "Watch a directory and react to changes without being flooded by bursts")]
#[command(version)]
struct Cli {
    /// Directory to watch (not recursive)
    #[arg(value_name = "DIR")]
    dir: PathBuf,

    /// Maximum callbacks per event window
    #[arg(long, value_name = "N")]
    max_events: Option<usize>,

    /// Event window length in milliseconds
    #[arg(long, value_name = "MS")]
    event_window_ms: Option<u64>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Command to run on each admitted change; the directory is appended as its last argument
    #[arg(last = true, value_name = "COMMAND")]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let config = load_config(&cli)?;
    debug!(?config, "loaded configuration");

    let governor = GovernorConfig::with_work_fn(
        work_fn(cli.command.clone()),
        config.governor.max_events,
        config.governor.event_window(),
    )
    .context("Invalid governor configuration")?;

    let session = WatchSession::start(&cli.dir, governor, &config.watcher)
        .with_context(|| format!("Failed to watch {}", cli.dir.display()))?;

    let shutdown = session.cancellation_token();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl-C, stopping");
                shutdown.cancel();
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {e}"),
        }
    });

    let stats = session.wait().await.context("Watch session failed")?;
    info!(
        admitted = stats.admitted,
        suppressed = stats.suppressed,
        ignored = stats.ignored,
        transport_errors = stats.transport_errors,
        "session finished"
    );

    Ok(())
}

/// Initialize logging system
fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "dirwatch={level},dirwatch_core={level},dirwatch_watcher={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))
}

/// Load configuration and apply command-line overrides
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    apply_overrides(&mut config, cli);
    config.validate()?;
    Ok(config)
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(max_events) = cli.max_events {
        config.governor.max_events = max_events;
    }
    if let Some(window_ms) = cli.event_window_ms {
        config.governor.event_window_ms = window_ms;
    }
}

/// Build the work callback
///
/// The callback runs on the governor loop, so commands are spawned onto the
/// runtime rather than awaited.
fn work_fn(command: Vec<String>) -> WorkFn {
    let command = Arc::new(command);
    Arc::new(move |dir: &Path| {
        info!(path = %dir.display(), "work function called with directory");
        if let Some((program, args)) = command.split_first() {
            spawn_command(program.clone(), args.to_vec(), dir.to_path_buf());
        }
    })
}

fn spawn_command(program: String, args: Vec<String>, dir: PathBuf) {
    tokio::spawn(async move {
        let status = tokio::process::Command::new(&program)
            .args(&args)
            .arg(&dir)
            .status()
            .await;

        match status {
            Ok(status) if status.success() => debug!(%program, "command finished"),
            Ok(status) => warn!(%program, %status, "command exited unsuccessfully"),
            Err(e) => error!(%program, "Failed to run command: {e}"),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_minimal() {
        let cli = Cli::try_parse_from(["dirwatch", "/srv/inbox"]).unwrap();
        assert_eq!(cli.dir, PathBuf::from("/srv/inbox"));
        assert!(cli.max_events.is_none());
        assert!(cli.command.is_empty());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_parse_overrides_and_command() {
        let cli = Cli::try_parse_from([
            "dirwatch",
            "--max-events",
            "3",
            "--event-window-ms",
            "250",
            "-v",
            "/srv/inbox",
            "--",
            "rsync",
            "-a",
        ])
        .unwrap();

        assert_eq!(cli.max_events, Some(3));
        assert_eq!(cli.event_window_ms, Some(250));
        assert!(cli.verbose);
        assert_eq!(cli.command, vec!["rsync".to_string(), "-a".to_string()]);
    }

    #[test]
    fn test_command_appends_after_separator_only() {
        let cli = Cli::try_parse_from(["dirwatch", "/srv/inbox", "--", "make", "--keep-going"])
            .unwrap();
        assert_eq!(cli.command, vec!["make".to_string(), "--keep-going".to_string()]);

        assert!(Cli::try_parse_from(["dirwatch", "/srv/inbox", "make"]).is_err());
    }

    #[test]
    fn test_parse_requires_directory() {
        assert!(Cli::try_parse_from(["dirwatch"]).is_err());
    }

    #[test]
    fn test_overrides_win_over_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[governor]\nmax_events = 9\nevent_window_ms = 9000").unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let cli = Cli::try_parse_from([
            "dirwatch",
            "--config",
            path.as_str(),
            "--max-events",
            "2",
            "/srv/inbox",
        ])
        .unwrap();

        let config = load_config(&cli).unwrap();
        assert_eq!(config.governor.max_events, 2);
        assert_eq!(config.governor.event_window_ms, 9000);
    }

    #[test]
    fn test_zero_override_is_rejected() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        let path = file.path().to_string_lossy().into_owned();
        let cli = Cli::try_parse_from([
            "dirwatch",
            "--config",
            path.as_str(),
            "--max-events",
            "0",
            "/srv/inbox",
        ])
        .unwrap();

        assert!(load_config(&cli).is_err());
    }
}
