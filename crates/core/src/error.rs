use std::path::PathBuf;
use thiserror::Error;

/// Result type for dirwatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for dirwatch operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The directory to watch does not exist
    #[error("directory {} does not exist", .0.display())]
    DirectoryNotFound(PathBuf),

    /// The path exists but cannot be watched as a directory
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// Creating the OS subscription or registering the path failed
    #[error("Watch setup failed: {0}")]
    WatchSetup(String),

    /// Error reported by the watch transport during an active session
    #[error("Watcher error: {0}")]
    Watcher(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Any other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Creates a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a watch setup error
    pub fn watch_setup(msg: impl Into<String>) -> Self {
        Self::WatchSetup(msg.into())
    }

    /// Creates a watcher (transport) error
    pub fn watcher(msg: impl Into<String>) -> Self {
        Self::Watcher(msg.into())
    }

    /// Adds context to any error
    pub fn with_context<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Whether this error was raised while starting a watch session
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            Self::DirectoryNotFound(_) | Self::NotADirectory(_) | Self::WatchSetup(_)
        )
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::with_context(context, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_classification() {
        assert!(Error::DirectoryNotFound(PathBuf::from("/nope")).is_setup());
        assert!(Error::NotADirectory(PathBuf::from("/etc/hosts")).is_setup());
        assert!(Error::watch_setup("inotify limit reached").is_setup());
        assert!(!Error::watcher("queue overflow").is_setup());
        assert!(!Error::config("bad").is_setup());
    }

    #[test]
    fn test_directory_not_found_message() {
        let err = Error::DirectoryNotFound(PathBuf::from("/tmp/missing"));
        assert_eq!(err.to_string(), "directory /tmp/missing does not exist");
    }

    #[test]
    fn test_context_wraps_source() {
        let io: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        let err = io.context("Failed to stat directory").unwrap_err();
        assert_eq!(err.to_string(), "Failed to stat directory: denied");
    }
}
