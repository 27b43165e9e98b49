//! Error types for tutpage.
//!
//! Library crates use [`TutpageError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all tutpage operations.
///
/// Every variant except [`TutpageError::Config`] aborts a build before the
/// build state is written.
#[derive(Debug, thiserror::Error)]
pub enum TutpageError {
    /// The "latest change" metadata endpoint could not be reached or answered garbage.
    #[error("remote unavailable at {url}: {reason}")]
    RemoteUnavailable { url: String, reason: String },

    /// The remote has zero change records for the tracked path.
    #[error("no history found for {repo} at path '{path}'")]
    NoHistoryFound { repo: String, path: String },

    /// The sparse fetch of the remote subtree failed.
    #[error("fetch of {source_spec} failed: {reason}")]
    FetchFailed { source_spec: String, reason: String },

    /// A section directory has no readable metadata sidecar.
    #[error("missing section metadata at {path:?}: {reason}")]
    MissingSectionMetadata { path: PathBuf, reason: String },

    /// A chapter directory has no markdown document.
    #[error("missing chapter content at {path:?}: {source}")]
    MissingChapterContent {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A directory name does not start with a parseable integer index.
    #[error("malformed index in directory name '{name}'")]
    MalformedIndex { name: String },

    /// HTML rendering or template substitution failed.
    #[error("render failed: {0}")]
    RenderFailed(String),

    /// The build state could not be written.
    #[error("failed to persist build state to {path:?}: {reason}")]
    PersistFailed { path: PathBuf, reason: String },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A concurrent task panicked or was cancelled.
    #[error("task failed: {0}")]
    Task(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TutpageError>;

impl TutpageError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a render error from any displayable message.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::RenderFailed(msg.into())
    }

    /// Create a fetch error for the given `repo/path` spec.
    pub fn fetch(source_spec: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FetchFailed {
            source_spec: source_spec.into(),
            reason: reason.into(),
        }
    }

    /// Create a remote-unavailable error for the given URL.
    pub fn remote(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RemoteUnavailable {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
