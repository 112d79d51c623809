//! Error types for smlgate-core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for smlgate-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the gateway pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// The freshness-marker file is absent or unreadable.
    ///
    /// The service must not run any script until an external build step
    /// recreates the marker; the condition is re-checked on every request,
    /// never on a timer.
    #[error("freshness marker {0} not readable - web service not working")]
    MissingMarker(PathBuf),

    /// The manifest file could not be opened for reading.
    #[error("failed to open manifest {0} for reading")]
    MissingManifest(PathBuf),

    /// A request path does not lie under the document root.
    #[error("document root {root} is not a prefix of the requested path {path}")]
    PathOutsideRoot { root: PathBuf, path: PathBuf },

    /// The escaped artifact path exceeds the configured maximum length.
    #[error("artifact path length {len} exceeds the {max}-byte limit")]
    ArtifactPathTooLong { len: usize, max: usize },

    /// A path involved in name mapping is not valid UTF-8.
    #[error("path {0} is not valid UTF-8")]
    NonUtf8Path(PathBuf),

    /// The execution engine failed outside of script semantics
    /// (e.g. the runtime process could not be spawned).
    #[error("engine error: {0}")]
    Engine(String),

    /// A shared-state lock was poisoned by a panicking thread.
    #[error("engine lock poisoned")]
    LockPoisoned,

    /// Configuration file error.
    #[error("config error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
