//! Error types for the context reduction pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while building a bounded prompt context.
#[derive(Error, Debug)]
pub enum ContextError {
    /// A caller passed a value the pipeline cannot work with.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Reading, writing or removing the summary cache failed.
    #[error("Cache I/O failed for {path}: {source}")]
    CacheIo {
        /// Location of the cache file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl ContextError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub(crate) fn cache_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CacheIo {
            path: path.into(),
            source,
        }
    }
}
