use std::path::PathBuf;

use thiserror::Error;

/// Errors that can stop a sampling loop
///
/// Bus errors never get this far; each iteration contains its own.
#[derive(Error, Debug)]
pub enum SamplerError {
    #[error("log I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("could not start thread for sampling loop '{name}': {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("sampling loop '{0}' panicked")]
    LoopPanicked(String),
}

impl SamplerError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SamplerError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for sampler operations
pub type SamplerResult<T> = Result<T, SamplerError>;
