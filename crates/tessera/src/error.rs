//! # Engine Error Types
//!
//! All errors that can occur while configuring or running the engine.

use std::path::PathBuf;

use tessera_render::RenderError;
use thiserror::Error;

/// Errors that can occur in the engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Compositor, resources or device.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Engine configuration rejected.
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// The configuration file is not valid TOML for [`crate::EngineConfig`].
    #[error("could not parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration file could not be read.
    #[error("could not read {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
