//! Game-level errors

use std::path::PathBuf;

use skyraid_engine::assets::{ModelError, ResourceError};
use skyraid_engine::config::ConfigError;
use skyraid_engine::render::RenderError;
use skyraid_engine::scene::SceneError;
use thiserror::Error;

/// Anything that can stop the game from building or running a frame
#[derive(Debug, Error)]
pub enum GameError {
    /// Configuration could not be read
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Model file could not be parsed
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Shared asset bookkeeping failed
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    /// Scene graph operation failed
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Backend or pipeline lookup failed
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Height map file missing or of the wrong size
    #[error("Height map {}: {reason}", path.display())]
    HeightMap {
        /// Offending file
        path: PathBuf,
        /// What was wrong
        reason: String,
    },
}
