//! Rendering: command recording, lighting constants, shaders, camera and backends
//!
//! The scene never talks to a graphics API directly. Each frame it records a
//! [`CommandList`] that a [`RenderBackend`] consumes.

pub mod backend;
pub mod camera;
pub mod commands;
pub mod lighting;
pub mod shader;

pub use backend::{FrameStats, HeadlessBackend, RenderBackend};
pub use camera::{Camera, CameraConstants, Viewport};
pub use commands::{CommandList, ObjectConstants, RenderCommand, TessellationFactors};
pub use lighting::{Light, LightType, Lights, LightsRaw, MAX_LIGHTS};
pub use shader::{ShaderId, ShaderKind, ShaderRegistry};

use thiserror::Error;

/// Rendering errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Scene asked for a pipeline nobody registered
    #[error("No shader registered for {0:?}")]
    MissingShader(ShaderKind),

    /// Submission outside `begin_frame`/`present`
    #[error("Command list submitted outside of a frame")]
    FrameNotBegun,

    /// `begin_frame` called twice without presenting
    #[error("Frame {0} was begun twice")]
    FrameAlreadyBegun(u64),

    /// Backend-specific failure
    #[error("Backend error: {0}")]
    Backend(String),
}
