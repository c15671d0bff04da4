//! Shader registry
//!
//! Pipelines are created by the backend and named here by [`ShaderKind`].
//! The registry is built once and passed into scene construction; materials
//! store the [`ShaderId`] they were given.

use std::collections::HashMap;

use super::RenderError;

/// Opaque pipeline handle issued by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderId(pub u32);

/// The pipelines the game draws with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    /// Lit, material-colored meshes (models, player, villains)
    Illuminated,
    /// Vertex-colored meshes (bullets)
    Diffused,
    /// Inside-out textured cube
    Skybox,
    /// Height-map patches with optional tessellation
    Terrain,
    /// Stencil-tested animated water
    Water,
    /// Camera-facing instanced quads
    Billboard,
    /// Screen-space quads for the lobby
    Ui,
}

impl ShaderKind {
    /// Every kind, in registration order
    pub const ALL: [Self; 7] = [
        Self::Illuminated,
        Self::Diffused,
        Self::Skybox,
        Self::Terrain,
        Self::Water,
        Self::Billboard,
        Self::Ui,
    ];
}

/// Kind -> pipeline lookup
#[derive(Debug, Clone, Default)]
pub struct ShaderRegistry {
    shaders: HashMap<ShaderKind, ShaderId>,
}

impl ShaderRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every kind mapped to sequential ids
    pub fn with_all_kinds() -> Self {
        let mut registry = Self::new();
        for (id, kind) in (0u32..).zip(ShaderKind::ALL) {
            registry.register(kind, ShaderId(id));
        }
        registry
    }

    /// Map a kind to a pipeline, returning the previous mapping
    pub fn register(&mut self, kind: ShaderKind, id: ShaderId) -> Option<ShaderId> {
        self.shaders.insert(kind, id)
    }

    /// Look up a pipeline
    pub fn get(&self, kind: ShaderKind) -> Option<ShaderId> {
        self.shaders.get(&kind).copied()
    }

    /// Look up a pipeline the caller cannot draw without
    pub fn require(&self, kind: ShaderKind) -> Result<ShaderId, RenderError> {
        self.get(kind).ok_or(RenderError::MissingShader(kind))
    }

    /// Number of registered pipelines
    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }
}
