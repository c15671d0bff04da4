//! Surface materials
//!
//! A material carries the lighting colors the object constants need, an
//! optional texture (counted in the [`ResourceManager`](super::ResourceManager))
//! and the shader it is drawn with.

use crate::foundation::math::Vec4;
use crate::render::ShaderId;

use super::TextureId;

/// Material colors and surface parameters
#[derive(Debug, Clone)]
pub struct Material {
    /// Material name
    pub name: String,
    /// Albedo (diffuse) color
    pub albedo: Vec4,
    /// Ambient color
    pub ambient: Vec4,
    /// Specular color; `w` is the specular power
    pub specular: Vec4,
    /// Emissive color
    pub emissive: Vec4,
    /// Glossiness
    pub glossiness: f32,
    /// Smoothness
    pub smoothness: f32,
    /// Metallic factor
    pub metallic: f32,
    /// Specular highlight factor
    pub specular_highlight: f32,
    /// Glossy reflection factor
    pub glossy_reflection: f32,
    texture: Option<TextureId>,
    shader: Option<ShaderId>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            albedo: Vec4::new(1.0, 1.0, 1.0, 1.0),
            ambient: Vec4::new(0.2, 0.2, 0.2, 1.0),
            specular: Vec4::new(0.0, 0.0, 0.0, 1.0),
            emissive: Vec4::zeros(),
            glossiness: 0.0,
            smoothness: 0.0,
            metallic: 0.0,
            specular_highlight: 0.0,
            glossy_reflection: 0.0,
            texture: None,
            shader: None,
        }
    }
}

impl Material {
    /// Default material with a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Material with a flat albedo color
    pub fn colored(name: impl Into<String>, albedo: Vec4) -> Self {
        Self {
            albedo,
            ..Self::new(name)
        }
    }

    /// Set the texture before the material is registered
    #[must_use]
    pub fn with_texture(mut self, texture: TextureId) -> Self {
        self.texture = Some(texture);
        self
    }

    /// Set the shader this material is drawn with
    #[must_use]
    pub fn with_shader(mut self, shader: ShaderId) -> Self {
        self.shader = Some(shader);
        self
    }

    /// Current texture
    pub const fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    /// Current shader
    pub const fn shader(&self) -> Option<ShaderId> {
        self.shader
    }

    /// Switch shaders; shaders are owned by the registry and not counted
    pub fn set_shader(&mut self, shader: ShaderId) {
        self.shader = Some(shader);
    }

    pub(crate) fn replace_texture(&mut self, texture: Option<TextureId>) -> Option<TextureId> {
        std::mem::replace(&mut self.texture, texture)
    }
}
