//! Render command recording
//!
//! The scene records one [`CommandList`] per frame; the backend replays it.
//! Commands carry pre-computed constants, never scene references, so a
//! recorded list stays valid after the scene moves on.
//!
//! # Recording order
//!
//! The game scene records, per frame:
//!
//! ```text
//! SetRootSignature, SetCamera, UpdateLights
//! skybox, terrain patches, player, villains, bullets, billboards
//! ClearStencil, SetStencilRef(1), SetWaveConstant, water
//! ```

use bytemuck::{Pod, Zeroable};

use super::camera::CameraConstants;
use super::lighting::LightsRaw;
use super::shader::ShaderId;
use crate::assets::{Material, MaterialId, MeshId, TextureId};
use crate::foundation::math::Mat4;

/// Per-draw constants: world matrix plus the material's lighting colors
///
/// 32 floats, the size of the root constant block the illuminated pipeline reads.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ObjectConstants {
    /// Column-major world matrix
    pub world: [[f32; 4]; 4],
    /// Material ambient
    pub ambient: [f32; 4],
    /// Material diffuse (albedo)
    pub diffuse: [f32; 4],
    /// Material specular, `w` = power
    pub specular: [f32; 4],
    /// Material emissive
    pub emissive: [f32; 4],
}

impl ObjectConstants {
    /// Constants for drawing with `material`, or plain white when `None`
    pub fn new(world: &Mat4, material: Option<&Material>) -> Self {
        let default_material;
        let material = match material {
            Some(material) => material,
            None => {
                default_material = Material::default();
                &default_material
            }
        };

        Self {
            world: (*world).into(),
            ambient: material.ambient.into(),
            diffuse: material.albedo.into(),
            specular: material.specular.into(),
            emissive: material.emissive.into(),
        }
    }

    /// The world matrix back as a `Mat4`
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from(self.world)
    }
}

/// Edge/inside tessellation factors for terrain patches
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TessellationFactors {
    /// Edge factor
    pub edge: f32,
    /// Inside factor
    pub inside: f32,
}

/// One recorded command
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    /// Bind the root signature shared by every pipeline
    SetRootSignature,
    /// Upload camera constants and set viewport/scissor
    SetCamera(CameraConstants),
    /// Upload the light constant buffer
    UpdateLights(Box<LightsRaw>),
    /// Switch pipeline
    SetPipeline(ShaderId),
    /// Draw one batch (sub-mesh) of a mesh
    DrawMesh {
        /// Mesh to draw
        mesh: MeshId,
        /// Sub-mesh index
        batch: usize,
        /// Material bound for this batch
        material: Option<MaterialId>,
        /// Texture bound for this batch
        texture: Option<TextureId>,
        /// World + material constants
        constants: ObjectConstants,
    },
    /// Draw a mesh once per instance transform
    DrawInstanced {
        /// Mesh to draw
        mesh: MeshId,
        /// Material shared by all instances
        material: Option<MaterialId>,
        /// Texture shared by all instances
        texture: Option<TextureId>,
        /// Per-instance world matrices (column-major)
        instances: Vec<[[f32; 4]; 4]>,
    },
    /// Draw one terrain patch
    DrawTerrainPatch {
        /// Patch mesh
        mesh: MeshId,
        /// Terrain material
        material: Option<MaterialId>,
        /// World + material constants
        constants: ObjectConstants,
        /// Tessellation factors, `None` when drawn as plain triangles
        tessellation: Option<TessellationFactors>,
    },
    /// Set the water wave phase constant
    SetWaveConstant(f32),
    /// Clear the stencil buffer to zero
    ClearStencil,
    /// Set the stencil reference value
    SetStencilRef(u32),
    /// Draw a screen-space quad (x, y, width, height in pixels)
    DrawUi {
        /// Texture shown on the quad
        texture: Option<TextureId>,
        /// Screen rectangle
        rect: [f32; 4],
    },
}

impl RenderCommand {
    /// Whether this command issues a draw
    pub const fn is_draw(&self) -> bool {
        matches!(
            self,
            Self::DrawMesh { .. }
                | Self::DrawInstanced { .. }
                | Self::DrawTerrainPatch { .. }
                | Self::DrawUi { .. }
        )
    }
}

/// Commands recorded for one frame
#[derive(Debug, Clone, Default)]
pub struct CommandList {
    commands: Vec<RenderCommand>,
}

impl CommandList {
    /// Create a new empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a list with pre-allocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            commands: Vec::with_capacity(capacity),
        }
    }

    /// Record a command
    pub fn push(&mut self, command: RenderCommand) {
        self.commands.push(command);
    }

    /// Number of recorded commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// True when nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Drop all commands, keeping the allocation
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Recorded commands in order
    pub fn iter(&self) -> std::slice::Iter<'_, RenderCommand> {
        self.commands.iter()
    }

    /// Recorded commands as a slice
    pub fn as_slice(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Number of draw commands
    pub fn draw_count(&self) -> usize {
        self.commands.iter().filter(|c| c.is_draw()).count()
    }

    /// Position of the first command matching `predicate`
    pub fn position(&self, predicate: impl FnMut(&RenderCommand) -> bool) -> Option<usize> {
        self.commands.iter().position(predicate)
    }
}

impl<'a> IntoIterator for &'a CommandList {
    type Item = &'a RenderCommand;
    type IntoIter = std::slice::Iter<'a, RenderCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Vec3, Vec4};

    #[test]
    fn test_object_constants_layout() {
        assert_eq!(std::mem::size_of::<ObjectConstants>(), 32 * 4);
        let world = Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0));
        let material = Material::colored("red", Vec4::new(1.0, 0.0, 0.0, 1.0));
        let constants = ObjectConstants::new(&world, Some(&material));

        // Column-major: translation lives in the fourth column.
        assert_eq!(constants.world[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(constants.diffuse, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(constants.world_matrix(), world);
        assert_eq!(bytemuck::bytes_of(&constants).len(), 128);
    }

    #[test]
    fn test_draw_count_ignores_state_commands() {
        let mut list = CommandList::with_capacity(4);
        list.push(RenderCommand::SetRootSignature);
        list.push(RenderCommand::ClearStencil);
        list.push(RenderCommand::DrawUi {
            texture: None,
            rect: [0.0, 0.0, 10.0, 10.0],
        });
        assert_eq!(list.len(), 3);
        assert_eq!(list.draw_count(), 1);
        assert_eq!(list.position(|c| matches!(c, RenderCommand::ClearStencil)), Some(1));

        list.clear();
        assert!(list.is_empty());
    }
}
