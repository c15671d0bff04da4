//! Height-map terrain
//!
//! The terrain is a grid of patches, each a small height grid under its own
//! node. Height queries interpolate the raw samples the same way the patch
//! triangles split each quad, so objects placed with [`Terrain::height`] sit
//! on the drawn surface.

use std::path::Path;

use skyraid_engine::prelude::*;
use skyraid_engine::render::{ObjectConstants, RenderError, ShaderId, TessellationFactors};

use crate::error::GameError;
use crate::objects::{GameObject, ObjectKind, RenderContext};

/// 8-bit height samples, row 0 at the minimum z
#[derive(Debug, Clone)]
pub struct HeightMap {
    width: usize,
    length: usize,
    samples: Vec<u8>,
}

impl HeightMap {
    /// Wrap raw bytes stored top row first (as image editors write them)
    pub fn from_raw(bytes: &[u8], width: usize, length: usize) -> Option<Self> {
        if width == 0 || length == 0 || bytes.len() != width * length {
            return None;
        }
        let samples = bytes
            .chunks_exact(width)
            .rev()
            .flatten()
            .copied()
            .collect();
        Some(Self { width, length, samples })
    }

    /// Read a raw height map file
    pub fn load(path: impl AsRef<Path>, width: usize, length: usize) -> Result<Self, GameError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| GameError::HeightMap {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_raw(&bytes, width, length).ok_or_else(|| GameError::HeightMap {
            path: path.to_path_buf(),
            reason: format!("expected {width}x{length} samples, found {} bytes", bytes.len()),
        })
    }

    /// Constant height everywhere
    pub fn flat(width: usize, length: usize, value: u8) -> Self {
        Self {
            width,
            length,
            samples: vec![value; width * length],
        }
    }

    /// Samples along x
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Samples along z
    pub const fn length(&self) -> usize {
        self.length
    }

    /// Raw sample, clamped to the map
    pub fn sample(&self, x: usize, z: usize) -> f32 {
        let x = x.min(self.width - 1);
        let z = z.min(self.length - 1);
        f32::from(self.samples[x + z * self.width])
    }

    /// Interpolated height in sample units; 0 outside the map
    ///
    /// Each quad is split into two triangles. `reverse_quad` selects the
    /// diagonal used by rows drawn in reverse.
    pub fn height(&self, fx: f32, fz: f32, reverse_quad: bool) -> f32 {
        if fx < 0.0 || fz < 0.0 || fx >= self.width as f32 || fz >= self.length as f32 {
            return 0.0;
        }
        let x = fx as usize;
        let z = fz as usize;
        let dx = fx - x as f32;
        let dz = fz - z as f32;

        let mut bottom_left = self.sample(x, z);
        let mut bottom_right = self.sample(x + 1, z);
        let mut top_left = self.sample(x, z + 1);
        let mut top_right = self.sample(x + 1, z + 1);

        if reverse_quad {
            if dz >= dx {
                bottom_right = bottom_left + (top_right - top_left);
            } else {
                top_left = top_right + (bottom_left - bottom_right);
            }
        } else if dz < 1.0 - dx {
            top_right = top_left + (bottom_right - bottom_left);
        } else {
            bottom_left = top_left + (bottom_right - top_right);
        }

        let top = top_left * (1.0 - dx) + top_right * dx;
        let bottom = bottom_left * (1.0 - dx) + bottom_right * dx;
        bottom * (1.0 - dz) + top * dz
    }

    /// Surface normal at a sample, for a given world scale
    pub fn normal(&self, x: usize, z: usize, scale: Vec3) -> Vec3 {
        if x >= self.width || z >= self.length {
            return Vec3::y();
        }
        let x_next = if x + 1 < self.width { x + 1 } else { x.saturating_sub(1) };
        let z_next = if z + 1 < self.length { z + 1 } else { z.saturating_sub(1) };

        let y1 = self.sample(x, z) * scale.y;
        let y2 = self.sample(x_next, z) * scale.y;
        let y3 = self.sample(x, z_next) * scale.y;
        let along_z = Vec3::new(0.0, y3 - y1, scale.z);
        let along_x = Vec3::new(scale.x, y2 - y1, 0.0);
        skyraid_engine::foundation::math::utils::normalize_or(along_z.cross(&along_x), Vec3::y())
    }
}

/// How terrain patches are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TessellationMode {
    /// Patches refined by the tessellation stages
    #[default]
    Tessellated,
    /// Plain triangles
    Flat,
}

impl TessellationMode {
    /// The other mode
    pub const fn toggled(self) -> Self {
        match self {
            Self::Tessellated => Self::Flat,
            Self::Flat => Self::Tessellated,
        }
    }
}

const TESSELLATION: TessellationFactors = TessellationFactors { edge: 16.0, inside: 16.0 };

/// The ground
#[derive(Debug)]
pub struct Terrain {
    heightmap: HeightMap,
    scale: Vec3,
    root: NodeId,
    patches: Vec<NodeId>,
    material: MaterialId,
    mode: TessellationMode,
    shader: Option<ShaderId>,
}

impl Terrain {
    /// Build patches of `block` samples per side covering the height map
    pub fn new(
        heightmap: HeightMap,
        block: usize,
        scale: Vec3,
        color: Vec4,
        graph: &mut SceneGraph,
        resources: &mut ResourceManager,
    ) -> Result<Self, SceneError> {
        let block = block.max(2);
        let material = resources.add_material(Material::colored("Terrain", color))?;
        let root = graph.create_node("Terrain");

        let blocks_x = ((heightmap.width() - 1) / (block - 1)).max(1);
        let blocks_z = ((heightmap.length() - 1) / (block - 1)).max(1);
        let mut patches = Vec::with_capacity(blocks_x * blocks_z);
        for bz in 0..blocks_z {
            for bx in 0..blocks_x {
                let (x0, z0) = (bx * (block - 1), bz * (block - 1));
                let mesh = Mesh::height_grid(format!("Terrain_{bx}_{bz}"), block, block, scale, |x, z| {
                    heightmap.sample(x0 + x, z0 + z)
                });
                let mesh = resources.add_mesh(mesh);

                let patch = graph.create_node(format!("Patch_{bx}_{bz}"));
                graph.set_mesh(patch, Some(mesh), resources)?;
                graph.set_material(patch, 0, Some(material), resources)?;
                graph.set_position(patch, Vec3::new(x0 as f32 * scale.x, 0.0, z0 as f32 * scale.z));
                graph.attach(root, patch)?;
                patches.push(patch);
            }
        }
        log::info!("Terrain built: {blocks_x}x{blocks_z} patches of {block}x{block} samples");

        Ok(Self {
            heightmap,
            scale,
            root,
            patches,
            material,
            mode: TessellationMode::default(),
            shader: None,
        })
    }

    /// World height at (x, z); 0 off the map
    pub fn height(&self, x: f32, z: f32) -> f32 {
        self.heightmap.height(x / self.scale.x, z / self.scale.z, false) * self.scale.y
    }

    /// World normal at (x, z)
    pub fn normal(&self, x: f32, z: f32) -> Vec3 {
        if x < 0.0 || z < 0.0 {
            return Vec3::y();
        }
        self.heightmap
            .normal((x / self.scale.x) as usize, (z / self.scale.z) as usize, self.scale)
    }

    /// World extent along x covered by the patches
    pub fn width(&self) -> f32 {
        self.heightmap.width().saturating_sub(1) as f32 * self.scale.x
    }

    /// World extent along z covered by the patches
    pub fn length(&self) -> f32 {
        self.heightmap.length().saturating_sub(1) as f32 * self.scale.z
    }

    /// Scale from samples to world units
    pub const fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Number of patches
    pub fn patch_count(&self) -> usize {
        self.patches.len()
    }

    /// Current draw mode
    pub const fn mode(&self) -> TessellationMode {
        self.mode
    }

    /// Switch between tessellated and flat patches
    pub fn toggle_tessellation(&mut self) -> TessellationMode {
        self.mode = self.mode.toggled();
        log::debug!("Terrain tessellation: {:?}", self.mode);
        self.mode
    }
}

impl GameObject for Terrain {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Terrain
    }

    fn root(&self) -> Option<NodeId> {
        Some(self.root)
    }

    fn shader_kind(&self) -> ShaderKind {
        ShaderKind::Terrain
    }

    fn build_materials(
        &mut self,
        _graph: &SceneGraph,
        resources: &mut ResourceManager,
        shaders: &ShaderRegistry,
    ) -> Result<(), RenderError> {
        let shader = shaders.require(ShaderKind::Terrain)?;
        if let Some(material) = resources.material_mut(self.material) {
            material.set_shader(shader);
        }
        self.shader = Some(shader);
        Ok(())
    }

    fn animate(&mut self, _ctx: &mut crate::objects::AnimateContext<'_>) {}

    fn render(&self, ctx: &mut RenderContext<'_>) {
        if let Some(shader) = self.shader {
            ctx.bind(shader);
        }
        let material = ctx.resources.material(self.material);
        let tessellation = match self.mode {
            TessellationMode::Tessellated => Some(TESSELLATION),
            TessellationMode::Flat => None,
        };
        for &patch in &self.patches {
            let Some(mesh) = ctx.graph.node(patch).and_then(|n| n.mesh()) else {
                continue;
            };
            ctx.commands.push(RenderCommand::DrawTerrainPatch {
                mesh,
                material: Some(self.material),
                constants: ObjectConstants::new(&ctx.graph.world(patch), material),
                tessellation,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// 3x3 map, bottom row (z = 0) all zero, rising by 10 per row
    fn ramp() -> HeightMap {
        // Stored top row first: z = 2, then z = 1, then z = 0.
        HeightMap::from_raw(&[20, 20, 20, 10, 10, 10, 0, 0, 0], 3, 3).unwrap()
    }

    #[test]
    fn test_rows_are_flipped_on_load() {
        let map = ramp();
        assert_relative_eq!(map.sample(0, 0), 0.0);
        assert_relative_eq!(map.sample(1, 2), 20.0);
        assert!(HeightMap::from_raw(&[0; 8], 3, 3).is_none());
    }

    #[test]
    fn test_height_interpolates_and_is_zero_off_map() {
        let map = ramp();
        assert_relative_eq!(map.height(0.5, 0.5, false), 5.0, epsilon = 1e-5);
        assert_relative_eq!(map.height(1.25, 1.5, true), 15.0, epsilon = 1e-5);
        assert_relative_eq!(map.height(-0.1, 1.0, false), 0.0);
        assert_relative_eq!(map.height(1.0, 3.0, false), 0.0);
    }

    #[test]
    fn test_split_diagonal_on_uneven_quad() {
        // Only the top-right corner is raised.
        let map = HeightMap::from_raw(&[0, 8, 0, 0], 2, 2).unwrap();
        // Lower-left triangle never sees the raised corner.
        assert_relative_eq!(map.height(0.2, 0.2, false), 0.0, epsilon = 1e-5);
        // Upper-right triangle interpolates towards it.
        assert_relative_eq!(map.height(0.9, 0.9, false), 6.4, epsilon = 1e-4);
    }

    #[test]
    fn test_world_height_and_normal_use_scale() {
        let mut graph = SceneGraph::new();
        let mut resources = ResourceManager::new();
        let terrain = Terrain::new(
            HeightMap::flat(17, 17, 5),
            9,
            Vec3::new(4.0, 6.0, 4.0),
            Vec4::new(0.6, 0.5, 0.2, 0.0),
            &mut graph,
            &mut resources,
        )
        .unwrap();

        assert_eq!(terrain.patch_count(), 4);
        assert_relative_eq!(terrain.height(30.0, 30.0), 30.0, epsilon = 1e-4);
        assert_relative_eq!(terrain.height(-1.0, 30.0), 0.0);
        assert_relative_eq!(terrain.normal(30.0, 30.0), Vec3::y(), epsilon = 1e-5);
        assert_relative_eq!(terrain.width(), 64.0);
        assert_relative_eq!(terrain.length(), 64.0);
    }

    #[test]
    fn test_render_follows_tessellation_mode() {
        let mut graph = SceneGraph::new();
        let mut resources = ResourceManager::new();
        let shaders = ShaderRegistry::with_all_kinds();
        let mut terrain = Terrain::new(HeightMap::flat(17, 17, 0), 9, Vec3::repeat(1.0), Vec4::zeros(), &mut graph, &mut resources).unwrap();
        terrain.build_materials(&graph, &mut resources, &shaders).unwrap();

        let mut commands = CommandList::new();
        terrain.render(&mut RenderContext::new(&graph, &resources, &mut commands));
        assert_eq!(commands.as_slice()[0], RenderCommand::SetPipeline(shaders.get(ShaderKind::Terrain).unwrap()));
        assert_eq!(commands.draw_count(), 4);
        assert!(commands.iter().all(|c| !matches!(
            c,
            RenderCommand::DrawTerrainPatch { tessellation: None, .. }
        )));

        assert_eq!(terrain.toggle_tessellation(), TessellationMode::Flat);
        commands.clear();
        terrain.render(&mut RenderContext::new(&graph, &resources, &mut commands));
        assert!(commands.iter().filter(|c| c.is_draw()).all(|c| matches!(
            c,
            RenderCommand::DrawTerrainPatch { tessellation: None, .. }
        )));
    }

    #[test]
    fn test_patches_sit_at_their_block_origin() {
        let mut graph = SceneGraph::new();
        let mut resources = ResourceManager::new();
        let terrain = Terrain::new(HeightMap::flat(17, 17, 0), 9, Vec3::new(4.0, 1.0, 4.0), Vec4::zeros(), &mut graph, &mut resources).unwrap();
        let last = *terrain.patches.last().unwrap();
        assert_relative_eq!(graph.position(last), Vec3::new(32.0, 0.0, 32.0));
        // One mesh per patch, one shared material.
        assert_eq!(resources.live_counts(), (4, 0, 1));
    }
}
