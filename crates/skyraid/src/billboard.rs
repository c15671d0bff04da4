//! Billboard trees
//!
//! Trees are not scene-graph nodes. The batch keeps one small record per
//! tree and draws them all with a single instanced call.

use rand::Rng;
use skyraid_engine::prelude::*;
use skyraid_engine::render::{RenderError, ShaderId};

use crate::objects::{AnimateContext, GameObject, ObjectKind, RenderContext};
use crate::terrain::Terrain;

/// Sway limit in degrees
const MAX_SWAY: f32 = 15.0;

/// One tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Billboard {
    /// Base of the quad in world space
    pub position: Vec3,
    /// Current sway in degrees
    pub angle: f32,
    /// Sway step per frame in degrees
    pub delta: f32,
}

impl Billboard {
    /// Tree standing upright at `position`
    pub const fn new(position: Vec3) -> Self {
        Self {
            position,
            angle: 0.0,
            delta: 1.0,
        }
    }

    /// Step the sway, reversing at the limits
    pub fn sway(&mut self) {
        self.angle += self.delta;
        if self.angle.abs() >= MAX_SWAY {
            self.angle = self.angle.clamp(-MAX_SWAY, MAX_SWAY);
            self.delta = -self.delta;
        }
    }

    fn instance_matrix(&self) -> [[f32; 4]; 4] {
        (Mat4::new_translation(&self.position) * Mat4::rotation_axis(&Vec3::z(), self.angle)).into()
    }
}

/// All trees, drawn as one instanced batch
#[derive(Debug)]
pub struct BillboardBatch {
    mesh: MeshId,
    material: MaterialId,
    trees: Vec<Billboard>,
    visible: bool,
    shader: Option<ShaderId>,
}

impl BillboardBatch {
    /// Quad shared by every tree; the batch holds one reference to each asset
    pub fn new(
        resources: &mut ResourceManager,
        width: f32,
        height: f32,
        texture: Option<TextureId>,
    ) -> Result<Self, ResourceError> {
        let mesh = resources.add_mesh(Mesh::quad("Tree", width, height));
        resources.add_ref_mesh(mesh)?;
        let mut material = Material::new("Tree");
        if let Some(texture) = texture {
            material = material.with_texture(texture);
        }
        let material = resources.add_material(material)?;
        resources.add_ref_material(material)?;

        Ok(Self {
            mesh,
            material,
            trees: Vec::new(),
            visible: true,
            shader: None,
        })
    }

    /// Plant `count` trees at random spots on the terrain
    pub fn scatter(&mut self, count: usize, terrain: &Terrain, rng: &mut impl Rng) {
        let (width, length) = (terrain.width(), terrain.length());
        if width <= 0.0 || length <= 0.0 {
            return;
        }
        self.trees.extend((0..count).map(|_| {
            let x = rng.gen_range(0.0..width);
            let z = rng.gen_range(0.0..length);
            Billboard::new(Vec3::new(x, terrain.height(x, z), z))
        }));
    }

    /// Trees in the batch
    pub fn trees(&self) -> &[Billboard] {
        &self.trees
    }

    /// Whether the batch is drawn
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Show or hide the trees
    pub fn toggle_visible(&mut self) -> bool {
        self.visible = !self.visible;
        log::debug!("Billboards visible: {}", self.visible);
        self.visible
    }

    /// Give back the batch's asset references
    pub fn release(self, resources: &mut ResourceManager) -> Result<(), ResourceError> {
        resources.release_mesh(self.mesh)?;
        resources.release_material(self.material)?;
        Ok(())
    }
}

impl GameObject for BillboardBatch {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Billboard
    }

    fn root(&self) -> Option<NodeId> {
        None
    }

    fn shader_kind(&self) -> ShaderKind {
        ShaderKind::Billboard
    }

    fn build_materials(
        &mut self,
        _graph: &SceneGraph,
        resources: &mut ResourceManager,
        shaders: &ShaderRegistry,
    ) -> Result<(), RenderError> {
        let shader = shaders.require(ShaderKind::Billboard)?;
        if let Some(material) = resources.material_mut(self.material) {
            material.set_shader(shader);
        }
        self.shader = Some(shader);
        Ok(())
    }

    fn animate(&mut self, _ctx: &mut AnimateContext<'_>) {
        for tree in &mut self.trees {
            tree.sway();
        }
    }

    fn render(&self, ctx: &mut RenderContext<'_>) {
        if !self.is_visible() || self.trees.is_empty() {
            return;
        }
        if let Some(shader) = self.shader {
            ctx.bind(shader);
        }
        ctx.commands.push(RenderCommand::DrawInstanced {
            mesh: self.mesh,
            material: Some(self.material),
            texture: ctx.resources.material(self.material).and_then(Material::texture),
            instances: self.trees.iter().map(Billboard::instance_matrix).collect(),
        });
    }
}
