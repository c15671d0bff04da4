//! Animated water plane

use skyraid_engine::foundation::math::constants::TAU;
use skyraid_engine::prelude::*;

use crate::objects::{AnimateContext, GameObject, ObjectKind, RenderContext};

/// Water surface drawn last, through the stencil
#[derive(Debug)]
pub struct Water {
    root: NodeId,
    phase: f32,
    wave_speed: f32,
}

impl Water {
    /// Grid of `size x size` vertices at `height`, textured with `texture`
    pub fn new(
        graph: &mut SceneGraph,
        resources: &mut ResourceManager,
        size: usize,
        scale: Vec3,
        height: f32,
        wave_speed: f32,
        texture: Option<TextureId>,
    ) -> Result<Self, SceneError> {
        let mesh = resources.add_mesh(Mesh::grid("Water", size, size, scale));
        let mut material = Material::colored("Water", Vec4::new(0.6, 0.8, 1.0, 0.7));
        if let Some(texture) = texture {
            material = material.with_texture(texture);
        }
        let material = resources.add_material(material)?;

        let root = graph.create_node("Water");
        graph.set_mesh(root, Some(mesh), resources)?;
        graph.set_material(root, 0, Some(material), resources)?;
        graph.set_position(root, Vec3::new(0.0, height, 0.0));

        Ok(Self {
            root,
            phase: 0.0,
            wave_speed,
        })
    }

    /// Wave phase in [0, 2pi)
    pub const fn phase(&self) -> f32 {
        self.phase
    }
}

impl GameObject for Water {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Water
    }

    fn root(&self) -> Option<NodeId> {
        Some(self.root)
    }

    fn shader_kind(&self) -> ShaderKind {
        ShaderKind::Water
    }

    fn animate(&mut self, ctx: &mut AnimateContext<'_>) {
        self.phase = (self.phase + self.wave_speed * ctx.dt).rem_euclid(TAU);
    }

    fn render(&self, ctx: &mut RenderContext<'_>) {
        ctx.commands.push(RenderCommand::SetStencilRef(1));
        ctx.commands.push(RenderCommand::SetWaveConstant(self.phase));
        ctx.draw_subtree(self.root);
    }
}
