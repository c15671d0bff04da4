//! Sky cube

use skyraid_engine::prelude::*;

use crate::objects::{AnimateContext, GameObject, ObjectKind};

/// Inside-out textured cube centered on the camera
#[derive(Debug)]
pub struct Skybox {
    root: NodeId,
}

impl Skybox {
    /// Cube of edge `size`
    pub fn new(
        graph: &mut SceneGraph,
        resources: &mut ResourceManager,
        size: f32,
        texture: Option<TextureId>,
    ) -> Result<Self, SceneError> {
        let mesh = resources.add_mesh(Mesh::inside_out_cube("SkyBox", size));
        let mut material = Material::new("SkyBox");
        if let Some(texture) = texture {
            material = material.with_texture(texture);
        }
        let material = resources.add_material(material)?;

        let root = graph.create_node("SkyBox");
        graph.set_mesh(root, Some(mesh), resources)?;
        graph.set_material(root, 0, Some(material), resources)?;
        Ok(Self { root })
    }

    /// Recenter on the eye
    pub fn follow(&self, graph: &mut SceneGraph, eye: Vec3) {
        graph.set_position(self.root, eye);
    }
}

impl GameObject for Skybox {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Skybox
    }

    fn root(&self) -> Option<NodeId> {
        Some(self.root)
    }

    fn shader_kind(&self) -> ShaderKind {
        ShaderKind::Skybox
    }

    fn animate(&mut self, _ctx: &mut AnimateContext<'_>) {}
}
