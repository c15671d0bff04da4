//! Model templates
//!
//! A [`ModelTemplate`] is a loaded model whose meshes and materials have been
//! registered once in the [`ResourceManager`]. The template holds one
//! reference to each; every [`instantiate`](ModelTemplate::instantiate) call
//! builds a fresh node subtree that adds its own references, so several
//! villains can fly the same helicopter without copying geometry.

use super::{NodeId, SceneError, SceneGraph};
use crate::assets::{FrameData, MaterialId, MeshId, ModelData, ResourceError, ResourceManager, TextureId};
use crate::foundation::math::Mat4;
use crate::render::ShaderId;

#[derive(Debug, Clone)]
struct TemplateFrame {
    name: String,
    transform: Mat4,
    parent: Option<usize>,
    mesh: Option<MeshId>,
    materials: Vec<MaterialId>,
}

/// Registered, instantiable model
#[derive(Debug)]
pub struct ModelTemplate {
    frames: Vec<TemplateFrame>,
    texture: Option<TextureId>,
}

impl ModelTemplate {
    /// Register a model's meshes and materials; materials are drawn with `shader`
    pub fn register(
        model: &ModelData,
        resources: &mut ResourceManager,
        shader: Option<ShaderId>,
    ) -> Result<Self, ResourceError> {
        let mut frames = Vec::with_capacity(model.root.frame_count());
        let mut stack: Vec<(&FrameData, Option<usize>)> = vec![(&model.root, None)];

        while let Some((frame, parent)) = stack.pop() {
            let mesh = match &frame.mesh {
                Some(mesh) => {
                    let id = resources.add_mesh(mesh.clone());
                    resources.add_ref_mesh(id)?;
                    Some(id)
                }
                None => None,
            };

            let mut materials = Vec::with_capacity(frame.materials.len());
            for material in &frame.materials {
                let mut material = material.clone();
                if let Some(shader) = shader {
                    material.set_shader(shader);
                }
                let id = resources.add_material(material)?;
                resources.add_ref_material(id)?;
                materials.push(id);
            }

            let index = frames.len();
            frames.push(TemplateFrame {
                name: frame.name.clone(),
                transform: frame.transform,
                parent,
                mesh,
                materials,
            });
            stack.extend(frame.children.iter().rev().map(|child| (child, Some(index))));
        }

        Ok(Self { frames, texture: None })
    }

    /// Build a new node subtree; returns its root
    pub fn instantiate(
        &self,
        graph: &mut SceneGraph,
        resources: &mut ResourceManager,
    ) -> Result<NodeId, SceneError> {
        let mut ids: Vec<NodeId> = Vec::with_capacity(self.frames.len());
        for frame in &self.frames {
            let id = graph.create_node(frame.name.clone());
            graph.set_local(id, frame.transform);
            graph.set_mesh(id, frame.mesh, resources)?;
            for (index, &material) in frame.materials.iter().enumerate() {
                graph.set_material(id, index, Some(material), resources)?;
            }
            // Frames are stored parent-first, so the parent already exists.
            if let Some(parent) = frame.parent.and_then(|p| ids.get(p).copied()) {
                graph.attach(parent, id)?;
            }
            ids.push(id);
        }

        ids.first().copied().ok_or(SceneError::Resource(ResourceError::StaleHandle { kind: "model" }))
    }

    /// Number of frames per instance
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Name of the root frame
    pub fn root_name(&self) -> &str {
        self.frames.first().map_or("", |f| f.name.as_str())
    }

    /// Point every material of the model at `texture`
    ///
    /// The template keeps its own reference to the texture until
    /// [`release`](Self::release), so a model without materials still frees it.
    pub fn set_texture(
        &mut self,
        texture: Option<TextureId>,
        resources: &mut ResourceManager,
    ) -> Result<(), ResourceError> {
        if let Some(texture) = texture {
            resources.add_ref_texture(texture)?;
        }
        for &material in self.frames.iter().flat_map(|f| &f.materials) {
            resources.set_material_texture(material, texture)?;
        }
        if let Some(previous) = std::mem::replace(&mut self.texture, texture) {
            resources.release_texture(previous)?;
        }
        Ok(())
    }

    /// Give back the template's own references
    pub fn release(self, resources: &mut ResourceManager) -> Result<(), ResourceError> {
        for frame in self.frames {
            if let Some(mesh) = frame.mesh {
                resources.release_mesh(mesh)?;
            }
            for material in frame.materials {
                resources.release_material(material)?;
            }
        }
        if let Some(texture) = self.texture {
            resources.release_texture(texture)?;
        }
        Ok(())
    }
}
