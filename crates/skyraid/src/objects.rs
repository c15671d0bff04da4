//! Game object capabilities
//!
//! Every object variant is its own struct; [`GameObject`] is the capability
//! table the scene drives them through. The provided methods are the plain
//! behavior (propagate transforms, draw each mesh batch with its material)
//! and variants override only what they do differently.

use rand::rngs::StdRng;
use skyraid_engine::prelude::*;
use skyraid_engine::render::{RenderError, ShaderId};

use crate::terrain::Terrain;

/// Which variant an object is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Plain mesh holder
    Base,
    /// Spins about its own axis
    Rotating,
    /// Orbits its parent's origin
    Revolving,
    /// Height-map terrain
    Terrain,
    /// Animated water plane
    Water,
    /// Camera-following sky cube
    Skybox,
    /// Instanced tree quads
    Billboard,
    /// Player shot
    Bullet,
    /// Enemy helicopter
    Villain,
    /// Player aircraft
    Player,
}

/// What an object may touch while animating
pub struct AnimateContext<'a> {
    /// Transform hierarchy
    pub graph: &'a mut SceneGraph,
    /// Ground for height queries
    pub terrain: &'a Terrain,
    /// Scene random source
    pub rng: &'a mut StdRng,
    /// Seconds since the previous frame
    pub dt: f32,
}

/// What an object may touch while recording draws
pub struct RenderContext<'a> {
    /// Transform hierarchy (read-only)
    pub graph: &'a SceneGraph,
    /// Shared assets
    pub resources: &'a ResourceManager,
    /// Output
    pub commands: &'a mut CommandList,
    /// Pipeline currently bound in `commands`
    pub pipeline: Option<ShaderId>,
}

impl<'a> RenderContext<'a> {
    /// Start recording with no pipeline bound
    pub fn new(graph: &'a SceneGraph, resources: &'a ResourceManager, commands: &'a mut CommandList) -> Self {
        Self {
            graph,
            resources,
            commands,
            pipeline: None,
        }
    }

    /// Record a pipeline switch unless `shader` is already bound
    pub fn bind(&mut self, shader: ShaderId) {
        if self.pipeline != Some(shader) {
            self.commands.push(RenderCommand::SetPipeline(shader));
            self.pipeline = Some(shader);
        }
    }

    /// Record every mesh batch below `root`
    pub fn draw_subtree(&mut self, root: NodeId) {
        self.pipeline = self
            .graph
            .record_draws(root, self.resources, self.pipeline, self.commands);
    }
}

/// Capability table shared by all object variants
pub trait GameObject {
    /// Variant tag
    fn kind(&self) -> ObjectKind;

    /// Root node in the scene graph, if the object lives there
    fn root(&self) -> Option<NodeId>;

    /// Pipeline the object's materials are drawn with
    fn shader_kind(&self) -> ShaderKind {
        ShaderKind::Illuminated
    }

    /// One-time setup once the object and the terrain exist
    fn on_initialize(&mut self, _ctx: &mut AnimateContext<'_>) {}

    /// Point the object's materials at its pipeline
    fn build_materials(
        &mut self,
        graph: &SceneGraph,
        resources: &mut ResourceManager,
        shaders: &ShaderRegistry,
    ) -> Result<(), RenderError> {
        let shader = shaders.require(self.shader_kind())?;
        if let Some(root) = self.root() {
            graph.set_shader(root, shader, resources);
        }
        Ok(())
    }

    /// Advance one frame
    fn animate(&mut self, ctx: &mut AnimateContext<'_>) {
        if let Some(root) = self.root() {
            ctx.graph.animate(root, ctx.dt, None);
        }
    }

    /// Record draw commands
    fn render(&self, ctx: &mut RenderContext<'_>) {
        if let Some(root) = self.root() {
            ctx.draw_subtree(root);
        }
    }
}

/// Mesh holder whose animation is a [`Motion`]
///
/// Covers the base, rotating and revolving variants.
#[derive(Debug)]
pub struct Prop {
    root: NodeId,
    kind: ObjectKind,
}

impl Prop {
    /// Create a prop node with a mesh and a single material
    pub fn new(
        graph: &mut SceneGraph,
        resources: &mut ResourceManager,
        name: &str,
        mesh: MeshId,
        material: MaterialId,
        motion: Motion,
    ) -> Result<Self, SceneError> {
        let root = graph.create_node(name);
        graph.set_mesh(root, Some(mesh), resources)?;
        graph.set_material(root, 0, Some(material), resources)?;
        if let Some(slot) = graph.motion_mut(root) {
            *slot = motion;
        }
        let kind = match motion {
            Motion::Static => ObjectKind::Base,
            Motion::Rotating { .. } => ObjectKind::Rotating,
            Motion::Revolving { .. } => ObjectKind::Revolving,
        };
        Ok(Self { root, kind })
    }

    /// Root node
    pub const fn node(&self) -> NodeId {
        self.root
    }
}

impl GameObject for Prop {
    fn kind(&self) -> ObjectKind {
        self.kind
    }

    fn root(&self) -> Option<NodeId> {
        Some(self.root)
    }
}
