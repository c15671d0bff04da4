//! Arena scene graph
//!
//! Nodes live in a slotmap and refer to each other by [`NodeId`]; a stale id
//! never resolves to a newer node. Each node owns:
//!
//! - a local transform and a cached world transform,
//! - its parent link and an ordered child list,
//! - optional mesh and per-batch material references, counted in the
//!   [`ResourceManager`],
//! - a [`Motion`] policy applied by [`SceneGraph::animate`].
//!
//! # World matrices are never stale
//!
//! `world = parent.world * local` (or `local` for roots). Every method that
//! changes a local transform or a parent link re-propagates the affected
//! subtree before returning, so [`SceneGraph::world`] can always be read.
//! [`SceneGraph::update_transform`] is still available for callers that want
//! to place a root under an external parent matrix.

use slotmap::{new_key_type, SlotMap};
use thiserror::Error;

use super::Motion;
use crate::assets::{MaterialId, MeshId, ResourceError, ResourceManager};
use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};
use crate::physics::OrientedBox;
use crate::render::{CommandList, ObjectConstants, RenderCommand, ShaderId};

new_key_type! {
    /// Handle to a node in a [`SceneGraph`]
    pub struct NodeId;
}

/// Scene graph errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// The node was destroyed or never existed
    #[error("Stale node handle {0:?}")]
    StaleNode(NodeId),

    /// Attaching would make a node its own ancestor
    #[error("Attaching {child:?} under {parent:?} would create a cycle")]
    Cycle {
        /// Requested parent
        parent: NodeId,
        /// Requested child
        child: NodeId,
    },

    /// Reference counting failed
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

/// One frame of the hierarchy
#[derive(Debug, Clone)]
pub struct Node {
    /// Frame name, used by [`SceneGraph::find_frame`]
    pub name: String,
    /// Animation policy
    pub motion: Motion,
    local: Mat4,
    world: Mat4,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    mesh: Option<MeshId>,
    materials: Vec<Option<MaterialId>>,
}

impl Node {
    fn new(name: String) -> Self {
        Self {
            name,
            motion: Motion::Static,
            local: Mat4::identity(),
            world: Mat4::identity(),
            parent: None,
            children: Vec::new(),
            mesh: None,
            materials: Vec::new(),
        }
    }

    /// Local transform
    pub const fn local(&self) -> &Mat4 {
        &self.local
    }

    /// World transform
    pub const fn world(&self) -> &Mat4 {
        &self.world
    }

    /// Parent link
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in attach order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Mesh reference
    pub const fn mesh(&self) -> Option<MeshId> {
        self.mesh
    }

    /// Material per mesh batch
    pub fn materials(&self) -> &[Option<MaterialId>] {
        &self.materials
    }
}

/// Arena of transform nodes
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, Node>,
}

impl SceneGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a detached node with an identity transform
    pub fn create_node(&mut self, name: impl Into<String>) -> NodeId {
        self.nodes.insert(Node::new(name.into()))
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the graph holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the id resolves
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Borrow a node
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Mutably borrow a node's motion policy
    pub fn motion_mut(&mut self, id: NodeId) -> Option<&mut Motion> {
        self.nodes.get_mut(id).map(|node| &mut node.motion)
    }

    fn get(&self, id: NodeId) -> Result<&Node, SceneError> {
        self.nodes.get(id).ok_or(SceneError::StaleNode(id))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Node, SceneError> {
        self.nodes.get_mut(id).ok_or(SceneError::StaleNode(id))
    }

    // ---- hierarchy -------------------------------------------------------

    /// Make `child` the last child of `parent`, detaching it from any previous parent
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.get(child)?;
        self.get(parent)?;

        let mut ancestor = Some(parent);
        while let Some(id) = ancestor {
            if id == child {
                return Err(SceneError::Cycle { parent, child });
            }
            ancestor = self.nodes.get(id).and_then(|n| n.parent);
        }

        self.unlink(child);
        self.get_mut(parent)?.children.push(child);
        self.get_mut(child)?.parent = Some(parent);
        self.propagate(child);
        Ok(())
    }

    /// Make `child` a root again; its world becomes its local transform
    pub fn detach(&mut self, child: NodeId) -> Result<(), SceneError> {
        self.get(child)?;
        self.unlink(child);
        self.propagate(child);
        Ok(())
    }

    fn unlink(&mut self, child: NodeId) {
        let old_parent = self.nodes.get_mut(child).and_then(|n| n.parent.take());
        if let Some(parent) = old_parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children.retain(|&c| c != child);
        }
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Children of a node (empty for stale ids)
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map_or(&[] as &[NodeId], |n| n.children.as_slice())
    }

    /// The subtree rooted at `root` in depth-first pre-order
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(id) {
                order.push(id);
                stack.extend(node.children.iter().rev());
            }
        }
        order
    }

    /// First node in the subtree (pre-order) whose name matches
    pub fn find_frame(&self, root: NodeId, name: &str) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|&id| self.nodes.get(id).is_some_and(|n| n.name == name))
    }

    // ---- transforms ------------------------------------------------------

    /// Recompute world matrices for `root` and everything below it
    ///
    /// `root`'s world becomes `parent_world * local` (or `local` when
    /// `parent_world` is `None`), and each child is updated from its freshly
    /// computed parent, depth first.
    pub fn update_transform(&mut self, root: NodeId, parent_world: Option<&Mat4>) {
        self.traverse(root, parent_world.copied(), None);
    }

    /// Same traversal as [`update_transform`](Self::update_transform), applying
    /// each node's [`Motion`] for `dt` seconds before composing it
    pub fn animate(&mut self, root: NodeId, dt: f32, parent_world: Option<&Mat4>) {
        self.traverse(root, parent_world.copied(), Some(dt));
    }

    fn traverse(&mut self, root: NodeId, parent_world: Option<Mat4>, dt: Option<f32>) {
        let mut stack = vec![(root, parent_world)];
        while let Some((id, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            if let Some(dt) = dt {
                node.local = node.motion.apply(&node.local, dt);
            }
            node.world = match parent_world {
                Some(parent) => parent * node.local,
                None => node.local,
            };
            let world = node.world;
            stack.extend(node.children.iter().rev().map(|&c| (c, Some(world))));
        }
    }

    /// Re-derive `id`'s subtree from its current parent
    fn propagate(&mut self, id: NodeId) {
        let parent_world = self
            .parent(id)
            .and_then(|p| self.nodes.get(p))
            .map(|p| p.world);
        self.traverse(id, parent_world, None);
    }

    /// Local transform (identity for stale ids)
    pub fn local(&self, id: NodeId) -> Mat4 {
        self.nodes.get(id).map_or_else(Mat4::identity, |n| n.local)
    }

    /// World transform (identity for stale ids)
    pub fn world(&self, id: NodeId) -> Mat4 {
        self.nodes.get(id).map_or_else(Mat4::identity, |n| n.world)
    }

    /// World-space position
    pub fn position(&self, id: NodeId) -> Vec3 {
        self.world(id).position()
    }

    /// World-space forward axis
    pub fn look(&self, id: NodeId) -> Vec3 {
        self.world(id).look()
    }

    /// World-space up axis
    pub fn up(&self, id: NodeId) -> Vec3 {
        self.world(id).up()
    }

    /// World-space right axis
    pub fn right(&self, id: NodeId) -> Vec3 {
        self.world(id).right()
    }

    /// Replace the local transform
    pub fn set_local(&mut self, id: NodeId, local: Mat4) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.local = local;
            self.propagate(id);
        }
    }

    fn modify_local(&mut self, id: NodeId, f: impl FnOnce(&mut Mat4)) {
        if let Some(node) = self.nodes.get_mut(id) {
            f(&mut node.local);
            self.propagate(id);
        }
    }

    /// Set the local translation
    pub fn set_position(&mut self, id: NodeId, position: Vec3) {
        self.modify_local(id, |local| local.set_position(position));
    }

    /// Translate in the parent's frame
    pub fn translate(&mut self, id: NodeId, delta: Vec3) {
        self.modify_local(id, |local| {
            let position = local.position() + delta;
            local.set_position(position);
        });
    }

    /// Move along the local forward axis
    pub fn move_forward(&mut self, id: NodeId, distance: f32) {
        self.modify_local(id, |local| {
            let position = local.position() + local.look() * distance;
            local.set_position(position);
        });
    }

    /// Rotate about an axis of the node's own frame
    pub fn rotate_local(&mut self, id: NodeId, axis: &Vec3, degrees: f32) {
        self.modify_local(id, |local| *local *= Mat4::rotation_axis(axis, degrees));
    }

    /// Rotate by pitch/yaw/roll (degrees) in the node's own frame
    pub fn rotate_pitch_yaw_roll(&mut self, id: NodeId, pitch: f32, yaw: f32, roll: f32) {
        self.modify_local(id, |local| {
            *local *= Mat4::rotation_pitch_yaw_roll(pitch, yaw, roll);
        });
    }

    /// Turn the node so its forward axis points at `target` (parent space), keeping position
    pub fn look_towards(&mut self, id: NodeId, target: Vec3, up: Vec3) {
        self.modify_local(id, |local| {
            let position = local.position();
            let look = utils::normalize_or(target - position, local.look());
            let right = utils::normalize_or(up.cross(&look), local.right());
            let up = look.cross(&right);
            let mut basis = Mat4::identity();
            basis.fixed_view_mut::<3, 1>(0, 0).copy_from(&right);
            basis.fixed_view_mut::<3, 1>(0, 1).copy_from(&up);
            basis.fixed_view_mut::<3, 1>(0, 2).copy_from(&look);
            basis.set_position(position);
            *local = basis;
        });
    }

    // ---- shared assets ---------------------------------------------------

    /// Assign a mesh; the incoming mesh gains a reference, the previous one loses one
    pub fn set_mesh(
        &mut self,
        id: NodeId,
        mesh: Option<MeshId>,
        resources: &mut ResourceManager,
    ) -> Result<(), SceneError> {
        self.get(id)?;
        if let Some(mesh) = mesh {
            resources.add_ref_mesh(mesh)?;
        }
        let previous = std::mem::replace(&mut self.get_mut(id)?.mesh, mesh);
        if let Some(previous) = previous {
            resources.release_mesh(previous)?;
        }
        Ok(())
    }

    /// Assign the material for mesh batch `index`
    pub fn set_material(
        &mut self,
        id: NodeId,
        index: usize,
        material: Option<MaterialId>,
        resources: &mut ResourceManager,
    ) -> Result<(), SceneError> {
        self.get(id)?;
        if let Some(material) = material {
            resources.add_ref_material(material)?;
        }
        let node = self.get_mut(id)?;
        if node.materials.len() <= index {
            node.materials.resize(index + 1, None);
        }
        let previous = std::mem::replace(&mut node.materials[index], material);
        if let Some(previous) = previous {
            resources.release_material(previous)?;
        }
        Ok(())
    }

    /// Point every material in the subtree at `shader`
    pub fn set_shader(&self, root: NodeId, shader: ShaderId, resources: &mut ResourceManager) {
        for id in self.descendants(root) {
            for material in self.nodes[id].materials.iter().flatten() {
                if let Some(material) = resources.material_mut(*material) {
                    material.set_shader(shader);
                }
            }
        }
    }

    /// Detach and remove a subtree, releasing every mesh and material it holds
    ///
    /// Returns the number of nodes removed.
    pub fn destroy(&mut self, root: NodeId, resources: &mut ResourceManager) -> Result<usize, SceneError> {
        self.get(root)?;
        self.unlink(root);

        let subtree = self.descendants(root);
        let mut first_error = None;
        for &id in &subtree {
            let Some(node) = self.nodes.remove(id) else {
                continue;
            };
            let released = node
                .mesh
                .map(|mesh| resources.release_mesh(mesh).map(drop))
                .into_iter()
                .chain(
                    node.materials
                        .iter()
                        .flatten()
                        .map(|&material| resources.release_material(material).map(drop)),
                );
            for result in released {
                if let Err(e) = result {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(subtree.len()),
        }
    }

    // ---- queries ---------------------------------------------------------

    /// The node's mesh bounds in world space
    pub fn world_box(&self, id: NodeId, resources: &ResourceManager) -> Option<OrientedBox> {
        let node = self.nodes.get(id)?;
        let bounds = resources.mesh(node.mesh?)?.bounds?;
        Some(OrientedBox::from_local(bounds.center, bounds.extents, &node.world))
    }

    /// World box of the first node in the subtree (pre-order) that has one
    pub fn subtree_box(&self, root: NodeId, resources: &ResourceManager) -> Option<OrientedBox> {
        self.descendants(root)
            .into_iter()
            .find_map(|id| self.world_box(id, resources))
    }

    /// Record draws for every mesh-bearing node in the subtree
    ///
    /// Each mesh batch is drawn with the node's material for that batch. A
    /// `SetPipeline` is recorded whenever a material names a shader different
    /// from the one currently bound; `pipeline` is the shader bound on entry.
    pub fn record_draws(
        &self,
        root: NodeId,
        resources: &ResourceManager,
        mut pipeline: Option<ShaderId>,
        commands: &mut CommandList,
    ) -> Option<ShaderId> {
        for id in self.descendants(root) {
            let node = &self.nodes[id];
            let Some(mesh_id) = node.mesh else {
                continue;
            };
            let Some(mesh) = resources.mesh(mesh_id) else {
                continue;
            };

            for batch in 0..mesh.batch_count() {
                let material_id = node.materials.get(batch).copied().flatten();
                let material = material_id.and_then(|m| resources.material(m));

                if let Some(shader) = material.and_then(|m| m.shader()) {
                    if pipeline != Some(shader) {
                        commands.push(RenderCommand::SetPipeline(shader));
                        pipeline = Some(shader);
                    }
                }

                commands.push(RenderCommand::DrawMesh {
                    mesh: mesh_id,
                    batch,
                    material: material_id,
                    texture: material.and_then(|m| m.texture()),
                    constants: ObjectConstants::new(&node.world, material),
                });
            }
        }
        pipeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{Material, Mesh};
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-4;

    /// root -> (a -> (a1, a2), b)
    fn sample_tree(graph: &mut SceneGraph) -> [NodeId; 5] {
        let root = graph.create_node("root");
        let a = graph.create_node("a");
        let a1 = graph.create_node("a1");
        let a2 = graph.create_node("a2");
        let b = graph.create_node("b");
        graph.attach(root, a).unwrap();
        graph.attach(a, a1).unwrap();
        graph.attach(a, a2).unwrap();
        graph.attach(root, b).unwrap();
        [root, a, a1, a2, b]
    }

    fn assert_world_invariant(graph: &SceneGraph, root: NodeId) {
        for id in graph.descendants(root) {
            let node = graph.node(id).unwrap();
            let expected = match node.parent() {
                Some(parent) => graph.world(parent) * node.local(),
                None => *node.local(),
            };
            assert_relative_eq!(*node.world(), expected, epsilon = EPSILON);
        }
    }

    #[test]
    fn test_world_invariant_after_each_mutation() {
        let mut graph = SceneGraph::new();
        let [root, a, a1, a2, b] = sample_tree(&mut graph);

        graph.set_position(a1, Vec3::new(0.0, 0.0, 2.0));
        assert_world_invariant(&graph, root);
        graph.rotate_local(a, &Vec3::y(), 90.0);
        assert_world_invariant(&graph, root);
        graph.set_position(root, Vec3::new(10.0, 0.0, 0.0));
        assert_world_invariant(&graph, root);
        graph.set_local(a2, Mat4::new_nonuniform_scaling(&Vec3::new(2.0, 2.0, 2.0)));
        assert_world_invariant(&graph, root);
        graph.move_forward(b, 3.0);
        assert_world_invariant(&graph, root);

        // a1 sits 2 along a's rotated forward axis (+x), offset by root.
        assert_relative_eq!(graph.position(a1), Vec3::new(12.0, 0.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_update_transform_with_external_parent() {
        let mut graph = SceneGraph::new();
        let [root, _, a1, _, _] = sample_tree(&mut graph);
        graph.set_position(a1, Vec3::new(1.0, 0.0, 0.0));

        let external = Mat4::new_translation(&Vec3::new(0.0, 100.0, 0.0));
        graph.update_transform(root, Some(&external));
        assert_relative_eq!(graph.position(a1), Vec3::new(1.0, 100.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(graph.position(root), Vec3::new(0.0, 100.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_animate_spins_and_orbits_through_organizational_frames() {
        let mut graph = SceneGraph::new();
        let [root, a, a1, _, _] = sample_tree(&mut graph);

        // `a` is a pure frame (no mesh); its child still follows it.
        graph.set_position(a1, Vec3::new(0.0, 0.0, 5.0));
        *graph.motion_mut(a).unwrap() = Motion::Rotating { axis: Vec3::y(), degrees_per_second: 90.0 };

        graph.animate(root, 1.0, None);
        assert_relative_eq!(graph.position(a1), Vec3::new(5.0, 0.0, 0.0), epsilon = EPSILON);
        assert_world_invariant(&graph, root);

        *graph.motion_mut(a).unwrap() = Motion::Static;
        *graph.motion_mut(a1).unwrap() = Motion::Revolving { axis: Vec3::y(), degrees_per_second: 90.0 };
        graph.animate(root, 1.0, None);
        // a1 orbits a's origin inside a's (already rotated) frame.
        assert_relative_eq!(graph.position(a1), Vec3::new(0.0, 0.0, -5.0), epsilon = EPSILON);
    }

    #[test]
    fn test_attach_moves_and_rejects_cycles() {
        let mut graph = SceneGraph::new();
        let [root, a, a1, _, b] = sample_tree(&mut graph);

        assert_eq!(graph.attach(a1, root), Err(SceneError::Cycle { parent: a1, child: root }));
        assert_eq!(graph.attach(a, a), Err(SceneError::Cycle { parent: a, child: a }));

        graph.attach(b, a1).unwrap();
        assert_eq!(graph.parent(a1), Some(b));
        assert!(!graph.children(a).contains(&a1));
        assert_eq!(graph.children(b), &[a1]);

        graph.detach(a1).unwrap();
        assert_eq!(graph.parent(a1), None);
        assert!(graph.children(b).is_empty());
    }

    #[test]
    fn test_find_frame_is_depth_first() {
        let mut graph = SceneGraph::new();
        let [root, _, _, a2, _] = sample_tree(&mut graph);
        assert_eq!(graph.find_frame(root, "a2"), Some(a2));
        assert_eq!(graph.find_frame(root, "missing"), None);
        let names: Vec<_> = graph
            .descendants(root)
            .into_iter()
            .map(|id| graph.node(id).unwrap().name.clone())
            .collect();
        assert_eq!(names, ["root", "a", "a1", "a2", "b"]);
    }

    #[test]
    fn test_shared_mesh_lifetime_across_holders() {
        let mut graph = SceneGraph::new();
        let mut resources = ResourceManager::new();
        let mesh = resources.add_mesh(Mesh::cube("cube", 1.0, 1.0, 1.0));
        let material = resources.add_material(Material::new("m")).unwrap();

        let holders: Vec<_> = (0..3).map(|i| graph.create_node(format!("n{i}"))).collect();
        for &id in &holders {
            graph.set_mesh(id, Some(mesh), &mut resources).unwrap();
            graph.set_material(id, 0, Some(material), &mut resources).unwrap();
        }
        assert_eq!(resources.meshes().ref_count(mesh), Some(3));

        for (i, &id) in holders.iter().enumerate() {
            assert!(resources.mesh(mesh).is_some(), "destroyed after {i} releases");
            graph.destroy(id, &mut resources).unwrap();
        }
        assert!(resources.mesh(mesh).is_none());
        assert!(resources.material(material).is_none());
        assert_eq!(resources.meshes().destroyed_count(), 1);
    }

    #[test]
    fn test_destroy_removes_subtree_and_unlinks() {
        let mut graph = SceneGraph::new();
        let mut resources = ResourceManager::new();
        let [root, a, a1, a2, b] = sample_tree(&mut graph);

        assert_eq!(graph.destroy(a, &mut resources).unwrap(), 3);
        assert!(!graph.contains(a1) && !graph.contains(a2));
        assert_eq!(graph.children(root), &[b]);
        assert_eq!(graph.destroy(a, &mut resources), Err(SceneError::StaleNode(a)));
    }

    #[test]
    fn test_world_box_follows_node() {
        let mut graph = SceneGraph::new();
        let mut resources = ResourceManager::new();
        let mesh = resources.add_mesh(Mesh::cube("cube", 2.0, 2.0, 2.0));
        let root = graph.create_node("root");
        let body = graph.create_node("body");
        graph.attach(root, body).unwrap();
        graph.set_mesh(body, Some(mesh), &mut resources).unwrap();
        graph.set_position(root, Vec3::new(5.0, 6.0, 7.0));

        let obb = graph.subtree_box(root, &resources).unwrap();
        assert_relative_eq!(obb.center, Vec3::new(5.0, 6.0, 7.0), epsilon = EPSILON);
        assert_relative_eq!(obb.extents, Vec3::new(1.0, 1.0, 1.0), epsilon = EPSILON);
        assert!(graph.world_box(root, &resources).is_none());
    }

    #[test]
    fn test_look_towards_faces_target() {
        let mut graph = SceneGraph::new();
        let id = graph.create_node("v");
        graph.set_position(id, Vec3::new(1.0, 0.0, 1.0));
        graph.look_towards(id, Vec3::new(1.0, 0.0, 11.0), Vec3::y());
        assert_relative_eq!(graph.look(id), Vec3::z(), epsilon = EPSILON);
        graph.look_towards(id, Vec3::new(-9.0, 0.0, 1.0), Vec3::y());
        assert_relative_eq!(graph.look(id), -Vec3::x(), epsilon = EPSILON);
        assert_relative_eq!(graph.position(id), Vec3::new(1.0, 0.0, 1.0), epsilon = EPSILON);
    }

    #[test]
    fn test_record_draws_binds_materials_per_batch() {
        let mut graph = SceneGraph::new();
        let mut resources = ResourceManager::new();
        let mut mesh = Mesh::cube("two-part", 1.0, 1.0, 1.0);
        mesh.sub_meshes = vec![vec![0, 1, 2], vec![0, 2, 3]];
        let mesh = resources.add_mesh(mesh);
        let red = resources
            .add_material(Material::new("red").with_shader(ShaderId(4)))
            .unwrap();

        let id = graph.create_node("n");
        graph.set_mesh(id, Some(mesh), &mut resources).unwrap();
        graph.set_material(id, 1, Some(red), &mut resources).unwrap();

        let mut commands = CommandList::new();
        let bound = graph.record_draws(id, &resources, None, &mut commands);
        assert_eq!(bound, Some(ShaderId(4)));
        assert_eq!(commands.draw_count(), 2);
        assert!(matches!(
            commands.as_slice()[0],
            RenderCommand::DrawMesh { batch: 0, material: None, .. }
        ));
        assert!(matches!(commands.as_slice()[1], RenderCommand::SetPipeline(ShaderId(4))));
        assert!(matches!(
            commands.as_slice()[2],
            RenderCommand::DrawMesh { batch: 1, material: Some(m), .. } if m == red
        ));
    }
}
