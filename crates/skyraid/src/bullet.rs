//! Player shots

use skyraid_engine::prelude::*;

use crate::objects::{AnimateContext, GameObject, ObjectKind};

/// Cube mesh and material shared by every bullet
///
/// The template holds one reference to each so they outlive individual
/// bullets.
#[derive(Debug)]
pub struct BulletTemplate {
    mesh: MeshId,
    material: MaterialId,
    speed: f32,
}

impl BulletTemplate {
    /// Register a `size` cube drawn with `shader`
    pub fn new(
        resources: &mut ResourceManager,
        size: Vec3,
        speed: f32,
        shader: Option<skyraid_engine::render::ShaderId>,
    ) -> Result<Self, ResourceError> {
        let mut cube = Mesh::cube("Bullet", size.x, size.y, size.z);
        cube.colors = vec![Vec4::new(1.0, 0.9, 0.2, 1.0); cube.vertex_count()];
        let mesh = resources.add_mesh(cube);
        resources.add_ref_mesh(mesh)?;

        let mut material = Material::colored("Bullet", Vec4::new(1.0, 0.9, 0.2, 1.0));
        if let Some(shader) = shader {
            material.set_shader(shader);
        }
        let material = resources.add_material(material)?;
        resources.add_ref_material(material)?;

        Ok(Self { mesh, material, speed })
    }

    /// Give back the template's references
    pub fn release(self, resources: &mut ResourceManager) -> Result<(), ResourceError> {
        resources.release_mesh(self.mesh)?;
        resources.release_material(self.material)?;
        Ok(())
    }

    /// Shared mesh
    pub const fn mesh(&self) -> MeshId {
        self.mesh
    }
}

/// A shot in flight
#[derive(Debug)]
pub struct Bullet {
    root: NodeId,
    speed: f32,
}

impl Bullet {
    /// Launch from `transform` (a snapshot; the bullet never follows its shooter)
    pub fn spawn(
        graph: &mut SceneGraph,
        resources: &mut ResourceManager,
        template: &BulletTemplate,
        transform: Mat4,
    ) -> Result<Self, SceneError> {
        let root = graph.create_node("Bullet");
        graph.set_mesh(root, Some(template.mesh), resources)?;
        graph.set_material(root, 0, Some(template.material), resources)?;
        graph.set_local(root, transform);
        Ok(Self {
            root,
            speed: template.speed,
        })
    }

    /// Node of this bullet
    pub const fn node(&self) -> NodeId {
        self.root
    }

    /// Fly forward for `dt` seconds
    pub fn advance(&self, graph: &mut SceneGraph, dt: f32) {
        graph.move_forward(self.root, self.speed * dt);
    }

    /// World position
    pub fn position(&self, graph: &SceneGraph) -> Vec3 {
        graph.position(self.root)
    }

    /// Collision proxy in world space
    pub fn collision_box(&self, graph: &SceneGraph, resources: &ResourceManager) -> Option<OrientedBox> {
        graph.world_box(self.root, resources)
    }

    /// Remove the bullet's node and drop its references
    pub fn destroy(self, graph: &mut SceneGraph, resources: &mut ResourceManager) -> Result<(), SceneError> {
        graph.destroy(self.root, resources).map(drop)
    }
}

impl GameObject for Bullet {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Bullet
    }

    fn root(&self) -> Option<NodeId> {
        Some(self.root)
    }

    fn shader_kind(&self) -> ShaderKind {
        ShaderKind::Diffused
    }

    fn animate(&mut self, ctx: &mut AnimateContext<'_>) {
        self.advance(ctx.graph, ctx.dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bullet_snapshots_transform_and_flies_forward() {
        let mut graph = SceneGraph::new();
        let mut resources = ResourceManager::new();
        let template = BulletTemplate::new(&mut resources, Vec3::new(0.4, 0.4, 1.0), 100.0, None).unwrap();

        let shooter = graph.create_node("shooter");
        graph.set_position(shooter, Vec3::new(10.0, 50.0, 10.0));
        let transform = graph.local(shooter);
        let bullet = Bullet::spawn(&mut graph, &mut resources, &template, transform).unwrap();

        graph.set_position(shooter, Vec3::zeros());
        bullet.advance(&mut graph, 0.1);
        assert_relative_eq!(bullet.position(&graph), Vec3::new(10.0, 50.0, 20.0), epsilon = 1e-4);

        let bounds = bullet.collision_box(&graph, &resources).unwrap();
        assert_relative_eq!(bounds.extents, Vec3::new(0.2, 0.2, 0.5), epsilon = 1e-5);
    }

    #[test]
    fn test_template_outlives_bullets() {
        let mut graph = SceneGraph::new();
        let mut resources = ResourceManager::new();
        let template = BulletTemplate::new(&mut resources, Vec3::repeat(1.0), 100.0, None).unwrap();
        let mesh = template.mesh();

        let shots: Vec<Bullet> = (0..3)
            .map(|_| Bullet::spawn(&mut graph, &mut resources, &template, Mat4::identity()).unwrap())
            .collect();
        assert_eq!(resources.meshes().ref_count(mesh), Some(4));

        for shot in shots {
            shot.destroy(&mut graph, &mut resources).unwrap();
        }
        assert_eq!(resources.meshes().ref_count(mesh), Some(1));
        assert!(graph.is_empty());

        template.release(&mut resources).unwrap();
        assert_eq!(resources.live_counts(), (0, 0, 0));
    }
}
