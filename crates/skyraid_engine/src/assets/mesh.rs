//! Mesh geometry
//!
//! Meshes are CPU-side vertex streams plus index lists. A mesh either has a
//! single index list or one list per sub-mesh; sub-mesh `i` is drawn with the
//! holder's material `i`.

use crate::foundation::math::{Vec2, Vec3, Vec4};

/// Model-space axis-aligned bounds stored as center + half extents
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Box center
    pub center: Vec3,
    /// Half size along each axis
    pub extents: Vec3,
}

impl Bounds {
    /// Build bounds from a center and half extents
    pub const fn new(center: Vec3, extents: Vec3) -> Self {
        Self { center, extents }
    }

    /// Tightest bounds around `points`; empty input gives a zero box
    pub fn from_points(points: &[Vec3]) -> Self {
        let Some(first) = points.first() else {
            return Self::new(Vec3::zeros(), Vec3::zeros());
        };
        let (min, max) = points.iter().fold((*first, *first), |(min, max), p| {
            (min.inf(p), max.sup(p))
        });
        Self::new((min + max) * 0.5, (max - min) * 0.5)
    }
}

/// Triangle-list geometry
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Mesh name (from the model file or the builder)
    pub name: String,
    /// Vertex positions
    pub positions: Vec<Vec3>,
    /// Vertex normals (empty for unlit meshes)
    pub normals: Vec<Vec3>,
    /// Vertex colors (empty when the material supplies color)
    pub colors: Vec<Vec4>,
    /// Texture coordinates (empty for untextured meshes)
    pub tex_coords: Vec<Vec2>,
    /// Indices for meshes drawn as a single batch
    pub indices: Vec<u32>,
    /// Per-material index lists
    pub sub_meshes: Vec<Vec<u32>>,
    /// Model-space bounds
    pub bounds: Option<Bounds>,
}

impl Mesh {
    /// Empty mesh with a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of draw batches (sub-meshes, or 1 for a plain index list)
    pub fn batch_count(&self) -> usize {
        self.sub_meshes.len().max(1)
    }

    /// Recompute `bounds` from the positions
    #[must_use]
    pub fn with_computed_bounds(mut self) -> Self {
        self.bounds = Some(Bounds::from_points(&self.positions));
        self
    }

    /// Lit, axis-aligned box centered on the origin
    pub fn cube(name: impl Into<String>, width: f32, height: f32, depth: f32) -> Self {
        let half = Vec3::new(width, height, depth) * 0.5;
        // (normal, tangent u, tangent v) per face
        let faces = [
            (Vec3::z(), Vec3::x(), Vec3::y()),
            (-Vec3::z(), -Vec3::x(), Vec3::y()),
            (Vec3::x(), -Vec3::z(), Vec3::y()),
            (-Vec3::x(), Vec3::z(), Vec3::y()),
            (Vec3::y(), Vec3::x(), -Vec3::z()),
            (-Vec3::y(), Vec3::x(), Vec3::z()),
        ];

        let mut mesh = Self::new(name);
        for (normal, u, v) in faces {
            let base = mesh.positions.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (-1.0, 1.0), (1.0, 1.0), (1.0, -1.0)] {
                let corner = normal + u * su + v * sv;
                mesh.positions.push(corner.component_mul(&half));
                mesh.normals.push(normal);
                mesh.tex_coords.push(Vec2::new((su + 1.0) * 0.5, (1.0 - sv) * 0.5));
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        mesh.bounds = Some(Bounds::new(Vec3::zeros(), half));
        mesh
    }

    /// Box seen from the inside (reversed winding, inward normals)
    pub fn inside_out_cube(name: impl Into<String>, size: f32) -> Self {
        let mut mesh = Self::cube(name, size, size, size);
        for normal in &mut mesh.normals {
            *normal = -*normal;
        }
        for triangle in mesh.indices.chunks_exact_mut(3) {
            triangle.swap(1, 2);
        }
        mesh
    }

    /// Camera-facing quad in the XY plane, anchored at its bottom edge
    pub fn quad(name: impl Into<String>, width: f32, height: f32) -> Self {
        let hw = width * 0.5;
        let mut mesh = Self::new(name);
        mesh.positions = vec![
            Vec3::new(-hw, 0.0, 0.0),
            Vec3::new(-hw, height, 0.0),
            Vec3::new(hw, height, 0.0),
            Vec3::new(hw, 0.0, 0.0),
        ];
        mesh.normals = vec![-Vec3::z(); 4];
        mesh.tex_coords = vec![
            Vec2::new(0.0, 1.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
        ];
        mesh.indices = vec![0, 1, 2, 0, 2, 3];
        mesh.with_computed_bounds()
    }

    /// Flat grid of `width x length` vertices in the XZ plane, spacing taken from `scale`
    pub fn grid(name: impl Into<String>, width: usize, length: usize, scale: Vec3) -> Self {
        Self::height_grid(name, width, length, scale, |_, _| 0.0)
    }

    /// Grid whose vertex heights come from `height(x, z)` in vertex units
    ///
    /// Heights are multiplied by `scale.y`; normals point up and are left
    /// for the caller to refine.
    pub fn height_grid(
        name: impl Into<String>,
        width: usize,
        length: usize,
        scale: Vec3,
        height: impl Fn(usize, usize) -> f32,
    ) -> Self {
        let mut mesh = Self::new(name);
        if width < 2 || length < 2 {
            return mesh;
        }

        for z in 0..length {
            for x in 0..width {
                mesh.positions.push(Vec3::new(
                    x as f32 * scale.x,
                    height(x, z) * scale.y,
                    z as f32 * scale.z,
                ));
                mesh.normals.push(Vec3::y());
                mesh.tex_coords.push(Vec2::new(
                    x as f32 / (width - 1) as f32,
                    z as f32 / (length - 1) as f32,
                ));
            }
        }

        let w = width as u32;
        for z in 0..(length as u32 - 1) {
            for x in 0..(w - 1) {
                let i = z * w + x;
                mesh.indices
                    .extend_from_slice(&[i, i + w, i + w + 1, i, i + w + 1, i + 1]);
            }
        }
        mesh.with_computed_bounds()
    }
}
