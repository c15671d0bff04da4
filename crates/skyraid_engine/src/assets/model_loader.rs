//! Binary hierarchical model loader
//!
//! Models are a token stream. Every token and name is a one-byte length
//! followed by that many bytes; numbers are little-endian `i32`/`u32`/`f32`.
//!
//! ```text
//! <Hierarchy>:
//!   <Frame>: i32 index, name
//!     <Transform>: position[3] euler[3] scale[3] quaternion[4]
//!     <TransformMatrix>: f32[16]           (row-vector layout, rows = right, up, look, position)
//!     <Mesh>: i32 vertex_count, name
//!       <Bounds>: center[3] extents[3]
//!       <Positions>: i32 n, f32[3n]
//!       <Colors>: i32 n, f32[4n]
//!       <Normals>: i32 n, f32[3n]
//!       <Indices>: i32 n, u32[n]
//!       <SubMeshes>: i32 n, n x (<SubMesh>: i32 index, i32 k, u32[k])
//!     </Mesh>
//!     <Materials>: i32 n
//!       <Material>: i32 index
//!       <AlbedoColor>: f32[4]  <EmissiveColor>: f32[4]  <SpecularColor>: f32[4]
//!       <Glossiness>: f32  <Smoothness>: f32  <Metallic>: f32
//!       <SpecularHighlight>: f32  <GlossyReflection>: f32
//!     </Materials>
//!     <Children>: i32 n, n x <Frame>...
//!   </Frame>
//! </Hierarchy>
//! ```
//!
//! Malformed input never reads past the buffer: every read is bounds
//! checked and reported as a [`ModelError`].

use std::path::Path;

use thiserror::Error;

use super::{Bounds, Material, Mesh};
use crate::foundation::math::{Mat4, Quat, Quaternion, Vec3, Vec4};

/// Deepest frame nesting accepted
pub const MAX_FRAME_DEPTH: usize = 64;

/// Model loading errors
#[derive(Debug, Error)]
pub enum ModelError {
    /// File could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Data ended in the middle of a value
    #[error("Unexpected end of model data at byte {offset} (needed {wanted} bytes)")]
    UnexpectedEof {
        /// Read position
        offset: usize,
        /// Bytes requested
        wanted: usize,
    },

    /// Token not valid at this point of the stream
    #[error("Unknown token '{token}' at byte {offset} while reading {context}")]
    UnknownToken {
        /// The token text
        token: String,
        /// Offset of the token
        offset: usize,
        /// Block being parsed
        context: &'static str,
    },

    /// Negative or impossible element count
    #[error("Invalid {what} count {count} at byte {offset}")]
    InvalidCount {
        /// What was being counted
        what: &'static str,
        /// The count read
        count: i64,
        /// Offset of the count
        offset: usize,
    },

    /// Index buffer references a vertex that does not exist
    #[error("Index {index} out of range for {vertices} vertices in mesh '{mesh}'")]
    IndexOutOfRange {
        /// Offending index
        index: u32,
        /// Vertex count
        vertices: usize,
        /// Mesh name
        mesh: String,
    },

    /// Name bytes are not UTF-8
    #[error("Name at byte {offset} is not valid UTF-8")]
    InvalidString {
        /// Offset of the name
        offset: usize,
    },

    /// Children nested too deeply
    #[error("Frame hierarchy nested deeper than {0}")]
    TooDeep(usize),

    /// No `<Hierarchy>` block
    #[error("Model contains no frame hierarchy")]
    MissingHierarchy,
}

/// A loaded model: one root frame
#[derive(Debug, Clone)]
pub struct ModelData {
    /// Root of the frame tree
    pub root: FrameData,
}

/// One frame of a hierarchical model
#[derive(Debug, Clone)]
pub struct FrameData {
    /// Frame index as stored in the file
    pub index: i32,
    /// Frame name, used to look up sub-parts such as rotors
    pub name: String,
    /// Local transform (column-vector convention)
    pub transform: Mat4,
    /// Geometry, absent for pure organizational frames
    pub mesh: Option<Mesh>,
    /// One material per sub-mesh
    pub materials: Vec<Material>,
    /// Child frames
    pub children: Vec<FrameData>,
}

impl FrameData {
    /// Empty frame with an identity transform
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            index: 0,
            name: name.into(),
            transform: Mat4::identity(),
            mesh: None,
            materials: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Depth-first search by name
    pub fn find(&self, name: &str) -> Option<&Self> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    /// Number of frames in this subtree
    pub fn frame_count(&self) -> usize {
        1 + self.children.iter().map(Self::frame_count).sum::<usize>()
    }
}

impl ModelData {
    /// Read and parse a model file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let model = Self::parse(&bytes)?;
        log::info!(
            "Loaded model {} ({} frames)",
            path.display(),
            model.root.frame_count()
        );
        Ok(model)
    }

    /// Parse an in-memory model
    pub fn parse(bytes: &[u8]) -> Result<Self, ModelError> {
        let mut reader = Reader::new(bytes);
        let mut root = None;

        while !reader.is_at_end() {
            let offset = reader.offset;
            match reader.token()?.as_str() {
                "<Hierarchy>" | "<Hierarchy>:" => {
                    root = Some(reader.frame(0)?);
                }
                "</Hierarchy>" => break,
                other => {
                    return Err(ModelError::UnknownToken {
                        token: other.to_owned(),
                        offset,
                        context: "model",
                    })
                }
            }
        }

        root.map(|root| Self { root }).ok_or(ModelError::MissingHierarchy)
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    const fn is_at_end(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    const fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset)
    }

    fn take(&mut self, wanted: usize) -> Result<&'a [u8], ModelError> {
        let end = self
            .offset
            .checked_add(wanted)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(ModelError::UnexpectedEof {
                offset: self.offset,
                wanted,
            })?;
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn word(&mut self) -> Result<[u8; 4], ModelError> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(buf)
    }

    fn i32(&mut self) -> Result<i32, ModelError> {
        self.word().map(i32::from_le_bytes)
    }

    fn u32(&mut self) -> Result<u32, ModelError> {
        self.word().map(u32::from_le_bytes)
    }

    fn f32(&mut self) -> Result<f32, ModelError> {
        self.word().map(f32::from_le_bytes)
    }

    fn vec3(&mut self) -> Result<Vec3, ModelError> {
        Ok(Vec3::new(self.f32()?, self.f32()?, self.f32()?))
    }

    fn vec4(&mut self) -> Result<Vec4, ModelError> {
        Ok(Vec4::new(self.f32()?, self.f32()?, self.f32()?, self.f32()?))
    }

    fn string(&mut self) -> Result<String, ModelError> {
        let offset = self.offset;
        let len = usize::from(self.take(1)?[0]);
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| ModelError::InvalidString { offset })
    }

    fn token(&mut self) -> Result<String, ModelError> {
        self.string()
    }

    /// Element count whose payload (`element_size` bytes each) must fit in the rest of the data
    fn count(&mut self, what: &'static str, element_size: usize) -> Result<usize, ModelError> {
        let offset = self.offset;
        let raw = self.i32()?;
        let invalid = || ModelError::InvalidCount {
            what,
            count: i64::from(raw),
            offset,
        };
        let count = usize::try_from(raw).map_err(|_| invalid())?;
        if count.saturating_mul(element_size) > self.remaining() {
            return Err(invalid());
        }
        Ok(count)
    }

    fn vec3s(&mut self, what: &'static str) -> Result<Vec<Vec3>, ModelError> {
        let n = self.count(what, 12)?;
        (0..n).map(|_| self.vec3()).collect()
    }

    fn u32s(&mut self, what: &'static str) -> Result<Vec<u32>, ModelError> {
        let n = self.count(what, 4)?;
        (0..n).map(|_| self.u32()).collect()
    }

    fn frame(&mut self, depth: usize) -> Result<FrameData, ModelError> {
        if depth >= MAX_FRAME_DEPTH {
            return Err(ModelError::TooDeep(MAX_FRAME_DEPTH));
        }

        let offset = self.offset;
        let token = self.token()?;
        if token != "<Frame>:" {
            return Err(ModelError::UnknownToken {
                token,
                offset,
                context: "frame header",
            });
        }
        let mut frame = FrameData::new(String::new());
        frame.index = self.i32()?;
        frame.name = self.string()?;

        loop {
            let offset = self.offset;
            match self.token()?.as_str() {
                "<Transform>:" => {
                    let position = self.vec3()?;
                    let _euler = self.vec3()?;
                    let scale = self.vec3()?;
                    let q = self.vec4()?;
                    let rotation = Quat::new_normalize(Quaternion::new(q.w, q.x, q.y, q.z));
                    frame.transform = Mat4::new_translation(&position)
                        * rotation.to_homogeneous()
                        * Mat4::new_nonuniform_scaling(&scale);
                }
                "<TransformMatrix>:" => {
                    let mut values = [0.0f32; 16];
                    for value in &mut values {
                        *value = self.f32()?;
                    }
                    // Row-vector rows become our columns.
                    frame.transform = Mat4::from_column_slice(&values);
                }
                "<Mesh>:" => frame.mesh = Some(self.mesh()?),
                "<Materials>:" => frame.materials = self.materials()?,
                "<Children>:" => {
                    let n = self.count("children", 0)?;
                    frame.children.reserve(n.min(self.remaining()));
                    for _ in 0..n {
                        frame.children.push(self.frame(depth + 1)?);
                    }
                }
                "</Frame>" => break,
                other => {
                    return Err(ModelError::UnknownToken {
                        token: other.to_owned(),
                        offset,
                        context: "frame",
                    })
                }
            }
        }

        Ok(frame)
    }

    fn mesh(&mut self) -> Result<Mesh, ModelError> {
        let vertex_count = self.count("vertex", 0)?;
        let mut mesh = Mesh::new(self.string()?);

        loop {
            let offset = self.offset;
            match self.token()?.as_str() {
                "<Bounds>:" => {
                    let center = self.vec3()?;
                    let extents = self.vec3()?;
                    mesh.bounds = Some(Bounds::new(center, extents));
                }
                "<Positions>:" => mesh.positions = self.vec3s("position")?,
                "<Colors>:" => {
                    let n = self.count("color", 16)?;
                    mesh.colors = (0..n).map(|_| self.vec4()).collect::<Result<_, _>>()?;
                }
                "<Normals>:" => mesh.normals = self.vec3s("normal")?,
                "<Indices>:" => mesh.indices = self.u32s("index")?,
                "<SubMeshes>:" => {
                    let n = self.count("sub-mesh", 8)?;
                    mesh.sub_meshes = vec![Vec::new(); n];
                    for _ in 0..n {
                        let offset = self.offset;
                        let token = self.token()?;
                        if token != "<SubMesh>:" {
                            return Err(ModelError::UnknownToken {
                                token,
                                offset,
                                context: "sub-mesh list",
                            });
                        }
                        let index_offset = self.offset;
                        let index = self.i32()?;
                        let slot = usize::try_from(index)
                            .ok()
                            .filter(|&i| i < n)
                            .ok_or(ModelError::InvalidCount {
                                what: "sub-mesh index",
                                count: i64::from(index),
                                offset: index_offset,
                            })?;
                        mesh.sub_meshes[slot] = self.u32s("sub-mesh index")?;
                    }
                }
                "</Mesh>" => break,
                other => {
                    return Err(ModelError::UnknownToken {
                        token: other.to_owned(),
                        offset,
                        context: "mesh",
                    })
                }
            }
        }

        validate_mesh(&mesh, vertex_count)?;
        if mesh.bounds.is_none() && !mesh.positions.is_empty() {
            mesh = mesh.with_computed_bounds();
        }
        Ok(mesh)
    }

    fn materials(&mut self) -> Result<Vec<Material>, ModelError> {
        let n = self.count("material", 4)?;
        let mut materials = vec![Material::default(); n];
        let mut current: Option<usize> = None;

        loop {
            let offset = self.offset;
            let token = self.token()?;
            if token == "</Materials>" {
                break;
            }
            if token == "<Material>:" {
                let index = self.i32()?;
                current = Some(
                    usize::try_from(index)
                        .ok()
                        .filter(|&i| i < n)
                        .ok_or(ModelError::InvalidCount {
                            what: "material index",
                            count: i64::from(index),
                            offset,
                        })?,
                );
                continue;
            }

            let Some(material) = current.and_then(|i| materials.get_mut(i)) else {
                return Err(ModelError::UnknownToken {
                    token,
                    offset,
                    context: "material list (no <Material>: yet)",
                });
            };
            match token.as_str() {
                "<AlbedoColor>:" => material.albedo = self.vec4()?,
                "<EmissiveColor>:" => material.emissive = self.vec4()?,
                "<SpecularColor>:" => material.specular = self.vec4()?,
                "<Glossiness>:" => material.glossiness = self.f32()?,
                "<Smoothness>:" => material.smoothness = self.f32()?,
                "<Metallic>:" => material.metallic = self.f32()?,
                "<SpecularHighlight>:" => material.specular_highlight = self.f32()?,
                "<GlossyReflection>:" => material.glossy_reflection = self.f32()?,
                _ => {
                    return Err(ModelError::UnknownToken {
                        token,
                        offset,
                        context: "material",
                    })
                }
            }
        }

        Ok(materials)
    }
}

fn validate_mesh(mesh: &Mesh, declared_vertices: usize) -> Result<(), ModelError> {
    let vertices = if mesh.positions.is_empty() {
        declared_vertices
    } else {
        mesh.positions.len()
    };

    let out_of_range = mesh
        .indices
        .iter()
        .chain(mesh.sub_meshes.iter().flatten())
        .find(|&&index| index as usize >= vertices);

    match out_of_range {
        Some(&index) => Err(ModelError::IndexOutOfRange {
            index,
            vertices,
            mesh: mesh.name.clone(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Minimal encoder for the token stream
    #[derive(Default)]
    pub(crate) struct ModelWriter {
        pub bytes: Vec<u8>,
    }

    impl ModelWriter {
        pub fn token(&mut self, text: &str) -> &mut Self {
            self.bytes.push(u8::try_from(text.len()).unwrap());
            self.bytes.extend_from_slice(text.as_bytes());
            self
        }

        pub fn i32(&mut self, value: i32) -> &mut Self {
            self.bytes.extend_from_slice(&value.to_le_bytes());
            self
        }

        pub fn f32s(&mut self, values: &[f32]) -> &mut Self {
            for v in values {
                self.bytes.extend_from_slice(&v.to_le_bytes());
            }
            self
        }

        pub fn frame_header(&mut self, index: i32, name: &str) -> &mut Self {
            self.token("<Frame>:").i32(index).token(name)
        }

        pub fn translation(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
            self.token("<TransformMatrix>:").f32s(&[
                1.0, 0.0, 0.0, 0.0, //
                0.0, 1.0, 0.0, 0.0, //
                0.0, 0.0, 1.0, 0.0, //
                x, y, z, 1.0,
            ])
        }

        pub fn triangle_mesh(&mut self, name: &str) -> &mut Self {
            self.token("<Mesh>:").i32(3).token(name);
            self.token("<Bounds>:").f32s(&[0.5, 0.5, 0.0, 0.5, 0.5, 0.0]);
            self.token("<Positions>:")
                .i32(3)
                .f32s(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
            self.token("<SubMeshes>:").i32(1);
            self.token("<SubMesh>:").i32(0).i32(3);
            for i in 0..3u32 {
                self.bytes.extend_from_slice(&i.to_le_bytes());
            }
            self.token("</Mesh>")
        }
    }

    /// Two-frame model: "Body" with a triangle mesh, child "Rotor" at (0, 2, 0)
    pub(crate) fn two_frame_model() -> Vec<u8> {
        let mut w = ModelWriter::default();
        w.token("<Hierarchy>:");
        w.frame_header(0, "Body").translation(1.0, 2.0, 3.0).triangle_mesh("body");
        w.token("<Materials>:").i32(1);
        w.token("<Material>:").i32(0);
        w.token("<AlbedoColor>:").f32s(&[0.5, 0.5, 0.5, 1.0]);
        w.token("<Glossiness>:").f32s(&[0.25]);
        w.token("</Materials>");
        w.token("<Children>:").i32(1);
        w.frame_header(1, "Rotor").translation(0.0, 2.0, 0.0).token("</Frame>");
        w.token("</Frame>");
        w.token("</Hierarchy>");
        w.bytes
    }

    #[test]
    fn test_parse_two_frame_model() {
        let model = ModelData::parse(&two_frame_model()).unwrap();
        let root = &model.root;
        assert_eq!(root.name, "Body");
        assert_eq!(root.frame_count(), 2);
        assert_relative_eq!(root.transform[(1, 3)], 2.0);

        let mesh = root.mesh.as_ref().unwrap();
        assert_eq!(mesh.positions.len(), 3);
        assert_eq!(mesh.sub_meshes, vec![vec![0, 1, 2]]);
        assert_eq!(mesh.bounds.unwrap().extents, Vec3::new(0.5, 0.5, 0.0));

        assert_eq!(root.materials.len(), 1);
        assert_relative_eq!(root.materials[0].albedo, Vec4::new(0.5, 0.5, 0.5, 1.0));
        assert_relative_eq!(root.materials[0].glossiness, 0.25);

        let rotor = root.find("Rotor").unwrap();
        assert!(rotor.mesh.is_none());
        assert_relative_eq!(rotor.transform[(1, 3)], 2.0);
    }

    #[test]
    fn test_truncated_data_fails_fast() {
        let bytes = two_frame_model();
        for cut in [3, 20, bytes.len() / 2, bytes.len() - 14] {
            let err = ModelData::parse(&bytes[..cut]).unwrap_err();
            assert!(
                matches!(err, ModelError::UnexpectedEof { .. } | ModelError::InvalidCount { .. }),
                "cut at {cut}: {err}"
            );
        }
    }

    #[test]
    fn test_unknown_token_is_reported() {
        let mut w = ModelWriter::default();
        w.token("<Hierarchy>:").frame_header(0, "Body").token("<Bogus>:");
        let err = ModelData::parse(&w.bytes).unwrap_err();
        assert!(matches!(err, ModelError::UnknownToken { ref token, context: "frame", .. } if token == "<Bogus>:"));
    }

    #[test]
    fn test_negative_count_is_rejected() {
        let mut w = ModelWriter::default();
        w.token("<Hierarchy>:").frame_header(0, "Body").token("<Children>:").i32(-1);
        let err = ModelData::parse(&w.bytes).unwrap_err();
        assert!(matches!(err, ModelError::InvalidCount { what: "children", count: -1, .. }));
    }

    #[test]
    fn test_index_out_of_range_is_rejected() {
        let mut w = ModelWriter::default();
        w.token("<Hierarchy>:").frame_header(0, "Body");
        w.token("<Mesh>:").i32(1).token("bad");
        w.token("<Positions>:").i32(1).f32s(&[0.0, 0.0, 0.0]);
        w.token("<Indices>:").i32(1);
        w.bytes.extend_from_slice(&7u32.to_le_bytes());
        w.token("</Mesh>");
        let err = ModelData::parse(&w.bytes).unwrap_err();
        assert!(matches!(err, ModelError::IndexOutOfRange { index: 7, vertices: 1, .. }));
    }

    #[test]
    fn test_empty_input_has_no_hierarchy() {
        assert!(matches!(ModelData::parse(&[]), Err(ModelError::MissingHierarchy)));
    }
}
