//! Resource Manager - shared, reference-counted asset tables
//!
//! **OWNERSHIP MODEL**:
//! Meshes, textures and materials are stored once in generation-checked
//! slotmap tables and handed out as small `Copy` handles. Every holder
//! (scene node, material, model template, scene-wide template such as the
//! bullet mesh) takes one reference with `add_ref_*` and gives it back with
//! `release_*`.
//!
//! - A resource is destroyed exactly on the 1 -> 0 transition.
//! - A count never goes below zero: releasing an unreferenced resource, or
//!   using a handle whose resource is already gone, is a programmer error.
//!   It is reported as a [`ResourceError`] and trips a `debug_assert!`.
//! - Destroying a material releases the material's texture.
//!
//! ```text
//! SceneGraph nodes ──┐
//! ModelTemplate  ────┼──> ResourceManager (THIS MODULE: counts, lifetime)
//! Scene templates ───┘         │
//!                              └──> RenderBackend (uploads on first draw)
//! ```

use slotmap::{new_key_type, Key, SlotMap};
use thiserror::Error;

use super::{Material, Mesh, Texture};

new_key_type! {
    /// Handle to a [`Mesh`] stored in the [`ResourceManager`]
    pub struct MeshId;
    /// Handle to a [`Texture`] stored in the [`ResourceManager`]
    pub struct TextureId;
    /// Handle to a [`Material`] stored in the [`ResourceManager`]
    pub struct MaterialId;
}

/// Resource Manager errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// The handle points at a resource that was already destroyed
    #[error("Stale {kind} handle (resource already destroyed)")]
    StaleHandle {
        /// Resource table name
        kind: &'static str,
    },

    /// Release on a resource nobody holds
    #[error("Released {kind} that holds no references")]
    NotReferenced {
        /// Resource table name
        kind: &'static str,
    },

    /// Texture file could not be read or decoded
    #[error("Texture load failed for {path}: {reason}")]
    TextureLoad {
        /// Path that was requested
        path: String,
        /// Decoder or I/O message
        reason: String,
    },
}

/// Outcome of a release
#[derive(Debug)]
pub enum Released<T> {
    /// Other holders remain; carries the remaining count
    Alive(u32),
    /// That was the last reference; the resource has been removed
    Destroyed(T),
}

impl<T> Released<T> {
    /// True when the release destroyed the resource
    pub const fn is_destroyed(&self) -> bool {
        matches!(self, Self::Destroyed(_))
    }
}

struct Entry<T> {
    value: T,
    refs: u32,
}

/// One reference-counted table
pub struct ResourcePool<K: Key, T> {
    kind: &'static str,
    entries: SlotMap<K, Entry<T>>,
    destroyed: u64,
}

impl<K: Key, T> ResourcePool<K, T> {
    /// Create an empty pool; `kind` names the table in errors and logs
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: SlotMap::with_key(),
            destroyed: 0,
        }
    }

    /// Store a resource with a reference count of zero
    ///
    /// The resource lives until its first holder takes and then gives back
    /// a reference. A resource that is never referenced is dropped with the
    /// pool.
    pub fn insert(&mut self, value: T) -> K {
        self.entries.insert(Entry { value, refs: 0 })
    }

    /// Take one reference; returns the new count
    pub fn add_ref(&mut self, key: K) -> Result<u32, ResourceError> {
        let kind = self.kind;
        let entry = self.entries.get_mut(key).ok_or_else(|| {
            debug_assert!(false, "add_ref on stale {kind} handle");
            ResourceError::StaleHandle { kind }
        })?;
        entry.refs += 1;
        Ok(entry.refs)
    }

    /// Give back one reference, destroying the resource on 1 -> 0
    pub fn release(&mut self, key: K) -> Result<Released<T>, ResourceError> {
        let kind = self.kind;
        let Some(entry) = self.entries.get_mut(key) else {
            debug_assert!(false, "double release of {kind}: handle is stale");
            return Err(ResourceError::StaleHandle { kind });
        };

        match entry.refs {
            0 => {
                debug_assert!(false, "double release of {kind}: count is already zero");
                Err(ResourceError::NotReferenced { kind })
            }
            1 => {
                self.destroyed += 1;
                self.entries
                    .remove(key)
                    .map(|entry| Released::Destroyed(entry.value))
                    .ok_or(ResourceError::StaleHandle { kind })
            }
            _ => {
                entry.refs -= 1;
                Ok(Released::Alive(entry.refs))
            }
        }
    }

    /// Borrow a live resource
    pub fn get(&self, key: K) -> Option<&T> {
        self.entries.get(key).map(|entry| &entry.value)
    }

    /// Mutably borrow a live resource
    pub fn get_mut(&mut self, key: K) -> Option<&mut T> {
        self.entries.get_mut(key).map(|entry| &mut entry.value)
    }

    /// Current reference count, `None` once destroyed
    pub fn ref_count(&self, key: K) -> Option<u32> {
        self.entries.get(key).map(|entry| entry.refs)
    }

    /// Whether the handle still resolves
    pub fn contains(&self, key: K) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of live resources
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no resources are live
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total destructions since the pool was created
    pub const fn destroyed_count(&self) -> u64 {
        self.destroyed
    }
}

/// Owner of every shared mesh, texture and material
pub struct ResourceManager {
    meshes: ResourcePool<MeshId, Mesh>,
    textures: ResourcePool<TextureId, Texture>,
    materials: ResourcePool<MaterialId, Material>,
}

impl Default for ResourceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceManager {
    /// Create empty tables
    pub fn new() -> Self {
        Self {
            meshes: ResourcePool::new("mesh"),
            textures: ResourcePool::new("texture"),
            materials: ResourcePool::new("material"),
        }
    }

    /// Store a mesh (count 0)
    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.insert(mesh)
    }

    /// Store a texture (count 0)
    pub fn add_texture(&mut self, texture: Texture) -> TextureId {
        self.textures.insert(texture)
    }

    /// Store a material (count 0)
    ///
    /// A texture already set on `material` is counted as held by it.
    pub fn add_material(&mut self, material: Material) -> Result<MaterialId, ResourceError> {
        if let Some(texture) = material.texture() {
            self.textures.add_ref(texture)?;
        }
        Ok(self.materials.insert(material))
    }

    /// Take a mesh reference
    pub fn add_ref_mesh(&mut self, id: MeshId) -> Result<u32, ResourceError> {
        self.meshes.add_ref(id)
    }

    /// Take a texture reference
    pub fn add_ref_texture(&mut self, id: TextureId) -> Result<u32, ResourceError> {
        self.textures.add_ref(id)
    }

    /// Take a material reference
    pub fn add_ref_material(&mut self, id: MaterialId) -> Result<u32, ResourceError> {
        self.materials.add_ref(id)
    }

    /// Give back a mesh reference; true when the mesh was destroyed
    pub fn release_mesh(&mut self, id: MeshId) -> Result<bool, ResourceError> {
        let released = self.meshes.release(id)?;
        if let Released::Destroyed(mesh) = &released {
            log::trace!("Destroyed mesh '{}'", mesh.name);
        }
        Ok(released.is_destroyed())
    }

    /// Give back a texture reference; true when the texture was destroyed
    pub fn release_texture(&mut self, id: TextureId) -> Result<bool, ResourceError> {
        let released = self.textures.release(id)?;
        if let Released::Destroyed(texture) = &released {
            log::trace!("Destroyed texture '{}'", texture.name);
        }
        Ok(released.is_destroyed())
    }

    /// Give back a material reference; destroying it also releases its texture
    pub fn release_material(&mut self, id: MaterialId) -> Result<bool, ResourceError> {
        match self.materials.release(id)? {
            Released::Alive(_) => Ok(false),
            Released::Destroyed(material) => {
                log::trace!("Destroyed material '{}'", material.name);
                if let Some(texture) = material.texture() {
                    self.release_texture(texture)?;
                }
                Ok(true)
            }
        }
    }

    /// Point a material at a new texture
    ///
    /// The incoming texture gains a reference before the previous occupant
    /// loses one, so reassigning the same texture is safe.
    pub fn set_material_texture(
        &mut self,
        material: MaterialId,
        texture: Option<TextureId>,
    ) -> Result<(), ResourceError> {
        if let Some(texture) = texture {
            self.textures.add_ref(texture)?;
        }
        let previous = self
            .materials
            .get_mut(material)
            .ok_or(ResourceError::StaleHandle { kind: "material" })?
            .replace_texture(texture);
        if let Some(previous) = previous {
            self.release_texture(previous)?;
        }
        Ok(())
    }

    /// Borrow a mesh
    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id)
    }

    /// Borrow a texture
    pub fn texture(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(id)
    }

    /// Borrow a material
    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id)
    }

    /// Mutably borrow a material
    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id)
    }

    /// Mesh table
    pub const fn meshes(&self) -> &ResourcePool<MeshId, Mesh> {
        &self.meshes
    }

    /// Texture table
    pub const fn textures(&self) -> &ResourcePool<TextureId, Texture> {
        &self.textures
    }

    /// Material table
    pub const fn materials(&self) -> &ResourcePool<MaterialId, Material> {
        &self.materials
    }

    /// Live resource counts as (meshes, textures, materials)
    pub fn live_counts(&self) -> (usize, usize, usize) {
        (self.meshes.len(), self.textures.len(), self.materials.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_pool() -> ResourcePool<MeshId, &'static str> {
        ResourcePool::new("mesh")
    }

    #[test]
    fn test_reference_counting() {
        let mut pool = test_pool();
        let id = pool.insert("cube");

        for holder in 1..=4 {
            assert_eq!(pool.add_ref(id).unwrap(), holder);
        }

        for remaining in (1..4).rev() {
            match pool.release(id).unwrap() {
                Released::Alive(n) => assert_eq!(n, remaining),
                Released::Destroyed(_) => panic!("destroyed before the last release"),
            }
            assert!(pool.contains(id));
        }

        assert!(matches!(pool.release(id).unwrap(), Released::Destroyed("cube")));
        assert!(!pool.contains(id));
        assert_eq!(pool.destroyed_count(), 1);
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "double release"))]
    fn test_double_release_is_rejected() {
        let mut pool = test_pool();
        let id = pool.insert("cube");
        pool.add_ref(id).unwrap();
        assert!(pool.release(id).unwrap().is_destroyed());

        assert_eq!(pool.release(id).unwrap_err(), ResourceError::StaleHandle { kind: "mesh" });
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "double release"))]
    fn test_release_without_reference_is_rejected() {
        let mut pool = test_pool();
        let id = pool.insert("cube");
        assert_eq!(pool.release(id).unwrap_err(), ResourceError::NotReferenced { kind: "mesh" });
    }

    #[test]
    fn test_stale_handle_does_not_resolve_to_new_resource() {
        let mut pool = test_pool();
        let old = pool.insert("old");
        pool.add_ref(old).unwrap();
        pool.release(old).unwrap();

        let new = pool.insert("new");
        assert!(pool.get(old).is_none());
        assert_eq!(pool.get(new), Some(&"new"));
    }

    #[test]
    fn test_material_destruction_releases_texture() {
        let mut resources = ResourceManager::new();
        let texture = resources.add_texture(Texture::solid("white", [255; 4]));
        let material = resources
            .add_material(Material::new("skin").with_texture(texture))
            .unwrap();
        assert_eq!(resources.textures().ref_count(texture), Some(1));

        resources.add_ref_material(material).unwrap();
        assert!(resources.release_material(material).unwrap());
        assert!(resources.texture(texture).is_none());
        assert_eq!(resources.live_counts(), (0, 0, 0));
    }

    #[test]
    fn test_texture_reassignment_releases_previous() {
        let mut resources = ResourceManager::new();
        let first = resources.add_texture(Texture::solid("first", [255; 4]));
        let second = resources.add_texture(Texture::solid("second", [0; 4]));
        let material = resources.add_material(Material::new("m")).unwrap();

        // Keep `first` alive through an outside holder.
        resources.add_ref_texture(first).unwrap();
        resources.set_material_texture(material, Some(first)).unwrap();
        assert_eq!(resources.textures().ref_count(first), Some(2));

        resources.set_material_texture(material, Some(second)).unwrap();
        assert_eq!(resources.textures().ref_count(first), Some(1));
        assert_eq!(resources.textures().ref_count(second), Some(1));

        // Same texture again must not drop it.
        resources.set_material_texture(material, Some(second)).unwrap();
        assert_eq!(resources.textures().ref_count(second), Some(1));
    }
}
