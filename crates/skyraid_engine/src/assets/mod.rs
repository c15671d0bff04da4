//! Asset management: shared meshes, textures and materials, and model loading

pub mod material;
pub mod mesh;
pub mod model_loader;
pub mod resource_manager;
pub mod texture;

pub use material::Material;
pub use mesh::{Bounds, Mesh};
pub use model_loader::{FrameData, ModelData, ModelError};
pub use resource_manager::{
    MaterialId, MeshId, Released, ResourceError, ResourceManager, ResourcePool, TextureId,
};
pub use texture::Texture;
