//! Game asset loading
//!
//! Files are looked up under the configured asset root. When a file is
//! missing and placeholders are allowed, a generated stand-in is used so
//! the game still runs from a bare checkout.

use std::path::{Path, PathBuf};

use skyraid_engine::assets::{FrameData, Material, Mesh, ModelData, Texture};
use skyraid_engine::foundation::math::{Mat4, Vec3, Vec4};

use crate::config::SceneConfig;
use crate::error::GameError;
use crate::terrain::HeightMap;

/// Resolves and loads the files a scene needs
#[derive(Debug, Clone)]
pub struct AssetLoader {
    root: PathBuf,
    allow_placeholders: bool,
}

impl AssetLoader {
    /// Loader for the scene's asset root
    pub fn new(config: &SceneConfig) -> Self {
        Self {
            root: config.asset_root.clone(),
            allow_placeholders: config.allow_placeholder_assets,
        }
    }

    fn resolve(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    fn use_placeholder(&self, path: &Path) -> bool {
        if self.allow_placeholders && !path.exists() {
            log::warn!("{} not found, using a generated placeholder", path.display());
            true
        } else {
            false
        }
    }

    /// Hierarchical model, or `placeholder()` when the file is missing
    pub fn model(&self, relative: &Path, placeholder: impl FnOnce() -> ModelData) -> Result<ModelData, GameError> {
        let path = self.resolve(relative);
        if self.use_placeholder(&path) {
            return Ok(placeholder());
        }
        Ok(ModelData::load(&path)?)
    }

    /// Texture, or a 1x1 texture of `color` when the file is missing
    pub fn texture(&self, relative: &Path, color: [u8; 4]) -> Result<Texture, GameError> {
        let path = self.resolve(relative);
        if self.use_placeholder(&path) {
            return Ok(Texture::solid(relative.display().to_string(), color));
        }
        Ok(Texture::load(&path)?)
    }

    /// Raw height map, or rolling hills when the file is missing
    pub fn heightmap(&self, relative: &Path, width: usize, length: usize) -> Result<HeightMap, GameError> {
        let path = self.resolve(relative);
        if self.use_placeholder(&path) {
            return Ok(rolling_hills(width, length));
        }
        HeightMap::load(&path, width, length)
    }
}

/// Gentle generated terrain, samples between 2 and 18
pub fn rolling_hills(width: usize, length: usize) -> HeightMap {
    let bytes: Vec<u8> = (0..length)
        .flat_map(|z| (0..width).map(move |x| (x, z)))
        .map(|(x, z)| {
            let h = 10.0 + 8.0 * (x as f32 / 16.0).sin() * (z as f32 / 16.0).cos();
            h.round().clamp(0.0, 255.0) as u8
        })
        .collect();
    HeightMap::from_raw(&bytes, width, length).unwrap_or_else(|| HeightMap::flat(width.max(1), length.max(1), 10))
}

fn part(name: &str, mesh: Mesh, color: Vec4, position: Vec3) -> FrameData {
    let mut frame = FrameData::new(name);
    frame.transform = Mat4::new_translation(&position);
    frame.materials.push(Material::colored(format!("{name}Material"), color));
    frame.mesh = Some(mesh);
    frame
}

/// Helicopter with a body and two named rotor frames
pub fn helicopter_model(main_rotor: &str, tail_rotor: &str) -> ModelData {
    let olive = Vec4::new(0.35, 0.4, 0.2, 1.0);
    let steel = Vec4::new(0.3, 0.3, 0.32, 1.0);

    let mut root = FrameData::new("Helicopter");
    root.children.push(part("Body", Mesh::cube("Body", 4.0, 3.0, 8.0), olive, Vec3::zeros()));
    root.children.push(part(
        main_rotor,
        Mesh::cube(main_rotor, 10.0, 0.2, 0.6),
        steel,
        Vec3::new(0.0, 1.8, 0.0),
    ));
    root.children.push(part(
        tail_rotor,
        Mesh::cube(tail_rotor, 0.2, 2.0, 0.4),
        steel,
        Vec3::new(0.4, 0.6, -4.6),
    ));
    ModelData { root }
}

/// Small fixed-wing aircraft
pub fn airplane_model() -> ModelData {
    let grey = Vec4::new(0.7, 0.7, 0.75, 1.0);

    let mut root = FrameData::new("Airplane");
    root.children.push(part("Fuselage", Mesh::cube("Fuselage", 1.5, 1.2, 6.0), grey, Vec3::zeros()));
    root.children.push(part("Wings", Mesh::cube("Wings", 9.0, 0.2, 1.6), grey, Vec3::new(0.0, 0.0, 0.5)));
    root.children.push(part("Tail", Mesh::cube("Tail", 3.0, 1.2, 0.8), grey, Vec3::new(0.0, 0.5, -2.6)));
    ModelData { root }
}
