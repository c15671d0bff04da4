//! Texture data loaded from image files

use std::path::Path;

use super::ResourceError;

/// RGBA8 texture
#[derive(Debug, Clone)]
pub struct Texture {
    /// File name or builder name
    pub name: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Tightly packed RGBA8 pixels, row-major
    pub pixels: Vec<u8>,
}

impl Texture {
    /// Decode an image file (PNG or DDS) into RGBA8
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ResourceError> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|e| ResourceError::TextureLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let rgba = image.to_rgba8();
        log::debug!("Loaded texture {} ({}x{})", path.display(), rgba.width(), rgba.height());

        Ok(Self {
            name: path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned()),
            width: rgba.width(),
            height: rgba.height(),
            pixels: rgba.into_raw(),
        })
    }

    /// 1x1 texture of a single color
    pub fn solid(name: impl Into<String>, rgba: [u8; 4]) -> Self {
        Self {
            name: name.into(),
            width: 1,
            height: 1,
            pixels: rgba.to_vec(),
        }
    }

    /// Size of the pixel data in bytes
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_reported() {
        let err = Texture::load("does/not/exist.png").unwrap_err();
        assert!(matches!(err, ResourceError::TextureLoad { ref path, .. } if path.ends_with("exist.png")));
    }

    #[test]
    fn test_solid_texture() {
        let t = Texture::solid("red", [255, 0, 0, 255]);
        assert_eq!((t.width, t.height, t.byte_len()), (1, 1, 4));
    }
}
