//! # Texture Cache
//!
//! Deduplicated GPU texture store keyed by source file path. At most one
//! GPU-resident copy of a file exists; repeated loads return the existing
//! handle without touching the backend. The cache is capped at
//! [`MAX_TEXTURES`] live entries and a load past the cap fails cleanly,
//! leaving the resident set untouched.

use log::{debug, warn};

use crate::gfx::backend::{GraphicsBackend, TextureId};
use crate::gfx::error::EngineError;

/// Hard cap on resident textures.
pub const MAX_TEXTURES: usize = 32;

/// How a texture is sampled by the material system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    Diffuse,
    Specular,
}

impl TextureKind {
    /// Suffix used in material uniform names.
    pub fn uniform_suffix(self) -> &'static str {
        match self {
            TextureKind::Diffuse => "diffuse",
            TextureKind::Specular => "specular",
        }
    }
}

/// A GPU-resident texture. Identity is the source file path.
#[derive(Debug)]
pub struct Texture {
    pub id: TextureId,
    pub path: String,
    pub kind: TextureKind,
}

/// Index-based handle into the cache.
pub type TextureHandle = usize;

/// Deduplicated texture store.
#[derive(Default)]
pub struct TextureCache {
    textures: Vec<Texture>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn get(&self, handle: TextureHandle) -> Option<&Texture> {
        let texture = self.textures.get(handle);
        if texture.is_none() {
            warn!("texture lookup out of range: {}", handle);
        }
        texture
    }

    /// Returns the handle for `path`, uploading it through the backend only
    /// if it is not already resident.
    ///
    /// On a cache hit the existing handle is returned and no GPU call is
    /// made; the `kind` recorded at first load wins. On a miss the file is
    /// decoded to RGBA8 and uploaded (bind, parameterize, upload, mipmap).
    pub fn load_or_reuse<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        path: &str,
        kind: TextureKind,
    ) -> Result<TextureHandle, EngineError> {
        if let Some(index) = self.textures.iter().position(|t| t.path == path) {
            debug!("texture cache hit for {}", path);
            return Ok(index);
        }

        if self.textures.len() >= MAX_TEXTURES {
            return Err(EngineError::ResourceLimit {
                resource: "texture cache",
                limit: MAX_TEXTURES,
            });
        }

        let decoded = image::open(path).map_err(|e| EngineError::ResourceNotFound {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();

        let id = backend.create_texture();
        backend.bind_texture(0, id);
        backend.set_texture_parameters();
        backend.upload_texture(id, width, height, &rgba);
        backend.generate_mipmaps(id);

        self.textures.push(Texture {
            id,
            path: path.to_string(),
            kind,
        });
        Ok(self.textures.len() - 1)
    }

    /// Inserts an already-uploaded texture, subject to the same cap and
    /// path deduplication as [`Self::load_or_reuse`]. Used when texels come
    /// from somewhere other than a file on disk.
    pub fn insert_resident(
        &mut self,
        id: TextureId,
        path: &str,
        kind: TextureKind,
    ) -> Result<TextureHandle, EngineError> {
        if let Some(index) = self.textures.iter().position(|t| t.path == path) {
            return Ok(index);
        }
        if self.textures.len() >= MAX_TEXTURES {
            return Err(EngineError::ResourceLimit {
                resource: "texture cache",
                limit: MAX_TEXTURES,
            });
        }
        self.textures.push(Texture {
            id,
            path: path.to_string(),
            kind,
        });
        Ok(self.textures.len() - 1)
    }

    /// Deletes every resident texture. The backend must still be alive.
    pub fn destroy<B: GraphicsBackend>(&mut self, backend: &mut B) {
        for texture in self.textures.drain(..) {
            backend.delete_texture(texture.id);
        }
    }
}
