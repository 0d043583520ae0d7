// src/gfx/resources/mod.rs
//! GPU resource management
//!
//! Handles textures, shaders, meshes, and model import for rendering.

pub mod importer;
pub mod mesh;
pub mod model;
pub mod shader;
pub mod texture;

// Re-export main types
pub use importer::{Importer, ObjImporter};
pub use mesh::{Mesh, Vertex3D};
pub use model::Model;
pub use shader::Shader;
pub use texture::{Texture, TextureCache, TextureHandle, TextureKind, MAX_TEXTURES};
