// src/lib.rs
//! Cairn 3D Engine Core
//!
//! The resource-management and scene-graph core of a small real-time 3D
//! renderer. GPU work goes through the [`gfx::backend::GraphicsBackend`]
//! trait, so the whole engine runs headless for tests and tools.

pub mod gfx;
pub mod logging;

// Re-export main types for convenience
pub use gfx::error::EngineError;
pub use gfx::{Camera, RenderEngine, RendererConfig, Scene, Transform};

/// Creates a render engine with default settings around the given backend.
pub fn default<B: gfx::backend::GraphicsBackend>(backend: B) -> RenderEngine<B> {
    RenderEngine::new(backend, RendererConfig::default())
}
