//! # Graphics Module
//!
//! This module contains all graphics-related functionality for the Cairn
//! engine: the backend abstraction, camera, scene management, lighting, and
//! resource handling.
//!
//! ## Architecture Overview
//!
//! The graphics system is organized into several key components:
//!
//! - **Backend Abstraction** ([`backend`]) - The trait every GPU call goes through
//! - **Camera System** ([`camera`]) - Perspective camera with coupled field-of-view axes
//! - **Scene Management** ([`scene`]) - Entity arena, graph hierarchy, and the owning scene
//! - **Lighting** ([`lighting`]) - Registry of directional, point, and spot lights
//! - **Resource Management** ([`resources`]) - Textures, shaders, meshes, and model import
//! - **Render Engine** ([`renderer`]) - The frame loop and handle-based facade
//!
//! ## Usage
//!
//! The graphics system is primarily used through the [`RenderEngine`] and
//! [`Scene`] types:
//!
//! ```no_run
//! use cairn::gfx::{RenderEngine, RendererConfig};
//! use cairn::gfx::backend::RecordingBackend;
//!
//! let mut engine = RenderEngine::new(RecordingBackend::new(), RendererConfig::default());
//! let crate_model = engine.add_model("crate", "assets/crate.obj", "shaders/lit")?;
//! engine.draw();
//! # Ok::<(), cairn::gfx::error::EngineError>(())
//! ```
//!
//! [`Scene`]: scene::Scene

pub mod backend;
pub mod camera;
pub mod error;
pub mod lighting;
pub mod renderer;
pub mod resources;
pub mod scene;
pub mod transform;

// Re-export commonly used types
pub use camera::Camera;
pub use renderer::{RenderEngine, RendererConfig};
pub use scene::Scene;
pub use transform::Transform;
