//! # Scene Management Module
//!
//! This module provides 3D scene management functionality: the entity arena
//! and graph hierarchy, and the [`Scene`] aggregate that owns everything the
//! renderer draws.
//!
//! ## Key Components
//!
//! - [`Scene`] - The owning container for the graph, camera, lights, textures, and models
//! - [`SceneGraph`] - Arena of entities rooted at a permanent sentinel
//! - [`Entity`] - One positioned node, tagged with what it is and what it draws
//!
//! [`SceneGraph`]: entity::SceneGraph
//! [`Entity`]: entity::Entity

pub mod entity;
pub mod scene;

// Re-export main types
pub use entity::{Entity, EntityId, EntityKind, SceneGraph, ROOT};
pub use scene::Scene;
