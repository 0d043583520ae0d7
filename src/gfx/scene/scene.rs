//! # Scene
//!
//! The owning aggregate for everything the renderer draws: the entity graph,
//! the active camera, the shared texture cache, the light registry, and the
//! loaded models. Nothing here is global; a `Scene` is constructed explicitly
//! and passed around by reference.
//!
//! Model and light handles are eight bits wide and issued in registration
//! order. Lights are synchronized into a model's shader exactly once, when
//! the model is created; lights registered afterwards do not appear in
//! already-loaded models. Spot-cone edits through
//! [`Scene::modify_all_spotlights`] are the one exception and re-push the
//! affected uniforms.

use log::warn;

use crate::gfx::backend::GraphicsBackend;
use crate::gfx::camera::Camera;
use crate::gfx::error::EngineError;
use crate::gfx::lighting::{Light, LightColour, LightKind, LightRegistry};
use crate::gfx::resources::importer::{Importer, ObjImporter};
use crate::gfx::resources::model::Model;
use crate::gfx::resources::texture::TextureCache;
use crate::gfx::scene::entity::{EntityId, EntityKind, SceneGraph};

/// Hard cap on loaded models; handles are `u8`.
pub const MAX_MODELS: usize = 255;

/// Valid spot-light cone half-angle range, in degrees.
pub const SPOT_ANGLE_RANGE: std::ops::RangeInclusive<f32> = 0.0..=90.0;
/// Valid spot-light blur fraction range.
pub const SPOT_BLUR_RANGE: std::ops::RangeInclusive<f32> = 0.0..=1.0;

/// Everything drawable, owned in one place.
pub struct Scene {
    graph: SceneGraph,
    camera: Camera,
    textures: TextureCache,
    lights: LightRegistry,
    models: Vec<Model>,
    importer: Box<dyn Importer>,
}

impl Scene {
    /// Creates an empty scene (root entity only) with the built-in OBJ
    /// importer.
    pub fn new(camera: Camera) -> Self {
        Self::with_importer(camera, Box::new(ObjImporter::new()))
    }

    /// Creates a scene around a caller-supplied asset importer.
    pub fn with_importer(camera: Camera, importer: Box<dyn Importer>) -> Self {
        Self {
            graph: SceneGraph::new(),
            camera,
            textures: TextureCache::new(),
            lights: LightRegistry::new(),
            models: Vec::new(),
            importer,
        }
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn lights(&self) -> &LightRegistry {
        &self.lights
    }

    pub fn textures(&self) -> &TextureCache {
        &self.textures
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn model(&self, handle: u8) -> Option<&Model> {
        let model = self.models.get(handle as usize);
        if model.is_none() {
            warn!("model lookup out of range: {}", handle);
        }
        model
    }

    pub fn model_mut(&mut self, handle: u8) -> Option<&mut Model> {
        let model = self.models.get_mut(handle as usize);
        if model.is_none() {
            warn!("model lookup out of range: {}", handle);
        }
        model
    }

    /// Models in registration order, which is also draw order.
    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// A model together with read access to the texture cache, for the draw
    /// path which mutates the shader while resolving texture handles.
    pub fn model_with_textures_mut(&mut self, handle: u8) -> Option<(&mut Model, &TextureCache)> {
        let model = self.models.get_mut(handle as usize);
        if model.is_none() {
            warn!("model lookup out of range: {}", handle);
        }
        Some((model?, &self.textures))
    }

    /// Loads a model and synchronizes the current light set into its shader.
    ///
    /// This is the one-shot sync point: the returned model sees every light
    /// registered so far and none registered later.
    pub fn add_model<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        name: &str,
        path: &str,
        shader_path: &str,
    ) -> Result<u8, EngineError> {
        if self.models.len() >= MAX_MODELS {
            return Err(EngineError::ResourceLimit {
                resource: "model table",
                limit: MAX_MODELS,
            });
        }

        let mut model = Model::load(
            backend,
            &mut self.textures,
            self.importer.as_ref(),
            name,
            path,
            shader_path,
        )?;
        self.lights
            .load_into_shader(&self.graph, model.shader_mut(), backend);

        self.models.push(model);
        Ok((self.models.len() - 1) as u8)
    }

    /// Registers an already-built model without going through the importer.
    #[cfg(test)]
    pub(crate) fn push_model_for_tests(&mut self, model: Model) -> u8 {
        self.models.push(model);
        (self.models.len() - 1) as u8
    }

    /// Registers a light and spawns its pose entity under `parent`.
    ///
    /// The capacity check runs before the entity is spawned, so a rejected
    /// registration leaves the graph untouched.
    pub fn add_light(
        &mut self,
        parent: EntityId,
        kind: LightKind,
        colour: LightColour,
    ) -> Result<(u8, EntityId), EngineError> {
        if !self.lights.has_capacity() {
            return Err(EngineError::ResourceLimit {
                resource: "light registry",
                limit: crate::gfx::lighting::MAX_LIGHTS,
            });
        }

        let entity = self.graph.spawn(parent);
        let handle = self.lights.add(Light {
            kind,
            colour,
            entity,
            model: None,
        })?;
        if let Some(e) = self.graph.entity_mut(entity) {
            e.kind = EntityKind::Light(handle);
        }
        Ok((handle, entity))
    }

    /// Attaches a loaded model to an entity, to be drawn at its pose. An
    /// out-of-range handle on either side is rejected with a warning.
    pub fn attach_model(&mut self, entity: EntityId, model: u8) {
        if self.model(model).is_none() {
            return;
        }
        if let Some(e) = self.graph.entity_mut(entity) {
            e.model = Some(model);
            if let EntityKind::Light(light) = e.kind {
                if let Some(light) = self.lights.get_mut(light) {
                    light.model = Some(model);
                }
            }
        }
    }

    /// Adjusts the cone of every spot light by `delta`, applied to the
    /// half-angle when `is_angle` is true and to the blur fraction otherwise.
    ///
    /// A light whose adjusted value would leave the valid range is skipped
    /// entirely; the value is never clamped. Accepted changes are re-pushed
    /// into every model's shader at the light's kind-local slot.
    pub fn modify_all_spotlights<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        is_angle: bool,
        delta: f32,
    ) {
        for handle in self.lights.spot_handles() {
            let Some(index) = self.lights.kind_local_index(handle) else {
                continue;
            };
            let Some(light) = self.lights.get_mut(handle) else {
                continue;
            };
            let LightKind::Spot(ref mut params) = light.kind else {
                continue;
            };

            if is_angle {
                let adjusted = params.angle_degrees + delta;
                if !SPOT_ANGLE_RANGE.contains(&adjusted) {
                    warn!(
                        "spot light {} angle {} out of range; not applied",
                        handle, adjusted
                    );
                    continue;
                }
                params.angle_degrees = adjusted;
            } else {
                let adjusted = params.blur + delta;
                if !SPOT_BLUR_RANGE.contains(&adjusted) {
                    warn!(
                        "spot light {} blur {} out of range; not applied",
                        handle, adjusted
                    );
                    continue;
                }
                params.blur = adjusted;
            }

            let (cutoff, blur) = (params.cutoff(), params.shader_blur());
            for model in &mut self.models {
                let shader = model.shader_mut();
                shader.set_float(
                    backend,
                    &format!("u_spotLights[{}].cutoff", index),
                    cutoff,
                );
                shader.set_float(backend, &format!("u_spotLights[{}].blur", index), blur);
            }
        }
    }

    /// Releases every model and texture. The backend must still be alive.
    pub fn destroy<B: GraphicsBackend>(&mut self, backend: &mut B) {
        for model in &mut self.models {
            model.destroy(backend);
        }
        self.models.clear();
        self.textures.destroy(backend);
    }
}
