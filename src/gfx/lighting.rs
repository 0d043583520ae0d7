//! # Light Registry
//!
//! Registered lights of three kinds (directional, point, spot), capped at
//! [`MAX_LIGHTS`] so handles fit in eight bits. A light's pose lives on its
//! scene-graph entity: direction is the entity's forward axis, position its
//! translation. The registry itself only stores photometric data.
//!
//! Shader synchronization writes each light into a kind-local uniform array
//! slot: the second point light lands in `u_pointLights[1]` regardless of
//! how many directional or spot lights were registered before it. Spot
//! cone parameters are pushed in derived form, the shader never sees the
//! raw angle or blur fraction.

use cgmath::Vector3;
use log::warn;

use crate::gfx::backend::GraphicsBackend;
use crate::gfx::error::EngineError;
use crate::gfx::resources::shader::Shader;
use crate::gfx::scene::entity::{EntityId, SceneGraph};

/// Hard cap on registered lights; handles are `u8`.
pub const MAX_LIGHTS: usize = 255;

/// Phong colour triple shared by every light kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightColour {
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
}

impl LightColour {
    pub fn uniform(intensity: f32) -> Self {
        let v = Vector3::new(intensity, intensity, intensity);
        Self { ambient: v, diffuse: v, specular: v }
    }
}

/// Distance attenuation coefficients for point and spot lights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Falloff {
    pub linear: f32,
    pub quadratic: f32,
}

/// Cone shape of a spot light, in source form. The shader receives the
/// derived cutoff/blur values, not these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotParams {
    pub falloff: Falloff,
    /// Half-angle of the cone, in degrees.
    pub angle_degrees: f32,
    /// Edge softness fraction, nominally in [0, 1].
    pub blur: f32,
}

impl SpotParams {
    /// Cosine of the cone half-angle, as sampled by the shader.
    pub fn cutoff(&self) -> f32 {
        self.angle_degrees.to_radians().cos()
    }

    /// Shader-side blur term: `sin(radians(90 * blur))`.
    pub fn shader_blur(&self) -> f32 {
        (90.0 * self.blur).to_radians().sin()
    }
}

/// The kind tag, carrying kind-specific parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Directional,
    Point(Falloff),
    Spot(SpotParams),
}

impl LightKind {
    /// Name of the shader uniform array this kind lands in.
    pub fn uniform_array(&self) -> &'static str {
        match self {
            LightKind::Directional => "u_dirLights",
            LightKind::Point(_) => "u_pointLights",
            LightKind::Spot(_) => "u_spotLights",
        }
    }

    fn same_kind(&self, other: &LightKind) -> bool {
        matches!(
            (self, other),
            (LightKind::Directional, LightKind::Directional)
                | (LightKind::Point(_), LightKind::Point(_))
                | (LightKind::Spot(_), LightKind::Spot(_))
        )
    }
}

/// One registered light. Pose comes from `entity`; an optional attached
/// model visualizes the light in the scene.
#[derive(Debug)]
pub struct Light {
    pub kind: LightKind,
    pub colour: LightColour,
    pub entity: EntityId,
    pub model: Option<u8>,
}

/// Registry of every light in a scene.
#[derive(Default)]
pub struct LightRegistry {
    lights: Vec<Light>,
}

impl LightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    /// True while another light can still be registered.
    pub fn has_capacity(&self) -> bool {
        self.lights.len() < MAX_LIGHTS
    }

    /// Registers a light and returns its handle. The 256th registration
    /// fails cleanly, leaving the registry unchanged.
    pub fn add(&mut self, light: Light) -> Result<u8, EngineError> {
        if !self.has_capacity() {
            return Err(EngineError::ResourceLimit {
                resource: "light registry",
                limit: MAX_LIGHTS,
            });
        }
        self.lights.push(light);
        Ok((self.lights.len() - 1) as u8)
    }

    pub fn get(&self, handle: u8) -> Option<&Light> {
        let light = self.lights.get(handle as usize);
        if light.is_none() {
            warn!("light lookup out of range: {}", handle);
        }
        light
    }

    pub fn get_mut(&mut self, handle: u8) -> Option<&mut Light> {
        let light = self.lights.get_mut(handle as usize);
        if light.is_none() {
            warn!("light lookup out of range: {}", handle);
        }
        light
    }

    /// Handles of every spot light, in registration order.
    pub fn spot_handles(&self) -> Vec<u8> {
        self.lights
            .iter()
            .enumerate()
            .filter(|(_, l)| matches!(l.kind, LightKind::Spot(_)))
            .map(|(i, _)| i as u8)
            .collect()
    }

    /// Index of `handle` among lights of its own kind. This is the slot the
    /// light occupies in its uniform array.
    pub fn kind_local_index(&self, handle: u8) -> Option<usize> {
        let target = self.lights.get(handle as usize)?;
        Some(
            self.lights[..handle as usize]
                .iter()
                .filter(|l| l.kind.same_kind(&target.kind))
                .count(),
        )
    }

    /// Writes every registered light into `shader`, each at its kind-local
    /// array slot. Poses are read from `graph` at call time.
    pub fn load_into_shader<B: GraphicsBackend>(
        &self,
        graph: &SceneGraph,
        shader: &mut Shader,
        backend: &mut B,
    ) {
        let mut dir_count = 0;
        let mut point_count = 0;
        let mut spot_count = 0;
        for light in &self.lights {
            let index = match light.kind {
                LightKind::Directional => {
                    dir_count += 1;
                    dir_count - 1
                }
                LightKind::Point(_) => {
                    point_count += 1;
                    point_count - 1
                }
                LightKind::Spot(_) => {
                    spot_count += 1;
                    spot_count - 1
                }
            };
            self.write_light(light, index, graph, shader, backend);
        }
    }

    /// Writes one light's full uniform block at the given kind-local slot.
    pub fn write_light<B: GraphicsBackend>(
        &self,
        light: &Light,
        kind_local_index: usize,
        graph: &SceneGraph,
        shader: &mut Shader,
        backend: &mut B,
    ) {
        let Some(entity) = graph.entity(light.entity) else {
            warn!("light references a missing entity {:?}; skipped", light.entity);
            return;
        };
        let prefix = format!("{}[{}]", light.kind.uniform_array(), kind_local_index);

        shader.set_float3(backend, &format!("{}.colour.ambient", prefix), light.colour.ambient);
        shader.set_float3(backend, &format!("{}.colour.diffuse", prefix), light.colour.diffuse);
        shader.set_float3(backend, &format!("{}.colour.specular", prefix), light.colour.specular);

        match light.kind {
            LightKind::Directional => {
                shader.set_float3(
                    backend,
                    &format!("{}.direction", prefix),
                    entity.transform.forward(),
                );
            }
            LightKind::Point(falloff) => {
                shader.set_float3(
                    backend,
                    &format!("{}.position", prefix),
                    entity.transform.position(),
                );
                shader.set_float(backend, &format!("{}.linear", prefix), falloff.linear);
                shader.set_float(backend, &format!("{}.quadratic", prefix), falloff.quadratic);
            }
            LightKind::Spot(params) => {
                shader.set_float3(
                    backend,
                    &format!("{}.position", prefix),
                    entity.transform.position(),
                );
                shader.set_float3(
                    backend,
                    &format!("{}.direction", prefix),
                    entity.transform.forward(),
                );
                shader.set_float(backend, &format!("{}.linear", prefix), params.falloff.linear);
                shader.set_float(
                    backend,
                    &format!("{}.quadratic", prefix),
                    params.falloff.quadratic,
                );
                shader.set_float(backend, &format!("{}.cutoff", prefix), params.cutoff());
                shader.set_float(backend, &format!("{}.blur", prefix), params.shader_blur());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::gfx::backend::{RecordingBackend, UniformValue};
    use crate::gfx::scene::entity::ROOT;

    fn white() -> LightColour {
        LightColour::uniform(1.0)
    }

    fn spot(angle_degrees: f32, blur: f32) -> LightKind {
        LightKind::Spot(SpotParams {
            falloff: Falloff { linear: 0.09, quadratic: 0.032 },
            angle_degrees,
            blur,
        })
    }

    #[test]
    fn one_light_of_each_kind_lands_in_slot_zero() {
        let mut backend = RecordingBackend::new();
        let mut shader = Shader::load(&mut backend, "").unwrap();
        let mut graph = SceneGraph::new();
        let mut lights = LightRegistry::new();

        for kind in [
            LightKind::Directional,
            LightKind::Point(Falloff { linear: 0.09, quadratic: 0.032 }),
            spot(13.0, 0.23),
        ] {
            let entity = graph.spawn(ROOT);
            lights
                .add(Light { kind, colour: white(), entity, model: None })
                .unwrap();
        }

        lights.load_into_shader(&graph, &mut shader, &mut backend);

        // Kind-local indexing: each array is written only at [0].
        for array in ["u_dirLights", "u_pointLights", "u_spotLights"] {
            let written = backend.uniform_names_with_prefix(array);
            assert!(!written.is_empty(), "{} untouched", array);
            assert!(
                written.iter().all(|n| n.starts_with(&format!("{}[0]", array))),
                "{} written past slot zero: {:?}",
                array,
                written
            );
        }
    }

    #[test]
    fn spot_cone_uniforms_are_pushed_in_derived_form() {
        let mut backend = RecordingBackend::new();
        let mut shader = Shader::load(&mut backend, "").unwrap();
        let mut graph = SceneGraph::new();
        let mut lights = LightRegistry::new();

        let entity = graph.spawn(ROOT);
        lights
            .add(Light { kind: spot(13.0, 0.23), colour: white(), entity, model: None })
            .unwrap();
        lights.load_into_shader(&graph, &mut shader, &mut backend);

        let program = shader.program();
        let Some(&UniformValue::Float(cutoff)) = backend.uniform(program, "u_spotLights[0].cutoff")
        else {
            panic!("cutoff not written");
        };
        let Some(&UniformValue::Float(blur)) = backend.uniform(program, "u_spotLights[0].blur")
        else {
            panic!("blur not written");
        };
        assert_relative_eq!(cutoff, 13.0_f32.to_radians().cos(), epsilon = 1e-6);
        assert_relative_eq!(blur, (90.0_f32 * 0.23).to_radians().sin(), epsilon = 1e-6);
    }

    #[test]
    fn direction_comes_from_the_pose_entity() {
        let mut backend = RecordingBackend::new();
        let mut shader = Shader::load(&mut backend, "").unwrap();
        let mut graph = SceneGraph::new();
        let mut lights = LightRegistry::new();

        let entity = graph.spawn(ROOT);
        graph
            .entity_mut(entity)
            .unwrap()
            .transform
            .set_forward(Vector3::new(1.0, 0.0, 0.0));
        lights
            .add(Light { kind: LightKind::Directional, colour: white(), entity, model: None })
            .unwrap();
        lights.load_into_shader(&graph, &mut shader, &mut backend);

        assert_eq!(
            backend.uniform(shader.program(), "u_dirLights[0].direction"),
            Some(&UniformValue::Float3([1.0, 0.0, 0.0]))
        );
    }

    #[test]
    fn kind_local_index_counts_only_the_same_kind() {
        let mut graph = SceneGraph::new();
        let mut lights = LightRegistry::new();
        let falloff = Falloff { linear: 0.09, quadratic: 0.032 };

        let kinds = [
            LightKind::Directional,
            LightKind::Point(falloff),
            LightKind::Directional,
            spot(20.0, 0.1),
            LightKind::Point(falloff),
        ];
        let handles: Vec<u8> = kinds
            .into_iter()
            .map(|kind| {
                let entity = graph.spawn(ROOT);
                lights
                    .add(Light { kind, colour: white(), entity, model: None })
                    .unwrap()
            })
            .collect();

        assert_eq!(lights.kind_local_index(handles[0]), Some(0));
        assert_eq!(lights.kind_local_index(handles[1]), Some(0));
        assert_eq!(lights.kind_local_index(handles[2]), Some(1));
        assert_eq!(lights.kind_local_index(handles[3]), Some(0));
        assert_eq!(lights.kind_local_index(handles[4]), Some(1));
        assert_eq!(lights.spot_handles(), vec![handles[3]]);
    }

    #[test]
    fn the_two_hundred_fifty_sixth_light_fails_cleanly() {
        let mut graph = SceneGraph::new();
        let mut lights = LightRegistry::new();
        for _ in 0..MAX_LIGHTS {
            let entity = graph.spawn(ROOT);
            lights
                .add(Light {
                    kind: LightKind::Directional,
                    colour: white(),
                    entity,
                    model: None,
                })
                .unwrap();
        }
        assert!(!lights.has_capacity());

        let entity = graph.spawn(ROOT);
        let overflow = lights.add(Light {
            kind: LightKind::Directional,
            colour: white(),
            entity,
            model: None,
        });
        assert!(matches!(
            overflow,
            Err(EngineError::ResourceLimit { limit: 255, .. })
        ));
        assert_eq!(lights.len(), MAX_LIGHTS);
    }
}
