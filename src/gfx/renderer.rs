//! # Render Engine
//!
//! The top-level facade: owns the backend and the scene, runs the frame
//! loop, and exposes the eight-bit-handle API the rest of an application
//! talks to. A frame clears the framebuffer and then draws every entity
//! with an attached model in arena order, which is insertion order; that
//! ordering is part of the contract, not an implementation detail.

use cgmath::Matrix4;
use log::info;

use crate::gfx::backend::{GraphicsBackend, RenderMode};
use crate::gfx::camera::Camera;
use crate::gfx::error::EngineError;
use crate::gfx::lighting::{LightColour, LightKind};
use crate::gfx::scene::entity::EntityId;
use crate::gfx::scene::scene::Scene;

/// Startup parameters for a [`RenderEngine`].
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub clear_colour: [f32; 4],
    pub render_mode: RenderMode,
    pub aspect_ratio: f32,
    pub fov_v_degrees: f32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            clear_colour: [0.1, 0.1, 0.1, 1.0],
            render_mode: RenderMode::Fill,
            aspect_ratio: 16.0 / 9.0,
            fov_v_degrees: 45.0,
        }
    }
}

/// Backend plus scene, driven one frame at a time.
pub struct RenderEngine<B: GraphicsBackend> {
    backend: B,
    scene: Scene,
    clear_colour: [f32; 4],
    render_mode: RenderMode,
}

impl<B: GraphicsBackend> RenderEngine<B> {
    pub fn new(backend: B, config: RendererConfig) -> Self {
        info!(
            "render engine up: aspect {:.3}, vertical fov {} degrees",
            config.aspect_ratio, config.fov_v_degrees
        );
        let camera = Camera::new(config.fov_v_degrees, config.aspect_ratio);
        let mut engine = Self {
            backend,
            scene: Scene::new(camera),
            clear_colour: config.clear_colour,
            render_mode: config.render_mode,
        };
        engine.backend.set_render_mode(engine.render_mode);
        engine
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    pub fn set_clear_colour(&mut self, colour: [f32; 4]) {
        self.clear_colour = colour;
    }

    /// Switches the rasterizer polygon mode for every subsequent frame.
    pub fn set_render_mode(&mut self, mode: RenderMode) {
        self.render_mode = mode;
        self.backend.set_render_mode(mode);
    }

    /// Loads a model into the scene. See [`Scene::add_model`] for the
    /// light-sync semantics.
    pub fn add_model(&mut self, name: &str, path: &str, shader_path: &str) -> Result<u8, EngineError> {
        self.scene.add_model(&mut self.backend, name, path, shader_path)
    }

    /// Registers a light with a pose entity under `parent`.
    pub fn add_light(
        &mut self,
        parent: EntityId,
        kind: LightKind,
        colour: LightColour,
    ) -> Result<(u8, EntityId), EngineError> {
        self.scene.add_light(parent, kind, colour)
    }

    /// Adjusts every spot light's cone. See [`Scene::modify_all_spotlights`].
    pub fn modify_all_spotlights(&mut self, is_angle: bool, delta: f32) {
        self.scene
            .modify_all_spotlights(&mut self.backend, is_angle, delta);
    }

    /// Renders one frame: clear, then every entity with an attached model,
    /// in arena (insertion) order.
    pub fn draw(&mut self) {
        self.backend.clear(self.clear_colour);

        let world_to_camera = self.scene.camera().world_to_camera();
        let camera_position = self.scene.camera().position();

        // Snapshot the draw list first; drawing needs the models mutably
        // while the graph stays borrowed otherwise.
        let draw_list: Vec<(Matrix4<f32>, u8)> = self
            .scene
            .graph()
            .iter()
            .filter_map(|(id, entity)| {
                entity.model.map(|model| (self.scene.graph().world_matrix(id), model))
            })
            .collect();

        for (world, handle) in draw_list {
            self.draw_model(handle, world, world_to_camera, camera_position.into());
        }
    }

    fn draw_model(
        &mut self,
        handle: u8,
        world: Matrix4<f32>,
        world_to_camera: Matrix4<f32>,
        camera_position: [f32; 3],
    ) {
        let backend = &mut self.backend;
        let Some((model, textures)) = self.scene.model_with_textures_mut(handle) else {
            return;
        };

        let shader = model.shader_mut();
        shader.set_mat4(backend, "u_worldToCamera", world_to_camera);
        shader.set_mat4(backend, "u_model", world);
        shader.set_float3(backend, "u_cameraPos", camera_position.into());

        for (unit, &texture) in model.textures().iter().enumerate() {
            if let Some(texture) = textures.get(texture) {
                backend.bind_texture(unit as u32, texture.id);
            }
        }

        for mesh in model.meshes() {
            backend.draw_indexed(mesh.vertex_buffer(), mesh.index_buffer(), mesh.index_count());
        }
    }

    /// Tears down every scene resource through the backend and returns the
    /// backend to the caller.
    pub fn shutdown(mut self) -> B {
        self.scene.destroy(&mut self.backend);
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;
    use crate::gfx::backend::{BackendCall, RecordingBackend, UniformValue};
    use crate::gfx::resources::mesh::{Mesh, Vertex3D};
    use crate::gfx::scene::entity::ROOT;

    fn engine() -> RenderEngine<RecordingBackend> {
        RenderEngine::new(RecordingBackend::new(), RendererConfig::default())
    }

    fn triangle(backend: &mut RecordingBackend) -> Mesh {
        let vertices = [
            Vertex3D { position: [0.0, 0.0, 0.0], normal: [0.0, 0.0, 1.0], tex_coords: [0.0, 0.0] },
            Vertex3D { position: [1.0, 0.0, 0.0], normal: [0.0, 0.0, 1.0], tex_coords: [1.0, 0.0] },
            Vertex3D { position: [0.0, 1.0, 0.0], normal: [0.0, 0.0, 1.0], tex_coords: [0.0, 1.0] },
        ];
        Mesh::new(backend, &vertices, &[0, 1, 2])
    }

    /// Builds a one-mesh model directly in the scene, bypassing the importer.
    fn add_triangle_model(engine: &mut RenderEngine<RecordingBackend>, name: &str) -> u8 {
        let mesh = triangle(engine.backend_mut());
        let model = crate::gfx::resources::model::Model::from_meshes(
            engine.backend_mut(),
            name,
            vec![mesh],
            "",
        )
        .unwrap();
        let scene = engine.scene_mut();
        scene.push_model_for_tests(model)
    }

    #[test]
    fn a_frame_clears_then_draws_attached_entities_in_order() {
        let mut engine = engine();
        let model = add_triangle_model(&mut engine, "tri");

        let first = engine.scene_mut().graph_mut().spawn(ROOT);
        let second = engine.scene_mut().graph_mut().spawn(ROOT);
        engine.scene_mut().attach_model(first, model);
        engine.scene_mut().attach_model(second, model);

        engine.draw();

        let backend = engine.backend();
        assert_eq!(backend.draw_call_count(), 2);
        let clear_at = backend
            .calls
            .iter()
            .position(|c| matches!(c, BackendCall::Clear(_)))
            .unwrap();
        let first_draw = backend
            .calls
            .iter()
            .position(|c| matches!(c, BackendCall::DrawIndexed { .. }))
            .unwrap();
        assert!(clear_at < first_draw);
    }

    #[test]
    fn entities_without_models_draw_nothing() {
        let mut engine = engine();
        engine.scene_mut().graph_mut().spawn(ROOT);
        engine.draw();
        assert_eq!(engine.backend().draw_call_count(), 0);
        // The clear still happens.
        assert!(engine
            .backend()
            .calls
            .iter()
            .any(|c| matches!(c, BackendCall::Clear(_))));
    }

    #[test]
    fn the_model_uniform_is_the_entity_world_matrix() {
        let mut engine = engine();
        let model = add_triangle_model(&mut engine, "tri");

        let parent = engine.scene_mut().graph_mut().spawn(ROOT);
        let child = engine.scene_mut().graph_mut().spawn(parent);
        {
            let graph = engine.scene_mut().graph_mut();
            graph
                .entity_mut(parent)
                .unwrap()
                .transform
                .set_position(Vector3::new(3.0, 0.0, 0.0));
            graph
                .entity_mut(child)
                .unwrap()
                .transform
                .set_position(Vector3::new(0.0, 4.0, 0.0));
        }
        engine.scene_mut().attach_model(child, model);

        engine.draw();

        let program = engine.scene().model(model).unwrap().shader().program();
        let Some(&UniformValue::Mat4(world)) = engine.backend().uniform(program, "u_model")
        else {
            panic!("u_model not written");
        };
        // Column-major translation column reflects the composed pose.
        assert_eq!(world[3][0], 3.0);
        assert_eq!(world[3][1], 4.0);

        assert!(engine
            .backend()
            .uniform(program, "u_worldToCamera")
            .is_some());
        assert!(engine.backend().uniform(program, "u_cameraPos").is_some());
    }

    #[test]
    fn render_mode_changes_reach_the_backend() {
        let mut engine = engine();
        engine.set_render_mode(RenderMode::Lines);
        engine.set_render_mode(RenderMode::Points);
        let modes: Vec<RenderMode> = engine
            .backend()
            .calls
            .iter()
            .filter_map(|c| match c {
                BackendCall::SetRenderMode(m) => Some(*m),
                _ => None,
            })
            .collect();
        assert_eq!(modes, vec![RenderMode::Fill, RenderMode::Lines, RenderMode::Points]);
    }

    #[test]
    fn shutdown_releases_scene_resources() -> anyhow::Result<()> {
        let mut engine = engine();
        // Missing asset: loads as an empty model, its shader still owns a
        // program that teardown must release.
        let empty = engine.add_model("ghost", "no/such.obj", "")?;
        let tri = add_triangle_model(&mut engine, "tri");

        let empty_program = engine.scene().model(empty).unwrap().shader().program();
        let tri_program = engine.scene().model(tri).unwrap().shader().program();

        let backend = engine.shutdown();
        assert!(backend.calls.contains(&BackendCall::DeleteProgram(empty_program)));
        assert!(backend.calls.contains(&BackendCall::DeleteProgram(tri_program)));
        assert!(backend
            .calls
            .iter()
            .any(|c| matches!(c, BackendCall::DeleteBuffer(_))));
        Ok(())
    }
}
