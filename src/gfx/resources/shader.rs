//! # Shader
//!
//! A compiled vertex + fragment program pair identified by a base path:
//! `<path>.vert` and `<path>.frag` are read as plain text and compiled
//! through the backend. Any read or compile failure of a stage substitutes
//! the embedded fallback source for that stage (logged); a failure of the
//! fallback itself, or of the single link attempt, is fatal; there is no
//! second fallback.
//!
//! Every uniform setter makes this shader's program current before writing,
//! so calling any setter changes the globally-current program. That side
//! effect is part of the contract and callers rely on it.

use std::collections::HashMap;
use std::fs;

use cgmath::{Matrix3, Matrix4, Vector2, Vector3, Vector4};
use log::{error, warn};

use crate::gfx::backend::{GraphicsBackend, ProgramId, ShaderStage, UniformLocation};
use crate::gfx::error::EngineError;

/// Embedded vertex stage used when file-based compilation fails.
pub const FALLBACK_VERTEX_SOURCE: &str = "\
#version 330 core
layout (location = 0) in vec3 a_position;
layout (location = 1) in vec3 a_normal;
layout (location = 2) in vec2 a_texCoords;

uniform mat4 u_worldToCamera;

void main() {
    gl_Position = u_worldToCamera * vec4(a_position, 1.0);
}
";

/// Embedded fragment stage used when file-based compilation fails. Solid
/// magenta, so a fallen-back shader is obvious on screen.
pub const FALLBACK_FRAGMENT_SOURCE: &str = "\
#version 330 core
out vec4 FragColor;

void main() {
    FragColor = vec4(1.0, 0.0, 1.0, 1.0);
}
";

fn stage_extension(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => "vert",
        ShaderStage::Fragment => "frag",
    }
}

fn fallback_source(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => FALLBACK_VERTEX_SOURCE,
        ShaderStage::Fragment => FALLBACK_FRAGMENT_SOURCE,
    }
}

/// A linked GPU program plus its uniform-location lookups.
#[derive(Debug)]
pub struct Shader {
    program: ProgramId,
    /// Base path this shader was loaded from; empty means the embedded
    /// fallback program.
    path: String,
    locations: HashMap<String, UniformLocation>,
}

impl Shader {
    /// Compiles and links `<path>.vert` + `<path>.frag`.
    ///
    /// An empty `path` skips the filesystem and builds the embedded fallback
    /// program directly. Per-stage failures degrade to the fallback source;
    /// only the two no-further-fallback cases return an error, and both are
    /// fatal (see [`EngineError::exit_code`]).
    pub fn load<B: GraphicsBackend>(backend: &mut B, path: &str) -> Result<Self, EngineError> {
        let vertex = Self::load_stage(backend, ShaderStage::Vertex, path)?;
        let fragment = match Self::load_stage(backend, ShaderStage::Fragment, path) {
            Ok(id) => id,
            Err(e) => {
                backend.delete_stage(vertex);
                return Err(e);
            }
        };

        // One link attempt; after fallback substitution there is nothing
        // left to retry with. The stages are released either way, the error
        // is returned rather than terminating, so nothing may leak.
        let program = match backend.link_program(vertex, fragment) {
            Ok(program) => program,
            Err(log) => {
                error!("shader program for '{}' failed to link: {}", path, log);
                backend.delete_stage(vertex);
                backend.delete_stage(fragment);
                return Err(EngineError::LinkFailure { log });
            }
        };

        backend.delete_stage(vertex);
        backend.delete_stage(fragment);

        Ok(Self {
            program,
            path: path.to_string(),
            locations: HashMap::new(),
        })
    }

    fn load_stage<B: GraphicsBackend>(
        backend: &mut B,
        stage: ShaderStage,
        path: &str,
    ) -> Result<crate::gfx::backend::StageId, EngineError> {
        let fallback = fallback_source(stage);

        let (source, from_file) = if path.is_empty() {
            (fallback.to_string(), false)
        } else {
            let file = format!("{}.{}", path, stage_extension(stage));
            match fs::read_to_string(&file) {
                Ok(source) => (source, true),
                Err(e) => {
                    warn!(
                        "could not read {:?} shader source {}: {}; using embedded fallback",
                        stage, file, e
                    );
                    (fallback.to_string(), false)
                }
            }
        };

        match backend.compile_stage(stage, &source) {
            Ok(id) => Ok(id),
            Err(log) if from_file => {
                // Recoverable: the on-disk source is replaced by the
                // embedded fallback and the stage is compiled again.
                let failure = EngineError::CompileFailure { stage, log };
                warn!("'{}': {}; retrying with embedded fallback", path, failure);
                backend.compile_stage(stage, fallback).map_err(|log| {
                    error!("embedded fallback {:?} stage failed to compile: {}", stage, log);
                    EngineError::FallbackCompileFailure { stage, log }
                })
            }
            Err(log) => {
                error!("embedded fallback {:?} stage failed to compile: {}", stage, log);
                Err(EngineError::FallbackCompileFailure { stage, log })
            }
        }
    }

    pub fn program(&self) -> ProgramId {
        self.program
    }

    /// Base path the shader was loaded from; empty for the fallback program.
    pub fn path(&self) -> &str {
        &self.path
    }

    fn location<B: GraphicsBackend>(&mut self, backend: &mut B, name: &str) -> UniformLocation {
        if let Some(location) = self.locations.get(name) {
            return *location;
        }
        let location = backend.uniform_location(self.program, name);
        self.locations.insert(name.to_string(), location);
        location
    }

    pub fn set_bool<B: GraphicsBackend>(&mut self, backend: &mut B, name: &str, value: bool) {
        backend.use_program(self.program);
        let location = self.location(backend, name);
        backend.set_uniform_bool(location, value);
    }

    pub fn set_int<B: GraphicsBackend>(&mut self, backend: &mut B, name: &str, value: i32) {
        backend.use_program(self.program);
        let location = self.location(backend, name);
        backend.set_uniform_int(location, value);
    }

    pub fn set_uint<B: GraphicsBackend>(&mut self, backend: &mut B, name: &str, value: u32) {
        backend.use_program(self.program);
        let location = self.location(backend, name);
        backend.set_uniform_uint(location, value);
    }

    pub fn set_float<B: GraphicsBackend>(&mut self, backend: &mut B, name: &str, value: f32) {
        backend.use_program(self.program);
        let location = self.location(backend, name);
        backend.set_uniform_float(location, value);
    }

    pub fn set_float2<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        name: &str,
        value: Vector2<f32>,
    ) {
        backend.use_program(self.program);
        let location = self.location(backend, name);
        backend.set_uniform_float2(location, value.into());
    }

    pub fn set_float3<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        name: &str,
        value: Vector3<f32>,
    ) {
        backend.use_program(self.program);
        let location = self.location(backend, name);
        backend.set_uniform_float3(location, value.into());
    }

    pub fn set_float4<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        name: &str,
        value: Vector4<f32>,
    ) {
        backend.use_program(self.program);
        let location = self.location(backend, name);
        backend.set_uniform_float4(location, value.into());
    }

    pub fn set_mat3<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        name: &str,
        value: Matrix3<f32>,
    ) {
        backend.use_program(self.program);
        let location = self.location(backend, name);
        backend.set_uniform_mat3(location, value.into());
    }

    pub fn set_mat4<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        name: &str,
        value: Matrix4<f32>,
    ) {
        backend.use_program(self.program);
        let location = self.location(backend, name);
        backend.set_uniform_mat4(location, value.into());
    }

    /// Releases the program. The backend must still be alive.
    pub fn destroy<B: GraphicsBackend>(&mut self, backend: &mut B) {
        backend.delete_program(self.program);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::backend::{RecordingBackend, UniformValue};

    #[test]
    fn empty_path_builds_the_embedded_fallback_program() {
        let mut backend = RecordingBackend::new();
        let shader = Shader::load(&mut backend, "").unwrap();
        assert_eq!(shader.path(), "");
    }

    #[test]
    fn missing_files_fall_back_per_stage() {
        let mut backend = RecordingBackend::new();
        // No such files on disk; both stages degrade to the fallback source
        // and the program still links.
        let shader = Shader::load(&mut backend, "no/such/shader");
        assert!(shader.is_ok());
    }

    #[test]
    fn compile_failure_of_the_fallback_is_fatal() {
        let mut backend = RecordingBackend::new();
        backend.fail_compile_unless = Some((ShaderStage::Fragment, Vec::new()));
        let result = Shader::load(&mut backend, "");
        assert!(matches!(
            result,
            Err(EngineError::FallbackCompileFailure {
                stage: ShaderStage::Fragment,
                ..
            })
        ));
    }

    #[test]
    fn file_compile_failure_retries_once_with_the_fallback() {
        let base = std::env::temp_dir().join("cairn_shader_retry");
        let base = base.to_str().unwrap().to_string();
        fs::write(format!("{}.vert", base), "this is not glsl").unwrap();
        fs::write(format!("{}.frag", base), FALLBACK_FRAGMENT_SOURCE).unwrap();

        let mut backend = RecordingBackend::new();
        // Only the embedded fallback source compiles for the vertex stage;
        // the on-disk source fails and is substituted.
        backend.fail_compile_unless = Some((
            ShaderStage::Vertex,
            vec![FALLBACK_VERTEX_SOURCE.to_string()],
        ));
        let shader = Shader::load(&mut backend, &base).unwrap();
        assert_eq!(shader.path(), base);

        let vertex_compiles = backend
            .calls
            .iter()
            .filter(|c| matches!(c, crate::gfx::backend::BackendCall::CompileStage(ShaderStage::Vertex)))
            .count();
        assert_eq!(vertex_compiles, 2);
    }

    #[test]
    fn link_failure_is_fatal_with_a_distinct_exit_code() {
        let mut backend = RecordingBackend::new();
        backend.fail_link = true;
        let result = Shader::load(&mut backend, "");
        let err = result.unwrap_err();
        assert!(matches!(err, EngineError::LinkFailure { .. }));
        assert_eq!(err.exit_code(), Some(crate::gfx::error::EXIT_LINK_FAILURE));
    }

    #[test]
    fn link_failure_releases_both_compiled_stages() {
        let mut backend = RecordingBackend::new();
        backend.fail_link = true;
        assert!(Shader::load(&mut backend, "").is_err());

        let deletes = backend
            .calls
            .iter()
            .filter(|c| matches!(c, crate::gfx::backend::BackendCall::DeleteStage(_)))
            .count();
        assert_eq!(deletes, 2);
    }

    #[test]
    fn fragment_stage_failure_releases_the_vertex_stage() {
        let mut backend = RecordingBackend::new();
        backend.fail_compile_unless = Some((ShaderStage::Fragment, Vec::new()));
        assert!(Shader::load(&mut backend, "").is_err());

        let deletes = backend
            .calls
            .iter()
            .filter(|c| matches!(c, crate::gfx::backend::BackendCall::DeleteStage(_)))
            .count();
        assert_eq!(deletes, 1);
    }

    #[test]
    fn uniform_setters_rebind_the_program() {
        let mut backend = RecordingBackend::new();
        let mut first = Shader::load(&mut backend, "").unwrap();
        let mut second = Shader::load(&mut backend, "").unwrap();

        first.set_float(&mut backend, "u_time", 1.0);
        assert_eq!(backend.current_program(), Some(first.program()));

        second.set_int(&mut backend, "u_frame", 3);
        assert_eq!(backend.current_program(), Some(second.program()));
        assert_eq!(
            backend.uniform(second.program(), "u_frame"),
            Some(&UniformValue::Int(3))
        );
    }
}
