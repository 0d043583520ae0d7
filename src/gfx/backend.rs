//! # Graphics Backend Abstraction
//!
//! The engine core never talks to a GPU driver directly. Every buffer,
//! texture, shader, and draw operation goes through the [`GraphicsBackend`]
//! trait, which exposes exactly the primitive operations the resource and
//! rendering layers consume. A production implementation wraps a real driver;
//! [`RecordingBackend`] is a headless implementation that logs every call so
//! resource bookkeeping can be exercised without a device.
//!
//! Execution is single-threaded and synchronous: every backend call runs to
//! completion on the calling thread. Implementations are not required to be
//! `Send` or `Sync`.

use std::collections::HashMap;

/// Handle to a GPU buffer (vertex or index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u64);

/// Handle to a GPU texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

/// Handle to a compiled shader stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StageId(pub u64);

/// Handle to a linked shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u64);

/// Location of a named uniform within a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// Shader pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Rasterizer polygon mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Points,
    Lines,
    Fill,
}

/// A value written to a uniform, as recorded by [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Bool(bool),
    Int(i32),
    Uint(u32),
    Float(f32),
    Float2([f32; 2]),
    Float3([f32; 3]),
    Float4([f32; 4]),
    Mat3([[f32; 3]; 3]),
    Mat4([[f32; 4]; 4]),
}

/// Primitive GPU operations consumed by the resource and rendering layers.
///
/// The driver behind this trait must already be initialized when any method
/// is called, including the `delete_*` methods at teardown.
pub trait GraphicsBackend {
    /// Uploads vertex data and returns a handle to the new buffer.
    fn create_vertex_buffer(&mut self, data: &[u8]) -> BufferId;

    /// Uploads index data and returns a handle to the new buffer.
    fn create_index_buffer(&mut self, data: &[u8]) -> BufferId;

    /// Releases a buffer.
    fn delete_buffer(&mut self, buffer: BufferId);

    /// Creates an empty texture object.
    fn create_texture(&mut self) -> TextureId;

    /// Binds a texture to a texture unit.
    fn bind_texture(&mut self, unit: u32, texture: TextureId);

    /// Applies the engine's wrap and filter parameters to the bound texture.
    fn set_texture_parameters(&mut self);

    /// Uploads RGBA8 texels to the bound texture.
    fn upload_texture(&mut self, texture: TextureId, width: u32, height: u32, texels: &[u8]);

    /// Generates the mipmap chain for the bound texture.
    fn generate_mipmaps(&mut self, texture: TextureId);

    /// Releases a texture.
    fn delete_texture(&mut self, texture: TextureId);

    /// Compiles a shader stage from source. `Err` carries the compiler log.
    fn compile_stage(&mut self, stage: ShaderStage, source: &str) -> Result<StageId, String>;

    /// Links a vertex and fragment stage into a program. `Err` carries the
    /// linker log.
    fn link_program(&mut self, vertex: StageId, fragment: StageId) -> Result<ProgramId, String>;

    /// Releases a compiled stage (safe once linked into a program).
    fn delete_stage(&mut self, stage: StageId);

    /// Releases a linked program.
    fn delete_program(&mut self, program: ProgramId);

    /// Makes a program the globally-current one.
    fn use_program(&mut self, program: ProgramId);

    /// Looks up the location of a named uniform in a program.
    fn uniform_location(&mut self, program: ProgramId, name: &str) -> UniformLocation;

    fn set_uniform_bool(&mut self, location: UniformLocation, value: bool);
    fn set_uniform_int(&mut self, location: UniformLocation, value: i32);
    fn set_uniform_uint(&mut self, location: UniformLocation, value: u32);
    fn set_uniform_float(&mut self, location: UniformLocation, value: f32);
    fn set_uniform_float2(&mut self, location: UniformLocation, value: [f32; 2]);
    fn set_uniform_float3(&mut self, location: UniformLocation, value: [f32; 3]);
    fn set_uniform_float4(&mut self, location: UniformLocation, value: [f32; 4]);
    fn set_uniform_mat3(&mut self, location: UniformLocation, value: [[f32; 3]; 3]);
    fn set_uniform_mat4(&mut self, location: UniformLocation, value: [[f32; 4]; 4]);

    /// Clears the framebuffer to the given colour.
    fn clear(&mut self, colour: [f32; 4]);

    /// Selects the rasterizer polygon mode.
    fn set_render_mode(&mut self, mode: RenderMode);

    /// Issues an indexed draw call for a vertex/index buffer pair.
    fn draw_indexed(&mut self, vertex_buffer: BufferId, index_buffer: BufferId, index_count: u32);
}

/// A coarse log entry for one backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    CreateVertexBuffer(BufferId),
    CreateIndexBuffer(BufferId),
    DeleteBuffer(BufferId),
    CreateTexture(TextureId),
    BindTexture { unit: u32, texture: TextureId },
    SetTextureParameters,
    UploadTexture { texture: TextureId, width: u32, height: u32 },
    GenerateMipmaps(TextureId),
    DeleteTexture(TextureId),
    CompileStage(ShaderStage),
    LinkProgram(ProgramId),
    DeleteStage(StageId),
    DeleteProgram(ProgramId),
    UseProgram(ProgramId),
    SetUniform { program: ProgramId, name: String, value: UniformValue },
    Clear([f32; 4]),
    SetRenderMode(RenderMode),
    DrawIndexed { vertex_buffer: BufferId, index_buffer: BufferId, index_count: u32 },
}

/// Headless backend that records every call instead of driving a GPU.
///
/// Hands out sequential handles, remembers which program is current, and
/// keeps the last value written to each (program, uniform name) pair. The
/// `fail_*` fields inject compile/link failures for exercising the shader
/// fallback paths.
#[derive(Default)]
pub struct RecordingBackend {
    next_id: u64,
    current_program: Option<ProgramId>,
    locations: HashMap<(ProgramId, String), UniformLocation>,
    location_names: HashMap<UniformLocation, (ProgramId, String)>,
    uniforms: HashMap<(ProgramId, String), UniformValue>,
    /// Full call log, in order.
    pub calls: Vec<BackendCall>,
    /// When set, every `compile_stage` call for this stage fails unless the
    /// source is one of the given strings.
    pub fail_compile_unless: Option<(ShaderStage, Vec<String>)>,
    /// When true, every `link_program` call fails.
    pub fail_link: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn record_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        let (program, name) = self.location_names[&location].clone();
        self.uniforms.insert((program, name.clone()), value.clone());
        self.calls.push(BackendCall::SetUniform { program, name, value });
    }

    /// Total number of texel uploads issued, across all textures.
    pub fn texture_upload_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, BackendCall::UploadTexture { .. }))
            .count()
    }

    /// Last value written to a uniform of the given name on the given program.
    pub fn uniform(&self, program: ProgramId, name: &str) -> Option<&UniformValue> {
        self.uniforms.get(&(program, name.to_string()))
    }

    /// Names of every uniform ever written whose name starts with `prefix`.
    pub fn uniform_names_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .uniforms
            .keys()
            .filter(|(_, name)| name.starts_with(prefix))
            .map(|(_, name)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Number of indexed draw calls issued.
    pub fn draw_call_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, BackendCall::DrawIndexed { .. }))
            .count()
    }

    /// The program made current by the most recent `use_program` call.
    pub fn current_program(&self) -> Option<ProgramId> {
        self.current_program
    }
}

impl GraphicsBackend for RecordingBackend {
    fn create_vertex_buffer(&mut self, _data: &[u8]) -> BufferId {
        let id = BufferId(self.next());
        self.calls.push(BackendCall::CreateVertexBuffer(id));
        id
    }

    fn create_index_buffer(&mut self, _data: &[u8]) -> BufferId {
        let id = BufferId(self.next());
        self.calls.push(BackendCall::CreateIndexBuffer(id));
        id
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.calls.push(BackendCall::DeleteBuffer(buffer));
    }

    fn create_texture(&mut self) -> TextureId {
        let id = TextureId(self.next());
        self.calls.push(BackendCall::CreateTexture(id));
        id
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        self.calls.push(BackendCall::BindTexture { unit, texture });
    }

    fn set_texture_parameters(&mut self) {
        self.calls.push(BackendCall::SetTextureParameters);
    }

    fn upload_texture(&mut self, texture: TextureId, width: u32, height: u32, _texels: &[u8]) {
        self.calls.push(BackendCall::UploadTexture { texture, width, height });
    }

    fn generate_mipmaps(&mut self, texture: TextureId) {
        self.calls.push(BackendCall::GenerateMipmaps(texture));
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.calls.push(BackendCall::DeleteTexture(texture));
    }

    fn compile_stage(&mut self, stage: ShaderStage, source: &str) -> Result<StageId, String> {
        self.calls.push(BackendCall::CompileStage(stage));
        if let Some((failing_stage, allowed)) = &self.fail_compile_unless {
            if *failing_stage == stage && !allowed.iter().any(|s| s == source) {
                return Err(format!("injected compile failure for {:?} stage", stage));
            }
        }
        Ok(StageId(self.next()))
    }

    fn link_program(&mut self, _vertex: StageId, _fragment: StageId) -> Result<ProgramId, String> {
        if self.fail_link {
            return Err("injected link failure".to_string());
        }
        let id = ProgramId(self.next());
        self.calls.push(BackendCall::LinkProgram(id));
        Ok(id)
    }

    fn delete_stage(&mut self, stage: StageId) {
        self.calls.push(BackendCall::DeleteStage(stage));
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.calls.push(BackendCall::DeleteProgram(program));
    }

    fn use_program(&mut self, program: ProgramId) {
        self.current_program = Some(program);
        self.calls.push(BackendCall::UseProgram(program));
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> UniformLocation {
        if let Some(location) = self.locations.get(&(program, name.to_string())) {
            return *location;
        }
        let location = UniformLocation(self.next() as u32);
        self.locations.insert((program, name.to_string()), location);
        self.location_names.insert(location, (program, name.to_string()));
        location
    }

    fn set_uniform_bool(&mut self, location: UniformLocation, value: bool) {
        self.record_uniform(location, UniformValue::Bool(value));
    }

    fn set_uniform_int(&mut self, location: UniformLocation, value: i32) {
        self.record_uniform(location, UniformValue::Int(value));
    }

    fn set_uniform_uint(&mut self, location: UniformLocation, value: u32) {
        self.record_uniform(location, UniformValue::Uint(value));
    }

    fn set_uniform_float(&mut self, location: UniformLocation, value: f32) {
        self.record_uniform(location, UniformValue::Float(value));
    }

    fn set_uniform_float2(&mut self, location: UniformLocation, value: [f32; 2]) {
        self.record_uniform(location, UniformValue::Float2(value));
    }

    fn set_uniform_float3(&mut self, location: UniformLocation, value: [f32; 3]) {
        self.record_uniform(location, UniformValue::Float3(value));
    }

    fn set_uniform_float4(&mut self, location: UniformLocation, value: [f32; 4]) {
        self.record_uniform(location, UniformValue::Float4(value));
    }

    fn set_uniform_mat3(&mut self, location: UniformLocation, value: [[f32; 3]; 3]) {
        self.record_uniform(location, UniformValue::Mat3(value));
    }

    fn set_uniform_mat4(&mut self, location: UniformLocation, value: [[f32; 4]; 4]) {
        self.record_uniform(location, UniformValue::Mat4(value));
    }

    fn clear(&mut self, colour: [f32; 4]) {
        self.calls.push(BackendCall::Clear(colour));
    }

    fn set_render_mode(&mut self, mode: RenderMode) {
        self.calls.push(BackendCall::SetRenderMode(mode));
    }

    fn draw_indexed(&mut self, vertex_buffer: BufferId, index_buffer: BufferId, index_count: u32) {
        self.calls.push(BackendCall::DrawIndexed {
            vertex_buffer,
            index_buffer,
            index_count,
        });
    }
}
