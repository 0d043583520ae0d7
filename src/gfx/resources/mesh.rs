//! # Mesh
//!
//! An immutable GPU-resident vertex/index buffer pair. Both buffers are
//! uploaded exactly once at construction and never touched again; there is
//! deliberately no mutation API, partial updates are out of scope.

use crate::gfx::backend::{BufferId, GraphicsBackend};

/// Vertex layout shared by every mesh: position, normal, one 2D texcoord set.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3D {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

/// Immutable GPU mesh.
#[derive(Debug)]
pub struct Mesh {
    vertex_buffer: BufferId,
    index_buffer: BufferId,
    index_count: u32,
    vertex_count: u32,
}

impl Mesh {
    /// Uploads the vertex and index data and returns the resident mesh.
    pub fn new<B: GraphicsBackend>(backend: &mut B, vertices: &[Vertex3D], indices: &[u32]) -> Self {
        let vertex_buffer = backend.create_vertex_buffer(bytemuck::cast_slice(vertices));
        let index_buffer = backend.create_index_buffer(bytemuck::cast_slice(indices));
        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            vertex_count: vertices.len() as u32,
        }
    }

    pub fn vertex_buffer(&self) -> BufferId {
        self.vertex_buffer
    }

    pub fn index_buffer(&self) -> BufferId {
        self.index_buffer
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn triangle_count(&self) -> u32 {
        self.index_count / 3
    }

    /// Releases both buffers. The backend must still be alive.
    pub fn destroy<B: GraphicsBackend>(&mut self, backend: &mut B) {
        backend.delete_buffer(self.vertex_buffer);
        backend.delete_buffer(self.index_buffer);
    }
}
