//! Fullscreen quad helper

use crate::backend::traits::*;
use crate::backend::types::*;
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct QuadVertex {
    position: Vec3,
    uv: Vec2,
}

fn quad_vertices(depth: f32) -> [QuadVertex; 4] {
    [
        QuadVertex {
            position: Vec3::new(1.0, -1.0, depth),
            uv: Vec2::new(1.0, 1.0),
        },
        QuadVertex {
            position: Vec3::new(-1.0, -1.0, depth),
            uv: Vec2::new(0.0, 1.0),
        },
        QuadVertex {
            position: Vec3::new(-1.0, 1.0, depth),
            uv: Vec2::new(0.0, 0.0),
        },
        QuadVertex {
            position: Vec3::new(1.0, 1.0, depth),
            uv: Vec2::new(1.0, 0.0),
        },
    ]
}

const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];

/// Screen-covering quad used by every image-space pass
pub struct ScreenQuad {
    vertex_buffer: BufferHandle,
    index_buffer: BufferHandle,
}

impl ScreenQuad {
    pub fn new(backend: &mut dyn GpuBackend) -> BackendResult<Self> {
        let vertices = quad_vertices(0.0);
        let vertex_buffer = backend.create_buffer_init(
            &BufferDescriptor {
                label: Some("screen_quad.vertices".to_string()),
                size: std::mem::size_of_val(&vertices) as u64,
                usage: BufferUsage::VERTEX | BufferUsage::COPY_DST,
            },
            bytemuck::cast_slice(&vertices),
        )?;
        let index_buffer = backend.create_buffer_init(
            &BufferDescriptor {
                label: Some("screen_quad.indices".to_string()),
                size: std::mem::size_of_val(&QUAD_INDICES) as u64,
                usage: BufferUsage::INDEX,
            },
            bytemuck::cast_slice(&QUAD_INDICES),
        )?;
        Ok(Self {
            vertex_buffer,
            index_buffer,
        })
    }

    /// Draw the quad at depth zero
    pub fn draw(&self, backend: &mut dyn GpuBackend) {
        backend.set_vertex_buffers(&[(self.vertex_buffer, VertexStepMode::Vertex)]);
        backend.set_index_buffer(self.index_buffer, IndexFormat::Uint16);
        backend.draw_indexed(QUAD_INDICES.len() as u32, 0, 0);
    }

    /// Draw the quad at an explicit depth (layered accumulation passes)
    pub fn draw_at_depth(&self, backend: &mut dyn GpuBackend, depth: f32) {
        let vertices = quad_vertices(depth);
        backend.write_buffer(self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));
        self.draw(backend);
    }
}
