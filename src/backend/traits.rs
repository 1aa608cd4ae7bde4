//! Core GPU backend abstraction
//!
//! The renderer never talks to a graphics API directly. `GpuBackend` exposes
//! the device surface the passes need: render target binding (including MRT
//! and cube faces), clears, pipeline state objects, vertex/index streams with
//! per-instance step modes, named shader parameters and techniques, and
//! indexed/instanced draws. Shader programs are opaque; their source lives
//! with the content pipeline, not here.

use crate::backend::types::*;
use glam::{Mat4, Vec2, Vec3, Vec4};
use thiserror::Error;

/// Backend error type
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to create buffer: {0}")]
    BufferCreationFailed(String),
    #[error("failed to create render target: {0}")]
    TargetCreationFailed(String),
    #[error("failed to create texture: {0}")]
    TextureCreationFailed(String),
    #[error("failed to create shader program: {0}")]
    ShaderCreationFailed(String),
    #[error("out of memory")]
    OutOfMemory,
    #[error("device lost")]
    DeviceLost,
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Handle to a GPU buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub(crate) u64);

/// Handle to a GPU render target (2D or cube)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetHandle(pub(crate) u64);

/// Handle to a sampled texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub(crate) u64);

/// Handle to an opaque shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub(crate) u64);

/// A value bound to a named shader parameter
#[derive(Debug, Clone, Copy)]
pub enum ShaderParam<'a> {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
    FloatArray(&'a [f32]),
    Vec2Array(&'a [Vec2]),
    Vec4Array(&'a [Vec4]),
    Mat4Array(&'a [Mat4]),
    /// Bind a render target's color surface as a texture input
    Target(TargetHandle),
    Texture(TextureHandle),
}

/// Main graphics backend trait
///
/// Resource creation is fallible; state changes and draws follow submission
/// order and are assumed complete by the time a dependent pass samples the
/// written target (the device's own pipelining is opaque to this layer).
pub trait GpuBackend {
    // Resource creation

    /// Create an uninitialized buffer
    fn create_buffer(&mut self, desc: &BufferDescriptor) -> BackendResult<BufferHandle>;

    /// Create a buffer with initial data
    fn create_buffer_init(
        &mut self,
        desc: &BufferDescriptor,
        data: &[u8],
    ) -> BackendResult<BufferHandle>;

    /// Write data into an existing buffer
    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]);

    /// Create a render target
    fn create_target(&mut self, desc: &TargetDescriptor) -> BackendResult<TargetHandle>;

    /// Destroy a render target
    fn destroy_target(&mut self, target: TargetHandle);

    /// Create a sampled texture with initial pixel data
    fn create_texture(
        &mut self,
        desc: &TextureDescriptor,
        data: &[u8],
    ) -> BackendResult<TextureHandle>;

    /// Create an opaque shader program identified by a label
    fn create_shader(&mut self, label: &str) -> BackendResult<ShaderHandle>;

    // Render target and pipeline state

    /// Bind one or more render targets for writing (multiple render targets
    /// share the first target's depth buffer)
    fn set_render_targets(&mut self, targets: &[TargetHandle]);

    /// Bind a single face of a cube render target for writing
    fn set_render_target_cube(&mut self, target: TargetHandle, face: CubeFace);

    /// Clear the bound targets' color and/or depth
    fn clear(&mut self, color: Option<[f32; 4]>, depth: Option<f32>);

    fn set_blend_state(&mut self, state: BlendState);

    fn set_depth_state(&mut self, state: DepthStencilState);

    fn set_rasterizer_state(&mut self, state: RasterizerState);

    /// Get the active viewport
    fn viewport(&self) -> Viewport;

    /// Adjust the active viewport sub-rectangle and depth range
    fn set_viewport(&mut self, viewport: Viewport);

    // Geometry

    /// Bind vertex buffer streams; per-instance streams advance once per
    /// drawn instance
    fn set_vertex_buffers(&mut self, bindings: &[(BufferHandle, VertexStepMode)]);

    fn set_index_buffer(&mut self, buffer: BufferHandle, format: IndexFormat);

    // Shader plumbing

    /// Set a named parameter on a shader program
    fn set_param(&mut self, shader: ShaderHandle, name: &str, value: ShaderParam);

    /// Select a named technique within a shader program
    fn set_technique(&mut self, shader: ShaderHandle, technique: &str);

    /// Apply a pass of the current technique, committing parameter state
    fn apply_pass(&mut self, shader: ShaderHandle, pass: u32);

    // Draws

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, base_vertex: i32);

    fn draw_indexed_instanced(
        &mut self,
        index_count: u32,
        first_index: u32,
        base_vertex: i32,
        instance_count: u32,
    );

    /// Indexed line-list draw, used for debug geometry
    fn draw_indexed_lines(&mut self, index_count: u32, first_index: u32, base_vertex: i32);
}
