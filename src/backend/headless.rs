//! Headless backend implementation
//!
//! Allocates handles from counters and records every state change and draw
//! into a command log instead of touching a device. Integration tests assert
//! on the recorded stream; the log can also be inspected to debug pass
//! ordering without a GPU.

use crate::backend::traits::*;
use crate::backend::types::*;
use glam::{Mat4, Vec2, Vec3, Vec4};
use std::collections::HashMap;

/// Owned snapshot of a shader parameter value
#[derive(Debug, Clone)]
pub enum RecordedParam {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
    FloatArray(Vec<f32>),
    Vec2Array(Vec<Vec2>),
    Vec4Array(Vec<Vec4>),
    Mat4Array(Vec<Mat4>),
    Target(TargetHandle),
    Texture(TextureHandle),
}

impl From<ShaderParam<'_>> for RecordedParam {
    fn from(value: ShaderParam<'_>) -> Self {
        match value {
            ShaderParam::Bool(v) => RecordedParam::Bool(v),
            ShaderParam::Int(v) => RecordedParam::Int(v),
            ShaderParam::Float(v) => RecordedParam::Float(v),
            ShaderParam::Vec2(v) => RecordedParam::Vec2(v),
            ShaderParam::Vec3(v) => RecordedParam::Vec3(v),
            ShaderParam::Vec4(v) => RecordedParam::Vec4(v),
            ShaderParam::Mat4(v) => RecordedParam::Mat4(v),
            ShaderParam::FloatArray(v) => RecordedParam::FloatArray(v.to_vec()),
            ShaderParam::Vec2Array(v) => RecordedParam::Vec2Array(v.to_vec()),
            ShaderParam::Vec4Array(v) => RecordedParam::Vec4Array(v.to_vec()),
            ShaderParam::Mat4Array(v) => RecordedParam::Mat4Array(v.to_vec()),
            ShaderParam::Target(v) => RecordedParam::Target(v),
            ShaderParam::Texture(v) => RecordedParam::Texture(v),
        }
    }
}

/// Recorded backend command
#[derive(Debug, Clone)]
pub enum Command {
    SetRenderTargets(Vec<TargetHandle>),
    SetRenderTargetCube {
        target: TargetHandle,
        face: CubeFace,
    },
    Clear {
        color: Option<[f32; 4]>,
        depth: Option<f32>,
    },
    SetBlendState(BlendState),
    SetDepthState(DepthStencilState),
    SetRasterizerState(RasterizerState),
    SetViewport(Viewport),
    SetVertexBuffers(Vec<(BufferHandle, VertexStepMode)>),
    SetIndexBuffer {
        buffer: BufferHandle,
        format: IndexFormat,
    },
    WriteBuffer {
        buffer: BufferHandle,
        offset: u64,
        len: u64,
    },
    SetParam {
        shader: ShaderHandle,
        name: String,
        value: RecordedParam,
    },
    SetTechnique {
        shader: ShaderHandle,
        technique: String,
    },
    ApplyPass {
        shader: ShaderHandle,
        pass: u32,
    },
    DrawIndexed {
        index_count: u32,
        first_index: u32,
        base_vertex: i32,
    },
    DrawIndexedInstanced {
        index_count: u32,
        first_index: u32,
        base_vertex: i32,
        instance_count: u32,
    },
    DrawIndexedLines {
        index_count: u32,
        first_index: u32,
        base_vertex: i32,
    },
}

/// Headless command-recording backend
#[derive(Default)]
pub struct HeadlessBackend {
    commands: Vec<Command>,

    // Resource bookkeeping
    buffers: HashMap<u64, BufferDescriptor>,
    targets: HashMap<u64, TargetDescriptor>,
    textures: HashMap<u64, TextureDescriptor>,
    shaders: HashMap<u64, String>,
    destroyed_targets: Vec<TargetHandle>,

    // Handle counters
    next_buffer_id: u64,
    next_target_id: u64,
    next_texture_id: u64,
    next_shader_id: u64,

    current_viewport: Option<Viewport>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded command stream, in submission order
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Descriptor of a live render target
    pub fn target_desc(&self, target: TargetHandle) -> Option<&TargetDescriptor> {
        self.targets.get(&target.0)
    }

    pub fn live_target_count(&self) -> usize {
        self.targets.len()
    }

    pub fn destroyed_targets(&self) -> &[TargetHandle] {
        &self.destroyed_targets
    }

    pub fn shader_label(&self, shader: ShaderHandle) -> Option<&str> {
        self.shaders.get(&shader.0).map(String::as_str)
    }
}

impl GpuBackend for HeadlessBackend {
    fn create_buffer(&mut self, desc: &BufferDescriptor) -> BackendResult<BufferHandle> {
        let id = self.next_buffer_id;
        self.next_buffer_id += 1;
        self.buffers.insert(id, desc.clone());
        Ok(BufferHandle(id))
    }

    fn create_buffer_init(
        &mut self,
        desc: &BufferDescriptor,
        data: &[u8],
    ) -> BackendResult<BufferHandle> {
        if data.len() as u64 > desc.size {
            return Err(BackendError::BufferCreationFailed(format!(
                "initial data of {} bytes exceeds declared size {}",
                data.len(),
                desc.size
            )));
        }
        self.create_buffer(desc)
    }

    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) {
        self.commands.push(Command::WriteBuffer {
            buffer,
            offset,
            len: data.len() as u64,
        });
    }

    fn create_target(&mut self, desc: &TargetDescriptor) -> BackendResult<TargetHandle> {
        if desc.width == 0 || desc.height == 0 {
            return Err(BackendError::TargetCreationFailed(format!(
                "target {:?} has zero extent",
                desc.label
            )));
        }
        let id = self.next_target_id;
        self.next_target_id += 1;
        self.targets.insert(id, desc.clone());
        Ok(TargetHandle(id))
    }

    fn destroy_target(&mut self, target: TargetHandle) {
        if self.targets.remove(&target.0).is_some() {
            self.destroyed_targets.push(target);
        }
    }

    fn create_texture(
        &mut self,
        desc: &TextureDescriptor,
        data: &[u8],
    ) -> BackendResult<TextureHandle> {
        let expected = (desc.width * desc.height * desc.format.bytes_per_pixel()) as usize;
        if data.len() != expected {
            return Err(BackendError::TextureCreationFailed(format!(
                "texture {:?} expects {} bytes, got {}",
                desc.label,
                expected,
                data.len()
            )));
        }
        let id = self.next_texture_id;
        self.next_texture_id += 1;
        self.textures.insert(id, desc.clone());
        Ok(TextureHandle(id))
    }

    fn create_shader(&mut self, label: &str) -> BackendResult<ShaderHandle> {
        let id = self.next_shader_id;
        self.next_shader_id += 1;
        self.shaders.insert(id, label.to_string());
        Ok(ShaderHandle(id))
    }

    fn set_render_targets(&mut self, targets: &[TargetHandle]) {
        self.commands
            .push(Command::SetRenderTargets(targets.to_vec()));
    }

    fn set_render_target_cube(&mut self, target: TargetHandle, face: CubeFace) {
        self.commands
            .push(Command::SetRenderTargetCube { target, face });
    }

    fn clear(&mut self, color: Option<[f32; 4]>, depth: Option<f32>) {
        self.commands.push(Command::Clear { color, depth });
    }

    fn set_blend_state(&mut self, state: BlendState) {
        self.commands.push(Command::SetBlendState(state));
    }

    fn set_depth_state(&mut self, state: DepthStencilState) {
        self.commands.push(Command::SetDepthState(state));
    }

    fn set_rasterizer_state(&mut self, state: RasterizerState) {
        self.commands.push(Command::SetRasterizerState(state));
    }

    fn viewport(&self) -> Viewport {
        self.current_viewport
            .unwrap_or(Viewport::new(0.0, 0.0, 1.0, 1.0))
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.current_viewport = Some(viewport);
        self.commands.push(Command::SetViewport(viewport));
    }

    fn set_vertex_buffers(&mut self, bindings: &[(BufferHandle, VertexStepMode)]) {
        self.commands
            .push(Command::SetVertexBuffers(bindings.to_vec()));
    }

    fn set_index_buffer(&mut self, buffer: BufferHandle, format: IndexFormat) {
        self.commands.push(Command::SetIndexBuffer { buffer, format });
    }

    fn set_param(&mut self, shader: ShaderHandle, name: &str, value: ShaderParam) {
        self.commands.push(Command::SetParam {
            shader,
            name: name.to_string(),
            value: value.into(),
        });
    }

    fn set_technique(&mut self, shader: ShaderHandle, technique: &str) {
        self.commands.push(Command::SetTechnique {
            shader,
            technique: technique.to_string(),
        });
    }

    fn apply_pass(&mut self, shader: ShaderHandle, pass: u32) {
        self.commands.push(Command::ApplyPass { shader, pass });
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, base_vertex: i32) {
        self.commands.push(Command::DrawIndexed {
            index_count,
            first_index,
            base_vertex,
        });
    }

    fn draw_indexed_instanced(
        &mut self,
        index_count: u32,
        first_index: u32,
        base_vertex: i32,
        instance_count: u32,
    ) {
        self.commands.push(Command::DrawIndexedInstanced {
            index_count,
            first_index,
            base_vertex,
            instance_count,
        });
    }

    fn draw_indexed_lines(&mut self, index_count: u32, first_index: u32, base_vertex: i32) {
        self.commands.push(Command::DrawIndexedLines {
            index_count,
            first_index,
            base_vertex,
        });
    }
}
