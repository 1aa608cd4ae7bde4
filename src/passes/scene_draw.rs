//! Scene geometry drawing helpers
//!
//! Free functions shared by every pass that traverses scene geometry. Each
//! binds per-mesh parameters (world matrix, bones for skinned meshes) and
//! issues the indexed draws, counting draw calls and triangles into the
//! scene's frame counters.

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::scene::camera::Camera;
use crate::scene::frustum::Containment;
use crate::scene::model::ModelInstance;
use crate::scene::Scene;
use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Draw all visible meshes of every static and skinned model.
///
/// Static models use `technique`; skinned models use the technique with an
/// `Animated` suffix and a bone matrix array, mirroring the shader pairs.
pub fn draw_scene(
    backend: &mut dyn GpuBackend,
    scene: &mut Scene,
    shader: ShaderHandle,
    technique: &str,
) {
    let animated = format!("{technique}Animated");
    let mut draw_calls = 0;
    let mut polys = 0;

    backend.set_technique(shader, technique);
    for instance in scene.static_models.values() {
        draw_instance(backend, instance, shader, &mut draw_calls, &mut polys);
    }

    backend.set_technique(shader, &animated);
    for instance in scene.skinned_models.values() {
        draw_instance(backend, instance, shader, &mut draw_calls, &mut polys);
    }

    scene.draw_calls += draw_calls;
    scene.total_polys += polys;
}

fn draw_instance(
    backend: &mut dyn GpuBackend,
    instance: &ModelInstance,
    shader: ShaderHandle,
    draw_calls: &mut u32,
    polys: &mut u32,
) {
    if let Some(player) = instance.animation.as_ref() {
        backend.set_param(shader, "bones", ShaderParam::Mat4Array(player.skin_transforms()));
    }
    backend.set_param(shader, "World", ShaderParam::Mat4(instance.transform()));

    for &mesh_index in instance.visible_meshes() {
        let mesh = &instance.model.meshes[mesh_index];
        for part in &mesh.parts {
            if let Some(texture) = part.texture {
                backend.set_param(shader, "Texture", ShaderParam::Texture(texture));
            }
            backend.set_vertex_buffers(&[(part.vertex_buffer, VertexStepMode::Vertex)]);
            backend.set_index_buffer(part.index_buffer, IndexFormat::Uint32);
            backend.apply_pass(shader, 0);
            backend.draw_indexed(part.index_count, 0, 0);

            *draw_calls += 1;
            *polys += part.triangle_count;
        }
    }
}

/// Draw one mesh of an instance regardless of its visibility set (shadow
/// tiles draw meshes the main camera culled)
pub fn draw_model_mesh(
    backend: &mut dyn GpuBackend,
    instance: &ModelInstance,
    mesh_index: usize,
    shader: ShaderHandle,
    technique: &str,
) {
    backend.set_technique(shader, technique);
    if let Some(player) = instance.animation.as_ref() {
        backend.set_param(shader, "bones", ShaderParam::Mat4Array(player.skin_transforms()));
    }
    backend.set_param(shader, "World", ShaderParam::Mat4(instance.transform()));

    let mesh = &instance.model.meshes[mesh_index];
    for part in &mesh.parts {
        backend.set_vertex_buffers(&[(part.vertex_buffer, VertexStepMode::Vertex)]);
        backend.set_index_buffer(part.index_buffer, IndexFormat::Uint32);
        backend.apply_pass(shader, 0);
        backend.draw_indexed(part.index_count, 0, 0);
    }
}

/// Draw the skybox centered on the camera, confined to the far depth band
pub fn draw_skybox(
    backend: &mut dyn GpuBackend,
    scene: &mut Scene,
    camera: &Camera,
    shader: ShaderHandle,
    technique: &str,
) {
    if scene.skybox().is_none() {
        return;
    }

    backend.set_depth_state(DepthStencilState::READ);
    backend.set_rasterizer_state(RasterizerState::CULL_NONE);

    let saved = backend.viewport();
    backend.set_viewport(
        Viewport::new(saved.x, saved.y, saved.width, saved.height).with_depth_range(0.999, 1.0),
    );

    let position = camera.position;
    let mut draw_calls = 0;
    let mut polys = 0;
    if let Some(skybox) = scene.skybox_mut() {
        skybox.clear_visible();
        for mesh in 0..skybox.mesh_count() {
            skybox.mark_visible(mesh);
        }
        skybox.translate(position).update_matrix();

        backend.set_technique(shader, technique);
        draw_instance(backend, skybox, shader, &mut draw_calls, &mut polys);
    }
    scene.draw_calls += draw_calls;
    scene.total_polys += polys;

    backend.set_viewport(saved);
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct LineVertex {
    position: Vec3,
    color: [f32; 4],
}

/// Edge list of a box's eight corners
const BOX_EDGE_INDICES: [u16; 24] = [
    0, 1, 1, 2, 2, 3, 3, 0, //
    4, 5, 5, 6, 6, 7, 7, 4, //
    0, 4, 1, 5, 2, 6, 3, 7,
];

const BOX_COLOR: [f32; 4] = [0.0, 1.0, 1.0, 1.0];

/// Debug renderer drawing world-space bounding boxes as line lists
pub struct DebugBoxRenderer {
    shader: ShaderHandle,
    vertex_buffer: BufferHandle,
    index_buffer: BufferHandle,
}

impl DebugBoxRenderer {
    pub fn new(backend: &mut dyn GpuBackend, shader: ShaderHandle) -> BackendResult<Self> {
        let vertex_buffer = backend.create_buffer(&BufferDescriptor {
            label: Some("debug_boxes.vertices".to_string()),
            size: (std::mem::size_of::<LineVertex>() * 8) as u64,
            usage: BufferUsage::VERTEX | BufferUsage::COPY_DST,
        })?;
        let index_buffer = backend.create_buffer_init(
            &BufferDescriptor {
                label: Some("debug_boxes.indices".to_string()),
                size: std::mem::size_of_val(&BOX_EDGE_INDICES) as u64,
                usage: BufferUsage::INDEX,
            },
            bytemuck::cast_slice(&BOX_EDGE_INDICES),
        )?;
        Ok(Self {
            shader,
            vertex_buffer,
            index_buffer,
        })
    }

    /// Draw the bounds of every mesh still inside the frustum
    pub fn draw(&self, backend: &mut dyn GpuBackend, scene: &Scene, camera: &Camera) {
        if !scene.debug {
            return;
        }

        backend.set_param(self.shader, "View", ShaderParam::Mat4(camera.view()));
        backend.set_param(
            self.shader,
            "Projection",
            ShaderParam::Mat4(camera.projection()),
        );

        for instance in scene
            .static_models
            .values()
            .chain(scene.skinned_models.values())
        {
            for bounds in instance.world_bounds() {
                if camera.frustum().contains_box(bounds) == Containment::Disjoint {
                    continue;
                }

                let vertices: Vec<LineVertex> = bounds
                    .corners()
                    .iter()
                    .map(|&corner| LineVertex {
                        position: corner,
                        color: BOX_COLOR,
                    })
                    .collect();
                backend.write_buffer(self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));

                backend.set_vertex_buffers(&[(self.vertex_buffer, VertexStepMode::Vertex)]);
                backend.set_index_buffer(self.index_buffer, IndexFormat::Uint16);
                backend.apply_pass(self.shader, 0);
                backend.draw_indexed_lines(BOX_EDGE_INDICES.len() as u32, 0, 0);
            }
        }
    }
}
