//! Light accumulation pass
//!
//! Draws, in order: the shadow-map atlas for shadow-casting directional
//! lights, the screen-space shadow occlusion buffer, directional light
//! contributions as fullscreen quads, and instanced point-light volumes.
//!
//! Point lights are split by where the camera sits relative to their
//! influence sphere. A light whose inflated sphere lies entirely in front
//! of the near plane is "outer"; every other light is "inner" (the camera
//! is inside or near its volume), and the two groups draw with opposite
//! winding and depth-compare modes so sphere volumes shade correctly from
//! both sides.

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::content::Model;
use crate::passes::quad::ScreenQuad;
use crate::passes::scene_draw;
use crate::passes::shadow::{
    self, DEFAULT_PROJECTION_SCALE, SHADOW_ATLAS_TILES, SHADOW_BATCH_SIZE, SHADOW_MESH_BUDGET,
};
use crate::profile::pass::*;
use crate::profile::TargetId;
use crate::scene::camera::Camera;
use crate::scene::frustum::PlaneIntersection;
use crate::scene::light::{DirectionalLight, PointLightInstance};
use crate::scene::visibility;
use crate::scene::OrderedMesh;
use glam::{Mat4, Vec2};
use std::time::{Duration, Instant};

/// Sphere inflation for the near-plane classification test
const CLASSIFY_RADIUS_SCALE: f32 = 1.25;

pub struct LightPass {
    /// `[light accumulation, shadow atlas, shadow occlusion]`
    outputs: [TargetId; 3],
    /// `[gbuffer normal, gbuffer depth]`
    inputs: Vec<TargetId>,

    directional_shader: ShaderHandle,
    point_shader: ShaderHandle,
    depth_shader: ShaderHandle,

    /// Unit sphere drawn instanced for point light volumes
    sphere: Model,
    instance_buffer: BufferHandle,
    quad: ScreenQuad,
    light_camera: Camera,

    batch_matrices: Vec<Mat4>,
    batch_offsets: Vec<Vec2>,
    inner_lights: Vec<PointLightInstance>,
    outer_lights: Vec<PointLightInstance>,

    pub shadow_brightness: f32,
    shadow_map_size: u32,
    max_instances: usize,

    render_time: Duration,
}

impl LightPass {
    pub fn new(builder: &mut PassBuilder<'_>) -> RenderResult<Self> {
        let config = builder.config();
        let shadow_map_size = config.shadow_map_size;
        let max_instances = config.max_light_instances;
        let shadow_brightness = config.shadow_brightness;
        let atlas_size = shadow_map_size * SHADOW_ATLAS_TILES;

        let light = builder.add_backbuffer_target(
            "light.accumulation",
            TextureFormat::Rgba16Float,
            DepthFormat::None,
        )?;
        let shadow = builder.add_backbuffer_target(
            "light.shadow_occlusion",
            TextureFormat::R8Unorm,
            DepthFormat::None,
        )?;
        let atlas = builder.add_render_target(
            "light.shadow_atlas",
            atlas_size,
            atlas_size,
            TextureFormat::R32Float,
            DepthFormat::Depth24Stencil8,
        )?;

        let directional_shader = builder.load_shader("directional_light")?;
        let point_shader = builder.load_shader("point_light")?;
        let depth_shader = builder.load_shader("depth")?;

        let half_pixel = builder.half_pixel();
        builder
            .backend
            .set_param(directional_shader, "halfPixel", ShaderParam::Vec2(half_pixel));
        builder
            .backend
            .set_param(point_shader, "halfPixel", ShaderParam::Vec2(half_pixel));

        let sphere = builder.load_model("ball")?;

        let instance_stride = PointLightInstance::layout().array_stride;
        let instance_buffer = builder.backend.create_buffer(&BufferDescriptor {
            label: Some("light.instances".to_string()),
            size: max_instances as u64 * instance_stride,
            usage: BufferUsage::VERTEX | BufferUsage::COPY_DST,
        })?;

        let quad = ScreenQuad::new(builder.backend)?;

        let mut light_camera = Camera::new();
        light_camera.initialize(shadow_map_size as f32, shadow_map_size as f32)?;

        Ok(Self {
            outputs: [light, atlas, shadow],
            inputs: Vec::new(),
            directional_shader,
            point_shader,
            depth_shader,
            sphere,
            instance_buffer,
            quad,
            light_camera,
            batch_matrices: Vec::with_capacity(SHADOW_BATCH_SIZE),
            batch_offsets: Vec::with_capacity(SHADOW_BATCH_SIZE),
            inner_lights: Vec::new(),
            outer_lights: Vec::new(),
            shadow_brightness,
            shadow_map_size,
            max_instances,
            render_time: Duration::ZERO,
        })
    }

    fn shadow_casters(ctx: &RenderContext<'_>) -> Vec<DirectionalLight> {
        ctx.scene
            .directional_lights
            .iter()
            .filter(|light| light.casts_shadows)
            .copied()
            .collect()
    }

    /// Render each budgeted mesh into its own atlas tile
    fn draw_shadow_maps(
        &mut self,
        ctx: &mut RenderContext<'_>,
        casters: &[DirectionalLight],
        ordered: &[OrderedMesh],
    ) {
        let atlas = ctx.target(self.outputs[1]);
        let backend = &mut *ctx.backend;

        for light in casters {
            backend.set_render_targets(&[atlas]);
            backend.clear(Some([1.0; 4]), Some(1.0));
            backend.set_depth_state(DepthStencilState::DEFAULT);

            let saved_viewport = backend.viewport();

            for (index, entry) in ordered.iter().enumerate() {
                let Some(viewport) = shadow::tile_viewport(index, self.shadow_map_size) else {
                    break;
                };
                let Some(instance) = ctx.scene.model(&entry.model) else {
                    continue;
                };

                backend.set_viewport(viewport);

                let corners = instance.world_bounds()[entry.mesh].corners();
                let projection =
                    shadow::light_projection(light.direction, &corners, DEFAULT_PROJECTION_SCALE);

                backend.set_param(
                    self.depth_shader,
                    "LightViewProj",
                    ShaderParam::Mat4(projection.matrix()),
                );
                backend.set_param(
                    self.depth_shader,
                    "farClip",
                    ShaderParam::Float(self.light_camera.far_plane),
                );

                scene_draw::draw_model_mesh(
                    backend,
                    instance,
                    entry.mesh,
                    self.depth_shader,
                    "Default",
                );
            }

            backend.set_viewport(saved_viewport);
        }
    }

    /// Accumulate per-mesh shadow contributions into the occlusion buffer,
    /// flushing tile matrices and offsets in fixed-size batches
    fn draw_projected_shadows(
        &mut self,
        ctx: &mut RenderContext<'_>,
        casters: &[DirectionalLight],
        ordered: &[OrderedMesh],
    ) {
        let shadow_target = ctx.target(self.outputs[2]);
        let atlas = ctx.target(self.outputs[1]);
        let backend = &mut *ctx.backend;

        backend.set_blend_state(BlendState::alpha_blending());
        backend.set_render_targets(&[shadow_target]);
        backend.clear(Some([0.0; 4]), None);

        let atlas_size = (self.shadow_map_size * SHADOW_ATLAS_TILES) as f32;
        backend.set_param(
            self.directional_shader,
            "shadowMapPixelSize",
            ShaderParam::Vec2(Vec2::splat(1.0 / atlas_size)),
        );
        backend.set_param(
            self.directional_shader,
            "shadowMapSize",
            ShaderParam::Float(atlas_size),
        );
        backend.set_param(
            self.directional_shader,
            "shadowMap",
            ShaderParam::Target(atlas),
        );

        for light in casters {
            backend.set_technique(self.directional_shader, "Shadowed");

            self.batch_matrices.clear();
            self.batch_offsets.clear();
            let mut drawn = 0usize;

            for (index, entry) in ordered.iter().enumerate() {
                let Some(offset) = shadow::tile_uv_offset(index) else {
                    break;
                };
                let Some(instance) = ctx.scene.model(&entry.model) else {
                    continue;
                };

                let corners = instance.world_bounds()[entry.mesh].corners();
                let projection =
                    shadow::light_projection(light.direction, &corners, DEFAULT_PROJECTION_SCALE);

                self.batch_matrices.push(projection.matrix());
                self.batch_offsets.push(offset);
                drawn += 1;

                if self.batch_matrices.len() == SHADOW_BATCH_SIZE {
                    flush_shadow_batch(
                        backend,
                        self.directional_shader,
                        &self.quad,
                        &self.batch_matrices,
                        &self.batch_offsets,
                        drawn as f32 / 100.0,
                    );
                    self.batch_matrices.clear();
                    self.batch_offsets.clear();
                }
            }

            if !self.batch_matrices.is_empty() {
                flush_shadow_batch(
                    backend,
                    self.directional_shader,
                    &self.quad,
                    &self.batch_matrices,
                    &self.batch_offsets,
                    drawn as f32 / 100.0,
                );
                self.batch_matrices.clear();
                self.batch_offsets.clear();
            }
        }
    }

    fn draw_directional_lights(&mut self, ctx: &mut RenderContext<'_>) {
        let shadow_target = ctx.target(self.outputs[2]);
        let normal = ctx.target(self.inputs[0]);
        let depth = ctx.target(self.inputs[1]);

        visibility::cull_model_meshes(ctx.scene, ctx.camera);

        let backend = &mut *ctx.backend;
        set_common_parameters(backend, self.directional_shader, ctx.camera, normal, depth);
        backend.set_param(
            self.directional_shader,
            "ambient",
            ShaderParam::Float(ctx.scene.ambient_light),
        );
        backend.set_param(
            self.directional_shader,
            "shadowViewMap",
            ShaderParam::Target(shadow_target),
        );
        backend.set_param(
            self.directional_shader,
            "shadowBrightness",
            ShaderParam::Float(self.shadow_brightness),
        );

        for light in &ctx.scene.directional_lights {
            backend.set_param(
                self.directional_shader,
                "lightDirection",
                ShaderParam::Vec3(light.direction),
            );
            backend.set_param(
                self.directional_shader,
                "lightColor",
                ShaderParam::Vec3(light.color),
            );
            backend.set_param(
                self.directional_shader,
                "lightIntensity",
                ShaderParam::Float(light.intensity),
            );

            backend.set_technique(self.directional_shader, "DrawFinal");
            backend.apply_pass(self.directional_shader, 0);
            self.quad.draw(backend);
        }
    }

    /// Classify visible lights against the near plane and draw each group
    /// with hardware instancing
    fn draw_point_lights(&mut self, ctx: &mut RenderContext<'_>) {
        let normal = ctx.target(self.inputs[0]);
        let depth = ctx.target(self.inputs[1]);
        let backend = &mut *ctx.backend;

        set_common_parameters(backend, self.point_shader, ctx.camera, normal, depth);
        if let Some(first) = ctx.scene.visible_lights.first() {
            backend.set_param(
                self.point_shader,
                "lightIntensity",
                ShaderParam::Float(first.intensity),
            );
        }

        self.inner_lights.clear();
        self.outer_lights.clear();
        let near_plane = ctx.camera.frustum().near_plane();

        for light in &ctx.scene.visible_lights {
            let center = light.instance_position();
            let radius = light.instance_radius() * CLASSIFY_RADIUS_SCALE;

            match near_plane.intersects_sphere(center, radius) {
                PlaneIntersection::Front => self.outer_lights.push(light.instance),
                _ => self.inner_lights.push(light.instance),
            }
        }

        let total = self.inner_lights.len() + self.outer_lights.len();
        if total > self.max_instances {
            let over = total - self.max_instances;
            ctx.stats.light_instances_dropped += over;
            log::debug!("point light instance cap hit, dropping {over} lights");

            // Trim the outer group first; inner lights surround the camera
            let trimmed_outer = self.outer_lights.len().saturating_sub(over);
            self.outer_lights.truncate(trimmed_outer);
            let remaining = self.inner_lights.len() + self.outer_lights.len();
            if remaining > self.max_instances {
                self.inner_lights.truncate(self.max_instances);
            }
        }

        backend.set_rasterizer_state(RasterizerState::CULL_CLOCKWISE);
        backend.set_depth_state(DepthStencilState::read_only(CompareFunction::LessEqual));
        draw_light_group(
            backend,
            self.point_shader,
            &self.sphere,
            self.instance_buffer,
            &self.inner_lights,
        );

        backend.set_rasterizer_state(RasterizerState::CULL_COUNTER_CLOCKWISE);
        backend.set_depth_state(DepthStencilState::read_only(CompareFunction::GreaterEqual));
        draw_light_group(
            backend,
            self.point_shader,
            &self.sphere,
            self.instance_buffer,
            &self.outer_lights,
        );
    }
}

impl RenderPass for LightPass {
    fn name(&self) -> &'static str {
        "light"
    }

    fn has_scene_input(&self) -> bool {
        true
    }

    fn set_inputs(&mut self, inputs: &[TargetId]) {
        self.inputs.clear();
        self.inputs.extend_from_slice(inputs);
    }

    fn inputs(&self) -> &[TargetId] {
        &self.inputs
    }

    fn outputs(&self) -> &[TargetId] {
        &self.outputs
    }

    fn draw(&mut self, ctx: &mut RenderContext<'_>) -> RenderResult<()> {
        let started = Instant::now();
        require_inputs(self.name(), &self.inputs, 2)?;

        // Shadow draw order comes from the no-cull priority path
        visibility::build_draw_order(ctx.scene, ctx.camera);

        let casters = Self::shadow_casters(ctx);
        let ordered: Vec<OrderedMesh> = ctx
            .scene
            .ordered_meshes
            .iter()
            .take(SHADOW_MESH_BUDGET)
            .cloned()
            .collect();
        let dropped = ctx
            .scene
            .ordered_meshes
            .len()
            .saturating_sub(SHADOW_MESH_BUDGET);
        if dropped > 0 && !casters.is_empty() {
            ctx.stats.shadow_meshes_dropped += dropped;
            log::debug!("shadow budget hit, {dropped} meshes unshadowed this frame");
        }

        {
            let normal = ctx.target(self.inputs[0]);
            let depth = ctx.target(self.inputs[1]);
            set_common_parameters(
                ctx.backend,
                self.directional_shader,
                ctx.camera,
                normal,
                depth,
            );
        }

        self.draw_shadow_maps(ctx, &casters, &ordered);
        self.draw_projected_shadows(ctx, &casters, &ordered);

        // Light accumulation over an additive HDR buffer
        let light_target = ctx.target(self.outputs[0]);
        ctx.backend.set_blend_state(BlendState::additive());
        ctx.backend.set_render_targets(&[light_target]);
        ctx.backend.clear(Some([0.0; 4]), None);
        ctx.backend.set_depth_state(DepthStencilState::NONE);

        self.draw_directional_lights(ctx);
        if !ctx.scene.visible_lights.is_empty() {
            self.draw_point_lights(ctx);
        }

        self.render_time = started.elapsed();
        ctx.stats.record_pass(self.name(), self.render_time);
        Ok(())
    }

    fn render_time(&self) -> Duration {
        self.render_time
    }
}

/// Bind the parameters shared by every lighting shader
fn set_common_parameters(
    backend: &mut dyn GpuBackend,
    shader: ShaderHandle,
    camera: &Camera,
    normal: TargetHandle,
    depth: TargetHandle,
) {
    backend.set_param(shader, "View", ShaderParam::Mat4(camera.view()));
    backend.set_param(shader, "Projection", ShaderParam::Mat4(camera.projection()));
    backend.set_param(shader, "normalMap", ShaderParam::Target(normal));
    backend.set_param(shader, "depthMap", ShaderParam::Target(depth));
    backend.set_param(shader, "camPosition", ShaderParam::Vec3(camera.position));
    backend.set_param(
        shader,
        "invertViewProj",
        ShaderParam::Mat4(camera.view_projection().inverse()),
    );
    backend.set_param(
        shader,
        "inverseView",
        ShaderParam::Mat4(camera.view().inverse()),
    );
}

fn flush_shadow_batch(
    backend: &mut dyn GpuBackend,
    shader: ShaderHandle,
    quad: &ScreenQuad,
    matrices: &[Mat4],
    offsets: &[Vec2],
    depth: f32,
) {
    backend.set_param(shader, "mapOffset", ShaderParam::Vec2Array(offsets));
    backend.set_param(shader, "lightViewProj", ShaderParam::Mat4Array(matrices));
    backend.set_param(shader, "shadowLoops", ShaderParam::Int(matrices.len() as i32));
    backend.apply_pass(shader, 0);
    quad.draw_at_depth(backend, depth);
}

/// Upload a group's instance records and draw the sphere once per group
fn draw_light_group(
    backend: &mut dyn GpuBackend,
    shader: ShaderHandle,
    sphere: &Model,
    instance_buffer: BufferHandle,
    instances: &[PointLightInstance],
) {
    if instances.is_empty() {
        return;
    }

    backend.write_buffer(instance_buffer, 0, bytemuck::cast_slice(instances));

    for mesh in &sphere.meshes {
        for part in &mesh.parts {
            backend.set_vertex_buffers(&[
                (part.vertex_buffer, VertexStepMode::Vertex),
                (instance_buffer, VertexStepMode::Instance),
            ]);
            backend.set_index_buffer(part.index_buffer, IndexFormat::Uint32);
            backend.apply_pass(shader, 0);
            backend.draw_indexed_instanced(part.index_count, 0, 0, instances.len() as u32);
        }
    }
}
