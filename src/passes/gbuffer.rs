//! G-buffer fill passes
//!
//! `GBufferPass` renders the scene into the full MRT set consumed by
//! deferred lighting: world-space normals, linear depth, and albedo. The
//! light pre-pass strategy uses `SmallGBufferPass`, which fills only the
//! normal and depth targets and leaves material color to a forward pass.

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::passes::quad::ScreenQuad;
use crate::passes::scene_draw::{self, DebugBoxRenderer};
use crate::profile::pass::*;
use crate::profile::TargetId;
use crate::scene::visibility;
use std::time::{Duration, Instant};

pub struct GBufferPass {
    outputs: [TargetId; 3],
    inputs: Vec<TargetId>,

    scene_shader: ShaderHandle,
    clear_shader: ShaderHandle,
    quad: ScreenQuad,
    debug_boxes: DebugBoxRenderer,

    render_time: Duration,
}

impl GBufferPass {
    pub fn new(builder: &mut PassBuilder<'_>) -> RenderResult<Self> {
        let normal = builder.add_backbuffer_target(
            "gbuffer.normal",
            TextureFormat::Rgba8Unorm,
            DepthFormat::Depth24Stencil8,
        )?;
        let depth = builder.add_backbuffer_target(
            "gbuffer.depth",
            TextureFormat::R32Float,
            DepthFormat::None,
        )?;
        let albedo = builder.add_backbuffer_target(
            "gbuffer.albedo",
            TextureFormat::Rgba8Unorm,
            DepthFormat::Depth24Stencil8,
        )?;

        let scene_shader = builder.load_shader("gbuffer")?;
        let clear_shader = builder.load_shader("clear_gbuffer")?;
        let half_pixel = builder.half_pixel();
        builder
            .backend
            .set_param(clear_shader, "halfPixel", ShaderParam::Vec2(half_pixel));

        let debug_shader = builder.load_shader("debug_lines")?;
        let quad = ScreenQuad::new(builder.backend)?;
        let debug_boxes = DebugBoxRenderer::new(builder.backend, debug_shader)?;

        Ok(Self {
            outputs: [normal, depth, albedo],
            inputs: Vec::new(),
            scene_shader,
            clear_shader,
            quad,
            debug_boxes,
            render_time: Duration::ZERO,
        })
    }
}

impl RenderPass for GBufferPass {
    fn name(&self) -> &'static str {
        "gbuffer"
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

        let bindings = [
            ctx.target(self.outputs[2]),
            ctx.target(self.outputs[0]),
            ctx.target(self.outputs[1]),
        ];

        let backend = &mut *ctx.backend;
        backend.set_blend_state(BlendState::opaque());
        backend.set_render_targets(&bindings);
        backend.set_depth_state(DepthStencilState::DEFAULT);
        backend.set_rasterizer_state(RasterizerState::CULL_COUNTER_CLOCKWISE);
        backend.clear(Some([0.0; 4]), Some(1.0));

        // Clear technique writes the far-plane depth encoding the clear
        // color alone cannot
        backend.set_technique(self.clear_shader, "Clear");
        backend.apply_pass(self.clear_shader, 0);
        self.quad.draw(backend);

        visibility::cull_lights(ctx.scene, ctx.camera);
        visibility::cull_model_meshes(ctx.scene, ctx.camera);

        backend.set_param(self.scene_shader, "View", ShaderParam::Mat4(ctx.camera.view()));
        backend.set_param(
            self.scene_shader,
            "Projection",
            ShaderParam::Mat4(ctx.camera.projection()),
        );
        backend.set_param(
            self.scene_shader,
            "camPosition",
            ShaderParam::Vec3(ctx.camera.position),
        );

        scene_draw::draw_scene(backend, ctx.scene, self.scene_shader, "GBuffer");
        scene_draw::draw_skybox(backend, ctx.scene, ctx.camera, self.scene_shader, "Skybox");

        self.debug_boxes.draw(backend, ctx.scene, ctx.camera);

        self.render_time = started.elapsed();
        ctx.stats.record_pass(self.name(), self.render_time);
        Ok(())
    }

    fn render_time(&self) -> Duration {
        self.render_time
    }
}

/// Normal + depth only, for the light pre-pass strategy
pub struct SmallGBufferPass {
    outputs: [TargetId; 2],
    inputs: Vec<TargetId>,

    scene_shader: ShaderHandle,
    clear_shader: ShaderHandle,
    quad: ScreenQuad,

    render_time: Duration,
}

impl SmallGBufferPass {
    pub fn new(builder: &mut PassBuilder<'_>) -> RenderResult<Self> {
        let normal = builder.add_backbuffer_target(
            "small_gbuffer.normal",
            TextureFormat::Rgba8Unorm,
            DepthFormat::Depth24Stencil8,
        )?;
        let depth = builder.add_backbuffer_target(
            "small_gbuffer.depth",
            TextureFormat::R32Float,
            DepthFormat::None,
        )?;

        let scene_shader = builder.load_shader("gbuffer")?;
        let clear_shader = builder.load_shader("clear_gbuffer")?;
        let quad = ScreenQuad::new(builder.backend)?;

        Ok(Self {
            outputs: [normal, depth],
            inputs: Vec::new(),
            scene_shader,
            clear_shader,
            quad,
            render_time: Duration::ZERO,
        })
    }
}

impl RenderPass for SmallGBufferPass {
    fn name(&self) -> &'static str {
        "small_gbuffer"
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

        let bindings = [ctx.target(self.outputs[0]), ctx.target(self.outputs[1])];

        let backend = &mut *ctx.backend;
        backend.set_blend_state(BlendState::opaque());
        backend.set_render_targets(&bindings);
        backend.set_depth_state(DepthStencilState::DEFAULT);
        backend.clear(Some([0.0; 4]), Some(1.0));

        backend.set_technique(self.clear_shader, "ClearSmall");
        backend.apply_pass(self.clear_shader, 0);
        self.quad.draw(backend);

        visibility::cull_lights(ctx.scene, ctx.camera);
        visibility::cull_model_meshes(ctx.scene, ctx.camera);

        backend.set_param(self.scene_shader, "View", ShaderParam::Mat4(ctx.camera.view()));
        backend.set_param(
            self.scene_shader,
            "Projection",
            ShaderParam::Mat4(ctx.camera.projection()),
        );

        scene_draw::draw_scene(backend, ctx.scene, self.scene_shader, "SmallGBuffer");

        self.render_time = started.elapsed();
        ctx.stats.record_pass(self.name(), self.render_time);
        Ok(())
    }

    fn render_time(&self) -> Duration {
        self.render_time
    }
}
