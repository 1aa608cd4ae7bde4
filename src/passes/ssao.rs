//! Screen-space ambient occlusion

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::passes::quad::ScreenQuad;
use crate::profile::pass::*;
use crate::profile::TargetId;
use std::time::{Duration, Instant};

pub struct SsaoPass {
    /// `[occlusion, blur scratch]`
    outputs: [TargetId; 2],
    /// `[gbuffer normal, gbuffer depth]`
    inputs: Vec<TargetId>,

    shader: ShaderHandle,
    quad: ScreenQuad,

    pub radius: f32,
    pub intensity: f32,
    pub scale: f32,
    pub bias: f32,

    render_time: Duration,
}

impl SsaoPass {
    pub fn new(builder: &mut PassBuilder<'_>) -> RenderResult<Self> {
        let occlusion = builder.add_backbuffer_target(
            "ssao.occlusion",
            TextureFormat::R8Unorm,
            DepthFormat::None,
        )?;
        let scratch = builder.add_backbuffer_target(
            "ssao.scratch",
            TextureFormat::R8Unorm,
            DepthFormat::None,
        )?;

        let shader = builder.load_shader("ssao")?;
        let random_map = builder.load_texture("random")?;
        let half_pixel = builder.half_pixel();

        let radius = 0.5;
        let intensity = 0.75;
        let scale = 0.2;
        let bias = 0.0001;

        let backend = &mut *builder.backend;
        backend.set_param(shader, "halfPixel", ShaderParam::Vec2(half_pixel));
        backend.set_param(shader, "g_radius", ShaderParam::Float(radius));
        backend.set_param(shader, "g_intensity", ShaderParam::Float(intensity));
        backend.set_param(shader, "g_scale", ShaderParam::Float(scale));
        backend.set_param(shader, "g_bias", ShaderParam::Float(bias));
        backend.set_param(shader, "RandomMap", ShaderParam::Texture(random_map));

        let quad = ScreenQuad::new(builder.backend)?;

        Ok(Self {
            outputs: [occlusion, scratch],
            inputs: Vec::new(),
            shader,
            quad,
            radius,
            intensity,
            scale,
            bias,
            render_time: Duration::ZERO,
        })
    }
}

impl RenderPass for SsaoPass {
    fn name(&self) -> &'static str {
        "ssao"
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

        let occlusion = ctx.target(self.outputs[0]);
        let normal = ctx.target(self.inputs[0]);
        let depth = ctx.target(self.inputs[1]);

        let backend = &mut *ctx.backend;
        backend.set_technique(self.shader, "SSAO");
        backend.set_blend_state(BlendState::opaque());
        backend.set_render_targets(&[occlusion]);
        backend.clear(Some([1.0; 4]), None);

        backend.set_param(self.shader, "View", ShaderParam::Mat4(ctx.camera.view()));
        backend.set_param(
            self.shader,
            "Projection",
            ShaderParam::Mat4(ctx.camera.projection()),
        );
        backend.set_param(
            self.shader,
            "invertViewProj",
            ShaderParam::Mat4(ctx.camera.view_projection().inverse()),
        );
        backend.set_param(
            self.shader,
            "invertProjection",
            ShaderParam::Mat4(ctx.camera.projection().inverse()),
        );
        backend.set_param(self.shader, "NormalBuffer", ShaderParam::Target(normal));
        backend.set_param(self.shader, "DepthBuffer", ShaderParam::Target(depth));

        backend.apply_pass(self.shader, 0);
        self.quad.draw(backend);

        self.render_time = started.elapsed();
        ctx.stats.record_pass(self.name(), self.render_time);
        Ok(())
    }

    fn render_time(&self) -> Duration {
        self.render_time
    }
}
