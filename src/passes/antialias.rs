//! Directionally-localized antialiasing
//!
//! A screen-space post pass over the composited image; a good match for
//! deferred rendering, where hardware MSAA is off the table.

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::passes::quad::ScreenQuad;
use crate::profile::pass::*;
use crate::profile::TargetId;
use glam::Vec2;
use std::time::{Duration, Instant};

pub struct AntialiasPass {
    outputs: [TargetId; 1],
    inputs: Vec<TargetId>,

    shader: ShaderHandle,
    quad: ScreenQuad,
    half_pixel: Vec2,

    render_time: Duration,
}

impl AntialiasPass {
    pub fn new(builder: &mut PassBuilder<'_>) -> RenderResult<Self> {
        let config = builder.config();
        let width = config.width;
        let height = config.height;

        let smoothed = builder.add_backbuffer_target(
            "antialias.smoothed",
            TextureFormat::Rgba8Unorm,
            DepthFormat::None,
        )?;

        let shader = builder.load_shader("dlaa")?;
        let half_pixel = builder.half_pixel();
        builder.backend.set_param(
            shader,
            "bgl_RenderedTextureWidth",
            ShaderParam::Float(width as f32),
        );
        builder.backend.set_param(
            shader,
            "bgl_RenderedTextureHeight",
            ShaderParam::Float(height as f32),
        );
        let quad = ScreenQuad::new(builder.backend)?;

        Ok(Self {
            outputs: [smoothed],
            inputs: Vec::new(),
            shader,
            quad,
            half_pixel,
            render_time: Duration::ZERO,
        })
    }
}

impl RenderPass for AntialiasPass {
    fn name(&self) -> &'static str {
        "antialias"
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
        require_inputs(self.name(), &self.inputs, 1)?;

        let smoothed = ctx.target(self.outputs[0]);
        let source = ctx.target(self.inputs[0]);

        let backend = &mut *ctx.backend;
        backend.set_blend_state(BlendState::alpha_blending());
        backend.set_render_targets(&[smoothed]);
        backend.clear(Some([0.0; 4]), None);

        backend.set_param(self.shader, "halfPixel", ShaderParam::Vec2(self.half_pixel));
        backend.set_param(self.shader, "Texture", ShaderParam::Target(source));
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
