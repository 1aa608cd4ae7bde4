//! Final scene composite
//!
//! Combines the diffuse buffer, accumulated lighting, and ambient occlusion
//! into the final HDR image.

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::passes::quad::ScreenQuad;
use crate::profile::pass::*;
use crate::profile::TargetId;
use glam::Vec2;
use std::time::{Duration, Instant};

pub struct CompositePass {
    outputs: [TargetId; 1],
    /// `[diffuse, light, ssao]`
    inputs: Vec<TargetId>,

    shader: ShaderHandle,
    quad: ScreenQuad,
    half_pixel: Vec2,

    pub include_ssao: bool,

    render_time: Duration,
}

impl CompositePass {
    pub fn new(builder: &mut PassBuilder<'_>) -> RenderResult<Self> {
        let combined = builder.add_backbuffer_target(
            "composite.final",
            TextureFormat::Rgb10a2Unorm,
            DepthFormat::None,
        )?;
        let shader = builder.load_shader("final_combo")?;
        let half_pixel = builder.half_pixel();
        let quad = ScreenQuad::new(builder.backend)?;

        Ok(Self {
            outputs: [combined],
            inputs: Vec::new(),
            shader,
            quad,
            half_pixel,
            include_ssao: true,
            render_time: Duration::ZERO,
        })
    }
}

impl RenderPass for CompositePass {
    fn name(&self) -> &'static str {
        "composite"
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
        require_inputs(self.name(), &self.inputs, 3)?;

        let combined = ctx.target(self.outputs[0]);
        let diffuse = ctx.target(self.inputs[0]);
        let light = ctx.target(self.inputs[1]);
        let ssao = ctx.target(self.inputs[2]);

        let backend = &mut *ctx.backend;
        backend.set_render_targets(&[combined]);
        backend.clear(Some([0.0; 4]), None);
        backend.set_blend_state(BlendState::opaque());

        backend.set_param(self.shader, "diffuseMap", ShaderParam::Target(diffuse));
        backend.set_param(self.shader, "lightMap", ShaderParam::Target(light));
        backend.set_param(self.shader, "ssaoMap", ShaderParam::Target(ssao));
        backend.set_param(
            self.shader,
            "includeSSAO",
            ShaderParam::Int(self.include_ssao as i32),
        );
        backend.set_param(
            self.shader,
            "ambient",
            ShaderParam::Float(ctx.scene.ambient_light),
        );
        backend.set_param(self.shader, "halfPixel", ShaderParam::Vec2(self.half_pixel));

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
