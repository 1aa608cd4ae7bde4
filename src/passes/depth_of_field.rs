//! Depth of field
//!
//! Mixes the sharp and blurred images by each pixel's distance from the
//! focal plane.

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::passes::quad::ScreenQuad;
use crate::profile::pass::*;
use crate::profile::TargetId;
use glam::Vec2;
use std::time::{Duration, Instant};

pub struct DepthOfFieldPass {
    /// `[focused, blur factor]`
    outputs: [TargetId; 2],
    /// `[sharp, blurred, depth]`
    inputs: Vec<TargetId>,

    shader: ShaderHandle,
    quad: ScreenQuad,
    half_pixel: Vec2,

    pub focal_distance: f32,
    pub focal_range: f32,

    render_time: Duration,
}

impl DepthOfFieldPass {
    pub fn new(builder: &mut PassBuilder<'_>) -> RenderResult<Self> {
        let focused = builder.add_backbuffer_target(
            "dof.focused",
            TextureFormat::Rgb10a2Unorm,
            DepthFormat::None,
        )?;
        let blur_factor = builder.add_backbuffer_target(
            "dof.blur_factor",
            TextureFormat::Rgb10a2Unorm,
            DepthFormat::None,
        )?;

        let shader = builder.load_shader("blur")?;
        let half_pixel = builder.half_pixel();
        let quad = ScreenQuad::new(builder.backend)?;

        Ok(Self {
            outputs: [focused, blur_factor],
            inputs: Vec::new(),
            shader,
            quad,
            half_pixel,
            focal_distance: 0.05,
            focal_range: 0.12,
            render_time: Duration::ZERO,
        })
    }
}

impl RenderPass for DepthOfFieldPass {
    fn name(&self) -> &'static str {
        "depth_of_field"
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

        let focused = ctx.target(self.outputs[0]);
        let sharp = ctx.target(self.inputs[0]);
        let blurred = ctx.target(self.inputs[1]);
        let depth = ctx.target(self.inputs[2]);

        let backend = &mut *ctx.backend;
        backend.set_technique(self.shader, "DepthOfField");
        backend.set_render_targets(&[focused]);
        backend.clear(Some([0.0; 4]), None);

        backend.set_param(self.shader, "halfPixel", ShaderParam::Vec2(self.half_pixel));
        backend.set_param(
            self.shader,
            "focalDistance",
            ShaderParam::Float(self.focal_distance),
        );
        backend.set_param(
            self.shader,
            "focalRange",
            ShaderParam::Float(self.focal_range),
        );
        backend.set_param(self.shader, "diffuseMap", ShaderParam::Target(sharp));
        backend.set_param(self.shader, "blurMap", ShaderParam::Target(blurred));
        backend.set_param(self.shader, "depthMap", ShaderParam::Target(depth));

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
