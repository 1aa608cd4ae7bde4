//! Bloom
//!
//! Threshold extract, separable blur at half vertical resolution, then a
//! combine with saturation and contrast controls.

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::passes::blur::GaussianKernel;
use crate::passes::quad::ScreenQuad;
use crate::profile::pass::*;
use crate::profile::TargetId;
use std::time::{Duration, Instant};

pub struct BloomPass {
    /// `[combined, half-res ping, half-res pong]`
    outputs: [TargetId; 3],
    inputs: Vec<TargetId>,

    shader: ShaderHandle,
    kernel: GaussianKernel,
    quad: ScreenQuad,

    pub threshold: f32,
    pub bloom_intensity: f32,
    pub saturation: f32,
    pub contrast: f32,

    render_time: Duration,
}

impl BloomPass {
    pub fn new(builder: &mut PassBuilder<'_>) -> RenderResult<Self> {
        let config = builder.config();
        let width = config.width;
        let height = config.height;

        let combined = builder.add_backbuffer_target(
            "bloom.combined",
            TextureFormat::Rgb10a2Unorm,
            DepthFormat::None,
        )?;
        let ping = builder.add_render_target(
            "bloom.ping",
            width,
            height / 2,
            TextureFormat::Rgb10a2Unorm,
            DepthFormat::None,
        )?;
        let pong = builder.add_render_target(
            "bloom.pong",
            width,
            height / 2,
            TextureFormat::Rgb10a2Unorm,
            DepthFormat::None,
        )?;

        let shader = builder.load_shader("blur")?;
        let kernel = GaussianKernel::new(width, height, 1.0);
        let quad = ScreenQuad::new(builder.backend)?;

        Ok(Self {
            outputs: [combined, ping, pong],
            inputs: Vec::new(),
            shader,
            kernel,
            quad,
            threshold: 0.4,
            bloom_intensity: 1.1,
            saturation: 1.0,
            contrast: 1.0,
            render_time: Duration::ZERO,
        })
    }
}

impl RenderPass for BloomPass {
    fn name(&self) -> &'static str {
        "bloom"
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

        let source = ctx.target(self.inputs[0]);
        let combined = ctx.target(self.outputs[0]);
        let ping = ctx.target(self.outputs[1]);
        let pong = ctx.target(self.outputs[2]);

        let backend = &mut *ctx.backend;
        backend.set_technique(self.shader, "SimpleBloom");
        backend.set_param(self.shader, "threshold", ShaderParam::Float(self.threshold));
        backend.set_param(
            self.shader,
            "bloomFactor",
            ShaderParam::Float(self.bloom_intensity),
        );

        // Extract bright regions at half resolution
        backend.set_render_targets(&[pong]);
        backend.clear(Some([0.0; 4]), None);
        backend.set_param(self.shader, "blurMap", ShaderParam::Target(source));
        backend.apply_pass(self.shader, 0);
        self.quad.draw(backend);

        // Horizontal blur
        backend.set_render_targets(&[ping]);
        backend.clear(Some([0.0; 4]), None);
        backend.set_param(self.shader, "diffuseMap", ShaderParam::Target(pong));
        backend.set_param(
            self.shader,
            "sampleWeights",
            ShaderParam::FloatArray(&self.kernel.weights_h),
        );
        backend.set_param(
            self.shader,
            "sampleOffsets",
            ShaderParam::Vec2Array(&self.kernel.offsets_h),
        );
        backend.apply_pass(self.shader, 1);
        self.quad.draw(backend);

        // Vertical blur
        backend.set_render_targets(&[pong]);
        backend.clear(Some([0.0; 4]), None);
        backend.set_param(self.shader, "diffuseMap", ShaderParam::Target(ping));
        backend.set_param(
            self.shader,
            "sampleWeights",
            ShaderParam::FloatArray(&self.kernel.weights_v),
        );
        backend.set_param(
            self.shader,
            "sampleOffsets",
            ShaderParam::Vec2Array(&self.kernel.offsets_v),
        );
        backend.apply_pass(self.shader, 2);
        self.quad.draw(backend);

        // Combine the blurred highlights with the source image
        backend.set_render_targets(&[combined]);
        backend.clear(Some([0.0; 4]), None);
        backend.set_param(self.shader, "blurMap", ShaderParam::Target(pong));
        backend.set_param(self.shader, "diffuseMap", ShaderParam::Target(source));
        backend.set_param(self.shader, "saturation", ShaderParam::Float(self.saturation));
        backend.set_param(self.shader, "contrast", ShaderParam::Float(self.contrast));
        backend.apply_pass(self.shader, 3);
        self.quad.draw(backend);

        self.render_time = started.elapsed();
        ctx.stats.record_pass(self.name(), self.render_time);
        Ok(())
    }

    fn render_time(&self) -> Duration {
        self.render_time
    }
}
