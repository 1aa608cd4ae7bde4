//! Separable Gaussian blur
//!
//! The kernel positions its off-center taps halfway between texels so the
//! bilinear filtering hardware averages two samples per fetch, doubling the
//! effective kernel width.

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::passes::quad::ScreenQuad;
use crate::profile::pass::*;
use crate::profile::TargetId;
use glam::Vec2;
use std::time::{Duration, Instant};

/// Taps per direction; must match the shader's sample array length
pub const BLUR_SAMPLE_COUNT: usize = 15;

const BLUR_THETA: f32 = 4.0;

/// Precomputed weights and texel offsets for both blur directions
#[derive(Debug, Clone)]
pub struct GaussianKernel {
    pub weights_h: Vec<f32>,
    pub offsets_h: Vec<Vec2>,
    pub weights_v: Vec<f32>,
    pub offsets_v: Vec<Vec2>,
}

impl GaussianKernel {
    pub fn new(width: u32, height: u32, step: f32) -> Self {
        let step = if step < 1e-4 { 1.0 } else { step };
        let width = (width as i64 - BLUR_SAMPLE_COUNT as i64).max(1) as f32;
        let height = (height as i64 - BLUR_SAMPLE_COUNT as i64).max(1) as f32;

        let (weights_h, offsets_h) = build_direction(1.0 / width, 0.0, step);
        let (weights_v, offsets_v) = build_direction(0.0, 1.0 / height, step);

        Self {
            weights_h,
            offsets_h,
            weights_v,
            offsets_v,
        }
    }
}

fn build_direction(dx: f32, dy: f32, step: f32) -> (Vec<f32>, Vec<Vec2>) {
    let mut weights = vec![0.0f32; BLUR_SAMPLE_COUNT];
    let mut offsets = vec![Vec2::ZERO; BLUR_SAMPLE_COUNT];

    weights[0] = gaussian(0.0);
    let mut total = weights[0];

    // Mirrored tap pairs walking out from the center
    for i in 0..BLUR_SAMPLE_COUNT / 2 {
        let weight = gaussian((i + 1) as f32);
        weights[i * 2 + 1] = weight;
        weights[i * 2 + 2] = weight;
        total += weight * 2.0;

        // The 1.5 texel offset lands between two texels so one fetch
        // averages both
        let sample_offset = (i * 2) as f32 + 1.5;
        let delta = Vec2::new(dx, dy) * (sample_offset / step);
        offsets[i * 2 + 1] = delta;
        offsets[i * 2 + 2] = -delta;
    }

    for weight in &mut weights {
        *weight /= total;
    }

    (weights, offsets)
}

fn gaussian(n: f32) -> f32 {
    let theta = BLUR_THETA;
    (1.0 / (std::f32::consts::TAU * theta).sqrt()) * (-(n * n) / (2.0 * theta * theta)).exp()
}

/// Two-pass Gaussian blur over the input target
pub struct BlurPass {
    /// Ping-pong pair; `[0]` holds the blurred result
    outputs: [TargetId; 2],
    inputs: Vec<TargetId>,

    shader: ShaderHandle,
    kernel: GaussianKernel,
    quad: ScreenQuad,

    render_time: Duration,
}

impl BlurPass {
    pub fn new(builder: &mut PassBuilder<'_>) -> RenderResult<Self> {
        let width = builder.config().width;
        let height = builder.config().height;
        let ping = builder.add_backbuffer_target(
            "blur.ping",
            TextureFormat::Rgb10a2Unorm,
            DepthFormat::None,
        )?;
        let pong = builder.add_backbuffer_target(
            "blur.pong",
            TextureFormat::Rgb10a2Unorm,
            DepthFormat::None,
        )?;

        let kernel = GaussianKernel::new(width, height, 1.0);
        let shader = builder.load_shader("blur")?;
        let half_pixel = builder.half_pixel();
        builder
            .backend
            .set_param(shader, "halfPixel", ShaderParam::Vec2(half_pixel));
        let quad = ScreenQuad::new(builder.backend)?;

        Ok(Self {
            outputs: [ping, pong],
            inputs: Vec::new(),
            shader,
            kernel,
            quad,
            render_time: Duration::ZERO,
        })
    }
}

impl RenderPass for BlurPass {
    fn name(&self) -> &'static str {
        "blur"
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
        let ping = ctx.target(self.outputs[0]);
        let pong = ctx.target(self.outputs[1]);

        let backend = &mut *ctx.backend;
        backend.set_technique(self.shader, "GaussianBlur");

        // Horizontal into the pong buffer
        backend.set_render_targets(&[pong]);
        backend.clear(Some([0.0; 4]), None);
        backend.set_param(self.shader, "diffuseMap", ShaderParam::Target(source));
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
        backend.apply_pass(self.shader, 0);
        self.quad.draw(backend);

        // Vertical back into the result buffer
        backend.set_render_targets(&[ping]);
        backend.clear(Some([0.0; 4]), None);
        backend.set_param(self.shader, "diffuseMap", ShaderParam::Target(pong));
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
        backend.apply_pass(self.shader, 1);
        self.quad.draw(backend);

        self.render_time = started.elapsed();
        ctx.stats.record_pass(self.name(), self.render_time);
        Ok(())
    }

    fn render_time(&self) -> Duration {
        self.render_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_are_normalized_and_symmetric() {
        let kernel = GaussianKernel::new(1280, 720, 1.0);

        let sum: f32 = kernel.weights_h.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5, "weights sum to {sum}");

        for i in 0..BLUR_SAMPLE_COUNT / 2 {
            assert_eq!(kernel.weights_h[i * 2 + 1], kernel.weights_h[i * 2 + 2]);
            assert_eq!(kernel.offsets_h[i * 2 + 1], -kernel.offsets_h[i * 2 + 2]);
        }

        // Center tap carries the largest weight
        for weight in &kernel.weights_h[1..] {
            assert!(kernel.weights_h[0] >= *weight);
        }
    }

    #[test]
    fn directions_blur_along_one_axis_only() {
        let kernel = GaussianKernel::new(1280, 720, 1.0);
        for offset in &kernel.offsets_h {
            assert_eq!(offset.y, 0.0);
        }
        for offset in &kernel.offsets_v {
            assert_eq!(offset.x, 0.0);
        }
    }
}
