//! Forward diffuse pass
//!
//! Renders material color the classic way into a single target; the light
//! pre-pass strategy composites this against the accumulated light buffer.

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::passes::scene_draw;
use crate::profile::pass::*;
use crate::profile::TargetId;
use crate::scene::visibility;
use std::time::{Duration, Instant};

pub struct ForwardPass {
    outputs: [TargetId; 1],
    inputs: Vec<TargetId>,

    scene_shader: ShaderHandle,

    render_time: Duration,
}

impl ForwardPass {
    pub fn new(builder: &mut PassBuilder<'_>) -> RenderResult<Self> {
        let diffuse = builder.add_backbuffer_target(
            "forward.diffuse",
            TextureFormat::Rgba8Unorm,
            DepthFormat::Depth24Stencil8,
        )?;
        let scene_shader = builder.load_shader("gbuffer")?;

        Ok(Self {
            outputs: [diffuse],
            inputs: Vec::new(),
            scene_shader,
            render_time: Duration::ZERO,
        })
    }
}

impl RenderPass for ForwardPass {
    fn name(&self) -> &'static str {
        "forward"
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
        let diffuse = ctx.target(self.outputs[0]);

        let backend = &mut *ctx.backend;
        backend.set_render_targets(&[diffuse]);
        backend.clear(Some([0.0; 4]), Some(1.0));
        backend.set_depth_state(DepthStencilState::DEFAULT);
        backend.set_blend_state(BlendState::opaque());

        visibility::cull_lights(ctx.scene, ctx.camera);
        visibility::cull_model_meshes(ctx.scene, ctx.camera);

        backend.set_param(self.scene_shader, "View", ShaderParam::Mat4(ctx.camera.view()));
        backend.set_param(
            self.scene_shader,
            "Projection",
            ShaderParam::Mat4(ctx.camera.projection()),
        );

        scene_draw::draw_scene(backend, ctx.scene, self.scene_shader, "ForwardRender");
        scene_draw::draw_skybox(backend, ctx.scene, ctx.camera, self.scene_shader, "Skybox");

        self.render_time = started.elapsed();
        ctx.stats.record_pass(self.name(), self.render_time);
        Ok(())
    }

    fn render_time(&self) -> Duration {
        self.render_time
    }
}
