//! Render pass contract
//!
//! A pass is a unit of GPU work with declared inputs (arena indices of other
//! passes' outputs) and outputs (targets it allocated at construction).
//! Scene, camera, backend, and stats are threaded through a `RenderContext`
//! at draw time; passes hold no device state of their own.

use crate::backend::traits::{BackendError, GpuBackend, ShaderHandle, TargetHandle, TextureHandle};
use crate::backend::types::{DepthFormat, TargetDescriptor, TextureFormat};
use crate::content::{ContentError, ContentLoader, Model};
use crate::profile::arena::{TargetArena, TargetId};
use crate::scene::camera::Camera;
use crate::scene::{Scene, SceneError};
use crate::stats::RenderStats;
use crate::ProfileConfig;
use glam::Vec2;
use std::time::Duration;
use thiserror::Error;

/// Hard failure while building or executing a render profile
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("pass '{pass}' requires {required} input targets, {wired} wired")]
    MissingInput {
        pass: &'static str,
        required: usize,
        wired: usize,
    },
    #[error("no pass registered under '{0}'")]
    UnknownPass(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Everything a pass may touch while drawing
pub struct RenderContext<'a> {
    pub backend: &'a mut dyn GpuBackend,
    pub targets: &'a TargetArena,
    pub scene: &'a mut Scene,
    pub camera: &'a Camera,
    pub stats: &'a mut RenderStats,
    pub delta_seconds: f32,
}

impl RenderContext<'_> {
    /// Resolve an arena index to its backend handle
    pub fn target(&self, id: TargetId) -> TargetHandle {
        self.targets.handle(id)
    }
}

/// A composable unit of GPU work
///
/// `set_inputs` replaces any previous wiring; `draw` must fail with
/// `RenderError::MissingInput` rather than silently skip when a required
/// input was never wired.
pub trait RenderPass {
    fn name(&self) -> &'static str;

    /// Whether the pass traverses scene geometry rather than only drawing
    /// screen-space quads
    fn has_scene_input(&self) -> bool {
        false
    }

    fn set_inputs(&mut self, inputs: &[TargetId]);

    fn inputs(&self) -> &[TargetId];

    fn outputs(&self) -> &[TargetId];

    fn draw(&mut self, ctx: &mut RenderContext<'_>) -> RenderResult<()>;

    /// Wall-clock time of the most recent `draw`
    fn render_time(&self) -> Duration;
}

/// Fail unless at least `required` inputs are wired
pub(crate) fn require_inputs(
    pass: &'static str,
    inputs: &[TargetId],
    required: usize,
) -> RenderResult<()> {
    if inputs.len() < required {
        Err(RenderError::MissingInput {
            pass,
            required,
            wired: inputs.len(),
        })
    } else {
        Ok(())
    }
}

/// Construction-time services handed to each pass: target allocation through
/// the profile's arena, and content loading. A pass never keeps this; it is
/// the profile's non-owning loan for the duration of `new`.
pub struct PassBuilder<'a> {
    pub backend: &'a mut dyn GpuBackend,
    pub content: &'a dyn ContentLoader,
    targets: &'a mut TargetArena,
    config: &'a ProfileConfig,
}

impl<'a> PassBuilder<'a> {
    pub fn new(
        backend: &'a mut dyn GpuBackend,
        content: &'a dyn ContentLoader,
        targets: &'a mut TargetArena,
        config: &'a ProfileConfig,
    ) -> Self {
        Self {
            backend,
            content,
            targets,
            config,
        }
    }

    pub fn config(&self) -> &ProfileConfig {
        self.config
    }

    /// Half-texel offset for screen-space sampling
    pub fn half_pixel(&self) -> Vec2 {
        Vec2::new(
            0.5 / self.config.width as f32,
            0.5 / self.config.height as f32,
        )
    }

    /// Allocate a render target of an explicit size
    pub fn add_render_target(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        format: TextureFormat,
        depth_format: DepthFormat,
    ) -> RenderResult<TargetId> {
        let id = self.targets.add(
            self.backend,
            TargetDescriptor {
                label: Some(label.to_string()),
                width,
                height,
                format,
                depth_format,
                ..Default::default()
            },
        )?;
        Ok(id)
    }

    /// Allocate a render target matching the back buffer size
    pub fn add_backbuffer_target(
        &mut self,
        label: &str,
        format: TextureFormat,
        depth_format: DepthFormat,
    ) -> RenderResult<TargetId> {
        self.add_render_target(
            label,
            self.config.width,
            self.config.height,
            format,
            depth_format,
        )
    }

    pub fn load_shader(&mut self, key: &str) -> RenderResult<ShaderHandle> {
        Ok(self.content.load_shader(self.backend, key)?)
    }

    pub fn load_model(&mut self, key: &str) -> RenderResult<Model> {
        Ok(self.content.load_model(self.backend, key)?)
    }

    pub fn load_texture(&mut self, key: &str) -> RenderResult<TextureHandle> {
        Ok(self.content.load_texture(self.backend, key)?)
    }
}
