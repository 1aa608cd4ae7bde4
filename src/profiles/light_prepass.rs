//! Light pre-pass profile
//!
//! Lighting is computed against a small G-buffer (normal + depth) before
//! material shading; a forward pass supplies diffuse color and the
//! compositor combines the two. Passes are assembled by name through the
//! registry, the route for pipelines configured from data.

use crate::backend::traits::GpuBackend;
use crate::content::ContentLoader;
use crate::profile::pass::{PassBuilder, RenderContext, RenderResult};
use crate::profile::{PassRegistry, RenderPass, RenderProfile, TargetArena, TargetId};
use crate::scene::camera::Camera;
use crate::scene::Scene;
use crate::stats::RenderStats;
use crate::ProfileConfig;

pub struct LightPrePassProfile {
    config: ProfileConfig,
    targets: TargetArena,
    stats: RenderStats,

    forward: Box<dyn RenderPass>,
    small_gbuffer: Box<dyn RenderPass>,
    lights: Box<dyn RenderPass>,
    ssao: Box<dyn RenderPass>,
    composite: Box<dyn RenderPass>,
    antialias: Box<dyn RenderPass>,
    bloom: Box<dyn RenderPass>,

    output: Option<TargetId>,
    debug_targets: Vec<TargetId>,
}

impl LightPrePassProfile {
    pub fn new(
        backend: &mut dyn GpuBackend,
        content: &dyn ContentLoader,
        config: ProfileConfig,
    ) -> RenderResult<Self> {
        let registry = PassRegistry::with_builtin_passes();
        Self::with_registry(backend, content, config, &registry)
    }

    /// Assemble the profile from an explicit registry
    pub fn with_registry(
        backend: &mut dyn GpuBackend,
        content: &dyn ContentLoader,
        config: ProfileConfig,
        registry: &PassRegistry,
    ) -> RenderResult<Self> {
        let mut targets = TargetArena::new();
        let mut builder = PassBuilder::new(backend, content, &mut targets, &config);

        let forward = registry.create("forward", &mut builder)?;
        let small_gbuffer = registry.create("small_gbuffer", &mut builder)?;
        let lights = registry.create("light", &mut builder)?;
        let ssao = registry.create("ssao", &mut builder)?;
        let composite = registry.create("composite", &mut builder)?;
        let antialias = registry.create("antialias", &mut builder)?;
        let bloom = registry.create("bloom", &mut builder)?;

        log::info!(
            "light pre-pass profile ready: {} render targets at {}x{}",
            targets.len(),
            config.width,
            config.height
        );

        let mut profile = Self {
            config,
            targets,
            stats: RenderStats::new(),
            forward,
            small_gbuffer,
            lights,
            ssao,
            composite,
            antialias,
            bloom,
            output: None,
            debug_targets: Vec::new(),
        };
        profile.map_inputs();
        Ok(profile)
    }
}

impl RenderProfile for LightPrePassProfile {
    fn map_inputs(&mut self) {
        self.debug_targets.clear();

        let g_normal = self.small_gbuffer.outputs()[0];
        let g_depth = self.small_gbuffer.outputs()[1];
        let diffuse = self.forward.outputs()[0];

        self.lights.set_inputs(&[g_normal, g_depth]);
        self.ssao.set_inputs(&[g_normal, g_depth]);

        let light_map = self.lights.outputs()[0];
        let occlusion = self.ssao.outputs()[0];
        self.composite.set_inputs(&[diffuse, light_map, occlusion]);

        let combined = self.composite.outputs()[0];
        self.antialias.set_inputs(&[combined]);

        let smoothed = self.antialias.outputs()[0];
        self.bloom.set_inputs(&[smoothed]);

        self.debug_targets
            .extend([diffuse, g_normal, light_map, self.lights.outputs()[2]]);
    }

    fn draw(
        &mut self,
        backend: &mut dyn GpuBackend,
        scene: &mut Scene,
        camera: &Camera,
        delta_seconds: f32,
    ) -> RenderResult<()> {
        self.stats.begin_frame();
        scene.draw_calls = 0;
        scene.total_polys = 0;

        let mut ctx = RenderContext {
            backend,
            targets: &self.targets,
            scene,
            camera,
            stats: &mut self.stats,
            delta_seconds,
        };

        // Material color first, then lighting against the small G-buffer
        self.forward.draw(&mut ctx)?;
        self.small_gbuffer.draw(&mut ctx)?;
        self.lights.draw(&mut ctx)?;
        if self.config.enable_ssao {
            self.ssao.draw(&mut ctx)?;
        }
        self.composite.draw(&mut ctx)?;
        self.antialias.draw(&mut ctx)?;

        self.output = if self.config.enable_bloom {
            self.bloom.draw(&mut ctx)?;
            Some(self.bloom.outputs()[0])
        } else {
            Some(self.antialias.outputs()[0])
        };

        self.stats.end_frame(delta_seconds);
        Ok(())
    }

    fn output(&self) -> Option<TargetId> {
        self.output
    }

    fn debug_targets(&self) -> &[TargetId] {
        &self.debug_targets
    }

    fn stats(&self) -> &RenderStats {
        &self.stats
    }

    fn dispose(&mut self, backend: &mut dyn GpuBackend) {
        self.targets.dispose(backend);
        self.output = None;
        self.debug_targets.clear();
    }
}
