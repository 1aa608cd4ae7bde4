//! Deferred shading profile
//!
//! Pass order: GBuffer -> Lights -> SSAO -> Composite -> Antialias -> Bloom.
//! Passes are constructed directly; the light pre-pass profile shows the
//! name-keyed factory route.

use crate::backend::traits::GpuBackend;
use crate::content::ContentLoader;
use crate::passes::{AntialiasPass, BloomPass, CompositePass, GBufferPass, LightPass, SsaoPass};
use crate::profile::pass::{PassBuilder, RenderContext, RenderResult};
use crate::profile::{RenderPass, RenderProfile, TargetArena, TargetId};
use crate::scene::camera::Camera;
use crate::scene::Scene;
use crate::stats::RenderStats;
use crate::ProfileConfig;

pub struct DeferredProfile {
    config: ProfileConfig,
    targets: TargetArena,
    stats: RenderStats,

    gbuffer: GBufferPass,
    lights: LightPass,
    ssao: SsaoPass,
    composite: CompositePass,
    antialias: AntialiasPass,
    bloom: BloomPass,

    output: Option<TargetId>,
    debug_targets: Vec<TargetId>,
}

impl DeferredProfile {
    pub fn new(
        backend: &mut dyn GpuBackend,
        content: &dyn ContentLoader,
        config: ProfileConfig,
    ) -> RenderResult<Self> {
        let mut targets = TargetArena::new();
        let mut builder = PassBuilder::new(backend, content, &mut targets, &config);

        let gbuffer = GBufferPass::new(&mut builder)?;
        let lights = LightPass::new(&mut builder)?;
        let ssao = SsaoPass::new(&mut builder)?;
        let mut composite = CompositePass::new(&mut builder)?;
        let antialias = AntialiasPass::new(&mut builder)?;
        let bloom = BloomPass::new(&mut builder)?;

        composite.include_ssao = config.enable_ssao;

        log::info!(
            "deferred profile ready: {} render targets at {}x{}",
            targets.len(),
            config.width,
            config.height
        );

        let mut profile = Self {
            config,
            targets,
            stats: RenderStats::new(),
            gbuffer,
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

impl RenderProfile for DeferredProfile {
    fn map_inputs(&mut self) {
        self.debug_targets.clear();

        let [g_normal, g_depth, g_albedo] = [
            self.gbuffer.outputs()[0],
            self.gbuffer.outputs()[1],
            self.gbuffer.outputs()[2],
        ];

        self.lights.set_inputs(&[g_normal, g_depth]);
        self.ssao.set_inputs(&[g_normal, g_depth]);

        let light_map = self.lights.outputs()[0];
        let occlusion = self.ssao.outputs()[0];
        self.composite.set_inputs(&[g_albedo, light_map, occlusion]);

        let combined = self.composite.outputs()[0];
        self.antialias.set_inputs(&[combined]);

        let smoothed = self.antialias.outputs()[0];
        self.bloom.set_inputs(&[smoothed]);

        self.debug_targets
            .extend([g_normal, g_depth, g_albedo, light_map]);
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

        self.gbuffer.draw(&mut ctx)?;
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
