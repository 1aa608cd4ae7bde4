//! Concrete render passes

pub mod antialias;
pub mod bloom;
pub mod blur;
pub mod composite;
pub mod copy;
pub mod depth_of_field;
pub mod forward;
pub mod gbuffer;
pub mod light;
pub mod quad;
pub mod scene_draw;
pub mod shadow;
pub mod ssao;

pub use antialias::AntialiasPass;
pub use bloom::BloomPass;
pub use blur::{BlurPass, GaussianKernel};
pub use composite::CompositePass;
pub use copy::CopyPass;
pub use depth_of_field::DepthOfFieldPass;
pub use forward::ForwardPass;
pub use gbuffer::{GBufferPass, SmallGBufferPass};
pub use light::LightPass;
pub use quad::ScreenQuad;
pub use ssao::SsaoPass;

use crate::profile::PassRegistry;

/// Register every built-in pass under its pipeline name
pub fn register_builtin_passes(registry: &mut PassRegistry) {
    registry.register("gbuffer", |b| Ok(Box::new(GBufferPass::new(b)?)));
    registry.register("small_gbuffer", |b| Ok(Box::new(SmallGBufferPass::new(b)?)));
    registry.register("forward", |b| Ok(Box::new(ForwardPass::new(b)?)));
    registry.register("light", |b| Ok(Box::new(LightPass::new(b)?)));
    registry.register("composite", |b| Ok(Box::new(CompositePass::new(b)?)));
    registry.register("blur", |b| Ok(Box::new(BlurPass::new(b)?)));
    registry.register("bloom", |b| Ok(Box::new(BloomPass::new(b)?)));
    registry.register("ssao", |b| Ok(Box::new(SsaoPass::new(b)?)));
    registry.register("antialias", |b| Ok(Box::new(AntialiasPass::new(b)?)));
    registry.register("depth_of_field", |b| Ok(Box::new(DepthOfFieldPass::new(b)?)));
    registry.register("copy", |b| Ok(Box::new(CopyPass::new(b)?)));
}
