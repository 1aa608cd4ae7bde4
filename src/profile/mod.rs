//! Render profiles and the pass factory
//!
//! A profile is the composition root for one rendering strategy: it
//! constructs passes, owns their render targets through the arena, wires
//! pass inputs to upstream outputs, and drives per-frame execution in a
//! fixed dependency order.

pub mod arena;
pub mod pass;

pub use arena::{TargetArena, TargetId};
pub use pass::{PassBuilder, RenderContext, RenderError, RenderPass, RenderResult};

use crate::backend::traits::GpuBackend;
use crate::scene::camera::Camera;
use crate::scene::Scene;
use crate::stats::RenderStats;
use std::collections::HashMap;

/// Factory closure producing a boxed pass
pub type PassFactory = Box<dyn Fn(&mut PassBuilder<'_>) -> RenderResult<Box<dyn RenderPass>>>;

/// Explicit registration map from pass names to factories
///
/// Profiles that assemble their pipeline by name look passes up here; the
/// map is populated at startup, so an unknown name is a configuration error
/// rather than a reflection miss.
#[derive(Default)]
pub struct PassRegistry {
    factories: HashMap<String, PassFactory>,
}

impl PassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with every built-in pass
    pub fn with_builtin_passes() -> Self {
        let mut registry = Self::new();
        crate::passes::register_builtin_passes(&mut registry);
        registry
    }

    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&mut PassBuilder<'_>) -> RenderResult<Box<dyn RenderPass>> + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    /// Construct a pass by name
    pub fn create(
        &self,
        name: &str,
        builder: &mut PassBuilder<'_>,
    ) -> RenderResult<Box<dyn RenderPass>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| RenderError::UnknownPass(name.to_string()))?;
        factory(builder)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

/// A rendering strategy driving passes in dependency order
pub trait RenderProfile {
    /// Wire each pass's inputs to its upstream outputs. Call whenever the
    /// active scene or camera changes; wiring twice with the same scene and
    /// camera yields identical bindings.
    fn map_inputs(&mut self);

    /// Execute every pass in the strategy's fixed order
    fn draw(
        &mut self,
        backend: &mut dyn GpuBackend,
        scene: &mut Scene,
        camera: &Camera,
        delta_seconds: f32,
    ) -> RenderResult<()>;

    /// Final composed image, set by `draw`
    fn output(&self) -> Option<TargetId>;

    /// Intermediate buffers for visualization
    fn debug_targets(&self) -> &[TargetId];

    fn stats(&self) -> &RenderStats;

    /// Destroy all render targets owned by this profile
    fn dispose(&mut self, backend: &mut dyn GpuBackend);
}
