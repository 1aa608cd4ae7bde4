//! Render target arena
//!
//! Every render target a profile's passes allocate lives here. Passes store
//! `TargetId` indices instead of handles or references, so re-initializing a
//! profile can never leave a pass pointing at a destroyed target. The arena
//! is disposed as a whole when its owning profile goes away.

use crate::backend::traits::{BackendResult, GpuBackend, TargetHandle};
use crate::backend::types::TargetDescriptor;

/// Index of a render target within a profile's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(pub(crate) u32);

struct TargetEntry {
    handle: TargetHandle,
    desc: TargetDescriptor,
}

/// Profile-owned arena of render targets
#[derive(Default)]
pub struct TargetArena {
    entries: Vec<TargetEntry>,
}

impl TargetArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a render target and return its arena index
    pub fn add(
        &mut self,
        backend: &mut dyn GpuBackend,
        desc: TargetDescriptor,
    ) -> BackendResult<TargetId> {
        let handle = backend.create_target(&desc)?;
        let id = TargetId(self.entries.len() as u32);
        self.entries.push(TargetEntry { handle, desc });
        Ok(id)
    }

    /// Backend handle for an id minted by this arena
    pub fn handle(&self, id: TargetId) -> TargetHandle {
        self.entries[id.0 as usize].handle
    }

    pub fn desc(&self, id: TargetId) -> &TargetDescriptor {
        &self.entries[id.0 as usize].desc
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Destroy every target in the arena
    pub fn dispose(&mut self, backend: &mut dyn GpuBackend) {
        for entry in self.entries.drain(..) {
            backend.destroy_target(entry.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::{DepthFormat, TextureFormat};
    use crate::backend::HeadlessBackend;

    #[test]
    fn dispose_destroys_every_target() {
        let mut backend = HeadlessBackend::new();
        let mut arena = TargetArena::new();

        for i in 0..3 {
            arena
                .add(
                    &mut backend,
                    TargetDescriptor {
                        label: Some(format!("target_{i}")),
                        width: 64,
                        height: 64,
                        format: TextureFormat::Rgba8Unorm,
                        depth_format: DepthFormat::None,
                        ..Default::default()
                    },
                )
                .unwrap();
        }

        assert_eq!(backend.live_target_count(), 3);
        arena.dispose(&mut backend);
        assert_eq!(backend.live_target_count(), 0);
        assert!(arena.is_empty());
    }
}
