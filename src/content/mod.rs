//! Content loading
//!
//! The core consumes named, ready-to-use resources: shader programs, models,
//! textures. `ContentLoader` is the boundary to whatever asset pipeline
//! feeds the renderer; `ProceduralContent` is the built-in source backed by
//! generated geometry, used by the demo scenes and the test suite.

pub mod mesh;
pub mod model;

pub use mesh::Mesh;
pub use model::{AnimationClip, Keyframe, MeshPart, Model, ModelMesh, SkinningData, MAX_BONES};

use crate::backend::traits::*;
use crate::backend::types::*;
use parking_lot::Mutex;
use std::collections::HashMap;
use thiserror::Error;

/// Content pipeline error type
///
/// All of these abort initialization; nothing here is recoverable per frame.
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("no content registered under key '{0}'")]
    MissingKey(String),
    #[error("content key '{0}' is already registered")]
    DuplicateKey(String),
    #[error("skinned model '{0}' has no animation clips")]
    NoAnimationClips(String),
    #[error("skinned model '{key}' has {bones} bones, limit is {limit}")]
    TooManyBones {
        key: String,
        bones: usize,
        limit: usize,
    },
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Loads named resources for the renderer
///
/// Implementations must be load-once: repeated loads of the same key return
/// the same handles, and a key that loaded successfully keeps working for
/// the lifetime of the loader.
pub trait ContentLoader {
    fn load_shader(
        &self,
        backend: &mut dyn GpuBackend,
        key: &str,
    ) -> Result<ShaderHandle, ContentError>;

    fn load_model(&self, backend: &mut dyn GpuBackend, key: &str) -> Result<Model, ContentError>;

    fn load_texture(
        &self,
        backend: &mut dyn GpuBackend,
        key: &str,
    ) -> Result<TextureHandle, ContentError>;
}

/// Registered source data for one model key
struct ModelSource {
    meshes: Vec<Mesh>,
    skinning: Option<SkinningData>,
}

#[derive(Default)]
struct ContentCache {
    shaders: HashMap<String, ShaderHandle>,
    models: HashMap<String, Model>,
    textures: HashMap<String, TextureHandle>,
}

/// Procedural content source with a load-once cache
pub struct ProceduralContent {
    models: Mutex<HashMap<String, ModelSource>>,
    cache: Mutex<ContentCache>,
}

impl ProceduralContent {
    pub fn new() -> Self {
        Self {
            models: Mutex::new(HashMap::new()),
            cache: Mutex::new(ContentCache::default()),
        }
    }

    /// Content source preloaded with the meshes the built-in passes expect:
    /// the unit sphere used for instanced light volumes, a cube, a ground
    /// plane, and a skybox cube.
    pub fn with_standard_meshes() -> Self {
        let content = Self::new();
        // Registration of fresh keys cannot fail
        let _ = content.register_model("ball", vec![Mesh::sphere(1.0, 16, 12)]);
        let _ = content.register_model("cube", vec![Mesh::cube(1.0)]);
        let _ = content.register_model("ground", vec![Mesh::plane(200.0, 200.0, 8)]);
        let _ = content.register_model("skybox", vec![Mesh::cube(1000.0)]);
        content
    }

    /// Register the meshes for a model key
    pub fn register_model(&self, key: &str, meshes: Vec<Mesh>) -> Result<(), ContentError> {
        self.register(key, meshes, None)
    }

    /// Register a skinned model; validates the skinning data up front
    pub fn register_skinned_model(
        &self,
        key: &str,
        meshes: Vec<Mesh>,
        skinning: SkinningData,
    ) -> Result<(), ContentError> {
        if skinning.clips.is_empty() {
            return Err(ContentError::NoAnimationClips(key.to_string()));
        }
        if skinning.bone_count() > MAX_BONES {
            return Err(ContentError::TooManyBones {
                key: key.to_string(),
                bones: skinning.bone_count(),
                limit: MAX_BONES,
            });
        }
        self.register(key, meshes, Some(skinning))
    }

    fn register(
        &self,
        key: &str,
        meshes: Vec<Mesh>,
        skinning: Option<SkinningData>,
    ) -> Result<(), ContentError> {
        let mut models = self.models.lock();
        if models.contains_key(key) {
            return Err(ContentError::DuplicateKey(key.to_string()));
        }
        models.insert(key.to_string(), ModelSource { meshes, skinning });
        Ok(())
    }

    fn upload_model(
        &self,
        backend: &mut dyn GpuBackend,
        key: &str,
        source: &ModelSource,
    ) -> Result<Model, ContentError> {
        let mut meshes = Vec::with_capacity(source.meshes.len());

        for (index, mesh) in source.meshes.iter().enumerate() {
            let vertex_buffer = backend.create_buffer_init(
                &BufferDescriptor {
                    label: Some(format!("{key}.{index}.vertices")),
                    size: mesh.vertex_bytes().len() as u64,
                    usage: BufferUsage::VERTEX,
                },
                mesh.vertex_bytes(),
            )?;
            let index_buffer = backend.create_buffer_init(
                &BufferDescriptor {
                    label: Some(format!("{key}.{index}.indices")),
                    size: mesh.index_bytes().len() as u64,
                    usage: BufferUsage::INDEX,
                },
                mesh.index_bytes(),
            )?;

            meshes.push(ModelMesh {
                parts: vec![MeshPart {
                    vertex_buffer,
                    index_buffer,
                    index_count: mesh.index_count() as u32,
                    triangle_count: mesh.triangle_count() as u32,
                    texture: None,
                }],
                bounds: mesh.bounds(),
            });
        }

        Ok(Model {
            meshes,
            skinning: source.skinning.clone(),
        })
    }
}

impl Default for ProceduralContent {
    fn default() -> Self {
        Self::with_standard_meshes()
    }
}

impl ContentLoader for ProceduralContent {
    fn load_shader(
        &self,
        backend: &mut dyn GpuBackend,
        key: &str,
    ) -> Result<ShaderHandle, ContentError> {
        let mut cache = self.cache.lock();
        if let Some(&shader) = cache.shaders.get(key) {
            return Ok(shader);
        }
        let shader = backend.create_shader(key)?;
        cache.shaders.insert(key.to_string(), shader);
        Ok(shader)
    }

    fn load_model(&self, backend: &mut dyn GpuBackend, key: &str) -> Result<Model, ContentError> {
        {
            let cache = self.cache.lock();
            if let Some(model) = cache.models.get(key) {
                return Ok(model.clone());
            }
        }

        let models = self.models.lock();
        let source = models
            .get(key)
            .ok_or_else(|| ContentError::MissingKey(key.to_string()))?;
        let model = self.upload_model(backend, key, source)?;

        self.cache
            .lock()
            .models
            .insert(key.to_string(), model.clone());
        Ok(model)
    }

    fn load_texture(
        &self,
        backend: &mut dyn GpuBackend,
        key: &str,
    ) -> Result<TextureHandle, ContentError> {
        let mut cache = self.cache.lock();
        if let Some(&texture) = cache.textures.get(key) {
            return Ok(texture);
        }

        // Generated 4x4 placeholder; real texture content is out of scope
        let desc = TextureDescriptor {
            label: Some(key.to_string()),
            width: 4,
            height: 4,
            format: TextureFormat::Rgba8Unorm,
        };
        let data = vec![0xffu8; (desc.width * desc.height * 4) as usize];
        let texture = backend.create_texture(&desc, &data)?;
        cache.textures.insert(key.to_string(), texture);
        Ok(texture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;

    #[test]
    fn loads_are_cached_per_key() {
        let mut backend = HeadlessBackend::new();
        let content = ProceduralContent::with_standard_meshes();

        let a = content.load_shader(&mut backend, "depth").unwrap();
        let b = content.load_shader(&mut backend, "depth").unwrap();
        assert_eq!(a, b);

        let first = content.load_model(&mut backend, "ball").unwrap();
        let second = content.load_model(&mut backend, "ball").unwrap();
        assert_eq!(
            first.meshes[0].parts[0].vertex_buffer,
            second.meshes[0].parts[0].vertex_buffer
        );
    }

    #[test]
    fn missing_key_is_an_error() {
        let mut backend = HeadlessBackend::new();
        let content = ProceduralContent::new();
        assert!(matches!(
            content.load_model(&mut backend, "nope"),
            Err(ContentError::MissingKey(_))
        ));
    }

    #[test]
    fn skinned_model_without_clips_is_rejected() {
        let content = ProceduralContent::new();
        let skinning = SkinningData {
            bind_pose: vec![glam::Mat4::IDENTITY],
            inverse_bind_pose: vec![glam::Mat4::IDENTITY],
            skeleton_hierarchy: vec![None],
            clips: Default::default(),
        };
        assert!(matches!(
            content.register_skinned_model("walker", vec![Mesh::cube(1.0)], skinning),
            Err(ContentError::NoAnimationClips(_))
        ));
    }
}
