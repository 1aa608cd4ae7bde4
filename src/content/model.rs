//! GPU-resident model data
//!
//! A `Model` is the already-validated output of the content pipeline: mesh
//! parts with uploaded vertex/index buffers, per-mesh local bounds, and
//! optional skinning data for animated models.

use crate::backend::traits::{BufferHandle, TextureHandle};
use crate::scene::bounds::BoundingBox;
use glam::Mat4;
use std::collections::BTreeMap;

/// Hardware limit on skinning matrices per draw
pub const MAX_BONES: usize = 72;

/// One drawable chunk of a mesh sharing a single material
#[derive(Debug, Clone)]
pub struct MeshPart {
    pub vertex_buffer: BufferHandle,
    pub index_buffer: BufferHandle,
    pub index_count: u32,
    pub triangle_count: u32,
    pub texture: Option<TextureHandle>,
}

/// A named mesh with its parts and local-space bounds
#[derive(Debug, Clone)]
pub struct ModelMesh {
    pub parts: Vec<MeshPart>,
    pub bounds: BoundingBox,
}

impl ModelMesh {
    /// Radius of the bounding sphere around the mesh bounds center
    pub fn bound_radius(&self) -> f32 {
        self.bounds.radius()
    }
}

/// A complete model: mesh list plus optional skinning data
#[derive(Debug, Clone)]
pub struct Model {
    pub meshes: Vec<ModelMesh>,
    pub skinning: Option<SkinningData>,
}

impl Model {
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }
}

/// A single keyframe: a bone's local transform at a point in time
#[derive(Debug, Clone, Copy)]
pub struct Keyframe {
    pub bone: usize,
    pub time: f32,
    pub transform: Mat4,
}

/// An animation clip as a time-sorted keyframe stream
#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub duration: f32,
    pub keyframes: Vec<Keyframe>,
}

/// Skeleton and clip data attached to a skinned model
#[derive(Debug, Clone)]
pub struct SkinningData {
    /// Local bind transforms per bone
    pub bind_pose: Vec<Mat4>,
    /// Inverse of each bone's world-space bind transform
    pub inverse_bind_pose: Vec<Mat4>,
    /// Parent bone index per bone; root bones have no parent
    pub skeleton_hierarchy: Vec<Option<usize>>,
    pub clips: BTreeMap<String, AnimationClip>,
}

impl SkinningData {
    pub fn bone_count(&self) -> usize {
        self.bind_pose.len()
    }

    /// First clip in name order, the default to start playback with
    pub fn first_clip(&self) -> Option<(&String, &AnimationClip)> {
        self.clips.iter().next()
    }
}
