//! Model instances
//!
//! A `ModelInstance` pairs a loaded model with its placement in the scene:
//! scale, rotation, and translation composed into a world matrix (never
//! decomposed back), the world-space mesh bounds that follow it, and the
//! per-frame visibility results the culler writes.

use crate::content::model::Model;
use crate::scene::animation::AnimationPlayer;
use crate::scene::bounds::BoundingBox;
use glam::{Mat4, Quat, Vec2, Vec3};

/// A placed model with per-frame culling state
#[derive(Debug, Clone)]
pub struct ModelInstance {
    pub model: Model,

    position: Vec3,
    scaling: Vec3,
    rotation: Quat,
    transform: Mat4,

    /// World-space bounds per mesh, refreshed whenever the transform changes
    world_bounds: Vec<BoundingBox>,
    /// World-space bounds centers per mesh
    mesh_positions: Vec<Vec3>,
    /// Projected screen positions per mesh, written by the culler
    screen_positions: Vec<Vec2>,

    visible_meshes: Vec<usize>,

    pub animation: Option<AnimationPlayer>,
}

impl ModelInstance {
    pub fn new(model: Model) -> Self {
        let mesh_count = model.mesh_count();
        let animation = model.skinning.clone().map(AnimationPlayer::new);
        let mut instance = Self {
            model,
            position: Vec3::ZERO,
            scaling: Vec3::ONE,
            rotation: Quat::IDENTITY,
            transform: Mat4::IDENTITY,
            world_bounds: vec![BoundingBox::default(); mesh_count],
            mesh_positions: vec![Vec3::ZERO; mesh_count],
            screen_positions: vec![Vec2::ZERO; mesh_count],
            visible_meshes: Vec::with_capacity(mesh_count),
            animation,
        };
        instance.update_matrix();
        instance
    }

    /// Move the instance; chain with other builders, then `update_matrix`
    pub fn translate(&mut self, position: Vec3) -> &mut Self {
        self.position = position;
        self
    }

    pub fn scale(&mut self, scale: f32) -> &mut Self {
        self.scaling = Vec3::splat(scale);
        self
    }

    pub fn scale_xyz(&mut self, scale: Vec3) -> &mut Self {
        self.scaling = scale;
        self
    }

    /// Set rotation from pitch/yaw/roll in degrees
    pub fn rotate(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
        self.rotation = Quat::from_euler(
            glam::EulerRot::YXZ,
            y.to_radians(),
            x.to_radians(),
            z.to_radians(),
        );
        self
    }

    pub fn rotate_quat(&mut self, rotation: Quat) -> &mut Self {
        self.rotation = rotation;
        self
    }

    /// Recompose the world matrix and refresh the world-space mesh bounds
    pub fn update_matrix(&mut self) -> Mat4 {
        self.transform =
            Mat4::from_scale_rotation_translation(self.scaling, self.rotation, self.position);

        for (index, mesh) in self.model.meshes.iter().enumerate() {
            let bounds = mesh.bounds.transformed(self.transform);
            self.world_bounds[index] = bounds;
            self.mesh_positions[index] = bounds.center();
        }

        self.transform
    }

    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn scaling(&self) -> Vec3 {
        self.scaling
    }

    pub fn mesh_count(&self) -> usize {
        self.model.mesh_count()
    }

    pub fn world_bounds(&self) -> &[BoundingBox] {
        &self.world_bounds
    }

    pub fn mesh_positions(&self) -> &[Vec3] {
        &self.mesh_positions
    }

    pub fn screen_positions(&self) -> &[Vec2] {
        &self.screen_positions
    }

    pub(crate) fn set_screen_position(&mut self, mesh: usize, position: Vec2) {
        self.screen_positions[mesh] = position;
    }

    pub(crate) fn set_world_bounds(&mut self, mesh: usize, bounds: BoundingBox) {
        self.world_bounds[mesh] = bounds;
    }

    // Per-frame visibility results

    pub fn clear_visible(&mut self) {
        self.visible_meshes.clear();
    }

    pub fn mark_visible(&mut self, mesh: usize) {
        self.visible_meshes.push(mesh);
    }

    pub fn visible_meshes(&self) -> &[usize] {
        &self.visible_meshes
    }

    pub fn visible_count(&self) -> usize {
        self.visible_meshes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::traits::BufferHandle;
    use crate::content::model::{MeshPart, ModelMesh};

    fn test_model() -> Model {
        Model {
            meshes: vec![ModelMesh {
                parts: vec![MeshPart {
                    vertex_buffer: BufferHandle(0),
                    index_buffer: BufferHandle(1),
                    index_count: 36,
                    triangle_count: 12,
                    texture: None,
                }],
                bounds: BoundingBox::new(Vec3::splat(-1.0), Vec3::splat(1.0)),
            }],
            skinning: None,
        }
    }

    #[test]
    fn world_bounds_follow_the_transform() {
        let mut instance = ModelInstance::new(test_model());
        instance.translate(Vec3::new(10.0, 0.0, 0.0)).scale(2.0);
        instance.update_matrix();

        let bounds = instance.world_bounds()[0];
        assert_eq!(bounds.min, Vec3::new(8.0, -2.0, -2.0));
        assert_eq!(bounds.max, Vec3::new(12.0, 2.0, 2.0));
        assert_eq!(instance.mesh_positions()[0], Vec3::new(10.0, 0.0, 0.0));
    }
}
