//! Shadow atlas tiling and light-space projection math
//!
//! Directional shadows render one mesh per fixed-size tile of a shared
//! atlas, in priority order up to a per-frame budget. Each tile gets its own
//! light view-projection fitted tightly around the mesh's world bounds
//! rotated into light space.

use crate::backend::types::Viewport;
use glam::{Mat4, Vec2, Vec3};

/// Tiles per atlas row; the atlas is square
pub const SHADOW_ATLAS_TILES: u32 = 8;

/// Meshes shadowed per frame; entries past this are dropped
pub const SHADOW_MESH_BUDGET: usize = (SHADOW_ATLAS_TILES * SHADOW_ATLAS_TILES) as usize;

/// Tiles flushed per projection batch
pub const SHADOW_BATCH_SIZE: usize = 12;

/// Far-extent multiplier keeping casters from clipping out of the light box
pub const DEFAULT_PROJECTION_SCALE: f32 = 25.0;

const MIN_DIRECTION_LENGTH: f32 = 1e-4;

/// Minimum light-box extent; flat geometry is clamped, not rejected
const MIN_BOX_EXTENT: f32 = 1e-3;

/// Atlas tile for a mesh index, as `(row, column)`; `None` past the budget
pub fn atlas_tile(index: usize) -> Option<(u32, u32)> {
    if index >= SHADOW_MESH_BUDGET {
        return None;
    }
    let index = index as u32;
    Some((index / SHADOW_ATLAS_TILES, index % SHADOW_ATLAS_TILES))
}

/// Viewport covering a mesh's atlas tile
pub fn tile_viewport(index: usize, tile_size: u32) -> Option<Viewport> {
    let (row, col) = atlas_tile(index)?;
    Some(Viewport::new(
        (tile_size * col) as f32,
        (tile_size * row) as f32,
        tile_size as f32,
        tile_size as f32,
    ))
}

/// Normalized UV offset of a mesh's atlas tile
pub fn tile_uv_offset(index: usize) -> Option<Vec2> {
    let (row, col) = atlas_tile(index)?;
    let tiles = SHADOW_ATLAS_TILES as f32;
    Some(Vec2::new(col as f32 / tiles, row as f32 / tiles))
}

/// Light-space view and projection fitted around a set of world points
#[derive(Debug, Clone, Copy)]
pub struct LightProjection {
    pub view: Mat4,
    pub projection: Mat4,
}

impl LightProjection {
    pub fn matrix(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// Build the view-projection for a directional light around `points`
/// (typically the eight corners of a mesh's world bounds, or of a cascade
/// band).
///
/// Rotates the points into a light-aligned frame, takes the axis-aligned
/// box around them, places the eye at the center of the box's back face,
/// and projects orthographically to the box extents. The far extent is
/// stretched by `projection_scale` so long casters stay inside the volume.
pub fn light_projection(direction: Vec3, points: &[Vec3; 8], projection_scale: f32) -> LightProjection {
    let direction = sanitize_direction(direction);
    let up = light_up(direction);

    let rotation = Mat4::look_at_rh(Vec3::ZERO, -direction, up);

    let mut min = Vec3::splat(f32::MAX);
    let mut max = Vec3::splat(f32::MIN);
    for point in points {
        let rotated = rotation.transform_point3(*point);
        min = min.min(rotated);
        max = max.max(rotated);
    }

    let box_size = (max - min).max(Vec3::splat(MIN_BOX_EXTENT));
    let half = box_size * 0.5;

    // Eye at the center of the box's back face, pushed back to world space
    let mut eye = min + half;
    eye.z = min.z;
    let eye = rotation.inverse().transform_point3(eye);

    let view = Mat4::look_at_rh(eye, eye + direction, up);
    let projection = Mat4::orthographic_rh(
        -half.x,
        half.x,
        -half.y,
        half.y,
        -box_size.z,
        box_size.z * projection_scale,
    );

    LightProjection { view, projection }
}

fn sanitize_direction(direction: Vec3) -> Vec3 {
    if direction.length() < MIN_DIRECTION_LENGTH {
        log::warn!("degenerate light direction {direction}, using -Y");
        -Vec3::Y
    } else {
        direction.normalize()
    }
}

// Pick an up axis that never runs parallel to the light
fn light_up(direction: Vec3) -> Vec3 {
    if direction.abs().dot(Vec3::Y) > 0.95 {
        Vec3::Z
    } else {
        Vec3::Y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::bounds::BoundingBox;

    #[test]
    fn tiles_follow_the_eight_wide_layout() {
        assert_eq!(atlas_tile(0), Some((0, 0)));
        assert_eq!(atlas_tile(9), Some((1, 1)));
        assert_eq!(atlas_tile(63), Some((7, 7)));
        assert_eq!(atlas_tile(64), None);
    }

    #[test]
    fn tile_viewports_step_by_tile_size() {
        let viewport = tile_viewport(9, 384).unwrap();
        assert_eq!(viewport.x, 384.0);
        assert_eq!(viewport.y, 384.0);
        assert_eq!(viewport.width, 384.0);

        let last = tile_viewport(63, 384).unwrap();
        assert_eq!(last.x, 7.0 * 384.0);
        assert_eq!(last.y, 7.0 * 384.0);

        assert!(tile_viewport(64, 384).is_none());
    }

    #[test]
    fn uv_offsets_are_tile_fractions() {
        assert_eq!(tile_uv_offset(0), Some(Vec2::ZERO));
        assert_eq!(tile_uv_offset(9), Some(Vec2::new(0.125, 0.125)));
        assert_eq!(tile_uv_offset(63), Some(Vec2::new(0.875, 0.875)));
        assert_eq!(tile_uv_offset(64), None);
    }

    #[test]
    fn light_projection_encloses_the_points() {
        let bounds = BoundingBox::new(Vec3::new(-2.0, 0.0, -3.0), Vec3::new(4.0, 5.0, 1.0));
        let direction = Vec3::new(0.3, -1.0, 0.2).normalize();
        let light = light_projection(direction, &bounds.corners(), DEFAULT_PROJECTION_SCALE);

        let view_proj = light.matrix();
        for corner in bounds.corners() {
            let clip = view_proj * corner.extend(1.0);
            let ndc = clip.truncate() / clip.w;
            assert!(ndc.x >= -1.0 - 1e-3 && ndc.x <= 1.0 + 1e-3, "x out of box: {ndc}");
            assert!(ndc.y >= -1.0 - 1e-3 && ndc.y <= 1.0 + 1e-3, "y out of box: {ndc}");
            assert!(ndc.z >= -1e-3 && ndc.z <= 1.0 + 1e-3, "z out of box: {ndc}");
        }
    }

    #[test]
    fn zero_direction_is_clamped_not_propagated() {
        let bounds = BoundingBox::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let light = light_projection(Vec3::ZERO, &bounds.corners(), DEFAULT_PROJECTION_SCALE);
        assert!(light.matrix().is_finite());
    }
}
