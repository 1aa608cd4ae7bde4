//! Bounding volumes

use glam::{Mat4, Vec3};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min: Vec3::ZERO,
            max: Vec3::ZERO,
        }
    }
}

impl BoundingBox {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box enclosing a set of points
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for point in points {
            min = min.min(point);
            max = max.max(point);
        }
        Self { min, max }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Radius of the enclosing sphere around the box center
    pub fn radius(&self) -> f32 {
        self.size().length() * 0.5
    }

    /// The eight corners, near face first
    pub fn corners(&self) -> [Vec3; 8] {
        let (min, max) = (self.min, self.max);
        [
            Vec3::new(min.x, max.y, max.z),
            Vec3::new(max.x, max.y, max.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(min.x, min.y, min.z),
        ]
    }

    /// Transform the min/max corners and renormalize per axis
    pub fn transformed(&self, matrix: Mat4) -> Self {
        let a = matrix.transform_point3(self.min);
        let b = matrix.transform_point3(self.max);
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Grow to enclose another box
    pub fn union(&self, other: &BoundingBox) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transformed_box_stays_ordered() {
        let bounds = BoundingBox::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let flipped = bounds.transformed(Mat4::from_scale(Vec3::new(-2.0, 1.0, 1.0)));
        assert!(flipped.min.x <= flipped.max.x);
        assert_eq!(flipped.min.x, -2.0);
        assert_eq!(flipped.max.x, 2.0);
    }

    #[test]
    fn corners_cover_extents() {
        let bounds = BoundingBox::new(Vec3::new(-1.0, -2.0, -3.0), Vec3::new(1.0, 2.0, 3.0));
        let rebuilt = BoundingBox::from_points(bounds.corners());
        assert_eq!(rebuilt, bounds);
    }
}
