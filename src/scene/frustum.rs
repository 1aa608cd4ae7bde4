//! View frustum extraction and containment tests
//!
//! Planes are pulled straight from a combined view-projection matrix
//! (Gribb-Hartmann, depth range [0, 1]); normals point into the volume, so a
//! point inside the frustum has a non-negative distance to every plane.

use crate::scene::bounds::BoundingBox;
use glam::{Mat4, Vec3, Vec4};

/// Result of a frustum containment test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    Disjoint,
    Intersects,
    Contains,
}

/// Which side of a plane a volume lies on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneIntersection {
    /// Entirely on the side the normal points to
    Front,
    Back,
    Intersecting,
}

/// A plane in normal-distance form
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f32,
}

impl Plane {
    fn from_coefficients(v: Vec4) -> Self {
        let normal = Vec3::new(v.x, v.y, v.z);
        let length = normal.length().max(f32::EPSILON);
        Self {
            normal: normal / length,
            d: v.w / length,
        }
    }

    /// Signed distance from a point to the plane
    pub fn distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.d
    }

    /// Classify a sphere against the plane
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> PlaneIntersection {
        let distance = self.distance(center);
        if distance > radius {
            PlaneIntersection::Front
        } else if distance < -radius {
            PlaneIntersection::Back
        } else {
            PlaneIntersection::Intersecting
        }
    }
}

// Plane order: left, right, bottom, top, near, far
const PLANE_NEAR: usize = 4;
const PLANE_FAR: usize = 5;

/// Six-plane view frustum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    planes: [Plane; 6],
}

impl Frustum {
    /// Extract planes from a combined view-projection matrix
    pub fn from_matrix(view_projection: Mat4) -> Self {
        let r0 = view_projection.row(0);
        let r1 = view_projection.row(1);
        let r2 = view_projection.row(2);
        let r3 = view_projection.row(3);

        Self {
            planes: [
                Plane::from_coefficients(r3 + r0),
                Plane::from_coefficients(r3 - r0),
                Plane::from_coefficients(r3 + r1),
                Plane::from_coefficients(r3 - r1),
                // z in [0, 1]: the near plane is the raw z row
                Plane::from_coefficients(r2),
                Plane::from_coefficients(r3 - r2),
            ],
        }
    }

    pub fn planes(&self) -> &[Plane; 6] {
        &self.planes
    }

    pub fn near_plane(&self) -> Plane {
        self.planes[PLANE_NEAR]
    }

    pub fn far_plane(&self) -> Plane {
        self.planes[PLANE_FAR]
    }

    /// Test an axis-aligned box against all six planes
    pub fn contains_box(&self, bounds: &BoundingBox) -> Containment {
        let mut intersecting = false;

        for plane in &self.planes {
            // Corner furthest along the plane normal
            let positive = Vec3::new(
                if plane.normal.x >= 0.0 { bounds.max.x } else { bounds.min.x },
                if plane.normal.y >= 0.0 { bounds.max.y } else { bounds.min.y },
                if plane.normal.z >= 0.0 { bounds.max.z } else { bounds.min.z },
            );
            if plane.distance(positive) < 0.0 {
                return Containment::Disjoint;
            }

            let negative = Vec3::new(
                if plane.normal.x >= 0.0 { bounds.min.x } else { bounds.max.x },
                if plane.normal.y >= 0.0 { bounds.min.y } else { bounds.max.y },
                if plane.normal.z >= 0.0 { bounds.min.z } else { bounds.max.z },
            );
            if plane.distance(negative) < 0.0 {
                intersecting = true;
            }
        }

        if intersecting {
            Containment::Intersects
        } else {
            Containment::Contains
        }
    }

    /// Test a bounding sphere against all six planes
    pub fn contains_sphere(&self, center: Vec3, radius: f32) -> Containment {
        let mut intersecting = false;

        for plane in &self.planes {
            match plane.intersects_sphere(center, radius) {
                PlaneIntersection::Back => return Containment::Disjoint,
                PlaneIntersection::Intersecting => intersecting = true,
                PlaneIntersection::Front => {}
            }
        }

        if intersecting {
            Containment::Intersects
        } else {
            Containment::Contains
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_frustum() -> Frustum {
        let view = Mat4::look_at_rh(Vec3::ZERO, -Vec3::Z, Vec3::Y);
        let projection = Mat4::perspective_rh(std::f32::consts::FRAC_PI_4, 1.0, 1.0, 100.0);
        Frustum::from_matrix(projection * view)
    }

    #[test]
    fn box_ahead_of_camera_is_contained() {
        let frustum = test_frustum();
        let bounds = BoundingBox::new(Vec3::new(-1.0, -1.0, -11.0), Vec3::new(1.0, 1.0, -9.0));
        assert_eq!(frustum.contains_box(&bounds), Containment::Contains);
    }

    #[test]
    fn box_behind_camera_is_disjoint() {
        let frustum = test_frustum();
        let bounds = BoundingBox::new(Vec3::new(-1.0, -1.0, 9.0), Vec3::new(1.0, 1.0, 11.0));
        assert_eq!(frustum.contains_box(&bounds), Containment::Disjoint);
    }

    #[test]
    fn box_straddling_far_plane_intersects() {
        let frustum = test_frustum();
        let bounds = BoundingBox::new(Vec3::new(-1.0, -1.0, -150.0), Vec3::new(1.0, 1.0, -50.0));
        assert_eq!(frustum.contains_box(&bounds), Containment::Intersects);
    }

    #[test]
    fn near_plane_classifies_spheres() {
        let frustum = test_frustum();
        let near = frustum.near_plane();

        // Sphere well beyond the near plane: fully on the normal side
        assert_eq!(
            near.intersects_sphere(Vec3::new(0.0, 0.0, -10.0), 1.0),
            PlaneIntersection::Front
        );
        // Sphere surrounding the camera straddles the near plane
        assert_eq!(
            near.intersects_sphere(Vec3::ZERO, 5.0),
            PlaneIntersection::Intersecting
        );
        // Sphere behind the camera
        assert_eq!(
            near.intersects_sphere(Vec3::new(0.0, 0.0, 10.0), 1.0),
            PlaneIntersection::Back
        );
    }
}
