//! CPU-side mesh data and procedural generation

use crate::backend::types::Vertex;
use crate::scene::bounds::BoundingBox;
use glam::{Vec2, Vec3, Vec4};

/// A mesh with vertex and index data
#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub name: String,
}

impl Mesh {
    pub fn new(name: &str) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            name: name.to_string(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Local-space bounds of the vertex positions
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::from_points(self.vertices.iter().map(|v| v.position))
    }

    fn push(&mut self, position: Vec3, normal: Vec3, uv: Vec2, tangent: Vec4) {
        self.vertices.push(Vertex {
            position,
            normal,
            uv,
            tangent,
        });
    }

    /// Axis-aligned box mesh centered at the origin
    pub fn cube(extent: f32) -> Self {
        let mut mesh = Mesh::new("cube");
        let h = extent * 0.5;

        // One quad per face: normal, tangent, and the corner offsets in the
        // face plane
        let faces: [(Vec3, Vec3, Vec3); 6] = [
            (Vec3::Z, Vec3::X, Vec3::Y),
            (-Vec3::Z, -Vec3::X, Vec3::Y),
            (Vec3::X, -Vec3::Z, Vec3::Y),
            (-Vec3::X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, -Vec3::Z),
            (-Vec3::Y, Vec3::X, Vec3::Z),
        ];

        for (face, (normal, right, up)) in faces.iter().enumerate() {
            let origin = *normal * h;
            let corners = [
                origin - *right * h - *up * h,
                origin + *right * h - *up * h,
                origin + *right * h + *up * h,
                origin - *right * h + *up * h,
            ];
            let uvs = [
                Vec2::new(0.0, 1.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(0.0, 0.0),
            ];
            for (corner, uv) in corners.iter().zip(uvs) {
                mesh.push(*corner, *normal, uv, right.extend(1.0));
            }
            let base = (face * 4) as u32;
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        mesh
    }

    /// UV sphere with the given radius; a unit radius makes the mesh usable
    /// as an instanced light volume scaled by the light radius
    pub fn sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let mut mesh = Mesh::new("sphere");

        for ring in 0..=rings {
            let phi = ring as f32 / rings as f32 * std::f32::consts::PI;
            let y = phi.cos();
            let ring_radius = phi.sin();

            for segment in 0..=segments {
                let theta = segment as f32 / segments as f32 * std::f32::consts::TAU;
                let normal = Vec3::new(ring_radius * theta.cos(), y, ring_radius * theta.sin());
                let tangent = Vec3::new(-theta.sin(), 0.0, theta.cos());
                mesh.push(
                    normal * radius,
                    normal,
                    Vec2::new(
                        segment as f32 / segments as f32,
                        ring as f32 / rings as f32,
                    ),
                    tangent.extend(1.0),
                );
            }
        }

        for ring in 0..rings {
            for segment in 0..segments {
                let current = ring * (segments + 1) + segment;
                let next = current + segments + 1;
                mesh.indices.extend_from_slice(&[
                    current,
                    next,
                    current + 1,
                    current + 1,
                    next,
                    next + 1,
                ]);
            }
        }

        mesh
    }

    /// Flat plane on the XZ axis
    pub fn plane(width: f32, depth: f32, subdivisions: u32) -> Self {
        let mut mesh = Mesh::new("plane");
        let steps = subdivisions.max(1);

        for z in 0..=steps {
            for x in 0..=steps {
                let u = x as f32 / steps as f32;
                let v = z as f32 / steps as f32;
                mesh.push(
                    Vec3::new((u - 0.5) * width, 0.0, (v - 0.5) * depth),
                    Vec3::Y,
                    Vec2::new(u, v),
                    Vec4::new(1.0, 0.0, 0.0, 1.0),
                );
            }
        }

        for z in 0..steps {
            for x in 0..steps {
                let current = z * (steps + 1) + x;
                let next = current + steps + 1;
                mesh.indices.extend_from_slice(&[
                    current,
                    next,
                    current + 1,
                    current + 1,
                    next,
                    next + 1,
                ]);
            }
        }

        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_bounds_match_extent() {
        let mesh = Mesh::cube(2.0);
        let bounds = mesh.bounds();
        assert_eq!(bounds.min, Vec3::splat(-1.0));
        assert_eq!(bounds.max, Vec3::splat(1.0));
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn sphere_vertices_sit_on_radius() {
        let mesh = Mesh::sphere(3.0, 16, 8);
        for vertex in &mesh.vertices {
            assert!((vertex.position.length() - 3.0).abs() < 1e-4);
        }
    }
}
