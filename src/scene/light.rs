//! Light types

use crate::backend::types::{VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode};
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Per-instance vertex record for point light volumes: a 4x4 transform plus
/// a packed RGBA color, fed straight to the instance vertex stream
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PointLightInstance {
    pub transform: Mat4,
    pub color: u32,
    pub _padding: [u32; 3],
}

impl PointLightInstance {
    /// Instance stream layout: the transform as four float4 attributes plus
    /// the packed color
    pub fn layout() -> VertexBufferLayout {
        VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as u64,
            step_mode: VertexStepMode::Instance,
            attributes: vec![
                VertexAttribute {
                    location: 4,
                    format: VertexFormat::Float32x4,
                    offset: 0,
                },
                VertexAttribute {
                    location: 5,
                    format: VertexFormat::Float32x4,
                    offset: 16,
                },
                VertexAttribute {
                    location: 6,
                    format: VertexFormat::Float32x4,
                    offset: 32,
                },
                VertexAttribute {
                    location: 7,
                    format: VertexFormat::Float32x4,
                    offset: 48,
                },
                VertexAttribute {
                    location: 8,
                    format: VertexFormat::Uint32,
                    offset: 64,
                },
            ],
        }
    }
}

/// Pack a linear color into 8-bit RGBA
pub fn pack_color(color: Vec3) -> u32 {
    let r = (color.x.clamp(0.0, 1.0) * 255.0) as u32;
    let g = (color.y.clamp(0.0, 1.0) * 255.0) as u32;
    let b = (color.z.clamp(0.0, 1.0) * 255.0) as u32;
    r | (g << 8) | (b << 16) | (0xff << 24)
}

/// Point light with a precomputed instance record
#[derive(Debug, Clone, Copy)]
pub struct PointLight {
    pub position: Vec3,
    pub radius: f32,
    pub intensity: f32,
    pub color: Vec3,
    pub instance: PointLightInstance,
}

impl PointLight {
    pub fn new(position: Vec3, color: Vec3, radius: f32, intensity: f32) -> Self {
        let mut light = Self {
            position,
            radius,
            intensity,
            color,
            instance: PointLightInstance {
                transform: Mat4::IDENTITY,
                color: pack_color(color),
                _padding: [0; 3],
            },
        };
        light.update();
        light
    }

    /// Recompute the instance transform from radius and position. The only
    /// sanctioned way to move or resize a light after construction.
    pub fn update(&mut self) {
        self.instance.transform =
            Mat4::from_translation(self.position) * Mat4::from_scale(Vec3::splat(self.radius));
        self.instance.color = pack_color(self.color);
    }

    /// Position as stored in the packed instance transform
    pub fn instance_position(&self) -> Vec3 {
        self.instance.transform.w_axis.truncate()
    }

    /// Radius recovered from the packed transform's scale column
    pub fn instance_radius(&self) -> f32 {
        self.instance.transform.x_axis.truncate().length()
    }
}

/// Directional light
#[derive(Debug, Clone, Copy)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub casts_shadows: bool,
}

impl DirectionalLight {
    pub fn new(direction: Vec3, color: Vec3) -> Self {
        Self {
            direction,
            color,
            intensity: 1.0,
            casts_shadows: false,
        }
    }

    /// View matrix looking along the light direction from a position
    pub fn light_view(&self, position: Vec3) -> Mat4 {
        let direction = self.direction.normalize_or_zero();
        let direction = if direction == Vec3::ZERO {
            log::warn!("directional light has a zero direction, using -Y");
            -Vec3::Y
        } else {
            direction
        };
        Mat4::look_at_rh(position, position + direction, Vec3::Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_transform_roundtrips_radius_and_position() {
        let mut light = PointLight::new(Vec3::new(3.0, 2.0, -5.0), Vec3::ONE, 7.5, 2.0);
        assert!((light.instance_radius() - 7.5).abs() < 1e-5);
        assert_eq!(light.instance_position(), Vec3::new(3.0, 2.0, -5.0));

        light.radius = 12.0;
        light.position = Vec3::ZERO;
        light.update();
        assert!((light.instance_radius() - 12.0).abs() < 1e-5);
        assert_eq!(light.instance_position(), Vec3::ZERO);
    }

    #[test]
    fn packed_color_uses_rgba_bytes() {
        assert_eq!(pack_color(Vec3::new(1.0, 0.0, 0.0)), 0xff0000ff);
        assert_eq!(pack_color(Vec3::ONE), 0xffffffff);
    }

    #[test]
    fn instance_layout_covers_the_record() {
        let layout = PointLightInstance::layout();
        assert_eq!(layout.array_stride, 80);

        let declared: u64 = layout.attributes.iter().map(|a| a.format.size()).sum();
        assert_eq!(declared, 68);
        assert_eq!(layout.attributes.last().map(|a| a.offset), Some(64));
    }
}
