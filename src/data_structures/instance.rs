//! Per-instance GPU data: transform, normal matrix, color and shading slot.

use cgmath::{Matrix3, Matrix4, Quaternion, Vector3};

use crate::data_structures::renderable::Shading;

/// One placed copy of a shape, in CPU terms.
#[derive(Clone, Debug)]
pub struct Instance {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
    pub color: [f32; 4],
    pub shading: Shading,
}

impl Instance {
    pub fn to_raw(&self) -> InstanceRaw {
        let model = Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z);
        InstanceRaw {
            model: model.into(),
            normal: Matrix3::from(self.rotation).into(),
            color: self.color,
            shading: self.shading.code() as f32,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 3]; 3],
    pub color: [f32; 4],
    pub shading: f32,
}

impl InstanceRaw {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<InstanceRaw>() as wgpu::BufferAddress,
            // Step per instance, not per vertex.
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                // Model matrix, one vec4 per column.
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Normal matrix columns.
                wgpu::VertexAttribute {
                    offset: size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: size_of::<[f32; 19]>() as wgpu::BufferAddress,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: size_of::<[f32; 22]>() as wgpu::BufferAddress,
                    shader_location: 11,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: size_of::<[f32; 25]>() as wgpu::BufferAddress,
                    shader_location: 12,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: size_of::<[f32; 29]>() as wgpu::BufferAddress,
                    shader_location: 13,
                    format: wgpu::VertexFormat::Float32,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{One, Zero};

    #[test]
    fn raw_layout_matches_attribute_span() {
        // 16 model + 9 normal + 4 color + 1 shading floats.
        assert_eq!(size_of::<InstanceRaw>(), 30 * size_of::<f32>());
    }

    #[test]
    fn to_raw_applies_translation_last() {
        let instance = Instance {
            position: Vector3::new(1.0, 2.0, 3.0),
            rotation: Quaternion::one(),
            scale: Vector3::new(2.0, 2.0, 2.0),
            color: [1.0; 4],
            shading: Shading::Solid,
        };
        let raw = instance.to_raw();
        assert_eq!(raw.model[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(raw.model[0][0], 2.0);
        assert_eq!(raw.shading, -2.0);
    }

    #[test]
    fn identity_rotation_yields_identity_normal_matrix() {
        let instance = Instance {
            position: Vector3::zero(),
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 10.0, 1.0),
            color: [1.0; 4],
            shading: Shading::Uv,
        };
        let raw = instance.to_raw();
        assert_eq!(raw.normal[0], [1.0, 0.0, 0.0]);
        assert_eq!(raw.normal[1], [0.0, 1.0, 0.0]);
        assert_eq!(raw.normal[2], [0.0, 0.0, 1.0]);
    }
}
