//! The single lighting pipeline: Phong shading with up to four point lights
//! and a per-instance shading selector.

use wgpu::util::DeviceExt;

use crate::data_structures::geometry::{ShapeVertex, Vertex};
use crate::data_structures::instance::InstanceRaw;
use crate::data_structures::scene_graph::{SceneGraph, MAX_POINT_LIGHTS};
use crate::pipelines::{depth_default, mk_render_pipeline};

/// Uniform block mirrored by `LightsUniform` in `phong.wgsl`. Everything is
/// packed into vec4 columns so the layout survives std140 rules untouched.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightsUniform {
    /// xyz position, w = 1.0 while the light is enabled.
    pub positions: [[f32; 4]; MAX_POINT_LIGHTS],
    pub colors: [[f32; 4]; MAX_POINT_LIGHTS],
    /// ambient, diffuse, specular factors and the specular exponent.
    pub factors: [f32; 4],
    /// x = light count, y = show-normals toggle, rest padding.
    pub flags: [u32; 4],
}

impl LightsUniform {
    pub fn new() -> Self {
        Self {
            positions: [[0.0; 4]; MAX_POINT_LIGHTS],
            colors: [[0.0; 4]; MAX_POINT_LIGHTS],
            factors: [0.0; 4],
            flags: [0; 4],
        }
    }

    /// Snapshot the scene's lights and shading factors.
    pub fn from_scene(scene: &SceneGraph) -> Self {
        let mut uniform = Self::new();
        for (i, light) in scene.lights().iter().take(MAX_POINT_LIGHTS).enumerate() {
            uniform.positions[i] = [
                light.position.x,
                light.position.y,
                light.position.z,
                if light.enabled { 1.0 } else { 0.0 },
            ];
            uniform.colors[i] = [light.color[0], light.color[1], light.color[2], 1.0];
        }
        let state = &scene.state;
        uniform.factors = [
            state.ambient_factor,
            state.diffuse_factor,
            state.specular_factor,
            state.specular_exponent,
        ];
        uniform.flags[0] = scene.lights().len().min(MAX_POINT_LIGHTS) as u32;
        uniform.flags[1] = state.show_normals as u32;
        uniform
    }
}

impl Default for LightsUniform {
    fn default() -> Self {
        Self::new()
    }
}

pub fn mk_lights_buffer(device: &wgpu::Device, uniform: &LightsUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("lights buffer"),
        contents: bytemuck::cast_slice(&[*uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_lights_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("lights bind group layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

pub fn mk_lights_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("lights bind group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    })
}

/// Layout for the texture pack: three sampled slots sharing one sampler.
pub fn mk_texture_pack_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("texture pack bind group layout"),
        entries: &[
            texture_entry(0),
            texture_entry(1),
            texture_entry(2),
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

pub fn mk_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    texture_pack_layout: &wgpu::BindGroupLayout,
    camera_layout: &wgpu::BindGroupLayout,
    lights_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("phong pipeline layout"),
        bind_group_layouts: &[texture_pack_layout, camera_layout, lights_layout],
        push_constant_ranges: &[],
    });
    mk_render_pipeline(
        device,
        "phong pipeline",
        &layout,
        config.format,
        Some(depth_default()),
        &[ShapeVertex::desc(), InstanceRaw::desc()],
        wgpu::ShaderModuleDescriptor {
            label: Some("phong shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("phong.wgsl").into()),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::scene_graph::PointLight;
    use cgmath::Point3;

    #[test]
    fn uniform_marks_disabled_lights_in_w() {
        let mut scene = SceneGraph::new();
        scene.add_light(PointLight::new(Point3::new(1.0, 2.0, 3.0), [1.0, 0.5, 0.0]));
        let mut off = PointLight::new(Point3::new(-1.0, 0.0, 0.0), [0.0, 1.0, 0.0]);
        off.enabled = false;
        scene.add_light(off);

        let uniform = LightsUniform::from_scene(&scene);
        assert_eq!(uniform.positions[0], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(uniform.positions[1][3], 0.0);
        assert_eq!(uniform.flags[0], 2);
    }

    #[test]
    fn uniform_carries_the_scene_factors() {
        let mut scene = SceneGraph::new();
        scene.state.ambient_factor = 0.25;
        scene.state.specular_exponent = 64.0;
        scene.state.show_normals = true;
        let uniform = LightsUniform::from_scene(&scene);
        assert_eq!(uniform.factors[0], 0.25);
        assert_eq!(uniform.factors[3], 64.0);
        assert_eq!(uniform.flags[1], 1);
    }

    #[test]
    fn uniform_never_reports_more_than_four_lights() {
        let mut scene = SceneGraph::new();
        for i in 0..6 {
            scene.add_light(PointLight::new(Point3::new(i as f32, 0.0, 0.0), [1.0; 3]));
        }
        let uniform = LightsUniform::from_scene(&scene);
        assert_eq!(uniform.flags[0], 4);
    }
}
