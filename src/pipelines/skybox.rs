//! Cubemap background pass.
//!
//! Drawn first as a fullscreen triangle pushed to the far plane; later
//! geometry overwrites it through the regular depth test. The pass is
//! skipped entirely until all six faces have arrived.

use cgmath::{Matrix4, SquareMatrix};
use wgpu::util::DeviceExt;

use crate::camera::Camera;
use crate::data_structures::texture::Texture;
use crate::pipelines::mk_render_pipeline;
use crate::resources::CubemapHandle;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct SkyUniform {
    inv_view_proj: [[f32; 4]; 4],
}

struct SkyGpu {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    // Kept alive for the bind group.
    _texture: Texture,
}

pub struct Skybox {
    pending: CubemapHandle,
    gpu: Option<SkyGpu>,
}

impl Skybox {
    pub fn new(faces: CubemapHandle) -> Self {
        Self {
            pending: faces,
            gpu: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.gpu.is_some() || self.pending.get().is_some()
    }

    /// Build GPU state once the faces arrived, then keep the inverse
    /// view-projection current.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        camera: &Camera,
    ) {
        if self.gpu.is_none() {
            let Some(faces) = self.pending.get() else {
                return;
            };
            let texture = match Texture::cubemap(device, queue, faces, "skybox cubemap") {
                Ok(texture) => texture,
                Err(err) => {
                    log::error!("skybox cubemap rejected: {err}");
                    return;
                }
            };
            let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("skybox buffer"),
                contents: bytemuck::cast_slice(&[SkyUniform {
                    inv_view_proj: Matrix4::identity().into(),
                }]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("skybox bind group"),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&texture.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&texture.sampler),
                    },
                ],
            });
            self.gpu = Some(SkyGpu {
                buffer,
                bind_group,
                _texture: texture,
            });
        }

        if let Some(gpu) = &self.gpu {
            let view_proj = camera.projection_matrix() * camera.view_matrix();
            let inv = view_proj.invert().unwrap_or_else(Matrix4::identity);
            queue.write_buffer(
                &gpu.buffer,
                0,
                bytemuck::cast_slice(&[SkyUniform {
                    inv_view_proj: inv.into(),
                }]),
            );
        }
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) -> bool {
        let Some(gpu) = &self.gpu else {
            return false;
        };
        render_pass.set_bind_group(0, &gpu.bind_group, &[]);
        render_pass.draw(0..3, 0..1);
        true
    }
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("skybox bind group layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::Cube,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
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
    layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("skybox pipeline layout"),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });
    mk_render_pipeline(
        device,
        "skybox pipeline",
        &pipeline_layout,
        config.format,
        Some(wgpu::DepthStencilState {
            format: Texture::DEPTH_FORMAT,
            // The triangle sits exactly on the far plane, LessEqual lets it
            // pass against the cleared depth without writing anything.
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        &[],
        wgpu::ShaderModuleDescriptor {
            label: Some("skybox shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("skybox.wgsl").into()),
        },
    )
}
