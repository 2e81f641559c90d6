//! Screen-space overlay pass: the crosshair. Depth testing is off and the
//! pass runs last, so the overlay always wins.

use wgpu::util::DeviceExt;

use crate::data_structures::geometry::Vertex;
use crate::data_structures::texture::Texture;
use crate::pipelines::mk_render_pipeline;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct OverlayVertex {
    pub position: [f32; 2],
}

impl Vertex for OverlayVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<OverlayVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            }],
        }
    }
}

struct OverlayGpu {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
}

/// Two thin NDC-space bars crossing at the screen center.
pub struct Overlay {
    vertices: Vec<OverlayVertex>,
    indices: Vec<u32>,
    gpu: Option<OverlayGpu>,
}

impl Overlay {
    pub fn crosshair() -> Self {
        const ARM: f32 = 0.04;
        const THICKNESS: f32 = 0.004;
        let mut vertices = Vec::with_capacity(8);
        let mut indices = Vec::with_capacity(12);
        for (w, h) in [(ARM, THICKNESS), (THICKNESS, ARM)] {
            let base = vertices.len() as u32;
            vertices.extend_from_slice(&[
                OverlayVertex { position: [-w, -h] },
                OverlayVertex { position: [w, -h] },
                OverlayVertex { position: [w, h] },
                OverlayVertex { position: [-w, h] },
            ]);
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self {
            vertices,
            indices,
            gpu: None,
        }
    }

    pub fn prepare(&mut self, device: &wgpu::Device) {
        if self.gpu.is_some() {
            return;
        }
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("overlay vertex buffer"),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("overlay index buffer"),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        self.gpu = Some(OverlayGpu {
            vertex_buffer,
            index_buffer,
            num_indices: self.indices.len() as u32,
        });
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) -> bool {
        let Some(gpu) = &self.gpu else {
            return false;
        };
        render_pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
        render_pass.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..gpu.num_indices, 0, 0..1);
        true
    }
}

pub fn mk_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("overlay pipeline layout"),
        bind_group_layouts: &[],
        push_constant_ranges: &[],
    });
    mk_render_pipeline(
        device,
        "overlay pipeline",
        &layout,
        config.format,
        Some(wgpu::DepthStencilState {
            format: Texture::DEPTH_FORMAT,
            depth_write_enabled: false,
            // Always on top; the pass shares the depth attachment but never
            // consults it.
            depth_compare: wgpu::CompareFunction::Always,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        &[OverlayVertex::desc()],
        wgpu::ShaderModuleDescriptor {
            label: Some("overlay shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("overlay.wgsl").into()),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crosshair_is_two_centered_bars() {
        let overlay = Overlay::crosshair();
        assert_eq!(overlay.vertices.len(), 8);
        assert_eq!(overlay.indices.len(), 12);
        let (mut min_x, mut max_x) = (f32::MAX, f32::MIN);
        for v in &overlay.vertices {
            min_x = min_x.min(v.position[0]);
            max_x = max_x.max(v.position[0]);
        }
        assert_eq!(min_x, -max_x);
    }
}
