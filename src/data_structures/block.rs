//! Instanced cube batch for the voxel terrain.
//!
//! The whole terrain is one cube geometry plus one instance buffer. Edits are
//! rare compared to frames, so the buffer is recreated in bulk whenever the
//! grid changed instead of being patched in place.

use wgpu::util::DeviceExt;

use crate::data_structures::geometry::Geometry;
use crate::data_structures::instance::Instance;

pub struct VoxelBlocks {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
    instance_buffer: wgpu::Buffer,
    amount: u32,
}

impl VoxelBlocks {
    pub fn new(device: &wgpu::Device, instances: &[Instance]) -> Self {
        let cube = Geometry::cube();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("voxel vertex buffer"),
            contents: bytemuck::cast_slice(&cube.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("voxel index buffer"),
            contents: bytemuck::cast_slice(&cube.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let instance_buffer = mk_instance_buffer(device, instances);
        Self {
            vertex_buffer,
            index_buffer,
            num_indices: cube.indices.len() as u32,
            instance_buffer,
            amount: instances.len() as u32,
        }
    }

    /// Swap in a freshly built instance list after a grid edit.
    pub fn rebuild(&mut self, device: &wgpu::Device, instances: &[Instance]) {
        self.instance_buffer = mk_instance_buffer(device, instances);
        self.amount = instances.len() as u32;
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    /// Returns whether a draw was issued; an empty terrain draws nothing.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) -> bool {
        if self.amount == 0 {
            log::warn!("terrain holds zero voxel instances, skipping the draw");
            return false;
        }
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.num_indices, 0, 0..self.amount);
        true
    }
}

fn mk_instance_buffer(device: &wgpu::Device, instances: &[Instance]) -> wgpu::Buffer {
    let raw: Vec<_> = instances.iter().map(Instance::to_raw).collect();
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("voxel instance buffer"),
        contents: bytemuck::cast_slice(&raw),
        usage: wgpu::BufferUsages::VERTEX,
    })
}
