//! A single placeable object: shape kind, transform, color, shading mode and
//! the lazily created GPU buffers behind it.
//!
//! Drawing is split in two phases so one render pass can consume many
//! renderables: `prepare` (mutable, before the pass) creates missing buffers
//! and rewrites the per-object instance data, `draw` (shared, inside the
//! pass) only binds and issues the indexed draw.

use cgmath::{Matrix4, SquareMatrix, Vector3};
use wgpu::util::DeviceExt;

use crate::data_structures::geometry::Geometry;
use crate::data_structures::instance::InstanceRaw;
use crate::data_structures::transform::Transform;
use crate::resources::GeometryHandle;

/// Fragment shading selector, mirrored by the switch in `phong.wgsl`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shading {
    /// Unlit black, used for silhouettes.
    FlatBlack,
    /// Unlit bright marker color, used for light markers.
    FlatBright,
    /// Visualize the world-space normal as `(n + 1) / 2`.
    Normals,
    /// The renderable's solid color.
    Solid,
    /// Texture coordinates rendered as red/green.
    Uv,
    /// Sample one of the three bound texture slots.
    Texture(u32),
}

impl Shading {
    pub fn code(self) -> i32 {
        match self {
            Shading::FlatBlack => -6,
            Shading::FlatBright => -5,
            Shading::Normals => -3,
            Shading::Solid => -2,
            Shading::Uv => -1,
            Shading::Texture(slot) => slot as i32,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeKind {
    Point,
    Triangle,
    Cube,
    Sphere,
    Circle,
    Ellipsoid,
    LightMarker,
    Mesh,
}

enum GeometrySlot {
    Ready(Geometry),
    /// Still loading in the background; drawing no-ops until the handle is
    /// filled. A failed load never fills it, which keeps this object skipped
    /// for the rest of its life.
    Pending(GeometryHandle),
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
    instance_buffer: wgpu::Buffer,
}

pub struct Renderable {
    pub kind: ShapeKind,
    pub transform: Transform,
    pub color: [f32; 4],
    pub shading: Shading,
    geometry: GeometrySlot,
    gpu: Option<GpuMesh>,
}

impl Renderable {
    fn from_geometry(kind: ShapeKind, geometry: Geometry) -> Self {
        Self {
            kind,
            transform: Transform::new(),
            color: [1.0, 1.0, 1.0, 1.0],
            shading: Shading::Solid,
            geometry: GeometrySlot::Ready(geometry),
            gpu: None,
        }
    }

    pub fn point() -> Self {
        Self::from_geometry(ShapeKind::Point, Geometry::point())
    }

    pub fn triangle() -> Self {
        Self::from_geometry(ShapeKind::Triangle, Geometry::triangle())
    }

    pub fn cube() -> Self {
        Self::from_geometry(ShapeKind::Cube, Geometry::cube())
    }

    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        Self::from_geometry(
            ShapeKind::Sphere,
            Geometry::sphere(radius, width_segments, height_segments),
        )
    }

    pub fn circle(radius: f32, segments: u32) -> Self {
        Self::from_geometry(ShapeKind::Circle, Geometry::circle(radius, segments))
    }

    pub fn ellipsoid(rx: f32, ry: f32, rz: f32, width_segments: u32, height_segments: u32) -> Self {
        Self::from_geometry(
            ShapeKind::Ellipsoid,
            Geometry::ellipsoid(rx, ry, rz, width_segments, height_segments),
        )
    }

    /// Small bright cube drawn at a point light's position.
    pub fn light_marker(color: [f32; 3]) -> Self {
        let mut marker = Self::from_geometry(ShapeKind::LightMarker, Geometry::cube());
        marker.transform.scale(0.3, 0.3, 0.3);
        marker.color = [color[0], color[1], color[2], 1.0];
        marker.shading = Shading::FlatBright;
        marker
    }

    /// A mesh whose geometry is still being loaded. Draws nothing until the
    /// handle resolves.
    pub fn from_async_mesh(handle: GeometryHandle) -> Self {
        Self {
            kind: ShapeKind::Mesh,
            transform: Transform::new(),
            color: [1.0, 1.0, 1.0, 1.0],
            shading: Shading::Texture(0),
            geometry: GeometrySlot::Pending(handle),
            gpu: None,
        }
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    pub fn with_shading(mut self, shading: Shading) -> Self {
        self.shading = shading;
        self
    }

    pub fn is_ready(&self) -> bool {
        match &self.geometry {
            GeometrySlot::Ready(_) => true,
            GeometrySlot::Pending(handle) => handle.get().is_some(),
        }
    }

    fn instance_raw(&mut self) -> InstanceRaw {
        InstanceRaw {
            model: self.transform.model().into(),
            normal: self.transform.normal_matrix().into(),
            color: self.color,
            shading: self.shading.code() as f32,
        }
    }

    /// Resolve pending geometry, create GPU buffers on first use and push the
    /// current transform/color/shading to the instance buffer.
    pub fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        if let GeometrySlot::Pending(handle) = &self.geometry {
            match handle.get() {
                Some(geometry) => self.geometry = GeometrySlot::Ready(geometry.clone()),
                None => return,
            }
        }
        let GeometrySlot::Ready(geometry) = &self.geometry else {
            return;
        };
        if self.gpu.is_none() {
            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("shape vertex buffer"),
                contents: bytemuck::cast_slice(&geometry.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("shape index buffer"),
                contents: bytemuck::cast_slice(&geometry.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("shape instance buffer"),
                size: size_of::<InstanceRaw>() as wgpu::BufferAddress,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            self.gpu = Some(GpuMesh {
                vertex_buffer,
                index_buffer,
                num_indices: geometry.indices.len() as u32,
                instance_buffer,
            });
        }
        let raw = self.instance_raw();
        if let Some(gpu) = &self.gpu {
            queue.write_buffer(&gpu.instance_buffer, 0, bytemuck::cast_slice(&[raw]));
        }
    }

    /// Issue the draw call. Returns whether anything was drawn.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) -> bool {
        let Some(gpu) = &self.gpu else {
            return false;
        };
        render_pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
        render_pass.set_vertex_buffer(1, gpu.instance_buffer.slice(..));
        render_pass.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..gpu.num_indices, 0, 0..1);
        true
    }

    /// Convenience for placing markers and scene props.
    pub fn set_position(&mut self, position: Vector3<f32>) {
        let mut model = self.transform.model();
        model.w = position.extend(1.0);
        self.transform.set_model(model);
    }

    pub fn reset_transform(&mut self) {
        self.transform.set_model(Matrix4::identity());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::GeometryHandle;

    #[test]
    fn shading_codes_match_the_shader_switch() {
        assert_eq!(Shading::FlatBlack.code(), -6);
        assert_eq!(Shading::FlatBright.code(), -5);
        assert_eq!(Shading::Normals.code(), -3);
        assert_eq!(Shading::Solid.code(), -2);
        assert_eq!(Shading::Uv.code(), -1);
        assert_eq!(Shading::Texture(2).code(), 2);
    }

    #[test]
    fn static_shapes_are_ready_immediately() {
        assert!(Renderable::cube().is_ready());
        assert!(Renderable::sphere(1.0, 8, 6).is_ready());
    }

    #[test]
    fn async_mesh_is_not_ready_until_the_handle_fills() {
        let handle = GeometryHandle::default();
        let renderable = Renderable::from_async_mesh(handle.clone());
        assert!(!renderable.is_ready());

        assert!(handle.set(Geometry::triangle()).is_ok());
        assert!(renderable.is_ready());
    }

    #[test]
    fn set_position_only_touches_translation() {
        let mut cube = Renderable::cube();
        cube.transform.scale(2.0, 2.0, 2.0);
        cube.set_position(Vector3::new(4.0, 5.0, 6.0));
        let model = cube.transform.model();
        assert_eq!(model.w.truncate(), Vector3::new(4.0, 5.0, 6.0));
        assert_eq!(model.x.x, 2.0);
    }
}
