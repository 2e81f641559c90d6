//! CPU-side geometry: vertex formats and procedural shape generators.
//!
//! Shapes are generated once at construction time and uploaded on first draw.
//! Parameterizations follow the usual conventions: unit cube centered at the
//! origin with per-face normals, UV sphere with clamped segment counts,
//! triangle fans for the flat shapes.

use std::f32::consts::PI;

use cgmath::{InnerSpace, Vector3};

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShapeVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex for ShapeVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<ShapeVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Indexed triangle mesh ready for upload.
#[derive(Clone, Debug)]
pub struct Geometry {
    pub vertices: Vec<ShapeVertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    /// A small camera-facing quad standing in for a point.
    pub fn point() -> Self {
        const H: f32 = 0.02;
        let vertices = vec![
            vertex([-H, -H, 0.0], [0.0, 1.0], [0.0, 0.0, 1.0]),
            vertex([H, -H, 0.0], [1.0, 1.0], [0.0, 0.0, 1.0]),
            vertex([H, H, 0.0], [1.0, 0.0], [0.0, 0.0, 1.0]),
            vertex([-H, H, 0.0], [0.0, 0.0], [0.0, 0.0, 1.0]),
        ];
        let indices = vec![0, 1, 2, 0, 2, 3];
        Self { vertices, indices }
    }

    pub fn triangle() -> Self {
        let vertices = vec![
            vertex([-0.5, -0.5, 0.0], [0.0, 1.0], [0.0, 0.0, 1.0]),
            vertex([0.5, -0.5, 0.0], [1.0, 1.0], [0.0, 0.0, 1.0]),
            vertex([0.0, 0.5, 0.0], [0.5, 0.0], [0.0, 0.0, 1.0]),
        ];
        Self {
            vertices,
            indices: vec![0, 1, 2],
        }
    }

    /// Unit cube centered at the origin, 24 vertices so each face keeps its
    /// own normal and full UV range.
    pub fn cube() -> Self {
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            // normal, tangent u, tangent v
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ];
        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in faces {
            let n = Vector3::from(normal);
            let u = Vector3::from(u);
            let v = Vector3::from(v);
            let base = vertices.len() as u32;
            for (uv, du, dv) in [
                ([0.0, 1.0], -0.5, -0.5),
                ([1.0, 1.0], 0.5, -0.5),
                ([1.0, 0.0], 0.5, 0.5),
                ([0.0, 0.0], -0.5, 0.5),
            ] {
                let position = n * 0.5 + u * du + v * dv;
                vertices.push(vertex(position.into(), uv, normal));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self { vertices, indices }
    }

    /// UV sphere. Segment counts are clamped to the minimum watertight lattice
    /// (3 around, 2 along), degenerate pole triangles are skipped.
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let w = width_segments.max(3);
        let h = height_segments.max(2);
        let mut vertices = Vec::with_capacity(((w + 1) * (h + 1)) as usize);
        for j in 0..=h {
            let v = j as f32 / h as f32;
            let polar = v * PI;
            // Shift pole UVs to the triangle centers to avoid pinching.
            let u_offset = match j {
                0 => 0.5 / w as f32,
                j if j == h => -0.5 / w as f32,
                _ => 0.0,
            };
            for i in 0..=w {
                let u = i as f32 / w as f32;
                let azimuth = u * 2.0 * PI;
                let position = Vector3::new(
                    -radius * azimuth.cos() * polar.sin(),
                    radius * polar.cos(),
                    radius * azimuth.sin() * polar.sin(),
                );
                let normal = if position.magnitude() > 0.0 {
                    position.normalize()
                } else {
                    Vector3::unit_y()
                };
                vertices.push(vertex(position.into(), [u + u_offset, 1.0 - v], normal.into()));
            }
        }
        let mut indices = Vec::new();
        let stride = w + 1;
        for j in 0..h {
            for i in 0..w {
                let a = j * stride + i;
                let b = a + stride;
                let c = b + 1;
                let d = a + 1;
                if j != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if j != h - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }
        Self { vertices, indices }
    }

    /// Flat disc in the xy plane, built as a triangle fan.
    pub fn circle(radius: f32, segments: u32) -> Self {
        let segments = segments.max(3);
        let mut vertices = Vec::with_capacity(segments as usize + 2);
        vertices.push(vertex([0.0, 0.0, 0.0], [0.5, 0.5], [0.0, 0.0, 1.0]));
        for i in 0..=segments {
            let angle = i as f32 / segments as f32 * 2.0 * PI;
            let (sin, cos) = angle.sin_cos();
            vertices.push(vertex(
                [radius * cos, radius * sin, 0.0],
                [0.5 + 0.5 * cos, 0.5 - 0.5 * sin],
                [0.0, 0.0, 1.0],
            ));
        }
        let mut indices = Vec::with_capacity(segments as usize * 3);
        for i in 1..=segments {
            indices.extend_from_slice(&[0, i, i + 1]);
        }
        Self { vertices, indices }
    }

    /// Axis-aligned ellipsoid: a sphere lattice stretched by the three radii,
    /// with normals corrected through the inverse squared radii.
    pub fn ellipsoid(
        rx: f32,
        ry: f32,
        rz: f32,
        width_segments: u32,
        height_segments: u32,
    ) -> Self {
        let mut geometry = Self::sphere(1.0, width_segments, height_segments);
        for v in &mut geometry.vertices {
            let p = Vector3::from(v.position);
            v.position = [p.x * rx, p.y * ry, p.z * rz];
            let n = Vector3::new(p.x / rx, p.y / ry, p.z / rz);
            v.normal = if n.magnitude() > 0.0 {
                n.normalize().into()
            } else {
                v.normal
            };
        }
        geometry
    }
}

fn vertex(position: [f32; 3], tex_coords: [f32; 2], normal: [f32; 3]) -> ShapeVertex {
    ShapeVertex {
        position,
        tex_coords,
        normal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_six_faces() {
        let cube = Geometry::cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        // Every vertex sits on the surface of the unit cube.
        for v in &cube.vertices {
            let m = v
                .position
                .iter()
                .map(|c| c.abs())
                .fold(0.0f32, f32::max);
            assert!((m - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn sphere_clamps_segment_counts() {
        let tiny = Geometry::sphere(1.0, 0, 0);
        let floor = Geometry::sphere(1.0, 3, 2);
        assert_eq!(tiny.vertices.len(), floor.vertices.len());
        assert_eq!(tiny.indices.len(), floor.indices.len());
    }

    #[test]
    fn sphere_normals_point_outward() {
        let sphere = Geometry::sphere(2.0, 8, 6);
        for v in &sphere.vertices {
            let p = Vector3::from(v.position);
            if p.magnitude() < 1e-5 {
                continue;
            }
            let n = Vector3::from(v.normal);
            assert!(p.normalize().dot(n) > 0.999);
        }
    }

    #[test]
    fn sphere_skips_degenerate_pole_triangles() {
        let w = 6u32;
        let h = 4u32;
        let sphere = Geometry::sphere(1.0, w, h);
        // Full grid would be w*h*2 triangles; one ring of them collapses at
        // each pole.
        let expected = (w * h * 2 - 2 * w) as usize * 3;
        assert_eq!(sphere.indices.len(), expected);
    }

    #[test]
    fn circle_is_a_closed_fan() {
        let circle = Geometry::circle(1.5, 12);
        assert_eq!(circle.vertices.len(), 14);
        assert_eq!(circle.indices.len(), 36);
        for v in &circle.vertices {
            assert_eq!(v.position[2], 0.0);
        }
    }

    #[test]
    fn ellipsoid_radii_bound_the_vertices() {
        let e = Geometry::ellipsoid(2.0, 1.0, 3.0, 8, 6);
        for v in &e.vertices {
            assert!(v.position[0].abs() <= 2.0 + 1e-5);
            assert!(v.position[1].abs() <= 1.0 + 1e-5);
            assert!(v.position[2].abs() <= 3.0 + 1e-5);
        }
    }
}
