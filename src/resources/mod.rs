//! Asset loading. Everything reads from the `assets/` tree the build script
//! copies next to the binary.
//!
//! Mesh and cubemap loads are kicked off in the background and land in
//! shared readiness handles; consumers simply skip drawing while a handle is
//! still empty. A failed load logs the error and leaves the handle empty for
//! good.

use std::io::{BufReader, Cursor};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use futures::future::try_join_all;

use crate::data_structures::geometry::{Geometry, ShapeVertex};
use crate::data_structures::texture::Texture;

pub type GeometryHandle = Arc<OnceLock<Geometry>>;
pub type CubemapHandle = Arc<OnceLock<[image::RgbaImage; 6]>>;

/// Conventional face file names, +x -x +y -y +z -z.
pub const CUBEMAP_FACES: [&str; 6] = [
    "pos-x.jpg",
    "neg-x.jpg",
    "pos-y.jpg",
    "neg-y.jpg",
    "pos-z.jpg",
    "neg-z.jpg",
];

fn asset_path(file_name: &str) -> PathBuf {
    PathBuf::from(env!("OUT_DIR")).join("assets").join(file_name)
}

pub async fn load_string(file_name: &str) -> anyhow::Result<String> {
    let text = tokio::fs::read_to_string(asset_path(file_name)).await?;
    Ok(text)
}

pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    let data = tokio::fs::read(asset_path(file_name)).await?;
    Ok(data)
}

pub async fn load_texture(
    file_name: &str,
    is_srgb: bool,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Texture> {
    let data = load_binary(file_name).await?;
    Texture::from_bytes(device, queue, &data, file_name, is_srgb)
}

/// Load a wavefront `.obj` into a single geometry. Sub-meshes are merged;
/// materials are ignored (shading comes from the instance selector).
pub async fn load_geometry_obj(file_name: &str) -> anyhow::Result<Geometry> {
    let obj_text = load_string(file_name).await?;
    let obj_cursor = Cursor::new(obj_text);
    let mut obj_reader = BufReader::new(obj_cursor);

    let (models, _materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |p| async move {
            let mat_text = load_string(&p).await.unwrap_or_default();
            tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mat_text)))
        },
    )
    .await?;

    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    for model in models {
        let mesh = &model.mesh;
        let base = vertices.len() as u32;
        for i in 0..mesh.positions.len() / 3 {
            let tex_coords = if mesh.texcoords.len() >= (i + 1) * 2 {
                [mesh.texcoords[i * 2], 1.0 - mesh.texcoords[i * 2 + 1]]
            } else {
                [0.0, 0.0]
            };
            let normal = if mesh.normals.len() >= (i + 1) * 3 {
                [
                    mesh.normals[i * 3],
                    mesh.normals[i * 3 + 1],
                    mesh.normals[i * 3 + 2],
                ]
            } else {
                [0.0, 1.0, 0.0]
            };
            vertices.push(ShapeVertex {
                position: [
                    mesh.positions[i * 3],
                    mesh.positions[i * 3 + 1],
                    mesh.positions[i * 3 + 2],
                ],
                tex_coords,
                normal,
            });
        }
        indices.extend(mesh.indices.iter().map(|i| base + i));
    }
    Ok(Geometry { vertices, indices })
}

/// Start an `.obj` load in the background; requires a tokio runtime.
pub fn spawn_geometry_obj(file_name: &str) -> GeometryHandle {
    let handle = GeometryHandle::default();
    let slot = handle.clone();
    let file_name = file_name.to_owned();
    tokio::spawn(async move {
        match load_geometry_obj(&file_name).await {
            Ok(geometry) => {
                let _ = slot.set(geometry);
            }
            Err(err) => log::error!("failed to load mesh {file_name}: {err}"),
        }
    });
    handle
}

/// Load and decode all six cubemap faces from a directory under `assets/`.
pub async fn load_cubemap_faces(dir: &str) -> anyhow::Result<[image::RgbaImage; 6]> {
    let loads = CUBEMAP_FACES
        .iter()
        .map(|face| {
            let path = format!("{dir}/{face}");
            async move { load_binary(&path).await }
        });
    let bytes = try_join_all(loads).await?;
    let mut faces = Vec::with_capacity(6);
    for data in &bytes {
        faces.push(image::load_from_memory(data)?.to_rgba8());
    }
    faces
        .try_into()
        .map_err(|_| anyhow::anyhow!("expected exactly six cubemap faces"))
}

/// Start a cubemap load in the background; requires a tokio runtime.
pub fn spawn_cubemap(dir: &str) -> CubemapHandle {
    let handle = CubemapHandle::default();
    let slot = handle.clone();
    let dir = dir.to_owned();
    tokio::spawn(async move {
        match load_cubemap_faces(&dir).await {
            Ok(faces) => {
                let _ = slot.set(faces);
            }
            Err(err) => log::error!("failed to load cubemap {dir}: {err}"),
        }
    });
    handle
}
