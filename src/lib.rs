//! voxel-miner: a compact real-time rendering engine core.
//!
//! The crate bundles a dual-mode camera (first person / arcball), a scene
//! graph with up to four animated point lights behind a single Phong
//! pipeline, and a procedurally generated, runtime-editable voxel terrain
//! drawn as one instanced batch. The host application owns the window and
//! the input loop; it hands the engine an `Arc<Window>` for the GPU context
//! and drives everything else through [`engine::CameraCommand`] and
//! [`engine::EditCommand`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use cgmath::{Point3, Vector3};
//! use voxel_miner::camera::Camera;
//! use voxel_miner::data_structures::scene_graph::SceneGraph;
//! use voxel_miner::data_structures::terrain::{Terrain, VoxelGrid};
//! use voxel_miner::engine::Engine;
//!
//! # fn demo(window: Arc<winit::window::Window>) -> anyhow::Result<()> {
//! let camera = Camera::new(
//!     Point3::new(0.0, 0.0, 30.0),
//!     Point3::new(0.0, 0.0, -1.0),
//!     Vector3::unit_y(),
//!     45.0, 16.0 / 9.0, 0.1, 2000.0, 2.0, 0.05,
//! );
//! let mut engine = Engine::new(camera, SceneGraph::new())
//!     .with_terrain(Terrain::new(VoxelGrid::maze(15, 15, 42)));
//! let mut ctx = futures::executor::block_on(voxel_miner::context::Context::new(window))?;
//! let mut renderer = voxel_miner::render::Renderer::new();
//! renderer.render(&mut ctx, &mut engine)?;
//! # Ok(())
//! # }
//! ```

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod engine;
pub mod pipelines;
pub mod render;
pub mod resources;

pub use camera::{Camera, CameraMode};
pub use context::Context;
pub use engine::{CameraCommand, EditCommand, Engine};
pub use render::{FrameStats, Renderer};

/// Wire up env-filtered logging; safe to call more than once.
pub fn init_logger() {
    if env_logger::try_init().is_err() {
        log::debug!("logger was already initialized");
    }
}
