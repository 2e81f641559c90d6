pub mod block;
pub mod geometry;
pub mod instance;
pub mod renderable;
pub mod scene_graph;
pub mod terrain;
pub mod texture;
pub mod transform;
