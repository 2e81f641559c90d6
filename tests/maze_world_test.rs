//! World-level scenarios running entirely on the CPU side: generated maze
//! terrain consumed the way the renderer consumes it, and terrain edits
//! driven through the engine command surface.

use cgmath::{Point3, Vector3};
use voxel_miner::camera::Camera;
use voxel_miner::data_structures::scene_graph::{PointLight, SceneGraph};
use voxel_miner::data_structures::terrain::{Terrain, VoxelGrid};
use voxel_miner::engine::{CameraCommand, EditCommand, Engine};
use voxel_miner::CameraMode;

fn overview_camera() -> Camera {
    Camera::new(
        Point3::new(0.0, 0.0, 30.0),
        Point3::new(0.0, 0.0, -1.0),
        Vector3::unit_y(),
        45.0,
        16.0 / 9.0,
        0.1,
        2000.0,
        2.0,
        0.05,
    )
}

#[test]
fn maze_world_instances_match_the_grid() {
    let grid = VoxelGrid::maze(15, 15, 42);
    let expected: i32 = (0..grid.rows())
        .flat_map(|r| (0..grid.cols()).map(move |c| (r, c)))
        .map(|(r, c)| grid.get(r, c).unwrap().max(0))
        .sum();

    let terrain = Terrain::new(grid.clone());
    assert_eq!(terrain.instances().len(), expected as usize);

    // Every instance sits over a cell with positive height, never over a
    // carved corridor.
    for instance in terrain.instances() {
        let row = (instance.position.x + grid.rows() as f32 / 2.0).round() as usize;
        let col = (instance.position.z + grid.cols() as f32 / 2.0).round() as usize;
        let height = grid.get(row, col).unwrap();
        assert!(height > 0, "instance over empty cell ({row}, {col})");
        assert!((instance.position.y as i32) < height);
    }
}

#[test]
fn full_scene_assembles_around_the_maze() {
    let mut scene = SceneGraph::new();
    for i in 0..4 {
        scene.add_light(PointLight::new(
            Point3::new(i as f32 * 2.0, 5.0, 0.0),
            [1.0, 1.0, 1.0],
        ));
    }
    let mut engine = Engine::new(overview_camera(), scene)
        .with_terrain(Terrain::new(VoxelGrid::maze(15, 15, 42)));

    // The camera surveys the maze from outside; panning and orbiting must
    // not disturb the terrain.
    let count = engine.terrain.as_ref().unwrap().instances().len();
    engine.apply_camera(CameraCommand::SetMode(CameraMode::Arcball));
    engine.apply_camera(CameraCommand::Pan { dx: 200.0, dy: -50.0 });
    engine.apply_camera(CameraCommand::SetMode(CameraMode::Fps));
    engine.apply_camera(CameraCommand::Pan { dx: -80.0, dy: 20.0 });
    assert_eq!(engine.terrain.as_ref().unwrap().instances().len(), count);
    assert_eq!(engine.scene.lights().len(), 4);
}

#[test]
fn edits_target_the_cell_in_front_of_the_camera() {
    let camera = Camera::new(
        Point3::new(0.5, 0.0, -0.5),
        Point3::new(0.5, 0.0, 0.5),
        Vector3::unit_y(),
        45.0,
        1.0,
        0.1,
        2000.0,
        2.0,
        0.05,
    );
    let mut engine = Engine::new(camera, SceneGraph::new())
        .with_terrain(Terrain::new(VoxelGrid::empty(15, 15)));

    // One unit ahead of (0.5, -0.5) is world (0.5, 0.5); with the rows/2
    // centering offset of 7.5 that is cell (8, 8).
    assert!(engine.apply_edit(EditCommand::AddVoxel));
    assert_eq!(engine.terrain.as_ref().unwrap().grid().get(8, 8), Some(1));

    // Re-picking the same spot sees the voxel and can remove it again.
    assert!(!engine.apply_edit(EditCommand::AddVoxel));
    assert!(engine.apply_edit(EditCommand::RemoveVoxel));
    assert_eq!(engine.terrain.as_ref().unwrap().grid().get(8, 8), Some(0));
}

#[test]
fn edits_beyond_the_grid_change_nothing() {
    let camera = Camera::new(
        Point3::new(100.0, 0.0, 100.0),
        Point3::new(101.0, 0.0, 100.0),
        Vector3::unit_y(),
        45.0,
        1.0,
        0.1,
        2000.0,
        2.0,
        0.05,
    );
    let mut engine = Engine::new(camera, SceneGraph::new())
        .with_terrain(Terrain::new(VoxelGrid::maze(15, 15, 1)));

    let before = engine.terrain.as_ref().unwrap().grid().clone();
    assert!(!engine.apply_edit(EditCommand::AddVoxel));
    assert!(!engine.apply_edit(EditCommand::RemoveVoxel));
    assert_eq!(engine.terrain.as_ref().unwrap().grid(), &before);
}
