//! GPU-free engine state: camera, scene graph and terrain, driven through a
//! small command surface. The host translates whatever input system it uses
//! into these commands; nothing in here touches a device.

use crate::camera::{Camera, CameraMode, CollisionProbe};
use crate::data_structures::scene_graph::SceneGraph;
use crate::data_structures::terrain::Terrain;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CameraCommand {
    MoveForward,
    MoveBackward,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    Pan { dx: f32, dy: f32 },
    SetFov(f32),
    SetNear(f32),
    SetFar(f32),
    SetAspect(f32),
    SetSpeed(f32),
    SetSensitivity(f32),
    SetMode(CameraMode),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditCommand {
    /// Raise the picked cell from empty to height 1.
    AddVoxel,
    /// Clear the picked cell.
    RemoveVoxel,
}

pub struct Engine {
    pub camera: Camera,
    pub scene: SceneGraph,
    pub terrain: Option<Terrain>,
    /// How far in front of the eye edits land.
    pub pick_distance: f32,
    /// Let the terrain veto camera moves.
    pub collide_with_terrain: bool,
}

impl Engine {
    pub fn new(camera: Camera, scene: SceneGraph) -> Self {
        Self {
            camera,
            scene,
            terrain: None,
            pick_distance: 1.0,
            collide_with_terrain: true,
        }
    }

    pub fn with_terrain(mut self, terrain: Terrain) -> Self {
        self.terrain = Some(terrain);
        self
    }

    pub fn apply_camera(&mut self, command: CameraCommand) {
        let probe = if self.collide_with_terrain {
            self.terrain.as_ref().map(|t| t as &dyn CollisionProbe)
        } else {
            None
        };
        match command {
            CameraCommand::MoveForward => self.camera.move_forward(probe),
            CameraCommand::MoveBackward => self.camera.move_backward(probe),
            CameraCommand::MoveLeft => self.camera.move_left(probe),
            CameraCommand::MoveRight => self.camera.move_right(probe),
            CameraCommand::MoveUp => self.camera.move_up(probe),
            CameraCommand::MoveDown => self.camera.move_down(probe),
            CameraCommand::Pan { dx, dy } => self.camera.pan(dx, dy),
            CameraCommand::SetFov(fov) => self.camera.change_fov(fov),
            CameraCommand::SetNear(near) => self.camera.change_near(near),
            CameraCommand::SetFar(far) => self.camera.change_far(far),
            CameraCommand::SetAspect(aspect) => self.camera.change_aspect(aspect),
            CameraCommand::SetSpeed(speed) => self.camera.change_speed(speed),
            CameraCommand::SetSensitivity(s) => self.camera.change_sensitivity(s),
            CameraCommand::SetMode(mode) => self.camera.change_mode(mode),
        }
    }

    /// Apply a terrain edit at the picked cell. Returns whether the grid
    /// changed; without terrain this is always false.
    pub fn apply_edit(&mut self, command: EditCommand) -> bool {
        let Some(terrain) = self.terrain.as_mut() else {
            log::warn!("terrain edit without terrain, ignoring");
            return false;
        };
        let (eye, at) = (self.camera.eye, self.camera.at);
        match command {
            EditCommand::AddVoxel => terrain.add_voxel(eye, at, self.pick_distance),
            EditCommand::RemoveVoxel => terrain.remove_voxel(eye, at, self.pick_distance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::terrain::VoxelGrid;
    use cgmath::{Point3, Vector3};

    fn test_engine() -> Engine {
        let camera = Camera::new(
            Point3::new(0.0, 0.0, -1.0),
            Point3::new(0.0, 0.0, 0.0),
            Vector3::unit_y(),
            45.0,
            1.0,
            0.1,
            2000.0,
            1.0,
            0.05,
        );
        Engine::new(camera, SceneGraph::new()).with_terrain(Terrain::new(VoxelGrid::empty(9, 9)))
    }

    #[test]
    fn edits_round_trip_through_the_pick() {
        let mut engine = test_engine();
        assert!(engine.apply_edit(EditCommand::AddVoxel));
        // Cell is occupied now, adding again fails but removing succeeds.
        assert!(!engine.apply_edit(EditCommand::AddVoxel));
        assert!(engine.apply_edit(EditCommand::RemoveVoxel));
    }

    #[test]
    fn edits_without_terrain_are_ignored() {
        let mut engine = test_engine();
        engine.terrain = None;
        assert!(!engine.apply_edit(EditCommand::AddVoxel));
    }

    #[test]
    fn terrain_vetoes_camera_moves() {
        let mut engine = test_engine();
        // Occupy the column right in front of the camera.
        assert!(engine.apply_edit(EditCommand::AddVoxel));
        let eye = engine.camera.eye;
        engine.apply_camera(CameraCommand::MoveForward);
        assert_eq!(engine.camera.eye, eye);

        // With collision off the same move goes through.
        engine.collide_with_terrain = false;
        engine.apply_camera(CameraCommand::MoveForward);
        assert_ne!(engine.camera.eye, eye);
    }

    #[test]
    fn parameter_commands_reach_the_camera() {
        let mut engine = test_engine();
        engine.apply_camera(CameraCommand::SetSpeed(99.0));
        assert_eq!(engine.camera.speed(), 5.0);
        engine.apply_camera(CameraCommand::SetMode(CameraMode::Arcball));
        assert_eq!(engine.camera.mode(), CameraMode::Arcball);
    }
}
