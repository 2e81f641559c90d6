//! Procedural voxel terrain: an integer-height grid with maze and noise
//! generators, camera-ray picking and runtime edits.
//!
//! World mapping: grid cell `(row, col)` with height `h` occupies the world
//! columns `x = row - rows/2`, `z = col - cols/2`, stacking unit cubes at
//! `y = 0..h`. Picking inverts that mapping for a point a fixed distance in
//! front of the camera.

use cgmath::{InnerSpace, One, Point3, Quaternion, Vector3};
use noise::{NoiseFn, Perlin};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::camera::CollisionProbe;
use crate::data_structures::instance::Instance;
use crate::data_structures::renderable::Shading;

/// Sentinel height for decorative pillar cells.
pub const PILLAR: i32 = -1;

const PILLAR_COLOR: [f32; 4] = [0.8, 0.1, 0.1, 1.0];
const VOXEL_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
/// Texture-pack slot sampled for terrain cubes.
const VOXEL_TEXTURE_SLOT: u32 = 2;

/// Column heights over a rectangular grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoxelGrid {
    rows: usize,
    cols: usize,
    cells: Vec<i32>,
}

impl VoxelGrid {
    pub fn empty(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![0; rows * cols],
        }
    }

    /// Maze terrain via a randomized depth-first backtracker.
    ///
    /// Dimensions are forced odd so the wall/corridor lattice closes; carving
    /// starts at (1,1) and the far corner is opened as the exit. Standing
    /// walls get a height of 1 to 3 from the same seeded rng, so the whole
    /// grid is a pure function of `(rows, cols, seed)`.
    pub fn maze(rows: usize, cols: usize, seed: u64) -> Self {
        let rows = force_odd(rows);
        let cols = force_odd(cols);
        let mut grid = Self {
            rows,
            cols,
            cells: vec![1; rows * cols],
        };
        let mut rng = SmallRng::seed_from_u64(seed);

        let mut stack: Vec<(usize, usize)> = vec![(1, 1)];
        let start = grid.idx(1, 1);
        grid.cells[start] = 0;
        while let Some(&(r, c)) = stack.last() {
            let mut candidates: Vec<(usize, usize)> = Vec::with_capacity(4);
            for (dr, dc) in [(0i64, 2i64), (2, 0), (0, -2), (-2, 0)] {
                let nr = r as i64 + dr;
                let nc = c as i64 + dc;
                if nr <= 0 || nc <= 0 || nr >= rows as i64 - 1 || nc >= cols as i64 - 1 {
                    continue;
                }
                let (nr, nc) = (nr as usize, nc as usize);
                if grid.cells[grid.idx(nr, nc)] > 0 {
                    candidates.push((nr, nc));
                }
            }
            match candidates.get(rng.gen_range(0..candidates.len().max(1))) {
                Some(&(nr, nc)) => {
                    let wall = grid.idx((r + nr) / 2, (c + nc) / 2);
                    grid.cells[wall] = 0;
                    let cell = grid.idx(nr, nc);
                    grid.cells[cell] = 0;
                    stack.push((nr, nc));
                }
                None => {
                    stack.pop();
                }
            }
        }

        // Entrance and exit stay open no matter what the carver did.
        let entrance = grid.idx(1, 1);
        grid.cells[entrance] = 0;
        let exit = grid.idx(rows - 2, cols - 2);
        grid.cells[exit] = 0;

        for cell in &mut grid.cells {
            if *cell > 0 {
                *cell = rng.gen_range(1..=3);
            }
        }
        grid
    }

    /// Rolling terrain from a Perlin heightmap, with a second 3D noise pass
    /// that nudges single columns up or down for roughness.
    pub fn noise(rows: usize, cols: usize, seed: u32, max_height: i32) -> Self {
        const SURFACE_FREQ: f64 = 0.13;
        const CARVE_FREQ: f64 = 0.31;
        const CARVE_THRESHOLD: f64 = 0.35;

        let perlin = Perlin::new(seed);
        let mut grid = Self::empty(rows, cols);
        let max_height = max_height.max(1);
        for r in 0..rows {
            for c in 0..cols {
                let sample = perlin.get([r as f64 * SURFACE_FREQ, c as f64 * SURFACE_FREQ]);
                let mut height = (((sample + 1.0) / 2.0) * max_height as f64).floor() as i32;
                let carve = perlin.get([
                    r as f64 * CARVE_FREQ,
                    height as f64 * CARVE_FREQ,
                    c as f64 * CARVE_FREQ,
                ]);
                if carve > CARVE_THRESHOLD {
                    height = (height + 1).min(max_height);
                } else if carve < -CARVE_THRESHOLD {
                    height = (height - 1).max(0);
                }
                let idx = grid.idx(r, c);
                grid.cells[idx] = height;
            }
        }
        grid
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<i32> {
        if row < self.rows && col < self.cols {
            Some(self.cells[self.idx(row, col)])
        } else {
            None
        }
    }

    pub fn set(&mut self, row: usize, col: usize, height: i32) {
        if row < self.rows && col < self.cols {
            let idx = self.idx(row, col);
            self.cells[idx] = height;
        } else {
            log::warn!("ignoring set on out-of-range cell ({row}, {col})");
        }
    }

    /// Mark a decorative pillar cell, rendered as one tall red cube.
    pub fn set_pillar(&mut self, row: usize, col: usize) {
        self.set(row, col, PILLAR);
    }

    fn idx(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    /// World-space offset of the grid origin, so terrain is centered at 0.
    fn center(&self) -> (f32, f32) {
        (self.rows as f32 / 2.0, self.cols as f32 / 2.0)
    }

    /// Map a world position to the grid cell under it.
    fn cell_at(&self, x: f32, z: f32) -> Option<(usize, usize)> {
        let (row_off, col_off) = self.center();
        let row = (x + row_off).round();
        let col = (z + col_off).round();
        if row < 0.0 || col < 0.0 || row >= self.rows as f32 || col >= self.cols as f32 {
            return None;
        }
        Some((row as usize, col as usize))
    }
}

/// Grid plus the cached instance list the renderer consumes.
pub struct Terrain {
    grid: VoxelGrid,
    instances: Vec<Instance>,
    dirty: bool,
}

impl Terrain {
    pub fn new(grid: VoxelGrid) -> Self {
        let instances = build_instances(&grid);
        Self {
            grid,
            instances,
            dirty: true,
        }
    }

    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// True once after each mutation; the renderer uses this to know when to
    /// recreate the instance buffer.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// The grid cell `distance` units in front of the camera, if any.
    pub fn pick_cell(
        &self,
        eye: Point3<f32>,
        at: Point3<f32>,
        distance: f32,
    ) -> Option<(usize, usize)> {
        let dir = at - eye;
        if dir.magnitude() < f32::EPSILON {
            return None;
        }
        let target = eye + dir.normalize() * distance;
        self.grid.cell_at(target.x, target.z)
    }

    /// Raise the picked cell from 0 to 1. Rejected (with a log, no state
    /// change) when the pick misses the grid or the cell is occupied.
    pub fn add_voxel(&mut self, eye: Point3<f32>, at: Point3<f32>, distance: f32) -> bool {
        let Some((row, col)) = self.pick_cell(eye, at, distance) else {
            log::info!("add ignored, picked point is outside the terrain");
            return false;
        };
        if self.grid.get(row, col) != Some(0) {
            log::info!("add ignored, cell ({row}, {col}) is occupied");
            return false;
        }
        self.grid.set(row, col, 1);
        self.rebuild();
        true
    }

    /// Clear the picked cell to height 0.
    pub fn remove_voxel(&mut self, eye: Point3<f32>, at: Point3<f32>, distance: f32) -> bool {
        let Some((row, col)) = self.pick_cell(eye, at, distance) else {
            log::info!("remove ignored, picked point is outside the terrain");
            return false;
        };
        if self.grid.get(row, col) == Some(0) {
            return false;
        }
        self.grid.set(row, col, 0);
        self.rebuild();
        true
    }

    pub fn set_pillar(&mut self, row: usize, col: usize) {
        self.grid.set_pillar(row, col);
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.instances = build_instances(&self.grid);
        self.dirty = true;
    }
}

impl CollisionProbe for Terrain {
    fn blocked(&self, position: Point3<f32>) -> bool {
        match self.grid.cell_at(position.x, position.z) {
            // Walking off the grid is allowed, walking into a column is not.
            Some((row, col)) => self.grid.get(row, col).is_some_and(|h| h != 0),
            None => false,
        }
    }
}

/// One cube instance per voxel, one tall scaled cube per pillar.
fn build_instances(grid: &VoxelGrid) -> Vec<Instance> {
    let (row_off, col_off) = grid.center();
    let mut instances = Vec::new();
    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            let height = grid.get(row, col).unwrap_or(0);
            let x = row as f32 - row_off;
            let z = col as f32 - col_off;
            if height == PILLAR {
                instances.push(Instance {
                    position: Vector3::new(x, 1.0, z),
                    rotation: Quaternion::one(),
                    scale: Vector3::new(1.0, 10.0, 1.0),
                    color: PILLAR_COLOR,
                    shading: Shading::Solid,
                });
                continue;
            }
            for level in 0..height.max(0) {
                instances.push(Instance {
                    position: Vector3::new(x, level as f32, z),
                    rotation: Quaternion::one(),
                    scale: Vector3::new(1.0, 1.0, 1.0),
                    color: VOXEL_COLOR,
                    shading: Shading::Texture(VOXEL_TEXTURE_SLOT),
                });
            }
        }
    }
    instances
}

fn force_odd(n: usize) -> usize {
    let n = n.max(5);
    if n % 2 == 0 { n + 1 } else { n }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_cells(grid: &VoxelGrid) -> Vec<(usize, usize)> {
        let mut open = Vec::new();
        for r in 0..grid.rows() {
            for c in 0..grid.cols() {
                if grid.get(r, c) == Some(0) {
                    open.push((r, c));
                }
            }
        }
        open
    }

    #[test]
    fn maze_forces_odd_dimensions() {
        let grid = VoxelGrid::maze(16, 20, 7);
        assert_eq!(grid.rows(), 17);
        assert_eq!(grid.cols(), 21);
        let odd = VoxelGrid::maze(15, 15, 7);
        assert_eq!((odd.rows(), odd.cols()), (15, 15));
    }

    #[test]
    fn maze_open_region_is_connected() {
        let grid = VoxelGrid::maze(15, 15, 42);
        let open = open_cells(&grid);
        assert!(open.contains(&(1, 1)));
        assert!(open.contains(&(13, 13)));

        // Flood fill from the entrance must reach every open cell.
        let mut seen = vec![false; grid.rows() * grid.cols()];
        let mut stack = vec![(1usize, 1usize)];
        let index = |r: usize, c: usize| r * grid.cols() + c;
        seen[index(1, 1)] = true;
        let mut reached = 0usize;
        while let Some((r, c)) = stack.pop() {
            reached += 1;
            for (dr, dc) in [(0i64, 1i64), (1, 0), (0, -1), (-1, 0)] {
                let nr = r as i64 + dr;
                let nc = c as i64 + dc;
                if nr < 0 || nc < 0 || nr >= grid.rows() as i64 || nc >= grid.cols() as i64 {
                    continue;
                }
                let (nr, nc) = (nr as usize, nc as usize);
                if grid.get(nr, nc) == Some(0) && !seen[index(nr, nc)] {
                    seen[index(nr, nc)] = true;
                    stack.push((nr, nc));
                }
            }
        }
        assert_eq!(reached, open.len());
    }

    #[test]
    fn maze_is_deterministic_per_seed() {
        assert_eq!(VoxelGrid::maze(15, 15, 9), VoxelGrid::maze(15, 15, 9));
        assert_ne!(VoxelGrid::maze(15, 15, 9), VoxelGrid::maze(15, 15, 10));
    }

    #[test]
    fn maze_wall_heights_stay_in_range() {
        let grid = VoxelGrid::maze(21, 21, 3);
        for r in 0..grid.rows() {
            for c in 0..grid.cols() {
                let h = grid.get(r, c).unwrap();
                assert!((0..=3).contains(&h));
            }
        }
    }

    #[test]
    fn noise_is_deterministic_and_bounded() {
        let a = VoxelGrid::noise(32, 32, 5, 6);
        let b = VoxelGrid::noise(32, 32, 5, 6);
        assert_eq!(a, b);
        for r in 0..a.rows() {
            for c in 0..a.cols() {
                let h = a.get(r, c).unwrap();
                assert!((0..=6).contains(&h));
            }
        }
    }

    #[test]
    fn pick_outside_the_grid_is_none() {
        let mut terrain = Terrain::new(VoxelGrid::empty(8, 8));
        let eye = Point3::new(100.0, 0.0, 100.0);
        let at = Point3::new(101.0, 0.0, 100.0);
        assert_eq!(terrain.pick_cell(eye, at, 1.0), None);
        assert!(!terrain.remove_voxel(eye, at, 1.0));
    }

    #[test]
    fn pick_rounds_to_the_centered_grid() {
        // 16x16 grid: picking world (0.5, 0.5) with centering offset 8 lands
        // on cell (9, 9) after rounding.
        let terrain = Terrain::new(VoxelGrid::empty(16, 16));
        let eye = Point3::new(0.5, 0.0, -0.5);
        let at = Point3::new(0.5, 0.0, 0.5);
        assert_eq!(terrain.pick_cell(eye, at, 1.0), Some((9, 9)));
    }

    #[test]
    fn add_requires_an_empty_cell() {
        let mut terrain = Terrain::new(VoxelGrid::empty(9, 9));
        let eye = Point3::new(0.0, 0.0, -1.0);
        let at = Point3::new(0.0, 0.0, 0.0);

        assert!(terrain.add_voxel(eye, at, 1.0));
        let cell = terrain.pick_cell(eye, at, 1.0).unwrap();
        assert_eq!(terrain.grid().get(cell.0, cell.1), Some(1));
        // Second add on the same, now occupied, cell is rejected.
        assert!(!terrain.add_voxel(eye, at, 1.0));
        assert!(terrain.remove_voxel(eye, at, 1.0));
        assert_eq!(terrain.grid().get(cell.0, cell.1), Some(0));
    }

    #[test]
    fn edits_mark_the_terrain_dirty() {
        let mut terrain = Terrain::new(VoxelGrid::empty(9, 9));
        assert!(terrain.take_dirty());
        assert!(!terrain.take_dirty());
        terrain.add_voxel(Point3::new(0.0, 0.0, -1.0), Point3::new(0.0, 0.0, 0.0), 1.0);
        assert!(terrain.take_dirty());
    }

    #[test]
    fn instances_match_column_heights() {
        let mut grid = VoxelGrid::empty(5, 5);
        grid.set(0, 0, 3);
        grid.set(2, 2, 1);
        grid.set_pillar(4, 4);
        let terrain = Terrain::new(grid);
        // 3 + 1 stacked cubes plus one pillar instance.
        assert_eq!(terrain.instances().len(), 5);
        let pillar = terrain
            .instances()
            .iter()
            .find(|i| i.scale.y == 10.0)
            .unwrap();
        assert_eq!(pillar.color, PILLAR_COLOR);
        assert_eq!(pillar.shading, Shading::Solid);
    }

    #[test]
    fn occupied_columns_block_movement() {
        let mut grid = VoxelGrid::empty(9, 9);
        grid.set(4, 4, 2);
        let terrain = Terrain::new(grid);
        // Cell (4,4) is world (-0.5, -0.5) for a 9x9 grid.
        assert!(terrain.blocked(Point3::new(-0.5, 0.0, -0.5)));
        assert!(!terrain.blocked(Point3::new(2.0, 0.0, 2.0)));
        assert!(!terrain.blocked(Point3::new(50.0, 0.0, 50.0)));
    }
}
