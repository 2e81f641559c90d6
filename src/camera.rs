//! Dual-mode camera (first person and arcball) plus its GPU-side uniform.
//!
//! Angles are kept in degrees. Pitch is clamped just short of the poles so
//! the view matrix never degenerates; speed and sensitivity are clamped to
//! their working ranges on every write, including construction.

use cgmath::{perspective, Deg, InnerSpace, Matrix4, Point3, Rad, Vector3};
use wgpu::util::DeviceExt;

pub const PITCH_LIMIT_DEG: f32 = 89.9;
pub const SPEED_RANGE: std::ops::RangeInclusive<f32> = 0.1..=5.0;
pub const SENSITIVITY_RANGE: std::ops::RangeInclusive<f32> = 0.01..=2.0;

/// cgmath produces OpenGL clip space (z in -1..1); wgpu wants z in 0..1.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraMode {
    /// Panning rotates the view direction around a fixed eye.
    Fps,
    /// Panning orbits the eye around a fixed look-at point.
    Arcball,
}

/// Something the camera can ask before moving into a position.
pub trait CollisionProbe {
    fn blocked(&self, position: Point3<f32>) -> bool;
}

#[derive(Debug)]
pub struct Camera {
    pub eye: Point3<f32>,
    pub at: Point3<f32>,
    pub up: Vector3<f32>,
    fov_deg: f32,
    near: f32,
    far: f32,
    aspect: f32,
    speed: f32,
    sensitivity: f32,
    mode: CameraMode,
    yaw_deg: f32,
    pitch_deg: f32,
    view: Matrix4<f32>,
    projection: Matrix4<f32>,
}

impl Camera {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        eye: Point3<f32>,
        at: Point3<f32>,
        up: Vector3<f32>,
        fov_deg: f32,
        aspect: f32,
        near: f32,
        far: f32,
        speed: f32,
        sensitivity: f32,
    ) -> Self {
        let mut camera = Self {
            eye,
            at,
            up,
            fov_deg: fov_deg.clamp(1.0, 179.0),
            near: near.max(1e-4),
            far: far.max(near + 1e-3),
            aspect: if aspect > 0.0 { aspect } else { 1.0 },
            speed: clamp_range(speed, SPEED_RANGE),
            sensitivity: clamp_range(sensitivity, SENSITIVITY_RANGE),
            mode: CameraMode::Fps,
            yaw_deg: 0.0,
            pitch_deg: 0.0,
            view: Matrix4::from_scale(1.0),
            projection: Matrix4::from_scale(1.0),
        };
        camera.derive_angles();
        camera.update_view();
        camera.update_projection();
        camera
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    pub fn fov_deg(&self) -> f32 {
        self.fov_deg
    }

    pub fn pitch_deg(&self) -> f32 {
        self.pitch_deg
    }

    pub fn yaw_deg(&self) -> f32 {
        self.yaw_deg
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.view
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection
    }

    /// Rotate by mouse deltas. In FPS mode the look-at point swings around
    /// the eye; in arcball mode the eye orbits the look-at point at the
    /// radius it had when the pan started.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.yaw_deg += self.sensitivity * dx;
        self.pitch_deg =
            (self.pitch_deg - self.sensitivity * dy).clamp(-PITCH_LIMIT_DEG, PITCH_LIMIT_DEG);
        let dir = self.direction_from_angles();
        match self.mode {
            CameraMode::Fps => {
                self.at = self.eye + dir;
            }
            CameraMode::Arcball => {
                let radius = (self.eye - self.at).magnitude();
                self.eye = self.at + dir * radius;
            }
        }
        self.update_view();
    }

    pub fn move_forward(&mut self, probe: Option<&dyn CollisionProbe>) {
        let forward = (self.at - self.eye).normalize();
        self.translate(forward * self.speed, probe);
    }

    pub fn move_backward(&mut self, probe: Option<&dyn CollisionProbe>) {
        let forward = (self.at - self.eye).normalize();
        self.translate(-forward * self.speed, probe);
    }

    pub fn move_left(&mut self, probe: Option<&dyn CollisionProbe>) {
        let forward = (self.at - self.eye).normalize();
        let left = self.up.cross(forward).normalize();
        self.translate(left * self.speed, probe);
    }

    pub fn move_right(&mut self, probe: Option<&dyn CollisionProbe>) {
        let forward = (self.at - self.eye).normalize();
        let right = forward.cross(self.up).normalize();
        self.translate(right * self.speed, probe);
    }

    pub fn move_up(&mut self, probe: Option<&dyn CollisionProbe>) {
        self.translate(self.up.normalize() * self.speed, probe);
    }

    pub fn move_down(&mut self, probe: Option<&dyn CollisionProbe>) {
        self.translate(-self.up.normalize() * self.speed, probe);
    }

    /// Translate eye and look-at together, unless the probe vetoes the new
    /// eye position. A vetoed move changes nothing.
    fn translate(&mut self, delta: Vector3<f32>, probe: Option<&dyn CollisionProbe>) {
        let candidate = self.eye + delta;
        if let Some(probe) = probe {
            if probe.blocked(candidate) {
                log::debug!("camera move blocked at {candidate:?}");
                return;
            }
        }
        self.eye = candidate;
        self.at += delta;
        self.update_view();
    }

    pub fn change_fov(&mut self, fov_deg: f32) {
        self.fov_deg = fov_deg.clamp(1.0, 179.0);
        self.update_projection();
    }

    pub fn change_near(&mut self, near: f32) {
        self.near = near.max(1e-4);
        self.far = self.far.max(self.near + 1e-3);
        self.update_projection();
    }

    pub fn change_far(&mut self, far: f32) {
        self.far = far.max(self.near + 1e-3);
        self.update_projection();
    }

    /// Called on every surface resize so the projection never goes stale.
    pub fn change_aspect(&mut self, aspect: f32) {
        if aspect > 0.0 {
            self.aspect = aspect;
            self.update_projection();
        }
    }

    pub fn change_speed(&mut self, speed: f32) {
        self.speed = clamp_range(speed, SPEED_RANGE);
    }

    pub fn change_sensitivity(&mut self, sensitivity: f32) {
        self.sensitivity = clamp_range(sensitivity, SENSITIVITY_RANGE);
    }

    /// Switch pan mode. Eye and look-at stay where they are; yaw/pitch are
    /// re-derived from them so the next pan continues smoothly.
    pub fn change_mode(&mut self, mode: CameraMode) {
        self.mode = mode;
        self.derive_angles();
    }

    fn direction_from_angles(&self) -> Vector3<f32> {
        let yaw = Rad::from(Deg(self.yaw_deg));
        let pitch = Rad::from(Deg(self.pitch_deg));
        Vector3::new(
            pitch.0.cos() * yaw.0.cos(),
            pitch.0.sin(),
            pitch.0.cos() * yaw.0.sin(),
        )
    }

    fn derive_angles(&mut self) {
        let dir = match self.mode {
            CameraMode::Fps => self.at - self.eye,
            CameraMode::Arcball => self.eye - self.at,
        };
        if dir.magnitude() < f32::EPSILON {
            return;
        }
        let dir = dir.normalize();
        self.pitch_deg = Deg::from(Rad(dir.y.asin()))
            .0
            .clamp(-PITCH_LIMIT_DEG, PITCH_LIMIT_DEG);
        self.yaw_deg = Deg::from(Rad(dir.z.atan2(dir.x))).0;
    }

    fn update_view(&mut self) {
        self.view = Matrix4::look_at_rh(self.eye, self.at, self.up);
    }

    fn update_projection(&mut self) {
        self.projection =
            OPENGL_TO_WGPU_MATRIX * perspective(Deg(self.fov_deg), self.aspect, self.near, self.far);
    }
}

fn clamp_range(value: f32, range: std::ops::RangeInclusive<f32>) -> f32 {
    value.clamp(*range.start(), *range.end())
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_pos: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_pos: [0.0; 4],
            view_proj: Matrix4::from_scale(1.0f32).into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera) {
        self.view_pos = camera.eye.to_homogeneous().into();
        self.view_proj = (camera.projection_matrix() * camera.view_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// GPU plumbing for the camera uniform; the camera itself lives with the
/// engine state so it stays testable without a device.
pub struct CameraResources {
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform = CameraUniform::new();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("camera bind group layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self {
            uniform,
            buffer,
            bind_group_layout,
            bind_group,
        }
    }

    /// Push the camera's current matrices to the GPU.
    pub fn write(&mut self, queue: &wgpu::Queue, camera: &Camera) {
        self.uniform.update_view_proj(camera);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::EuclideanSpace;

    fn test_camera() -> Camera {
        Camera::new(
            Point3::new(0.0, 0.0, 10.0),
            Point3::new(0.0, 0.0, 0.0),
            Vector3::unit_y(),
            45.0,
            16.0 / 9.0,
            0.1,
            2000.0,
            2.0,
            0.05,
        )
    }

    struct WallAt(Point3<f32>);

    impl CollisionProbe for WallAt {
        fn blocked(&self, position: Point3<f32>) -> bool {
            (position - self.0).magnitude() < 1.5
        }
    }

    #[test]
    fn construction_clamps_speed_and_sensitivity() {
        let camera = Camera::new(
            Point3::new(0.0, 0.0, 1.0),
            Point3::origin(),
            Vector3::unit_y(),
            45.0,
            1.0,
            0.1,
            100.0,
            99.0,
            0.0,
        );
        assert_eq!(camera.speed(), 5.0);
        assert_eq!(camera.sensitivity(), 0.01);
    }

    #[test]
    fn setters_clamp_too() {
        let mut camera = test_camera();
        camera.change_speed(0.0);
        assert_eq!(camera.speed(), 0.1);
        camera.change_sensitivity(10.0);
        assert_eq!(camera.sensitivity(), 2.0);
        camera.change_fov(500.0);
        assert_eq!(camera.fov_deg(), 179.0);
    }

    #[test]
    fn pitch_saturates_under_sustained_panning() {
        let mut camera = test_camera();
        for _ in 0..10_000 {
            camera.pan(0.0, -50.0);
        }
        assert!((camera.pitch_deg() - PITCH_LIMIT_DEG).abs() < 1e-3);
        for _ in 0..10_000 {
            camera.pan(0.0, 50.0);
        }
        assert!((camera.pitch_deg() + PITCH_LIMIT_DEG).abs() < 1e-3);
    }

    #[test]
    fn fps_pan_keeps_the_eye_fixed() {
        let mut camera = test_camera();
        let eye_before = camera.eye;
        camera.pan(120.0, -35.0);
        assert_eq!(camera.eye, eye_before);
        assert!((camera.at - camera.eye).magnitude() > 0.0);
    }

    #[test]
    fn arcball_pan_preserves_the_orbit_radius() {
        let mut camera = test_camera();
        camera.change_mode(CameraMode::Arcball);
        let radius = (camera.eye - camera.at).magnitude();
        for i in 0..500 {
            camera.pan((i % 17) as f32 - 8.0, (i % 13) as f32 - 6.0);
            let now = (camera.eye - camera.at).magnitude();
            assert!((now - radius).abs() < 1e-3, "radius drifted to {now}");
        }
        // The look-at point never moves in arcball mode.
        assert_eq!(camera.at, Point3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn mode_switch_leaves_eye_and_at_untouched() {
        let mut camera = test_camera();
        camera.pan(30.0, 10.0);
        let (eye, at) = (camera.eye, camera.at);
        camera.change_mode(CameraMode::Arcball);
        assert_eq!(camera.eye, eye);
        assert_eq!(camera.at, at);
        camera.change_mode(CameraMode::Fps);
        assert_eq!(camera.eye, eye);
        assert_eq!(camera.at, at);
    }

    #[test]
    fn vetoed_move_changes_nothing() {
        let mut camera = test_camera();
        let wall = WallAt(Point3::new(0.0, 0.0, 8.0));
        let (eye, at) = (camera.eye, camera.at);
        let view = camera.view_matrix();
        camera.move_forward(Some(&wall));
        assert_eq!(camera.eye, eye);
        assert_eq!(camera.at, at);
        assert_eq!(camera.view_matrix(), view);
    }

    #[test]
    fn unvetoed_move_translates_eye_and_at_together() {
        let mut camera = test_camera();
        camera.move_forward(None);
        assert_eq!(camera.eye, Point3::new(0.0, 0.0, 8.0));
        assert_eq!(camera.at, Point3::new(0.0, 0.0, -2.0));
        camera.move_up(None);
        assert_eq!(camera.eye.y, 2.0);
        assert_eq!(camera.at.y, 2.0);
    }

    #[test]
    fn aspect_change_recomputes_the_projection() {
        let mut camera = test_camera();
        let before = camera.projection_matrix();
        camera.change_aspect(2.0);
        assert_ne!(camera.projection_matrix(), before);
        // Zero or negative aspect is ignored.
        let kept = camera.projection_matrix();
        camera.change_aspect(0.0);
        assert_eq!(camera.projection_matrix(), kept);
    }

    #[test]
    fn uniform_tracks_eye_position() {
        let camera = test_camera();
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera);
        assert_eq!(uniform.view_pos, [0.0, 0.0, 10.0, 1.0]);
    }
}
