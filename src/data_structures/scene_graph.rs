//! Scene aggregate: ordered renderables, bounded point lights, optional
//! skybox and overlay, and the global shading toggles.

use cgmath::{EuclideanSpace, Point3};

use crate::data_structures::renderable::Renderable;
use crate::pipelines::overlay::Overlay;
use crate::pipelines::skybox::Skybox;

/// The lighting uniform holds exactly four slots.
pub const MAX_POINT_LIGHTS: usize = 4;

/// Global shading parameters shared by every lit object.
#[derive(Clone, Copy, Debug)]
pub struct SceneState {
    pub ambient_factor: f32,
    pub diffuse_factor: f32,
    pub specular_factor: f32,
    pub specular_exponent: f32,
    /// Drive the point lights on their orbit every frame.
    pub lights_animated: bool,
    /// Debug view: shade everything with its world normal.
    pub show_normals: bool,
}

impl Default for SceneState {
    fn default() -> Self {
        Self {
            ambient_factor: 0.9,
            diffuse_factor: 0.7,
            specular_factor: 0.8,
            specular_exponent: 16.0,
            lights_animated: true,
            show_normals: false,
        }
    }
}

pub struct PointLight {
    pub position: Point3<f32>,
    pub color: [f32; 3],
    pub enabled: bool,
    /// Small bright cube drawn at the light's position.
    pub marker: Renderable,
}

impl PointLight {
    pub fn new(position: Point3<f32>, color: [f32; 3]) -> Self {
        let mut marker = Renderable::light_marker(color);
        marker.set_position(position.to_vec());
        Self {
            position,
            color,
            enabled: true,
            marker,
        }
    }

    pub fn set_position(&mut self, position: Point3<f32>) {
        self.position = position;
        self.marker.set_position(position.to_vec());
    }
}

/// Objects are drawn in insertion order.
pub struct SceneGraph {
    pub objects: Vec<Renderable>,
    lights: Vec<PointLight>,
    pub skybox: Option<Skybox>,
    pub overlay: Option<Overlay>,
    pub state: SceneState,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            lights: Vec::new(),
            skybox: None,
            overlay: None,
            state: SceneState::default(),
        }
    }

    pub fn add_object(&mut self, renderable: Renderable) {
        self.objects.push(renderable);
    }

    /// Add a point light. Beyond [`MAX_POINT_LIGHTS`] the light is rejected
    /// and a warning logged; the scene stays as it was.
    pub fn add_light(&mut self, light: PointLight) -> bool {
        if self.lights.len() >= MAX_POINT_LIGHTS {
            log::warn!(
                "scene already holds {MAX_POINT_LIGHTS} point lights, ignoring the new one"
            );
            return false;
        }
        self.lights.push(light);
        true
    }

    pub fn lights(&self) -> &[PointLight] {
        &self.lights
    }

    pub fn lights_mut(&mut self) -> &mut [PointLight] {
        &mut self.lights
    }

    pub fn set_skybox(&mut self, skybox: Skybox) {
        self.skybox = Some(skybox);
    }

    pub fn set_overlay(&mut self, overlay: Overlay) {
        self.overlay = Some(overlay);
    }

    /// Place the animated lights on their orbit for the given time.
    ///
    /// Phase offsets quarter the circle so four lights stay evenly spread.
    pub fn orbit_lights(&mut self, seconds: f32) {
        const ORBIT_RADIUS: f32 = 10.0;
        const ORBIT_HEIGHT: f32 = 5.0;
        for (i, light) in self.lights.iter_mut().enumerate() {
            let phase = seconds + i as f32 * std::f32::consts::FRAC_PI_2;
            light.set_position(Point3::new(
                ORBIT_RADIUS * phase.cos(),
                ORBIT_HEIGHT,
                ORBIT_RADIUS * phase.sin(),
            ));
        }
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Linear blend of two colors, used for the day/night clear color.
pub fn lerp_color(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    let t = t.clamp(0.0, 1.0);
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifth_light_is_rejected() {
        let mut scene = SceneGraph::new();
        for i in 0..4 {
            assert!(scene.add_light(PointLight::new(
                Point3::new(i as f32, 5.0, 0.0),
                [1.0, 1.0, 1.0],
            )));
        }
        assert!(!scene.add_light(PointLight::new(
            Point3::new(9.0, 9.0, 9.0),
            [1.0, 0.0, 0.0],
        )));
        assert_eq!(scene.lights().len(), MAX_POINT_LIGHTS);
        // The survivors are the first four.
        assert_eq!(scene.lights()[3].position.x, 3.0);
    }

    #[test]
    fn orbit_keeps_lights_on_the_circle() {
        let mut scene = SceneGraph::new();
        for _ in 0..4 {
            scene.add_light(PointLight::new(Point3::new(0.0, 0.0, 0.0), [1.0; 3]));
        }
        scene.orbit_lights(1.7);
        for light in scene.lights() {
            let horizontal = (light.position.x.powi(2) + light.position.z.powi(2)).sqrt();
            assert!((horizontal - 10.0).abs() < 1e-4);
            assert_eq!(light.position.y, 5.0);
        }
        // Quarter-circle phase offsets keep opposite lights opposed.
        let a = scene.lights()[0].position;
        let c = scene.lights()[2].position;
        assert!((a.x + c.x).abs() < 1e-4);
        assert!((a.z + c.z).abs() < 1e-4);
    }

    #[test]
    fn lerp_color_blends_and_clamps() {
        let day = [0.53, 0.81, 0.92];
        let night = [0.2, 0.2, 0.2];
        assert_eq!(lerp_color(day, night, 0.0), day);
        assert_eq!(lerp_color(day, night, 1.0), night);
        assert_eq!(lerp_color(day, night, 2.0), night);
        let mid = lerp_color(day, night, 0.5);
        assert!((mid[0] - 0.365).abs() < 1e-6);
    }

    #[test]
    fn light_marker_follows_the_light() {
        let mut light = PointLight::new(Point3::new(1.0, 2.0, 3.0), [1.0, 1.0, 0.0]);
        light.set_position(Point3::new(-4.0, 5.0, 6.0));
        let model = light.marker.transform.model();
        assert_eq!(model.w.x, -4.0);
        assert_eq!(model.w.y, 5.0);
        assert_eq!(model.w.z, 6.0);
    }
}
