//! Per-object transform with a lazily maintained normal matrix.
//!
//! Every renderable owns a [`Transform`]: a model matrix that external code
//! may mutate between frames (translate/scale/rotate) and the matching normal
//! matrix that is only recomputed when the model actually changed since the
//! last read.

use cgmath::{Deg, Matrix, Matrix3, Matrix4, SquareMatrix, Vector3};

/// Model matrix plus cached inverse-transpose for normal transformation.
///
/// The normal matrix is the inverse-transpose of the model's upper 3×3,
/// rescaled by the cube root of its determinant so that normals keep their
/// length under rotation + uniform scale (the shader still normalizes, this
/// just keeps the matrix well conditioned).
#[derive(Clone, Debug)]
pub struct Transform {
    model: Matrix4<f32>,
    normal: Matrix3<f32>,
    dirty: bool,
}

impl Transform {
    pub fn new() -> Self {
        Self {
            model: Matrix4::identity(),
            normal: Matrix3::identity(),
            dirty: false,
        }
    }

    pub fn model(&self) -> Matrix4<f32> {
        self.model
    }

    pub fn set_model(&mut self, model: Matrix4<f32>) {
        self.model = model;
        self.dirty = true;
    }

    /// Apply a translation in the object's local space.
    pub fn translate(&mut self, offset: Vector3<f32>) {
        self.model = self.model * Matrix4::from_translation(offset);
        self.dirty = true;
    }

    /// Apply a (possibly non-uniform) scale in the object's local space.
    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.model = self.model * Matrix4::from_nonuniform_scale(x, y, z);
        self.dirty = true;
    }

    /// Apply a rotation of `angle` degrees around `axis` in local space.
    pub fn rotate(&mut self, angle: f32, axis: Vector3<f32>) {
        self.model = self.model * Matrix4::from_axis_angle(axis, Deg(angle));
        self.dirty = true;
    }

    /// The normal matrix consistent with the current model matrix.
    ///
    /// Recomputed here rather than in the mutators so a burst of transform
    /// edits between frames costs one inversion, not many.
    pub fn normal_matrix(&mut self) -> Matrix3<f32> {
        if self.dirty {
            self.normal = compute_normal_matrix(&self.model);
            self.dirty = false;
        }
        self.normal
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

fn compute_normal_matrix(model: &Matrix4<f32>) -> Matrix3<f32> {
    let linear = Matrix3::from_cols(
        model.x.truncate(),
        model.y.truncate(),
        model.z.truncate(),
    );
    let inverse_transpose = match linear.invert() {
        Some(inverse) => inverse.transpose(),
        // Degenerate scale; normals are meaningless anyway, keep it total.
        None => return Matrix3::identity(),
    };
    let det = inverse_transpose.determinant();
    if det.abs() > f32::EPSILON {
        inverse_transpose * (1.0 / det.cbrt())
    } else {
        inverse_transpose
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::InnerSpace;

    #[test]
    fn identity_normal_matrix_is_identity() {
        let mut transform = Transform::new();
        assert_eq!(transform.normal_matrix(), Matrix3::identity());
    }

    #[test]
    fn normal_matrix_preserves_unit_length_for_rigid_uniform_scale() {
        let mut transform = Transform::new();
        transform.translate(Vector3::new(3.0, -2.0, 7.5));
        transform.rotate(37.0, Vector3::unit_y());
        transform.rotate(-12.0, Vector3::unit_x());
        transform.scale(2.5, 2.5, 2.5);

        let normal_matrix = transform.normal_matrix();
        for normal in [
            Vector3::unit_x(),
            Vector3::unit_y(),
            Vector3::new(1.0, 1.0, 1.0).normalize(),
            Vector3::new(-0.3, 0.8, 0.2).normalize(),
        ] {
            let transformed = normal_matrix * normal;
            assert!(
                (transformed.magnitude() - 1.0).abs() < 1e-4,
                "normal length drifted: {}",
                transformed.magnitude()
            );
        }
    }

    #[test]
    fn normal_matrix_recomputes_after_mutation() {
        let mut transform = Transform::new();
        let before = transform.normal_matrix();
        transform.rotate(90.0, Vector3::unit_z());
        let after = transform.normal_matrix();
        assert_ne!(before, after);

        let x = after * Vector3::unit_x();
        assert!((x.y - 1.0).abs() < 1e-5);
    }
}
