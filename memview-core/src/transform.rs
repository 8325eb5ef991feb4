/// 3D transformation matrices and orbit state
use nalgebra::{Matrix4, Vector3};

/// Degrees to rotate the model per pixel of drag.
pub const ORBIT_SENSITIVITY: f32 = 0.8;

/// Accumulated drag rotation, in degrees.
///
/// `yaw` turns the model about the vertical axis, `pitch` about the
/// horizontal one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitState {
    pub yaw: f32,
    pub pitch: f32,
}

impl OrbitState {
    pub fn new(yaw: f32, pitch: f32) -> Self {
        Self { yaw, pitch }
    }

    pub fn zero() -> Self {
        Self { yaw: 0.0, pitch: 0.0 }
    }

    /// Apply a pointer drag of `(dx, dy)` pixels.
    pub fn drag(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * ORBIT_SENSITIVITY;
        self.pitch += dy * ORBIT_SENSITIVITY;
    }
}

impl Default for OrbitState {
    fn default() -> Self {
        Self::zero()
    }
}

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Rotation for an orbit state: yaw first, then pitch
    pub fn rotation_matrix(orbit: &OrbitState) -> Matrix4<f32> {
        let pitch = Matrix4::new_rotation(Vector3::new(orbit.pitch.to_radians(), 0.0, 0.0));
        let yaw = Matrix4::new_rotation(Vector3::new(0.0, orbit.yaw.to_radians(), 0.0));
        pitch * yaw
    }

    /// Create a translation matrix
    pub fn translation_matrix(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// Create a scale matrix
    pub fn scale_matrix(sx: f32, sy: f32, sz: f32) -> Matrix4<f32> {
        Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz))
    }

    /// Create a model-view-projection matrix
    pub fn mvp_matrix(
        model: &Matrix4<f32>,
        view: &Matrix4<f32>,
        projection: &Matrix4<f32>,
    ) -> Matrix4<f32> {
        projection * view * model
    }
}
