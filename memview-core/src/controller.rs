/// Camera state driven by pointer and key input.
///
/// A middle-button drag orbits the model, a Ctrl+left drag pans it and the
/// wheel changes the field of view. A plain left click asks for a pick.

use nalgebra::{Matrix4, Point2};

use crate::error::PlacementResult;
use crate::geometry::Assembly;
use crate::keycode::KeyCode;
use crate::placement::{Footprint, Placement};
use crate::projection::{Camera, DEFAULT_ZOOM};
use crate::transform::{OrbitState, Transform};

/// Model units moved per pixel of Ctrl+left drag.
pub const PAN_SENSITIVITY: f32 = 0.002;
/// Degrees of field of view per wheel unit.
pub const WHEEL_SENSITIVITY: f32 = 0.01;

/// A left click to resolve against the last rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickRequest {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone)]
pub struct ViewController {
    held: KeyCode,
    last: Point2<f32>,
    orbit: OrbitState,
    pan: (f32, f32),
    camera: Camera,
    width: u32,
    height: u32,
    placement: Matrix4<f32>,
}

impl ViewController {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            held: KeyCode::empty(),
            last: Point2::origin(),
            orbit: OrbitState::zero(),
            pan: (0.0, 0.0),
            camera: Camera::new(width, height),
            width,
            height,
            placement: Matrix4::identity(),
        }
    }

    pub fn held(&self) -> KeyCode {
        self.held
    }

    pub fn orbit(&self) -> OrbitState {
        self.orbit
    }

    pub fn pan(&self) -> (f32, f32) {
        self.pan
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn viewport(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn placement(&self) -> &Matrix4<f32> {
        &self.placement
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.camera.set_viewport(width, height);
    }

    /// Adopt a new assembly.
    ///
    /// The placement is solved first; on failure nothing changes. On success
    /// held keys, zoom, orbit and pan are reset.
    pub fn update_geometry(&mut self, assembly: &Assembly, footprint: Footprint) -> PlacementResult<Placement> {
        let placement = Placement::solve(assembly, footprint)?;
        self.held = KeyCode::empty();
        self.orbit = OrbitState::zero();
        self.pan = (0.0, 0.0);
        self.camera.zoom = DEFAULT_ZOOM;
        self.placement = placement.matrix;
        Ok(placement)
    }

    pub fn mouse_down(&mut self, code: KeyCode, x: i32, y: i32) {
        self.last = Point2::new(x as f32, y as f32);
        self.held |= code;
    }

    pub fn mouse_up(&mut self, code: KeyCode, x: i32, y: i32) -> Option<PickRequest> {
        let pick = (code == KeyCode::LEFT && self.held == KeyCode::LEFT).then_some(PickRequest { x, y });
        self.held &= !code;
        pick
    }

    pub fn mouse_move(&mut self, x: i32, y: i32) {
        if self.held != KeyCode::MIDDLE && self.held != KeyCode::CONTROL_LEFT {
            return;
        }
        let pos = Point2::new(x as f32, y as f32);
        let dx = pos.x - self.last.x;
        // Screen y grows downward.
        let dy = self.last.y - pos.y;
        self.last = pos;

        if self.held == KeyCode::MIDDLE {
            self.orbit.drag(dx, dy);
        } else {
            self.pan.0 += dx * PAN_SENSITIVITY;
            self.pan.1 += dy * PAN_SENSITIVITY;
        }
    }

    pub fn mouse_wheel(&mut self, delta: i32) {
        self.camera.zoom_by(delta as f32 * WHEEL_SENSITIVITY);
    }

    pub fn key_down(&mut self, code: KeyCode) {
        self.held |= code;
    }

    pub fn key_up(&mut self, code: KeyCode) {
        self.held &= !code;
    }

    /// Orbit applied on top of the placement.
    pub fn model_matrix(&self) -> Matrix4<f32> {
        Transform::rotation_matrix(&self.orbit) * self.placement
    }

    /// Camera view followed by the pan offset.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Transform::translation_matrix(self.pan.0, self.pan.1, 0.0) * self.camera.view_matrix()
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.camera.projection_matrix()
    }
}
