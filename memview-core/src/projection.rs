/// Camera and projection utilities
use nalgebra::{Matrix4, Point3, Vector3, Vector4};

/// Default vertical field of view, in degrees.
pub const DEFAULT_ZOOM: f32 = 60.0;
/// Smallest field of view the wheel can reach.
pub const MIN_ZOOM: f32 = 0.001;
/// Largest field of view the wheel can reach.
pub const MAX_ZOOM: f32 = 179.99;

/// Fixed camera looking at the origin from behind the placement frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    /// Vertical field of view in degrees.
    pub zoom: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            position: Point3::new(0.0, 0.0, -20.0),
            target: Point3::origin(),
            up: Vector3::y(),
            zoom: DEFAULT_ZOOM,
            aspect: aspect_ratio(width, height),
            near: 0.1,
            far: 100.0,
        }
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = aspect_ratio(width, height);
    }

    /// Narrow or widen the field of view, staying inside the zoom limits.
    pub fn zoom_by(&mut self, delta: f32) {
        self.zoom = clamp_zoom(self.zoom - delta);
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect, self.zoom.to_radians(), self.near, self.far)
    }

    /// Project a model-space point to screen space.
    ///
    /// Returns `(x, y, depth)` with depth in normalized device units, or
    /// `None` when the point is behind the eye or outside the view volume.
    pub fn project_to_screen(
        &self,
        point: &Point3<f32>,
        model_matrix: &Matrix4<f32>,
        width: u32,
        height: u32,
    ) -> Option<(f32, f32, f32)> {
        let mvp = self.projection_matrix() * self.view_matrix() * model_matrix;
        project_point(&mvp, point, width, height)
    }
}

/// Project a point through a full model-view-projection matrix.
pub fn project_point(
    mvp: &Matrix4<f32>,
    point: &Point3<f32>,
    width: u32,
    height: u32,
) -> Option<(f32, f32, f32)> {
    let clip: Vector4<f32> = mvp * point.to_homogeneous();

    // Prevent division by near-zero depth values
    if clip.w < 1e-6 {
        return None;
    }

    let ndc = clip.xyz() / clip.w;
    if ndc.x.abs() > 1.0 || ndc.y.abs() > 1.0 || ndc.z.abs() > 1.0 {
        return None;
    }

    // Convert to screen space
    let screen_x = (ndc.x + 1.0) * 0.5 * width as f32;
    let screen_y = (1.0 - ndc.y) * 0.5 * height as f32;

    Some((screen_x, screen_y, ndc.z))
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

fn clamp_zoom(zoom: f32) -> f32 {
    if zoom <= 0.0 {
        MIN_ZOOM
    } else if zoom >= 180.0 {
        MAX_ZOOM
    } else {
        zoom
    }
}
