/// Placement of a whole assembly inside a display footprint.
///
/// The solver finds the assembly's bounding box, turns its thinnest extent
/// toward the viewer, centers it on the origin and scales it uniformly so
/// the two remaining extents fit the requested width and height.

use nalgebra::{Matrix4, Point3, Vector3};
use tracing::debug;

use crate::error::{GeometryError, PlacementError, PlacementResult};
use crate::geometry::Assembly;
use crate::transform::Transform;

/// Target width and height in model units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    pub width: f32,
    pub height: f32,
}

impl Footprint {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    fn validate(&self) -> PlacementResult<()> {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if valid(self.width) && valid(self.height) {
            Ok(())
        } else {
            Err(PlacementError::InvalidFootprint {
                width: self.width,
                height: self.height,
            })
        }
    }
}

impl Default for Footprint {
    fn default() -> Self {
        Self::new(16.0, 12.0)
    }
}

/// The axis along which the assembly is thinnest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThicknessAxis {
    X,
    Y,
    Z,
}

impl ThicknessAxis {
    /// Pick the smallest extent. Exact ties go to Z, then Y, then X.
    pub fn from_extents(extents: &Vector3<f32>) -> Self {
        let t = extents.z.min(extents.x.min(extents.y));
        if t == extents.z {
            ThicknessAxis::Z
        } else if t == extents.y {
            ThicknessAxis::Y
        } else {
            ThicknessAxis::X
        }
    }

    /// Depth direction of the display frame.
    pub fn forward(self) -> Vector3<f32> {
        match self {
            ThicknessAxis::X => Vector3::x(),
            ThicknessAxis::Y => Vector3::y(),
            ThicknessAxis::Z => Vector3::z(),
        }
    }

    /// Up direction of the display frame.
    pub fn up(self) -> Vector3<f32> {
        match self {
            ThicknessAxis::X => Vector3::z(),
            ThicknessAxis::Y => Vector3::x(),
            ThicknessAxis::Z => Vector3::y(),
        }
    }
}

/// Left-handed world frame looking along `forward` with `up` as display y,
/// moving `position` to the origin.
pub fn world_lh(position: &Point3<f32>, forward: &Vector3<f32>, up: &Vector3<f32>) -> Matrix4<f32> {
    let z = (-forward).normalize();
    let x = up.cross(&z).normalize();
    let y = z.cross(&x);
    let p = &position.coords;

    #[rustfmt::skip]
    let world = Matrix4::new(
        x.x, x.y, x.z, -x.dot(p),
        y.x, y.y, y.z, -y.dot(p),
        z.x, z.y, z.z, -z.dot(p),
        0.0, 0.0, 0.0, 1.0,
    );
    world
}

/// A solved placement together with the intermediate quantities.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// Final transform, `scale * world`.
    pub matrix: Matrix4<f32>,
    pub scale: f32,
    pub thickness: ThicknessAxis,
    /// Center of the assembly bounding box before placement.
    pub center: Point3<f32>,
    /// Extent of the assembly along display x and y before scaling.
    pub span: (f32, f32),
}

impl Placement {
    pub fn solve(assembly: &Assembly, footprint: Footprint) -> PlacementResult<Self> {
        footprint.validate()?;
        if assembly.components().is_empty() {
            return Err(PlacementError::EmptyAssembly);
        }

        let mut min = Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY);
        let mut max = Point3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY);
        for (index, component) in assembly.components().iter().enumerate() {
            let part = assembly.parts().get(component.part_index).ok_or(
                GeometryError::InvalidPartIndex {
                    component: index,
                    part_index: component.part_index,
                    part_count: assembly.parts().len(),
                },
            )?;
            // Only the two stored corners are transformed, not all eight.
            for corner in part.bounds.transformed_corners(&component.matrix) {
                if !corner.iter().all(|v| v.is_finite()) {
                    return Err(PlacementError::NonFiniteGeometry);
                }
                min = min.inf(&corner);
                max = max.sup(&corner);
            }
        }

        let center = nalgebra::center(&min, &max);
        let extents = max - min;
        let thickness = ThicknessAxis::from_extents(&extents);
        let world = world_lh(&center, &thickness.forward(), &thickness.up());

        let placed_min = world.transform_point(&min);
        let placed_max = world.transform_point(&max);
        let x_length = (placed_max.x - placed_min.x).abs();
        let y_length = (placed_max.y - placed_min.y).abs();

        let tolerance = f32::EPSILON * extents.amax();
        if x_length <= tolerance || y_length <= tolerance {
            return Err(PlacementError::DegenerateGeometry { x_length, y_length });
        }

        let scale = (footprint.width / x_length).min(footprint.height / y_length);
        let matrix = Transform::scale_matrix(scale, scale, scale) * world;
        if !scale.is_finite() || !matrix.iter().all(|v| v.is_finite()) {
            return Err(PlacementError::NonFiniteScale { scale });
        }
        debug!(?thickness, scale, x_length, y_length, "placed assembly");

        Ok(Self {
            matrix,
            scale,
            thickness,
            center,
            span: (x_length, y_length),
        })
    }
}

/// Placement matrix fitting `assembly` into a `width` x `height` footprint.
pub fn compute_placement(assembly: &Assembly, width: f32, height: f32) -> PlacementResult<Matrix4<f32>> {
    Placement::solve(assembly, Footprint::new(width, height)).map(|p| p.matrix)
}
