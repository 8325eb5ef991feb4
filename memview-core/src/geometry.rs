/// Assembly data model: parts, placed components, bounding boxes and pick ids
use nalgebra::{Matrix4, Point3, Vector3};

use crate::error::{GeometryError, GeometryResult};

/// An axis-aligned box given by its minimum and maximum corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl BoundingBox {
    /// Create a box; corners are swapped per axis so that `min <= max`.
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Self {
            min: Point3::new(min.x.min(max.x), min.y.min(max.y), min.z.min(max.z)),
            max: Point3::new(min.x.max(max.x), min.y.max(max.y), min.z.max(max.z)),
        }
    }

    /// Smallest box enclosing every point. `None` for an empty input.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f32>>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = *points.next()?;
        let mut bounds = Self { min: first, max: first };
        for p in points {
            bounds.min = bounds.min.inf(p);
            bounds.max = bounds.max.sup(p);
        }
        Some(bounds)
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn corners(&self) -> [Point3<f32>; 2] {
        [self.min, self.max]
    }

    /// Transform only the two stored corners.
    ///
    /// The result is not re-sorted: under a rotation the first point may
    /// exceed the second on some axis. Callers that need a box take per-axis
    /// extrema over the returned points.
    pub fn transformed_corners(&self, matrix: &Matrix4<f32>) -> [Point3<f32>; 2] {
        [matrix.transform_point(&self.min), matrix.transform_point(&self.max)]
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.min.iter().chain(self.max.iter()).all(|v| v.is_finite())
    }
}

/// A window `[start, start + count)` into a part's index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexRange {
    pub start: u32,
    pub count: u32,
}

impl IndexRange {
    pub fn new(start: u32, count: u32) -> Self {
        Self { start, count }
    }

    pub fn end(&self) -> u64 {
        self.start as u64 + self.count as u64
    }
}

/// One triangle of a part's face window, tagged with the face it belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceTriangle {
    /// Face number within the part, when face boundaries cover the triangle.
    pub face: Option<usize>,
    pub positions: [Point3<f32>; 3],
}

/// Reusable geometry shared by any number of components.
///
/// `indices` holds a triangle list (the `faces` window) and a line list
/// (the `edges` window). `face_starts` and `edge_starts` are offsets into
/// `indices` marking where each face or edge begins; their last entry is a
/// sentinel end and does not start a face or edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub vertices: Vec<Point3<f32>>,
    pub indices: Vec<u32>,
    pub face_starts: Vec<u32>,
    pub edge_starts: Vec<u32>,
    pub faces: IndexRange,
    pub edges: IndexRange,
    pub bounds: BoundingBox,
}

impl Part {
    /// A part with a bounding box and no renderable buffers.
    pub fn from_bounds(bounds: BoundingBox) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            face_starts: Vec::new(),
            edge_starts: Vec::new(),
            faces: IndexRange::default(),
            edges: IndexRange::default(),
            bounds,
        }
    }

    /// Build a part from a triangle list, one face per triangle.
    ///
    /// Returns `None` when there are no vertices to bound.
    pub fn from_triangles(vertices: Vec<Point3<f32>>, indices: Vec<u32>) -> Option<Self> {
        let bounds = BoundingBox::from_points(&vertices)?;
        let count = indices.len() as u32;
        let face_starts = (0..=count).step_by(3).collect();
        Some(Self {
            vertices,
            indices,
            face_starts,
            edge_starts: Vec::new(),
            faces: IndexRange::new(0, count),
            edges: IndexRange::default(),
            bounds,
        })
    }

    /// An axis-aligned cube centered on the origin with 6 faces and 12 edges.
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        // Corner i has +h on x when bit 0 is set, on y for bit 1, on z for bit 2.
        let vertices: Vec<Point3<f32>> = (0..8u32)
            .map(|i| {
                let pick = |bit: u32| if i & bit != 0 { h } else { -h };
                Point3::new(pick(1), pick(2), pick(4))
            })
            .collect();

        let mut indices: Vec<u32> = vec![
            4, 5, 7, 4, 7, 6, // +z
            0, 2, 3, 0, 3, 1, // -z
            2, 6, 7, 2, 7, 3, // +y
            0, 1, 5, 0, 5, 4, // -y
            1, 3, 7, 1, 7, 5, // +x
            0, 4, 6, 0, 6, 2, // -x
        ];
        let face_count = indices.len() as u32;
        indices.extend_from_slice(&[
            0, 1, 2, 3, 4, 5, 6, 7, // along x
            0, 2, 1, 3, 4, 6, 5, 7, // along y
            0, 4, 1, 5, 2, 6, 3, 7, // along z
        ]);
        let edge_count = indices.len() as u32 - face_count;

        Self {
            vertices,
            indices,
            face_starts: (0..=face_count).step_by(6).collect(),
            edge_starts: (face_count..=face_count + edge_count).step_by(2).collect(),
            faces: IndexRange::new(0, face_count),
            edges: IndexRange::new(face_count, edge_count),
            bounds: BoundingBox::new(Point3::new(-h, -h, -h), Point3::new(h, h, h)),
        }
    }

    pub fn face_count(&self) -> usize {
        self.face_starts.len().saturating_sub(1)
    }

    pub fn edge_count(&self) -> usize {
        self.edge_starts.len().saturating_sub(1)
    }

    /// Number of pick ids this part occupies when placed once.
    pub fn pick_id_count(&self) -> usize {
        self.face_count() + self.edge_count()
    }

    /// Triangles of the face window, in index order.
    pub fn face_triangles(&self) -> impl Iterator<Item = FaceTriangle> + '_ {
        let start = self.faces.start as usize;
        let end = (self.faces.end() as usize).min(self.indices.len());
        let window = self.indices.get(start..end).unwrap_or(&[]);
        let mut face = 0usize;

        window.chunks_exact(3).enumerate().map(move |(i, tri)| {
            let offset = (start + i * 3) as u32;
            while face + 1 < self.face_starts.len() && self.face_starts[face + 1] <= offset {
                face += 1;
            }
            let covered = face + 1 < self.face_starts.len() && self.face_starts[face] <= offset;
            FaceTriangle {
                face: covered.then_some(face),
                positions: [
                    self.vertices[tri[0] as usize],
                    self.vertices[tri[1] as usize],
                    self.vertices[tri[2] as usize],
                ],
            }
        })
    }

    /// Check buffer consistency. `part` only labels errors.
    pub fn validate(&self, part: usize) -> GeometryResult<()> {
        let len = self.indices.len();
        for (what, range) in [("face", self.faces), ("edge", self.edges)] {
            if range.end() > len as u64 {
                return Err(GeometryError::RangeOutOfBounds {
                    part,
                    what,
                    start: range.start,
                    count: range.count,
                    len,
                });
            }
        }

        if let Some((index, &vertex)) = self
            .indices
            .iter()
            .enumerate()
            .find(|&(_, &v)| v as usize >= self.vertices.len())
        {
            return Err(GeometryError::VertexOutOfBounds {
                part,
                index,
                vertex,
                vertex_count: self.vertices.len(),
            });
        }

        for (what, starts) in [("face", &self.face_starts), ("edge", &self.edge_starts)] {
            let ordered = starts.windows(2).all(|w| w[0] <= w[1]);
            let inside = starts.last().map_or(true, |&last| last as usize <= len);
            if !ordered || !inside {
                return Err(GeometryError::BadBoundaries { part, what });
            }
        }

        Ok(())
    }
}

/// One placed instance of a part.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub part_index: usize,
    /// Part-to-assembly transform, applied as `matrix * p`.
    pub matrix: Matrix4<f32>,
}

impl Component {
    pub fn new(part_index: usize, matrix: Matrix4<f32>) -> Self {
        Self { part_index, matrix }
    }

    pub fn identity(part_index: usize) -> Self {
        Self::new(part_index, Matrix4::identity())
    }
}

/// Which kind of element a pick id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickKind {
    Face,
    Edge,
}

/// The element behind a pick id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickTarget {
    pub component: usize,
    pub kind: PickKind,
    /// Face or edge number within the component's part.
    pub local_index: usize,
}

/// The loaded model: parts plus the components that place them.
///
/// Constructed only through [`Assembly::new`], which guarantees every
/// component references an existing part. Replaced wholesale on reload.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    parts: Vec<Part>,
    components: Vec<Component>,
}

impl Assembly {
    pub fn new(parts: Vec<Part>, components: Vec<Component>) -> GeometryResult<Self> {
        for (i, part) in parts.iter().enumerate() {
            part.validate(i)?;
        }
        if let Some((component, c)) = components
            .iter()
            .enumerate()
            .find(|(_, c)| c.part_index >= parts.len())
        {
            return Err(GeometryError::InvalidPartIndex {
                component,
                part_index: c.part_index,
                part_count: parts.len(),
            });
        }
        Ok(Self { parts, components })
    }

    /// A single unit cube placed once at the origin.
    pub fn default_cube() -> Self {
        Self {
            parts: vec![Part::cube(1.0)],
            components: vec![Component::identity(0)],
        }
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// The part placed by a component.
    pub fn part_of(&self, component: &Component) -> &Part {
        &self.parts[component.part_index]
    }

    /// Each component paired with its part.
    pub fn placed(&self) -> impl Iterator<Item = (&Component, &Part)> + '_ {
        self.components.iter().map(move |c| (c, self.part_of(c)))
    }

    /// Union of the per-component two-corner transformed boxes.
    pub fn bounds(&self) -> Option<BoundingBox> {
        let corners: Vec<Point3<f32>> = self
            .placed()
            .flat_map(|(c, p)| p.bounds.transformed_corners(&c.matrix))
            .collect();
        BoundingBox::from_points(&corners)
    }

    /// First pick id assigned to a component's faces and edges.
    ///
    /// Ids are handed out in component order; `index == len` yields the
    /// total number of ids.
    pub fn first_pick_id(&self, index: usize) -> GeometryResult<usize> {
        if index > self.components.len() {
            return Err(GeometryError::ComponentOutOfRange {
                index,
                count: self.components.len(),
            });
        }
        Ok(self.components[..index]
            .iter()
            .map(|c| self.part_of(c).pick_id_count())
            .sum())
    }

    /// Map a pick id back to the component, kind and local element number.
    pub fn resolve_pick_id(&self, id: usize) -> Option<PickTarget> {
        let mut first = 0usize;
        for (component, c) in self.components.iter().enumerate() {
            let part = self.part_of(c);
            let local = id.checked_sub(first)?;
            if local < part.face_count() {
                return Some(PickTarget { component, kind: PickKind::Face, local_index: local });
            }
            if local < part.pick_id_count() {
                return Some(PickTarget {
                    component,
                    kind: PickKind::Edge,
                    local_index: local - part.face_count(),
                });
            }
            first += part.pick_id_count();
        }
        None
    }
}

impl Default for Assembly {
    fn default() -> Self {
        Self::default_cube()
    }
}
