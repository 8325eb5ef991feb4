/// Error types shared across the viewer core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for data model construction.
pub type GeometryResult<T> = Result<T, GeometryError>;

/// Result type for placement computation.
pub type PlacementResult<T> = Result<T, PlacementError>;

/// Result type for `.mem` encoding and decoding.
pub type MemResult<T> = Result<T, MemError>;

/// Result type for render service calls.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Invalid assembly or part data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// A component references a part that does not exist.
    #[error("component {component} references part {part_index}, but the assembly has {part_count} parts")]
    InvalidPartIndex {
        /// Offending component.
        component: usize,
        /// The referenced part index.
        part_index: usize,
        /// Number of parts available.
        part_count: usize,
    },

    /// A component index past the end of the component list.
    #[error("component index {index} out of range (assembly has {count} components)")]
    ComponentOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of components.
        count: usize,
    },

    /// A face or edge window reaches past the index buffer.
    #[error("part {part}: {what} window {start}+{count} exceeds {len} indices")]
    RangeOutOfBounds {
        /// Offending part.
        part: usize,
        /// `"face"` or `"edge"`.
        what: &'static str,
        /// Window start.
        start: u32,
        /// Window length.
        count: u32,
        /// Index buffer length.
        len: usize,
    },

    /// An index references a vertex that does not exist.
    #[error("part {part}: index {index} references vertex {vertex}, but the part has {vertex_count} vertices")]
    VertexOutOfBounds {
        /// Offending part.
        part: usize,
        /// Position within the index buffer.
        index: usize,
        /// Referenced vertex.
        vertex: u32,
        /// Number of vertices.
        vertex_count: usize,
    },

    /// Face or edge boundaries are not non-decreasing offsets into the index buffer.
    #[error("part {part}: {what} boundaries are not ordered offsets into the index buffer")]
    BadBoundaries {
        /// Offending part.
        part: usize,
        /// `"face"` or `"edge"`.
        what: &'static str,
    },
}

/// Preconditions violated when computing a placement matrix.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlacementError {
    /// The target footprint is not a pair of positive finite numbers.
    #[error("invalid footprint {width}x{height}: both sides must be positive and finite")]
    InvalidFootprint {
        /// Requested width.
        width: f32,
        /// Requested height.
        height: f32,
    },

    /// No components to place.
    #[error("cannot place an assembly with no components")]
    EmptyAssembly,

    /// A component's part index is invalid.
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Part bounds or component matrices produced non-finite coordinates.
    #[error("assembly bounds are not finite")]
    NonFiniteGeometry,

    /// The assembly has no extent along one of the footprint axes.
    #[error("degenerate geometry: footprint span {x_length}x{y_length} has a zero side")]
    DegenerateGeometry {
        /// Span along the display x axis.
        x_length: f32,
        /// Span along the display y axis.
        y_length: f32,
    },

    /// The fitted scale or the final matrix overflowed `f32`.
    #[error("placement overflows: scale {scale} does not give a finite matrix")]
    NonFiniteScale {
        /// The computed uniform scale.
        scale: f32,
    },
}

/// Errors reading or writing a `.mem` container.
#[derive(Debug, Error)]
pub enum MemError {
    /// I/O error during file operations.
    #[error("I/O error at '{path}': {source}")]
    Io {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The input does not start with the container magic.
    #[error("not a .mem container (bad magic)")]
    BadMagic,

    /// The container was written by an unknown format version.
    #[error("unsupported .mem version {0}")]
    UnsupportedVersion(u16),

    /// The byte stream ended early or a record tag was wrong.
    #[error("malformed .mem data at byte {offset}")]
    Malformed {
        /// Byte offset where parsing failed.
        offset: usize,
    },

    /// Data follows the last component record.
    #[error("{0} trailing bytes after the last component")]
    TrailingBytes(usize),

    /// The decoded assembly failed validation.
    #[error("invalid assembly: {0}")]
    Geometry(#[from] GeometryError),
}

/// Errors surfaced by a render service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service was used before `initialize` succeeded.
    #[error("render service is not initialized")]
    NotInitialized,

    /// The geometry could not be placed in the viewport.
    #[error("cannot place geometry: {0}")]
    Placement(#[from] PlacementError),

    /// Output device failure.
    #[error("render output failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by the viewer shell.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// The render service refused to start.
    #[error("render service initialization failed: {0}")]
    Init(#[source] ServiceError),

    /// Only `.mem` files can be opened.
    #[error("unsupported file '{0}': expected a .mem file")]
    UnsupportedFile(PathBuf),

    /// The file could not be loaded.
    #[error(transparent)]
    Mem(#[from] MemError),

    /// A render service call failed.
    #[error(transparent)]
    Service(#[from] ServiceError),
}
