/// memview core library - assembly data model, placement and viewer logic
///
/// This library holds everything that does not touch a real output device:
/// the `.mem` container, the placement solver that fits an assembly into a
/// display footprint, the camera and input state machine, and the viewer
/// shell that feeds a pluggable render service.

pub mod config;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod idle;
pub mod keycode;
pub mod mem;
pub mod placement;
pub mod projection;
pub mod service;
pub mod transform;
pub mod viewer;

// Re-export commonly used types
pub use config::ViewerConfig;
pub use controller::{PickRequest, ViewController};
pub use error::{GeometryError, MemError, PlacementError, ServiceError, ViewerError};
pub use geometry::{Assembly, BoundingBox, Component, IndexRange, Part, PickKind, PickTarget};
pub use idle::{ActivityState, RenderActivity};
pub use keycode::{Key, KeyCode, PointerButton};
pub use placement::{compute_placement, Footprint, Placement, ThicknessAxis};
pub use projection::Camera;
pub use service::RenderService;
pub use transform::{OrbitState, Transform};
pub use viewer::{FrameOutcome, Viewer};
