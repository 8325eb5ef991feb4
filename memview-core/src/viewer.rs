/// Viewer shell: turns UI events into render service calls.
///
/// Pointer presses, moves, middle releases, wheel and key events reach the
/// service immediately. Left releases, geometry and size changes are queued
/// and delivered at the start of the next drawn frame, so they run in the
/// same context as rendering. Frames stop once the viewer has been idle
/// for the configured timeout and resume on the next event.

use std::path::Path;
use std::time::Instant;

use tracing::{debug, warn};

use crate::config::ViewerConfig;
use crate::error::{ServiceError, ViewerError};
use crate::geometry::Assembly;
use crate::idle::{ActivityState, RenderActivity};
use crate::keycode::{Key, KeyCode, PointerButton};
use crate::mem;
use crate::service::RenderService;

pub type ViewerResult<T> = Result<T, ViewerError>;

/// What a call to [`Viewer::frame`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Rendered,
    /// Nothing happened recently; the frame was skipped.
    Idle,
}

pub struct Viewer<S: RenderService> {
    service: S,
    config: ViewerConfig,
    activity: RenderActivity,
    initialized: bool,
    /// Display scale applied to pointer coordinates and sizes.
    scale: f64,
    /// Last size reported by the UI, before scaling.
    logical_size: (f64, f64),
    pending_geometry: Option<Assembly>,
    pending_size: Option<(u32, u32)>,
    pending_left_release: Option<(i32, i32)>,
    rejected: Option<ServiceError>,
}

impl<S: RenderService> Viewer<S> {
    pub fn new(service: S, config: ViewerConfig, now: Instant) -> Self {
        let activity = RenderActivity::new(config.idle_timeout, now);
        Self {
            service,
            config,
            activity,
            initialized: false,
            scale: 1.0,
            logical_size: (0.0, 0.0),
            pending_geometry: None,
            pending_size: None,
            pending_left_release: None,
            rejected: None,
        }
    }

    /// Start the render service. Later calls are no-ops.
    pub fn initialize(&mut self) -> ViewerResult<()> {
        if !self.initialized {
            self.service.initialize().map_err(ViewerError::Init)?;
            self.initialized = true;
        }
        Ok(())
    }

    pub fn shutdown(&mut self) {
        if self.initialized {
            self.service.shutdown();
            self.initialized = false;
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut S {
        &mut self.service
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn activity(&self) -> ActivityState {
        self.activity.state()
    }

    /// The error from the last geometry the service refused, if not yet taken.
    pub fn take_rejection(&mut self) -> Option<ServiceError> {
        self.rejected.take()
    }

    /// Queue a new scene for the next frame.
    pub fn load_assembly(&mut self, assembly: Assembly, now: Instant) {
        self.pending_geometry = Some(assembly);
        self.activity.touch(now);
    }

    /// Load a `.mem` file and queue it. On error the current scene is kept.
    pub fn open(&mut self, path: &Path, now: Instant) -> ViewerResult<()> {
        let is_mem = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(mem::EXTENSION));
        if !is_mem {
            return Err(ViewerError::UnsupportedFile(path.to_path_buf()));
        }
        let assembly = mem::load(path)?;
        self.load_assembly(assembly, now);
        Ok(())
    }

    pub fn size_changed(&mut self, width: f64, height: f64, now: Instant) {
        self.logical_size = (width, height);
        self.queue_resize(now);
    }

    pub fn scale_changed(&mut self, scale: f64, now: Instant) {
        self.scale = scale;
        self.queue_resize(now);
    }

    pub fn pointer_pressed(&mut self, button: PointerButton, x: f64, y: f64, now: Instant) {
        if let Some(code) = button.key_code() {
            let (x, y) = self.to_device(x, y);
            self.service.mouse_down(code, x, y);
        }
        self.activity.touch(now);
    }

    pub fn pointer_released(&mut self, button: PointerButton, x: f64, y: f64, now: Instant) {
        let (x, y) = self.to_device(x, y);
        match button {
            PointerButton::Left => self.pending_left_release = Some((x, y)),
            PointerButton::Middle => self.service.mouse_up(KeyCode::MIDDLE, x, y),
            PointerButton::Right => {}
        }
        self.activity.touch(now);
    }

    pub fn pointer_moved(&mut self, x: f64, y: f64, now: Instant) {
        let (x, y) = self.to_device(x, y);
        self.service.mouse_move(x, y);
        self.activity.touch(now);
    }

    /// Scroll by `lines`; positive scrolls up.
    ///
    /// Fractional lines from smooth-scrolling devices are scaled before
    /// truncation, so half a line still zooms by half a step.
    pub fn wheel(&mut self, lines: f64, now: Instant) {
        self.service
            .mouse_wheel((lines * self.config.wheel_step as f64) as i32);
        self.activity.touch(now);
    }

    pub fn key_pressed(&mut self, key: Key, now: Instant) {
        self.service.key_down(key.into());
        self.activity.touch(now);
    }

    pub fn key_released(&mut self, key: Key, now: Instant) {
        self.service.key_up(key.into());
        self.activity.touch(now);
    }

    /// Drive one tick of the render loop.
    pub fn frame(&mut self, now: Instant) -> ViewerResult<FrameOutcome> {
        if !self.initialized {
            return Err(ServiceError::NotInitialized.into());
        }
        if self.activity.poll(now) == ActivityState::Idle {
            return Ok(FrameOutcome::Idle);
        }

        if let Some((x, y)) = self.pending_left_release.take() {
            self.service.mouse_up(KeyCode::LEFT, x, y);
        }
        if let Some(assembly) = self.pending_geometry.take() {
            debug!(components = assembly.components().len(), "delivering geometry");
            if let Err(error) = self.service.update_geometry(assembly) {
                warn!(%error, "geometry rejected, keeping the previous scene");
                self.rejected = Some(error);
            }
        }
        if let Some((width, height)) = self.pending_size.take() {
            self.service.resize(width, height);
        }

        self.service.render_frame()?;
        Ok(FrameOutcome::Rendered)
    }

    fn queue_resize(&mut self, now: Instant) {
        let (w, h) = self.logical_size;
        self.pending_size = Some(((w * self.scale) as u32, (h * self.scale) as u32));
        self.activity.touch(now);
    }

    fn to_device(&self, x: f64, y: f64) -> (i32, i32) {
        ((x * self.scale) as i32, (y * self.scale) as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PlacementError, ServiceResult};
    use crate::geometry::{Component, Part};
    use crate::placement::{Footprint, Placement};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Init,
        Shutdown,
        Resize(u32, u32),
        Render,
        Geometry(usize),
        Down(KeyCode, i32, i32),
        Up(KeyCode, i32, i32),
        Move(i32, i32),
        Wheel(i32),
        KeyDown(KeyCode),
        KeyUp(KeyCode),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
        fail_init: bool,
    }

    impl RenderService for Recorder {
        fn initialize(&mut self) -> ServiceResult<()> {
            if self.fail_init {
                return Err(ServiceError::Io(std::io::Error::other("no display")));
            }
            self.calls.push(Call::Init);
            Ok(())
        }
        fn shutdown(&mut self) {
            self.calls.push(Call::Shutdown);
        }
        fn resize(&mut self, width: u32, height: u32) {
            self.calls.push(Call::Resize(width, height));
        }
        fn render_frame(&mut self) -> ServiceResult<()> {
            self.calls.push(Call::Render);
            Ok(())
        }
        fn update_geometry(&mut self, assembly: Assembly) -> ServiceResult<()> {
            Placement::solve(&assembly, Footprint::default())?;
            self.calls.push(Call::Geometry(assembly.components().len()));
            Ok(())
        }
        fn mouse_down(&mut self, code: KeyCode, x: i32, y: i32) {
            self.calls.push(Call::Down(code, x, y));
        }
        fn mouse_up(&mut self, code: KeyCode, x: i32, y: i32) {
            self.calls.push(Call::Up(code, x, y));
        }
        fn mouse_move(&mut self, x: i32, y: i32) {
            self.calls.push(Call::Move(x, y));
        }
        fn mouse_wheel(&mut self, delta: i32) {
            self.calls.push(Call::Wheel(delta));
        }
        fn key_down(&mut self, code: KeyCode) {
            self.calls.push(Call::KeyDown(code));
        }
        fn key_up(&mut self, code: KeyCode) {
            self.calls.push(Call::KeyUp(code));
        }
    }

    fn started(now: Instant) -> Viewer<Recorder> {
        let mut viewer = Viewer::new(Recorder::default(), ViewerConfig::default(), now);
        viewer.initialize().unwrap();
        viewer.service_mut().calls.clear();
        viewer
    }

    fn calls(viewer: &mut Viewer<Recorder>) -> Vec<Call> {
        std::mem::take(&mut viewer.service_mut().calls)
    }

    #[test]
    fn test_frame_requires_initialize() {
        let now = Instant::now();
        let mut viewer = Viewer::new(Recorder::default(), ViewerConfig::default(), now);
        assert!(matches!(
            viewer.frame(now),
            Err(ViewerError::Service(ServiceError::NotInitialized))
        ));
    }

    #[test]
    fn test_initialize_failure() {
        let now = Instant::now();
        let service = Recorder { fail_init: true, ..Recorder::default() };
        let mut viewer = Viewer::new(service, ViewerConfig::default(), now);
        assert!(matches!(viewer.initialize(), Err(ViewerError::Init(_))));
    }

    #[test]
    fn test_initialize_once_and_shutdown() {
        let now = Instant::now();
        let mut viewer = Viewer::new(Recorder::default(), ViewerConfig::default(), now);
        viewer.initialize().unwrap();
        viewer.initialize().unwrap();
        viewer.shutdown();
        viewer.shutdown();
        assert_eq!(calls(&mut viewer), vec![Call::Init, Call::Shutdown]);
    }

    #[test]
    fn test_geometry_waits_for_frame() {
        let now = Instant::now();
        let mut viewer = started(now);
        viewer.load_assembly(Assembly::default_cube(), now);
        assert!(calls(&mut viewer).is_empty());

        assert_eq!(viewer.frame(now).unwrap(), FrameOutcome::Rendered);
        assert_eq!(calls(&mut viewer), vec![Call::Geometry(1), Call::Render]);
    }

    #[test]
    fn test_left_release_is_deferred_middle_is_not() {
        let now = Instant::now();
        let mut viewer = started(now);
        viewer.pointer_pressed(PointerButton::Left, 1.0, 2.0, now);
        viewer.pointer_released(PointerButton::Left, 3.0, 4.0, now);
        viewer.pointer_pressed(PointerButton::Middle, 5.0, 6.0, now);
        viewer.pointer_released(PointerButton::Middle, 7.0, 8.0, now);
        assert_eq!(
            calls(&mut viewer),
            vec![
                Call::Down(KeyCode::LEFT, 1, 2),
                Call::Down(KeyCode::MIDDLE, 5, 6),
                Call::Up(KeyCode::MIDDLE, 7, 8),
            ]
        );

        viewer.frame(now).unwrap();
        assert_eq!(calls(&mut viewer), vec![Call::Up(KeyCode::LEFT, 3, 4), Call::Render]);
    }

    #[test]
    fn test_right_button_is_not_forwarded() {
        let now = Instant::now();
        let mut viewer = started(now);
        viewer.pointer_pressed(PointerButton::Right, 1.0, 1.0, now);
        viewer.pointer_released(PointerButton::Right, 1.0, 1.0, now);
        assert!(calls(&mut viewer).is_empty());
    }

    #[test]
    fn test_scale_applies_to_pointer_and_size() {
        let now = Instant::now();
        let mut viewer = started(now);
        viewer.size_changed(400.0, 300.0, now);
        viewer.scale_changed(2.0, now);
        viewer.pointer_moved(10.4, 20.6, now);
        viewer.frame(now).unwrap();
        assert_eq!(
            calls(&mut viewer),
            vec![Call::Move(20, 41), Call::Resize(800, 600), Call::Render]
        );
    }

    #[test]
    fn test_wheel_and_keys() {
        let now = Instant::now();
        let mut viewer = started(now);
        viewer.wheel(-1.0, now);
        viewer.key_pressed(Key::RightCtrl, now);
        viewer.key_released(Key::Other, now);
        assert_eq!(
            calls(&mut viewer),
            vec![
                Call::Wheel(-100),
                Call::KeyDown(KeyCode::CONTROL),
                Call::KeyUp(KeyCode::empty()),
            ]
        );
    }

    #[test]
    fn test_fractional_wheel_scales_before_truncating() {
        let now = Instant::now();
        let mut viewer = started(now);
        viewer.wheel(0.5, now);
        viewer.wheel(-0.004, now);
        assert_eq!(calls(&mut viewer), vec![Call::Wheel(50), Call::Wheel(0)]);
    }

    #[test]
    fn test_idle_skips_frames_until_input() {
        let start = Instant::now();
        let mut viewer = started(start);
        let later = start + Duration::from_millis(1500);
        assert_eq!(viewer.frame(later).unwrap(), FrameOutcome::Idle);
        assert_eq!(viewer.activity(), ActivityState::Idle);
        assert!(calls(&mut viewer).is_empty());

        viewer.pointer_moved(1.0, 1.0, later);
        assert_eq!(viewer.frame(later).unwrap(), FrameOutcome::Rendered);
        assert_eq!(calls(&mut viewer), vec![Call::Move(1, 1), Call::Render]);
    }

    #[test]
    fn test_geometry_update_wakes_idle_viewer() {
        let start = Instant::now();
        let mut viewer = started(start);
        let later = start + Duration::from_secs(3);
        viewer.frame(later).unwrap();
        viewer.load_assembly(Assembly::default_cube(), later);
        assert_eq!(viewer.frame(later).unwrap(), FrameOutcome::Rendered);
    }

    #[test]
    fn test_rejected_geometry_keeps_rendering() {
        let now = Instant::now();
        let mut viewer = started(now);
        let flat = Assembly::new(
            vec![Part::from_bounds(crate::geometry::BoundingBox::new(
                [0.0, 0.0, 0.0].into(),
                [1.0, 0.0, 0.0].into(),
            ))],
            vec![Component::identity(0)],
        )
        .unwrap();
        viewer.load_assembly(flat, now);
        assert_eq!(viewer.frame(now).unwrap(), FrameOutcome::Rendered);
        assert_eq!(calls(&mut viewer), vec![Call::Render]);
        assert!(matches!(
            viewer.take_rejection(),
            Some(ServiceError::Placement(PlacementError::DegenerateGeometry { .. }))
        ));
        assert!(viewer.take_rejection().is_none());
    }

    #[test]
    fn test_open_rejects_other_extensions() {
        let now = Instant::now();
        let mut viewer = started(now);
        assert!(matches!(
            viewer.open(Path::new("model.stl"), now),
            Err(ViewerError::UnsupportedFile(_))
        ));
    }

    #[test]
    fn test_open_failure_keeps_pending_scene() {
        let now = Instant::now();
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.MEM");
        std::fs::write(&broken, b"MEM\0junk").unwrap();

        let mut viewer = started(now);
        viewer.load_assembly(Assembly::default_cube(), now);
        assert!(matches!(viewer.open(&broken, now), Err(ViewerError::Mem(_))));
        viewer.frame(now).unwrap();
        assert_eq!(calls(&mut viewer), vec![Call::Geometry(1), Call::Render]);
    }

    #[test]
    fn test_open_loads_file() {
        let now = Instant::now();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pair.mem");
        let pair = Assembly::new(
            vec![Part::cube(1.0)],
            vec![Component::identity(0), Component::identity(0)],
        )
        .unwrap();
        mem::save(&path, &pair).unwrap();

        let mut viewer = started(now);
        viewer.open(&path, now).unwrap();
        viewer.frame(now).unwrap();
        assert_eq!(calls(&mut viewer), vec![Call::Geometry(2), Call::Render]);
    }
}
