/// The boundary between the viewer shell and whatever draws the scene
use crate::error::ServiceResult;
use crate::geometry::Assembly;
use crate::keycode::KeyCode;

/// Rendering backend driven by the viewer shell.
///
/// Implementations receive their output device through their constructor;
/// nothing is looked up from global state. Calls arrive on one thread in
/// the order the user produced them.
pub trait RenderService {
    /// Acquire the output device. Called once, before any other method.
    fn initialize(&mut self) -> ServiceResult<()>;

    /// Release the output device.
    fn shutdown(&mut self);

    /// The drawable area changed, in device pixels or cells.
    fn resize(&mut self, width: u32, height: u32);

    /// Draw one frame of the current scene.
    fn render_frame(&mut self) -> ServiceResult<()>;

    /// Replace the scene. On error the previous scene stays in place.
    fn update_geometry(&mut self, assembly: Assembly) -> ServiceResult<()>;

    fn mouse_down(&mut self, code: KeyCode, x: i32, y: i32);

    fn mouse_up(&mut self, code: KeyCode, x: i32, y: i32);

    fn mouse_move(&mut self, x: i32, y: i32);

    fn mouse_wheel(&mut self, delta: i32);

    fn key_down(&mut self, code: KeyCode);

    fn key_up(&mut self, code: KeyCode);
}
