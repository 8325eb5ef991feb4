/// Render service drawing into a character grid
use std::io::Write;
use std::ops::Range;

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
    QueueableCommand,
};
use memview_core::error::ServiceResult;
use memview_core::{
    Assembly, Footprint, KeyCode, PickTarget, RenderService, ServiceError, ViewController,
};
use tracing::{debug, info};

use crate::renderer::{AsciiRenderer, FrameMatrices};

/// Draws the scene with [`AsciiRenderer`] into any writer.
///
/// The writer is owned; terminal modes are left to the caller so the
/// service works the same against a byte buffer. The scene has no
/// placement until the first [`RenderService::update_geometry`].
pub struct TerminalService<W: Write> {
    writer: W,
    renderer: AsciiRenderer,
    controller: ViewController,
    footprint: Footprint,
    assembly: Assembly,
    selection: Option<PickTarget>,
    status: String,
    initialized: bool,
}

impl<W: Write> TerminalService<W> {
    pub fn new(writer: W, footprint: Footprint) -> Self {
        Self {
            writer,
            renderer: AsciiRenderer::new(0, 0),
            controller: ViewController::new(0, 0),
            footprint,
            assembly: Assembly::default_cube(),
            selection: None,
            status: String::new(),
            initialized: false,
        }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn controller(&self) -> &ViewController {
        &self.controller
    }

    pub fn assembly(&self) -> &Assembly {
        &self.assembly
    }

    /// Component and element chosen by the last left click.
    pub fn selection(&self) -> Option<PickTarget> {
        self.selection
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// Redraw only the status row, leaving the last frame in place.
    pub fn draw_status(&mut self) -> ServiceResult<()> {
        self.ensure_initialized()?;
        self.queue_status()?;
        self.writer.flush()?;
        Ok(())
    }

    fn ensure_initialized(&self) -> ServiceResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(ServiceError::NotInitialized)
        }
    }

    fn highlight(&self) -> Option<Range<usize>> {
        let component = self.selection?.component;
        let start = self.assembly.first_pick_id(component).ok()?;
        let end = self.assembly.first_pick_id(component + 1).ok()?;
        Some(start..end)
    }

    fn queue_status(&mut self) -> std::io::Result<()> {
        let (width, _) = self.renderer.size();
        let line: String = self.status.chars().take(width).collect();
        self.writer
            .queue(MoveTo(0, 0))?
            .queue(SetForegroundColor(Color::Yellow))?
            .queue(Print(line))?
            .queue(ResetColor)?;
        Ok(())
    }
}

impl<W: Write> RenderService for TerminalService<W> {
    fn initialize(&mut self) -> ServiceResult<()> {
        self.writer.queue(Hide)?.queue(Clear(ClearType::All))?;
        self.writer.flush()?;
        self.initialized = true;
        info!("terminal render service started");
        Ok(())
    }

    fn shutdown(&mut self) {
        self.initialized = false;
        // The terminal may already be gone; nothing useful to do on failure.
        let _ = self
            .writer
            .queue(ResetColor)
            .and_then(|w| w.queue(Show))
            .and_then(|w| w.flush());
        info!("terminal render service stopped");
    }

    fn resize(&mut self, width: u32, height: u32) {
        debug!(width, height, "resizing character grid");
        self.controller.resize(width, height);
        self.renderer.resize(width as usize, height as usize);
    }

    fn render_frame(&mut self) -> ServiceResult<()> {
        self.ensure_initialized()?;

        let frame = FrameMatrices {
            model: self.controller.model_matrix(),
            view: self.controller.view_matrix(),
            projection: self.controller.projection_matrix(),
        };
        self.renderer.clear();
        self.renderer.render_assembly(&self.assembly, &frame);

        let highlight = self.highlight();
        self.renderer.draw(&mut self.writer, highlight)?;
        self.queue_status()?;
        self.writer.flush()?;
        Ok(())
    }

    fn update_geometry(&mut self, assembly: Assembly) -> ServiceResult<()> {
        let placement = self.controller.update_geometry(&assembly, self.footprint)?;
        info!(
            components = assembly.components().len(),
            scale = placement.scale,
            "scene replaced"
        );
        self.assembly = assembly;
        self.selection = None;
        Ok(())
    }

    fn mouse_down(&mut self, code: KeyCode, x: i32, y: i32) {
        self.controller.mouse_down(code, x, y);
    }

    fn mouse_up(&mut self, code: KeyCode, x: i32, y: i32) {
        if let Some(pick) = self.controller.mouse_up(code, x, y) {
            self.selection = self
                .renderer
                .pick_at(pick.x, pick.y)
                .and_then(|id| self.assembly.resolve_pick_id(id));
            debug!(x = pick.x, y = pick.y, selection = ?self.selection, "pick resolved");
        }
    }

    fn mouse_move(&mut self, x: i32, y: i32) {
        self.controller.mouse_move(x, y);
    }

    fn mouse_wheel(&mut self, delta: i32) {
        self.controller.mouse_wheel(delta);
    }

    fn key_down(&mut self, code: KeyCode) {
        self.controller.key_down(code);
    }

    fn key_up(&mut self, code: KeyCode) {
        self.controller.key_up(code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memview_core::{Component, Part, PickKind, PlacementError};
    use nalgebra::Matrix4;

    fn started(width: u32, height: u32) -> TerminalService<Vec<u8>> {
        let mut service = TerminalService::new(Vec::new(), Footprint::default());
        service.initialize().unwrap();
        service.resize(width, height);
        service.update_geometry(Assembly::default_cube()).unwrap();
        service
    }

    #[test]
    fn test_render_before_initialize_fails() {
        let mut service = TerminalService::new(Vec::new(), Footprint::default());
        assert!(matches!(service.render_frame(), Err(ServiceError::NotInitialized)));
        assert!(matches!(service.draw_status(), Err(ServiceError::NotInitialized)));
    }

    #[test]
    fn test_render_writes_frame_and_status() {
        let mut service = started(40, 20);
        service.set_status("memview");
        let before = service.writer().len();
        service.render_frame().unwrap();
        let output = String::from_utf8_lossy(&service.writer()[before..]).into_owned();
        assert!(output.contains("memview"));
        assert!(output.contains('@') || output.contains('#') || output.contains('%'));
    }

    #[test]
    fn test_click_selects_component() {
        let mut service = started(80, 40);
        service.render_frame().unwrap();

        service.mouse_down(KeyCode::LEFT, 40, 20);
        service.mouse_up(KeyCode::LEFT, 40, 20);
        let selection = service.selection().unwrap();
        assert_eq!(selection.component, 0);
        assert_eq!(selection.kind, PickKind::Face);

        service.mouse_down(KeyCode::LEFT, 0, 0);
        service.mouse_up(KeyCode::LEFT, 0, 0);
        assert_eq!(service.selection(), None);
    }

    #[test]
    fn test_ctrl_click_does_not_pick() {
        let mut service = started(80, 40);
        service.render_frame().unwrap();

        service.key_down(KeyCode::CONTROL);
        service.mouse_down(KeyCode::LEFT, 40, 20);
        service.mouse_up(KeyCode::LEFT, 40, 20);
        assert_eq!(service.selection(), None);
    }

    #[test]
    fn test_highlight_covers_selected_component() {
        let parts = vec![Part::cube(1.0)];
        let components = vec![
            Component::identity(0),
            Component::new(0, Matrix4::new_translation(&nalgebra::Vector3::new(3.0, 0.0, 0.0))),
        ];
        let assembly = Assembly::new(parts, components).unwrap();
        let per_part = assembly.parts()[0].pick_id_count();

        let mut service = started(80, 40);
        service.update_geometry(assembly).unwrap();
        service.selection = Some(PickTarget { component: 1, kind: PickKind::Face, local_index: 0 });
        assert_eq!(service.highlight(), Some(per_part..2 * per_part));
    }

    #[test]
    fn test_rejected_geometry_keeps_scene() {
        let mut service = started(40, 20);
        let empty = Assembly::new(vec![Part::cube(1.0)], Vec::new()).unwrap();
        let err = service.update_geometry(empty).unwrap_err();
        assert!(matches!(err, ServiceError::Placement(PlacementError::EmptyAssembly)));
        assert_eq!(service.assembly(), &Assembly::default_cube());
    }
}
