/// Terminal frontend for the memview viewer
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use memview_core::{
    ActivityState, Assembly, FrameOutcome, PickKind, PickTarget, Viewer, ViewerConfig, ViewerError,
};
use std::io::{self, stdout, Stdout};
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

pub mod input;
pub mod renderer;
pub mod service;

pub use input::{InputTranslator, UiEvent};
pub use renderer::AsciiRenderer;
pub use service::TerminalService;

/// Failures that end the terminal session.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Viewer(#[from] ViewerError),
}

pub type AppResult<T> = Result<T, AppError>;

/// Interactive viewer bound to the process terminal.
pub struct TerminalApp {
    viewer: Viewer<TerminalService<Stdout>>,
    input: InputTranslator,
    source: Option<PathBuf>,
    message: Option<String>,
    running: bool,
}

impl TerminalApp {
    /// Build the viewer; `source` is opened once the terminal is ready.
    pub fn new(config: ViewerConfig, source: Option<PathBuf>) -> Self {
        let service = TerminalService::new(stdout(), config.footprint);
        Self {
            viewer: Viewer::new(service, config, Instant::now()),
            input: InputTranslator::new(),
            source,
            message: None,
            running: true,
        }
    }

    pub fn run(&mut self) -> AppResult<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), EnterAlternateScreen, EnableMouseCapture)?;

        let result = self.start().and_then(|()| self.main_loop());

        // Cleanup
        self.viewer.shutdown();
        let restored = restore_terminal(
            || execute!(stdout(), DisableMouseCapture, LeaveAlternateScreen),
            terminal::disable_raw_mode,
        );

        result?;
        restored?;
        Ok(())
    }

    fn start(&mut self) -> AppResult<()> {
        self.viewer.initialize()?;

        let now = Instant::now();
        let (width, height) = terminal::size()?;
        self.viewer.size_changed(width as f64, height as f64, now);

        match self.source.clone() {
            Some(path) => {
                if let Err(error) = self.viewer.open(&path, now) {
                    warn!(%error, path = %path.display(), "falling back to the default cube");
                    self.message = Some(error.to_string());
                    self.viewer.load_assembly(Assembly::default_cube(), now);
                }
            }
            None => self.viewer.load_assembly(Assembly::default_cube(), now),
        }
        Ok(())
    }

    fn main_loop(&mut self) -> AppResult<()> {
        let frame_interval = self.viewer.config().frame_interval();
        let mut last_outcome = None;

        while self.running {
            let frame_start = Instant::now();

            // Handle input
            while event::poll(std::time::Duration::ZERO)? {
                let event = event::read()?;
                let now = Instant::now();
                for ui in self.input.translate(&event) {
                    match ui {
                        UiEvent::Quit => self.running = false,
                        other => other.apply(&mut self.viewer, now),
                    }
                }
            }
            if !self.running {
                break;
            }

            // Render
            let status = self.status_line();
            self.viewer.service_mut().set_status(status);
            let outcome = self.viewer.frame(Instant::now())?;
            if let Some(error) = self.viewer.take_rejection() {
                self.message = Some(error.to_string());
            }
            if outcome == FrameOutcome::Idle && last_outcome != Some(FrameOutcome::Idle) {
                let status = self.status_line();
                let service = self.viewer.service_mut();
                service.set_status(status);
                service.draw_status().map_err(ViewerError::from)?;
            }
            last_outcome = Some(outcome);

            // Frame timing; waking early on input
            let remaining = frame_interval.saturating_sub(frame_start.elapsed());
            event::poll(remaining)?;
        }

        info!("leaving terminal viewer");
        Ok(())
    }

    fn status_line(&self) -> String {
        let file = self
            .source
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "default cube".to_string());
        let selection = describe_selection(self.viewer.service().selection());
        let state = match self.viewer.activity() {
            ActivityState::Active => "active",
            ActivityState::Idle => "idle",
        };
        let mut line = format!(
            "memview | {file} | {selection} | {state} | Middle=Orbit Ctrl+Left=Pan Wheel=Zoom Q=Quit"
        );
        if let Some(message) = &self.message {
            line = format!("{line} | {message}");
        }
        line
    }
}

/// Run both restore steps even when the first fails, reporting the first error.
fn restore_terminal(
    leave_screen: impl FnOnce() -> io::Result<()>,
    disable_raw_mode: impl FnOnce() -> io::Result<()>,
) -> io::Result<()> {
    let screen = leave_screen();
    let raw = disable_raw_mode();
    screen.and(raw)
}

fn describe_selection(selection: Option<PickTarget>) -> String {
    match selection {
        None => "nothing selected".to_string(),
        Some(target) => {
            let kind = match target.kind {
                PickKind::Face => "face",
                PickKind::Edge => "edge",
            };
            format!("component {} {kind} {}", target.component, target.local_index)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_mode_is_restored_when_leaving_screen_fails() {
        let mut raw_disabled = false;
        let result = restore_terminal(
            || Err(io::Error::new(io::ErrorKind::BrokenPipe, "screen gone")),
            || {
                raw_disabled = true;
                Ok(())
            },
        );
        assert!(raw_disabled);
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_restore_reports_raw_mode_failure() {
        let result = restore_terminal(
            || Ok(()),
            || Err(io::Error::new(io::ErrorKind::Other, "tty")),
        );
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::Other);
    }

    #[test]
    fn test_describe_selection() {
        assert_eq!(describe_selection(None), "nothing selected");
        let target = PickTarget { component: 2, kind: PickKind::Edge, local_index: 5 };
        assert_eq!(describe_selection(Some(target)), "component 2 edge 5");
    }
}
