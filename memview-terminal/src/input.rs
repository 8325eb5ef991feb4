/// Translation of crossterm events into viewer input.
///
/// Terminals report Ctrl only as a modifier on other events, so the
/// translator tracks it and emits a key press or release whenever the
/// modifier state seen on a mouse event changes.

use std::time::Instant;

use crossterm::event::{
    Event, KeyCode as TermKey, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use memview_core::{Key, PointerButton, RenderService, Viewer};

/// One user action in viewer terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiEvent {
    Pressed(PointerButton, f64, f64),
    Released(PointerButton, f64, f64),
    Moved(f64, f64),
    /// Scroll lines, positive upward.
    Wheel(f64),
    KeyPressed(Key),
    KeyReleased(Key),
    Resized(f64, f64),
    Quit,
}

impl UiEvent {
    /// Forward to the viewer. `Quit` is left to the caller.
    pub fn apply<S: RenderService>(self, viewer: &mut Viewer<S>, now: Instant) {
        match self {
            UiEvent::Pressed(button, x, y) => viewer.pointer_pressed(button, x, y, now),
            UiEvent::Released(button, x, y) => viewer.pointer_released(button, x, y, now),
            UiEvent::Moved(x, y) => viewer.pointer_moved(x, y, now),
            UiEvent::Wheel(lines) => viewer.wheel(lines, now),
            UiEvent::KeyPressed(key) => viewer.key_pressed(key, now),
            UiEvent::KeyReleased(key) => viewer.key_released(key, now),
            UiEvent::Resized(width, height) => viewer.size_changed(width, height, now),
            UiEvent::Quit => {}
        }
    }
}

#[derive(Debug, Default)]
pub struct InputTranslator {
    ctrl_held: bool,
}

impl InputTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ctrl_held(&self) -> bool {
        self.ctrl_held
    }

    pub fn translate(&mut self, event: &Event) -> Vec<UiEvent> {
        match event {
            Event::Mouse(mouse) => self.translate_mouse(mouse),
            Event::Key(key) => translate_key(key).into_iter().collect(),
            Event::Resize(cols, rows) => vec![UiEvent::Resized(*cols as f64, *rows as f64)],
            _ => Vec::new(),
        }
    }

    fn translate_mouse(&mut self, mouse: &MouseEvent) -> Vec<UiEvent> {
        let mut events = Vec::with_capacity(2);

        let ctrl = mouse.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl != self.ctrl_held {
            self.ctrl_held = ctrl;
            events.push(if ctrl {
                UiEvent::KeyPressed(Key::LeftCtrl)
            } else {
                UiEvent::KeyReleased(Key::LeftCtrl)
            });
        }

        let (x, y) = (mouse.column as f64, mouse.row as f64);
        let action = match mouse.kind {
            MouseEventKind::Down(button) => Some(UiEvent::Pressed(pointer_button(button), x, y)),
            MouseEventKind::Up(button) => Some(UiEvent::Released(pointer_button(button), x, y)),
            MouseEventKind::Drag(_) | MouseEventKind::Moved => Some(UiEvent::Moved(x, y)),
            MouseEventKind::ScrollUp => Some(UiEvent::Wheel(1.0)),
            MouseEventKind::ScrollDown => Some(UiEvent::Wheel(-1.0)),
            MouseEventKind::ScrollLeft | MouseEventKind::ScrollRight => None,
        };
        events.extend(action);
        events
    }
}

fn pointer_button(button: MouseButton) -> PointerButton {
    match button {
        MouseButton::Left => PointerButton::Left,
        MouseButton::Middle => PointerButton::Middle,
        MouseButton::Right => PointerButton::Right,
    }
}

fn translate_key(key: &KeyEvent) -> Option<UiEvent> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match key.code {
        TermKey::Char('q') | TermKey::Esc => Some(UiEvent::Quit),
        TermKey::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(UiEvent::Quit),
        _ => None,
    }
}
