/// Input source codes passed to the render service
use bitflags::bitflags;

bitflags! {
    /// Held buttons and modifiers. The empty set is "no key".
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct KeyCode: u32 {
        const CONTROL = 0b001;
        const LEFT = 0b010;
        /// Ctrl held while dragging with the left button.
        const CONTROL_LEFT = Self::CONTROL.bits() | Self::LEFT.bits();
        const MIDDLE = 0b100;
    }
}

impl KeyCode {
    /// Decode a raw code, dropping unknown bits.
    pub fn from_raw(raw: u32) -> Self {
        Self::from_bits_truncate(raw)
    }

    pub fn raw(self) -> u32 {
        self.bits()
    }
}

/// Keyboard keys the viewer distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    LeftCtrl,
    RightCtrl,
    Other,
}

impl From<Key> for KeyCode {
    fn from(key: Key) -> Self {
        match key {
            Key::LeftCtrl | Key::RightCtrl => KeyCode::CONTROL,
            Key::Other => KeyCode::empty(),
        }
    }
}

/// Pointer buttons the viewer distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Middle,
    Right,
}

impl PointerButton {
    /// The code forwarded for this button, if the service tracks it.
    pub fn key_code(self) -> Option<KeyCode> {
        match self {
            PointerButton::Left => Some(KeyCode::LEFT),
            PointerButton::Middle => Some(KeyCode::MIDDLE),
            PointerButton::Right => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_values() {
        assert_eq!(KeyCode::empty().raw(), 0);
        assert_eq!(KeyCode::CONTROL.raw(), 1);
        assert_eq!(KeyCode::LEFT.raw(), 2);
        assert_eq!(KeyCode::CONTROL_LEFT.raw(), 3);
        assert_eq!(KeyCode::MIDDLE.raw(), 4);
    }

    #[test]
    fn test_combination() {
        let mut held = KeyCode::empty();
        held |= KeyCode::CONTROL;
        held |= KeyCode::LEFT;
        assert_eq!(held, KeyCode::CONTROL_LEFT);
        held &= !KeyCode::CONTROL;
        assert_eq!(held, KeyCode::LEFT);
    }

    #[test]
    fn test_from_raw_truncates() {
        assert_eq!(KeyCode::from_raw(0b1_0100), KeyCode::MIDDLE);
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(KeyCode::from(Key::LeftCtrl), KeyCode::CONTROL);
        assert_eq!(KeyCode::from(Key::RightCtrl), KeyCode::CONTROL);
        assert!(KeyCode::from(Key::Other).is_empty());
        assert_eq!(PointerButton::Right.key_code(), None);
    }
}
