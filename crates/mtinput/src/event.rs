//! Logical keys and modifier flags.

use bitflags::bitflags;

bitflags! {
    /// Modifier flags attached to a recognized key.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct KeyModifiers: u8 {
        const SHIFT   = 0b0000_0001;
        const ALT     = 0b0000_0010;
        const CTRL    = 0b0000_0100;
        /// The code point does not fit in a single byte.
        const UNICODE = 0b0000_1000;
    }
}

/// A logical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Escape,
    Backspace,
    Tab,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    Insert,
    Delete,
    PageUp,
    PageDown,
    F(u8),
    /// Number-pad key carrying its literal character.
    Pad(char),
    PadEnter,
    /// Bracketed paste delimiters, surfaced as pseudo-keys.
    PasteStart,
    PasteEnd,
}

/// A recognized key with modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyEvent {
    #[must_use]
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// A key with no modifiers; `Char`s above U+00FF get the UNICODE
    /// flag.
    #[must_use]
    pub fn plain(code: KeyCode) -> Self {
        let modifiers = match code {
            KeyCode::Char(c) if c as u32 > 0xFF => KeyModifiers::UNICODE,
            _ => KeyModifiers::empty(),
        };
        Self { code, modifiers }
    }
}

impl From<KeyCode> for KeyEvent {
    fn from(code: KeyCode) -> Self {
        Self::plain(code)
    }
}
