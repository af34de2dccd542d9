//! The escape-sequence lookup table.
//!
//! Maps a collected `ESC [ …` body (parameter bytes plus final) to a
//! logical key. Modifier parameters follow the xterm convention:
//! `1 + (Shift=1 | Alt=2 | Ctrl=4)`.

use crate::event::{KeyCode, KeyEvent, KeyModifiers};

/// Finals that can terminate a recognized sequence.
pub(crate) const SEQUENCE_FINALS: &[u8] = b"~ABCDFHKVU@";

/// Decode the xterm modifier parameter.
fn parse_modifiers(mask: u16) -> KeyModifiers {
    let bits = mask.saturating_sub(1);
    let mut modifiers = KeyModifiers::empty();
    if bits & 1 != 0 {
        modifiers |= KeyModifiers::SHIFT;
    }
    if bits & 2 != 0 {
        modifiers |= KeyModifiers::ALT;
    }
    if bits & 4 != 0 {
        modifiers |= KeyModifiers::CTRL;
    }
    modifiers
}

/// Parse the parameter bytes of a sequence body (everything between
/// `ESC [` and the final byte) into at most four numeric parameters.
///
/// Returns `None` on anything but digits and `;`.
fn parse_params(body: &[u8]) -> Option<Vec<u16>> {
    let mut params = Vec::new();
    let mut current: Option<u16> = None;
    for &b in body {
        match b {
            b'0'..=b'9' => {
                let d = u16::from(b - b'0');
                current = Some(current.unwrap_or(0).checked_mul(10)?.checked_add(d)?);
            }
            b';' => {
                params.push(current.take().unwrap_or(0));
            }
            _ => return None,
        }
    }
    if let Some(last) = current {
        params.push(last);
    }
    Some(params)
}

/// Look up a complete sequence: `body` is the bytes after `ESC [`, not
/// including `final_byte`.
pub(crate) fn lookup(body: &[u8], final_byte: u8) -> Option<KeyEvent> {
    // Linux-console function keys arrive as `ESC [ [ A` .. `ESC [ [ E`.
    if let [b'[', rest @ ..] = body {
        if rest.is_empty() && (b'A'..=b'E').contains(&final_byte) {
            return Some(KeyEvent::plain(KeyCode::F(final_byte - b'A' + 1)));
        }
        return None;
    }

    let params = parse_params(body)?;

    match final_byte {
        b'~' => lookup_tilde(&params),
        b'A' | b'B' | b'C' | b'D' | b'F' | b'H' | b'K' | b'V' | b'U' | b'@' => {
            let code = match final_byte {
                b'A' => KeyCode::Up,
                b'B' => KeyCode::Down,
                b'C' => KeyCode::Right,
                b'D' => KeyCode::Left,
                b'H' => KeyCode::Home,
                // Console variants: SCO-style End / paging finals.
                b'F' | b'K' => KeyCode::End,
                b'V' => KeyCode::PageUp,
                b'U' => KeyCode::PageDown,
                b'@' => KeyCode::Insert,
                _ => return None,
            };
            let modifiers = match params.as_slice() {
                [] => KeyModifiers::empty(),
                // `ESC [ 1 ; N X`
                [1, n] => parse_modifiers(*n),
                _ => return None,
            };
            Some(KeyEvent::new(code, modifiers))
        }
        _ => None,
    }
}

/// `ESC [ n ~` and `ESC [ n ; m ~` forms.
fn lookup_tilde(params: &[u16]) -> Option<KeyEvent> {
    let (first, modifiers) = match params {
        [n] => (*n, KeyModifiers::empty()),
        [n, m] => (*n, parse_modifiers(*m)),
        _ => return None,
    };

    let code = match first {
        1 | 7 => KeyCode::Home,
        2 => KeyCode::Insert,
        3 => KeyCode::Delete,
        4 | 8 => KeyCode::End,
        5 => KeyCode::PageUp,
        6 => KeyCode::PageDown,
        #[allow(clippy::cast_possible_truncation)]
        v @ 11..=15 => KeyCode::F(v as u8 - 10),
        #[allow(clippy::cast_possible_truncation)]
        v @ 17..=21 => KeyCode::F(v as u8 - 11),
        #[allow(clippy::cast_possible_truncation)]
        v @ 23..=24 => KeyCode::F(v as u8 - 12),
        200 => KeyCode::PasteStart,
        201 => KeyCode::PasteEnd,
        _ => return None,
    };
    Some(KeyEvent::new(code, modifiers))
}
