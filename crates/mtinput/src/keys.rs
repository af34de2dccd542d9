//! Keystroke encoding: logical key to the byte sequence the remote
//! side expects.

use mtansi::Emulation;

use crate::encode::{EncodeError, write_bytes_into};
use crate::event::{KeyCode, KeyEvent, KeyModifiers};

/// Per-session encoding knobs.
#[derive(Debug, Default, Clone, Copy)]
pub struct EncodeOptions {
    /// Backspace sends 0x08 instead of DEL.
    pub hard_backspace: bool,
    /// The link is in NVT ASCII mode, so Enter sends CR LF.
    pub ascii_newline: bool,
}

/// Encode `event` for `emulation` into `buf`.
///
/// Returns the number of bytes written; zero means the key produces no
/// output for this emulation and nothing should be transmitted.
///
/// # Errors
///
/// Return an error if `buf` cannot hold the encoded sequence.
pub fn encode_key(
    event: &KeyEvent,
    emulation: Emulation,
    options: &EncodeOptions,
    buf: &mut [u8],
) -> Result<usize, EncodeError> {
    let shifted = event.modifiers.contains(KeyModifiers::SHIFT);

    match event.code {
        KeyCode::Char(c) | KeyCode::Pad(c) => {
            let mut tmp = [0u8; 4];
            let s = c.encode_utf8(&mut tmp);
            write_bytes_into(buf, s.as_bytes())
        }
        KeyCode::Enter | KeyCode::PadEnter => {
            let bytes: &[u8] = if options.ascii_newline { b"\r\n" } else { b"\r" };
            write_bytes_into(buf, bytes)
        }
        KeyCode::Backspace => {
            let bytes: &[u8] = if options.hard_backspace { b"\x08" } else { b"\x7f" };
            write_bytes_into(buf, bytes)
        }
        KeyCode::Tab => write_bytes_into(buf, b"\t"),
        KeyCode::Escape => write_bytes_into(buf, b"\x1b"),
        KeyCode::Up | KeyCode::Down | KeyCode::Right | KeyCode::Left => {
            if !emulation.supports_sequences() {
                return Ok(0);
            }
            let final_byte = match event.code {
                KeyCode::Up => b'A',
                KeyCode::Down => b'B',
                KeyCode::Right => b'C',
                _ => b'D',
            };
            write_bytes_into(buf, &[0x1B, b'[', final_byte])
        }
        KeyCode::PageUp => encode_tilde(buf, emulation, b'5', shifted),
        KeyCode::PageDown => encode_tilde(buf, emulation, b'6', shifted),
        KeyCode::Insert => encode_tilde(buf, emulation, b'2', shifted),
        KeyCode::Delete => encode_tilde(buf, emulation, b'3', shifted),
        // ANSI has no encoding for these.
        KeyCode::Home
        | KeyCode::End
        | KeyCode::F(_)
        | KeyCode::PasteStart
        | KeyCode::PasteEnd => Ok(0),
    }
}

/// The edit/paging keys: `ESC [ <digit> ~`, with `;2` inserted for the
/// shifted variants.
fn encode_tilde(
    buf: &mut [u8],
    emulation: Emulation,
    digit: u8,
    shifted: bool,
) -> Result<usize, EncodeError> {
    if !emulation.supports_sequences() {
        return Ok(0);
    }
    if shifted {
        write_bytes_into(buf, &[0x1B, b'[', digit, b';', b'2', b'~'])
    } else {
        write_bytes_into(buf, &[0x1B, b'[', digit, b'~'])
    }
}
