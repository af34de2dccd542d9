//! The input recognizer.
//!
//! Key codes arrive from the terminal layer one at a time. Ordinary
//! code points pass straight through; an ESC opens a small match buffer
//! that either resolves to a sequence-table entry, an Alt-modified key,
//! or (on a miss) is drained back to the caller byte by byte.

use smallvec::SmallVec;

use crate::event::{KeyCode, KeyEvent, KeyModifiers};
use crate::sequences::{SEQUENCE_FINALS, lookup};

/// Cap on a pending match; longer sequences are drained as text.
pub const MATCH_BUFFER_SIZE: usize = 16;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RecognizerState {
    #[default]
    Idle,
    Collecting,
    Draining,
}

/// The recognizer FSM. Feed code points with
/// [`InputRecognizer::feed`]; call [`InputRecognizer::pump_idle`] when
/// the polling window elapses with no further input.
#[derive(Debug, Default)]
pub struct InputRecognizer {
    state: RecognizerState,
    buf: SmallVec<[u8; MATCH_BUFFER_SIZE]>,
}

impl InputRecognizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> RecognizerState {
        self.state
    }

    /// Feed one code point, emitting zero or more recognized keys.
    pub fn feed<F: FnMut(KeyEvent)>(&mut self, point: char, cb: &mut F) {
        match self.state {
            RecognizerState::Idle | RecognizerState::Draining => {
                if point == '\u{1b}' {
                    self.buf.clear();
                    self.buf.push(0x1B);
                    self.state = RecognizerState::Collecting;
                } else {
                    cb(pass_through(point));
                }
            }
            RecognizerState::Collecting => self.collect(point, cb),
        }
    }

    /// Feed a run of code points.
    pub fn feed_all<F: FnMut(KeyEvent)>(&mut self, points: &str, cb: &mut F) {
        for point in points.chars() {
            self.feed(point, cb);
        }
    }

    /// The polling window elapsed with the buffer non-empty: a lone ESC
    /// becomes the Escape key, anything longer drains as text.
    ///
    /// Return `true` if any events were emitted.
    pub fn pump_idle<F: FnMut(KeyEvent)>(&mut self, cb: &mut F) -> bool {
        if self.state != RecognizerState::Collecting {
            return false;
        }
        if self.buf.as_slice() == [0x1B] {
            self.buf.clear();
            self.state = RecognizerState::Idle;
            cb(KeyEvent::plain(KeyCode::Escape));
        } else {
            self.drain(cb);
        }
        true
    }

    fn collect<F: FnMut(KeyEvent)>(&mut self, point: char, cb: &mut F) {
        // Second code point after ESC decides the shape.
        if self.buf.as_slice() == [0x1B] {
            match point {
                '[' => self.buf.push(b'['),
                '\u{1b}' => {
                    // ESC ESC: the first one was a real Escape press.
                    cb(KeyEvent::plain(KeyCode::Escape));
                }
                _ => {
                    self.buf.clear();
                    self.state = RecognizerState::Idle;
                    let mut event = pass_through(point);
                    event.modifiers |= KeyModifiers::ALT;
                    cb(event);
                }
            }
            return;
        }

        // Inside `ESC [ …`.
        let Ok(byte) = u8::try_from(u32::from(point)) else {
            // A wide character cannot continue a sequence.
            self.drain(cb);
            cb(pass_through(point));
            return;
        };

        // `ESC [ [` is the Linux-console function-key prefix; there any
        // uppercase letter terminates the sequence.
        let is_final = if self.buf.as_slice() == [0x1B, b'[', b'['] {
            byte.is_ascii_uppercase()
        } else {
            SEQUENCE_FINALS.contains(&byte)
        };
        if is_final {
            match lookup(&self.buf[2..], byte) {
                Some(event) => {
                    self.buf.clear();
                    self.state = RecognizerState::Idle;
                    cb(event);
                }
                None => {
                    self.buf.push(byte);
                    self.drain(cb);
                }
            }
            return;
        }

        match byte {
            b'0'..=b'9' | b';' | b'[' => {
                if self.buf.len() >= MATCH_BUFFER_SIZE {
                    self.buf.push(byte);
                    self.drain(cb);
                } else {
                    self.buf.push(byte);
                }
            }
            _ => {
                self.buf.push(byte);
                self.drain(cb);
            }
        }
    }

    /// Emit the buffered bytes as individual keys. A buffered
    /// `ESC <byte>` pair collapses to an Alt-modified key.
    fn drain<F: FnMut(KeyEvent)>(&mut self, cb: &mut F) {
        self.state = RecognizerState::Draining;
        let buf = std::mem::take(&mut self.buf);
        let mut i = 0;
        while i < buf.len() {
            if buf[i] == 0x1B && i + 1 < buf.len() {
                let mut event = pass_through(buf[i + 1] as char);
                event.modifiers |= KeyModifiers::ALT;
                cb(event);
                i += 2;
            } else {
                cb(pass_through(buf[i] as char));
                i += 1;
            }
        }
        self.state = RecognizerState::Idle;
    }
}

/// An ordinary code point with no flags (UNICODE excepted); ASCII
/// control codes map to their logical keys.
fn pass_through(point: char) -> KeyEvent {
    match point {
        '\t' => KeyEvent::plain(KeyCode::Tab),
        '\r' | '\n' => KeyEvent::plain(KeyCode::Enter),
        '\u{7f}' => KeyEvent::plain(KeyCode::Backspace),
        '\u{1b}' => KeyEvent::plain(KeyCode::Escape),
        '\0' => KeyEvent::new(KeyCode::Char(' '), KeyModifiers::CTRL),
        c @ '\u{01}'..='\u{1a}' => KeyEvent::new(
            KeyCode::Char((c as u8 - 0x1 + b'a') as char),
            KeyModifiers::CTRL,
        ),
        c @ '\u{1c}'..='\u{1f}' => KeyEvent::new(
            KeyCode::Char((c as u8 - 0x1C + b'4') as char),
            KeyModifiers::CTRL,
        ),
        c => KeyEvent::plain(KeyCode::Char(c)),
    }
}
