#![warn(clippy::pedantic)]

//! Keyboard input handling: the recognizer that turns incoming escape
//! sequences into logical keys, and the encoder that turns logical keys
//! into the bytes a remote system expects.

pub mod encode;
pub mod event;
pub mod keys;
pub mod recognizer;
mod sequences;

pub use encode::EncodeError;
pub use event::{KeyCode, KeyEvent, KeyModifiers};
pub use keys::{EncodeOptions, encode_key};
pub use recognizer::{InputRecognizer, MATCH_BUFFER_SIZE, RecognizerState};
