//! ANSI-music capture.
//!
//! `ESC [ M` (with music enabled) introduces a run of "play string"
//! bytes terminated by SO (0x0E) or CR. The emulator only captures;
//! playing is the job of an external collaborator consuming
//! [`MusicSequence`] values.

/// Capture buffer cap. A sequence longer than this is dropped whole.
pub const MUSIC_BUFFER_SIZE: usize = 1024;

/// One captured ANSI-music play string (terminator excluded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MusicSequence(pub Vec<u8>);

impl MusicSequence {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}
