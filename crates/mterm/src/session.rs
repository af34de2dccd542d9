//! The owning session context.
//!
//! One [`Session`] holds everything a live connection needs: the
//! screen, the emulator, the protocol framer and the keystroke
//! encoder settings, all initialized from a phonebook entry. There is
//! no global state anywhere; the main loop owns a `Session` and the
//! transport, and shuttles bytes between them.

use mtansi::{AnsiEmulator, EmulatorOptions, MusicSequence};
use mtbook::{Method, PhonebookEntry, SessionToggles};
use mtinput::{EncodeOptions, KeyEvent, encode_key};
use mtscreen::Screen;
use mtwire::{RloginFramer, TelnetFramer};

/// Default emulation area width.
pub const DEFAULT_WIDTH: usize = 80;
/// Default total screen height.
pub const DEFAULT_HEIGHT: usize = 25;
/// Rows reserved for the status line.
pub const STATUS_HEIGHT: usize = 1;

/// The protocol framer for the active connection.
#[derive(Debug)]
pub enum Framer {
    Telnet(TelnetFramer),
    Rlogin(RloginFramer),
    /// Raw 8-bit stream (modem, socket, shell).
    Raw,
}

/// A live connection: screen + emulator + framer.
#[derive(Debug)]
pub struct Session {
    screen: Screen,
    emulator: AnsiEmulator,
    framer: Framer,
    encode_options: EncodeOptions,
    half_duplex: bool,
    strip_8th_bit: bool,
    /// Payload-level responses queued by the emulator, drained to the
    /// wire in FIFO order with keystroke output.
    responses: Vec<u8>,
}

impl Session {
    /// Build a session for `entry` at the default 80x24+status size.
    #[must_use]
    pub fn for_entry(entry: &PhonebookEntry) -> Self {
        let rows = DEFAULT_HEIGHT - STATUS_HEIGHT;
        let toggles = entry.toggles;

        let mut screen = Screen::new(DEFAULT_WIDTH, rows);
        screen.set_line_wrap(toggles.contains(SessionToggles::LINE_WRAP));
        screen.set_ansi_animate(toggles.contains(SessionToggles::ANSI_ANIMATE));

        let emulator = AnsiEmulator::new(EmulatorOptions {
            emulation: entry.emulation,
            codepage: entry.codepage,
            ansi_music: toggles.contains(SessionToggles::ANSI_MUSIC),
            display_null: toggles.contains(SessionToggles::DISPLAY_NULL),
            line_feed_on_cr: toggles.contains(SessionToggles::LINE_FEED_ON_CR),
        });

        #[allow(clippy::cast_possible_truncation)]
        let (columns, visible) = (DEFAULT_WIDTH as u16, rows as u16);
        let framer = match entry.method {
            Method::Telnet => Framer::Telnet(TelnetFramer::new(
                entry.emulation.terminal_name(),
                columns,
                visible,
            )),
            Method::Rlogin => Framer::Rlogin(RloginFramer::new(visible, columns)),
            _ => Framer::Raw,
        };

        Self {
            screen,
            emulator,
            framer,
            encode_options: EncodeOptions {
                hard_backspace: toggles.contains(SessionToggles::HARD_BACKSPACE),
                ascii_newline: false,
            },
            half_duplex: toggles.contains(SessionToggles::HALF_DUPLEX),
            strip_8th_bit: toggles.contains(SessionToggles::STRIP_8TH_BIT),
            responses: Vec::new(),
        }
    }

    #[must_use]
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen {
        &mut self.screen
    }

    #[must_use]
    pub fn framer(&self) -> &Framer {
        &self.framer
    }

    /// For rlogin sessions: emit the startup handshake.
    pub fn rlogin_start(&mut self, entry: &PhonebookEntry, baud: u32) -> Vec<u8> {
        let mut wire = Vec::new();
        if let Framer::Rlogin(rlogin) = &mut self.framer {
            rlogin.start(
                &entry.username,
                &entry.username,
                entry.emulation.terminal_name(),
                baud,
                &mut wire,
            );
        }
        wire
    }

    /// Consume bytes read from the transport. Returns the bytes owed
    /// back to the transport (negotiation replies, DSR/DA responses),
    /// already framed for the wire.
    pub fn process_remote(&mut self, input: &[u8]) -> Vec<u8> {
        let mut wire_out = Vec::new();
        let mut payload = Vec::new();
        match &mut self.framer {
            Framer::Telnet(telnet) => {
                telnet.decode(input, &mut payload, &mut wire_out);
            }
            Framer::Rlogin(rlogin) => rlogin.decode(input, &mut payload),
            Framer::Raw => payload.extend_from_slice(input),
        }

        for byte in payload {
            let byte = if self.strip_8th_bit { byte & 0x7F } else { byte };
            self.emulator
                .consume(byte, &mut self.screen, &mut self.responses);
        }

        // Emulator responses ride the same framing as keystrokes and
        // skip local echo entirely.
        if !self.responses.is_empty() {
            let responses = std::mem::take(&mut self.responses);
            self.frame_payload(&responses, &mut wire_out);
        }
        wire_out
    }

    /// An out-of-band byte arrived (rlogin window-size request).
    pub fn process_oob(&mut self, byte: u8) -> Vec<u8> {
        let mut wire = Vec::new();
        if let Framer::Rlogin(rlogin) = &mut self.framer {
            rlogin.handle_oob(byte, &mut wire);
        }
        wire
    }

    /// Encode one keystroke. Returns the framed bytes for the
    /// transport; an empty result means the key has no encoding.
    pub fn process_key(&mut self, event: &KeyEvent) -> Vec<u8> {
        let mut options = self.encode_options;
        if let Framer::Telnet(telnet) = &self.framer {
            options.ascii_newline = telnet.is_ascii();
        }
        let emulation = self.emulator.options().emulation;
        let mut buf = [0u8; 16];
        let Ok(len) = encode_key(event, emulation, &options, &mut buf) else {
            return Vec::new();
        };
        if len == 0 {
            return Vec::new();
        }

        if self.half_duplex {
            // Local echo: the line will not send our bytes back.
            for &byte in &buf[..len] {
                self.emulator
                    .consume(byte, &mut self.screen, &mut self.responses);
            }
        }

        let mut wire = Vec::new();
        self.frame_payload(&buf[..len], &mut wire);
        wire
    }

    fn frame_payload(&self, payload: &[u8], wire: &mut Vec<u8>) {
        match &self.framer {
            Framer::Telnet(telnet) => telnet.encode(payload, wire),
            Framer::Rlogin(_) | Framer::Raw => wire.extend_from_slice(payload),
        }
    }

    /// The local window changed. Grows the ring (never shrinks) and
    /// re-announces the size to the peer where the protocol allows.
    pub fn resize(&mut self, width: usize, total_rows: usize) -> Vec<u8> {
        let rows = total_rows.saturating_sub(STATUS_HEIGHT).max(1);
        self.screen.resize(width, rows);
        let mut wire = Vec::new();
        #[allow(clippy::cast_possible_truncation)]
        match &mut self.framer {
            Framer::Telnet(telnet) => {
                telnet.resize_screen(width as u16, rows as u16, &mut wire);
            }
            Framer::Rlogin(rlogin) => rlogin.resize(rows as u16, width as u16, &mut wire),
            Framer::Raw => {}
        }
        wire
    }

    /// Captured ANSI-music sequences for the external player.
    pub fn take_music(&mut self) -> Vec<MusicSequence> {
        self.emulator.take_music()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtansi::Emulation;
    use mtinput::{KeyCode, KeyModifiers};
    use pretty_assertions::assert_eq;

    fn telnet_entry() -> PhonebookEntry {
        let mut entry = PhonebookEntry::new("test", "host");
        entry.method = Method::Telnet;
        entry.emulation = Emulation::Ansi;
        entry
    }

    fn raw_entry() -> PhonebookEntry {
        let mut entry = telnet_entry();
        entry.method = Method::Modem;
        entry
    }

    fn row_text(session: &Session, row: usize) -> String {
        let line = session.screen().row(row);
        (0..line.length()).map(|c| line.get(c).glyph).collect()
    }

    #[test]
    fn test_remote_text_reaches_screen() {
        let mut session = Session::for_entry(&raw_entry());
        let out = session.process_remote(b"hello");
        assert!(out.is_empty());
        assert_eq!(row_text(&session, 0), "hello");
    }

    #[test]
    fn test_dsr_response_goes_to_wire() {
        let mut session = Session::for_entry(&raw_entry());
        let out = session.process_remote(b"\x1b[6n");
        assert_eq!(out, b"\x1b[1;1R");
    }

    #[test]
    fn test_dsr_through_telnet_is_framed() {
        let mut session = Session::for_entry(&telnet_entry());
        // Negotiate binary both ways first, so no CR rewriting.
        let _ = session.process_remote(&[0xFF, 0xFD, 0x00]);
        let out = session.process_remote(b"\x1b[6n");
        assert_eq!(out, b"\x1b[1;1R");
    }

    #[test]
    fn test_naws_negotiation_through_session() {
        let mut session = Session::for_entry(&telnet_entry());
        let out = session.process_remote(&[0xFF, 0xFD, 0x1F]);
        assert_eq!(
            out,
            [
                0xFF, 0xFB, 0x1F, //
                0xFF, 0xFA, 0x1F, 0x00, 0x50, 0x00, 0x18, 0xFF, 0xF0,
            ]
        );
    }

    #[test]
    fn test_key_encoding_full_duplex_no_echo() {
        let mut session = Session::for_entry(&raw_entry());
        let out = session.process_key(&KeyEvent::plain(KeyCode::Char('a')));
        assert_eq!(out, b"a");
        assert_eq!(row_text(&session, 0), "");
    }

    #[test]
    fn test_half_duplex_echoes_locally() {
        let mut entry = raw_entry();
        entry.toggles |= SessionToggles::HALF_DUPLEX;
        let mut session = Session::for_entry(&entry);
        let out = session.process_key(&KeyEvent::plain(KeyCode::Char('a')));
        assert_eq!(out, b"a");
        assert_eq!(row_text(&session, 0), "a");
    }

    #[test]
    fn test_enter_in_telnet_ascii_mode() {
        let mut session = Session::for_entry(&telnet_entry());
        let out = session.process_key(&KeyEvent::plain(KeyCode::Enter));
        // Encoder produces CR LF in ASCII mode; NVT keeps the pair.
        assert_eq!(out, b"\r\n");
    }

    #[test]
    fn test_unmapped_key_produces_nothing() {
        let mut session = Session::for_entry(&raw_entry());
        let out = session.process_key(&KeyEvent::plain(KeyCode::F(5)));
        assert!(out.is_empty());
    }

    #[test]
    fn test_strip_8th_bit() {
        let mut entry = raw_entry();
        entry.toggles |= SessionToggles::STRIP_8TH_BIT;
        let mut session = Session::for_entry(&entry);
        // 0xC1 strips to 0x41 'A'.
        session.process_remote(&[0xC1]);
        assert_eq!(row_text(&session, 0), "A");
    }

    #[test]
    fn test_resize_grows_and_announces() {
        let mut session = Session::for_entry(&telnet_entry());
        let _ = session.process_remote(&[0xFF, 0xFD, 0x1F]);
        let wire = session.resize(132, 50);
        assert_eq!(session.screen().rows(), 49);
        assert_eq!(
            wire,
            [0xFF, 0xFA, 0x1F, 0x00, 0x84, 0x00, 0x31, 0xFF, 0xF0]
        );
    }

    #[test]
    fn test_shifted_insert_key() {
        let mut session = Session::for_entry(&raw_entry());
        let out = session.process_key(&KeyEvent::new(KeyCode::Insert, KeyModifiers::SHIFT));
        assert_eq!(out, b"\x1b[2;2~");
    }

    #[test]
    fn test_rlogin_session_start() {
        let mut entry = telnet_entry();
        entry.method = Method::Rlogin;
        entry.username = "guest".into();
        let mut session = Session::for_entry(&entry);
        let wire = session.rlogin_start(&entry, 19_200);
        assert_eq!(wire, b"\0guest\0guest\0ansi/19200\0");
        let out = session.process_remote(b"\0login: ");
        assert!(out.is_empty());
        assert_eq!(row_text(&session, 0), "login: ");
    }

    #[test]
    fn test_rlogin_oob_window_request() {
        let mut entry = telnet_entry();
        entry.method = Method::Rlogin;
        let mut session = Session::for_entry(&entry);
        let wire = session.process_oob(0x80);
        assert_eq!(wire.len(), 12);
        assert_eq!(&wire[..4], [0xFF, 0xFF, b's', b's']);
    }
}
