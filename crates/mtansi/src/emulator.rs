//! The ANSI emulator state machine.
//!
//! Bytes from the remote side are fed one at a time through
//! [`AnsiEmulator::consume`]. Screen mutations go straight to the
//! [`Screen`]; response bytes (DSR, DA) are appended to the
//! caller-supplied buffer so the caller decides when and where they are
//! flushed.

use std::io::Write;

use smallvec::SmallVec;
use tracing::debug;

use mtscreen::Screen;

use crate::codepage::CodepageId;
use crate::emulation::Emulation;
use crate::music::{MUSIC_BUFFER_SIZE, MusicSequence};
use crate::sgr::apply_sgr;

/// Cap on a pending escape sequence before it is dropped as garbage.
/// Large enough for the longest SGR runs ANSI art uses.
pub const SEQUENCE_BUFFER_SIZE: usize = 64;

/// Scanner state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Ground: printables and control characters.
    #[default]
    Ground,
    /// Saw ESC.
    Esc,
    /// Saw `ESC [`, no parameter digits yet.
    StartSequence,
    /// Reading the first parameter.
    Count,
    /// Reading the second parameter.
    CountTwo,
    /// Reading the third or later parameter.
    CountMany,
    /// Capturing an ANSI-music play string.
    Music,
}

/// What one consumed byte did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Byte was absorbed (control, or part of a pending sequence).
    NoCharYet,
    /// Exactly one glyph reached the screen.
    OneChar(char),
    /// `n` glyphs reached the screen at once: a rejected sequence was
    /// replayed as text, or REP repeated the last printable.
    Replayed(usize),
}

/// Tunables taken from the active phonebook entry.
#[derive(Debug, Clone)]
pub struct EmulatorOptions {
    pub emulation: Emulation,
    pub codepage: CodepageId,
    pub ansi_music: bool,
    pub display_null: bool,
    pub line_feed_on_cr: bool,
}

impl Default for EmulatorOptions {
    fn default() -> Self {
        Self {
            emulation: Emulation::Ansi,
            codepage: CodepageId::Cp437,
            ansi_music: false,
            display_null: false,
            line_feed_on_cr: false,
        }
    }
}

/// The recognized CSI finals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CsiFinal {
    CursorUp,
    CursorDown,
    CursorRight,
    CursorLeft,
    /// `H` and `f`.
    Position,
    EraseScreen,
    EraseLine,
    Sgr,
    SaveCursor,
    RestoreCursor,
    StatusReport,
    DeviceAttributes,
    InsertBlanks,
    DeleteChars,
    InsertLines,
    DeleteLines,
    TabForward,
    ColumnAbsolute,
    RowAbsolute,
    Repeat,
    SetMode,
    ResetMode,
}

impl CsiFinal {
    fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            b'A' => CsiFinal::CursorUp,
            b'B' => CsiFinal::CursorDown,
            b'C' => CsiFinal::CursorRight,
            b'D' => CsiFinal::CursorLeft,
            b'H' | b'f' => CsiFinal::Position,
            b'J' => CsiFinal::EraseScreen,
            b'K' => CsiFinal::EraseLine,
            b'm' => CsiFinal::Sgr,
            b's' => CsiFinal::SaveCursor,
            b'u' => CsiFinal::RestoreCursor,
            b'n' => CsiFinal::StatusReport,
            b'c' => CsiFinal::DeviceAttributes,
            b'@' => CsiFinal::InsertBlanks,
            b'P' => CsiFinal::DeleteChars,
            b'L' => CsiFinal::InsertLines,
            b'M' => CsiFinal::DeleteLines,
            b'I' => CsiFinal::TabForward,
            b'G' => CsiFinal::ColumnAbsolute,
            b'd' => CsiFinal::RowAbsolute,
            b'b' => CsiFinal::Repeat,
            b'h' => CsiFinal::SetMode,
            b'l' => CsiFinal::ResetMode,
            _ => return None,
        })
    }
}

/// The emulator FSM. One per connection.
#[derive(Debug)]
pub struct AnsiEmulator {
    options: EmulatorOptions,
    state: ScanState,
    seq: SmallVec<[u8; SEQUENCE_BUFFER_SIZE]>,
    params: SmallVec<[u16; 8]>,
    in_param: bool,
    param_digits: u8,
    /// ANSI.SYS `=` marker.
    ansi_sys_flag: bool,
    /// DEC `?` marker.
    dec_private_flag: bool,
    rep_character: Option<char>,
    music_buf: Vec<u8>,
    music_queue: Vec<MusicSequence>,
}

impl AnsiEmulator {
    #[must_use]
    pub fn new(options: EmulatorOptions) -> Self {
        Self {
            options,
            state: ScanState::Ground,
            seq: SmallVec::new(),
            params: SmallVec::new(),
            in_param: false,
            param_digits: 0,
            ansi_sys_flag: false,
            dec_private_flag: false,
            rep_character: None,
            music_buf: Vec::new(),
            music_queue: Vec::new(),
        }
    }

    #[must_use]
    pub fn options(&self) -> &EmulatorOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut EmulatorOptions {
        &mut self.options
    }

    #[must_use]
    pub fn scan_state(&self) -> ScanState {
        self.state
    }

    /// Captured ANSI-music sequences since the last call.
    pub fn take_music(&mut self) -> Vec<MusicSequence> {
        std::mem::take(&mut self.music_queue)
    }

    /// Consume one byte from the remote side.
    ///
    /// Glyphs and cursor operations are applied to `screen`; any bytes
    /// owed to the remote (DSR, DA replies) are appended to
    /// `responses`.
    pub fn consume(
        &mut self,
        byte: u8,
        screen: &mut Screen,
        responses: &mut Vec<u8>,
    ) -> ParseOutcome {
        match self.state {
            ScanState::Ground => self.scan_ground(byte, screen),
            ScanState::Esc => self.scan_esc(byte, screen, responses),
            ScanState::StartSequence | ScanState::Count | ScanState::CountTwo
            | ScanState::CountMany => self.scan_csi(byte, screen, responses),
            ScanState::Music => self.scan_music(byte),
        }
    }

    /// Feed a whole buffer, discarding per-byte outcomes.
    pub fn consume_all(&mut self, bytes: &[u8], screen: &mut Screen, responses: &mut Vec<u8>) {
        for &byte in bytes {
            self.consume(byte, screen, responses);
        }
    }

    fn reset_sequence(&mut self) {
        self.state = ScanState::Ground;
        self.seq.clear();
        self.params.clear();
        self.in_param = false;
        self.param_digits = 0;
        self.ansi_sys_flag = false;
        self.dec_private_flag = false;
    }

    // ----- ground -----

    fn scan_ground(&mut self, byte: u8, screen: &mut Screen) -> ParseOutcome {
        if byte == 0x1B && self.options.emulation.supports_sequences() {
            self.seq.push(byte);
            self.state = ScanState::Esc;
            return ParseOutcome::NoCharYet;
        }
        if byte < 0x20 {
            return self.dispatch_control(byte, screen);
        }
        let glyph = self.options.codepage.table().glyph(byte);
        self.rep_character = Some(glyph);
        screen.print_glyph(glyph);
        ParseOutcome::OneChar(glyph)
    }

    fn dispatch_control(&mut self, byte: u8, screen: &mut Screen) -> ParseOutcome {
        match byte {
            0x00 => {
                if self.options.display_null {
                    let glyph = self.options.codepage.table().glyph(0);
                    screen.print_glyph(glyph);
                    return ParseOutcome::OneChar(glyph);
                }
            }
            0x07 => screen.ring_bell(),
            0x08 => screen.cursor_left(1),
            0x09 => screen.tab_forward(),
            0x0A => screen.line_feed(),
            0x0C => screen.cursor_formfeed(),
            0x0D => {
                screen.carriage_return();
                if self.options.line_feed_on_cr {
                    screen.line_feed();
                }
            }
            // SO/SI are charset shifts on real DEC hardware; ANSI.SYS
            // swallows them.
            0x0E | 0x0F => {}
            _ => {}
        }
        ParseOutcome::NoCharYet
    }

    // ----- ESC -----

    fn scan_esc(&mut self, byte: u8, screen: &mut Screen, responses: &mut Vec<u8>) -> ParseOutcome {
        match byte {
            b'[' => {
                self.seq.push(byte);
                self.state = ScanState::StartSequence;
                ParseOutcome::NoCharYet
            }
            b'Z' => {
                send_device_attributes(responses);
                self.reset_sequence();
                ParseOutcome::NoCharYet
            }
            // Spurious ESC restarts the sequence.
            0x1B => ParseOutcome::NoCharYet,
            _ => self.abort_sequence(byte, screen),
        }
    }

    // ----- CSI -----

    #[allow(clippy::too_many_lines)]
    fn scan_csi(&mut self, byte: u8, screen: &mut Screen, responses: &mut Vec<u8>) -> ParseOutcome {
        if self.seq.len() >= SEQUENCE_BUFFER_SIZE {
            debug!(len = self.seq.len(), "escape sequence overflow, dropping");
            self.reset_sequence();
            return ParseOutcome::NoCharYet;
        }

        match byte {
            b'0'..=b'9' => {
                if self.param_digits >= 3 {
                    // Parameters are capped at three digits.
                    return self.abort_sequence(byte, screen);
                }
                self.seq.push(byte);
                let digit = u16::from(byte - b'0');
                if let (true, Some(last)) = (self.in_param, self.params.last_mut()) {
                    *last = *last * 10 + digit;
                } else {
                    self.params.push(digit);
                    self.in_param = true;
                }
                self.param_digits += 1;
                self.state = match self.state {
                    ScanState::StartSequence => ScanState::Count,
                    other => other,
                };
                ParseOutcome::NoCharYet
            }
            b';' => {
                self.seq.push(byte);
                if !self.in_param {
                    self.params.push(0);
                }
                self.in_param = false;
                self.param_digits = 0;
                self.state = match self.state {
                    ScanState::StartSequence | ScanState::Count => ScanState::CountTwo,
                    _ => ScanState::CountMany,
                };
                ParseOutcome::NoCharYet
            }
            b'=' if self.state == ScanState::StartSequence => {
                self.seq.push(byte);
                self.ansi_sys_flag = true;
                ParseOutcome::NoCharYet
            }
            b'?' if self.state == ScanState::StartSequence => {
                self.seq.push(byte);
                self.dec_private_flag = true;
                ParseOutcome::NoCharYet
            }
            // RIPScript query; discarded without output.
            b'!' if self.state == ScanState::StartSequence => {
                self.reset_sequence();
                ParseOutcome::NoCharYet
            }
            _ => {
                if self.state == ScanState::StartSequence
                    && byte == b'M'
                    && self.options.ansi_music
                    && !self.ansi_sys_flag
                    && !self.dec_private_flag
                {
                    self.seq.clear();
                    self.params.clear();
                    self.music_buf.clear();
                    self.state = ScanState::Music;
                    return ParseOutcome::NoCharYet;
                }
                let Some(final_) = CsiFinal::from_byte(byte) else {
                    return self.abort_sequence(byte, screen);
                };
                if !self.final_allowed(final_) {
                    return self.abort_sequence(byte, screen);
                }
                self.dispatch_csi(final_, screen, responses)
            }
        }
    }

    /// Multi-parameter forms exist only for CUP/HVP and SGR.
    fn final_allowed(&self, final_: CsiFinal) -> bool {
        match self.state {
            ScanState::CountTwo => {
                matches!(final_, CsiFinal::Position | CsiFinal::Sgr)
            }
            ScanState::CountMany => matches!(final_, CsiFinal::Sgr),
            _ => true,
        }
    }

    fn param_or(&self, idx: usize, default: u16) -> u16 {
        self.params.get(idx).copied().unwrap_or(default)
    }

    /// Count-style parameter: absent or zero means `default`.
    fn count_or(&self, default: u16) -> usize {
        let n = self.param_or(0, default);
        usize::from(if n == 0 { default.max(1) } else { n })
    }

    #[allow(clippy::too_many_lines)]
    fn dispatch_csi(
        &mut self,
        final_: CsiFinal,
        screen: &mut Screen,
        responses: &mut Vec<u8>,
    ) -> ParseOutcome {
        let mut outcome = ParseOutcome::NoCharYet;
        match final_ {
            CsiFinal::CursorUp => screen.cursor_up(self.count_or(1)),
            CsiFinal::CursorDown => screen.cursor_down(self.count_or(1)),
            CsiFinal::CursorRight => screen.cursor_right(self.count_or(1)),
            CsiFinal::CursorLeft => screen.cursor_left(self.count_or(1)),
            CsiFinal::Position => {
                // 1-based; row or column 0 is silently treated as 1.
                let row = self.param_or(0, 1).max(1) - 1;
                let col = self.param_or(1, 1).max(1) - 1;
                screen.cursor_position(usize::from(row), usize::from(col));
            }
            CsiFinal::EraseScreen => {
                let (row, col) = screen.cursor();
                let last_row = screen.rows() - 1;
                let last_col = screen.width() - 1;
                match self.param_or(0, 0) {
                    0 => screen.erase_screen(row, col, last_row, last_col, false),
                    1 => screen.erase_screen(0, 0, row, col, false),
                    2 => {
                        screen.erase_screen(0, 0, last_row, last_col, false);
                        screen.cursor_position(0, 0);
                    }
                    _ => {}
                }
            }
            CsiFinal::EraseLine => {
                let (_, col) = screen.cursor();
                let last_col = screen.width() - 1;
                match self.param_or(0, 0) {
                    0 => screen.erase_line(col, last_col, false),
                    1 => screen.erase_line(0, col, false),
                    2 => screen.erase_line(0, last_col, false),
                    _ => {}
                }
            }
            CsiFinal::Sgr => {
                let mut pen = screen.pen();
                apply_sgr(&self.params, &mut pen, screen.default_pen());
                screen.set_pen(pen);
            }
            CsiFinal::SaveCursor => screen.save_cursor(),
            CsiFinal::RestoreCursor => screen.restore_cursor(),
            CsiFinal::StatusReport => {
                if self.param_or(0, 0) == 6 {
                    let (row, col) = screen.cursor();
                    let col = col.min(screen.width() - 1);
                    let _ = write!(responses, "\x1b[{};{}R", row + 1, col + 1);
                }
            }
            CsiFinal::DeviceAttributes => send_device_attributes(responses),
            CsiFinal::InsertBlanks => screen.insert_blanks(self.count_or(1)),
            CsiFinal::DeleteChars => screen.delete_character(self.count_or(1)),
            CsiFinal::InsertLines => {
                let (row, _) = screen.cursor();
                let (top, bottom) = screen.scroll_region();
                if row >= top && row <= bottom {
                    screen.scrolling_region_scroll_down(row, bottom, self.count_or(1));
                }
            }
            CsiFinal::DeleteLines => {
                let (row, _) = screen.cursor();
                let (top, bottom) = screen.scroll_region();
                if row >= top && row <= bottom {
                    screen.scrolling_region_scroll_up(row, bottom, self.count_or(1));
                }
            }
            CsiFinal::TabForward => {
                for _ in 0..self.count_or(1) {
                    screen.tab_forward();
                }
            }
            CsiFinal::ColumnAbsolute => {
                let (row, _) = screen.cursor();
                let col = self.param_or(0, 1).max(1) - 1;
                screen.cursor_position(row, usize::from(col));
            }
            CsiFinal::RowAbsolute => {
                let (_, col) = screen.cursor();
                let row = self.param_or(0, 1).max(1) - 1;
                screen.cursor_position(usize::from(row), col);
            }
            CsiFinal::Repeat => {
                if let Some(glyph) = self.rep_character {
                    let n = self.count_or(1);
                    for _ in 0..n {
                        screen.print_glyph(glyph);
                    }
                    outcome = ParseOutcome::Replayed(n);
                }
            }
            CsiFinal::SetMode => {
                if self.dec_private_flag && self.param_or(0, 0) == 7 {
                    screen.set_line_wrap(true);
                }
            }
            CsiFinal::ResetMode => {
                if self.dec_private_flag && self.param_or(0, 0) == 7 {
                    screen.set_line_wrap(false);
                }
            }
        }
        self.reset_sequence();
        outcome
    }

    // ----- music -----

    fn scan_music(&mut self, byte: u8) -> ParseOutcome {
        match byte {
            0x0E | 0x0D => {
                let captured = std::mem::take(&mut self.music_buf);
                self.music_queue.push(MusicSequence(captured));
                self.reset_sequence();
            }
            _ => {
                if self.music_buf.len() >= MUSIC_BUFFER_SIZE {
                    debug!("ansi music buffer overflow, dropping sequence");
                    self.music_buf.clear();
                    self.reset_sequence();
                } else {
                    self.music_buf.push(byte);
                }
            }
        }
        ParseOutcome::NoCharYet
    }

    // ----- failure path -----

    /// The byte does not fit the pending sequence: everything collected
    /// so far (plus the offending byte) goes to the screen as
    /// codepage-mapped glyphs, and the scanner returns to ground.
    fn abort_sequence(&mut self, byte: u8, screen: &mut Screen) -> ParseOutcome {
        self.seq.push(byte);
        let table = self.options.codepage.table();
        for &b in &self.seq {
            screen.print_glyph(table.glyph(b));
        }
        let n = self.seq.len();
        self.reset_sequence();
        ParseOutcome::Replayed(n)
    }
}

/// The DA/DECID identify reply: "VT100 with advanced video option".
///
/// All seven bytes are sent.
fn send_device_attributes(responses: &mut Vec<u8>) {
    responses.extend_from_slice(b"\x1b[?1;2c");
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtscreen::{CellAttributes, CellColor, Pen};
    use pretty_assertions::assert_eq;

    struct Fixture {
        emu: AnsiEmulator,
        screen: Screen,
        responses: Vec<u8>,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_options(EmulatorOptions::default())
        }

        fn with_options(options: EmulatorOptions) -> Self {
            Self {
                emu: AnsiEmulator::new(options),
                screen: Screen::new(80, 24),
                responses: Vec::new(),
            }
        }

        fn feed(&mut self, bytes: &[u8]) {
            self.emu
                .consume_all(bytes, &mut self.screen, &mut self.responses);
        }

        fn row_text(&self, row: usize) -> String {
            let line = self.screen.row(row);
            (0..line.length()).map(|c| line.get(c).glyph).collect()
        }
    }

    #[test]
    fn test_plain_text() {
        let mut f = Fixture::new();
        f.feed(b"hello");
        assert_eq!(f.row_text(0), "hello");
        assert_eq!(f.screen.cursor(), (0, 5));
    }

    #[test]
    fn test_cursor_movement_sequences() {
        let mut f = Fixture::new();
        f.feed(b"\x1b[5;10H");
        assert_eq!(f.screen.cursor(), (4, 9));
        f.feed(b"\x1b[2A");
        assert_eq!(f.screen.cursor(), (2, 9));
        f.feed(b"\x1b[3C");
        assert_eq!(f.screen.cursor(), (2, 12));
        f.feed(b"\x1b[D");
        assert_eq!(f.screen.cursor(), (2, 11));
        f.feed(b"\x1b[B");
        assert_eq!(f.screen.cursor(), (3, 11));
    }

    #[test]
    fn test_cup_row_zero_treated_as_one() {
        let mut f = Fixture::new();
        f.feed(b"\x1b[0;5f");
        assert_eq!(f.screen.cursor(), (0, 4));
    }

    #[test]
    fn test_scenario_clear_home_sgr() {
        // ESC[2J ESC[1;1H ESC[1;31m Hi ESC[0m
        let mut f = Fixture::new();
        f.feed(b"junk");
        f.feed(b"\x1b[2J\x1b[1;1H\x1b[1;31mHi\x1b[0m");
        assert_eq!(f.row_text(0), "Hi");
        let expect = Pen::new(CellAttributes::BOLD, CellColor::new(1, 0));
        assert_eq!(f.screen.row(0).get(0).pen, expect);
        assert_eq!(f.screen.row(0).get(1).pen, expect);
        assert_eq!(f.screen.cursor(), (0, 2));
        assert_eq!(f.screen.pen(), Pen::default());
    }

    #[test]
    fn test_dsr_reports_one_based_position() {
        let mut f = Fixture::new();
        f.feed(b"\x1b[5;10H\x1b[6n");
        assert_eq!(f.responses, b"\x1b[5;10R");
        assert_eq!(f.row_text(4), "");
    }

    #[test]
    fn test_device_attributes_full_reply() {
        let mut f = Fixture::new();
        f.feed(b"\x1b[c");
        assert_eq!(f.responses, b"\x1b[?1;2c");
        f.responses.clear();
        f.feed(b"\x1bZ");
        assert_eq!(f.responses, b"\x1b[?1;2c");
        assert_eq!(f.responses.len(), 7);
    }

    #[test]
    fn test_erase_line_variants() {
        let mut f = Fixture::new();
        f.feed(b"abcdef\x1b[3G\x1b[K");
        assert_eq!(f.row_text(0), "ab");
        f.feed(b"\x1b[1;1Hxyz\x1b[2G\x1b[1K");
        assert_eq!(f.row_text(0), "  z");
    }

    #[test]
    fn test_insert_delete_chars() {
        let mut f = Fixture::new();
        f.feed(b"abcd\x1b[1G\x1b[2@");
        assert_eq!(f.row_text(0), "  abcd");
        f.feed(b"\x1b[1G\x1b[3P");
        assert_eq!(f.row_text(0), "bcd");
    }

    #[test]
    fn test_insert_delete_lines() {
        let mut f = Fixture::new();
        f.feed(b"one\r\ntwo\r\nthree");
        f.feed(b"\x1b[1;1H\x1b[L");
        assert_eq!(f.row_text(0), "");
        assert_eq!(f.row_text(1), "one");
        f.feed(b"\x1b[M");
        assert_eq!(f.row_text(0), "one");
        assert_eq!(f.row_text(1), "two");
    }

    #[test]
    fn test_save_restore_cursor() {
        let mut f = Fixture::new();
        f.feed(b"\x1b[7;7H\x1b[s\x1b[1;1H\x1b[u");
        assert_eq!(f.screen.cursor(), (6, 6));
    }

    #[test]
    fn test_rep_repeats_last_printable() {
        let mut f = Fixture::new();
        f.feed(b"x\x1b[4b");
        assert_eq!(f.row_text(0), "xxxxx");
    }

    #[test]
    fn test_rep_without_printable_is_noop() {
        let mut f = Fixture::new();
        f.feed(b"\x1b[4b");
        assert_eq!(f.row_text(0), "");
    }

    #[test]
    fn test_decawm_toggle() {
        let mut f = Fixture::new();
        f.feed(b"\x1b[?7l");
        assert!(!f.screen.line_wrap());
        f.feed(b"\x1b[?7h");
        assert!(f.screen.line_wrap());
    }

    #[test]
    fn test_other_modes_ignored() {
        let mut f = Fixture::new();
        f.feed(b"\x1b[=255h\x1b[4l");
        assert_eq!(f.row_text(0), "");
        assert!(f.screen.line_wrap());
    }

    #[test]
    fn test_rip_query_discarded() {
        let mut f = Fixture::new();
        f.feed(b"\x1b[!");
        assert_eq!(f.emu.scan_state(), ScanState::Ground);
        assert_eq!(f.row_text(0), "");
    }

    #[test]
    fn test_malformed_sequence_replays_as_glyphs() {
        let mut f = Fixture::new();
        let outcome = {
            f.feed(b"\x1b[12");
            f.emu
                .consume(b'x', &mut f.screen, &mut f.responses)
        };
        // ESC maps to the CP437 left arrow; the rest is literal.
        assert_eq!(outcome, ParseOutcome::Replayed(5));
        assert_eq!(f.row_text(0), "←[12x");
        assert_eq!(f.emu.scan_state(), ScanState::Ground);
    }

    #[test]
    fn test_param_longer_than_three_digits_aborts() {
        let mut f = Fixture::new();
        // The abort replays "ESC [ 1 2 3 4"; the final byte then prints
        // as ordinary ground text.
        f.feed(b"\x1b[1234A");
        assert_eq!(f.row_text(0), "←[1234A");
        assert_eq!(f.screen.cursor().1, 7);
    }

    #[test]
    fn test_esc_is_idempotent() {
        let mut f = Fixture::new();
        f.feed(b"hi");
        let before = (f.screen.cursor(), f.row_text(0));
        f.feed(b"\x1b\x1b\x1b");
        assert_eq!((f.screen.cursor(), f.row_text(0)), before);
        assert_eq!(f.emu.scan_state(), ScanState::Esc);
    }

    #[test]
    fn test_tab_stops() {
        let mut f = Fixture::new();
        f.feed(b"a\t");
        assert_eq!(f.screen.cursor(), (0, 8));
        f.feed(b"\x1b[2I");
        assert_eq!(f.screen.cursor(), (0, 24));
    }

    #[test]
    fn test_column_and_row_absolute() {
        let mut f = Fixture::new();
        f.feed(b"\x1b[40G");
        assert_eq!(f.screen.cursor(), (0, 39));
        f.feed(b"\x1b[10d");
        assert_eq!(f.screen.cursor(), (9, 39));
        f.feed(b"\x1b[G");
        assert_eq!(f.screen.cursor(), (9, 0));
    }

    #[test]
    fn test_control_characters() {
        let mut f = Fixture::new();
        f.feed(b"ab\x08x");
        assert_eq!(f.row_text(0), "ax");
        f.feed(b"\x07");
        assert!(f.screen.take_bell());
        f.feed(b"\x0c");
        assert_eq!(f.screen.cursor(), (0, 0));
        assert_eq!(f.row_text(0), "");
    }

    #[test]
    fn test_line_feed_on_cr_option() {
        let mut f = Fixture::with_options(EmulatorOptions {
            line_feed_on_cr: true,
            ..EmulatorOptions::default()
        });
        f.feed(b"one\rtwo");
        assert_eq!(f.row_text(0), "one");
        assert_eq!(f.row_text(1), "two");
    }

    #[test]
    fn test_display_null() {
        let mut f = Fixture::with_options(EmulatorOptions {
            display_null: true,
            ..EmulatorOptions::default()
        });
        f.feed(b"a\x00b");
        assert_eq!(f.screen.cursor(), (0, 3));

        let mut f = Fixture::new();
        f.feed(b"a\x00b");
        assert_eq!(f.row_text(0), "ab");
    }

    #[test]
    fn test_cp437_high_glyphs() {
        let mut f = Fixture::new();
        f.feed(&[0xC9, 0xCD, 0xBB]);
        assert_eq!(f.row_text(0), "╔═╗");
    }

    #[test]
    fn test_music_capture() {
        let mut f = Fixture::with_options(EmulatorOptions {
            ansi_music: true,
            ..EmulatorOptions::default()
        });
        f.feed(b"\x1b[MFT120L8CDE\x0e");
        let music = f.emu.take_music();
        assert_eq!(music.len(), 1);
        assert_eq!(music[0].as_bytes(), b"FT120L8CDE");
        assert_eq!(f.emu.scan_state(), ScanState::Ground);
        assert_eq!(f.row_text(0), "");
    }

    #[test]
    fn test_music_cr_terminator() {
        let mut f = Fixture::with_options(EmulatorOptions {
            ansi_music: true,
            ..EmulatorOptions::default()
        });
        f.feed(b"\x1b[MCDEFG\r");
        assert_eq!(f.emu.take_music().len(), 1);
    }

    #[test]
    fn test_music_disabled_is_delete_lines() {
        let mut f = Fixture::new();
        f.feed(b"one\r\ntwo\x1b[1;1H\x1b[M");
        assert_eq!(f.row_text(0), "two");
        assert!(f.emu.take_music().is_empty());
    }

    #[test]
    fn test_music_overflow_drops() {
        let mut f = Fixture::with_options(EmulatorOptions {
            ansi_music: true,
            ..EmulatorOptions::default()
        });
        f.feed(b"\x1b[M");
        let long = vec![b'C'; MUSIC_BUFFER_SIZE + 10];
        f.feed(&long);
        assert!(f.emu.take_music().is_empty());
        assert_eq!(f.emu.scan_state(), ScanState::Ground);
    }

    #[test]
    fn test_erase_screen_from_cursor() {
        let mut f = Fixture::new();
        f.feed(b"aaaa\r\nbbbb\r\ncccc");
        f.feed(b"\x1b[2;3H\x1b[J");
        assert_eq!(f.row_text(0), "aaaa");
        assert_eq!(f.row_text(1), "bb");
        assert_eq!(f.row_text(2), "");
    }

    #[test]
    fn test_erase_screen_to_cursor() {
        let mut f = Fixture::new();
        f.feed(b"aaaa\r\nbbbb\r\ncccc");
        f.feed(b"\x1b[2;3H\x1b[1J");
        assert_eq!(f.row_text(0), "");
        assert_eq!(f.row_text(1), "   b");
        assert_eq!(f.row_text(2), "cccc");
    }

    #[test]
    fn test_ascii_emulation_ignores_sequences() {
        let mut f = Fixture::with_options(EmulatorOptions {
            emulation: Emulation::Ascii,
            ..EmulatorOptions::default()
        });
        f.feed(b"\x1b[2Jhello");
        // ESC is dropped as an unhandled control; the rest prints.
        assert_eq!(f.row_text(0), "[2Jhello");
    }
}
