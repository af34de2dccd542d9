//! The telnet framer.
//!
//! A pure byte machine: [`TelnetFramer::decode`] splits incoming wire
//! bytes into payload and negotiation replies, [`TelnetFramer::encode`]
//! escapes outgoing payload. Sockets never appear here.
//!
//! Only the options BBS hosts actually negotiate are supported:
//! BINARY, ECHO, SUPPRESS-GO-AHEAD, TERMINAL-TYPE, END-OF-RECORD and
//! NAWS. Everything else is refused.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use tracing::{debug, trace};

/// Interpret As Command.
pub const IAC: u8 = 255;

/// Cap on a subnegotiation body; exceeding it drops the subneg.
pub const SUBNEG_BUFFER_SIZE: usize = 1024;

/// Commands following IAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum TelnetCommand {
    EndOfRecord = 239,
    Se = 240,
    Nop = 241,
    DataMark = 242,
    Break = 243,
    InterruptProcess = 244,
    AbortOutput = 245,
    AreYouThere = 246,
    EraseCharacter = 247,
    EraseLine = 248,
    GoAhead = 249,
    Sb = 250,
    Will = 251,
    Wont = 252,
    Do = 253,
    Dont = 254,
}

/// Options this client negotiates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum TelnetOption {
    Binary = 0,
    Echo = 1,
    SuppressGoAhead = 3,
    TerminalType = 24,
    EndOfRecord = 25,
    Naws = 31,
}

/// TERMINAL-TYPE subnegotiation verbs.
const TTYPE_IS: u8 = 0;
const TTYPE_SEND: u8 = 1;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum IacState {
    #[default]
    None,
    Iac,
    Will,
    Wont,
    Do,
    Dont,
    Sb,
    SbIac,
}

/// Per-connection telnet state.
#[derive(Debug)]
pub struct TelnetFramer {
    state: IacState,
    subneg: Vec<u8>,
    do_echo: bool,
    do_binary_tx: bool,
    do_binary_rx: bool,
    do_sga: bool,
    do_naws: bool,
    do_eor: bool,
    /// Forced 8-bit-clean mode during file transfers.
    binary_transfer: bool,
    /// Receive-side: a CR was the previous payload byte (NVT CR NUL).
    pending_cr: bool,
    terminal_name: String,
    /// Emulation area size reported via NAWS: (columns, rows).
    window: (u16, u16),
}

impl TelnetFramer {
    #[must_use]
    pub fn new(terminal_name: &str, columns: u16, rows: u16) -> Self {
        Self {
            state: IacState::None,
            subneg: Vec::new(),
            do_echo: false,
            do_binary_tx: false,
            do_binary_rx: false,
            do_sga: false,
            do_naws: false,
            do_eor: false,
            binary_transfer: false,
            pending_cr: false,
            terminal_name: terminal_name.to_owned(),
            window: (columns, rows),
        }
    }

    /// Whether the transmit side is in NVT ASCII mode.
    #[must_use]
    pub fn is_ascii(&self) -> bool {
        !(self.do_binary_tx || self.binary_transfer)
    }

    #[must_use]
    pub fn remote_echo(&self) -> bool {
        self.do_echo
    }

    #[must_use]
    pub fn suppress_go_ahead(&self) -> bool {
        self.do_sga
    }

    #[must_use]
    pub fn eor_enabled(&self) -> bool {
        self.do_eor
    }

    /// Force 8-bit-clean framing for the duration of a file transfer.
    pub fn set_binary_transfer(&mut self, on: bool) {
        self.binary_transfer = on;
    }

    /// Split incoming wire bytes into `payload` (for the emulator) and
    /// `wire_out` (negotiation replies owed to the peer).
    pub fn decode(&mut self, input: &[u8], payload: &mut Vec<u8>, wire_out: &mut Vec<u8>) {
        for &byte in input {
            self.decode_byte(byte, payload, wire_out);
        }
    }

    fn decode_byte(&mut self, byte: u8, payload: &mut Vec<u8>, wire_out: &mut Vec<u8>) {
        match self.state {
            IacState::None => {
                if byte == IAC {
                    self.state = IacState::Iac;
                } else {
                    self.push_payload(byte, payload);
                }
            }
            IacState::Iac => self.decode_command(byte, payload, wire_out),
            IacState::Will => {
                self.handle_will(byte, wire_out);
                self.state = IacState::None;
            }
            IacState::Wont => {
                self.handle_wont(byte, wire_out);
                self.state = IacState::None;
            }
            IacState::Do => {
                self.handle_do(byte, wire_out);
                self.state = IacState::None;
            }
            IacState::Dont => {
                self.handle_dont(byte, wire_out);
                self.state = IacState::None;
            }
            IacState::Sb => {
                if byte == IAC {
                    self.state = IacState::SbIac;
                } else if self.subneg.len() >= SUBNEG_BUFFER_SIZE {
                    debug!(len = self.subneg.len(), "subnegotiation overflow, dropping");
                    self.subneg.clear();
                    self.state = IacState::None;
                } else {
                    self.subneg.push(byte);
                }
            }
            IacState::SbIac => match byte {
                b if b == u8::from(TelnetCommand::Se) => {
                    self.handle_subneg(wire_out);
                    self.subneg.clear();
                    self.state = IacState::None;
                }
                IAC => {
                    // Escaped 0xFF inside subnegotiation data.
                    self.subneg.push(IAC);
                    self.state = IacState::Sb;
                }
                _ => {
                    debug!(byte, "malformed subnegotiation, dropping");
                    self.subneg.clear();
                    self.state = IacState::None;
                }
            },
        }
    }

    fn push_payload(&mut self, byte: u8, payload: &mut Vec<u8>) {
        // NVT represents a bare CR as CR NUL; strip the NUL in ASCII
        // mode.
        if self.pending_cr && byte == 0 && !self.do_binary_rx {
            self.pending_cr = false;
            return;
        }
        self.pending_cr = byte == b'\r';
        payload.push(byte);
    }

    fn decode_command(&mut self, byte: u8, payload: &mut Vec<u8>, _wire_out: &mut Vec<u8>) {
        if byte == IAC {
            // Escaped data byte.
            self.push_payload(IAC, payload);
            self.state = IacState::None;
            return;
        }
        match TelnetCommand::try_from(byte) {
            Ok(TelnetCommand::Will) => self.state = IacState::Will,
            Ok(TelnetCommand::Wont) => self.state = IacState::Wont,
            Ok(TelnetCommand::Do) => self.state = IacState::Do,
            Ok(TelnetCommand::Dont) => self.state = IacState::Dont,
            Ok(TelnetCommand::Sb) => {
                self.subneg.clear();
                self.state = IacState::Sb;
            }
            Ok(command) => {
                // EOR markers, GA, NOP and friends carry no payload.
                trace!(?command, "ignoring telnet command");
                self.state = IacState::None;
            }
            Err(_) => {
                trace!(byte, "unknown telnet command");
                self.state = IacState::None;
            }
        }
    }

    // ----- negotiation -----

    fn handle_will(&mut self, option: u8, wire_out: &mut Vec<u8>) {
        match TelnetOption::try_from(option) {
            Ok(TelnetOption::Echo) => {
                self.do_echo = true;
                self.reply(TelnetCommand::Do, option, wire_out);
            }
            Ok(TelnetOption::SuppressGoAhead) => {
                self.do_sga = true;
                self.reply(TelnetCommand::Do, option, wire_out);
            }
            Ok(TelnetOption::Binary) => {
                self.do_binary_rx = true;
                self.reply(TelnetCommand::Do, option, wire_out);
            }
            Ok(TelnetOption::EndOfRecord) => {
                self.do_eor = true;
                self.reply(TelnetCommand::Do, option, wire_out);
            }
            _ => self.reply(TelnetCommand::Dont, option, wire_out),
        }
    }

    fn handle_wont(&mut self, option: u8, wire_out: &mut Vec<u8>) {
        match TelnetOption::try_from(option) {
            Ok(TelnetOption::Echo) => self.do_echo = false,
            Ok(TelnetOption::SuppressGoAhead) => self.do_sga = false,
            Ok(TelnetOption::Binary) => self.do_binary_rx = false,
            Ok(TelnetOption::EndOfRecord) => self.do_eor = false,
            _ => {}
        }
        self.reply(TelnetCommand::Dont, option, wire_out);
    }

    fn handle_do(&mut self, option: u8, wire_out: &mut Vec<u8>) {
        match TelnetOption::try_from(option) {
            Ok(TelnetOption::Binary) => {
                self.do_binary_tx = true;
                self.reply(TelnetCommand::Will, option, wire_out);
            }
            Ok(TelnetOption::SuppressGoAhead) => {
                self.reply(TelnetCommand::Will, option, wire_out);
            }
            Ok(TelnetOption::TerminalType) => {
                self.reply(TelnetCommand::Will, option, wire_out);
            }
            Ok(TelnetOption::EndOfRecord) => {
                self.reply(TelnetCommand::Will, option, wire_out);
            }
            Ok(TelnetOption::Naws) => {
                self.do_naws = true;
                self.reply(TelnetCommand::Will, option, wire_out);
                self.send_naws(wire_out);
            }
            _ => self.reply(TelnetCommand::Wont, option, wire_out),
        }
    }

    fn handle_dont(&mut self, option: u8, wire_out: &mut Vec<u8>) {
        match TelnetOption::try_from(option) {
            Ok(TelnetOption::Binary) => self.do_binary_tx = false,
            Ok(TelnetOption::Naws) => self.do_naws = false,
            _ => {}
        }
        self.reply(TelnetCommand::Wont, option, wire_out);
    }

    fn reply(&self, command: TelnetCommand, option: u8, wire_out: &mut Vec<u8>) {
        debug!(?command, option, "telnet negotiation reply");
        wire_out.extend_from_slice(&[IAC, command.into(), option]);
    }

    fn handle_subneg(&mut self, wire_out: &mut Vec<u8>) {
        match self.subneg.as_slice() {
            [opt, TTYPE_SEND] if *opt == u8::from(TelnetOption::TerminalType) => {
                debug!(name = %self.terminal_name, "sending terminal type");
                wire_out.extend_from_slice(&[IAC, TelnetCommand::Sb.into(), *opt, TTYPE_IS]);
                wire_out.extend_from_slice(self.terminal_name.as_bytes());
                wire_out.extend_from_slice(&[IAC, TelnetCommand::Se.into()]);
            }
            other => {
                trace!(?other, "ignoring subnegotiation");
            }
        }
    }

    // ----- outbound -----

    /// Escape outgoing payload bytes per the active mode.
    pub fn encode(&self, payload: &[u8], wire_out: &mut Vec<u8>) {
        let ascii = self.is_ascii();
        let mut iter = payload.iter().copied().peekable();
        while let Some(byte) = iter.next() {
            match byte {
                IAC if !ascii => wire_out.extend_from_slice(&[IAC, IAC]),
                b'\r' if ascii => {
                    // NVT: CR LF stays a newline pair, a lone CR gains
                    // a NUL.
                    if iter.peek() == Some(&b'\n') {
                        wire_out.push(b'\r');
                    } else {
                        wire_out.extend_from_slice(b"\r\0");
                    }
                }
                other => wire_out.push(other),
            }
        }
    }

    /// The local window changed; re-announce it if the peer asked for
    /// NAWS.
    pub fn resize_screen(&mut self, columns: u16, rows: u16, wire_out: &mut Vec<u8>) {
        self.window = (columns, rows);
        if self.do_naws {
            self.send_naws(wire_out);
        }
    }

    fn send_naws(&self, wire_out: &mut Vec<u8>) {
        let (columns, rows) = self.window;
        debug!(columns, rows, "sending NAWS");
        wire_out.extend_from_slice(&[
            IAC,
            TelnetCommand::Sb.into(),
            TelnetOption::Naws.into(),
        ]);
        wire_out.extend_from_slice(&columns.to_be_bytes());
        wire_out.extend_from_slice(&rows.to_be_bytes());
        wire_out.extend_from_slice(&[IAC, TelnetCommand::Se.into()]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn framer() -> TelnetFramer {
        TelnetFramer::new("ansi", 80, 24)
    }

    fn decode(framer: &mut TelnetFramer, input: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let mut payload = Vec::new();
        let mut wire_out = Vec::new();
        framer.decode(input, &mut payload, &mut wire_out);
        (payload, wire_out)
    }

    #[test]
    fn test_plain_data_passes_through() {
        let mut f = framer();
        let (payload, wire_out) = decode(&mut f, b"hello");
        assert_eq!(payload, b"hello");
        assert!(wire_out.is_empty());
    }

    #[test]
    fn test_will_echo_answered_with_do() {
        let mut f = framer();
        let (_, wire_out) = decode(&mut f, &[IAC, 251, 1]);
        assert_eq!(wire_out, [IAC, 253, 1]);
        assert!(f.remote_echo());
    }

    #[test]
    fn test_will_binary_enables_8bit_receive() {
        let mut f = framer();
        let (_, wire_out) = decode(&mut f, &[IAC, 251, 0]);
        assert_eq!(wire_out, [IAC, 253, 0]);
        assert!(f.do_binary_rx);
    }

    #[test]
    fn test_unknown_will_refused() {
        let mut f = framer();
        let (_, wire_out) = decode(&mut f, &[IAC, 251, 42]);
        assert_eq!(wire_out, [IAC, 254, 42]);
    }

    #[test]
    fn test_unknown_do_refused() {
        let mut f = framer();
        let (_, wire_out) = decode(&mut f, &[IAC, 253, 42]);
        assert_eq!(wire_out, [IAC, 252, 42]);
    }

    #[test]
    fn test_do_naws_sends_will_and_window_size() {
        // S3: IAC DO NAWS for an 80x24 window.
        let mut f = framer();
        let (_, wire_out) = decode(&mut f, &[0xFF, 0xFD, 0x1F]);
        assert_eq!(
            wire_out,
            [
                0xFF, 0xFB, 0x1F, // IAC WILL NAWS
                0xFF, 0xFA, 0x1F, 0x00, 0x50, 0x00, 0x18, 0xFF, 0xF0, // subneg
            ]
        );
    }

    #[test]
    fn test_resize_only_after_do_naws() {
        let mut f = framer();
        let mut wire_out = Vec::new();
        f.resize_screen(132, 49, &mut wire_out);
        assert!(wire_out.is_empty());
        decode(&mut f, &[IAC, 253, 31]);
        f.resize_screen(132, 49, &mut wire_out);
        assert_eq!(
            wire_out,
            [0xFF, 0xFA, 0x1F, 0x00, 0x84, 0x00, 0x31, 0xFF, 0xF0]
        );
    }

    #[test]
    fn test_terminal_type_subnegotiation() {
        let mut f = framer();
        let (_, wire_out) = decode(&mut f, &[IAC, 253, 24]);
        assert_eq!(wire_out, [IAC, 251, 24]);
        // Server: IAC SB TERMINAL-TYPE SEND IAC SE
        let (_, wire_out) = decode(&mut f, &[IAC, 250, 24, 1, IAC, 240]);
        let mut expect = vec![IAC, 250, 24, 0];
        expect.extend_from_slice(b"ansi");
        expect.extend_from_slice(&[IAC, 240]);
        assert_eq!(wire_out, expect);
    }

    #[test]
    fn test_escaped_iac_in_data() {
        let mut f = framer();
        let (payload, _) = decode(&mut f, &[b'a', IAC, IAC, b'b']);
        assert_eq!(payload, [b'a', 0xFF, b'b']);
    }

    #[test]
    fn test_encode_doubles_iac_in_binary_mode() {
        let mut f = framer();
        decode(&mut f, &[IAC, 253, 0]); // DO BINARY
        assert!(!f.is_ascii());
        let mut wire_out = Vec::new();
        f.encode(&[1, 0xFF, 2], &mut wire_out);
        assert_eq!(wire_out, [1, 0xFF, 0xFF, 2]);
    }

    #[test]
    fn test_encode_cr_nul_in_ascii_mode() {
        let f = framer();
        assert!(f.is_ascii());
        let mut wire_out = Vec::new();
        f.encode(b"a\rb", &mut wire_out);
        assert_eq!(wire_out, b"a\r\0b");
    }

    #[test]
    fn test_encode_preserves_crlf_in_ascii_mode() {
        let f = framer();
        let mut wire_out = Vec::new();
        f.encode(b"a\r\nb", &mut wire_out);
        assert_eq!(wire_out, b"a\r\nb");
    }

    #[test]
    fn test_decode_strips_nul_after_cr_in_ascii_mode() {
        let mut f = framer();
        let (payload, _) = decode(&mut f, b"a\r\0b");
        assert_eq!(payload, b"a\rb");
    }

    #[test]
    fn test_binary_round_trip_is_identity() {
        let mut f = framer();
        decode(&mut f, &[IAC, 253, 0, IAC, 251, 0]); // DO+WILL BINARY
        let original: Vec<u8> = (0..=255).collect();
        let mut wire = Vec::new();
        f.encode(&original, &mut wire);
        let (payload, _) = decode(&mut f, &wire);
        assert_eq!(payload, original);
    }

    #[test]
    fn test_subneg_overflow_dropped() {
        let mut f = framer();
        let mut input = vec![IAC, 250, 24];
        input.extend(std::iter::repeat_n(b'x', SUBNEG_BUFFER_SIZE + 8));
        let (payload, wire_out) = decode(&mut f, &input);
        assert!(wire_out.is_empty());
        // Once the subneg is dropped the trailing bytes become data.
        assert!(!payload.is_empty());
    }

    #[test]
    fn test_eor_and_ga_ignored() {
        let mut f = framer();
        let (payload, wire_out) = decode(&mut f, &[b'x', IAC, 239, b'y', IAC, 249, b'z']);
        assert_eq!(payload, b"xyz");
        assert!(wire_out.is_empty());
    }

    #[test]
    fn test_will_eor_accepted() {
        let mut f = framer();
        let (_, wire_out) = decode(&mut f, &[IAC, 251, 25]);
        assert_eq!(wire_out, [IAC, 253, 25]);
        assert!(f.eor_enabled());
    }

    #[test]
    fn test_will_sga_accepted() {
        let mut f = framer();
        let (_, wire_out) = decode(&mut f, &[IAC, 251, 3]);
        assert_eq!(wire_out, [IAC, 253, 3]);
        assert!(f.suppress_go_ahead());
    }

    #[test]
    fn test_binary_transfer_forces_8bit_framing() {
        let mut f = framer();
        assert!(f.is_ascii());
        f.set_binary_transfer(true);
        assert!(!f.is_ascii());
        let mut wire_out = Vec::new();
        f.encode(&[0xFF, b'\r'], &mut wire_out);
        assert_eq!(wire_out, [0xFF, 0xFF, b'\r']);
        f.set_binary_transfer(false);
        assert!(f.is_ascii());
    }
}
