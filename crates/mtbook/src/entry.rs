//! Dialing-directory entries.

use bitflags::bitflags;
use strum::{Display, EnumString, IntoStaticStr};

use mtansi::{CodepageId, Emulation};

/// How a connection is established.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
pub enum Method {
    #[default]
    #[strum(serialize = "MODEM")]
    Modem,
    #[strum(serialize = "TELNET")]
    Telnet,
    #[strum(serialize = "SSH")]
    Ssh,
    #[strum(serialize = "RLOGIN")]
    Rlogin,
    #[strum(serialize = "SOCKET")]
    Socket,
    /// A local shell.
    #[strum(serialize = "LOCAL")]
    Shell,
    /// An arbitrary command line.
    #[strum(serialize = "CMDLINE")]
    CommandLine,
}

/// Doorway-mode policy for a connection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
pub enum Doorway {
    #[strum(to_string = "doorway", serialize = "always")]
    Always,
    #[strum(serialize = "mixed")]
    Mixed,
    #[strum(serialize = "never")]
    Never,
    /// Follow the global configuration.
    #[default]
    #[strum(serialize = "config")]
    Config,
}

/// Serial-line parity.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
pub enum Parity {
    #[default]
    #[strum(serialize = "none")]
    None,
    #[strum(serialize = "even")]
    Even,
    #[strum(serialize = "odd")]
    Odd,
    #[strum(serialize = "mark")]
    Mark,
    #[strum(serialize = "space")]
    Space,
}

bitflags! {
    /// Per-entry session behavior toggles, stored as a bitmask.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct SessionToggles: u32 {
        const LINE_WRAP       = 0b0000_0001;
        const DISPLAY_NULL    = 0b0000_0010;
        const ANSI_MUSIC      = 0b0000_0100;
        const ANSI_ANIMATE    = 0b0000_1000;
        const STRIP_8TH_BIT   = 0b0001_0000;
        const HARD_BACKSPACE  = 0b0010_0000;
        const HALF_DUPLEX     = 0b0100_0000;
        const LINE_FEED_ON_CR = 0b1000_0000;
    }
}

/// Modem/serial settings carried per entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    pub baud: u32,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: u8,
    pub xonxoff: bool,
    pub rtscts: bool,
    /// Keep the DTE rate fixed instead of following the modem's
    /// reported connect rate.
    pub lock_dte_baud: bool,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            baud: 115_200,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: 1,
            xonxoff: false,
            rtscts: true,
            lock_dte_baud: false,
        }
    }
}

/// One dialing-directory entry.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PhonebookEntry {
    pub name: String,
    pub address: String,
    pub port: Option<u16>,
    pub username: String,
    pub password: String,
    pub tagged: bool,
    pub doorway: Doorway,
    pub method: Method,
    pub emulation: Emulation,
    pub codepage: CodepageId,
    pub quicklearn: bool,
    pub use_modem_cfg: bool,
    pub use_default_toggles: bool,
    pub toggles: SessionToggles,
    pub serial: SerialSettings,
    pub times_on: u32,
    /// Epoch seconds of the last successful connect.
    pub last_call: u64,
    pub notes: Vec<String>,
    pub script_filename: String,
    pub capture_filename: String,
    pub translate_8bit_filename: String,
    pub translate_unicode_filename: String,
    pub keybindings_filename: String,
}

impl PhonebookEntry {
    #[must_use]
    pub fn new(name: &str, address: &str) -> Self {
        Self {
            name: name.to_owned(),
            address: address.to_owned(),
            use_modem_cfg: true,
            use_default_toggles: true,
            toggles: SessionToggles::LINE_WRAP,
            ..Self::default()
        }
    }

    /// Record a successful connect.
    pub fn note_connect(&mut self, now_seconds: u64) {
        self.times_on += 1;
        self.last_call = now_seconds;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_tokens() {
        assert_eq!("LOCAL".parse::<Method>().unwrap(), Method::Shell);
        assert_eq!("CMDLINE".parse::<Method>().unwrap(), Method::CommandLine);
        assert_eq!(Method::Rlogin.to_string(), "RLOGIN");
    }

    #[test]
    fn test_doorway_accepts_always_alias() {
        assert_eq!("always".parse::<Doorway>().unwrap(), Doorway::Always);
        assert_eq!("doorway".parse::<Doorway>().unwrap(), Doorway::Always);
        assert_eq!(Doorway::Always.to_string(), "doorway");
    }

    #[test]
    fn test_toggles_round_trip_bits() {
        let t = SessionToggles::ANSI_MUSIC | SessionToggles::HARD_BACKSPACE;
        let bits = t.bits();
        assert_eq!(SessionToggles::from_bits_truncate(bits), t);
    }

    #[test]
    fn test_note_connect() {
        let mut entry = PhonebookEntry::new("test", "1-555-0100");
        entry.note_connect(1_700_000_000);
        entry.note_connect(1_700_000_100);
        assert_eq!(entry.times_on, 2);
        assert_eq!(entry.last_call, 1_700_000_100);
    }
}
