//! Emulation selection.

use strum::{Display, EnumString, IntoStaticStr};

/// Which emulation a session runs.
///
/// `Ansi` is ANSI.SYS plus the small DEC subset BBS traffic needs.
/// `Ascii` is a transparent pass-through that still dispatches control
/// characters but never interprets escape sequences.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
pub enum Emulation {
    #[default]
    #[strum(serialize = "ansi")]
    Ansi,
    #[strum(serialize = "ascii")]
    Ascii,
}

impl Emulation {
    /// The name reported in telnet TERMINAL-TYPE subnegotiation.
    #[must_use]
    pub fn terminal_name(self) -> &'static str {
        self.into()
    }

    /// Whether escape sequences are interpreted.
    #[must_use]
    pub fn supports_sequences(self) -> bool {
        matches!(self, Emulation::Ansi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(Emulation::Ansi.terminal_name(), "ansi");
        assert_eq!("ascii".parse::<Emulation>().unwrap(), Emulation::Ascii);
    }
}
