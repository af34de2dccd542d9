#![warn(clippy::pedantic)]

//! ANSI/ANSI.SYS terminal emulation.
//!
//! [`AnsiEmulator`] consumes remote bytes one at a time, mutates a
//! [`mtscreen::Screen`], and hands response bytes (DSR, DA) back to the
//! caller. The repertoire is ANSI.SYS plus the small DEC subset found
//! in BBS traffic; see [`emulator`] for the sequence tables.

pub mod codepage;
pub mod emulation;
pub mod emulator;
pub mod music;
pub mod sgr;

pub use codepage::{CodepageId, CodepageTable, Cp437, Latin1};
pub use emulation::Emulation;
pub use emulator::{AnsiEmulator, EmulatorOptions, ParseOutcome, ScanState};
pub use music::MusicSequence;
