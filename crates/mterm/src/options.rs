//! The command-line surface.

use std::path::PathBuf;

use clap::Parser;

/// Exit code for configuration errors.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for I/O errors while saving.
pub const EXIT_IO_ERROR: u8 = 2;

/// BBS-era terminal core.
#[derive(Debug, Parser)]
#[command(name = "mterm", version, about)]
pub struct CliOptions {
    /// Keyboard macro file to load.
    #[arg(long, value_name = "PATH")]
    pub keyfile: Option<PathBuf>,

    /// 8-bit translate table.
    #[arg(long = "xl8", value_name = "PATH")]
    pub translate_8bit: Option<PathBuf>,

    /// Unicode translate table.
    #[arg(long = "xlu", value_name = "PATH")]
    pub translate_unicode: Option<PathBuf>,

    /// Script to run on startup.
    #[arg(long = "scrfile", value_name = "PATH")]
    pub script_file: Option<PathBuf>,

    /// Dial phonebook entry N immediately (1-based).
    #[arg(long, value_name = "N")]
    pub dial: Option<usize>,

    /// Never write the phonebook back to disk.
    #[arg(long = "read-only")]
    pub read_only: bool,
}
