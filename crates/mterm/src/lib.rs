#![warn(clippy::pedantic)]

//! The session layer tying the emulation and connection crates
//! together, plus the CLI and environment surface of the `mterm`
//! binary.

pub mod console;
pub mod dial;
pub mod env;
pub mod options;
pub mod session;

pub use console::{PumpStatus, pump_remote, send_key};
pub use dial::{DialCycle, DialOutcome};
pub use options::{CliOptions, EXIT_CONFIG_ERROR, EXIT_IO_ERROR};
pub use session::{DEFAULT_HEIGHT, DEFAULT_WIDTH, Framer, STATUS_HEIGHT, Session};

/// Milliseconds the main loop may stall in either of its two blocking
/// points (keyboard poll, transport read).
pub const KEYBOARD_DELAY_MS: u64 = 10;
