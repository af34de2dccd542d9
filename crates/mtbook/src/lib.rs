#![warn(clippy::pedantic)]

//! The dialing directory.
//!
//! Entries carry everything a connection needs (address, method,
//! emulation, serial settings, behavior toggles); the store handles the
//! line-oriented file format, atomic saves with a `.bak` sibling, an
//! mtime ownership check, and the tagged-entry redial cycle.

pub mod entry;
pub mod file;
pub mod store;

pub use entry::{Doorway, Method, Parity, PhonebookEntry, SerialSettings, SessionToggles};
pub use store::{Phonebook, PhonebookError};
