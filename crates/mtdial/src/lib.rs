#![warn(clippy::pedantic)]

//! The modem dialer: AT command exchange, CONNECT parsing, and the
//! redial cycle over tagged phonebook entries.

pub mod baud;
pub mod dialer;
pub mod timebase;

pub use baud::{SUPPORTED_DTE_RATES, nearest_dte_rate};
pub use dialer::{
    DialState, Dialer, DialerConfig, DialerEvent, ModemState, TickAction,
};
pub use timebase::{SystemTimebase, Timebase};
