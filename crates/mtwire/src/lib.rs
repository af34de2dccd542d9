#![warn(clippy::pedantic)]

//! Network protocol framers.
//!
//! [`telnet::TelnetFramer`] and [`rlogin::RloginFramer`] are pure
//! byte-in/byte-out machines; the [`transport::Transport`] trait is the
//! only place sockets appear.

pub mod rlogin;
pub mod telnet;
pub mod transport;

pub use rlogin::RloginFramer;
pub use telnet::{TelnetCommand, TelnetFramer, TelnetOption};
pub use transport::{Transport, TransportError};
