//! The console byte pump.
//!
//! The main loop has exactly two blocking points: a bounded keyboard
//! poll and a bounded transport read. Everything here is the
//! non-blocking half that shuttles bytes between the transport, the
//! session, and back: transport bytes strictly in order, keystroke
//! output and emulator responses flushed FIFO.

use tracing::debug;

use mtinput::KeyEvent;
use mtwire::{Transport, TransportError};

use crate::session::Session;

/// Transport read chunk size.
const READ_CHUNK: usize = 4096;

/// Outcome of one pump iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpStatus {
    /// Bytes were processed.
    Progress,
    /// Nothing pending; the loop may poll the keyboard.
    Idle,
    /// The peer hung up; the session is over.
    Closed,
}

/// Drain one read's worth of transport bytes through the session and
/// flush whatever the session owes the peer.
///
/// # Errors
///
/// Propagates transport write failures; read-side `Again` is mapped to
/// [`PumpStatus::Idle`] and `Closed` to [`PumpStatus::Closed`].
pub fn pump_remote<T: Transport>(
    session: &mut Session,
    transport: &mut T,
) -> Result<PumpStatus, TransportError> {
    let mut buf = [0u8; READ_CHUNK];
    match transport.read(&mut buf) {
        Ok(n) => {
            let wire_out = session.process_remote(&buf[..n]);
            if !wire_out.is_empty() {
                transport.write(&wire_out)?;
            }
            Ok(PumpStatus::Progress)
        }
        Err(TransportError::Again) => Ok(PumpStatus::Idle),
        Err(TransportError::Closed) => {
            debug!("transport closed by peer");
            Ok(PumpStatus::Closed)
        }
        Err(err) => Err(err),
    }
}

/// Encode one keystroke and flush it to the transport.
///
/// # Errors
///
/// Propagates transport write failures.
pub fn send_key<T: Transport>(
    session: &mut Session,
    transport: &mut T,
    event: &KeyEvent,
) -> Result<(), TransportError> {
    let wire = session.process_key(event);
    if !wire.is_empty() {
        transport.write(&wire)?;
    }
    Ok(())
}
