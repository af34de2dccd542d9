//! The rlogin framer (BSD rlogin client side).
//!
//! Startup is a four-field NUL-delimited handshake; after the server's
//! single-NUL acknowledgement the stream is 8-bit clean. The server
//! requests the client window size by sending 0x80 out of band; the
//! client answers (and later re-announces resizes) with a 12-byte
//! window-size message.

use tracing::debug;

/// Server-side OOB request for the client window size.
pub const WINDOW_SIZE_REQUEST: u8 = 0x80;

/// The `ss` magic marking a window-size message.
const WINDOW_MAGIC: [u8; 4] = [0xFF, 0xFF, b's', b's'];

/// Per-connection rlogin state.
#[derive(Debug)]
pub struct RloginFramer {
    startup_done: bool,
    sent_window_size: bool,
    /// (rows, columns, x pixels, y pixels).
    window: (u16, u16, u16, u16),
}

impl RloginFramer {
    #[must_use]
    pub fn new(rows: u16, columns: u16) -> Self {
        Self {
            startup_done: false,
            sent_window_size: false,
            window: (rows, columns, 0, 0),
        }
    }

    #[must_use]
    pub fn startup_done(&self) -> bool {
        self.startup_done
    }

    #[must_use]
    pub fn sent_window_size(&self) -> bool {
        self.sent_window_size
    }

    /// Emit the startup handshake:
    /// `NUL local-user NUL remote-user NUL terminal/speed NUL`.
    pub fn start(
        &mut self,
        local_user: &str,
        remote_user: &str,
        terminal: &str,
        baud: u32,
        wire_out: &mut Vec<u8>,
    ) {
        debug!(local_user, remote_user, terminal, baud, "rlogin handshake");
        wire_out.push(0);
        wire_out.extend_from_slice(local_user.as_bytes());
        wire_out.push(0);
        wire_out.extend_from_slice(remote_user.as_bytes());
        wire_out.push(0);
        wire_out.extend_from_slice(terminal.as_bytes());
        wire_out.push(b'/');
        wire_out.extend_from_slice(baud.to_string().as_bytes());
        wire_out.push(0);
    }

    /// Feed incoming in-band bytes. Before the handshake completes the
    /// server owes a single NUL; everything after is payload verbatim.
    pub fn decode(&mut self, input: &[u8], payload: &mut Vec<u8>) {
        let mut rest = input;
        if !self.startup_done {
            match rest.split_first() {
                Some((0, tail)) => {
                    debug!("rlogin handshake acknowledged");
                    self.startup_done = true;
                    rest = tail;
                }
                Some(_) => {
                    // Server skipped the ack (seen from some daemons);
                    // treat the stream as started.
                    self.startup_done = true;
                }
                None => return,
            }
        }
        payload.extend_from_slice(rest);
    }

    /// An out-of-band byte arrived on the urgent channel.
    pub fn handle_oob(&mut self, byte: u8, wire_out: &mut Vec<u8>) {
        if byte == WINDOW_SIZE_REQUEST {
            self.send_window_size(wire_out);
        } else {
            debug!(byte, "ignoring rlogin OOB byte");
        }
    }

    /// The local window changed; announce it unsolicited.
    pub fn resize(&mut self, rows: u16, columns: u16, wire_out: &mut Vec<u8>) {
        self.window.0 = rows;
        self.window.1 = columns;
        if self.startup_done {
            self.send_window_size(wire_out);
        }
    }

    fn send_window_size(&mut self, wire_out: &mut Vec<u8>) {
        let (rows, columns, xpix, ypix) = self.window;
        debug!(rows, columns, "sending rlogin window size");
        wire_out.extend_from_slice(&WINDOW_MAGIC);
        wire_out.extend_from_slice(&rows.to_be_bytes());
        wire_out.extend_from_slice(&columns.to_be_bytes());
        wire_out.extend_from_slice(&xpix.to_be_bytes());
        wire_out.extend_from_slice(&ypix.to_be_bytes());
        self.sent_window_size = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_startup_handshake_bytes() {
        let mut f = RloginFramer::new(24, 80);
        let mut wire = Vec::new();
        f.start("guest", "bbs", "ansi", 19200, &mut wire);
        assert_eq!(wire, b"\0guest\0bbs\0ansi/19200\0");
    }

    #[test]
    fn test_server_ack_consumed() {
        let mut f = RloginFramer::new(24, 80);
        let mut payload = Vec::new();
        f.decode(b"\0Welcome", &mut payload);
        assert!(f.startup_done());
        assert_eq!(payload, b"Welcome");
    }

    #[test]
    fn test_stream_after_ack_is_8bit_clean() {
        let mut f = RloginFramer::new(24, 80);
        let mut payload = Vec::new();
        f.decode(b"\0", &mut payload);
        let data: Vec<u8> = (0..=255).collect();
        f.decode(&data, &mut payload);
        assert_eq!(payload, data);
    }

    #[test]
    fn test_oob_window_size_request() {
        let mut f = RloginFramer::new(24, 80);
        let mut wire = Vec::new();
        f.handle_oob(WINDOW_SIZE_REQUEST, &mut wire);
        assert_eq!(
            wire,
            [0xFF, 0xFF, b's', b's', 0x00, 0x18, 0x00, 0x50, 0, 0, 0, 0]
        );
        assert!(f.sent_window_size());
    }

    #[test]
    fn test_unsolicited_resize() {
        let mut f = RloginFramer::new(24, 80);
        let mut payload = Vec::new();
        f.decode(b"\0", &mut payload);
        let mut wire = Vec::new();
        f.resize(49, 132, &mut wire);
        assert_eq!(
            wire,
            [0xFF, 0xFF, b's', b's', 0x00, 0x31, 0x00, 0x84, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_resize_before_startup_is_deferred() {
        let mut f = RloginFramer::new(24, 80);
        let mut wire = Vec::new();
        f.resize(50, 100, &mut wire);
        assert!(wire.is_empty());
    }

    #[test]
    fn test_other_oob_bytes_ignored() {
        let mut f = RloginFramer::new(24, 80);
        let mut wire = Vec::new();
        f.handle_oob(0x10, &mut wire);
        assert!(wire.is_empty());
    }
}
