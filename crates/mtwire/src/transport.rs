//! The bytewise transport seam.

use std::fmt;
use std::io::{self, Read, Write};
use std::net::TcpStream;

/// Why a transport operation did not complete.
#[derive(Debug)]
pub enum TransportError {
    /// The peer closed the connection (a read returned 0 bytes).
    Closed,
    /// No data available right now; poll again.
    Again,
    /// An underlying I/O failure.
    Io(io::Error),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Closed => write!(f, "connection closed by peer"),
            TransportError::Again => write!(f, "no data available"),
            TransportError::Io(err) => write!(f, "transport I/O error: {err}"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::WouldBlock {
            TransportError::Again
        } else {
            TransportError::Io(err)
        }
    }
}

/// A connected byte pipe.
///
/// Reads are bounded and may report [`TransportError::Again`]; the main
/// loop treats that as "re-poll", never as failure.
pub trait Transport {
    /// Read available bytes into `buf`.
    ///
    /// # Errors
    ///
    /// [`TransportError::Closed`] when the peer has hung up,
    /// [`TransportError::Again`] when no data is ready.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Write all of `buf`.
    ///
    /// # Errors
    ///
    /// Return an error if the write fails.
    fn write(&mut self, buf: &[u8]) -> Result<(), TransportError>;

    /// Close both directions.
    ///
    /// # Errors
    ///
    /// Return an error if the shutdown fails.
    fn shutdown(&mut self) -> Result<(), TransportError>;
}

impl Transport for TcpStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        match Read::read(self, buf) {
            Ok(0) => Err(TransportError::Closed),
            Ok(n) => Ok(n),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), TransportError> {
        Write::write_all(self, buf)?;
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), TransportError> {
        TcpStream::shutdown(self, std::net::Shutdown::Both)?;
        Ok(())
    }
}
