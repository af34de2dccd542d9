//! Byte-buffer encoding support for the keystroke encoder.

use core::fmt;

/// The encoding did not fit the caller's buffer. Carries the number of
/// bytes the sequence needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    BufferOverflow(usize),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::BufferOverflow(need) => {
                write!(f, "output buffer too small, need {need} bytes")
            }
        }
    }
}

impl std::error::Error for EncodeError {}

/// Copy a key sequence into the front of `buf`, returning the count
/// written.
///
/// Every sequence a key can produce is a short fixed run (six bytes at
/// most), so a plain copy is the whole encoding layer.
///
/// # Errors
///
/// Return an error if `buf` is shorter than `bytes`.
#[inline]
pub fn write_bytes_into(buf: &mut [u8], bytes: &[u8]) -> Result<usize, EncodeError> {
    if buf.len() < bytes.len() {
        return Err(EncodeError::BufferOverflow(bytes.len()));
    }
    buf[..bytes.len()].copy_from_slice(bytes);
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_bytes_into() {
        let mut buf = [0u8; 8];
        assert_eq!(write_bytes_into(&mut buf, b"\x1b[A"), Ok(3));
        assert_eq!(&buf[..3], b"\x1b[A");
    }

    #[test]
    fn test_empty_write() {
        let mut buf = [0u8; 2];
        assert_eq!(write_bytes_into(&mut buf, b""), Ok(0));
    }

    #[test]
    fn test_overflow_reports_needed_size() {
        let mut buf = [0u8; 2];
        assert_eq!(
            write_bytes_into(&mut buf, b"\x1b[2;2~"),
            Err(EncodeError::BufferOverflow(6))
        );
    }
}
