//! Conversion traits between TFTP wire fields and byte buffers.

use std::convert::AsRef;
use std::io::{self, ErrorKind};
use std::mem::size_of;
use std::str;

/// Implementors can be parsed from a byte buffer.
pub trait FromBytes: Sized {
    /// The error returned when the buffer does not describe `Self`.
    type Error;

    /// Tries to parse `Self` out of `bytes`.
    fn from_bytes<T: AsRef<[u8]>>(bytes: T) -> Result<Self, Self::Error>;
}

/// Implementors can serialize themselves into a byte buffer.
pub trait IntoBytes {
    /// Consumes `self` and produces its wire representation.
    fn into_bytes(self) -> Vec<u8>;
}

/// A thin wrapper that pairs a wire field with its TFTP encoding rules.
///
/// Two encodings exist on the wire: big-endian `u16` scalars and
/// NUL-terminated strings.
pub struct Bytes<T>(T);

impl<T> Bytes<T> {
    /// Wraps a value for encoding.
    pub fn new(val: T) -> Self {
        Self(val)
    }

    /// Unwraps the inner value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl FromBytes for Bytes<u16> {
    type Error = io::Error;

    fn from_bytes<T: AsRef<[u8]>>(bytes: T) -> io::Result<Self> {
        let bytes = bytes.as_ref();

        if bytes.len() != size_of::<u16>() {
            return Err(ErrorKind::InvalidInput.into());
        }

        let mut bs = [0u8; size_of::<u16>()];
        bs.copy_from_slice(bytes);
        let be = u16::from_be_bytes(bs);

        Ok(Self(be))
    }
}

impl IntoBytes for Bytes<u16> {
    fn into_bytes(self) -> Vec<u8> {
        let bytes = self.0.to_be_bytes();
        bytes.to_vec()
    }
}

impl FromBytes for Bytes<String> {
    type Error = io::Error;

    /// Parses a NUL-terminated string. Bytes past the terminator are
    /// ignored; a missing terminator is a decode error.
    fn from_bytes<T: AsRef<[u8]>>(bytes: T) -> io::Result<Self> {
        let bytes = bytes.as_ref();

        let nul = match bytes.first_nul_idx() {
            Some(idx) => idx,
            None => return Err(ErrorKind::InvalidInput.into()),
        };

        let s = str::from_utf8(&bytes[..nul])
            .map_err(|_| -> io::Error { ErrorKind::InvalidInput.into() })?;

        Ok(Self(s.to_string()))
    }
}

impl IntoBytes for Bytes<String> {
    fn into_bytes(self) -> Vec<u8> {
        let mut bytes = self.0.into_bytes();
        bytes.push(0);
        bytes
    }
}

/// Locates the first NUL byte in a buffer.
pub trait FirstNul {
    /// Returns the index of the first NUL byte, if there is one.
    fn first_nul_idx(&self) -> Option<usize>;
}

impl FirstNul for [u8] {
    fn first_nul_idx(&self) -> Option<usize> {
        self.iter().position(|&b| b == 0)
    }
}
