//! An `Error` packet is a courtesy packet sent prior to terminating a
//! transfer due to an unrecoverable error.

use std::fmt;
use std::io::{self, ErrorKind, Result};
use std::mem::size_of;

use crate::bytes::{Bytes, FromBytes, IntoBytes};
use crate::packet::opcode::Opcode;
use crate::packet::sealed::Packet;

/// The error conditions that can be reached during a TFTP transfer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Code {
    /// Not defined, see error message (if any).
    NotDefined = 0,

    /// File not found.
    FileNotFound = 1,

    /// Access violation.
    AccessViolation = 2,

    /// Disk full or allocation exceeded.
    DiskFull = 3,

    /// Illegal TFTP operation.
    IllegalOperation = 4,

    /// Unknown transfer ID.
    UnknownTid = 5,

    /// File already exists.
    FileAlreadyExists = 6,

    /// No such user.
    NoSuchUser = 7,
}

impl Code {
    /// Tries to produce a `Code` from a `u16`.
    pub fn from_u16(val: u16) -> Result<Self> {
        Ok(match val {
            v if v == Code::NotDefined as u16 => Code::NotDefined,
            v if v == Code::FileNotFound as u16 => Code::FileNotFound,
            v if v == Code::AccessViolation as u16 => Code::AccessViolation,
            v if v == Code::DiskFull as u16 => Code::DiskFull,
            v if v == Code::IllegalOperation as u16 => Code::IllegalOperation,
            v if v == Code::UnknownTid as u16 => Code::UnknownTid,
            v if v == Code::FileAlreadyExists as u16 => Code::FileAlreadyExists,
            v if v == Code::NoSuchUser as u16 => Code::NoSuchUser,
            _ => return Err(ErrorKind::InvalidInput.into()),
        })
    }

    /// A canonical human readable description of the error condition.
    pub fn as_str(self) -> &'static str {
        match self {
            Code::NotDefined => "Not defined",
            Code::FileNotFound => "File not found",
            Code::AccessViolation => "Access violation",
            Code::DiskFull => "Disk full or allocation exceeded",
            Code::IllegalOperation => "Illegal TFTP operation",
            Code::UnknownTid => "Unknown transfer ID",
            Code::FileAlreadyExists => "File already exists",
            Code::NoSuchUser => "No such user",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The body of an error packet: an integer code and a human readable
/// message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Error {
    /// An integer code that describes the error.
    pub code: Code,

    /// A human readable description of the error.
    pub message: String,
}

impl Error {
    /// Creates an `Error` packet body.
    pub fn new<T: AsRef<str>>(code: Code, message: T) -> Self {
        Self {
            code,
            message: message.as_ref().to_string(),
        }
    }
}

impl Packet for Error {
    const OPCODE: Opcode = Opcode::Error;
}

impl FromBytes for Error {
    type Error = io::Error;

    fn from_bytes<T: AsRef<[u8]>>(bytes: T) -> Result<Self> {
        let bytes = bytes.as_ref();

        let split_at = size_of::<u16>();
        if split_at > bytes.len() {
            return Err(ErrorKind::InvalidInput.into());
        }

        let (code, message) = bytes.split_at(split_at);
        let code = Bytes::from_bytes(code)?;
        let code = Code::from_u16(code.into_inner())?;
        let message = Bytes::from_bytes(message)?;
        let message: String = message.into_inner();

        Ok(Self { code, message })
    }
}

impl IntoBytes for Error {
    fn into_bytes(self) -> Vec<u8> {
        let mut bytes = Bytes::new(self.code as u16).into_bytes();
        bytes.append(&mut Bytes::new(self.message).into_bytes());
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_conversions() {
        assert_eq!(Code::from_u16(0).unwrap(), Code::NotDefined);
        assert_eq!(Code::from_u16(4).unwrap(), Code::IllegalOperation);
        assert_eq!(Code::from_u16(7).unwrap(), Code::NoSuchUser);
        assert!(Code::from_u16(8).is_err());
    }

    #[test]
    fn test_error_round_trip() {
        let err = Error::new(Code::FileNotFound, "gopher.png");
        let bytes = err.into_bytes();
        assert_eq!(&bytes[..2], &[0, 1]);
        assert_eq!(*bytes.last().unwrap(), 0);

        let err = Error::from_bytes(&bytes).unwrap();
        assert_eq!(err.code, Code::FileNotFound);
        assert_eq!(err.message, "gopher.png");
    }

    #[test]
    fn test_error_requires_terminator() {
        assert!(Error::from_bytes(b"\x00\x01no terminator").is_err());
        assert!(Error::from_bytes(&[0]).is_err());
    }
}
