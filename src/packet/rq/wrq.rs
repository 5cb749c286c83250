//! A Write Request indicates that a peer wants to store a file.

use std::io::{self, Result};

use super::Rq;
use crate::bytes::{FromBytes, IntoBytes};
use crate::packet::mode::Mode;
use crate::packet::opcode::Opcode;
use crate::packet::sealed::Packet;

/// A write request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Wrq(pub(crate) Rq);

impl Wrq {
    /// Creates a new `Wrq`.
    pub fn new<T: AsRef<str>>(filename: T, mode: Mode) -> Self {
        let filename = filename.as_ref().to_string();
        Self(Rq { filename, mode })
    }

    /// The filename the peer wants to store.
    pub fn filename(&self) -> &str {
        &self.0.filename
    }

    /// The requested transfer mode.
    pub fn mode(&self) -> Mode {
        self.0.mode
    }
}

impl Packet for Wrq {
    const OPCODE: Opcode = Opcode::Wrq;
}

impl FromBytes for Wrq {
    type Error = io::Error;

    fn from_bytes<T: AsRef<[u8]>>(bytes: T) -> Result<Self> {
        let rq = Rq::from_bytes(bytes)?;

        Ok(Self(rq))
    }
}

impl IntoBytes for Wrq {
    fn into_bytes(self) -> Vec<u8> {
        self.0.into_bytes()
    }
}
