//! An `Ack` packet acknowledges receipt of a `Data` packet.

use std::io::{self, ErrorKind, Result};
use std::mem::size_of;

use super::Block;
use crate::bytes::{FromBytes, IntoBytes};
use crate::packet::opcode::Opcode;
use crate::packet::sealed::Packet;

/// Acknowledges one block. `Ack` for block 0 acknowledges a write
/// request before any data has been exchanged.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Ack {
    /// The block number being acknowledged.
    pub block: Block,
}

impl Packet for Ack {
    const OPCODE: Opcode = Opcode::Ack;
}

impl FromBytes for Ack {
    type Error = io::Error;

    fn from_bytes<T: AsRef<[u8]>>(bytes: T) -> Result<Self> {
        let bytes = bytes.as_ref();

        let split_at = size_of::<u16>();

        if bytes.len() != split_at {
            return Err(ErrorKind::InvalidInput.into());
        }

        let block = &bytes[..split_at];
        let block = Block::from_bytes(block)?;

        Ok(Self { block })
    }
}

impl IntoBytes for Ack {
    fn into_bytes(self) -> Vec<u8> {
        self.block.into_bytes()
    }
}
