//! The TFTP packet types and their wire codec.
//!
//! Every packet begins with a two byte opcode; the rest of the layout
//! depends on the packet type. `Packet<P>` pairs a body type with its
//! opcode so that encoding always emits the right header and decoding
//! rejects a buffer whose opcode does not match the expected type.

mod ack;
mod data;
mod error;
mod mode;
mod opcode;
mod rq;

pub use self::ack::Ack;
pub use self::data::Data;
pub use self::error::{Code, Error};
pub use self::mode::Mode;
pub use self::opcode::Opcode;
pub use self::rq::{Rrq, Wrq};

use std::fmt;
use std::io::{self, ErrorKind};
use std::mem::size_of;

use crate::bytes::{Bytes, FromBytes, IntoBytes};

/// The largest payload a `Data` packet may carry. A payload shorter than
/// this marks the final block of a transfer.
pub const MAX_PAYLOAD_SIZE: usize = 512;

/// The largest possible TFTP datagram: a four byte header followed by a
/// full `Data` payload. Bounds every receive buffer.
pub const MAX_PACKET_SIZE: usize = MAX_PAYLOAD_SIZE + 4;

pub(crate) mod sealed {
    use super::Opcode;

    pub trait Packet {
        const OPCODE: Opcode;
    }
}

/// A block number. Starts at 1 for the first `Data` packet of a transfer
/// and wraps modulo 65536.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Block(u16);

impl Block {
    /// Creates a `Block` with the given number.
    pub fn new(block: u16) -> Self {
        Self(block)
    }

    /// Returns the raw block number.
    pub fn value(self) -> u16 {
        self.0
    }

    /// The block number that follows this one, wrapping at 65536.
    pub fn wrapping_next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl FromBytes for Block {
    type Error = io::Error;

    fn from_bytes<T: AsRef<[u8]>>(bytes: T) -> io::Result<Self> {
        let block = Bytes::from_bytes(bytes)?;
        Ok(Self(block.into_inner()))
    }
}

impl IntoBytes for Block {
    fn into_bytes(self) -> Vec<u8> {
        Bytes::new(self.0).into_bytes()
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A TFTP packet: a body paired with the opcode header for its type.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Packet<P: sealed::Packet> {
    /// The packet body, everything following the opcode.
    pub body: P,
}

impl Packet<Rrq> {
    /// Creates a read request packet.
    pub fn rrq<T: AsRef<str>>(filename: T, mode: Mode) -> Self {
        Self {
            body: Rrq::new(filename, mode),
        }
    }
}

impl Packet<Wrq> {
    /// Creates a write request packet.
    pub fn wrq<T: AsRef<str>>(filename: T, mode: Mode) -> Self {
        Self {
            body: Wrq::new(filename, mode),
        }
    }
}

impl Packet<Data> {
    /// Creates a data packet.
    pub fn data<T: AsRef<[u8]>>(block: Block, data: T) -> Self {
        Self {
            body: Data::new(block, data),
        }
    }
}

impl Packet<Ack> {
    /// Creates an acknowledgement packet.
    pub fn ack(block: Block) -> Self {
        Self {
            body: Ack { block },
        }
    }
}

impl Packet<Error> {
    /// Creates an error packet.
    pub fn error<T: AsRef<str>>(code: Code, message: T) -> Self {
        Self {
            body: Error::new(code, message),
        }
    }
}

impl<P> FromBytes for Packet<P>
where
    P: sealed::Packet + FromBytes<Error = io::Error>,
{
    type Error = io::Error;

    fn from_bytes<T: AsRef<[u8]>>(bytes: T) -> io::Result<Self> {
        let bytes = bytes.as_ref();

        let split_at = size_of::<u16>();
        if bytes.len() < split_at {
            return Err(ErrorKind::InvalidInput.into());
        }

        let (header, body) = bytes.split_at(split_at);
        let opcode = Opcode::from_bytes(header)?;
        if opcode != P::OPCODE {
            return Err(ErrorKind::InvalidInput.into());
        }

        let body = P::from_bytes(body)?;
        Ok(Self { body })
    }
}

impl<P> IntoBytes for Packet<P>
where
    P: sealed::Packet + IntoBytes,
{
    fn into_bytes(self) -> Vec<u8> {
        let mut bytes = P::OPCODE.into_bytes();
        bytes.append(&mut self.body.into_bytes());
        bytes
    }
}

impl From<Packet<Error>> for io::Error {
    fn from(packet: Packet<Error>) -> io::Error {
        io::Error::new(
            ErrorKind::Other,
            format!("{}: {}", packet.body.code, packet.body.message),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_wraparound() {
        assert_eq!(Block::new(1).wrapping_next(), Block::new(2));
        assert_eq!(Block::new(65535).wrapping_next(), Block::new(0));
    }

    #[test]
    fn test_packet_headers() {
        let ack = Packet::ack(Block::new(9));
        assert_eq!(ack.into_bytes(), vec![0, 4, 0, 9]);

        let data = Packet::data(Block::new(1), b"hi");
        assert_eq!(data.into_bytes(), vec![0, 3, 0, 1, b'h', b'i']);
    }

    #[test]
    fn test_opcode_mismatch_is_rejected() {
        let bytes = Packet::ack(Block::new(1)).into_bytes();
        assert!(Packet::<Data>::from_bytes(&bytes).is_err());
        assert!(Packet::<Ack>::from_bytes(&bytes).is_ok());
    }

    #[test]
    fn test_truncated_packet_is_rejected() {
        assert!(Packet::<Ack>::from_bytes(&[0]).is_err());
        assert!(Packet::<Ack>::from_bytes(&[]).is_err());
        assert!(Packet::<Ack>::from_bytes(&[0, 4, 1]).is_err());
    }

    #[test]
    fn test_error_packet_to_io_error() {
        let bytes = Packet::error(Code::FileNotFound, "gopher.png").into_bytes();
        let packet = Packet::<Error>::from_bytes(&bytes).unwrap();
        let err = io::Error::from(packet);
        assert!(err.to_string().contains("gopher.png"));
    }
}
