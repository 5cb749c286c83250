//! Request packets. Read and write requests share one layout: a
//! NUL-terminated filename followed by a NUL-terminated mode string.

use std::io::{self, ErrorKind, Result};
use std::str::FromStr;

use super::mode::Mode;
use crate::bytes::{Bytes, FirstNul, FromBytes, IntoBytes};

mod rrq;
mod wrq;

pub use self::rrq::Rrq;
pub use self::wrq::Wrq;

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Rq {
    pub(crate) filename: String,
    pub(crate) mode: Mode,
}

impl FromBytes for Rq {
    type Error = io::Error;

    fn from_bytes<T: AsRef<[u8]>>(bytes: T) -> Result<Self> {
        let bytes = bytes.as_ref();

        let first_nul = match bytes.first_nul_idx() {
            Some(idx) => idx,
            None => return Err(ErrorKind::InvalidInput.into()),
        };

        /* want to include the nul byte of the filename in its slice */
        let split_at = first_nul + 1;
        let (filename, mode) = bytes.split_at(split_at);
        let filename = Bytes::from_bytes(filename)?;
        let filename: String = filename.into_inner();

        /* the mode string must be properly terminated, but its contents
         * are not validated here; this server transfers everything as
         * octet anyway */
        let mode = Bytes::from_bytes(mode)?;
        let mode: String = mode.into_inner();
        let mode = Mode::from_str(&mode).unwrap_or(Mode::Octet);

        Ok(Self { filename, mode })
    }
}

impl IntoBytes for Rq {
    fn into_bytes(self) -> Vec<u8> {
        let filename = Bytes::new(self.filename).into_bytes();
        let mut mode = self.mode.into_bytes();

        let mut bytes = filename;
        bytes.append(&mut mode);
        bytes
    }
}
