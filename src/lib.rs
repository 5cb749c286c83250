//! The `tftpd` crate implements a Trivial File Transfer Protocol
//! (RFC 1350) server endpoint:
//!
//! * The protocol (types that represent TFTP packets along with their
//!   wire codec).
//! * The per-transfer lock-step state machines for sending and receiving
//!   files one block at a time.
//! * A dispatcher that answers read requests by streaming a configured
//!   in-memory payload and (optionally) accepts write requests that are
//!   stored under a configured directory.
//!
//! This is the classic lock-step variant of the protocol: no option
//! negotiation, no windowing, one outstanding packet per transfer.
//!
//! For more information, please see [THE TFTP PROTOCOL (REVISION 2)](
//! https://tools.ietf.org/html/rfc1350).
//!
//! ## Try it out
//!
//! In one terminal window, start up the server:
//!
//! ```console
//! $ cargo run --example server 0.0.0.0:6655 ./artifacts/alice-in-wonderland.txt /tmp
//! Serving Trivial File Transfer Protocol (TFTP) @ 0.0.0.0:6655
//! ```
//!
//! Then fetch the payload with any TFTP client:
//!
//! ```console
//! $ tftp 0.0.0.0 6655 -m binary -c get alice-in-wonderland.txt
//! ```

#![deny(missing_docs)]

use std::time::Duration;

/// POD struct representing the configuration of the retransmission of
/// packets on the read path.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RetransmissionConfig {
    /// How long to wait for a reply before retransmitting the last packet.
    timeout: Duration,

    /// The transmission budget for a single block: the first transmission
    /// and every retransmission all draw from this count. Exhausting it
    /// fails the transfer.
    retries: u8,
}

impl RetransmissionConfig {
    /// Creates a retransmission config. A `retries` of zero is coerced to
    /// one, since every block must be transmitted at least once.
    pub fn new(timeout: Duration, retries: u8) -> Self {
        Self {
            timeout,
            retries: retries.max(1),
        }
    }

    /// How long to wait for a reply before retransmitting.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The per-block transmission budget.
    pub fn retries(&self) -> u8 {
        self.retries
    }
}

impl Default for RetransmissionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(4),
            retries: 10,
        }
    }
}

/// Process-wide server policy, constructed once and shared read-only by
/// the dispatcher and every transfer session.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ServerConfig {
    read_allowed: bool,
    write_allowed: bool,
    retransmission: RetransmissionConfig,
}

impl ServerConfig {
    /// Whether read requests are served. On by default.
    pub fn allow_read(mut self, allowed: bool) -> Self {
        self.read_allowed = allowed;
        self
    }

    /// Whether write requests are accepted. Off by default.
    pub fn allow_write(mut self, allowed: bool) -> Self {
        self.write_allowed = allowed;
        self
    }

    /// Replaces the read path's retransmission policy.
    pub fn with_retransmission(mut self, retransmission: RetransmissionConfig) -> Self {
        self.retransmission = retransmission;
        self
    }

    /// Returns `true` if read requests are served.
    pub fn read_allowed(&self) -> bool {
        self.read_allowed
    }

    /// Returns `true` if write requests are accepted.
    pub fn write_allowed(&self) -> bool {
        self.write_allowed
    }

    /// The read path's retransmission policy.
    pub fn retransmission(&self) -> RetransmissionConfig {
        self.retransmission
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            read_allowed: true,
            write_allowed: false,
            retransmission: RetransmissionConfig::default(),
        }
    }
}

pub mod bytes;
mod connection;
pub mod packet;
mod server;

pub use server::Server;
