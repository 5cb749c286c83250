//! The per-transfer state machines.
//!
//! A `Connection` owns one dedicated socket that is already connected to
//! the peer; it is the transfer identifier for the session per RFC 1350.
//! `put` drives an outbound (read request) transfer and `get` drives an
//! inbound (write request) transfer.

use std::cmp;
use std::io::{self, ErrorKind, Result, Write};
use std::net::{SocketAddr, UdpSocket};

use log::{debug, warn};

use crate::bytes::{FromBytes, IntoBytes};
use crate::packet::*;
use crate::RetransmissionConfig;

pub struct Connection {
    socket: UdpSocket,
    peer: SocketAddr,
    retransmission: RetransmissionConfig,
}

/// What came back while waiting for an acknowledgement.
enum AckOutcome {
    /// The block we were waiting on was acknowledged.
    Acked,

    /// The read deadline elapsed with no acceptable packet.
    TimedOut,
}

impl Connection {
    /// Creates a `Connection` over `socket`, which must already be
    /// connected to `peer`.
    pub fn new(socket: UdpSocket, peer: SocketAddr, retransmission: RetransmissionConfig) -> Self {
        Self {
            socket,
            peer,
            retransmission,
        }
    }

    /// Streams `payload` to the peer one block at a time, starting at
    /// block 1. Each block is retransmitted on timeout until the
    /// retransmission budget runs out.
    ///
    /// A payload whose length is an exact multiple of the block size is
    /// followed by one empty block, since a short block is the only
    /// end-of-transfer signal the protocol has.
    ///
    /// Returns the number of the final block on success.
    pub fn put(&self, payload: &[u8]) -> Result<Block> {
        self.socket
            .set_read_timeout(Some(self.retransmission.timeout()))?;

        let mut block = Block::new(1);
        let mut cursor = 0;

        loop {
            let end = cmp::min(cursor + MAX_PAYLOAD_SIZE, payload.len());
            let chunk = &payload[cursor..end];
            let bytes = Packet::data(block, chunk).into_bytes();

            self.send_until_acked(&bytes, block)?;

            cursor = end;
            if chunk.len() < MAX_PAYLOAD_SIZE {
                break;
            }
            block = block.wrapping_next();
        }

        Ok(block)
    }

    /// Receives blocks from the peer into `writer`, acknowledging each
    /// one, until a short block arrives. The caller is expected to have
    /// acknowledged the write request itself (ACK block 0) already.
    ///
    /// There is no timeout or retry on this path; a peer that goes
    /// silent parks the session on the blocking receive.
    ///
    /// Returns the writer along with the number of the final block.
    pub fn get<W: Write>(&self, mut writer: W) -> Result<(W, Block)> {
        let mut buf = [0; MAX_PACKET_SIZE];
        let mut last = Block::new(0);

        loop {
            let nbytes = self.socket.recv(&mut buf)?;
            let datagram = &buf[..nbytes];

            if let Ok(error) = Packet::<Error>::from_bytes(datagram) {
                return Err(error.into());
            }

            let data = Packet::<Data>::from_bytes(datagram)?;
            writer.write_all(&data.body.data[..])?;

            let ack = Packet::ack(data.body.block);
            self.socket.send(&ack.into_bytes()[..])?;
            last = data.body.block;

            if data.body.data.len() < MAX_PAYLOAD_SIZE {
                break;
            }
        }

        Ok((writer, last))
    }

    /// Transmits one encoded `Data` packet and waits for its
    /// acknowledgement, retransmitting on every timeout until the budget
    /// is spent.
    fn send_until_acked(&self, data: &[u8], block: Block) -> Result<()> {
        for _ in 0..self.retransmission.retries() {
            self.socket.send(data)?;

            match self.await_ack(block)? {
                AckOutcome::Acked => return Ok(()),
                AckOutcome::TimedOut => continue,
            }
        }

        /* no courtesy error packet here: once the budget is spent the
         * session goes quiet */
        Err(io::Error::new(ErrorKind::TimedOut, "exhausted retries"))
    }

    /// Waits out one read deadline for the acknowledgement of `block`.
    ///
    /// A stale acknowledgement (wrong block number, usually the echo of a
    /// retransmission race) and any undecodable datagram are ignored and
    /// the wait continues; an error packet from the peer fails the
    /// transfer.
    fn await_ack(&self, block: Block) -> Result<AckOutcome> {
        let mut buf = [0; MAX_PACKET_SIZE];

        loop {
            let nbytes = match self.socket.recv(&mut buf) {
                Ok(nbytes) => nbytes,
                Err(error) => {
                    if matches!(error.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) {
                        return Ok(AckOutcome::TimedOut);
                    }
                    return Err(error);
                }
            };
            let datagram = &buf[..nbytes];

            if let Ok(ack) = Packet::<Ack>::from_bytes(datagram) {
                if ack.body.block == block {
                    return Ok(AckOutcome::Acked);
                }
                debug!(
                    "[{}] stale ack for block {} while waiting on block {}",
                    self.peer, ack.body.block, block
                );
            } else if let Ok(error) = Packet::<Error>::from_bytes(datagram) {
                return Err(error.into());
            } else {
                warn!(
                    "[{}] bad packet while waiting for ack of block {}",
                    self.peer, block
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(100);
    const RETRIES: u8 = 3;

    /// Builds a connected (peer socket, connection) pair over loopback.
    fn create_peer_and_connection(retransmission: RetransmissionConfig) -> (UdpSocket, Connection) {
        let peer_sock = UdpSocket::bind("127.0.0.1:0").unwrap();
        let conn_sock = UdpSocket::bind("127.0.0.1:0").unwrap();

        peer_sock.connect(conn_sock.local_addr().unwrap()).unwrap();
        conn_sock.connect(peer_sock.local_addr().unwrap()).unwrap();

        let peer_addr = peer_sock.local_addr().unwrap();
        let conn = Connection::new(conn_sock, peer_addr, retransmission);

        (peer_sock, conn)
    }

    fn recv_data(socket: &UdpSocket) -> Packet<Data> {
        let mut buf = [0; MAX_PACKET_SIZE];
        let nbytes = socket.recv(&mut buf).unwrap();
        Packet::<Data>::from_bytes(&buf[..nbytes]).unwrap()
    }

    fn send_ack(socket: &UdpSocket, block: Block) {
        socket
            .send(&Packet::ack(block).into_bytes()[..])
            .unwrap();
    }

    #[test]
    fn test_put_sends_trailing_empty_block() {
        let config = RetransmissionConfig::new(Duration::from_secs(3), RETRIES);
        let (peer, conn) = create_peer_and_connection(config);

        let payload = vec![0xab; MAX_PAYLOAD_SIZE];
        let sender = std::thread::spawn(move || conn.put(&payload));

        let data = recv_data(&peer);
        assert_eq!(data.body.block, Block::new(1));
        assert_eq!(data.body.data.len(), MAX_PAYLOAD_SIZE);
        send_ack(&peer, Block::new(1));

        let data = recv_data(&peer);
        assert_eq!(data.body.block, Block::new(2));
        assert!(data.body.data.is_empty());
        send_ack(&peer, Block::new(2));

        assert_eq!(sender.join().unwrap().unwrap(), Block::new(2));
    }

    #[test]
    fn test_put_ignores_stale_ack() {
        let config = RetransmissionConfig::new(Duration::from_secs(3), RETRIES);
        let (peer, conn) = create_peer_and_connection(config);

        let sender = std::thread::spawn(move || conn.put(b"hello"));

        let data = recv_data(&peer);
        assert_eq!(data.body.block, Block::new(1));

        /* an ack for a block we never sent must not complete the transfer */
        send_ack(&peer, Block::new(9));
        send_ack(&peer, Block::new(1));

        assert_eq!(sender.join().unwrap().unwrap(), Block::new(1));
    }

    #[test]
    fn test_put_retransmits_on_timeout() {
        let config = RetransmissionConfig::new(TIMEOUT, RETRIES);
        let (peer, conn) = create_peer_and_connection(config);

        let sender = std::thread::spawn(move || conn.put(b"hello"));

        let first = recv_data(&peer);
        assert_eq!(first.body.block, Block::new(1));

        /* don't ack; wait for the retransmission */
        let second = recv_data(&peer);
        assert_eq!(second, first);

        send_ack(&peer, Block::new(1));
        assert_eq!(sender.join().unwrap().unwrap(), Block::new(1));
    }

    #[test]
    fn test_put_gives_up_after_retries() {
        let config = RetransmissionConfig::new(TIMEOUT, 2);
        let (peer, conn) = create_peer_and_connection(config);

        let sender = std::thread::spawn(move || conn.put(b"hello"));

        for _ in 0..2 {
            let data = recv_data(&peer);
            assert_eq!(data.body.block, Block::new(1));
        }

        let error = sender.join().unwrap().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::TimedOut);

        /* the session goes quiet: no retransmission and no error packet */
        peer.set_read_timeout(Some(TIMEOUT * 4)).unwrap();
        peer.recv(&mut [0; MAX_PACKET_SIZE]).unwrap_err();
    }

    #[test]
    fn test_put_fails_on_error_packet() {
        let config = RetransmissionConfig::new(Duration::from_secs(3), RETRIES);
        let (peer, conn) = create_peer_and_connection(config);

        let sender = std::thread::spawn(move || conn.put(b"hello"));

        let _ = recv_data(&peer);
        peer.send(&Packet::error(Code::DiskFull, "disk full").into_bytes()[..])
            .unwrap();

        let error = sender.join().unwrap().unwrap_err();
        assert!(error.to_string().contains("disk full"));
    }

    #[test]
    fn test_get_receives_blocks_in_order() {
        let config = RetransmissionConfig::default();
        let (peer, conn) = create_peer_and_connection(config);

        let receiver = std::thread::spawn(move || conn.get(Vec::new()));

        let full = vec![b'h'; MAX_PAYLOAD_SIZE];
        peer.send(&Packet::data(Block::new(1), &full[..]).into_bytes()[..])
            .unwrap();

        let mut buf = [0; MAX_PACKET_SIZE];
        let nbytes = peer.recv(&mut buf).unwrap();
        let ack = Packet::<Ack>::from_bytes(&buf[..nbytes]).unwrap();
        assert_eq!(ack.body.block, Block::new(1));

        peer.send(&Packet::data(Block::new(2), b"i").into_bytes()[..])
            .unwrap();

        let nbytes = peer.recv(&mut buf).unwrap();
        let ack = Packet::<Ack>::from_bytes(&buf[..nbytes]).unwrap();
        assert_eq!(ack.body.block, Block::new(2));

        let (received, last) = receiver.join().unwrap().unwrap();
        let mut expected = full;
        expected.push(b'i');
        assert_eq!(received, expected);
        assert_eq!(last, Block::new(2));
    }

    #[test]
    fn test_get_fails_on_error_packet() {
        let config = RetransmissionConfig::default();
        let (peer, conn) = create_peer_and_connection(config);

        let receiver = std::thread::spawn(move || conn.get(Vec::new()));

        peer.send(&Packet::error(Code::AccessViolation, "denied").into_bytes()[..])
            .unwrap();

        let error = receiver.join().unwrap().unwrap_err();
        assert!(error.to_string().contains("denied"));
    }

    #[test]
    fn test_get_fails_on_undecodable_packet() {
        let config = RetransmissionConfig::default();
        let (peer, conn) = create_peer_and_connection(config);

        let receiver = std::thread::spawn(move || conn.get(Vec::new()));

        peer.send(b"this is not a tftp packet").unwrap();

        receiver.join().unwrap().unwrap_err();
    }
}
