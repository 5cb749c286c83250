//! The dispatcher: owns the listening socket, classifies incoming
//! datagrams, enforces the read/write policy, and spawns one thread per
//! accepted transfer.

use std::fs::OpenOptions;
use std::io::Result;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use log::{error, info, warn};
use rand::Rng;

use crate::bytes::{FromBytes, IntoBytes};
use crate::connection::Connection;
use crate::packet::*;
use crate::ServerConfig;

/// Session sockets stay above the well-known range.
const MIN_PORT_NUMBER: u16 = 1001;

/// How many random ports to try before giving up on a session.
const BIND_ATTEMPTS: usize = 16;

/// State shared read-only between the dispatcher and every session.
struct Shared {
    config: ServerConfig,
    payload: Vec<u8>,
    write_dir: PathBuf,
}

/// A TFTP server.
///
/// Answers every read request with the one payload it was constructed
/// with and stores accepted write requests under the write directory.
/// Each accepted request runs on its own thread over its own socket; the
/// dispatcher never waits on a transfer.
pub struct Server {
    socket: UdpSocket,
    shared: Arc<Shared>,
}

impl Server {
    /// Binds the listening socket.
    ///
    /// `payload` is the byte sequence served to every read request and
    /// `write_dir` is the directory incoming writes are stored under;
    /// both are fixed for the lifetime of the server.
    pub fn new<A: ToSocketAddrs, P: AsRef<Path>>(
        bind_to: A,
        payload: Vec<u8>,
        write_dir: P,
        config: ServerConfig,
    ) -> Result<Self> {
        let socket = UdpSocket::bind(bind_to)?;

        Ok(Self {
            socket,
            shared: Arc::new(Shared {
                config,
                payload,
                write_dir: write_dir.as_ref().to_path_buf(),
            }),
        })
    }

    /// Like [`Server::new`], but binds to a free port on `host` and
    /// returns it alongside the server.
    pub fn random_port<P: AsRef<Path>>(
        host: &str,
        payload: Vec<u8>,
        write_dir: P,
        config: ServerConfig,
    ) -> Result<(u16, Self)> {
        let server = Self::new((host, 0), payload, write_dir, config)?;
        let port = server.socket.local_addr()?.port();

        Ok((port, server))
    }

    /// Runs the dispatch loop forever.
    ///
    /// Only an I/O error on the listening socket ends the loop; every
    /// per-request problem is logged and the loop moves on.
    pub fn serve(&self) -> Result<()> {
        loop {
            let mut buf = [0; MAX_PACKET_SIZE];
            let (nbytes, client) = self.socket.recv_from(&mut buf)?;
            self.dispatch(&buf[..nbytes], client);
        }
    }

    /// Classifies one datagram and hands it to a session thread.
    ///
    /// Unparseable datagrams are dropped without a reply; requests the
    /// policy forbids are answered with an `IllegalOperation` error
    /// packet from the listening socket.
    fn dispatch(&self, datagram: &[u8], client: SocketAddr) {
        let opcode = match datagram.get(..2).map(Opcode::from_bytes) {
            Some(Ok(opcode)) => opcode,
            _ => {
                warn!("[{}] bad request: unknown opcode", client);
                return;
            }
        };

        match opcode {
            Opcode::Rrq => match Packet::<Rrq>::from_bytes(datagram) {
                Ok(rrq) => {
                    if !self.shared.config.read_allowed() {
                        self.reject(client, "ReadReq is not allowed");
                        return;
                    }

                    let shared = Arc::clone(&self.shared);
                    thread::spawn(move || handle_read(shared, client, rrq));
                }
                Err(error) => warn!("[{}] bad request: {}", client, error),
            },
            Opcode::Wrq => match Packet::<Wrq>::from_bytes(datagram) {
                Ok(wrq) => {
                    if !self.shared.config.write_allowed() {
                        self.reject(client, "WriteReq is not allowed");
                        return;
                    }

                    let shared = Arc::clone(&self.shared);
                    thread::spawn(move || handle_write(shared, client, wrq));
                }
                Err(error) => warn!("[{}] bad request: {}", client, error),
            },
            _ => warn!("[{}] bad request: unexpected {} packet", client, opcode),
        }
    }

    /// Answers a request the policy forbids.
    fn reject(&self, client: SocketAddr, message: &str) {
        info!("[{}] rejected: {}", client, message);

        let error = Packet::error(Code::IllegalOperation, message);
        if let Err(error) = self.socket.send_to(&error.into_bytes()[..], client) {
            warn!("[{}] sending rejection: {}", client, error);
        }
    }
}

/// Opens a fresh socket connected to `client`, the session's transfer
/// identifier.
fn session_socket(client: SocketAddr) -> Result<UdpSocket> {
    let mut rng = rand::thread_rng();

    let mut last_err = None;
    for _ in 0..BIND_ATTEMPTS {
        let port: u16 = rng.gen_range(MIN_PORT_NUMBER, u16::MAX);
        match UdpSocket::bind(("0.0.0.0", port)) {
            Ok(socket) => {
                socket.connect(client)?;
                return Ok(socket);
            }
            Err(error) => last_err = Some(error),
        }
    }

    Err(last_err.unwrap_or_else(|| std::io::ErrorKind::AddrInUse.into()))
}

/// One read transfer: streams the served payload to `client`.
fn handle_read(shared: Arc<Shared>, client: SocketAddr, rrq: Packet<Rrq>) {
    info!("[{}] requested read of {}", client, rrq.body.filename());

    let socket = match session_socket(client) {
        Ok(socket) => socket,
        Err(error) => {
            error!("[{}] opening session socket: {}", client, error);
            return;
        }
    };

    let conn = Connection::new(socket, client, shared.config.retransmission());
    match conn.put(&shared.payload[..]) {
        Ok(block) => info!("[{}] sent {} blocks", client, block),
        Err(error) => error!("[{}] read transfer failed: {}", client, error),
    }
}

/// One write transfer: receives the client's file under the write
/// directory.
fn handle_write(shared: Arc<Shared>, client: SocketAddr, wrq: Packet<Wrq>) {
    info!("[{}] requested write of {}", client, wrq.body.filename());

    let socket = match session_socket(client) {
        Ok(socket) => socket,
        Err(error) => {
            error!("[{}] opening session socket: {}", client, error);
            return;
        }
    };

    /* the write request is acknowledged before the destination file is
     * touched; a creation failure past this point is reported only via
     * log */
    let ack = Packet::ack(Block::new(0));
    if let Err(error) = socket.send(&ack.into_bytes()[..]) {
        error!("[{}] acking write request: {}", client, error);
        return;
    }

    let path = match dest_path(&shared.write_dir, wrq.body.filename()) {
        Some(path) => path,
        None => {
            error!(
                "[{}] refusing write of {:?} outside {}",
                client,
                wrq.body.filename(),
                shared.write_dir.display()
            );
            return;
        }
    };

    let file = match OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&path)
    {
        Ok(file) => file,
        Err(error) => {
            error!("[{}] creating {}: {}", client, path.display(), error);
            return;
        }
    };

    let conn = Connection::new(socket, client, shared.config.retransmission());
    match conn.get(file) {
        Ok((_, block)) => info!(
            "[{}] received {} blocks into {}",
            client,
            block,
            path.display()
        ),
        Err(error) => error!("[{}] write transfer failed: {}", client, error),
    }
}

/// Resolves a requested filename under the write directory. Only the
/// final path component is honored, so a request cannot name a path
/// outside the directory.
fn dest_path(write_dir: &Path, filename: &str) -> Option<PathBuf> {
    let name = Path::new(filename).file_name()?;
    Some(write_dir.join(name))
}
