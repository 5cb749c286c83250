use std::env;
use std::fs;
use std::process;

use tftpd::{Server, ServerConfig};

fn main() {
    fern::Dispatch::new()
        .level(log::LevelFilter::Info)
        .chain(std::io::stdout())
        .apply()
        .expect("failed to initialize logger");

    let mut args = env::args().skip(1);
    let (addr, payload_path, write_dir) = match (args.next(), args.next(), args.next()) {
        (Some(addr), Some(payload), Some(dir)) => (addr, payload, dir),
        _ => {
            eprintln!("usage: ./server address:port payload-file write-dir [--allow-write]");
            process::exit(1);
        }
    };
    let allow_write = args.any(|arg| arg == "--allow-write");

    let payload = fs::read(&payload_path).expect("couldn't read payload file");
    let config = ServerConfig::default().allow_write(allow_write);

    let server = Server::new(&addr, payload, write_dir, config).expect("couldn't bind to address");
    log::info!("Serving Trivial File Transfer Protocol (TFTP) @ {}", addr);

    if let Err(error) = server.serve() {
        log::error!("listener failed: {}", error);
        process::exit(1);
    }
}
