use crate::common::{PayloadSource, Role, RunConfig, BACKLOG, CHUNK_SIZE};
use crate::error::{Error, Result};
use crate::measure::{Direction, Report, TransferStats};
use std::{
    io::{self, ErrorKind, Read, Write},
    net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpListener, TcpStream},
    time::Duration,
};

use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, info, instrument};

/// Listening socket on the wildcard address with a fixed backlog.
pub fn bind_listener(port: u16) -> Result<TcpListener> {
    let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))
        .map_err(Error::setup("socket"))?;
    socket.set_reuse_address(true).map_err(Error::setup("socket"))?;

    let addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port));
    socket.bind(&addr.into()).map_err(Error::setup("bind"))?;
    socket.listen(BACKLOG).map_err(Error::setup("listen"))?;

    Ok(socket.into())
}

/// Reads until the peer closes its side. Short reads are counted as they come.
pub fn receive_loop<R: Read>(reader: &mut R, stats: &mut TransferStats) -> Result<()> {
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(n) => stats.record(n),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::transfer("receive")(e)),
        }
    }
}

/// Sends chunks drawn from `payload` until `duration` has passed since the
/// stats were started. A chunk in flight at the deadline is finished, but no
/// new one is started. An exhausted payload ends the loop early.
pub fn send_loop<W: Write, P: Read>(
    writer: &mut W,
    payload: &mut P,
    duration: Duration,
    stats: &mut TransferStats,
) -> Result<()> {
    let mut chunk = [0u8; CHUNK_SIZE];
    while stats.elapsed() < duration {
        let n = match payload.read(&mut chunk) {
            Ok(0) => {
                debug!("payload exhausted before deadline");
                break;
            }
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::transfer("payload read")(e)),
        };
        writer.write_all(&chunk[..n]).map_err(Error::transfer("send"))?;
        stats.record(n);
    }
    Ok(())
}

/// Accepts exactly one connection and counts everything it sends.
#[instrument(skip_all)]
pub fn receive(listener: &TcpListener) -> Result<Report> {
    let (mut stream, peer) = listener.accept().map_err(Error::setup("accept"))?;
    info!(%peer, "accepted connection");
    let mut stats = TransferStats::start(Direction::Received);

    receive_loop(&mut stream, &mut stats)?;
    let report = stats.finish();
    drop(stream);

    info!(bytes = report.bytes, "peer closed connection");
    Ok(report)
}

/// Single connection attempt, no retry.
pub fn connect(peer: SocketAddrV4) -> Result<TcpStream> {
    let stream = TcpStream::connect(peer).map_err(Error::setup("connect"))?;
    info!(%peer, "connected");
    Ok(stream)
}

#[instrument(skip(payload))]
pub fn transmit<P: Read>(
    peer: SocketAddrV4,
    duration: Duration,
    payload: &mut P,
) -> Result<Report> {
    let mut stream = connect(peer)?;
    let mut stats = TransferStats::start(Direction::Sent);

    send_loop(&mut stream, payload, duration, &mut stats)?;
    let report = stats.finish();
    drop(stream);

    info!(bytes = report.bytes, "closed connection");
    Ok(report)
}

/// Runs one measurement in the configured role and hands back its report.
pub fn run(config: &RunConfig) -> Result<Report> {
    match config.role {
        Role::Server => {
            let listener = bind_listener(config.port)?;
            info!(port = config.port, "server mode, waiting for a client");
            receive(&listener)
        }
        Role::Client {
            address,
            duration,
            payload,
        } => {
            info!(
                server = %address,
                port = config.port,
                seconds = duration.as_secs(),
                "client mode"
            );
            let peer = SocketAddrV4::new(address, config.port);
            match payload {
                PayloadSource::Zeros => transmit(peer, duration, &mut io::repeat(0)),
                PayloadSource::Stdin => transmit(peer, duration, &mut io::stdin().lock()),
            }
        }
    }
}
