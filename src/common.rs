use std::net::Ipv4Addr;
use std::time::Duration;

use clap::{ArgAction, ArgGroup, Parser};
use tracing::warn;

use crate::error::{Error, Result};

/// Bytes per send/receive call.
pub const CHUNK_SIZE: usize = 1000;
/// Pending connections the server's listening socket will queue.
pub const BACKLOG: i32 = 10;

pub fn setup_tracing() {
    use tracing_subscriber::fmt::Subscriber;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout belongs to the report
    Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None, disable_help_flag = true)]
#[command(group(ArgGroup::new("mode").required(true).args(["client", "server"])))]
pub struct Args {
    /// Run as client, streaming data to the server
    #[arg(short, long)]
    client: bool,
    /// Run as server, accepting one connection
    #[arg(short, long)]
    server: bool,
    /// Server IPv4 address (client only)
    #[arg(short = 'h', long, value_name = "server address")]
    host: Option<String>,
    /// Port to listen on or connect to
    #[arg(short, long, value_name = "port number", allow_negative_numbers = true)]
    port: Option<i64>,
    /// Seconds to send for (client only)
    #[arg(
        short = 't',
        long,
        value_name = "duration in seconds",
        allow_negative_numbers = true
    )]
    time: Option<i64>,
    /// Send chunks read from standard input instead of zeros (client only)
    #[arg(long)]
    stdin: bool,
    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

/// Where the client's chunk contents come from. The bytes are never inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadSource {
    #[default]
    Zeros,
    Stdin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Server,
    Client {
        address: Ipv4Addr,
        duration: Duration,
        payload: PayloadSource,
    },
}

/// Validated run parameters, built once from [`Args`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub role: Role,
    pub port: u16,
}

impl RunConfig {
    pub fn server(port: u16) -> Self {
        Self {
            role: Role::Server,
            port,
        }
    }

    pub fn client(address: Ipv4Addr, port: u16, duration: Duration) -> Self {
        Self {
            role: Role::Client {
                address,
                duration,
                payload: PayloadSource::Zeros,
            },
            port,
        }
    }

    pub fn with_payload(mut self, source: PayloadSource) -> Self {
        if let Role::Client { payload, .. } = &mut self.role {
            *payload = source;
        }
        self
    }
}

impl Args {
    pub fn into_config(self) -> Result<RunConfig> {
        let port = self
            .port
            .ok_or_else(|| Error::Usage("-p <port> is required".into()))
            .and_then(validate_port)?;

        if self.server {
            if self.host.is_some() || self.time.is_some() || self.stdin {
                warn!("-h, -t and --stdin are ignored in server mode");
            }
            return Ok(RunConfig::server(port));
        }

        let host = self
            .host
            .ok_or_else(|| Error::Usage("client mode requires -h <server address>".into()))?;
        let address = host
            .parse::<Ipv4Addr>()
            .map_err(|_| Error::Usage(format!("{host:?} is not an IPv4 address")))?;
        let duration = self
            .time
            .ok_or_else(|| Error::Usage("client mode requires -t <duration>".into()))
            .and_then(validate_duration)?;

        let payload = if self.stdin {
            PayloadSource::Stdin
        } else {
            PayloadSource::Zeros
        };
        Ok(RunConfig::client(address, port, duration).with_payload(payload))
    }
}

pub fn validate_port(port: i64) -> Result<u16> {
    u16::try_from(port)
        .ok()
        .filter(|&p| p != 0)
        .ok_or_else(|| Error::Usage(format!("port {port} not in range 1..=65535")))
}

pub fn validate_duration(secs: i64) -> Result<Duration> {
    u64::try_from(secs)
        .map(Duration::from_secs)
        .map_err(|_| Error::Usage(format!("duration {secs} must not be negative")))
}
