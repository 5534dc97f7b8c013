//! Byte pump for one relayed session
//!
//! Waits for either side to become readable, reads one chunk and writes it
//! unchanged to the other side. The first end-of-stream from either side
//! ends the session.

use crate::error::{RelayError, Result};
use std::fmt;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

/// Byte counters for a finished session
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    /// Bytes read from the client and written upstream
    pub client_to_upstream: u64,
    /// Bytes read from upstream and written to the client
    pub upstream_to_client: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    ClientToUpstream,
    UpstreamToClient,
}

impl Direction {
    fn source(self) -> &'static str {
        match self {
            Direction::ClientToUpstream => "client",
            Direction::UpstreamToClient => "proxy",
        }
    }

    fn sink(self) -> &'static str {
        match self {
            Direction::ClientToUpstream => "proxy",
            Direction::UpstreamToClient => "client",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source(), self.sink())
    }
}

/// Relay bytes between `client` and `upstream` until one side closes
///
/// `buffer_size` bounds each read. With `relay_timeout` set, a session that
/// sees no readable data for that long fails with [`RelayError::Timeout`];
/// without it the wait is unbounded.
pub async fn pump<C, U>(
    client: &mut C,
    upstream: &mut U,
    buffer_size: usize,
    relay_timeout: Option<Duration>,
) -> Result<SessionStats>
where
    C: AsyncRead + AsyncWrite + Unpin,
    U: AsyncRead + AsyncWrite + Unpin,
{
    let mut client_buf = vec![0u8; buffer_size];
    let mut upstream_buf = vec![0u8; buffer_size];
    let mut stats = SessionStats::default();

    loop {
        let ready = read_either(client, upstream, &mut client_buf, &mut upstream_buf);
        let (direction, read) = match relay_timeout {
            Some(limit) => tokio::time::timeout(limit, ready).await.map_err(|_| {
                RelayError::Timeout(format!("no data from either peer for {:?}", limit))
            })?,
            None => ready.await,
        };

        let n = read.map_err(|e| {
            debug!("Cannot read from {}: {}", direction.source(), e);
            e
        })?;

        if n == 0 {
            debug!("{} closed the connection", direction.source());
            break;
        }

        let written = match direction {
            Direction::ClientToUpstream => {
                stats.client_to_upstream += n as u64;
                upstream.write_all(&client_buf[..n]).await
            }
            Direction::UpstreamToClient => {
                stats.upstream_to_client += n as u64;
                client.write_all(&upstream_buf[..n]).await
            }
        };
        written.map_err(|e| {
            debug!("Cannot write to {}: {}", direction.sink(), e);
            e
        })?;

        trace!("{}: {} bytes", direction, n);
    }

    debug!(
        "Session finished: client->proxy {} bytes, proxy->client {} bytes",
        stats.client_to_upstream, stats.upstream_to_client
    );

    Ok(stats)
}

/// Read one chunk from whichever side is readable first
async fn read_either<C, U>(
    client: &mut C,
    upstream: &mut U,
    client_buf: &mut [u8],
    upstream_buf: &mut [u8],
) -> (Direction, std::io::Result<usize>)
where
    C: AsyncRead + Unpin,
    U: AsyncRead + Unpin,
{
    tokio::select! {
        read = client.read(client_buf) => (Direction::ClientToUpstream, read),
        read = upstream.read(upstream_buf) => (Direction::UpstreamToClient, read),
    }
}
