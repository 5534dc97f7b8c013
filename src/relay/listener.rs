//! Loopback listener allocation
//!
//! Scans a port range on 127.0.0.1 and keeps the first port that binds.

use crate::error::{RelayError, Result};
use crate::helper::{is_addr_in_use, LISTEN_ADDR};
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{SocketAddr, TcpListener as StdTcpListener};
use tokio::net::TcpListener;
use tracing::{debug, info, trace};

/// Only one pending connection matters while a single session is served
pub const LISTEN_BACKLOG: i32 = 1;

/// A listening socket bound to a port taken from the allocation range
#[derive(Debug)]
pub struct BoundListener {
    inner: StdTcpListener,
    port: u16,
}

impl BoundListener {
    /// Port the listener is bound to
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Full local address of the listener
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    /// Hand the socket to the tokio reactor
    ///
    /// Must be called from within a runtime.
    pub fn into_tokio(self) -> io::Result<TcpListener> {
        TcpListener::from_std(self.inner)
    }
}

/// Bind the first free loopback port in `[low, high]`
///
/// A port that is already in use is skipped. Any other bind failure stops
/// the scan, since it points at a problem no other port will avoid.
pub fn allocate_listener(low: u16, high: u16) -> Result<BoundListener> {
    if low == 0 || low > high {
        return Err(RelayError::Config(format!(
            "Invalid listen port range {}-{}",
            low, high
        )));
    }

    for port in low..=high {
        match bind_loopback(port) {
            Ok(inner) => {
                info!("Listening on {}:{}", LISTEN_ADDR, port);
                return Ok(BoundListener { inner, port });
            }
            Err(e) if is_addr_in_use(&e) => {
                trace!("Port {} in use, trying next", port);
            }
            Err(e) => {
                debug!("Cannot bind to address {} port {}: {}", LISTEN_ADDR, port, e);
                return Err(e.into());
            }
        }
    }

    debug!("All ports in {}-{} are taken", low, high);
    Err(RelayError::NoFreePort { low, high })
}

fn bind_loopback(port: u16) -> io::Result<StdTcpListener> {
    let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))?;
    let addr = SocketAddr::from((LISTEN_ADDR, port));

    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;
    socket.set_nonblocking(true)?;

    Ok(socket.into())
}
