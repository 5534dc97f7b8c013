//! Endpoint resolution
//!
//! Turns the textual host/port pairs handed over by the caller into the
//! binary form sent in a SOCKS4 request. Only numeric dotted-quad hosts are
//! accepted; there is no DNS lookup anywhere in the relay.

use crate::error::{RelayError, Result};
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

/// Longest possible dotted-quad, `255.255.255.255`
const MAX_HOST_LEN: usize = 15;

/// An IPv4 address and port, fixed once resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    addr: Ipv4Addr,
    port: u16,
}

impl Endpoint {
    /// Create an endpoint from already validated parts
    pub fn new(addr: Ipv4Addr, port: u16) -> Self {
        Endpoint { addr, port }
    }

    /// Resolve a host string and a port string into an endpoint
    pub fn resolve(host: &str, port: &str) -> Result<Self> {
        Ok(Endpoint {
            addr: resolve_host(host)?,
            port: resolve_port(port)?,
        })
    }

    /// Port in host byte order
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Address octets in the order they appear on the wire
    pub fn addr_bytes(&self) -> [u8; 4] {
        self.addr.octets()
    }

    /// Port in network byte order
    pub fn port_bytes(&self) -> [u8; 2] {
        self.port.to_be_bytes()
    }

    /// Socket address for connecting
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.addr, self.port))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.addr, self.port)
    }
}

impl From<SocketAddrV4> for Endpoint {
    fn from(addr: SocketAddrV4) -> Self {
        Endpoint::new(*addr.ip(), addr.port())
    }
}

/// Parse a numeric dotted-quad host
///
/// Any character other than `0-9` and `.` is rejected, so host names never
/// resolve. The text must consist of exactly four non-empty groups, each in
/// the range 0-255.
pub fn resolve_host(text: &str) -> Result<Ipv4Addr> {
    let invalid = || RelayError::InvalidAddress(text.to_string());

    if text.is_empty()
        || text.len() > MAX_HOST_LEN
        || !text.bytes().all(|b| b.is_ascii_digit() || b == b'.')
    {
        return Err(invalid());
    }

    let mut octets = [0u8; 4];
    let mut groups = text.split('.');
    for octet in octets.iter_mut() {
        let group = groups.next().ok_or_else(invalid)?;
        if group.is_empty() {
            return Err(invalid());
        }
        *octet = group.parse::<u8>().map_err(|_| invalid())?;
    }
    if groups.next().is_some() {
        return Err(invalid());
    }

    Ok(Ipv4Addr::from(octets))
}

/// Parse a decimal port number
///
/// Fails on empty input, signs, non-digits and values above 65535.
pub fn resolve_port(text: &str) -> Result<u16> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RelayError::InvalidPort(text.to_string()));
    }

    text.parse::<u16>()
        .map_err(|_| RelayError::InvalidPort(text.to_string()))
}
