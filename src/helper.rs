//! Helper utilities for Sockrelay
//!
//! Shared defaults and small conversions used by config and relay code.

use std::io;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Chunk size for the relay copy loop
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Seconds the listener waits for a client before the relay shuts down
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 60;

/// First port tried when allocating the loopback listener
pub const DEFAULT_LISTEN_PORT_LOW: u16 = 20000;

/// Last port tried when allocating the loopback listener
pub const DEFAULT_LISTEN_PORT_HIGH: u16 = 29999;

/// Conventional SOCKS proxy port
pub const DEFAULT_PROXY_PORT: &str = "1080";

/// Interface the relay listens on
pub const LISTEN_ADDR: Ipv4Addr = Ipv4Addr::LOCALHOST;

/// Parse duration from seconds
pub fn duration_from_secs(secs: u64) -> Duration {
    Duration::from_secs(secs)
}

/// Whether a bind failure only means the port is taken
pub fn is_addr_in_use(error: &io::Error) -> bool {
    error.kind() == io::ErrorKind::AddrInUse
}
