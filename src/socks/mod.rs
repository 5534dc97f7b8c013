//! SOCKS4 module for Sockrelay
//!
//! Client side of the SOCKS4 CONNECT exchange plus the endpoint resolver
//! that produces the binary address/port pairs the request carries.

mod consts;
mod handshake;
mod types;

pub use consts::*;
pub use handshake::{build_request, handshake, parse_reply};
pub use types::{resolve_host, resolve_port, Endpoint};
