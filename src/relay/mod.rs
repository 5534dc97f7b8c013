//! Relay module for Sockrelay
//!
//! Setup binds the loopback listener and reports its port; serving runs the
//! sequential accept/handshake/pump loop until the listener goes idle.

mod listener;
mod server;
mod session;

pub use listener::{allocate_listener, BoundListener, LISTEN_BACKLOG};
pub use server::{serve_session, Relay, RelayContext, RelayReport};
pub use session::{pump, SessionStats};

use crate::config::RelayConfig;
use crate::error::Result;

/// Prepare a relay from the four textual endpoint parameters
///
/// Uses the default port range, timeouts and user id. The caller embeds
/// [`Relay::port`] into the client's connection parameters and then awaits
/// [`Relay::run`] once.
pub fn prepare_relay(
    proxy_host: &str,
    proxy_port: &str,
    target_host: &str,
    target_port: &str,
) -> Result<Relay> {
    let config = RelayConfig {
        proxy_host: Some(proxy_host.to_string()),
        proxy_port: proxy_port.to_string(),
        target_host: target_host.to_string(),
        target_port: target_port.to_string(),
        ..Default::default()
    };

    Relay::prepare(&config)
}
