//! # Sockrelay - Loopback SOCKS4 Forwarding Relay
//!
//! Sockrelay lets a client that can only dial a plain TCP address reach a
//! destination through an upstream SOCKS4 proxy. It binds a listener on
//! 127.0.0.1, and for each client that connects it opens a connection to the
//! proxy, performs the SOCKS4 CONNECT handshake on the client's behalf and
//! copies bytes in both directions until either side closes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sockrelay::relay::prepare_relay;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let relay = prepare_relay("10.0.0.1", "1080", "192.168.1.10", "3389")?;
//!     println!("connect the viewer to 127.0.0.1:{}", relay.port());
//!
//!     relay.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! Sessions are served strictly one at a time. The relay shuts down by
//! itself once no client has connected for the idle timeout.
//!
//! ```text
//! Viewer -> 127.0.0.1:port (Sockrelay) -> SOCKS4 Proxy -> Target
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod helper;
pub mod launch;
pub mod relay;
pub mod socks;

// Re-export commonly used items
pub use config::{load_config, Config};
pub use error::{RelayError, Socks4Error};
pub use relay::{prepare_relay, Relay, RelayContext};

/// Version of the Sockrelay library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the application, also sent as the SOCKS4 user id
pub const NAME: &str = env!("CARGO_PKG_NAME");
