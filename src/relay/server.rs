//! Relay loop
//!
//! Accepts one client at a time on the loopback listener, opens a connection
//! to the upstream proxy, runs the SOCKS4 handshake and pumps bytes until the
//! session ends. The loop returns once the listener has been idle for the
//! configured timeout.

use super::listener::{allocate_listener, BoundListener};
use super::session::{pump, SessionStats};
use crate::config::RelayConfig;
use crate::error::{RelayError, Result};
use crate::helper::{duration_from_secs, DEFAULT_BUFFER_SIZE, DEFAULT_IDLE_TIMEOUT_SECS};
use crate::socks::{handshake, Endpoint};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Fixed parameters shared by every session of one relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayContext {
    /// Upstream SOCKS4 proxy
    pub proxy: Endpoint,
    /// Destination requested from the proxy
    pub target: Endpoint,
    /// User id sent in the CONNECT request
    pub user_id: String,
    /// How long the listener waits for a client before shutting down
    pub idle_timeout: Duration,
    /// Bytes read per relay step
    pub buffer_size: usize,
    /// Optional limit on how long a session may go without traffic
    pub relay_timeout: Option<Duration>,
}

impl RelayContext {
    /// Create a context with default timeouts and buffer size
    pub fn new(proxy: Endpoint, target: Endpoint) -> Self {
        RelayContext {
            proxy,
            target,
            user_id: crate::NAME.to_string(),
            idle_timeout: duration_from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            buffer_size: DEFAULT_BUFFER_SIZE,
            relay_timeout: None,
        }
    }

    /// Resolve endpoints and limits from configuration
    pub fn from_config(config: &RelayConfig) -> Result<Self> {
        let proxy_host = config
            .proxy_host
            .as_deref()
            .ok_or_else(|| RelayError::Config("Missing proxy host".to_string()))?;

        let proxy = Endpoint::resolve(proxy_host, &config.proxy_port)?;
        let target = Endpoint::resolve(&config.target_host, &config.target_port)?;

        Ok(RelayContext::new(proxy, target)
            .with_user_id(config.user_id.clone())
            .with_idle_timeout(duration_from_secs(config.idle_timeout))
            .with_buffer_size(config.buffer_size)
            .with_relay_timeout(config.relay_timeout.map(duration_from_secs)))
    }

    /// Set the SOCKS4 user id
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    /// Set the listener idle timeout
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the relay chunk size
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Set or clear the per-session traffic timeout
    pub fn with_relay_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.relay_timeout = timeout;
        self
    }
}

/// Totals over every session served by one run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelayReport {
    /// Sessions relayed to completion
    pub sessions: u64,
    /// Bytes forwarded from clients to the proxy
    pub client_to_upstream: u64,
    /// Bytes forwarded from the proxy to clients
    pub upstream_to_client: u64,
}

impl RelayReport {
    fn record(&mut self, stats: SessionStats) {
        self.sessions += 1;
        self.client_to_upstream += stats.client_to_upstream;
        self.upstream_to_client += stats.upstream_to_client;
    }
}

/// A prepared relay: endpoints resolved and listener bound
#[derive(Debug)]
pub struct Relay {
    context: RelayContext,
    listener: BoundListener,
}

impl Relay {
    /// Combine a context with an already bound listener
    pub fn new(context: RelayContext, listener: BoundListener) -> Self {
        Relay { context, listener }
    }

    /// Resolve endpoints and bind a listener from configuration
    pub fn prepare(config: &RelayConfig) -> Result<Self> {
        config.validate().map_err(RelayError::Config)?;

        let context = RelayContext::from_config(config)?;
        debug!(
            "Scanning {} candidate ports from {}",
            config.listen.range_len(),
            config.listen.port_low
        );
        let listener = allocate_listener(config.listen.port_low, config.listen.port_high)?;

        info!(
            "Relay on 127.0.0.1:{} forwards to {} via SOCKS4 proxy {}",
            listener.port(),
            context.target,
            context.proxy
        );

        Ok(Relay::new(context, listener))
    }

    /// Port the downstream client should connect to
    pub fn port(&self) -> u16 {
        self.listener.port()
    }

    /// Serve sessions one after another until the listener goes idle
    ///
    /// Returns `Ok` when no client connects within the idle timeout; the
    /// listening socket is closed on return. Any failure while accepting,
    /// connecting upstream, handshaking or relaying ends the run with that
    /// error.
    pub async fn run(self) -> Result<RelayReport> {
        let Relay { context, listener } = self;
        let port = listener.port();
        let listener = listener.into_tokio()?;
        let mut report = RelayReport::default();

        loop {
            let accepted = tokio::time::timeout(context.idle_timeout, listener.accept()).await;
            let (client, peer) = match accepted {
                Err(_) => {
                    info!(
                        "No connection on port {} within {:?}, shutting down",
                        port, context.idle_timeout
                    );
                    break;
                }
                Ok(Err(e)) => {
                    debug!("Cannot accept connection: {}", e);
                    return Err(e.into());
                }
                Ok(Ok(pair)) => pair,
            };

            let stats = serve_session(client, peer, &context).await?;
            report.record(stats);
        }

        drop(listener);
        debug!(
            "Relay finished: {} sessions, {} bytes out, {} bytes in",
            report.sessions, report.client_to_upstream, report.upstream_to_client
        );

        Ok(report)
    }
}

/// Relay one accepted client through the proxy
///
/// Both sockets are closed when this returns, whether or not it succeeds.
pub async fn serve_session(
    mut client: TcpStream,
    peer: SocketAddr,
    context: &RelayContext,
) -> Result<SessionStats> {
    info!("Accepted connection from {}", peer);
    set_nodelay(&client);

    let mut upstream = TcpStream::connect(context.proxy.socket_addr())
        .await
        .map_err(|e| {
            debug!("Cannot connect to proxy {}: {}", context.proxy, e);
            e
        })?;
    set_nodelay(&upstream);

    handshake(&mut upstream, &context.target, &context.user_id).await?;
    info!("SOCKS4 tunnel established to {} via {}", context.target, context.proxy);

    let stats = pump(
        &mut client,
        &mut upstream,
        context.buffer_size,
        context.relay_timeout,
    )
    .await?;

    info!(
        "Connection from {} closed ({} bytes sent, {} bytes received)",
        peer, stats.client_to_upstream, stats.upstream_to_client
    );

    Ok(stats)
}

fn set_nodelay(stream: &TcpStream) {
    if let Err(e) = stream.set_nodelay(true) {
        warn!("Failed to set TCP_NODELAY: {}", e);
    }
}
