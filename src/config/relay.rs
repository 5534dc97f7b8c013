//! Relay configuration types
//!
//! Defines the main configuration structures for Sockrelay.

use super::ListenConfig;
use crate::helper::{DEFAULT_BUFFER_SIZE, DEFAULT_IDLE_TIMEOUT_SECS, DEFAULT_PROXY_PORT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default SOCKS4 proxy port
fn default_proxy_port() -> String {
    DEFAULT_PROXY_PORT.to_string()
}

/// Default SOCKS4 user id, the program name
fn default_user_id() -> String {
    crate::NAME.to_string()
}

/// Default listener idle timeout in seconds
fn default_idle_timeout() -> u64 {
    DEFAULT_IDLE_TIMEOUT_SECS
}

/// Default relay chunk size
fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

/// Root configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Relay configuration
    #[serde(default)]
    pub relay: RelayConfig,

    /// Downstream client launch configuration
    #[serde(default)]
    pub launch: LaunchConfig,
}

impl Config {
    /// Fill values that are derived from other sections
    ///
    /// An empty target port takes the launch profile's default port.
    pub fn apply_defaults(&mut self) {
        if self.relay.target_port.is_empty() {
            if let Some(port) = &self.launch.default_port {
                self.relay.target_port = port.clone();
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.relay.validate()?;
        self.launch.validate()
    }
}

/// Relay configuration
///
/// Hosts and ports are kept as text until the relay resolves them, so a
/// malformed value is reported with the same error whether it came from the
/// file or the command line.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RelayConfig {
    /// Upstream SOCKS4 proxy address; without it no relay is started
    #[serde(default)]
    pub proxy_host: Option<String>,

    /// Upstream SOCKS4 proxy port
    #[serde(default = "default_proxy_port")]
    pub proxy_port: String,

    /// Destination address reached through the proxy
    #[serde(default)]
    pub target_host: String,

    /// Destination port
    #[serde(default)]
    pub target_port: String,

    /// User id sent in the SOCKS4 request
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// Seconds the listener waits for a client before shutting down
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: u64,

    /// Bytes read per relay step
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Seconds a session may go without traffic; unset waits forever
    #[serde(default)]
    pub relay_timeout: Option<u64>,

    /// Listener configuration
    #[serde(default)]
    pub listen: ListenConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig {
            proxy_host: None,
            proxy_port: default_proxy_port(),
            target_host: String::new(),
            target_port: String::new(),
            user_id: default_user_id(),
            idle_timeout: default_idle_timeout(),
            buffer_size: default_buffer_size(),
            relay_timeout: None,
            listen: ListenConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Check if an upstream proxy is configured
    pub fn uses_proxy(&self) -> bool {
        self.proxy_host.is_some()
    }

    /// Validate the configuration
    ///
    /// Only shape is checked here; host and port syntax is checked when the
    /// endpoints are resolved.
    pub fn validate(&self) -> Result<(), String> {
        if self.target_host.is_empty() {
            return Err("Missing target host".to_string());
        }
        if self.target_port.is_empty() {
            return Err("Missing target port".to_string());
        }
        if self.buffer_size == 0 {
            return Err("Buffer size must be greater than zero".to_string());
        }
        if self.idle_timeout == 0 {
            return Err("Idle timeout must be greater than zero".to_string());
        }
        if self.relay_timeout == Some(0) {
            return Err("Relay timeout must be greater than zero when set".to_string());
        }
        if self.user_id.contains('\0') {
            return Err("User id must not contain NUL characters".to_string());
        }
        self.listen.validate()
    }
}

/// Downstream client launch configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct LaunchConfig {
    /// Command line template with `@KEY@` placeholders
    #[serde(default)]
    pub command: Option<String>,

    /// Target port used when none is given, e.g. 3389 for RDP or 5900 for VNC
    #[serde(default)]
    pub default_port: Option<String>,

    /// Sets `@ADMINMODE@` to `1` instead of `0`
    #[serde(default)]
    pub admin_mode: bool,

    /// Extra placeholder values such as `TITLE` or `USERNAME`
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
}

impl LaunchConfig {
    /// Validate the configuration
    ///
    /// `HOSTNAME` and `PORT` always describe where the viewer connects and
    /// cannot be set as variables.
    pub fn validate(&self) -> Result<(), String> {
        for key in self.vars.keys() {
            if key.is_empty() || key.contains('@') {
                return Err(format!("Invalid launch variable name `{}'", key));
            }
            if key == "HOSTNAME" || key == "PORT" {
                return Err(format!("Launch variable `{}' is set by the relay", key));
            }
        }
        if self.command.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err("Launch command is empty".to_string());
        }
        Ok(())
    }
}
