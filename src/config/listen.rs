//! Listener configuration
//!
//! Defines the port range scanned when binding the loopback listener.

use crate::helper::{DEFAULT_LISTEN_PORT_HIGH, DEFAULT_LISTEN_PORT_LOW};
use serde::{Deserialize, Serialize};

/// Default first port of the range
fn default_port_low() -> u16 {
    DEFAULT_LISTEN_PORT_LOW
}

/// Default last port of the range
fn default_port_high() -> u16 {
    DEFAULT_LISTEN_PORT_HIGH
}

/// Loopback listener configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ListenConfig {
    /// First port tried
    #[serde(default = "default_port_low")]
    pub port_low: u16,

    /// Last port tried (inclusive)
    #[serde(default = "default_port_high")]
    pub port_high: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        ListenConfig {
            port_low: default_port_low(),
            port_high: default_port_high(),
        }
    }
}

impl ListenConfig {
    /// Number of ports in the range
    pub fn range_len(&self) -> usize {
        if self.port_high < self.port_low {
            0
        } else {
            usize::from(self.port_high - self.port_low) + 1
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.port_low > self.port_high {
            return Err(format!(
                "Listen port range is empty: {} > {}",
                self.port_low, self.port_high
            ));
        }
        if self.port_low == 0 {
            return Err("Listen port range must not include port 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listen_config_default() {
        let config = ListenConfig::default();
        assert_eq!(config.port_low, 20000);
        assert_eq!(config.port_high, 29999);
        assert_eq!(config.range_len(), 10000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_listen_config_single_port() {
        let config = ListenConfig {
            port_low: 25000,
            port_high: 25000,
        };
        assert_eq!(config.range_len(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_listen_config_validate() {
        let config = ListenConfig {
            port_low: 30000,
            port_high: 20000,
        };
        assert_eq!(config.range_len(), 0);
        assert!(config.validate().is_err());

        let config = ListenConfig {
            port_low: 0,
            port_high: 10,
        };
        assert!(config.validate().is_err());
    }
}
