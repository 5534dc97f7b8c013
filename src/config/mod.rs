//! Configuration module for Sockrelay
//!
//! This module provides configuration types and parsing for the relay.

mod listen;
mod relay;

pub use listen::ListenConfig;
pub use relay::{Config, LaunchConfig, RelayConfig};

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

    parse_config(&content)
}

/// Parse configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).with_context(|| "Failed to parse configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_minimal_config() {
        let config_str = r#"
[relay]
proxy_host = "10.0.0.1"
target_host = "192.168.1.10"
target_port = "3389"
"#;

        let config = parse_config(config_str).unwrap();
        assert_eq!(config.relay.proxy_host.as_deref(), Some("10.0.0.1"));
        assert_eq!(config.relay.proxy_port, "1080");
        assert_eq!(config.relay.target_host, "192.168.1.10");
        assert_eq!(config.relay.target_port, "3389");
        assert_eq!(config.relay.listen, ListenConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let config_str = r#"
[relay]
proxy_host = "10.0.0.1"
proxy_port = "9050"
target_host = "192.168.1.10"
target_port = "5900"
user_id = "vnclaunch"
idle_timeout = 30
buffer_size = 4096
relay_timeout = 600

[relay.listen]
port_low = 21000
port_high = 21099

[launch]
command = "vncviewer @HOSTNAME@::@PORT@"
"#;

        let config = parse_config(config_str).unwrap();
        assert_eq!(config.relay.proxy_port, "9050");
        assert_eq!(config.relay.user_id, "vnclaunch");
        assert_eq!(config.relay.idle_timeout, 30);
        assert_eq!(config.relay.buffer_size, 4096);
        assert_eq!(config.relay.relay_timeout, Some(600));
        assert_eq!(config.relay.listen.port_low, 21000);
        assert_eq!(config.relay.listen.port_high, 21099);
        assert_eq!(
            config.launch.command.as_deref(),
            Some("vncviewer @HOSTNAME@::@PORT@")
        );
    }

    #[test]
    fn test_parse_launch_profile() {
        let config_str = r#"
[relay]
proxy_host = "10.0.0.1"
target_host = "192.168.1.10"

[launch]
command = "xfreerdp /v:@HOSTNAME@:@PORT@ /u:@USERNAME@ /t:@TITLE@"
default_port = "3389"
admin_mode = true

[launch.vars]
USERNAME = "alice"
TITLE = "Build server"
"#;

        let mut config = parse_config(config_str).unwrap();
        assert_eq!(config.launch.default_port.as_deref(), Some("3389"));
        assert!(config.launch.admin_mode);
        assert_eq!(config.launch.vars.len(), 2);
        assert_eq!(config.launch.vars["USERNAME"], "alice");
        assert_eq!(config.launch.vars["TITLE"], "Build server");

        assert!(config.validate().is_err());
        config.apply_defaults();
        assert_eq!(config.relay.target_port, "3389");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config("").unwrap();
        assert!(config.relay.proxy_host.is_none());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_invalid_config() {
        assert!(parse_config("[relay]\nidle_timeout = \"soon\"\n").is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[relay]\ntarget_host = \"1.2.3.4\"\ntarget_port = \"80\"").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.relay.target_host, "1.2.3.4");
        assert_eq!(config.relay.target_port, "80");
    }

    #[test]
    fn test_load_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(dir.path().join("missing.toml"));
        assert!(result.is_err());
    }
}
