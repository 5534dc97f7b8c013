//! Sockrelay - Loopback SOCKS4 Forwarding Relay
//!
//! This is the main entry point for the Sockrelay application.

use anyhow::{Context, Result};
use clap::Parser;
use sockrelay::config::{load_config, Config};
use sockrelay::launch::{expand_args, launch, spawn, target_replacements, KEY_USERNAME};
use sockrelay::relay::Relay;
use std::path::PathBuf;
use tokio::process::Child;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Sockrelay - reach a host through a SOCKS4 proxy via a loopback listener
#[derive(Parser, Debug)]
#[command(name = "sockrelay")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address of the SOCKS4 proxy to connect through
    #[arg(short = 's', long)]
    proxy_host: Option<String>,

    /// Port of the SOCKS4 proxy (default 1080)
    #[arg(short = 'S', long)]
    proxy_port: Option<String>,

    /// Address of the destination host
    #[arg(short = 't', long)]
    target_host: Option<String>,

    /// Port of the destination host
    #[arg(short = 'P', long)]
    target_port: Option<String>,

    /// User id sent to the proxy
    #[arg(long)]
    user_id: Option<String>,

    /// Seconds to wait for a client before the relay shuts down
    #[arg(long)]
    idle_timeout: Option<u64>,

    /// User name for @USERNAME@
    #[arg(short = 'u', long)]
    username: Option<String>,

    /// Set @ADMINMODE@ to 1
    #[arg(long)]
    admin: bool,

    /// Extra placeholder value, e.g. --var TITLE=db01 (repeatable)
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
    vars: Vec<(String, String)>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable JSON logging format
    #[arg(long)]
    json_log: bool,

    /// Client command; @HOSTNAME@ and @PORT@ are replaced with the relay address
    #[arg(last = true)]
    command: Vec<String>,
}

impl Args {
    /// Command line values take precedence over the configuration file
    fn apply(&self, config: &mut Config) {
        let relay = &mut config.relay;
        if let Some(host) = &self.proxy_host {
            relay.proxy_host = Some(host.clone());
        }
        if let Some(port) = &self.proxy_port {
            relay.proxy_port = port.clone();
        }
        if let Some(host) = &self.target_host {
            relay.target_host = host.clone();
        }
        if let Some(port) = &self.target_port {
            relay.target_port = port.clone();
        }
        if let Some(user_id) = &self.user_id {
            relay.user_id = user_id.clone();
        }
        if let Some(timeout) = self.idle_timeout {
            relay.idle_timeout = timeout;
        }

        let launch = &mut config.launch;
        for (key, value) in &self.vars {
            launch.vars.insert(key.clone(), value.clone());
        }
        if let Some(username) = &self.username {
            launch.vars.insert(KEY_USERNAME.to_string(), username.clone());
        }
        if self.admin {
            launch.admin_mode = true;
        }
    }
}

/// Parse a `KEY=VALUE` placeholder assignment
fn parse_var(text: &str) -> Result<(String, String), String> {
    match text.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got `{}'", text)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    setup_logging(&args.log_level, args.json_log)?;

    // Load configuration
    let mut config = match &args.config {
        Some(path) => {
            let config = load_config(path)?;
            info!("Configuration loaded from: {:?}", path);
            config
        }
        None => Config::default(),
    };
    args.apply(&mut config);
    config.apply_defaults();
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("Invalid configuration")?;

    info!("Sockrelay v{}", sockrelay::VERSION);

    // TITLE is captured here, before HOSTNAME may point at the relay
    let mut replacements = target_replacements(&config);

    let relay = if config.relay.uses_proxy() {
        let relay = Relay::prepare(&config.relay).context("Cannot prepare relay")?;
        replacements.point_at_relay(relay.port());
        Some(relay)
    } else {
        None
    };

    // Start the client
    let child = if !args.command.is_empty() {
        Some(spawn(&expand_args(&args.command, &replacements))?)
    } else if let Some(template) = &config.launch.command {
        Some(launch(template, &replacements)?)
    } else {
        if let Some(relay) = &relay {
            println!("{}", relay.port());
        }
        None
    };

    // Run the relay
    if let Some(relay) = relay {
        tokio::select! {
            result = relay.run() => {
                let report = result.context("Relay failed")?;
                info!(
                    "Relay closed after {} sessions ({} bytes sent, {} bytes received)",
                    report.sessions, report.client_to_upstream, report.upstream_to_client
                );
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                return Err(interrupted(child.as_ref()));
            }
        }
    }

    // Wait for the client to exit
    if let Some(mut child) = child {
        let status = child
            .wait()
            .await
            .context("Cannot wait for application to finish")?;
        info!("Application exited with {}", status);
    }

    Ok(())
}

/// Error for a Ctrl+C shutdown; a running application is left behind
fn interrupted(child: Option<&Child>) -> anyhow::Error {
    if let Some(child) = child {
        warn!("Abandoning application (pid {:?}) without waiting for it", child.id());
    }
    anyhow::anyhow!("Interrupted before the relay finished")
}

/// Setup logging based on configuration
fn setup_logging(level: &str, json: bool) -> Result<()> {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    if json {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .json()
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}
