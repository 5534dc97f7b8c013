//! Downstream client launching
//!
//! The viewer command is a template with `@KEY@` placeholders. Once the relay
//! has a port, `HOSTNAME` and `PORT` are pointed at the loopback listener and
//! the expanded command is started.

use crate::config::Config;
use crate::error::{RelayError, Result};
use crate::helper::LISTEN_ADDR;
use tokio::process::{Child, Command};
use tracing::{debug, info};

/// Placeholder for the host the client should dial
pub const KEY_HOSTNAME: &str = "HOSTNAME";

/// Placeholder for the port the client should dial
pub const KEY_PORT: &str = "PORT";

/// Placeholder for the viewer window title
pub const KEY_TITLE: &str = "TITLE";

/// Placeholder for the user name handed to the viewer
pub const KEY_USERNAME: &str = "USERNAME";

/// Placeholder set to `1` in admin mode and `0` otherwise
pub const KEY_ADMINMODE: &str = "ADMINMODE";

/// Ordered set of placeholder values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Replacements {
    entries: Vec<(String, String)>,
}

impl Replacements {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, replacing any previous value for `key`
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    /// Value for `key`, if set
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Point `HOSTNAME` and `PORT` at the loopback relay
    pub fn point_at_relay(&mut self, port: u16) -> &mut Self {
        self.set(KEY_HOSTNAME, LISTEN_ADDR.to_string())
            .set(KEY_PORT, port.to_string())
    }
}

/// Placeholder values for a viewer connecting straight to the target
///
/// Launch variables are applied first. `TITLE` falls back to the target host
/// so it keeps naming the real destination after [`Replacements::point_at_relay`].
pub fn target_replacements(config: &Config) -> Replacements {
    let mut replacements = Replacements::new();
    for (key, value) in &config.launch.vars {
        replacements.set(key.as_str(), value.as_str());
    }
    if replacements.get(KEY_TITLE).is_none() {
        replacements.set(KEY_TITLE, config.relay.target_host.as_str());
    }

    let admin_mode = if config.launch.admin_mode { "1" } else { "0" };
    replacements
        .set(KEY_ADMINMODE, admin_mode)
        .set(KEY_HOSTNAME, config.relay.target_host.as_str())
        .set(KEY_PORT, config.relay.target_port.as_str());
    replacements
}

/// Substitute `@KEY@` tokens in `line`
///
/// Tokens are matched left to right. A token naming an unknown key is kept
/// verbatim and its closing `@` does not start another token.
pub fn expand_template(line: &str, replacements: &Replacements) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;

    while let Some(start) = rest.find('@') {
        let after = &rest[start + 1..];
        let Some(len) = after.find('@') else {
            break;
        };

        out.push_str(&rest[..start]);
        match replacements.get(&after[..len]) {
            Some(value) => out.push_str(value),
            None => out.push_str(&rest[start..start + len + 2]),
        }
        rest = &after[len + 1..];
    }

    out.push_str(rest);
    out
}

/// Split a command line into program and arguments
///
/// Whitespace separates arguments; double quotes group text containing
/// whitespace and are removed.
pub fn split_command(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_arg = false;
    let mut quoted = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                in_arg = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            c => {
                current.push(c);
                in_arg = true;
            }
        }
    }
    if in_arg {
        args.push(current);
    }

    args
}

/// Expand every argument of an already split command
pub fn expand_args(args: &[String], replacements: &Replacements) -> Vec<String> {
    args.iter()
        .map(|arg| expand_template(arg, replacements))
        .collect()
}

/// Start a program from expanded arguments
pub fn spawn(args: &[String]) -> Result<Child> {
    let (program, rest) = args
        .split_first()
        .ok_or_else(|| RelayError::Config("Empty launch command".to_string()))?;

    let child = Command::new(program).args(rest).spawn().map_err(|e| {
        debug!("Cannot start application `{}': {}", program, e);
        e
    })?;

    info!("Started {} (pid {:?})", program, child.id());
    Ok(child)
}

/// Expand a command line template and start it
pub fn launch(template: &str, replacements: &Replacements) -> Result<Child> {
    let expanded = expand_template(template, replacements);
    spawn(&split_command(&expanded))
}
