//! Error types for Sockrelay
//!
//! Every failure in the relay surfaces as a [`RelayError`]. The library never
//! terminates the process itself; the caller decides what a failure means.

use crate::socks::{
    SOCKS4_REPLY_GRANTED, SOCKS4_REPLY_IDENTD_MISMATCH, SOCKS4_REPLY_IDENTD_UNREACHABLE,
    SOCKS4_REPLY_REJECTED,
};
use std::io;
use thiserror::Error;

/// Main error type for Sockrelay operations
#[derive(Error, Debug)]
pub enum RelayError {
    /// IO error (socket create/bind/listen/accept/connect/send/recv)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Host string is not a dotted-quad IPv4 address
    #[error("Invalid IP address `{0}'")]
    InvalidAddress(String),

    /// Port string is not a decimal number in 0..=65535
    #[error("Invalid port `{0}'")]
    InvalidPort(String),

    /// Every port in the listen range is already taken
    #[error("No free port found in range {low}-{high}")]
    NoFreePort {
        /// First port tried
        low: u16,
        /// Last port tried
        high: u16,
    },

    /// SOCKS4 protocol error
    #[error("SOCKS4 error: {0}")]
    Socks4(#[from] Socks4Error),

    /// Timeout error
    #[error("Timeout: {0}")]
    Timeout(String),
}

/// SOCKS4 specific errors
#[derive(Error, Debug)]
pub enum Socks4Error {
    /// Reply did not start with the null version byte
    #[error("Invalid response from proxy (version byte {0:#04x})")]
    InvalidReplyVersion(u8),

    /// Proxy answered with a status other than "granted"
    #[error("Proxy actively denied request: {0}")]
    Denied(Socks4ReplyCode),

    /// User id cannot be NUL-terminated on the wire
    #[error("User id must not contain NUL bytes")]
    InvalidUserId,
}

/// Status codes carried in byte 1 of a SOCKS4 reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Socks4ReplyCode {
    /// Request granted
    Granted,
    /// Request rejected or failed
    Rejected,
    /// Request rejected because the proxy cannot reach identd on the client
    IdentdUnreachable,
    /// Request rejected because identd reported a different user id
    IdentdMismatch,
    /// Status byte outside the SOCKS4 table
    Unknown(u8),
}

impl From<u8> for Socks4ReplyCode {
    fn from(value: u8) -> Self {
        match value {
            SOCKS4_REPLY_GRANTED => Socks4ReplyCode::Granted,
            SOCKS4_REPLY_REJECTED => Socks4ReplyCode::Rejected,
            SOCKS4_REPLY_IDENTD_UNREACHABLE => Socks4ReplyCode::IdentdUnreachable,
            SOCKS4_REPLY_IDENTD_MISMATCH => Socks4ReplyCode::IdentdMismatch,
            other => Socks4ReplyCode::Unknown(other),
        }
    }
}

impl From<Socks4ReplyCode> for u8 {
    fn from(code: Socks4ReplyCode) -> Self {
        match code {
            Socks4ReplyCode::Granted => SOCKS4_REPLY_GRANTED,
            Socks4ReplyCode::Rejected => SOCKS4_REPLY_REJECTED,
            Socks4ReplyCode::IdentdUnreachable => SOCKS4_REPLY_IDENTD_UNREACHABLE,
            Socks4ReplyCode::IdentdMismatch => SOCKS4_REPLY_IDENTD_MISMATCH,
            Socks4ReplyCode::Unknown(other) => other,
        }
    }
}

impl std::fmt::Display for Socks4ReplyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Socks4ReplyCode::Granted => write!(f, "request granted"),
            Socks4ReplyCode::Rejected => write!(f, "request rejected or failed"),
            Socks4ReplyCode::IdentdUnreachable => {
                write!(f, "proxy cannot connect to identd on the client")
            }
            Socks4ReplyCode::IdentdMismatch => write!(f, "identd reported a different user id"),
            Socks4ReplyCode::Unknown(code) => write!(f, "unknown status {:#04x}", code),
        }
    }
}

/// Result alias used throughout the library
pub type Result<T, E = RelayError> = std::result::Result<T, E>;
