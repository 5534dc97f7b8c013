//! SOCKS4 protocol constants
//!
//! Only the client side of CONNECT is implemented.

/// SOCKS4 protocol version
pub const SOCKS4_VERSION: u8 = 0x04;

/// Version byte expected at the start of every reply
pub const SOCKS4_REPLY_VERSION: u8 = 0x00;

// Commands
/// TCP CONNECT command
pub const SOCKS4_CMD_CONNECT: u8 = 0x01;

// Reply codes
/// Request granted
pub const SOCKS4_REPLY_GRANTED: u8 = 0x5A;
/// Request rejected or failed
pub const SOCKS4_REPLY_REJECTED: u8 = 0x5B;
/// Rejected: proxy cannot reach identd on the client
pub const SOCKS4_REPLY_IDENTD_UNREACHABLE: u8 = 0x5C;
/// Rejected: identd user id does not match the request
pub const SOCKS4_REPLY_IDENTD_MISMATCH: u8 = 0x5D;

/// Size of the fixed request header (VN, CD, DSTPORT, DSTIP)
pub const SOCKS4_REQUEST_HEADER_LEN: usize = 8;

/// Size of a reply
pub const SOCKS4_REPLY_LEN: usize = 8;

/// Terminator for the user id field
pub const SOCKS4_USERID_TERMINATOR: u8 = 0x00;
