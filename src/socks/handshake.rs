//! SOCKS4 CONNECT handshake
//!
//! Builds the request for one destination endpoint, sends it to the upstream
//! proxy and validates the fixed-size reply.

use super::consts::*;
use super::types::Endpoint;
use crate::error::{Result, Socks4Error, Socks4ReplyCode};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

/// Assemble a CONNECT request
///
/// Layout: `VN CD DSTPORT(2) DSTIP(4) USERID NUL`.
pub fn build_request(target: &Endpoint, user_id: &str) -> Result<Vec<u8>> {
    if user_id.as_bytes().contains(&SOCKS4_USERID_TERMINATOR) {
        return Err(Socks4Error::InvalidUserId.into());
    }

    let mut request = Vec::with_capacity(SOCKS4_REQUEST_HEADER_LEN + user_id.len() + 1);
    request.push(SOCKS4_VERSION);
    request.push(SOCKS4_CMD_CONNECT);
    request.extend_from_slice(&target.port_bytes());
    request.extend_from_slice(&target.addr_bytes());
    request.extend_from_slice(user_id.as_bytes());
    request.push(SOCKS4_USERID_TERMINATOR);

    Ok(request)
}

/// Validate a reply
///
/// Only the first two bytes matter; DSTPORT and DSTIP are ignored.
pub fn parse_reply(reply: &[u8; SOCKS4_REPLY_LEN]) -> Result<()> {
    if reply[0] != SOCKS4_REPLY_VERSION {
        return Err(Socks4Error::InvalidReplyVersion(reply[0]).into());
    }

    match Socks4ReplyCode::from(reply[1]) {
        Socks4ReplyCode::Granted => Ok(()),
        code => Err(Socks4Error::Denied(code).into()),
    }
}

/// Perform the CONNECT exchange on an already connected upstream stream
///
/// A proxy that closes the connection before sending a complete reply
/// yields an IO error of kind `UnexpectedEof`.
pub async fn handshake<S>(stream: &mut S, target: &Endpoint, user_id: &str) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = build_request(target, user_id)?;
    stream.write_all(&request).await?;
    stream.flush().await?;

    debug!("Sent SOCKS4 CONNECT for {} ({} bytes)", target, request.len());

    let mut reply = [0u8; SOCKS4_REPLY_LEN];
    stream.read_exact(&mut reply).await?;

    if let Err(e) = parse_reply(&reply) {
        warn!("Proxy refused CONNECT to {}: {}", target, e);
        return Err(e);
    }

    debug!("SOCKS4 CONNECT to {} granted", target);
    Ok(())
}
