//! Test utilities and mocks for Sockrelay
//!
//! This module provides a scripted SOCKS4 proxy and port helpers used across
//! integration tests.

#![allow(dead_code)]

use std::net::{Ipv4Addr, SocketAddr, TcpListener as StdTcpListener};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// How the mock proxy answers a CONNECT request
#[derive(Debug, Clone)]
pub enum ProxyBehavior {
    /// Grant, send `greeting` as the destination, then echo everything
    Grant { greeting: Vec<u8> },
    /// Reply with a valid version byte and the given status
    Deny(u8),
    /// Reply with a non-zero version byte
    BadVersion,
    /// Close the connection after reading the request
    CloseBeforeReply,
}

impl ProxyBehavior {
    /// Grant and echo with no greeting
    pub fn echo() -> Self {
        ProxyBehavior::Grant {
            greeting: Vec::new(),
        }
    }
}

/// A mock SOCKS4 proxy that also plays the destination
pub struct MockProxy {
    /// Address the proxy listens on
    pub addr: SocketAddr,
    /// Number of connections accepted so far
    pub connections: Arc<AtomicUsize>,
    /// Raw CONNECT requests received, in order
    pub requests: Arc<Mutex<Vec<Vec<u8>>>>,
    task: JoinHandle<()>,
}

impl MockProxy {
    /// Start a mock proxy on an ephemeral loopback port
    pub async fn start(behavior: ProxyBehavior) -> Self {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let task = {
            let connections = connections.clone();
            let requests = requests.clone();
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    connections.fetch_add(1, Ordering::SeqCst);
                    let behavior = behavior.clone();
                    let requests = requests.clone();
                    tokio::spawn(async move {
                        let _ = serve_connection(stream, behavior, requests).await;
                    });
                }
            })
        };

        MockProxy {
            addr,
            connections,
            requests,
            task,
        }
    }

    /// Port as a string, the way the relay receives it
    pub fn port_str(&self) -> String {
        self.addr.port().to_string()
    }

    /// Number of connections accepted so far
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Copy of the requests received so far
    pub fn requests(&self) -> Vec<Vec<u8>> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for MockProxy {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve_connection(
    mut stream: TcpStream,
    behavior: ProxyBehavior,
    requests: Arc<Mutex<Vec<Vec<u8>>>>,
) -> std::io::Result<()> {
    let mut request = vec![0u8; 8];
    stream.read_exact(&mut request).await?;
    loop {
        let byte = stream.read_u8().await?;
        request.push(byte);
        if byte == 0 {
            break;
        }
    }
    requests.lock().unwrap().push(request);

    match behavior {
        ProxyBehavior::Grant { greeting } => {
            stream.write_all(&[0x00, 0x5A, 0, 0, 0, 0, 0, 0]).await?;
            stream.write_all(&greeting).await?;
            let (mut reader, mut writer) = stream.split();
            tokio::io::copy(&mut reader, &mut writer).await?;
        }
        ProxyBehavior::Deny(status) => {
            stream.write_all(&[0x00, status, 0, 0, 0, 0, 0, 0]).await?;
        }
        ProxyBehavior::BadVersion => {
            stream.write_all(&[0x04, 0x5A, 0, 0, 0, 0, 0, 0]).await?;
        }
        ProxyBehavior::CloseBeforeReply => {}
    }

    Ok(())
}

/// Find a port that is free right now
pub fn free_port() -> u16 {
    let scratch = StdTcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    scratch.local_addr().unwrap().port()
}

/// Bind `len` consecutive loopback ports and return the first one
///
/// The returned listeners hold the ports; drop individual ones to free them.
pub fn reserve_port_range(len: u16) -> (u16, Vec<StdTcpListener>) {
    let mut base = 42000u16;
    while base < 60000 {
        let held: Vec<_> = (base..base + len)
            .map_while(|port| StdTcpListener::bind((Ipv4Addr::LOCALHOST, port)).ok())
            .collect();
        if held.len() == usize::from(len) {
            return (base, held);
        }
        base += len;
    }
    panic!("no run of {} free ports found", len);
}

/// Connect to a relay listening on `port`
pub async fn connect_relay(port: u16) -> TcpStream {
    TcpStream::connect((Ipv4Addr::LOCALHOST, port)).await.unwrap()
}

/// Upper bound for anything a test waits on
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_port_range() {
        let (base, held) = reserve_port_range(3);
        assert_eq!(held.len(), 3);
        for (i, listener) in held.iter().enumerate() {
            assert_eq!(listener.local_addr().unwrap().port(), base + i as u16);
        }
    }

    #[tokio::test]
    async fn test_mock_proxy_records_request() {
        let proxy = MockProxy::start(ProxyBehavior::echo()).await;
        let mut stream = TcpStream::connect(proxy.addr).await.unwrap();

        stream
            .write_all(&[4, 1, 0, 80, 1, 2, 3, 4, b'x', 0])
            .await
            .unwrap();
        let mut reply = [0u8; 8];
        stream.read_exact(&mut reply).await.unwrap();
        assert_eq!(reply[1], 0x5A);

        stream.write_all(b"ping").await.unwrap();
        let mut buf = [0u8; 4];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");

        assert_eq!(proxy.connection_count(), 1);
        assert_eq!(proxy.requests(), vec![vec![4, 1, 0, 80, 1, 2, 3, 4, b'x', 0]]);
    }
}
