use crate::stream::{NetDebug, StreamConfig};
use crate::tcp::{TcpConfig, TcpDebugListener, TcpNetDebug};
use crate::{NetDebugError, Result};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::{Instant, sleep, timeout};

/// Starts a TCP-backed adapter on an ephemeral loopback port
///
/// Returns the adapter together with the address clients should connect to.
pub fn start_local_adapter(config: StreamConfig) -> Result<(TcpNetDebug, SocketAddr)> {
    let listener = TcpDebugListener::new(TcpConfig::new(SocketAddr::from(([127, 0, 0, 1], 0))));
    let mut debug = NetDebug::with_config(listener, config);
    debug.begin()?;
    let addr = debug
        .local_addr()
        .ok_or_else(|| NetDebugError::Config("Listener has no local address".into()))?;
    Ok((debug, addr))
}

/// Re-evaluates `check` every few milliseconds until it holds or `limit` passes
///
/// The adapter never blocks, so tests drive it by polling while the network
/// catches up.
pub async fn poll_until(limit: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + limit;
    loop {
        if check() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(Duration::from_millis(5)).await;
    }
}

/// Reads from a client socket until `expected` bytes arrived, EOF, or a quiet period
pub async fn read_at_least(stream: &mut TcpStream, expected: usize) -> Result<Vec<u8>> {
    let mut received = Vec::new();
    let mut buffer = [0; 1024];
    while received.len() < expected {
        match timeout(Duration::from_millis(500), stream.read(&mut buffer)).await {
            Ok(Ok(0)) => break, // Connection closed
            Ok(Ok(n)) => received.extend_from_slice(&buffer[..n]),
            Ok(Err(e)) => return Err(NetDebugError::Tcp(e)),
            Err(_) => break, // Timeout, assume done
        }
    }
    Ok(received)
}
