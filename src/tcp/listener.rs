use super::config::TcpConfig;
use super::peer::TcpPeer;
use super::socket_builder;
use crate::common::{Listener, ListenerCapabilities, Peer};
use crate::Result;
use std::io;
use std::net::{SocketAddr, TcpListener};
use tracing::{info, warn};

/// Debug listener over a non-blocking std `TcpListener`
///
/// The OS accept queue cannot be inspected without accepting, so
/// `has_pending` accepts eagerly and parks the connection until
/// `take_pending` asks for it.
///
/// # Examples
///
/// ```no_run
/// use netdebug::tcp::{TcpConfig, TcpDebugListener};
/// use netdebug::{Listener, NetDebug};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let listener = TcpDebugListener::new(TcpConfig::default().with_port(2300));
///     let mut debug = NetDebug::new(listener);
///     debug.begin()?;
///     debug.print("booting\n");
///     Ok(())
/// }
/// ```
pub struct TcpDebugListener {
    config: TcpConfig,
    listener: Option<TcpListener>,
    parked: Option<TcpPeer>,
}

impl TcpDebugListener {
    /// Creates an unbound listener; nothing is bound until `begin`
    pub fn new(config: TcpConfig) -> Self {
        Self {
            config,
            listener: None,
            parked: None,
        }
    }

    /// Returns the listener configuration
    pub fn config(&self) -> &TcpConfig {
        &self.config
    }

    /// Returns true while the listening socket is open
    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    /// Accepts one connection if the OS has one queued
    fn accept(&mut self) -> Option<TcpPeer> {
        let listener = self.listener.as_ref()?;
        loop {
            match listener.accept() {
                Ok((stream, addr)) => {
                    if let Err(e) = socket_builder::configure_stream(&stream, &self.config) {
                        warn!(peer = %addr, error = %e, "Failed to configure accepted connection, dropping it");
                        return None;
                    }
                    info!(peer = %addr, "Accepted connection");
                    return Some(TcpPeer::new(stream, addr, self.config.buffer_size));
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return None,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(error = %e, "Failed to accept connection");
                    return None;
                }
            }
        }
    }
}

impl Listener for TcpDebugListener {
    type Peer = TcpPeer;

    fn begin(&mut self) -> Result<()> {
        if self.listener.is_some() {
            return Ok(());
        }
        let listener = socket_builder::bind_listener(&self.config)?;
        let address = listener.local_addr()?;
        self.listener = Some(listener);
        info!(%address, "Debug listener started");
        Ok(())
    }

    fn capabilities(&self) -> ListenerCapabilities {
        ListenerCapabilities {
            can_query_pending: true,
            can_close: true,
        }
    }

    fn has_pending(&mut self) -> bool {
        if self.parked.is_none() {
            self.parked = self.accept();
        }
        self.parked.is_some()
    }

    fn take_pending(&mut self) -> Option<TcpPeer> {
        self.parked.take().or_else(|| self.accept())
    }

    fn close(&mut self) {
        if let Some(mut parked) = self.parked.take() {
            parked.close();
        }
        if let Some(listener) = self.listener.take() {
            let address = listener.local_addr().ok();
            drop(listener);
            info!(address = ?address, "Debug listener stopped");
        }
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }
}
