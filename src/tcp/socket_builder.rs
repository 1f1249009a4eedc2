// TCP socket setup for the debug listener
//
// Everything here produces std sockets in non-blocking mode. The adapter is
// polled from a single control loop, so an accept or read that has nothing
// to return must come back immediately with WouldBlock instead of parking
// the loop.
//
// Linux does not carry O_NONBLOCK over from a listening socket to the sockets
// it accepts, so accepted streams are configured explicitly.

use super::config::TcpConfig;
use crate::{NetDebugError, Result};
use std::net::{TcpListener, TcpStream};

/// Bind a non-blocking listener to the configured address
pub fn bind_listener(config: &TcpConfig) -> Result<TcpListener> {
    if config.buffer_size == 0 {
        return Err(NetDebugError::Config(
            "buffer_size must be greater than zero".into(),
        ));
    }

    let listener = TcpListener::bind(config.bind_addr).map_err(|e| {
        NetDebugError::Config(format!(
            "Failed to bind TCP listener on {}: {}",
            config.bind_addr, e
        ))
    })?;

    // Accept must never block the control loop
    listener.set_nonblocking(true)?;

    Ok(listener)
}

/// Prepare a freshly accepted stream for polling
pub fn configure_stream(stream: &TcpStream, config: &TcpConfig) -> Result<()> {
    stream.set_nonblocking(true)?;
    if config.no_delay {
        stream.set_nodelay(true)?;
    }
    Ok(())
}
