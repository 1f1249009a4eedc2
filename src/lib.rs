//! A serial-style debug stream backed by a single-client TCP listener.
//!
//! [`NetDebug`] behaves like a UART stream: application code writes bytes,
//! strings or formatted text and polls for input, while the bytes actually
//! travel over whichever TCP client connected last. Output can also be
//! mirrored to a second sink such as stdout.

use thiserror::Error;

/// Error types for the netdebug library
#[derive(Error, Debug)]
pub enum NetDebugError {
    /// TCP-related errors (bind, accept, socket options)
    #[error("TCP error: {0}")]
    Tcp(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The listener is not accepting connections
    #[error("Listener is not accepting connections")]
    NotListening,
}

/// Result type for the netdebug library
pub type Result<T> = std::result::Result<T, NetDebugError>;

pub mod common;
pub mod memory;
pub mod stream;
pub mod tcp;

// Re-export main types for convenience
pub use common::{ByteSink, Listener, ListenerCapabilities, Peer, SharedSink, Stream};
pub use memory::{MemoryClient, MemoryConnector, MemoryListener, MemoryPeer};
pub use stream::{AcceptStrategy, NarrowByte, NetDebug, SerialConfig, StreamConfig};
pub use tcp::{TcpConfig, TcpDebugListener, TcpNetDebug, TcpPeer};
