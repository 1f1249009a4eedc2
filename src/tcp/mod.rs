pub mod config;
pub mod listener;
pub mod peer;
pub mod socket_builder;

pub use config::{TcpConfig, DEFAULT_PORT};
pub use listener::TcpDebugListener;
pub use peer::TcpPeer;

// Type alias for the stream adapter running over a TCP listener
pub type TcpNetDebug = crate::stream::NetDebug<TcpDebugListener>;
