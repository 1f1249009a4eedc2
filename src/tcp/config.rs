use std::net::{Ipv4Addr, SocketAddr};

/// Port the debug listener binds to unless configured otherwise
pub const DEFAULT_PORT: u16 = 2300;

/// TCP listener configuration
///
/// # Examples
///
/// ```
/// use netdebug::tcp::TcpConfig;
///
/// let config = TcpConfig {
///     bind_addr: "127.0.0.1:2300".parse().unwrap(),
///     no_delay: true,
///     buffer_size: 256,
/// };
/// assert_eq!(config.bind_addr.port(), 2300);
/// ```
///
/// Using the builder methods:
///
/// ```
/// use netdebug::tcp::TcpConfig;
///
/// let config = TcpConfig::default().with_port(4000).with_no_delay(false);
/// assert_eq!(config.bind_addr.port(), 4000);
/// assert!(!config.no_delay);
/// ```
#[derive(Debug, Clone)]
pub struct TcpConfig {
    /// Address to bind the listener to
    pub bind_addr: SocketAddr,
    /// Disable Nagle's algorithm on accepted connections
    pub no_delay: bool,
    /// Size of each read from the socket into the inbound buffer
    pub buffer_size: usize,
}

impl TcpConfig {
    /// Create a new configuration bound to the given address
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            no_delay: true,
            buffer_size: 1024,
        }
    }

    /// Keep the bind IP, change the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.bind_addr.set_port(port);
        self
    }

    /// Set whether accepted connections use TCP_NODELAY
    pub fn with_no_delay(mut self, no_delay: bool) -> Self {
        self.no_delay = no_delay;
        self
    }

    /// Set the read chunk size
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)))
    }
}
