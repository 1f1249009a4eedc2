use std::net::SocketAddr;

use crate::Result;

/// What a listener implementation is able to do
///
/// Network stacks differ in how they expose connection readiness: some can
/// report a waiting client separately from accepting it, others only hand
/// over a socket when asked. Some can also stop listening, others cannot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerCapabilities {
    /// `has_pending` reports waiting clients without handing them over
    pub can_query_pending: bool,
    /// `close` actually stops listening
    pub can_close: bool,
}

impl Default for ListenerCapabilities {
    fn default() -> Self {
        Self {
            can_query_pending: true,
            can_close: true,
        }
    }
}

/// A bound endpoint that hands over inbound connections
///
/// None of these operations may block. Accept failures are logged by the
/// implementation and reported as "nothing pending".
pub trait Listener {
    /// Connected peer type produced by this listener
    type Peer: Peer;

    /// Starts listening; a listener that is already listening stays as it is
    fn begin(&mut self) -> Result<()>;

    /// Describes what this listener supports
    fn capabilities(&self) -> ListenerCapabilities;

    /// Returns true when a new client is waiting, without handing it over
    fn has_pending(&mut self) -> bool;

    /// Hands over a waiting client, if there is one
    fn take_pending(&mut self) -> Option<Self::Peer>;

    /// Stops listening, where supported
    fn close(&mut self);

    /// Address the listener is bound to, if any
    fn local_addr(&self) -> Option<SocketAddr> {
        None
    }
}

/// One connected remote client
pub trait Peer {
    /// True while the connection is open or unread inbound data remains
    fn connected(&mut self) -> bool;

    /// Number of inbound bytes ready to read
    fn available(&mut self) -> usize;

    /// Consumes the next inbound byte
    fn read(&mut self) -> Option<u8>;

    /// Returns the next inbound byte without consuming it
    fn peek(&mut self) -> Option<u8>;

    /// Sends bytes, returns how many were accepted by the transport
    fn write(&mut self, data: &[u8]) -> usize;

    /// Waits until written bytes have been handed to the network
    fn flush(&mut self);

    /// Closes the connection; closing twice is harmless
    fn close(&mut self);

    /// Remote address, if the transport has one
    fn peer_addr(&self) -> Option<SocketAddr> {
        None
    }
}
