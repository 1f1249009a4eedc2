//! In-process loopback transport
//!
//! The memory transport implements [`Listener`] and [`Peer`] without any
//! sockets, which makes adapter behaviour fully deterministic. Tests and
//! benchmarks open clients through a [`MemoryConnector`] and inspect what the
//! adapter sent them through [`MemoryClient`].
//!
//! # Examples
//!
//! ```
//! use netdebug::{MemoryListener, NetDebug};
//!
//! let listener = MemoryListener::new();
//! let connector = listener.connector();
//! let mut debug = NetDebug::new(listener);
//! debug.begin().unwrap();
//!
//! let client = connector.connect().unwrap();
//! debug.available();
//! debug.print("ready");
//! assert_eq!(client.take_received(), b"Hi!\r\nready");
//! ```

use crate::common::{Listener, ListenerCapabilities, Peer};
use crate::{NetDebugError, Result};
use bytes::{Buf, BytesMut};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

#[derive(Debug, Default)]
struct Pipe {
    to_server: BytesMut,
    to_client: BytesMut,
    client_open: bool,
    server_open: bool,
    fail_writes: bool,
}

#[derive(Default)]
struct Backlog {
    listening: bool,
    queue: VecDeque<MemoryPeer>,
    opened: usize,
}

/// Listener side of the loopback transport
pub struct MemoryListener {
    capabilities: ListenerCapabilities,
    backlog: Rc<RefCell<Backlog>>,
}

impl MemoryListener {
    /// Creates a listener that supports every capability
    pub fn new() -> Self {
        Self::with_capabilities(ListenerCapabilities::default())
    }

    /// Creates a listener that behaves like a more limited network stack
    pub fn with_capabilities(capabilities: ListenerCapabilities) -> Self {
        Self {
            capabilities,
            backlog: Rc::new(RefCell::new(Backlog::default())),
        }
    }

    /// Returns a handle that opens client connections to this listener
    pub fn connector(&self) -> MemoryConnector {
        MemoryConnector {
            backlog: Rc::clone(&self.backlog),
        }
    }

    /// Number of connections waiting to be handed over
    pub fn pending_count(&self) -> usize {
        self.backlog.borrow().queue.len()
    }
}

impl Default for MemoryListener {
    fn default() -> Self {
        Self::new()
    }
}

impl Listener for MemoryListener {
    type Peer = MemoryPeer;

    fn begin(&mut self) -> Result<()> {
        self.backlog.borrow_mut().listening = true;
        Ok(())
    }

    fn capabilities(&self) -> ListenerCapabilities {
        self.capabilities
    }

    fn has_pending(&mut self) -> bool {
        self.capabilities.can_query_pending && !self.backlog.borrow().queue.is_empty()
    }

    fn take_pending(&mut self) -> Option<MemoryPeer> {
        self.backlog.borrow_mut().queue.pop_front()
    }

    fn close(&mut self) {
        if !self.capabilities.can_close {
            return;
        }
        let mut backlog = self.backlog.borrow_mut();
        backlog.listening = false;
        for mut peer in backlog.queue.drain(..) {
            peer.close();
        }
    }
}

/// Opens client connections to a [`MemoryListener`]
#[derive(Clone)]
pub struct MemoryConnector {
    backlog: Rc<RefCell<Backlog>>,
}

impl MemoryConnector {
    /// Connects a new client; fails when the listener is not listening
    pub fn connect(&self) -> Result<MemoryClient> {
        let mut backlog = self.backlog.borrow_mut();
        if !backlog.listening {
            return Err(NetDebugError::NotListening);
        }

        let pipe = Rc::new(RefCell::new(Pipe {
            client_open: true,
            server_open: true,
            ..Pipe::default()
        }));
        backlog.opened += 1;
        let id = backlog.opened;
        backlog.queue.push_back(MemoryPeer {
            id,
            pipe: Rc::clone(&pipe),
        });
        Ok(MemoryClient { id, pipe })
    }

    /// Total number of clients opened so far
    pub fn opened(&self) -> usize {
        self.backlog.borrow().opened
    }
}

/// Server side of one loopback connection
pub struct MemoryPeer {
    id: usize,
    pipe: Rc<RefCell<Pipe>>,
}

impl MemoryPeer {
    /// Connection number, counting from 1 in connect order
    pub fn id(&self) -> usize {
        self.id
    }
}

impl Peer for MemoryPeer {
    fn connected(&mut self) -> bool {
        let pipe = self.pipe.borrow();
        pipe.server_open && (pipe.client_open || !pipe.to_server.is_empty())
    }

    fn available(&mut self) -> usize {
        let pipe = self.pipe.borrow();
        if pipe.server_open { pipe.to_server.len() } else { 0 }
    }

    fn read(&mut self) -> Option<u8> {
        let mut pipe = self.pipe.borrow_mut();
        if pipe.server_open && pipe.to_server.has_remaining() {
            Some(pipe.to_server.get_u8())
        } else {
            None
        }
    }

    fn peek(&mut self) -> Option<u8> {
        let pipe = self.pipe.borrow();
        if pipe.server_open { pipe.to_server.first().copied() } else { None }
    }

    fn write(&mut self, data: &[u8]) -> usize {
        let mut pipe = self.pipe.borrow_mut();
        if !pipe.server_open || !pipe.client_open || pipe.fail_writes {
            return 0;
        }
        pipe.to_client.extend_from_slice(data);
        data.len()
    }

    fn flush(&mut self) {}

    fn close(&mut self) {
        let mut pipe = self.pipe.borrow_mut();
        pipe.server_open = false;
        pipe.to_server.clear();
    }
}

/// Client side of one loopback connection
pub struct MemoryClient {
    id: usize,
    pipe: Rc<RefCell<Pipe>>,
}

impl MemoryClient {
    /// Connection number, matching [`MemoryPeer::id`]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Sends bytes to the server; returns false once either side has closed
    pub fn send(&self, data: &[u8]) -> bool {
        let mut pipe = self.pipe.borrow_mut();
        if !pipe.client_open || !pipe.server_open {
            return false;
        }
        pipe.to_server.extend_from_slice(data);
        true
    }

    /// Everything the server has written so far, left in place
    pub fn received(&self) -> Vec<u8> {
        self.pipe.borrow().to_client.to_vec()
    }

    /// Everything the server has written so far, drained
    pub fn take_received(&self) -> Vec<u8> {
        self.pipe.borrow_mut().to_client.split().to_vec()
    }

    /// Closes the client side of the connection
    pub fn disconnect(&self) {
        self.pipe.borrow_mut().client_open = false;
    }

    /// Makes every server write to this client fail while set
    pub fn fail_writes(&self, fail: bool) {
        self.pipe.borrow_mut().fail_writes = fail;
    }

    /// Returns true once the server has closed this connection
    pub fn is_closed_by_server(&self) -> bool {
        !self.pipe.borrow().server_open
    }
}
