use crate::common::Peer;
use bytes::{Buf, BytesMut};
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use tracing::{debug, info, warn};

/// A connected debug client over a non-blocking TCP stream
///
/// Inbound bytes are pulled from the socket into a local buffer on demand,
/// so `available`, `peek` and `connected` can answer without blocking. The
/// buffer holds at most `chunk` bytes; anything beyond stays in the socket
/// until the application reads.
pub struct TcpPeer {
    stream: Option<TcpStream>,
    addr: SocketAddr,
    inbound: BytesMut,
    scratch: Box<[u8]>,
    chunk: usize,
    eof: bool,
}

impl TcpPeer {
    /// Wraps an accepted stream; the stream must already be non-blocking
    pub fn new(stream: TcpStream, addr: SocketAddr, chunk: usize) -> Self {
        Self {
            stream: Some(stream),
            addr,
            inbound: BytesMut::with_capacity(chunk),
            scratch: vec![0; chunk].into_boxed_slice(),
            chunk,
            eof: false,
        }
    }

    /// Returns true once `close` has been called
    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    /// Number of inbound bytes held locally, without touching the socket
    pub fn buffered(&self) -> usize {
        self.inbound.len()
    }

    /// Pulls ready bytes from the socket until the inbound buffer is full
    fn fill(&mut self) {
        if self.eof {
            return;
        }
        let Some(stream) = self.stream.as_mut() else {
            return;
        };

        while self.inbound.len() < self.chunk {
            let room = self.chunk - self.inbound.len();
            match stream.read(&mut self.scratch[..room]) {
                Ok(0) => {
                    debug!(peer = %self.addr, "Client closed its side of the connection");
                    self.eof = true;
                    break;
                }
                Ok(n) => self.inbound.extend_from_slice(&self.scratch[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(peer = %self.addr, error = %e, "Read failed, treating connection as lost");
                    self.eof = true;
                    break;
                }
            }
        }
    }
}

impl Peer for TcpPeer {
    fn connected(&mut self) -> bool {
        if self.stream.is_none() {
            return false;
        }
        if self.inbound.is_empty() {
            self.fill();
        }
        !self.eof || !self.inbound.is_empty()
    }

    fn available(&mut self) -> usize {
        self.fill();
        self.inbound.len()
    }

    fn read(&mut self) -> Option<u8> {
        if self.inbound.is_empty() {
            self.fill();
        }
        if self.inbound.has_remaining() {
            Some(self.inbound.get_u8())
        } else {
            None
        }
    }

    fn peek(&mut self) -> Option<u8> {
        if self.inbound.is_empty() {
            self.fill();
        }
        self.inbound.first().copied()
    }

    fn write(&mut self, data: &[u8]) -> usize {
        let Some(stream) = self.stream.as_mut() else {
            return 0;
        };
        loop {
            match stream.write(data) {
                Ok(n) => return n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                // Send buffer is full; dropping is preferable to stalling the caller
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return 0,
                Err(e) => {
                    debug!(peer = %self.addr, error = %e, "Write failed");
                    self.eof = true;
                    return 0;
                }
            }
        }
    }

    fn flush(&mut self) {
        if let Some(stream) = self.stream.as_mut() {
            if let Err(e) = stream.flush() {
                debug!(peer = %self.addr, error = %e, "Flush failed");
            }
        }
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            // The remote side may already be gone
            let _ = stream.shutdown(Shutdown::Both);
            info!(peer = %self.addr, "Client connection closed");
        }
        self.inbound.clear();
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        Some(self.addr)
    }
}
