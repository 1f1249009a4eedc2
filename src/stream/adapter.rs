use super::compat::{NarrowByte, SerialConfig};
use super::config::StreamConfig;
use super::strategy::AcceptStrategy;
use crate::Result;
use crate::common::{ByteSink, Listener, Peer, SharedSink, Stream};
use crate::tcp::{TcpConfig, TcpDebugListener};
use bytes::Bytes;
use std::cell::RefCell;
use std::net::SocketAddr;
use std::rc::{Rc, Weak};
use std::{fmt, io};
use tracing::{debug, info, trace};

/// A serial-style stream whose other end is the most recent network client
///
/// `NetDebug` owns a [`Listener`] and a slot for at most one connected
/// client. New clients are only adopted inside [`available`](Self::available);
/// adopting one always closes the previous client first. Output goes to the
/// client when it is connected and to the mirror sink whenever one is
/// registered, so debug output is never lost just because nobody is
/// listening over the network.
///
/// All operations are non-blocking except [`flush`](Self::flush).
///
/// # Examples
///
/// ```
/// use netdebug::{MemoryListener, NetDebug, SharedSink};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let listener = MemoryListener::new();
/// let connector = listener.connector();
/// let mut debug = NetDebug::new(listener);
/// debug.begin().unwrap();
///
/// let console = Rc::new(RefCell::new(Vec::<u8>::new()));
/// let mirror: SharedSink = console.clone();
/// debug.mirror(Some(&mirror));
/// debug.cr_before_lf(true);
///
/// // Nobody is connected yet: only the mirror sees the output
/// debug.print("boot\n");
/// assert_eq!(&console.borrow()[..], b"boot\r\n");
///
/// let client = connector.connect().unwrap();
/// assert_eq!(debug.available(), 0);
/// debug.print("up\n");
/// assert_eq!(client.take_received(), b"Hi!\r\nup\r\n");
/// ```
pub struct NetDebug<L: Listener> {
    listener: L,
    client: Option<L::Peer>,
    strategy: AcceptStrategy,
    greeting: Bytes,
    echo: bool,
    cr_before_lf: bool,
    mirror: Option<Weak<RefCell<dyn ByteSink>>>,
}

impl NetDebug<TcpDebugListener> {
    /// Creates an adapter over a TCP listener with the default stream settings
    pub fn tcp(config: TcpConfig) -> Self {
        Self::new(TcpDebugListener::new(config))
    }
}

impl<L: Listener> NetDebug<L> {
    /// Creates an adapter with echo and CR insertion off and no mirror
    pub fn new(listener: L) -> Self {
        Self::with_config(listener, StreamConfig::default())
    }

    /// Creates an adapter; the acceptance strategy is fixed here
    pub fn with_config(listener: L, config: StreamConfig) -> Self {
        let strategy = AcceptStrategy::resolve(config.strategy, listener.capabilities());
        Self {
            listener,
            client: None,
            strategy,
            greeting: config.greeting,
            echo: config.echo,
            cr_before_lf: config.cr_before_lf,
            mirror: None,
        }
    }

    /// Starts listening for a debug client
    pub fn begin(&mut self) -> Result<()> {
        self.listener.begin()
    }

    /// Starts listening; the serial parameters exist for call-site compatibility only
    ///
    /// Accepts a baud rate, or a tuple of baud rate, frame configuration,
    /// mode and TX pin, as a UART `begin` would.
    pub fn begin_serial(&mut self, params: impl Into<SerialConfig>) -> Result<()> {
        let params = params.into();
        debug!(
            baud = params.baud,
            config = params.config,
            mode = params.mode,
            tx_pin = params.tx_pin,
            "Ignoring serial parameters"
        );
        self.begin()
    }

    /// Writes one byte, returns 1 if the primary destination accepted it
    ///
    /// The primary destination is the client while it is connected, the
    /// mirror otherwise. With CR insertion on, a line feed is preceded by a
    /// carriage return on each destination. A count of 0 means nothing
    /// accepted the byte; it does not say why.
    pub fn write(&mut self, byte: u8) -> usize {
        let insert_cr = self.cr_before_lf && byte == b'\n';
        let mirror = self.mirror_sink();

        if let Some(client) = self.connected_client() {
            if insert_cr {
                client.write(b"\r");
                if let Some(sink) = &mirror {
                    write_to_sink(sink, b'\r');
                }
            }
            if let Some(sink) = &mirror {
                write_to_sink(sink, byte);
            }
            return client.write(&[byte]);
        }

        match mirror {
            Some(sink) => {
                if insert_cr {
                    write_to_sink(&sink, b'\r');
                }
                write_to_sink(&sink, byte)
            }
            None => 0,
        }
    }

    /// Writes the low byte of an integer
    pub fn write_value<T: NarrowByte>(&mut self, value: T) -> usize {
        self.write(value.narrow())
    }

    /// Writes a buffer one byte at a time, stopping at the first failure
    pub fn write_bytes(&mut self, buf: &[u8]) -> usize {
        let mut written = 0;
        for &byte in buf {
            if self.write(byte) == 0 {
                break;
            }
            written += 1;
        }
        written
    }

    /// Writes a string, returns the number of bytes written
    pub fn print(&mut self, s: &str) -> usize {
        self.write_bytes(s.as_bytes())
    }

    /// Adopts a waiting client, then reports whether input is waiting (0 or 1)
    ///
    /// In echo mode all waiting input is sent straight back to the client
    /// and 0 is returned: the input belongs to the remote terminal, not to
    /// the application.
    pub fn available(&mut self) -> usize {
        self.poll_accept();

        let echo = self.echo;
        let Some(client) = self.client.as_mut() else {
            return 0;
        };

        if echo {
            let mut echoed = 0usize;
            while client.available() > 0 {
                let Some(byte) = client.read() else {
                    break;
                };
                client.write(&[byte]);
                echoed += 1;
            }
            if echoed > 0 {
                trace!(bytes = echoed, "Echoed client input");
            }
            0
        } else if client.available() > 0 {
            1
        } else {
            0
        }
    }

    /// Reads the next byte from the client
    pub fn read(&mut self) -> Option<u8> {
        self.client.as_mut().and_then(|client| client.read())
    }

    /// Returns the next byte from the client without consuming it
    pub fn peek(&mut self) -> Option<u8> {
        self.client.as_mut().and_then(|client| client.peek())
    }

    /// Blocks until the client's pending output has been handed to the network
    pub fn flush(&mut self) {
        if let Some(client) = self.client.as_mut() {
            client.flush();
        }
    }

    /// Closes the client and, where the listener supports it, stops listening
    pub fn end(&mut self) {
        self.close_client();
        if self.listener.capabilities().can_close {
            self.listener.close();
        }
    }

    /// Turns echo mode on or off
    pub fn echo(&mut self, enabled: bool) {
        self.echo = enabled;
    }

    /// Turns carriage-return insertion on or off
    pub fn cr_before_lf(&mut self, enabled: bool) {
        self.cr_before_lf = enabled;
    }

    /// Registers a mirror sink, or clears it with `None`
    ///
    /// Only a weak reference is kept. The caller owns the sink; once it is
    /// dropped the adapter behaves as if no mirror were registered.
    pub fn mirror(&mut self, sink: Option<&SharedSink>) {
        self.mirror = sink.map(Rc::downgrade);
    }

    /// Accepted for compatibility with serial ports; has no effect
    pub fn set_debug_output(&mut self, _enabled: bool) {}

    /// Returns true if a client is in the slot and still connected
    pub fn is_connected(&mut self) -> bool {
        self.connected_client().is_some()
    }

    /// Returns true if the client slot is occupied, connected or not
    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    /// Returns true if a mirror is registered and still alive
    pub fn has_mirror(&self) -> bool {
        self.mirror_sink().is_some()
    }

    /// Returns true if client input is echoed back instead of delivered
    pub fn is_echo(&self) -> bool {
        self.echo
    }

    /// Returns true if a carriage return is sent before each line feed
    pub fn is_cr_before_lf(&self) -> bool {
        self.cr_before_lf
    }

    /// The acceptance strategy chosen at construction
    pub fn strategy(&self) -> AcceptStrategy {
        self.strategy
    }

    /// Address of the listening socket, if bound
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.local_addr()
    }

    /// Returns the underlying listener
    pub fn listener(&self) -> &L {
        &self.listener
    }

    fn connected_client(&mut self) -> Option<&mut L::Peer> {
        let client = self.client.as_mut()?;
        if client.connected() { Some(client) } else { None }
    }

    fn mirror_sink(&self) -> Option<SharedSink> {
        self.mirror.as_ref()?.upgrade()
    }

    fn poll_accept(&mut self) {
        match self.strategy {
            AcceptStrategy::PollAndReplace => {
                if !self.listener.has_pending() {
                    return;
                }
                self.close_client();
                if let Some(mut peer) = self.listener.take_pending() {
                    if !self.greeting.is_empty() {
                        peer.write(&self.greeting);
                    }
                    info!(peer = ?peer.peer_addr(), strategy = %self.strategy, "Debug client attached");
                    self.client = Some(peer);
                }
            }
            AcceptStrategy::TakeIfWaiting => {
                if let Some(peer) = self.listener.take_pending() {
                    self.close_client();
                    info!(peer = ?peer.peer_addr(), strategy = %self.strategy, "Debug client attached");
                    self.client = Some(peer);
                }
            }
        }
    }

    fn close_client(&mut self) {
        if let Some(mut client) = self.client.take() {
            info!(peer = ?client.peer_addr(), "Detaching debug client");
            client.close();
        }
    }
}

fn write_to_sink(sink: &SharedSink, byte: u8) -> usize {
    // A sink that is already borrowed is being written from inside itself
    match sink.try_borrow_mut() {
        Ok(mut sink) => sink.write_byte(byte),
        Err(_) => 0,
    }
}

impl<L: Listener> fmt::Write for NetDebug<L> {
    /// Formatted output never fails; bytes with nowhere to go are dropped
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.print(s);
        Ok(())
    }
}

impl<L: Listener> io::Write for NetDebug<L> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.write_bytes(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        NetDebug::flush(self);
        Ok(())
    }
}

impl<L: Listener> Stream for NetDebug<L> {
    fn available(&mut self) -> usize {
        NetDebug::available(self)
    }

    fn read(&mut self) -> Option<u8> {
        NetDebug::read(self)
    }

    fn peek(&mut self) -> Option<u8> {
        NetDebug::peek(self)
    }

    fn flush(&mut self) {
        NetDebug::flush(self)
    }
}
