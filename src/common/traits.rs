use std::cell::RefCell;
use std::rc::Rc;

/// A destination that accepts bytes one at a time
///
/// This is all the adapter needs from a mirror. Anything implementing
/// [`std::io::Write`] (stdout, a `Vec<u8>`, a file) is a `ByteSink`.
pub trait ByteSink {
    /// Writes one byte and returns how many bytes were accepted (0 or 1)
    fn write_byte(&mut self, byte: u8) -> usize;

    /// Writes a buffer byte by byte, stopping at the first rejected byte
    fn write_bytes(&mut self, buf: &[u8]) -> usize {
        let mut written = 0;
        for &byte in buf {
            if self.write_byte(byte) == 0 {
                break;
            }
            written += 1;
        }
        written
    }
}

impl<W: std::io::Write> ByteSink for W {
    fn write_byte(&mut self, byte: u8) -> usize {
        self.write(&[byte]).unwrap_or(0)
    }
}

/// A mirror shared between the application and the adapter
///
/// The adapter only keeps a weak reference; the application owns the sink.
pub type SharedSink = Rc<RefCell<dyn ByteSink>>;

/// Character stream interface, the shape of a hardware serial port
///
/// Application code written against `Stream` works the same whether it is
/// handed a UART or a [`NetDebug`](crate::NetDebug).
pub trait Stream: ByteSink {
    /// Returns non-zero when input is waiting to be read
    fn available(&mut self) -> usize;

    /// Reads the next input byte, `None` when there is nothing to read
    fn read(&mut self) -> Option<u8>;

    /// Returns the next input byte without consuming it
    fn peek(&mut self) -> Option<u8>;

    /// Waits until previously written bytes have left the stream
    fn flush(&mut self);
}
