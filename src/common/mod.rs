//! Common traits and types used across the netdebug library
//!
//! This module contains the capability traits that separate the stream
//! adapter from the transport it runs over and from the mirror it copies to.

pub mod test_utils;
pub mod traits;
pub mod transport;

pub use traits::{ByteSink, SharedSink, Stream};
pub use transport::{Listener, ListenerCapabilities, Peer};
