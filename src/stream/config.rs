use super::strategy::AcceptStrategy;
use bytes::Bytes;

/// Greeting sent to a newly adopted client by the poll-and-replace strategy
pub const DEFAULT_GREETING: &[u8] = b"Hi!\r\n";

/// Configuration for the stream adapter
///
/// # Examples
///
/// ```
/// use netdebug::stream::{AcceptStrategy, StreamConfig};
///
/// let config = StreamConfig::default()
///     .with_cr_before_lf(true)
///     .with_strategy(AcceptStrategy::TakeIfWaiting);
/// assert!(config.cr_before_lf);
/// assert!(!config.echo);
/// assert_eq!(&config.greeting[..], b"Hi!\r\n");
/// ```
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Write inbound bytes straight back to the client instead of exposing them
    pub echo: bool,
    /// Insert a carriage return before every line feed written
    pub cr_before_lf: bool,
    /// Bytes sent to a client right after it is adopted (poll-and-replace only)
    pub greeting: Bytes,
    /// Force an acceptance strategy instead of deriving it from the listener
    pub strategy: Option<AcceptStrategy>,
}

impl StreamConfig {
    /// Set echo mode
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Set carriage-return insertion
    pub fn with_cr_before_lf(mut self, cr_before_lf: bool) -> Self {
        self.cr_before_lf = cr_before_lf;
        self
    }

    /// Set the greeting; an empty greeting sends nothing
    pub fn with_greeting(mut self, greeting: impl Into<Bytes>) -> Self {
        self.greeting = greeting.into();
        self
    }

    /// Force an acceptance strategy
    pub fn with_strategy(mut self, strategy: AcceptStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            echo: false,
            cr_before_lf: false,
            greeting: Bytes::from_static(DEFAULT_GREETING),
            strategy: None,
        }
    }
}
